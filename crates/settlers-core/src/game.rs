//! Core game state machine.
//!
//! A game moves through `DeterminingOrder -> Setup -> PlayerTurn* -> GameOver`,
//! or to `Terminated` if the loop is stopped from outside. [`GameState::step`]
//! advances computer players and dice on its own and returns
//! [`Step::AwaitingHuman`] whenever the human has to decide something; the
//! human's decision comes back in through [`GameState::apply_action`].

use crate::actions::{moves_for_player, GameAction, GameEvent, Move, MoveError, Purchase};
use crate::board::{Board, BoardError, BoardSnapshot, PlayerId};
use crate::bot::{Bot, HeuristicWeights};
use crate::grid::{Edge, Vertex};
use crate::objects::{ObjectKind, PlacedObject, PlacementError};
use crate::player::{Player, PlayerColor, ResourceBundle, ResourceMetric, STARTING_RESOURCES};
use crate::trade::{plan_trades, TradeExchange};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Fewest players a game can have
pub const MIN_PLAYERS: usize = 2;

/// Most players a game can have
pub const MAX_PLAYERS: usize = 5;

/// Player count when none is given
pub const DEFAULT_PLAYERS: usize = 4;

/// Victory points needed to win
pub const VICTORY_POINTS_TO_WIN: u32 = 10;

/// Free settlements (each with a road) every player places during setup
pub const SETUP_SETTLEMENTS: usize = 2;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Rolling for turn order
    DeterminingOrder,

    /// Players take turns placing their free settlements and roads
    Setup,

    /// Regular turn of the current player
    PlayerTurn {
        /// Whether this turn's dice have been rolled and paid out
        rolled: bool,
    },

    /// Game is over
    GameOver { winner: PlayerId },

    /// The game loop was stopped before anyone won
    Terminated,
}

/// Errors that can occur when configuring a game or applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("A game needs 2 to 5 players, got {count}")]
    PlayerCount { count: usize },

    #[error("Player index {index} is out of bounds for {count} players")]
    PlayerIndexOutOfBounds { index: usize, count: usize },

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Cannot afford this")]
    CannotAfford,

    #[error("A bank trade must exchange two different resources")]
    InvalidTrade,

    #[error("Game is over")]
    GameOver,

    #[error("Game was terminated")]
    Terminated,

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

impl GameError {
    /// Whether this error means a core invariant broke (uninitialized board
    /// data or an ownerless piece) rather than a rejected action
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::Board(_)
                | GameError::Placement(PlacementError::NoOwner)
                | GameError::Placement(PlacementError::Board(_))
        )
    }
}

impl From<MoveError> for GameError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::InsufficientResources => GameError::CannotAfford,
            MoveError::Placement(err) => GameError::Placement(err),
        }
    }
}

/// How a game is set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub player_count: usize,
    /// Seat of the human player; `None` for a game of computer players only
    pub human: Option<usize>,
    pub starting_resources: u32,
    pub victory_points: u32,
    /// Seed for dice, colors, starting hands and bots
    pub seed: Option<u64>,
    pub weights: HeuristicWeights,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: DEFAULT_PLAYERS,
            human: Some(0),
            starting_resources: STARTING_RESOURCES,
            victory_points: VICTORY_POINTS_TO_WIN,
            seed: None,
            weights: HeuristicWeights::default(),
        }
    }
}

impl GameConfig {
    /// A game of computer players only
    pub fn bots_only(player_count: usize) -> Self {
        Self {
            player_count,
            human: None,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check player count and human seat
    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(GameError::PlayerCount {
                count: self.player_count,
            });
        }
        if let Some(index) = self.human {
            if index >= self.player_count {
                return Err(GameError::PlayerIndexOutOfBounds {
                    index,
                    count: self.player_count,
                });
            }
        }
        Ok(())
    }
}

/// What [`GameState::step`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The game moved forward on its own
    Advanced(Vec<GameEvent>),
    /// Nothing happens until the human submits an action
    AwaitingHuman(PlayerId),
    /// Game over or terminated
    Finished,
}

/// The complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// All players, indexed by id
    pub players: Vec<Player>,
    /// Player ids in turn order, fixed once rolled
    pub turn_order: Vec<PlayerId>,
    /// Index into `turn_order` of the active player
    pub current: usize,
    /// Current game phase
    pub phase: GamePhase,
    /// Turn number (starts at 1 after setup)
    pub turn_number: u32,
    /// Last dice roll
    pub dice_roll: Option<(u8, u8)>,
    human: Option<PlayerId>,
    victory_points: u32,
    bots: Vec<Bot>,
    rng: StdRng,
}

impl GameState {
    /// Create a new game on `board`
    pub fn new(config: GameConfig, board: Board) -> Result<Self, GameError> {
        config.validate()?;
        board.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let colors = PlayerColor::shuffled(config.player_count, &mut rng);
        let players: Vec<Player> = colors
            .into_iter()
            .enumerate()
            .map(|(i, color)| {
                let mut player = Player::new(i as PlayerId, color);
                player.resources = ResourceBundle::random(config.starting_resources, &mut rng);
                player
            })
            .collect();

        let human = config.human.map(|i| i as PlayerId);
        let bots = players
            .iter()
            .filter(|p| Some(p.id) != human)
            .map(|p| {
                let bot = match config.seed {
                    Some(seed) => Bot::with_seed(p.id, seed.wrapping_add(p.id as u64 + 1)),
                    None => Bot::new(p.id),
                };
                bot.with_weights(config.weights)
            })
            .collect();

        Ok(Self {
            board,
            turn_order: players.iter().map(|p| p.id).collect(),
            players,
            current: 0,
            phase: GamePhase::DeterminingOrder,
            turn_number: 0,
            dice_roll: None,
            human,
            victory_points: config.victory_points,
            bots,
            rng,
        })
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// The human player's id, if there is one
    pub fn human(&self) -> Option<PlayerId> {
        self.human
    }

    /// Position of the human in the turn order
    pub fn human_slot(&self) -> Option<usize> {
        let human = self.human?;
        self.turn_order.iter().position(|&p| p == human)
    }

    pub fn is_human(&self, player: PlayerId) -> bool {
        self.human == Some(player)
    }

    /// The player whose turn it is
    pub fn current_player(&self) -> PlayerId {
        self.turn_order[self.current]
    }

    /// Victory points for a player
    pub fn victory_points(&self, player: PlayerId) -> u32 {
        self.board.victory_points(player)
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver { .. } | GamePhase::Terminated)
    }

    /// Get the winner if the game is over
    pub fn get_winner(&self) -> Option<PlayerId> {
        if let GamePhase::GameOver { winner } = self.phase {
            Some(winner)
        } else {
            None
        }
    }

    /// Legal, affordable moves the current player could make
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        match self.get_player(player) {
            Some(p) => moves_for_player(&self.board, p),
            None => Vec::new(),
        }
    }

    /// Bank trades that would let `player` afford a `kind`
    pub fn trade_plan(&self, player: PlayerId, kind: ObjectKind) -> Option<Vec<TradeExchange>> {
        let p = self.get_player(player)?;
        plan_trades(&p.resources, &kind.cost())
    }

    /// Expected production of `player`'s pieces per 36 rolls
    pub fn production_metric(&self, player: PlayerId) -> Result<ResourceMetric, GameError> {
        let p = self
            .get_player(player)
            .ok_or(GameError::PlayerIndexOutOfBounds {
                index: player as usize,
                count: self.players.len(),
            })?;
        Ok(p.production_metric(&self.board)?)
    }

    // ==================== Driving ====================

    /// Advance until the next decision point
    pub fn step(&mut self) -> Result<Step, GameError> {
        match self.phase {
            GamePhase::DeterminingOrder => Ok(Step::Advanced(self.determine_turn_order())),
            GamePhase::Setup => {
                let player = self.current_player();
                if self.is_human(player) {
                    return Ok(Step::AwaitingHuman(player));
                }
                Ok(Step::Advanced(self.run_bot_setup()?))
            }
            GamePhase::PlayerTurn { rolled: false } => Ok(Step::Advanced(self.roll_dice()?)),
            GamePhase::PlayerTurn { rolled: true } => {
                let player = self.current_player();
                if self.is_human(player) {
                    return Ok(Step::AwaitingHuman(player));
                }
                Ok(Step::Advanced(self.play_bot_turn()?))
            }
            GamePhase::GameOver { .. } | GamePhase::Terminated => Ok(Step::Finished),
        }
    }

    /// Step a game with no human until someone wins or `max_turns` pass.
    /// Returns the winner, if any.
    pub fn simulate(&mut self, max_turns: u32) -> Result<Option<PlayerId>, GameError> {
        while self.turn_number <= max_turns {
            match self.step()? {
                Step::Advanced(_) => {}
                Step::AwaitingHuman(_) => return Err(GameError::NotYourTurn),
                Step::Finished => break,
            }
        }
        Ok(self.get_winner())
    }

    /// Stop the game where it is
    pub fn terminate(&mut self) -> GameEvent {
        info!(turn = self.turn_number, "Game terminated");
        self.phase = GamePhase::Terminated;
        GameEvent::GameTerminated
    }

    // ==================== Phases ====================

    /// Each player rolls one die; the order is by roll, highest first, with
    /// ties keeping seat order.
    pub fn determine_turn_order(&mut self) -> Vec<GameEvent> {
        let mut rolls: Vec<(PlayerId, u8)> = self
            .players
            .iter()
            .map(|p| (p.id, self.rng.gen_range(1..=6)))
            .collect();
        let reported = rolls.clone();
        rolls.sort_by(|a, b| b.1.cmp(&a.1));

        self.turn_order = rolls.iter().map(|(id, _)| *id).collect();
        self.current = 0;
        self.phase = GamePhase::Setup;
        info!(order = ?self.turn_order, human_slot = ?self.human_slot(), "Turn order decided");

        vec![GameEvent::TurnOrderDecided {
            rolls: reported,
            order: self.turn_order.clone(),
        }]
    }

    /// Both free placements for the current computer player
    fn run_bot_setup(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let player = self.current_player();
        let mut events = Vec::new();

        for _ in self.settlements_of(player)..SETUP_SETTLEMENTS {
            let bot = self.bot(player).ok_or(GameError::InvalidPhase)?;
            let placement =
                bot.choose_initial_placement(&self.board, &self.players[player as usize])?;
            let Some(placement) = placement else {
                debug!(player, "No free vertex left for setup");
                break;
            };
            events.push(self.place_initial(player, placement.settlement, placement.road)?);
        }

        events.extend(self.advance_setup());
        Ok(events)
    }

    /// Add a free road and settlement together, or neither
    fn place_initial(
        &mut self,
        player: PlayerId,
        settlement: Vertex,
        road: Edge,
    ) -> Result<GameEvent, GameError> {
        if !road.has_endpoint(&settlement) {
            return Err(PlacementError::InvalidLocation {
                kind: ObjectKind::Road,
            }
            .into());
        }
        let road_piece = PlacedObject::free_road(&self.board, player, road)?;
        let settlement_piece = PlacedObject::free_settlement(&self.board, player, settlement)?;
        self.board.add_object(road_piece);
        self.board.add_object(settlement_piece);

        Ok(GameEvent::InitialPlacement {
            player,
            settlement,
            road,
        })
    }

    fn advance_setup(&mut self) -> Vec<GameEvent> {
        if self.current + 1 < self.turn_order.len() {
            self.current += 1;
            return Vec::new();
        }
        self.current = 0;
        self.turn_number = 1;
        self.phase = GamePhase::PlayerTurn { rolled: false };
        info!("Setup complete");
        vec![GameEvent::SetupComplete]
    }

    /// Roll two dice and pay every productive piece, in placement order
    fn roll_dice(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let player = self.current_player();
        let die1 = self.rng.gen_range(1..=6);
        let die2 = self.rng.gen_range(1..=6);
        let total = die1 + die2;
        self.dice_roll = Some((die1, die2));
        self.phase = GamePhase::PlayerTurn { rolled: true };

        let mut events = vec![GameEvent::DiceRolled {
            player,
            roll: (die1, die2),
            total,
        }];
        let distributions = self.distribute_resources(total)?;
        if !distributions.is_empty() {
            events.push(GameEvent::ResourcesDistributed { distributions });
        }
        Ok(events)
    }

    /// Give every productive piece's yield for `dice_total` to its owner
    pub fn distribute_resources(
        &mut self,
        dice_total: u8,
    ) -> Result<Vec<(PlayerId, ResourceBundle)>, GameError> {
        let before: Vec<ResourceBundle> = self.players.iter().map(|p| p.resources).collect();

        for object in self.board.objects() {
            object.give_resources_to_owner(&self.board, dice_total, &mut self.players)?;
        }

        // Holdings only grow here, so `before.missing(after)` is the gain
        Ok(self
            .players
            .iter()
            .zip(before)
            .map(|(p, before)| (p.id, before.missing(&p.resources)))
            .filter(|(_, gained)| !gained.is_empty())
            .collect())
    }

    /// One random legal move for the current computer player, then end the turn
    fn play_bot_turn(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let player = self.current_player();
        let mut events = Vec::new();

        let index = player as usize;
        let chosen = match self.bots.iter_mut().find(|b| b.player_id == player) {
            Some(bot) => bot.choose_move(&self.board, &self.players[index]),
            None => return Err(GameError::InvalidPhase),
        };

        match chosen {
            Some(mv) => {
                mv.apply(&mut self.board, &mut self.players[index])?;
                debug!(player, purchase = ?mv.purchase, "Computer move");
                events.push(GameEvent::for_purchase(player, mv.purchase));
            }
            None => events.push(GameEvent::NoMove { player }),
        }

        events.extend(self.finish_turn());
        Ok(events)
    }

    // ==================== Human Actions ====================

    /// Apply an action submitted by `player`
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        match self.phase {
            GamePhase::GameOver { .. } => return Err(GameError::GameOver),
            GamePhase::Terminated => return Err(GameError::Terminated),
            _ => {}
        }
        if player != self.current_player() {
            return Err(GameError::NotYourTurn);
        }

        match action {
            GameAction::PlaceInitialSettlement { vertex, road_to } => {
                if self.phase != GamePhase::Setup
                    || self.settlements_of(player) >= SETUP_SETTLEMENTS
                {
                    return Err(GameError::InvalidPhase);
                }
                let road = Edge::new(vertex, road_to).ok_or(PlacementError::InvalidLocation {
                    kind: ObjectKind::Road,
                })?;

                let mut events = vec![self.place_initial(player, vertex, road)?];
                if self.settlements_of(player) >= SETUP_SETTLEMENTS {
                    events.extend(self.advance_setup());
                }
                Ok(events)
            }

            GameAction::EndTurn => {
                if self.phase != (GamePhase::PlayerTurn { rolled: true }) {
                    return Err(GameError::InvalidPhase);
                }
                Ok(self.finish_turn())
            }

            GameAction::BuildRoad(_)
            | GameAction::BuildSettlement(_)
            | GameAction::BuildCity(_)
            | GameAction::BankTrade { .. } => {
                if self.phase != (GamePhase::PlayerTurn { rolled: true }) {
                    return Err(GameError::InvalidPhase);
                }
                if let GameAction::BankTrade { give, receive } = action {
                    if give == receive {
                        return Err(GameError::InvalidTrade);
                    }
                }
                let purchase = action.purchase().ok_or(GameError::InvalidPhase)?;
                self.purchase(player, purchase)
            }
        }
    }

    fn purchase(
        &mut self,
        player: PlayerId,
        purchase: Purchase,
    ) -> Result<Vec<GameEvent>, GameError> {
        let index = player as usize;
        let p = self.players.get_mut(index).ok_or(GameError::NotYourTurn)?;
        Move::new(player, purchase).apply(&mut self.board, p)?;
        Ok(vec![GameEvent::for_purchase(player, purchase)])
    }

    // ==================== Turn Management ====================

    /// First player (active player first, then turn order) at or past the
    /// victory threshold
    pub fn check_winner(&self) -> Option<PlayerId> {
        let n = self.turn_order.len();
        (0..n)
            .map(|offset| self.turn_order[(self.current + offset) % n])
            .find(|&p| self.victory_points(p) >= self.victory_points)
    }

    /// End the current turn: declare a winner or move to the next player
    pub fn finish_turn(&mut self) -> Vec<GameEvent> {
        if let Some(winner) = self.check_winner() {
            let victory_points = self.victory_points(winner);
            info!(winner, victory_points, "Game won");
            self.phase = GamePhase::GameOver { winner };
            return vec![GameEvent::GameWon {
                player: winner,
                victory_points,
            }];
        }

        let player = self.current_player();
        let next_player = self.advance_turn();
        vec![GameEvent::TurnEnded {
            player,
            next_player,
        }]
    }

    /// Hand the turn to the next player in the fixed order, wrapping around
    pub fn advance_turn(&mut self) -> PlayerId {
        self.current = (self.current + 1) % self.turn_order.len();
        self.turn_number += 1;
        self.dice_roll = None;
        self.phase = GamePhase::PlayerTurn { rolled: false };
        self.current_player()
    }

    // ==================== Helper Methods ====================

    fn settlements_of(&self, player: PlayerId) -> usize {
        self.board
            .objects()
            .iter()
            .filter(|o| o.owner() == Some(player) && o.is_productive())
            .count()
    }

    fn bot(&self, player: PlayerId) -> Option<&Bot> {
        self.bots.iter().find(|b| b.player_id == player)
    }

    /// Read-only view for display collaborators
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.snapshot(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    color: p.color,
                    resources: p.resources,
                    victory_points: self.victory_points(p.id),
                    human: self.is_human(p.id),
                })
                .collect(),
            turn_order: self.turn_order.clone(),
            current_player: self.current_player(),
            phase: self.phase,
            turn_number: self.turn_number,
            dice_roll: self.dice_roll,
        }
    }
}

/// Read-only game view handed to display collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: BoardSnapshot,
    pub players: Vec<PlayerSnapshot>,
    pub turn_order: Vec<PlayerId>,
    pub current_player: PlayerId,
    pub phase: GamePhase,
    pub turn_number: u32,
    pub dice_roll: Option<(u8, u8)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub color: PlayerColor,
    pub resources: ResourceBundle,
    pub victory_points: u32,
    pub human: bool,
}
