//! Game actions that players can take.
//!
//! This module defines purchases and the moves built from them, the actions a
//! human submits at each decision point, and the events that result.

use crate::board::{Board, PlayerId, Resource};
use crate::grid::{Edge, Vertex};
use crate::objects::{ObjectKind, PlacedObject, PlacementError};
use crate::player::{Player, ResourceBundle};
use crate::trade::TradeExchange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something a player can pay for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purchase {
    Road(Edge),
    Settlement(Vertex),
    City(Vertex),
    Trade(TradeExchange),
}

impl Purchase {
    /// Resources this purchase costs
    pub fn cost(&self) -> ResourceBundle {
        match self {
            Purchase::Road(_) => ObjectKind::Road.cost(),
            Purchase::Settlement(_) => ObjectKind::Settlement.cost(),
            Purchase::City(_) => ObjectKind::City.cost(),
            Purchase::Trade(trade) => trade.cost(),
        }
    }
}

/// Why a move could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MoveError {
    #[error("Cannot afford this")]
    InsufficientResources,

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// A purchase attempted by a specific player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub player: PlayerId,
    pub purchase: Purchase,
}

impl Move {
    pub fn new(player: PlayerId, purchase: Purchase) -> Self {
        Self { player, purchase }
    }

    /// Apply the move: build the piece (checking its location), charge the
    /// player, then commit the piece. Any failure leaves both the board and
    /// the player's bundle untouched.
    pub fn apply(&self, board: &mut Board, player: &mut Player) -> Result<(), MoveError> {
        let cost = self.purchase.cost();
        match self.purchase {
            Purchase::Trade(trade) => {
                if !trade.charge(&mut player.resources) {
                    return Err(MoveError::InsufficientResources);
                }
            }
            Purchase::Road(edge) => {
                let road = PlacedObject::road(board, self.player, edge)?;
                if !player.resources.try_subtract(&cost) {
                    return Err(MoveError::InsufficientResources);
                }
                board.add_object(road);
            }
            Purchase::Settlement(vertex) => {
                let settlement = PlacedObject::settlement(board, self.player, vertex)?;
                if !player.resources.try_subtract(&cost) {
                    return Err(MoveError::InsufficientResources);
                }
                board.add_object(settlement);
            }
            Purchase::City(vertex) => {
                PlacedObject::city(board, self.player, vertex)?;
                if !player.resources.try_subtract(&cost) {
                    return Err(MoveError::InsufficientResources);
                }
                board.upgrade_to_city(vertex, self.player)?;
            }
        }
        Ok(())
    }
}

/// Every road, settlement and city `player` can both legally place and
/// afford right now, in board order.
pub fn moves_for_player(board: &Board, player: &Player) -> Vec<Move> {
    let mut moves = Vec::new();

    if player.can_afford(&ObjectKind::Road.cost()) {
        for edge in board.edges() {
            if PlacedObject::road_is_legal(board, player.id, edge) {
                moves.push(Move::new(player.id, Purchase::Road(edge)));
            }
        }
    }

    if player.can_afford(&ObjectKind::Settlement.cost()) {
        for vertex in board.vertices() {
            if PlacedObject::settlement_is_legal(board, player.id, vertex, false) {
                moves.push(Move::new(player.id, Purchase::Settlement(vertex)));
            }
        }
    }

    if player.can_afford(&ObjectKind::City.cost()) {
        for vertex in board.buildings_of(player.id, ObjectKind::Settlement) {
            moves.push(Move::new(player.id, Purchase::City(vertex)));
        }
    }

    moves
}

/// All actions a human can submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Setup Phase ====================
    /// Free settlement at `vertex` plus a free road from it to `road_to`
    PlaceInitialSettlement { vertex: Vertex, road_to: Vertex },

    // ==================== Turn Actions ====================
    BuildRoad(Edge),
    BuildSettlement(Vertex),
    BuildCity(Vertex),
    /// Trade three `give` for one `receive` with the bank
    BankTrade { give: Resource, receive: Resource },

    // ==================== Turn Management ====================
    EndTurn,
}

impl GameAction {
    /// The purchase behind a turn action, if it is one
    pub fn purchase(&self) -> Option<Purchase> {
        match *self {
            GameAction::BuildRoad(edge) => Some(Purchase::Road(edge)),
            GameAction::BuildSettlement(vertex) => Some(Purchase::Settlement(vertex)),
            GameAction::BuildCity(vertex) => Some(Purchase::City(vertex)),
            GameAction::BankTrade { give, receive } => {
                Some(Purchase::Trade(TradeExchange::new(give, receive)))
            }
            GameAction::PlaceInitialSettlement { .. } | GameAction::EndTurn => None,
        }
    }
}

impl From<Purchase> for GameAction {
    fn from(purchase: Purchase) -> Self {
        match purchase {
            Purchase::Road(edge) => GameAction::BuildRoad(edge),
            Purchase::Settlement(vertex) => GameAction::BuildSettlement(vertex),
            Purchase::City(vertex) => GameAction::BuildCity(vertex),
            Purchase::Trade(trade) => GameAction::BankTrade {
                give: trade.input,
                receive: trade.output,
            },
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Turn order was decided from single-die rolls
    TurnOrderDecided {
        rolls: Vec<(PlayerId, u8)>,
        order: Vec<PlayerId>,
    },

    /// Setup placement of a free settlement and road
    InitialPlacement {
        player: PlayerId,
        settlement: Vertex,
        road: Edge,
    },

    /// Setup finished, regular turns begin
    SetupComplete,

    /// Dice were rolled
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// Resources were distributed after a dice roll
    ResourcesDistributed {
        distributions: Vec<(PlayerId, ResourceBundle)>,
    },

    RoadBuilt { player: PlayerId, edge: Edge },

    SettlementBuilt { player: PlayerId, vertex: Vertex },

    CityBuilt { player: PlayerId, vertex: Vertex },

    BankTraded {
        player: PlayerId,
        trade: TradeExchange,
    },

    /// A computer player found nothing to do this turn
    NoMove { player: PlayerId },

    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    GameWon {
        player: PlayerId,
        victory_points: u32,
    },

    /// The game loop was stopped from outside
    GameTerminated,
}

impl GameEvent {
    /// The event reported after a purchase succeeds
    pub fn for_purchase(player: PlayerId, purchase: Purchase) -> Self {
        match purchase {
            Purchase::Road(edge) => GameEvent::RoadBuilt { player, edge },
            Purchase::Settlement(vertex) => GameEvent::SettlementBuilt { player, vertex },
            Purchase::City(vertex) => GameEvent::CityBuilt { player, vertex },
            Purchase::Trade(trade) => GameEvent::BankTraded { player, trade },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Tile, TileType};
    use crate::player::{costs, PlayerColor};

    fn setup() -> (Board, Player) {
        let mut board = Board::from_rows(vec![vec![Tile::new(6, TileType::Field); 3]; 3]).unwrap();
        let start = Vertex::new(1, 1);
        let road = Edge::new(start, Vertex::new(1, 2)).unwrap();
        board.add_object(PlacedObject::free_road(&board, 0, road).unwrap());
        board.add_object(PlacedObject::free_settlement(&board, 0, start).unwrap());
        (board, Player::new(0, PlayerColor::Red))
    }

    #[test]
    fn test_failed_purchase_changes_nothing() {
        let (mut board, mut player) = setup();
        player.resources = ResourceBundle::with_amounts(0, 1, 0, 0, 0);
        let before = board.clone();

        let attempt = Move::new(0, Purchase::Settlement(Vertex::new(3, 3)));
        assert!(attempt.apply(&mut board, &mut player).is_err());

        let edge = Edge::new(Vertex::new(1, 2), Vertex::new(1, 3)).unwrap();
        let attempt = Move::new(0, Purchase::Road(edge));
        assert_eq!(
            attempt.apply(&mut board, &mut player),
            Err(MoveError::InsufficientResources)
        );

        assert_eq!(player.resources, ResourceBundle::with_amounts(0, 1, 0, 0, 0));
        assert_eq!(board, before);
    }

    #[test]
    fn test_illegal_location_does_not_charge() {
        let (mut board, mut player) = setup();
        player.resources = costs::settlement();

        // Adjacent to the existing settlement
        let attempt = Move::new(0, Purchase::Settlement(Vertex::new(1, 2)));
        assert!(matches!(
            attempt.apply(&mut board, &mut player),
            Err(MoveError::Placement(PlacementError::InvalidLocation { .. }))
        ));
        assert_eq!(player.resources, costs::settlement());
    }

    #[test]
    fn test_city_purchase_upgrades() {
        let (mut board, mut player) = setup();
        player.resources = costs::city();

        Move::new(0, Purchase::City(Vertex::new(1, 1)))
            .apply(&mut board, &mut player)
            .unwrap();

        assert!(player.resources.is_empty());
        let at = board.objects_at(&Vertex::new(1, 1));
        assert_eq!(at.len(), 1);
        assert_eq!(at[0].kind(), ObjectKind::City);
    }

    #[test]
    fn test_moves_require_affordability() {
        let (board, mut player) = setup();
        assert!(moves_for_player(&board, &player).is_empty());

        player.resources = costs::road();
        let moves = moves_for_player(&board, &player);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| matches!(m.purchase, Purchase::Road(_))));
    }

    #[test]
    fn test_moves_are_all_legal() {
        let (board, mut player) = setup();
        player.resources = ResourceBundle::with_amounts(5, 5, 5, 5, 5);
        let moves = moves_for_player(&board, &player);

        assert!(moves.iter().any(|m| matches!(m.purchase, Purchase::City(_))));
        for m in &moves {
            let mut board = board.clone();
            let mut player = player.clone();
            assert!(m.apply(&mut board, &mut player).is_ok(), "{:?} should apply", m);
        }
    }

    #[test]
    fn test_action_purchase_conversion() {
        let action = GameAction::BankTrade {
            give: Resource::Wood,
            receive: Resource::Stone,
        };
        let purchase = action.purchase().unwrap();
        assert_eq!(GameAction::from(purchase), action);
        assert_eq!(GameAction::EndTurn.purchase(), None);
    }
}
