//! Async game session.
//!
//! The session owns the [`GameState`] and steps it until the game ends.
//! Whenever the human has to decide something it waits on the input channel;
//! if that channel closes the game is terminated on the spot.

use crate::protocol::{self, InputEvent};
use settlers_core::{GameError, GameEvent, GamePhase, GameSnapshot, GameState, PlayerId, Step};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Messages from the session to whoever is displaying the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    /// Things that happened in the game
    Events(Vec<GameEvent>),
    /// The human has to act
    Prompt { player: PlayerId, phase: GamePhase },
    /// Answer to a query command
    Info(String),
    /// A command the game refused
    Rejected(String),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Won { winner: PlayerId, victory_points: u32 },
    /// Input closed or the human quit
    Terminated,
    /// `max_turns` ran out first
    TurnLimit { turns: u32 },
}

pub struct GameSession {
    game: GameState,
    input: mpsc::Receiver<InputEvent>,
    messages: mpsc::UnboundedSender<SessionMessage>,
    snapshots: watch::Sender<GameSnapshot>,
    max_turns: Option<u32>,
    /// Command typed while computer players were moving
    pending: Option<InputEvent>,
}

impl GameSession {
    /// Create a session; the returned receiver always holds the latest snapshot
    pub fn new(
        game: GameState,
        input: mpsc::Receiver<InputEvent>,
        messages: mpsc::UnboundedSender<SessionMessage>,
        max_turns: Option<u32>,
    ) -> (Self, watch::Receiver<GameSnapshot>) {
        let (snapshots, snapshot_rx) = watch::channel(game.snapshot());
        let session = Self {
            game,
            input,
            messages,
            snapshots,
            max_turns,
            pending: None,
        };
        (session, snapshot_rx)
    }

    /// Drive the game to its end
    pub async fn run(mut self) -> Result<SessionOutcome, GameError> {
        info!(players = self.game.player_count(), human = ?self.game.human(), "Session started");

        loop {
            if let Some(max_turns) = self.max_turns {
                if self.game.turn_number > max_turns && !self.game.is_finished() {
                    info!(max_turns, "Turn limit reached");
                    self.terminate();
                    return Ok(SessionOutcome::TurnLimit { turns: max_turns });
                }
            }

            let step = match self.game.step() {
                Ok(step) => step,
                Err(e) => {
                    error!("Game state corrupted: {}", e);
                    self.terminate();
                    return Err(e);
                }
            };

            match step {
                Step::Advanced(events) => {
                    self.publish();
                    self.send(SessionMessage::Events(events));
                    if !self.game.is_finished() && self.shutdown_requested() {
                        info!("Input closed");
                        self.terminate();
                        return Ok(SessionOutcome::Terminated);
                    }
                    tokio::task::yield_now().await;
                }
                Step::AwaitingHuman(player) => {
                    self.publish();
                    self.send(SessionMessage::Prompt {
                        player,
                        phase: self.game.phase,
                    });

                    let event = match self.pending.take() {
                        Some(event) => Some(event),
                        None => self.input.recv().await,
                    };
                    let Some(event) = event else {
                        info!("Input closed");
                        self.terminate();
                        return Ok(SessionOutcome::Terminated);
                    };
                    if !self.handle_input(player, event)? {
                        self.terminate();
                        return Ok(SessionOutcome::Terminated);
                    }
                }
                Step::Finished => return Ok(self.outcome()),
            }
        }
    }

    /// Handle one human command. Returns false if the human quit.
    fn handle_input(&mut self, player: PlayerId, event: InputEvent) -> Result<bool, GameError> {
        debug!(player, ?event, "Human input");
        match event {
            InputEvent::Action(action) => match self.game.apply_action(player, action) {
                Ok(events) => {
                    self.publish();
                    self.send(SessionMessage::Events(events));
                }
                Err(e) if e.is_fatal() => {
                    error!("Game state corrupted: {}", e);
                    self.terminate();
                    return Err(e);
                }
                Err(e) => {
                    warn!(player, "Rejected action: {}", e);
                    self.send(SessionMessage::Rejected(e.to_string()));
                }
            },
            InputEvent::Plan(kind) => {
                let reply = match self.game.trade_plan(player, kind) {
                    Some(trades) if trades.is_empty() => {
                        format!("You can already afford a {:?}", kind)
                    }
                    Some(trades) => {
                        let steps: Vec<String> = trades
                            .iter()
                            .map(|t| format!("trade {} {}", t.input, t.output))
                            .collect();
                        steps.join("\n")
                    }
                    None => format!("No bank trades can pay for a {:?}", kind),
                };
                self.send(SessionMessage::Info(reply));
            }
            InputEvent::ShowMoves => {
                let moves = self.game.legal_moves(player);
                let reply = if moves.is_empty() {
                    "No affordable moves".to_string()
                } else {
                    let lines: Vec<String> =
                        moves.iter().map(|m| format!("{:?}", m.purchase)).collect();
                    lines.join("\n")
                };
                self.send(SessionMessage::Info(reply));
            }
            InputEvent::ShowMetric => {
                let metric = match self.game.production_metric(player) {
                    Ok(metric) => metric,
                    Err(e) => {
                        error!("Game state corrupted: {}", e);
                        self.terminate();
                        return Err(e);
                    }
                };
                let lines: Vec<String> = metric
                    .ordered()
                    .into_iter()
                    .map(|r| format!("  {:<6} {}", r, metric.get(r)))
                    .collect();
                let reply = format!("Production per 36 rolls:\n{}", lines.join("\n"));
                self.send(SessionMessage::Info(reply));
            }
            InputEvent::ShowBoard => {
                let board = protocol::render_snapshot(&self.game.snapshot());
                self.send(SessionMessage::Info(board));
            }
            InputEvent::Help => self.send(SessionMessage::Info(protocol::HELP.to_string())),
            InputEvent::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Poll the input between computer moves. A closed channel means
    /// shutdown; a command that arrived early is held for the next prompt.
    fn shutdown_requested(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        match self.input.try_recv() {
            Ok(event) => {
                debug!(?event, "Input held until the next prompt");
                self.pending = Some(event);
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }

    fn outcome(&self) -> SessionOutcome {
        match self.game.get_winner() {
            Some(winner) => SessionOutcome::Won {
                winner,
                victory_points: self.game.victory_points(winner),
            },
            None => SessionOutcome::Terminated,
        }
    }

    fn terminate(&mut self) {
        let event = self.game.terminate();
        self.publish();
        self.send(SessionMessage::Events(vec![event]));
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.game.snapshot());
    }

    fn send(&self, message: SessionMessage) {
        let _ = self.messages.send(message);
    }
}
