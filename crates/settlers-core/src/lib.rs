//! Settlers - rules engine for a square-grid settlement game
//!
//! This crate provides the core game logic, including:
//! - Vertex and edge coordinates on a rectangular tile grid
//! - Board representation with tiles and placed pieces
//! - Player resources, costs and 3:1 bank trading
//! - Computer players and the turn/game state machine
//!
//! # Architecture
//!
//! The engine does no I/O. A host drives [`GameState::step`], renders
//! [`GameSnapshot`]s, and feeds the human's decisions back through
//! [`GameState::apply_action`].
//!
//! # Modules
//!
//! - [`grid`]: Vertex and edge coordinates
//! - [`board`]: Tiles, resources and the pieces placed on the board
//! - [`objects`]: Roads, settlements and cities with their placement rules
//! - [`player`]: Players, resource bundles and costs
//! - [`trade`]: Bank trade planning
//! - [`actions`]: Purchases, moves, player actions and game events
//! - [`bot`]: Computer player heuristics
//! - [`game`]: Game state machine

pub mod actions;
pub mod board;
pub mod bot;
pub mod game;
pub mod grid;
pub mod objects;
pub mod player;
pub mod trade;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, Move, MoveError, Purchase};
pub use board::{Board, BoardError, BoardSnapshot, PlayerId, Resource, Tile, TileType};
pub use bot::{Bot, HeuristicWeights, InitialPlacement};
pub use game::{GameConfig, GameError, GamePhase, GameSnapshot, GameState, PlayerSnapshot, Step};
pub use grid::{Edge, Vertex};
pub use objects::{ObjectKind, PlacedObject, PlacementError};
pub use player::{Player, PlayerColor, ResourceBundle, ResourceMetric};
pub use trade::{apply_trades, plan_trades, TradeExchange};
