//! Pieces placed on the board and the rules for placing them.
//!
//! Every piece is a [`PlacedObject`]. Legal positions are decided by the
//! associated predicates (`road_is_legal`, `settlement_is_legal`,
//! `city_is_legal`); the constructors run the same predicate and refuse with
//! [`PlacementError::InvalidLocation`], so a piece never exists in an illegal
//! spot. The `free_*` constructors are the setup-phase escape hatch that skips
//! the road network requirement.

use crate::board::{Board, BoardError, PlayerId};
use crate::grid::{Edge, Vertex};
use crate::player::{costs, Player, ResourceBundle, ResourceMetric};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Kind of piece, independent of position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Road,
    Settlement,
    City,
}

impl ObjectKind {
    /// Resources charged to build this kind
    pub fn cost(&self) -> ResourceBundle {
        match self {
            ObjectKind::Road => costs::road(),
            ObjectKind::Settlement => costs::settlement(),
            ObjectKind::City => costs::city(),
        }
    }

    /// Units collected per matching tile; zero for roads
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            ObjectKind::Road => 0,
            ObjectKind::Settlement => 1,
            ObjectKind::City => 2,
        }
    }
}

/// Errors from placing pieces or using their production
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementError {
    #[error("Invalid location for {kind:?}")]
    InvalidLocation { kind: ObjectKind },

    #[error("Productive piece has no owner")]
    NoOwner,

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Production capability of a settlement or city
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Production {
    pub owner: Option<PlayerId>,
    pub vertex: Vertex,
    pub multiplier: u32,
}

/// A piece on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlacedObject {
    Road {
        owner: Option<PlayerId>,
        edge: Edge,
    },
    Settlement {
        owner: Option<PlayerId>,
        vertex: Vertex,
    },
    City {
        owner: Option<PlayerId>,
        vertex: Vertex,
    },
}

impl PlacedObject {
    // ==================== Legality ====================

    /// A road extends `player`'s network: one endpoint touches one of their
    /// roads, and the edge is not already taken.
    pub fn road_is_legal(board: &Board, player: PlayerId, edge: Edge) -> bool {
        board.contains_edge(&edge)
            && board.road_at(&edge).is_none()
            && edge.endpoints().iter().any(|v| board.has_road_to(v, player))
    }

    /// A settlement needs the distance rule and, outside setup, one of
    /// `player`'s roads ending at the vertex.
    pub fn settlement_is_legal(
        board: &Board,
        player: PlayerId,
        vertex: Vertex,
        ignore_network: bool,
    ) -> bool {
        board.contains_vertex(&vertex)
            && board.satisfies_distance_rule(&vertex)
            && (ignore_network || board.has_road_to(&vertex, player))
    }

    /// A city only replaces `player`'s own settlement
    pub fn city_is_legal(board: &Board, player: PlayerId, vertex: Vertex) -> bool {
        matches!(
            board.building_at(&vertex),
            Some(PlacedObject::Settlement { owner: Some(owner), .. }) if *owner == player
        )
    }

    /// Re-run this piece's legality predicate. Meaningful before the piece
    /// is added, since a placed piece occupies its own spot.
    pub fn valid_location(&self, board: &Board) -> bool {
        let Some(owner) = self.owner() else {
            return false;
        };
        match *self {
            PlacedObject::Road { edge, .. } => Self::road_is_legal(board, owner, edge),
            PlacedObject::Settlement { vertex, .. } => {
                Self::settlement_is_legal(board, owner, vertex, false)
            }
            PlacedObject::City { vertex, .. } => Self::city_is_legal(board, owner, vertex),
        }
    }

    // ==================== Constructors ====================

    /// A road for `player` on `edge`
    pub fn road(board: &Board, player: PlayerId, edge: Edge) -> Result<Self, PlacementError> {
        if !Self::road_is_legal(board, player, edge) {
            return Err(PlacementError::InvalidLocation {
                kind: ObjectKind::Road,
            });
        }
        Ok(PlacedObject::Road {
            owner: Some(player),
            edge,
        })
    }

    /// A settlement for `player` on `vertex`
    pub fn settlement(
        board: &Board,
        player: PlayerId,
        vertex: Vertex,
    ) -> Result<Self, PlacementError> {
        if !Self::settlement_is_legal(board, player, vertex, false) {
            return Err(PlacementError::InvalidLocation {
                kind: ObjectKind::Settlement,
            });
        }
        Ok(PlacedObject::Settlement {
            owner: Some(player),
            vertex,
        })
    }

    /// A city replacing `player`'s settlement on `vertex`
    pub fn city(board: &Board, player: PlayerId, vertex: Vertex) -> Result<Self, PlacementError> {
        if !Self::city_is_legal(board, player, vertex) {
            return Err(PlacementError::InvalidLocation {
                kind: ObjectKind::City,
            });
        }
        Ok(PlacedObject::City {
            owner: Some(player),
            vertex,
        })
    }

    /// Setup road: no network requirement, but the edge must be on the board
    /// and free.
    pub fn free_road(board: &Board, player: PlayerId, edge: Edge) -> Result<Self, PlacementError> {
        if !board.contains_edge(&edge) || board.road_at(&edge).is_some() {
            return Err(PlacementError::InvalidLocation {
                kind: ObjectKind::Road,
            });
        }
        Ok(PlacedObject::Road {
            owner: Some(player),
            edge,
        })
    }

    /// Setup settlement: distance rule only
    pub fn free_settlement(
        board: &Board,
        player: PlayerId,
        vertex: Vertex,
    ) -> Result<Self, PlacementError> {
        if !Self::settlement_is_legal(board, player, vertex, true) {
            return Err(PlacementError::InvalidLocation {
                kind: ObjectKind::Settlement,
            });
        }
        Ok(PlacedObject::Settlement {
            owner: Some(player),
            vertex,
        })
    }

    // ==================== Accessors ====================

    pub fn kind(&self) -> ObjectKind {
        match self {
            PlacedObject::Road { .. } => ObjectKind::Road,
            PlacedObject::Settlement { .. } => ObjectKind::Settlement,
            PlacedObject::City { .. } => ObjectKind::City,
        }
    }

    pub fn owner(&self) -> Option<PlayerId> {
        match *self {
            PlacedObject::Road { owner, .. }
            | PlacedObject::Settlement { owner, .. }
            | PlacedObject::City { owner, .. } => owner,
        }
    }

    /// Position of a settlement or city
    pub fn vertex(&self) -> Option<Vertex> {
        match *self {
            PlacedObject::Settlement { vertex, .. } | PlacedObject::City { vertex, .. } => {
                Some(vertex)
            }
            PlacedObject::Road { .. } => None,
        }
    }

    /// Position of a road
    pub fn edge(&self) -> Option<Edge> {
        match *self {
            PlacedObject::Road { edge, .. } => Some(edge),
            _ => None,
        }
    }

    /// Victory points provided by this piece
    pub fn victory_points(&self) -> u32 {
        match self {
            PlacedObject::Road { .. } => 0,
            PlacedObject::Settlement { .. } => 1,
            PlacedObject::City { .. } => 2,
        }
    }

    /// Production capability; `None` for roads
    pub fn production(&self) -> Option<Production> {
        self.vertex().map(|vertex| Production {
            owner: self.owner(),
            vertex,
            multiplier: self.kind().resource_multiplier(),
        })
    }

    pub fn is_productive(&self) -> bool {
        self.production().is_some()
    }

    // ==================== Production ====================

    /// Everything this piece collects for a dice total
    pub fn resources_for_roll(
        &self,
        board: &Board,
        dice_total: u8,
    ) -> Result<ResourceBundle, BoardError> {
        let mut bundle = ResourceBundle::new();
        if let Some(production) = self.production() {
            for tile in board.tiles_at_vertex(&production.vertex)? {
                bundle.add_bundle(&tile.production(dice_total, production.multiplier));
            }
        }
        Ok(bundle)
    }

    /// Hand this piece's production for `dice_total` to its owner. Returns
    /// whether anything was transferred.
    pub fn give_resources_to_owner(
        &self,
        board: &Board,
        dice_total: u8,
        players: &mut [Player],
    ) -> Result<bool, PlacementError> {
        if !self.is_productive() {
            return Ok(false);
        }
        let owner = self.owner().ok_or(PlacementError::NoOwner)?;
        let player = players
            .iter_mut()
            .find(|p| p.id == owner)
            .ok_or(PlacementError::NoOwner)?;

        let bundle = self.resources_for_roll(board, dice_total)?;
        if bundle.is_empty() {
            return Ok(false);
        }
        debug!(player = owner, %bundle, dice_total, "Produced resources");
        player.resources.add_bundle(&bundle);
        Ok(true)
    }

    /// Probability-weighted production estimate of this piece
    pub fn metric(&self, board: &Board) -> Result<ResourceMetric, BoardError> {
        let mut metric = ResourceMetric::new();
        if let Some(production) = self.production() {
            for tile in board.tiles_at_vertex(&production.vertex)? {
                if let Some(resource) = tile.resource() {
                    metric.add(resource, (production.multiplier * tile.probability()) as i32);
                }
            }
        }
        Ok(metric)
    }
}
