//! Game board representation including tiles and placed pieces.
//!
//! This module contains:
//! - Resource and tile types
//! - The rectangular tile grid
//! - The ordered collection of placed pieces
//! - Clipping geometry queries and board construction helpers

use crate::grid::{Edge, Vertex};
use crate::objects::{ObjectKind, PlacedObject, PlacementError};
use crate::player::ResourceBundle;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Player identifier
pub type PlayerId = u8;

/// Lowest dice total a tile can be numbered with
pub const FREQUENCY_MIN: u8 = 2;

/// Highest dice total a tile can be numbered with
pub const FREQUENCY_MAX: u8 = 12;

/// Largest number of tile rows or columns
pub const MAX_DIMENSION: usize = 255;

/// Resource kinds, in bundle slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Wood,
    Clay,
    Stone,
    Grain,
    Sheep,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Clay,
        Resource::Stone,
        Resource::Grain,
        Resource::Sheep,
    ];

    /// Slot index inside a bundle or metric
    pub fn index(&self) -> usize {
        match self {
            Resource::Wood => 0,
            Resource::Clay => 1,
            Resource::Stone => 2,
            Resource::Grain => 3,
            Resource::Sheep => 4,
        }
    }

    /// Parse a lowercase resource name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wood" => Some(Resource::Wood),
            "clay" => Some(Resource::Clay),
            "stone" => Some(Resource::Stone),
            "grain" => Some(Resource::Grain),
            "sheep" => Some(Resource::Sheep),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Wood => "wood",
            Resource::Clay => "clay",
            Resource::Stone => "stone",
            Resource::Grain => "grain",
            Resource::Sheep => "sheep",
        };
        f.pad(name)
    }
}

/// Type of a tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Desert,
    Forest,
    Pasture,
    Clay,
    Field,
    Quarry,
    Coast,
    Ocean,
}

impl TileType {
    /// Land types a random board is drawn from
    pub const LAND: [TileType; 6] = [
        TileType::Desert,
        TileType::Forest,
        TileType::Pasture,
        TileType::Clay,
        TileType::Field,
        TileType::Quarry,
    ];

    /// The resource this tile type produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self {
            TileType::Forest => Some(Resource::Wood),
            TileType::Clay => Some(Resource::Clay),
            TileType::Quarry => Some(Resource::Stone),
            TileType::Field => Some(Resource::Grain),
            TileType::Pasture => Some(Resource::Sheep),
            TileType::Desert | TileType::Coast | TileType::Ocean => None,
        }
    }

    /// Everything except ocean and coast is land
    pub fn is_land(&self) -> bool {
        !matches!(self, TileType::Coast | TileType::Ocean)
    }

    /// Parse a tile type name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "desert" => Some(TileType::Desert),
            "forest" => Some(TileType::Forest),
            "pasture" => Some(TileType::Pasture),
            "clay" => Some(TileType::Clay),
            "field" => Some(TileType::Field),
            "quarry" => Some(TileType::Quarry),
            "coast" => Some(TileType::Coast),
            "ocean" => Some(TileType::Ocean),
            _ => None,
        }
    }
}

/// Relative weight of rolling `frequency` with two dice, out of 36.
///
/// Triangular around 7; anything outside 2..=12 has weight 0.
pub fn frequency_probability(frequency: u8) -> u32 {
    if !(FREQUENCY_MIN..=FREQUENCY_MAX).contains(&frequency) {
        return 0;
    }
    6 - (7 - frequency as i32).unsigned_abs()
}

/// A single tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Dice total that triggers production (2-12)
    pub frequency: u8,
    pub tile_type: TileType,
}

impl Tile {
    pub const fn new(frequency: u8, tile_type: TileType) -> Self {
        Self {
            frequency,
            tile_type,
        }
    }

    /// Get the resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        self.tile_type.resource()
    }

    /// Check if this tile produces resources
    pub fn is_productive(&self) -> bool {
        self.resource().is_some()
    }

    /// Dice weight of this tile's frequency
    pub fn probability(&self) -> u32 {
        frequency_probability(self.frequency)
    }

    /// `count` units of this tile's resource, or an empty bundle for
    /// desert, coast and ocean.
    pub fn resources(&self, count: u32) -> ResourceBundle {
        match self.resource() {
            Some(resource) => ResourceBundle::single(resource, count),
            None => ResourceBundle::new(),
        }
    }

    /// What this tile yields for a dice total
    pub fn production(&self, dice_total: u8, count: u32) -> ResourceBundle {
        if self.frequency == dice_total {
            self.resources(count)
        } else {
            ResourceBundle::new()
        }
    }

    /// `number` frequencies spread as evenly as possible over 2..=12.
    ///
    /// Whole cycles of the range come first; the remainder is drawn from a
    /// shuffled pool without repetition, then the whole list is shuffled.
    pub fn distributed_frequencies<R: Rng>(number: usize, rng: &mut R) -> Vec<u8> {
        let range: Vec<u8> = (FREQUENCY_MIN..=FREQUENCY_MAX).collect();
        let mut frequencies = Vec::with_capacity(number);

        for _ in 0..number / range.len() {
            frequencies.extend_from_slice(&range);
        }

        let mut pool = range.clone();
        pool.shuffle(rng);
        frequencies.extend(pool.into_iter().take(number % range.len()));

        frequencies.shuffle(rng);
        frequencies
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self.tile_type, self.frequency)
    }
}

/// Errors raised by board geometry and construction
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("Board dimensions {rows}x{cols} are out of range 1..=255")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Tile ({row}, {col}) has not been initialized")]
    Uninitialized { row: i32, col: i32 },

    #[error("Tile ({row}, {col}) is outside the board")]
    TileOutOfBounds { row: i32, col: i32 },

    #[error("Tile ({row}, {col}) has frequency {frequency}, expected 2..=12")]
    InvalidFrequency { row: i32, col: i32, frequency: u8 },
}

/// The game board: a tile grid plus every piece placed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    /// Row-major tile grid; `None` until populated
    tiles: Vec<Option<Tile>>,
    /// Placed pieces in placement order
    objects: Vec<PlacedObject>,
}

impl Board {
    /// Create a board with no tiles populated yet
    pub fn new(rows: usize, cols: usize) -> Result<Self, BoardError> {
        if !(1..=MAX_DIMENSION).contains(&rows) || !(1..=MAX_DIMENSION).contains(&cols) {
            return Err(BoardError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            tiles: vec![None; rows * cols],
            objects: Vec::new(),
        })
    }

    /// Create a board covered entirely in ocean
    pub fn ocean(rows: usize, cols: usize) -> Result<Self, BoardError> {
        let mut board = Self::new(rows, cols)?;
        board.tiles.fill(Some(Tile::new(FREQUENCY_MIN, TileType::Ocean)));
        Ok(board)
    }

    /// Create a board of random land tiles with evenly spread frequencies
    pub fn random_land(rows: usize, cols: usize) -> Result<Self, BoardError> {
        let mut rng = rand::thread_rng();
        Self::random_land_with_rng(rows, cols, &mut rng)
    }

    /// Create a random land board with a provided RNG
    pub fn random_land_with_rng<R: Rng>(
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new(rows, cols)?;
        let frequencies = Tile::distributed_frequencies(rows * cols, rng);

        for (slot, frequency) in board.tiles.iter_mut().zip(frequencies) {
            let tile_type = *TileType::LAND.choose(rng).unwrap_or(&TileType::Desert);
            *slot = Some(Tile::new(frequency, tile_type));
        }

        Ok(board)
    }

    /// Build a board from rows of tiles; every row must be the same length
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, BoardError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut board = Self::new(rows.len(), cols)?;
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(BoardError::InvalidDimensions {
                    rows: board.rows,
                    cols: row.len(),
                });
            }
            for (c, tile) in row.into_iter().enumerate() {
                board.tiles[r * cols + c] = Some(tile);
            }
        }
        board.validate()?;
        Ok(board)
    }

    // ==================== Query Methods ====================

    /// Tile grid dimensions as `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Vertex grid dimensions, one larger than the tile grid each way
    pub fn vertex_dimensions(&self) -> (usize, usize) {
        (self.rows + 1, self.cols + 1)
    }

    /// Whether every tile has been populated
    pub fn is_initialized(&self) -> bool {
        self.tiles.iter().all(Option::is_some)
    }

    /// Check the board invariants: sane dimensions, fully populated grid,
    /// frequencies in range. Loaded boards must pass this before use.
    pub fn validate(&self) -> Result<(), BoardError> {
        if !(1..=MAX_DIMENSION).contains(&self.rows)
            || !(1..=MAX_DIMENSION).contains(&self.cols)
            || self.tiles.len() != self.rows * self.cols
        {
            return Err(BoardError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for (index, slot) in self.tiles.iter().enumerate() {
            let row = (index / self.cols) as i32;
            let col = (index % self.cols) as i32;
            let tile = (*slot).ok_or(BoardError::Uninitialized { row, col })?;
            if !(FREQUENCY_MIN..=FREQUENCY_MAX).contains(&tile.frequency) {
                return Err(BoardError::InvalidFrequency {
                    row,
                    col,
                    frequency: tile.frequency,
                });
            }
        }
        Ok(())
    }

    /// Whether `(row, col)` is inside the tile grid
    pub fn contains_tile(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Whether a vertex is inside the vertex grid
    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        vertex.row >= 0
            && vertex.col >= 0
            && (vertex.row as usize) <= self.rows
            && (vertex.col as usize) <= self.cols
    }

    /// Whether both endpoints of an edge are on the board
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        edge.endpoints().iter().all(|v| self.contains_vertex(v))
    }

    /// Get a tile; fails loudly when the position is off the board or unpopulated
    pub fn tile_at(&self, row: i32, col: i32) -> Result<&Tile, BoardError> {
        if !self.contains_tile(row, col) {
            return Err(BoardError::TileOutOfBounds { row, col });
        }
        self.tiles[row as usize * self.cols + col as usize]
            .as_ref()
            .ok_or(BoardError::Uninitialized { row, col })
    }

    /// Every populated tile with its position, row-major
    pub fn tiles(&self) -> impl Iterator<Item = ((i32, i32), &Tile)> {
        let cols = self.cols;
        self.tiles.iter().enumerate().filter_map(move |(index, slot)| {
            slot.as_ref()
                .map(|tile| (((index / cols) as i32, (index % cols) as i32), tile))
        })
    }

    /// Positions of the up-to-four tiles sharing a vertex, clipped to the board
    pub fn tile_positions_at_vertex(&self, vertex: &Vertex) -> Vec<(i32, i32)> {
        vertex
            .touching_tiles()
            .into_iter()
            .filter(|&(r, c)| self.contains_tile(r, c))
            .collect()
    }

    /// Tiles sharing a vertex, clipped to the board
    pub fn tiles_at_vertex(&self, vertex: &Vertex) -> Result<Vec<&Tile>, BoardError> {
        self.tile_positions_at_vertex(vertex)
            .into_iter()
            .map(|(r, c)| self.tile_at(r, c))
            .collect()
    }

    /// Vertices one step from `vertex`, clipped to the board
    pub fn adjacent_vertices(&self, vertex: &Vertex) -> Vec<Vertex> {
        vertex
            .neighbors()
            .into_iter()
            .filter(|v| self.contains_vertex(v))
            .collect()
    }

    /// Edges sharing exactly one endpoint with `edge`, clipped to the board
    pub fn adjacent_edges(&self, edge: &Edge) -> Vec<Edge> {
        edge.touching_edges()
            .into_iter()
            .filter(|e| self.contains_edge(e))
            .collect()
    }

    /// Every vertex on the board, row-major
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        (0..=self.rows as i32)
            .flat_map(move |r| (0..=self.cols as i32).map(move |c| Vertex::new(r, c)))
    }

    /// Every edge on the board
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for vertex in self.vertices() {
            for next in [vertex.offset(0, 1), vertex.offset(1, 0)] {
                if self.contains_vertex(&next) {
                    if let Some(edge) = Edge::new(vertex, next) {
                        edges.push(edge);
                    }
                }
            }
        }
        edges
    }

    // ==================== Piece Queries ====================

    /// All placed pieces in placement order
    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    /// Pieces matching a predicate, in placement order
    pub fn objects_matching<F>(&self, predicate: F) -> Vec<&PlacedObject>
    where
        F: Fn(&PlacedObject) -> bool,
    {
        self.objects.iter().filter(|o| predicate(o)).collect()
    }

    /// Vertex pieces (settlements and cities) located at `vertex`
    pub fn objects_at(&self, vertex: &Vertex) -> Vec<&PlacedObject> {
        self.objects_matching(|o| o.vertex() == Some(*vertex))
    }

    /// The settlement or city at a vertex, if any
    pub fn building_at(&self, vertex: &Vertex) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.vertex() == Some(*vertex))
    }

    /// The road on an edge, if any
    pub fn road_at(&self, edge: &Edge) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.edge() == Some(*edge))
    }

    /// Edges holding a road owned by `player`
    pub fn roads_of(&self, player: PlayerId) -> impl Iterator<Item = Edge> + '_ {
        self.objects
            .iter()
            .filter(move |o| o.owner() == Some(player))
            .filter_map(PlacedObject::edge)
    }

    /// Vertices holding a piece of `kind` owned by `player`
    pub fn buildings_of(&self, player: PlayerId, kind: ObjectKind) -> Vec<Vertex> {
        self.objects
            .iter()
            .filter(|o| o.owner() == Some(player) && o.kind() == kind)
            .filter_map(PlacedObject::vertex)
            .collect()
    }

    /// Whether `player` has a road ending at `vertex`
    pub fn has_road_to(&self, vertex: &Vertex, player: PlayerId) -> bool {
        self.roads_of(player).any(|edge| edge.has_endpoint(vertex))
    }

    /// Check if a vertex satisfies the distance rule: nothing built on it or
    /// on any adjacent vertex
    pub fn satisfies_distance_rule(&self, vertex: &Vertex) -> bool {
        self.building_at(vertex).is_none()
            && self
                .adjacent_vertices(vertex)
                .iter()
                .all(|adj| self.building_at(adj).is_none())
    }

    /// Victory points `player` holds on the board
    pub fn victory_points(&self, player: PlayerId) -> u32 {
        self.objects
            .iter()
            .filter(|o| o.owner() == Some(player))
            .map(PlacedObject::victory_points)
            .sum()
    }

    /// The highest victory-point total among all owners on the board
    pub fn highest_victory_points(&self) -> u32 {
        let mut owners: Vec<PlayerId> =
            self.objects.iter().filter_map(PlacedObject::owner).collect();
        owners.sort_unstable();
        owners.dedup();
        owners
            .into_iter()
            .map(|p| self.victory_points(p))
            .max()
            .unwrap_or(0)
    }

    // ==================== Mutation Methods ====================

    /// Paint a tile. Land converts any orthogonally neighbouring ocean into coast.
    pub fn set_tile(&mut self, row: i32, col: i32, tile: Tile) -> Result<(), BoardError> {
        if !self.contains_tile(row, col) {
            return Err(BoardError::TileOutOfBounds { row, col });
        }
        if !(FREQUENCY_MIN..=FREQUENCY_MAX).contains(&tile.frequency) {
            return Err(BoardError::InvalidFrequency {
                row,
                col,
                frequency: tile.frequency,
            });
        }
        self.tiles[row as usize * self.cols + col as usize] = Some(tile);

        if tile.tile_type.is_land() {
            for (r, c) in [(row - 1, col), (row + 1, col), (row, col - 1), (row, col + 1)] {
                if !self.contains_tile(r, c) {
                    continue;
                }
                let slot = &mut self.tiles[r as usize * self.cols + c as usize];
                if let Some(neighbour) = slot {
                    if neighbour.tile_type == TileType::Ocean {
                        neighbour.tile_type = TileType::Coast;
                    }
                }
            }
        }
        Ok(())
    }

    /// Add a constructed piece. Pieces come from the constructors in
    /// [`crate::objects`], which have already checked legality.
    pub fn add_object(&mut self, object: PlacedObject) {
        debug!(?object, "Placed piece");
        self.objects.push(object);
    }

    /// Replace `player`'s settlement at `vertex` with a city in the same slot.
    ///
    /// The swap is a single assignment, so no reader of the board ever sees
    /// both pieces or neither.
    pub fn upgrade_to_city(
        &mut self,
        vertex: Vertex,
        player: PlayerId,
    ) -> Result<(), PlacementError> {
        let city = PlacedObject::city(self, player, vertex)?;
        let index = self
            .objects
            .iter()
            .position(|o| o.kind() == ObjectKind::Settlement && o.vertex() == Some(vertex))
            .ok_or(PlacementError::InvalidLocation {
                kind: ObjectKind::City,
            })?;
        self.objects[index] = city;
        debug!(%vertex, player, "Upgraded settlement to city");
        Ok(())
    }

    /// Read-only view for display collaborators
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            rows: self.rows,
            cols: self.cols,
            tiles: self
                .tiles()
                .map(|((row, col), tile)| TileSnapshot {
                    row,
                    col,
                    tile_type: tile.tile_type,
                    frequency: tile.frequency,
                })
                .collect(),
            objects: self.objects.clone(),
        }
    }
}

/// Read-only board view handed to display collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub tiles: Vec<TileSnapshot>,
    pub objects: Vec<PlacedObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub row: i32,
    pub col: i32,
    pub tile_type: TileType,
    pub frequency: u8,
}
