//! Player state and resource management.
//!
//! This module contains:
//! - Player struct with color and held resources
//! - ResourceBundle for managing resource counts
//! - ResourceMetric, the probability-weighted production estimate
//! - Building costs

use crate::board::{Board, BoardError, PlayerId, Resource};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random resources each player starts with
pub const STARTING_RESOURCES: u32 = 7;

/// Player color for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    White,
    Blue,
    Green,
    Yellow,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 5] = [
        PlayerColor::Red,
        PlayerColor::White,
        PlayerColor::Blue,
        PlayerColor::Green,
        PlayerColor::Yellow,
    ];

    /// `count` distinct colors in random order
    pub fn shuffled<R: Rng>(count: usize, rng: &mut R) -> Vec<PlayerColor> {
        let mut colors = Self::ALL.to_vec();
        colors.shuffle(rng);
        colors.truncate(count);
        colors
    }
}

/// A quantity of each resource kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub wood: u32,
    pub clay: u32,
    pub stone: u32,
    pub grain: u32,
    pub sheep: u32,
}

impl ResourceBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bundle with specific amounts
    pub fn with_amounts(wood: u32, clay: u32, stone: u32, grain: u32, sheep: u32) -> Self {
        Self {
            wood,
            clay,
            stone,
            grain,
            sheep,
        }
    }

    /// Create a bundle with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut bundle = Self::new();
        bundle.add(resource, amount);
        bundle
    }

    /// `count` units, each of a uniformly random kind
    pub fn random<R: Rng>(count: u32, rng: &mut R) -> Self {
        let mut bundle = Self::new();
        for _ in 0..count {
            if let Some(resource) = Resource::ALL.choose(rng) {
                bundle.add(*resource, 1);
            }
        }
        bundle
    }

    /// Total number of resource units
    pub fn total(&self) -> u32 {
        self.wood + self.clay + self.stone + self.grain + self.sheep
    }

    /// Check if bundle is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Clay => self.clay,
            Resource::Stone => self.stone,
            Resource::Grain => self.grain,
            Resource::Sheep => self.sheep,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Wood => self.wood = count,
            Resource::Clay => self.clay = count,
            Resource::Stone => self.stone = count,
            Resource::Grain => self.grain = count,
            Resource::Sheep => self.sheep = count,
        }
    }

    /// Add resources to bundle
    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    /// Add another bundle to this one
    pub fn add_bundle(&mut self, other: &ResourceBundle) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Component-wise "is at least": true when every slot covers `cost`
    pub fn can_afford(&self, cost: &ResourceBundle) -> bool {
        Resource::ALL
            .iter()
            .all(|&r| self.get(r) >= cost.get(r))
    }

    /// Try to subtract, returning false (and leaving the bundle untouched)
    /// if any slot is insufficient
    pub fn try_subtract(&mut self, cost: &ResourceBundle) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            self.set(resource, self.get(resource) - cost.get(resource));
        }
        true
    }

    /// Per-slot shortfall against `cost`
    pub fn missing(&self, cost: &ResourceBundle) -> ResourceBundle {
        let mut missing = ResourceBundle::new();
        for resource in Resource::ALL {
            missing.set(resource, cost.get(resource).saturating_sub(self.get(resource)));
        }
        missing
    }
}

impl fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Resource::ALL
            .iter()
            .map(|r| format!("{} {}", r, self.get(*r)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Building costs
pub mod costs {
    use super::ResourceBundle;

    /// Cost to build a road: 1 wood, 1 clay
    pub fn road() -> ResourceBundle {
        ResourceBundle::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 clay, 1 grain, 1 sheep
    pub fn settlement() -> ResourceBundle {
        ResourceBundle::with_amounts(1, 1, 0, 1, 1)
    }

    /// Cost to upgrade to city: 2 stone, 3 grain
    pub fn city() -> ResourceBundle {
        ResourceBundle::with_amounts(0, 0, 2, 3, 0)
    }
}

/// Probability-weighted production estimate per resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetric([i32; 5]);

impl ResourceMetric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: Resource) -> i32 {
        self.0[resource.index()]
    }

    pub fn add(&mut self, resource: Resource, amount: i32) {
        self.0[resource.index()] += amount;
    }

    pub fn add_metric(&mut self, other: &ResourceMetric) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Resources from least to most productive; ties keep slot order
    pub fn ordered(&self) -> Vec<Resource> {
        let mut resources = Resource::ALL.to_vec();
        resources.sort_by_key(|r| self.get(*r));
        resources
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub color: PlayerColor,
    /// Current resources
    pub resources: ResourceBundle,
}

impl Player {
    /// Create a new player with an empty bundle
    pub fn new(id: PlayerId, color: PlayerColor) -> Self {
        Self {
            id,
            color,
            resources: ResourceBundle::new(),
        }
    }

    /// Victory points from this player's pieces on the board
    pub fn victory_points(&self, board: &Board) -> u32 {
        board.victory_points(self.id)
    }

    /// Check if player can afford a cost
    pub fn can_afford(&self, cost: &ResourceBundle) -> bool {
        self.resources.can_afford(cost)
    }

    /// Summed production metric of every productive piece this player owns
    pub fn production_metric(&self, board: &Board) -> Result<ResourceMetric, BoardError> {
        let mut metric = ResourceMetric::new();
        for object in board.objects_matching(|o| o.owner() == Some(self.id)) {
            metric.add_metric(&object.metric(board)?);
        }
        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Tile, TileType};
    use crate::grid::Vertex;
    use crate::objects::PlacedObject;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_resource_bundle_operations() {
        let mut bundle = ResourceBundle::new();
        assert!(bundle.is_empty());

        bundle.add(Resource::Wood, 3);
        bundle.add(Resource::Sheep, 2);
        assert_eq!(bundle.total(), 5);
        assert_eq!(bundle.get(Resource::Wood), 3);

        assert!(bundle.try_subtract(&ResourceBundle::single(Resource::Wood, 2)));
        assert_eq!(bundle.get(Resource::Wood), 1);
    }

    #[test]
    fn test_failed_subtract_leaves_bundle_unchanged() {
        let mut bundle = ResourceBundle::with_amounts(0, 1, 0, 0, 0);
        assert!(!bundle.try_subtract(&costs::settlement()));
        assert_eq!(bundle, ResourceBundle::with_amounts(0, 1, 0, 0, 0));
    }

    #[test]
    fn test_costs() {
        assert_eq!(costs::road().total(), 2);
        assert_eq!(costs::settlement().total(), 4);
        assert_eq!(costs::city().get(Resource::Stone), 2);
        assert_eq!(costs::city().get(Resource::Grain), 3);
    }

    #[test]
    fn test_missing() {
        let bundle = ResourceBundle::with_amounts(2, 0, 1, 0, 0);
        let missing = bundle.missing(&costs::city());
        assert_eq!(missing, ResourceBundle::with_amounts(0, 0, 1, 3, 0));
    }

    #[test]
    fn test_random_bundle_size() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ResourceBundle::random(STARTING_RESOURCES, &mut rng).total(), 7);
    }

    #[test]
    fn test_shuffled_colors_are_distinct() {
        let mut rng = StdRng::seed_from_u64(11);
        let colors = PlayerColor::shuffled(5, &mut rng);
        assert_eq!(colors.len(), 5);
        for color in PlayerColor::ALL {
            assert_eq!(colors.iter().filter(|c| **c == color).count(), 1);
        }
    }

    #[test]
    fn test_metric_ordering() {
        let mut metric = ResourceMetric::new();
        metric.add(Resource::Wood, 5);
        metric.add(Resource::Stone, 2);
        assert_eq!(
            metric.ordered(),
            vec![
                Resource::Clay,
                Resource::Grain,
                Resource::Sheep,
                Resource::Stone,
                Resource::Wood
            ]
        );
    }

    #[test]
    fn test_production_metric_sums_owned_pieces() {
        let mut board = Board::from_rows(vec![
            vec![Tile::new(6, TileType::Forest), Tile::new(8, TileType::Field)],
            vec![Tile::new(2, TileType::Desert), Tile::new(5, TileType::Quarry)],
        ])
        .unwrap();
        board.add_object(PlacedObject::free_settlement(&board, 0, Vertex::new(1, 1)).unwrap());

        let player = Player::new(0, PlayerColor::Red);
        let metric = player.production_metric(&board).unwrap();
        assert_eq!(metric.get(Resource::Wood), 5);
        assert_eq!(metric.get(Resource::Grain), 5);
        assert_eq!(metric.get(Resource::Stone), 4);
        assert_eq!(metric.get(Resource::Sheep), 0);

        let other = Player::new(1, PlayerColor::Blue);
        assert_eq!(other.production_metric(&board).unwrap(), ResourceMetric::new());
    }
}
