//! Computer-controlled players.
//!
//! Two policies live here:
//! - Setup: score every free vertex with a stage-aware tile heuristic and
//!   settle on the best one, with a road pointing at the runner-up
//! - Regular turns: pick uniformly among the legal, affordable moves

use crate::actions::{moves_for_player, Move};
use crate::board::{Board, BoardError, PlayerId, Resource};
use crate::grid::{Edge, Vertex};
use crate::player::{Player, ResourceMetric};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Tunable constants of the tile heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicWeights {
    /// Weight every resource starts from
    pub base: i32,
    /// Game stages below this favour wood and clay over stone
    pub early_stage: u32,
    /// Game stages above this stop favouring wood and clay
    pub late_stage: u32,
    /// Size of each stage adjustment
    pub adjustment: i32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            base: 7,
            early_stage: 4,
            late_stage: 6,
            adjustment: 1,
        }
    }
}

impl HeuristicWeights {
    /// Weight of `resource` at `game_stage` (the highest victory-point total
    /// on the board)
    pub fn weight(&self, resource: Resource, game_stage: u32) -> i32 {
        let expansion = matches!(resource, Resource::Wood | Resource::Clay);
        let mut weight = self.base;
        if game_stage < self.early_stage {
            if expansion {
                weight += self.adjustment;
            } else if resource == Resource::Stone {
                weight -= self.adjustment;
            }
        }
        if game_stage > self.late_stage && expansion {
            weight -= self.adjustment;
        }
        weight
    }
}

/// Score one tile for a player whose production is `metric`.
///
/// `weight * probability`, plus a term that shrinks as the player already
/// produces more of the tile's resource. Barren tiles score 0.
pub fn tile_value(
    board: &Board,
    row: i32,
    col: i32,
    game_stage: u32,
    metric: &ResourceMetric,
    weights: &HeuristicWeights,
) -> Result<i32, BoardError> {
    let tile = board.tile_at(row, col)?;
    let Some(resource) = tile.resource() else {
        return Ok(0);
    };
    let weight = weights.weight(resource, game_stage);
    Ok(weight * tile.probability() as i32 + (game_stage as i32 / 2 - metric.get(resource)))
}

/// Sum of `tile_value` over the tiles sharing `vertex`
pub fn vertex_value(
    board: &Board,
    vertex: &Vertex,
    game_stage: u32,
    metric: &ResourceMetric,
    weights: &HeuristicWeights,
) -> Result<i32, BoardError> {
    board
        .tile_positions_at_vertex(vertex)
        .into_iter()
        .map(|(r, c)| tile_value(board, r, c, game_stage, metric, weights))
        .sum()
}

/// Where a computer player puts a free settlement and its road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPlacement {
    pub settlement: Vertex,
    pub road: Edge,
}

/// A bot player that can decide on moves
#[derive(Debug, Clone)]
pub struct Bot {
    pub player_id: PlayerId,
    weights: HeuristicWeights,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            weights: HeuristicWeights::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, seed: u64) -> Self {
        Self {
            player_id,
            weights: HeuristicWeights::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Pick one legal, affordable move uniformly at random
    pub fn choose_move(&mut self, board: &Board, player: &Player) -> Option<Move> {
        let moves = moves_for_player(board, player);
        moves.choose(&mut self.rng).copied()
    }

    /// Best free vertex for a setup settlement plus the road to build with it.
    ///
    /// Returns `Ok(None)` when no vertex on the board is free.
    pub fn choose_initial_placement(
        &self,
        board: &Board,
        player: &Player,
    ) -> Result<Option<InitialPlacement>, BoardError> {
        let game_stage = board.highest_victory_points();
        let metric = player.production_metric(board)?;

        let mut best: Option<(Vertex, i32)> = None;
        let mut second: Option<(Vertex, i32)> = None;

        for vertex in board.vertices() {
            if !board.satisfies_distance_rule(&vertex) {
                continue;
            }
            let value = vertex_value(board, &vertex, game_stage, &metric, &self.weights)?;
            match best {
                Some((_, top)) if value <= top => {
                    if second.map_or(true, |(_, runner_up)| value > runner_up) {
                        second = Some((vertex, value));
                    }
                }
                _ => {
                    second = best;
                    best = Some((vertex, value));
                }
            }
        }

        let Some((settlement, _)) = best else {
            return Ok(None);
        };
        let road_to = self.road_direction(board, settlement, second.map(|(v, _)| v));

        Ok(road_to
            .and_then(|to| Edge::new(settlement, to))
            .map(|road| InitialPlacement { settlement, road }))
    }

    /// One step from `from` toward `target` along whichever axis the target
    /// is further away on. Falls back to any free neighbour if there is no
    /// target or that edge already has a road.
    fn road_direction(
        &self,
        board: &Board,
        from: Vertex,
        target: Option<Vertex>,
    ) -> Option<Vertex> {
        let free = |to: &Vertex| {
            board.contains_vertex(to)
                && Edge::new(from, *to).is_some_and(|edge| board.road_at(&edge).is_none())
        };

        target
            .map(|target| {
                let (d_col, d_row) = from.distance_to(&target);
                if d_col.abs() > d_row.abs() {
                    from.offset(0, d_col.signum())
                } else {
                    from.offset(d_row.signum(), 0)
                }
            })
            .filter(|step| free(step))
            .or_else(|| board.adjacent_vertices(&from).into_iter().find(|n| free(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Tile, TileType};
    use crate::objects::PlacedObject;
    use crate::player::{costs, PlayerColor};

    #[test]
    fn test_stage_weights() {
        let weights = HeuristicWeights::default();
        assert_eq!(weights.weight(Resource::Wood, 0), 8);
        assert_eq!(weights.weight(Resource::Stone, 0), 6);
        assert_eq!(weights.weight(Resource::Grain, 0), 7);
        assert_eq!(weights.weight(Resource::Wood, 5), 7);
        assert_eq!(weights.weight(Resource::Clay, 8), 6);
        assert_eq!(weights.weight(Resource::Stone, 8), 7);
    }

    #[test]
    fn test_tile_value() {
        let board = Board::from_rows(vec![vec![
            Tile::new(6, TileType::Forest),
            Tile::new(6, TileType::Desert),
        ]])
        .unwrap();
        let weights = HeuristicWeights::default();
        let mut metric = ResourceMetric::new();

        // 8 * 5 + (0 / 2 - 0)
        assert_eq!(tile_value(&board, 0, 0, 0, &metric, &weights), Ok(40));
        assert_eq!(tile_value(&board, 0, 1, 0, &metric, &weights), Ok(0));

        // Already producing wood lowers the score
        metric.add(Resource::Wood, 10);
        assert_eq!(tile_value(&board, 0, 0, 4, &metric, &weights), Ok(7 * 5 + 2 - 10));
        assert!(tile_value(&board, 1, 0, 0, &metric, &weights).is_err());
    }

    #[test]
    fn test_initial_placement_picks_best_vertex() {
        // One rich tile in the corner; every other tile is desert
        let mut rows = vec![vec![Tile::new(2, TileType::Desert); 4]; 4];
        rows[3][3] = Tile::new(8, TileType::Field);
        rows[3][2] = Tile::new(6, TileType::Field);
        let board = Board::from_rows(rows).unwrap();

        let bot = Bot::with_seed(0, 1);
        let player = Player::new(0, PlayerColor::Red);
        let placement = bot.choose_initial_placement(&board, &player).unwrap().unwrap();

        // Runner-up is (4, 3), one row down
        assert_eq!(placement.settlement, Vertex::new(3, 3));
        assert_eq!(
            placement.road,
            Edge::new(Vertex::new(3, 3), Vertex::new(4, 3)).unwrap()
        );
        assert!(board.contains_edge(&placement.road));
    }

    #[test]
    fn test_road_follows_column_distance() {
        // Forest at the left end, field at the right end of a single row
        let mut row = vec![Tile::new(2, TileType::Desert); 5];
        row[0] = Tile::new(8, TileType::Forest);
        row[4] = Tile::new(8, TileType::Field);
        let mut board = Board::from_rows(vec![row]).unwrap();
        // Blocks the other vertices around the forest
        board.add_object(PlacedObject::free_settlement(&board, 1, Vertex::new(1, 1)).unwrap());

        let bot = Bot::with_seed(0, 1);
        let player = Player::new(0, PlayerColor::Red);
        let placement = bot.choose_initial_placement(&board, &player).unwrap().unwrap();

        // Runner-up is (0, 4): four columns right, no rows down
        assert_eq!(placement.settlement, Vertex::new(0, 0));
        assert_eq!(
            placement.road,
            Edge::new(Vertex::new(0, 0), Vertex::new(0, 1)).unwrap()
        );
    }

    #[test]
    fn test_road_falls_back_when_edge_taken() {
        let mut rows = vec![vec![Tile::new(2, TileType::Desert); 4]; 4];
        rows[3][3] = Tile::new(8, TileType::Field);
        rows[3][2] = Tile::new(6, TileType::Field);
        let mut board = Board::from_rows(rows).unwrap();
        let taken = Edge::new(Vertex::new(3, 3), Vertex::new(4, 3)).unwrap();
        board.add_object(PlacedObject::free_road(&board, 1, taken).unwrap());

        let bot = Bot::with_seed(0, 1);
        let player = Player::new(0, PlayerColor::Red);
        let placement = bot.choose_initial_placement(&board, &player).unwrap().unwrap();

        // First free neighbour, upwards
        assert_eq!(placement.settlement, Vertex::new(3, 3));
        assert_eq!(
            placement.road,
            Edge::new(Vertex::new(2, 3), Vertex::new(3, 3)).unwrap()
        );
    }

    #[test]
    fn test_road_without_target_uses_free_neighbour() {
        let board = Board::from_rows(vec![vec![Tile::new(8, TileType::Forest)]]).unwrap();
        let bot = Bot::with_seed(0, 1);
        let from = Vertex::new(0, 0);

        // Up and left are off the board
        assert_eq!(bot.road_direction(&board, from, None), Some(Vertex::new(1, 0)));
        assert_eq!(
            bot.road_direction(&board, from, Some(Vertex::new(0, 1))),
            Some(Vertex::new(0, 1))
        );
    }

    #[test]
    fn test_initial_placement_respects_distance_rule() {
        let mut board = Board::from_rows(vec![vec![Tile::new(8, TileType::Forest); 3]; 3]).unwrap();
        board.add_object(PlacedObject::free_settlement(&board, 1, Vertex::new(1, 1)).unwrap());

        let bot = Bot::with_seed(0, 1);
        let player = Player::new(0, PlayerColor::Red);
        let placement = bot.choose_initial_placement(&board, &player).unwrap().unwrap();

        assert!(board.satisfies_distance_rule(&placement.settlement));
        assert!(PlacedObject::free_settlement(&board, 0, placement.settlement).is_ok());
    }

    #[test]
    fn test_no_free_vertex() {
        let mut board = Board::from_rows(vec![vec![Tile::new(8, TileType::Forest)]]).unwrap();
        board.add_object(PlacedObject::free_settlement(&board, 1, Vertex::new(0, 0)).unwrap());
        board.add_object(PlacedObject::free_settlement(&board, 1, Vertex::new(1, 1)).unwrap());

        let bot = Bot::with_seed(0, 1);
        let player = Player::new(0, PlayerColor::Red);
        assert_eq!(bot.choose_initial_placement(&board, &player), Ok(None));
    }

    #[test]
    fn test_choose_move_without_resources() {
        let board = Board::from_rows(vec![vec![Tile::new(8, TileType::Forest); 2]; 2]).unwrap();
        let mut bot = Bot::with_seed(0, 5);
        let player = Player::new(0, PlayerColor::Red);
        assert!(bot.choose_move(&board, &player).is_none());
    }

    #[test]
    fn test_choose_move_picks_a_legal_move() {
        let mut board = Board::from_rows(vec![vec![Tile::new(8, TileType::Forest); 3]; 3]).unwrap();
        let road = Edge::new(Vertex::new(0, 0), Vertex::new(0, 1)).unwrap();
        board.add_object(PlacedObject::free_road(&board, 0, road).unwrap());

        let mut bot = Bot::with_seed(0, 5);
        let mut player = Player::new(0, PlayerColor::Red);
        player.resources = costs::road();

        let chosen = bot.choose_move(&board, &player).unwrap();
        assert!(chosen.apply(&mut board, &mut player).is_ok());
    }
}
