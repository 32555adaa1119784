//! Integration tests for the settlers game engine.
//!
//! These tests drive complete game flows through the public API, from turn
//! order through setup to victory.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use settlers_core::*;

fn random_board(seed: u64) -> Board {
    Board::random_land_with_rng(6, 6, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn human_game(seed: u64) -> GameState {
    let config = GameConfig {
        player_count: 3,
        human: Some(0),
        ..GameConfig::default()
    }
    .with_seed(seed);
    GameState::new(config, random_board(seed)).unwrap()
}

/// Step until the human is asked for input or the game ends
fn run_until_human(game: &mut GameState) -> Step {
    for _ in 0..10_000 {
        match game.step().unwrap() {
            Step::Advanced(_) => continue,
            other => return other,
        }
    }
    panic!("game never needed the human");
}

/// First free vertex with a free on-board neighbour
fn free_setup_spot(game: &GameState) -> (Vertex, Vertex) {
    game.board
        .vertices()
        .filter(|v| game.board.satisfies_distance_rule(v))
        .find_map(|v| {
            game.board
                .adjacent_vertices(&v)
                .into_iter()
                .find(|n| {
                    Edge::new(v, *n).is_some_and(|e| game.board.road_at(&e).is_none())
                })
                .map(|n| (v, n))
        })
        .expect("board has a free spot")
}

/// Let the human place both setup settlements at the first free spots
fn complete_human_setup(game: &mut GameState) {
    while matches!(game.phase, GamePhase::DeterminingOrder | GamePhase::Setup) {
        match game.step().unwrap() {
            Step::AwaitingHuman(player) => {
                let (vertex, road_to) = free_setup_spot(game);
                game.apply_action(player, GameAction::PlaceInitialSettlement { vertex, road_to })
                    .unwrap();
            }
            Step::Advanced(_) => {}
            Step::Finished => break,
        }
    }
}

#[test]
fn test_all_bot_game_runs() {
    let mut game =
        GameState::new(GameConfig::bots_only(4).with_seed(11), random_board(11)).unwrap();
    let winner = game.simulate(5_000).unwrap();

    for player in 0..4 {
        assert!(game.board.buildings_of(player, ObjectKind::Settlement).len()
            + game.board.buildings_of(player, ObjectKind::City).len() >= 1);
    }
    match winner {
        Some(winner) => {
            assert!(game.victory_points(winner) >= 10);
            assert_eq!(game.phase, GamePhase::GameOver { winner });
        }
        None => assert!(game.turn_number > 5_000),
    }
}

#[test]
fn test_seeded_games_are_reproducible() {
    let play = || {
        let mut game =
            GameState::new(GameConfig::bots_only(3).with_seed(21), random_board(21)).unwrap();
        game.simulate(300).unwrap();
        game.snapshot()
    };
    assert_eq!(play(), play());
}

#[test]
fn test_setup_phase_completes() {
    let mut game = human_game(5);
    complete_human_setup(&mut game);

    assert_eq!(game.phase, GamePhase::PlayerTurn { rolled: false });
    assert_eq!(game.turn_number, 1);
    for player in 0..3 {
        assert_eq!(
            game.board.buildings_of(player, ObjectKind::Settlement).len(),
            2,
            "player {} should have two settlements",
            player
        );
        assert_eq!(game.board.roads_of(player).count(), 2);
    }
}

#[test]
fn test_setup_rejects_distance_rule_violation() {
    let mut game = human_game(6);
    assert!(matches!(run_until_human(&mut game), Step::AwaitingHuman(0)));

    let (vertex, road_to) = free_setup_spot(&game);
    game.apply_action(0, GameAction::PlaceInitialSettlement { vertex, road_to })
        .unwrap();

    let before = game.board.clone();
    let result = game.apply_action(
        0,
        GameAction::PlaceInitialSettlement {
            vertex: road_to,
            road_to: vertex,
        },
    );
    assert!(matches!(result, Err(GameError::Placement(_))));
    assert_eq!(game.board, before);
}

#[test]
fn test_normal_turn_flow() {
    let mut game = human_game(7);
    complete_human_setup(&mut game);

    // Bots before the human play their turns; the human's dice roll on their own
    assert_eq!(run_until_human(&mut game), Step::AwaitingHuman(0));
    assert_eq!(game.phase, GamePhase::PlayerTurn { rolled: true });
    assert!(game.dice_roll.is_some());

    let turn = game.turn_number;
    let events = game.apply_action(0, GameAction::EndTurn).unwrap();
    assert!(matches!(events[0], GameEvent::TurnEnded { player: 0, .. }));
    assert_eq!(game.turn_number, turn + 1);
    assert_ne!(game.current_player(), 0);
}

#[test]
fn test_actions_rejected_before_roll() {
    let mut game = human_game(8);
    complete_human_setup(&mut game);
    game.current = game.human_slot().unwrap();

    assert_eq!(game.apply_action(0, GameAction::EndTurn), Err(GameError::InvalidPhase));
}

#[test]
fn test_building_with_resources() {
    let mut game = human_game(9);
    complete_human_setup(&mut game);
    assert_eq!(run_until_human(&mut game), Step::AwaitingHuman(0));

    game.players[0].resources = ResourceBundle::with_amounts(1, 1, 0, 0, 0);
    let road = game
        .legal_moves(0)
        .into_iter()
        .find_map(|m| match m.purchase {
            Purchase::Road(edge) => Some(edge),
            _ => None,
        })
        .expect("a road extends the network");

    let events = game.apply_action(0, GameAction::BuildRoad(road)).unwrap();
    assert_eq!(events, vec![GameEvent::RoadBuilt { player: 0, edge: road }]);
    assert!(game.players[0].resources.is_empty());
    assert_eq!(game.board.roads_of(0).count(), 3);
}

#[test]
fn test_bank_trade_then_build() {
    let mut game = human_game(10);
    complete_human_setup(&mut game);
    assert_eq!(run_until_human(&mut game), Step::AwaitingHuman(0));

    game.players[0].resources = ResourceBundle::with_amounts(4, 0, 0, 0, 0);
    let plan = game.trade_plan(0, ObjectKind::Road).unwrap();
    assert_eq!(plan, vec![TradeExchange::new(Resource::Wood, Resource::Clay)]);

    for trade in plan {
        game.apply_action(
            0,
            GameAction::BankTrade {
                give: trade.input,
                receive: trade.output,
            },
        )
        .unwrap();
    }
    assert_eq!(game.players[0].resources, ResourceBundle::with_amounts(1, 1, 0, 0, 0));
    assert!(game
        .legal_moves(0)
        .iter()
        .any(|m| matches!(m.purchase, Purchase::Road(_))));
}

#[test]
fn test_unaffordable_trade_rejected() {
    let mut game = human_game(12);
    complete_human_setup(&mut game);
    assert_eq!(run_until_human(&mut game), Step::AwaitingHuman(0));

    game.players[0].resources = ResourceBundle::with_amounts(2, 0, 0, 0, 0);
    let result = game.apply_action(
        0,
        GameAction::BankTrade {
            give: Resource::Wood,
            receive: Resource::Sheep,
        },
    );
    assert_eq!(result, Err(GameError::CannotAfford));
    assert_eq!(game.players[0].resources, ResourceBundle::with_amounts(2, 0, 0, 0, 0));
}

#[test]
fn test_turns_rotate_in_fixed_order() {
    let mut game = GameState::new(GameConfig::bots_only(4).with_seed(3), random_board(3)).unwrap();
    game.determine_turn_order();
    let order = game.turn_order.clone();

    let mut seen = Vec::new();
    for _ in 0..8 {
        seen.push(game.current_player());
        game.advance_turn();
    }
    let expected: Vec<PlayerId> = order.iter().chain(order.iter()).copied().collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_snapshot_serializes() {
    let mut game = human_game(13);
    complete_human_setup(&mut game);
    let snapshot = game.snapshot();

    let json = serde_json::to_string(&snapshot).unwrap();
    let back: GameSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(snapshot.players.iter().filter(|p| p.human).count(), 1);
    assert_eq!(snapshot.board.objects.len(), 12);
}
