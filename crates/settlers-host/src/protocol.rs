//! Text protocol between the terminal and the game session.
//!
//! One command per line:
//!
//! ```text
//! settle r c r2 c2     setup: settlement at (r, c) with a road to (r2, c2)
//! settle r c           build a settlement
//! road r1 c1 r2 c2     build a road
//! city r c             upgrade a settlement
//! trade <give> <get>   3:1 bank trade
//! plan <kind>          bank trades needed for a road, settlement or city
//! moves | board | metric | end | quit | help
//! ```
//!
//! The board builder (`--build`) reads `paint r c <type> <freq>`, `show`
//! and `done` lines instead.

use settlers_core::{
    BoardSnapshot, Edge, GameAction, GameEvent, GamePhase, GameSnapshot, ObjectKind, PlacedObject,
    Resource, Tile, TileType, Vertex,
};
use std::fmt::Write;
use thiserror::Error;

/// Something the human typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Submit a game action
    Action(GameAction),
    /// Ask which bank trades would pay for a piece
    Plan(ObjectKind),
    /// List affordable moves
    ShowMoves,
    /// Print the board
    ShowBoard,
    /// Print expected production, least productive resource first
    ShowMetric,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a coordinate")]
    InvalidNumber(String),

    #[error("Unknown resource '{0}'")]
    UnknownResource(String),

    #[error("Unknown piece '{0}', expected road, settlement or city")]
    UnknownKind(String),

    #[error("Unknown tile type '{0}'")]
    UnknownTileType(String),

    #[error("{0} and {1} are not adjacent")]
    NotAdjacent(Vertex, Vertex),
}

pub const HELP: &str = "\
settle r c r2 c2     setup: settlement at (r, c) with a road to (r2, c2)
settle r c           build a settlement
road r1 c1 r2 c2     build a road
city r c             upgrade a settlement to a city
trade <give> <get>   trade 3 of one resource for 1 of another
plan <kind>          bank trades needed for a road, settlement or city
moves                list affordable moves
board                print the board
metric               expected production of your pieces
end                  end your turn
quit                 stop the game";

/// Parse one line of input
pub fn parse_command(line: &str) -> Result<InputEvent, ParseError> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    match command.as_str() {
        "settle" => match args.len() {
            2 => Ok(InputEvent::Action(GameAction::BuildSettlement(vertex(&args[0..2])?))),
            4 => Ok(InputEvent::Action(GameAction::PlaceInitialSettlement {
                vertex: vertex(&args[0..2])?,
                road_to: vertex(&args[2..4])?,
            })),
            _ => Err(ParseError::Usage("settle r c [r2 c2]")),
        },
        "road" => {
            if args.len() != 4 {
                return Err(ParseError::Usage("road r1 c1 r2 c2"));
            }
            let (a, b) = (vertex(&args[0..2])?, vertex(&args[2..4])?);
            let edge = Edge::new(a, b).ok_or(ParseError::NotAdjacent(a, b))?;
            Ok(InputEvent::Action(GameAction::BuildRoad(edge)))
        }
        "city" => {
            if args.len() != 2 {
                return Err(ParseError::Usage("city r c"));
            }
            Ok(InputEvent::Action(GameAction::BuildCity(vertex(&args)?)))
        }
        "trade" => {
            let &[give, receive] = args.as_slice() else {
                return Err(ParseError::Usage("trade <give> <get>"));
            };
            Ok(InputEvent::Action(GameAction::BankTrade {
                give: resource(give)?,
                receive: resource(receive)?,
            }))
        }
        "plan" => {
            let &[kind] = args.as_slice() else {
                return Err(ParseError::Usage("plan <road|settlement|city>"));
            };
            let kind = match kind.to_ascii_lowercase().as_str() {
                "road" => ObjectKind::Road,
                "settlement" => ObjectKind::Settlement,
                "city" => ObjectKind::City,
                _ => return Err(ParseError::UnknownKind(kind.to_string())),
            };
            Ok(InputEvent::Plan(kind))
        }
        "moves" => Ok(InputEvent::ShowMoves),
        "board" => Ok(InputEvent::ShowBoard),
        "metric" => Ok(InputEvent::ShowMetric),
        "end" => Ok(InputEvent::Action(GameAction::EndTurn)),
        "help" => Ok(InputEvent::Help),
        "quit" | "exit" => Ok(InputEvent::Quit),
        _ => Err(ParseError::UnknownCommand(command)),
    }
}

/// A line typed into the board builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCommand {
    /// Set one tile
    Paint { row: i32, col: i32, tile: Tile },
    Show,
    Done,
}

pub const BUILD_HELP: &str = "\
paint r c <type> <freq>   set tile (r, c); land turns neighbouring ocean into coast
show                      print the board
done                      save and exit
types: desert forest pasture clay field quarry coast ocean";

/// Parse one line of builder input
pub fn parse_build_command(line: &str) -> Result<BuildCommand, ParseError> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    match command.as_str() {
        "paint" => {
            let &[row, col, tile_type, frequency] = args.as_slice() else {
                return Err(ParseError::Usage("paint r c <type> <freq>"));
            };
            let at = vertex(&[row, col])?;
            let tile_type = TileType::from_name(tile_type)
                .ok_or_else(|| ParseError::UnknownTileType(tile_type.to_string()))?;
            let frequency = frequency
                .parse::<u8>()
                .map_err(|_| ParseError::InvalidNumber(frequency.to_string()))?;
            Ok(BuildCommand::Paint {
                row: at.row,
                col: at.col,
                tile: Tile::new(frequency, tile_type),
            })
        }
        "show" => Ok(BuildCommand::Show),
        "done" => Ok(BuildCommand::Done),
        _ => Err(ParseError::UnknownCommand(command)),
    }
}

fn vertex(args: &[&str]) -> Result<Vertex, ParseError> {
    let number = |s: &str| {
        s.parse::<i32>()
            .map_err(|_| ParseError::InvalidNumber(s.to_string()))
    };
    Ok(Vertex::new(number(args[0])?, number(args[1])?))
}

fn resource(name: &str) -> Result<Resource, ParseError> {
    Resource::from_name(name).ok_or_else(|| ParseError::UnknownResource(name.to_string()))
}

// ==================== Rendering ====================

fn tile_code(tile_type: TileType) -> char {
    match tile_type {
        TileType::Desert => 'D',
        TileType::Forest => 'F',
        TileType::Pasture => 'P',
        TileType::Clay => 'C',
        TileType::Field => 'G',
        TileType::Quarry => 'Q',
        TileType::Coast => '~',
        TileType::Ocean => '=',
    }
}

/// Tile grid followed by the piece list
pub fn render_board(board: &BoardSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Board {}x{}", board.rows, board.cols);
    for row in 0..board.rows as i32 {
        let line: Vec<String> = board
            .tiles
            .iter()
            .filter(|t| t.row == row)
            .map(|t| format!("{}{:<2}", tile_code(t.tile_type), t.frequency))
            .collect();
        let _ = writeln!(out, "  {}", line.join(" "));
    }

    for object in &board.objects {
        let owner = object
            .owner()
            .map(|p| format!("P{}", p))
            .unwrap_or_else(|| "?".to_string());
        let _ = match object {
            PlacedObject::Road { edge, .. } => writeln!(out, "  {} road {}", owner, edge),
            PlacedObject::Settlement { vertex, .. } => {
                writeln!(out, "  {} settlement {}", owner, vertex)
            }
            PlacedObject::City { vertex, .. } => writeln!(out, "  {} city {}", owner, vertex),
        };
    }
    out
}

/// Board, status line and player table
pub fn render_snapshot(snapshot: &GameSnapshot) -> String {
    let mut out = render_board(&snapshot.board);
    let _ = writeln!(out, "{}", render_status(snapshot));
    for player in &snapshot.players {
        let marker = if player.id == snapshot.current_player { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} P{} {:?}{} {} VP | {}",
            marker,
            player.id,
            player.color,
            if player.human { " (you)" } else { "" },
            player.victory_points,
            player.resources
        );
    }
    out
}

/// One-line phase summary
pub fn render_status(snapshot: &GameSnapshot) -> String {
    let phase = match snapshot.phase {
        GamePhase::DeterminingOrder => "rolling for turn order".to_string(),
        GamePhase::Setup => format!("setup, P{} placing", snapshot.current_player),
        GamePhase::PlayerTurn { .. } => format!(
            "turn {}, P{} to play",
            snapshot.turn_number, snapshot.current_player
        ),
        GamePhase::GameOver { winner } => format!("game over, P{} wins", winner),
        GamePhase::Terminated => "terminated".to_string(),
    };
    match snapshot.dice_roll {
        Some((a, b)) => format!("[{}] rolled {} + {} = {}", phase, a, b, a + b),
        None => format!("[{}]", phase),
    }
}

pub fn describe_event(event: &GameEvent) -> String {
    match event {
        GameEvent::TurnOrderDecided { order, .. } => {
            let order: Vec<String> = order.iter().map(|p| format!("P{}", p)).collect();
            format!("Turn order: {}", order.join(", "))
        }
        GameEvent::InitialPlacement {
            player,
            settlement,
            road,
        } => format!("P{} settled at {} with road {}", player, settlement, road),
        GameEvent::SetupComplete => "Setup complete".to_string(),
        GameEvent::DiceRolled { player, total, .. } => format!("P{} rolled {}", player, total),
        GameEvent::ResourcesDistributed { distributions } => {
            let parts: Vec<String> = distributions
                .iter()
                .map(|(p, bundle)| format!("P{} +[{}]", p, bundle))
                .collect();
            format!("Produced: {}", parts.join("; "))
        }
        GameEvent::RoadBuilt { player, edge } => format!("P{} built a road {}", player, edge),
        GameEvent::SettlementBuilt { player, vertex } => {
            format!("P{} built a settlement at {}", player, vertex)
        }
        GameEvent::CityBuilt { player, vertex } => {
            format!("P{} built a city at {}", player, vertex)
        }
        GameEvent::BankTraded { player, trade } => {
            format!("P{} traded 3 {} for 1 {}", player, trade.input, trade.output)
        }
        GameEvent::NoMove { player } => format!("P{} passes", player),
        GameEvent::TurnEnded { player, next_player } => {
            format!("P{} ended their turn, P{} is next", player, next_player)
        }
        GameEvent::GameWon {
            player,
            victory_points,
        } => format!("P{} wins with {} victory points", player, victory_points),
        GameEvent::GameTerminated => "Game terminated".to_string(),
    }
}
