//! Terminal host for the settlers game.

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use settlers_core::game::DEFAULT_PLAYERS;
use settlers_core::{Board, GameConfig, GamePhase, GameSnapshot, GameState};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod builder;
mod layout;
mod protocol;
mod session;

use builder::BoardBuilder;
use layout::{JsonLayoutStore, LayoutStore};
use protocol::InputEvent;
use session::{GameSession, SessionMessage, SessionOutcome};

#[derive(Debug, Parser)]
#[command(
    name = "settlers-host",
    version,
    about = "Play a settlement game against computer players"
)]
struct Cli {
    /// Number of players, 2 to 5
    #[arg(long, default_value_t = DEFAULT_PLAYERS)]
    players: usize,

    /// Seat of the human player
    #[arg(long, default_value_t = 0, conflicts_with = "no_human")]
    human: usize,

    /// Computer players only
    #[arg(long)]
    no_human: bool,

    /// Tile rows of a random board
    #[arg(long, default_value_t = 5)]
    rows: usize,

    /// Tile columns of a random board
    #[arg(long, default_value_t = 5)]
    cols: usize,

    /// Seed for the board, dice and computer players
    #[arg(long)]
    seed: Option<u64>,

    /// Play on a saved layout instead of a random board
    #[arg(long)]
    layout: Option<String>,

    /// Directory holding saved layouts
    #[arg(long, env = "SETTLERS_LAYOUT_DIR", default_value = "layouts")]
    layout_dir: PathBuf,

    /// Save the board under this name before playing
    #[arg(long)]
    save_layout: Option<String>,

    /// List saved layouts and exit
    #[arg(long)]
    list_layouts: bool,

    /// Paint a new ROWS x COLS layout from stdin, save it and exit
    #[arg(
        long,
        num_args = 2,
        value_names = ["ROWS", "COLS"],
        requires = "save_layout",
        conflicts_with = "layout"
    )]
    build: Option<Vec<usize>>,

    /// Stop after this many turns
    #[arg(long)]
    max_turns: Option<u32>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = JsonLayoutStore::new(&cli.layout_dir);
    if cli.list_layouts {
        for name in store.list()? {
            println!("{}", name);
        }
        return Ok(());
    }

    if let Some(dimensions) = &cli.build {
        let (&[rows, cols], Some(name)) = (dimensions.as_slice(), &cli.save_layout) else {
            anyhow::bail!("--build takes ROWS COLS and needs --save-layout");
        };
        let blank = BoardBuilder::new(rows, cols)?;
        let board = tokio::task::spawn_blocking(move || {
            builder::run(blank, std::io::stdin().lock(), std::io::stdout())
        })
        .await??;
        store.save_board(name, &board)?;
        return Ok(());
    }

    let board = match &cli.layout {
        Some(name) => store
            .load_board(name)
            .with_context(|| format!("loading layout '{}' from {}", name, store.dir().display()))?,
        None => match cli.seed {
            Some(seed) => {
                Board::random_land_with_rng(cli.rows, cli.cols, &mut StdRng::seed_from_u64(seed))?
            }
            None => Board::random_land(cli.rows, cli.cols)?,
        },
    };
    if let Some(name) = &cli.save_layout {
        store.save_board(name, &board)?;
    }

    let config = GameConfig {
        player_count: cli.players,
        human: (!cli.no_human).then_some(cli.human),
        seed: cli.seed,
        ..GameConfig::default()
    };
    let human = config.human.is_some();
    let game = GameState::new(config, board)?;

    info!("Starting settlers game...");

    let (input_tx, input_rx) = mpsc::channel(1);
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (session, snapshots) = GameSession::new(game, input_rx, msg_tx, cli.max_turns);

    if human {
        tokio::spawn(forward_input(spawn_stdin_reader(), input_tx));
    } else {
        // Nothing to read; the sender only exists to be dropped on Ctrl-C
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Interrupted");
            drop(input_tx);
        });
    }
    let printer = tokio::spawn(print_messages(msg_rx, snapshots));

    let outcome = tokio::spawn(session.run()).await?;
    let _ = printer.await;

    match outcome {
        Ok(SessionOutcome::Won {
            winner,
            victory_points,
        }) => info!(winner, victory_points, "Game over"),
        Ok(SessionOutcome::TurnLimit { turns }) => info!(turns, "Stopped at turn limit"),
        Ok(SessionOutcome::Terminated) => info!("Game terminated"),
        Err(e) => {
            error!("Session failed: {}", e);
            return Err(e.into());
        }
    }
    Ok(())
}

/// Read stdin lines on a plain thread; blocking reads would otherwise hold
/// up runtime shutdown
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Parse lines into input events. Returning drops `input`, which ends the
/// session: on EOF, `quit` or Ctrl-C.
async fn forward_input(mut lines: mpsc::Receiver<String>, input: mpsc::Sender<InputEvent>) {
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match protocol::parse_command(&line) {
                    Ok(InputEvent::Quit) => break,
                    Ok(event) => {
                        if input.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
}

async fn print_messages(
    mut messages: mpsc::UnboundedReceiver<SessionMessage>,
    snapshots: watch::Receiver<GameSnapshot>,
) {
    while let Some(message) = messages.recv().await {
        match message {
            SessionMessage::Events(events) => {
                for event in &events {
                    println!("{}", protocol::describe_event(event));
                }
            }
            SessionMessage::Prompt { player, phase } => {
                let snapshot = snapshots.borrow().clone();
                println!("{}", protocol::render_snapshot(&snapshot));
                match phase {
                    GamePhase::Setup => {
                        println!("P{}, place a settlement: settle r c r2 c2", player)
                    }
                    _ => println!("P{}, your move ('help' lists commands)", player),
                }
            }
            SessionMessage::Info(text) => println!("{}", text),
            SessionMessage::Rejected(reason) => println!("Rejected: {}", reason),
        }
    }
}
