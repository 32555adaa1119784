//! Board layout persistence.

use settlers_core::{Board, BoardError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File extension of saved layouts
pub const LAYOUT_EXTENSION: &str = "clayout";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout '{0}' not found")]
    NotFound(String),

    #[error("Invalid layout name '{0}'")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed layout: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid board: {0}")]
    Board(#[from] BoardError),

    #[error("Layout '{name}' holds {count} placed pieces; layouts store tiles only")]
    PiecesPresent { name: String, count: usize },
}

/// Somewhere boards can be saved and loaded by name.
pub trait LayoutStore {
    /// Load a board; it is validated and must be free of pieces
    fn load_board(&self, name: &str) -> Result<Board, LayoutError>;

    fn save_board(&self, name: &str, board: &Board) -> Result<(), LayoutError>;

    /// Names of all stored layouts, sorted
    fn list(&self) -> Result<Vec<String>, LayoutError>;
}

/// Layouts stored as JSON `*.clayout` files in one directory.
#[derive(Debug, Clone)]
pub struct JsonLayoutStore {
    dir: PathBuf,
}

impl JsonLayoutStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, LayoutError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(LayoutError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, LAYOUT_EXTENSION)))
    }
}

/// Pieces only ever enter a board through the placement rules of a game
fn check_no_pieces(name: &str, board: &Board) -> Result<(), LayoutError> {
    match board.objects().len() {
        0 => Ok(()),
        count => Err(LayoutError::PiecesPresent {
            name: name.to_string(),
            count,
        }),
    }
}

impl LayoutStore for JsonLayoutStore {
    fn load_board(&self, name: &str) -> Result<Board, LayoutError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(LayoutError::NotFound(name.to_string()));
        }
        let text = fs::read_to_string(&path)?;
        let board: Board = serde_json::from_str(&text)?;
        board.validate()?;
        check_no_pieces(name, &board)?;
        debug!(path = %path.display(), "Loaded layout");
        Ok(board)
    }

    fn save_board(&self, name: &str, board: &Board) -> Result<(), LayoutError> {
        let path = self.path_for(name)?;
        check_no_pieces(name, board)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(board)?)?;
        info!(path = %path.display(), "Saved layout");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, LayoutError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LAYOUT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
