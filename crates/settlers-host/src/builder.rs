//! Interactive board authoring.
//!
//! A build starts from an all-ocean board. Each painted land tile turns the
//! ocean around it into coast.

use crate::protocol::{self, BuildCommand};
use settlers_core::{Board, BoardError, Tile};
use std::io::{BufRead, Write};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BoardBuilder {
    board: Board,
}

impl BoardBuilder {
    pub fn new(rows: usize, cols: usize) -> Result<Self, BoardError> {
        Ok(Self {
            board: Board::ocean(rows, cols)?,
        })
    }

    pub fn paint(&mut self, row: i32, col: i32, tile: Tile) -> Result<(), BoardError> {
        self.board.set_tile(row, col, tile)?;
        debug!(row, col, ?tile, "Painted tile");
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn finish(self) -> Result<Board, BoardError> {
        self.board.validate()?;
        Ok(self.board)
    }
}

/// Apply builder commands from `input` until `done` or end of input.
///
/// Bad lines are reported on `out` and skipped.
pub fn run(
    mut builder: BoardBuilder,
    input: impl BufRead,
    mut out: impl Write,
) -> anyhow::Result<Board> {
    writeln!(out, "{}", protocol::BUILD_HELP)?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match protocol::parse_build_command(&line) {
            Ok(BuildCommand::Paint { row, col, tile }) => {
                if let Err(e) = builder.paint(row, col, tile) {
                    writeln!(out, "{}", e)?;
                }
            }
            Ok(BuildCommand::Show) => {
                write!(out, "{}", protocol::render_board(&builder.board().snapshot()))?;
            }
            Ok(BuildCommand::Done) => break,
            Err(e) => writeln!(out, "{}", e)?,
        }
    }
    Ok(builder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use settlers_core::TileType;
    use std::io::Cursor;

    #[test]
    fn test_paint_turns_ocean_into_coast() {
        let mut builder = BoardBuilder::new(3, 3).unwrap();
        builder.paint(1, 1, Tile::new(6, TileType::Field)).unwrap();
        let board = builder.finish().unwrap();

        assert_eq!(board.tile_at(1, 1).unwrap().tile_type, TileType::Field);
        assert_eq!(board.tile_at(0, 1).unwrap().tile_type, TileType::Coast);
        assert_eq!(board.tile_at(2, 2).unwrap().tile_type, TileType::Ocean);
    }

    #[test]
    fn test_run_reads_until_done() {
        let input = "paint 0 0 forest 8\n\npaint 9 9 field 6\nfly away\nshow\ndone\n\
                     paint 0 1 clay 5\n";
        let mut out = Vec::new();
        let board = run(BoardBuilder::new(2, 2).unwrap(), Cursor::new(input), &mut out).unwrap();

        assert_eq!(board.tile_at(0, 0).unwrap(), &Tile::new(8, TileType::Forest));
        assert_eq!(board.tile_at(0, 1).unwrap().tile_type, TileType::Coast);
        assert_eq!(board.tile_at(1, 1).unwrap().tile_type, TileType::Ocean);

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Unknown command 'fly'"));
        assert!(out.contains(&BoardError::TileOutOfBounds { row: 9, col: 9 }.to_string()));
        assert!(out.contains("Board 2x2"));
        assert!(out.contains("F8  ~2"));
    }

    #[test]
    fn test_bad_frequency_reported_and_skipped() {
        let mut out = Vec::new();
        let board = run(
            BoardBuilder::new(1, 1).unwrap(),
            Cursor::new("paint 0 0 forest 13\n"),
            &mut out,
        )
        .unwrap();

        assert_eq!(board.tile_at(0, 0).unwrap().tile_type, TileType::Ocean);
        assert!(!String::from_utf8(out).unwrap().is_empty());
    }
}
