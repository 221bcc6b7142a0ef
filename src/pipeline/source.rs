//! Game-list providers.
//!
//! The pipeline consumes games through the `GameSource` trait: each game
//! is a position history plus the declared outcome and player names.
//! Full PGN handling lives outside this crate; the built-in source reads
//! a plain-text `.games` format with one header line per game followed by
//! one FEN per ply, which is what the conversion CLI works from.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::board::{parse_fen, FenError, PositionHistory};

/// Declared outcome of a finished game, from the first player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWon,
    Draw,
    BlackWon,
}

impl GameResult {
    /// Parses a PGN-style result token.
    pub fn from_token(token: &str) -> Option<GameResult> {
        match token {
            "1-0" => Some(GameResult::WhiteWon),
            "1/2-1/2" => Some(GameResult::Draw),
            "0-1" => Some(GameResult::BlackWon),
            _ => None,
        }
    }

    /// The outcome expectation stored in training records.
    pub const fn result_q(self) -> f32 {
        match self {
            GameResult::WhiteWon => 1.0,
            GameResult::Draw => 0.0,
            GameResult::BlackWon => -1.0,
        }
    }

    /// The draw probability stored in training records.
    pub const fn result_d(self) -> f32 {
        match self {
            GameResult::Draw => 1.0,
            _ => 0.0,
        }
    }
}

/// One game as delivered by a source.
#[derive(Debug, Clone)]
pub struct Game {
    /// Positions of the game, oldest first.
    pub history: PositionHistory,
    pub result: GameResult,
    pub player1: String,
    pub player2: String,
    /// Move indices in the policy move numbering, when the source has
    /// them; used for outcome substitution lookups.
    pub moves: Vec<u16>,
}

/// Errors raised while reading one game file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("line {line}: expected 'game <result> <player1> <player2>', got '{text}'")]
    BadGameHeader { line: usize, text: String },

    #[error("line {line}: unknown game result '{text}'")]
    BadResult { line: usize, text: String },

    #[error("line {line}: bad move index '{text}'")]
    BadMoveIndex { line: usize, text: String },

    #[error("line {line}: {source}")]
    BadFen { line: usize, source: FenError },

    #[error("game starting at line {line} has no positions")]
    EmptyGame { line: usize },

    #[error("no numeric index in player name '{0}'")]
    BadPlayerIndex(String),
}

/// Yields the games of one input file.
pub trait GameSource {
    /// True when this source handles the file; others are skipped.
    fn matches(&self, path: &Path) -> bool;

    /// Reads every game in the file.
    fn read_games(&self, path: &Path) -> Result<Vec<Game>, SourceError>;
}

/// Extracts the numeric index from a player name's trailing digits, the
/// convention training player names follow ("candidate-66512" -> 66512).
pub fn player_index(name: &str) -> Result<u32, SourceError> {
    let digits: String = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits
        .parse::<u32>()
        .map_err(|_| SourceError::BadPlayerIndex(name.to_string()))
}

/// Reader for the plain-text `.games` format.
///
/// ```text
/// game 1-0 candidate-66512 candidate-66511
/// moves 355 672
/// rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1
/// rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1
/// ```
///
/// Blank lines and `#` comments separate games; the `moves` line is
/// optional.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextGameSource;

impl TextGameSource {
    /// Parses games from any line-oriented reader.
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<Vec<Game>, SourceError> {
        let mut games = Vec::new();
        let mut current: Option<PartialGame> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            if let Some(rest) = text.strip_prefix("game ") {
                if let Some(partial) = current.take() {
                    games.push(partial.finish()?);
                }
                current = Some(PartialGame::from_header(rest, lineno)?);
                continue;
            }

            let partial = current.as_mut().ok_or_else(|| SourceError::BadGameHeader {
                line: lineno,
                text: text.to_string(),
            })?;

            if let Some(rest) = text.strip_prefix("moves ") {
                for token in rest.split_whitespace() {
                    let index =
                        token
                            .parse::<u16>()
                            .map_err(|_| SourceError::BadMoveIndex {
                                line: lineno,
                                text: token.to_string(),
                            })?;
                    partial.moves.push(index);
                }
                continue;
            }

            let (board, rule50, _) = parse_fen(text).map_err(|source| SourceError::BadFen {
                line: lineno,
                source,
            })?;
            if partial.history.is_empty() {
                partial.history.reset(board, rule50);
            } else {
                partial.history.append(board, rule50);
            }
        }

        if let Some(partial) = current.take() {
            games.push(partial.finish()?);
        }
        Ok(games)
    }
}

impl GameSource for TextGameSource {
    fn matches(&self, path: &Path) -> bool {
        path.extension().map_or(false, |ext| ext == "games")
    }

    fn read_games(&self, path: &Path) -> Result<Vec<Game>, SourceError> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file))
    }
}

struct PartialGame {
    header_line: usize,
    history: PositionHistory,
    result: GameResult,
    player1: String,
    player2: String,
    moves: Vec<u16>,
}

impl PartialGame {
    fn from_header(rest: &str, line: usize) -> Result<PartialGame, SourceError> {
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(SourceError::BadGameHeader {
                line,
                text: format!("game {}", rest),
            });
        }
        let result = GameResult::from_token(fields[0]).ok_or_else(|| SourceError::BadResult {
            line,
            text: fields[0].to_string(),
        })?;
        Ok(PartialGame {
            header_line: line,
            history: PositionHistory::new(),
            result,
            player1: fields[1].to_string(),
            player2: fields[2].to_string(),
            moves: Vec::new(),
        })
    }

    fn finish(self) -> Result<Game, SourceError> {
        if self.history.is_empty() {
            return Err(SourceError::EmptyGame {
                line: self.header_line,
            });
        }
        Ok(Game {
            history: self.history,
            result: self.result,
            player1: self.player1,
            player2: self.player2,
            moves: self.moves,
        })
    }
}
