//! Outcome substitutions keyed by move sequence.
//!
//! Some games carry outcomes known to be wrong (adjudication artifacts,
//! resignation bugs); a substitution table maps move sequences from the
//! starting position to corrected `(q, d)` pairs. Lookup walks the game's
//! moves through a trie with one child slot per possible move index, so a
//! step is a single array access. Nodes live in an arena and refer to each
//! other by index, which keeps ownership flat; a child slot is `None`
//! until a deeper entry needs it.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use serde::Deserialize;

/// Fan-out of a trie node: the size of the policy move numbering.
pub const MOVE_FANOUT: usize = 1858;

/// Errors while loading or building a substitution table.
#[derive(Debug, thiserror::Error)]
pub enum SubsError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to parse substitution file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("move index {0} out of range (fan-out {MOVE_FANOUT})")]
    MoveIndexOutOfRange(u16),
}

/// A corrected outcome pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeSub {
    pub q: f32,
    pub d: f32,
}

#[derive(Debug, Deserialize)]
struct SubsEntry {
    moves: Vec<u16>,
    q: f32,
    d: f32,
}

#[derive(Debug, Deserialize)]
struct SubsFile {
    entries: Vec<SubsEntry>,
}

struct SubNode {
    sub: Option<OutcomeSub>,
    children: Vec<Option<u32>>,
}

impl SubNode {
    fn new() -> SubNode {
        SubNode {
            sub: None,
            children: vec![None; MOVE_FANOUT],
        }
    }
}

/// Move-sequence keyed substitution table.
pub struct OutcomeSubs {
    nodes: Vec<SubNode>,
}

impl OutcomeSubs {
    /// An empty table containing only the root.
    pub fn new() -> OutcomeSubs {
        OutcomeSubs {
            nodes: vec![SubNode::new()],
        }
    }

    /// Loads a table from a JSON file:
    /// `{"entries": [{"moves": [293, 1137], "q": -1.0, "d": 0.0}]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<OutcomeSubs, SubsError> {
        let file = File::open(path)?;
        let parsed: SubsFile = serde_json::from_reader(BufReader::new(file))?;
        let mut subs = OutcomeSubs::new();
        for entry in parsed.entries {
            subs.insert(&entry.moves, OutcomeSub { q: entry.q, d: entry.d })?;
        }
        Ok(subs)
    }

    /// Registers a substitution for games whose moves start with `moves`.
    pub fn insert(&mut self, moves: &[u16], sub: OutcomeSub) -> Result<(), SubsError> {
        let mut node = 0usize;
        for &mv in moves {
            let slot = mv as usize;
            if slot >= MOVE_FANOUT {
                return Err(SubsError::MoveIndexOutOfRange(mv));
            }
            node = match self.nodes[node].children[slot] {
                Some(child) => child as usize,
                None => {
                    let child = self.nodes.len() as u32;
                    self.nodes.push(SubNode::new());
                    self.nodes[node].children[slot] = Some(child);
                    child as usize
                }
            };
        }
        self.nodes[node].sub = Some(sub);
        Ok(())
    }

    /// Looks up the substitution for a game's move sequence.
    ///
    /// The walk follows the moves as far as the trie reaches; the deepest
    /// entry passed on the way wins, so a longer, more specific prefix
    /// overrides a shorter one.
    pub fn lookup(&self, moves: &[u16]) -> Option<OutcomeSub> {
        let mut node = 0usize;
        let mut found = self.nodes[0].sub;
        for &mv in moves {
            let slot = mv as usize;
            if slot >= MOVE_FANOUT {
                break;
            }
            match self.nodes[node].children[slot] {
                Some(child) => {
                    node = child as usize;
                    if let Some(sub) = self.nodes[node].sub {
                        found = Some(sub);
                    }
                }
                None => break,
            }
        }
        found
    }

    /// Number of nodes in the arena, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when no substitution has been registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].sub.is_none()
    }
}

impl Default for OutcomeSubs {
    fn default() -> OutcomeSubs {
        OutcomeSubs::new()
    }
}
