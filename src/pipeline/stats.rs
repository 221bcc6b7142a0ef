//! Run statistics.
//!
//! Each worker accumulates its own `ProcessStats`; the orchestrator merges
//! them after all workers have joined. Totals are exact regardless of how
//! files were interleaved across threads, and nothing is shared while the
//! run is in flight.

use std::fmt;

/// Counters accumulated over one run (or one worker's share of it).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Games successfully encoded.
    pub games: u64,
    /// Positions seen across those games' histories.
    pub positions: u64,
    /// Training records written.
    pub records_written: u64,
    /// Files processed to completion.
    pub files_processed: u64,
    /// Files skipped because no source claimed them.
    pub files_skipped: u64,
    /// Files abandoned after a processing error.
    pub files_failed: u64,
    /// Outcomes replaced from the substitution table.
    pub substitutions: u64,
    /// Outcome tallies, indexed loss / draw / win for the first player.
    pub outcome_counts: [u64; 3],
    /// How often each of the eight symmetry transforms was chosen.
    pub transform_counts: [u64; 8],
}

impl ProcessStats {
    pub fn new() -> ProcessStats {
        ProcessStats::default()
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &ProcessStats) {
        self.games += other.games;
        self.positions += other.positions;
        self.records_written += other.records_written;
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.files_failed += other.files_failed;
        self.substitutions += other.substitutions;
        for (mine, theirs) in self
            .outcome_counts
            .iter_mut()
            .zip(other.outcome_counts.iter())
        {
            *mine += theirs;
        }
        for (mine, theirs) in self
            .transform_counts
            .iter_mut()
            .zip(other.transform_counts.iter())
        {
            *mine += theirs;
        }
    }

    /// Tallies one game outcome by its stored expectation value.
    pub fn record_outcome(&mut self, q: f32) {
        if q > 0.0 {
            self.outcome_counts[2] += 1;
        } else if q < 0.0 {
            self.outcome_counts[0] += 1;
        } else {
            self.outcome_counts[1] += 1;
        }
    }
}

impl fmt::Display for ProcessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games processed: {}", self.games)?;
        writeln!(f, "Positions processed: {}", self.positions)?;
        writeln!(f, "Records written: {}", self.records_written)?;
        writeln!(
            f,
            "Files: {} processed, {} skipped, {} failed",
            self.files_processed, self.files_skipped, self.files_failed
        )?;
        writeln!(f, "Outcome substitutions applied: {}", self.substitutions)?;
        writeln!(
            f,
            "Outcomes L: {} D: {} W: {}",
            self.outcome_counts[0], self.outcome_counts[1], self.outcome_counts[2]
        )?;
        write!(f, "Transform usage:")?;
        for count in &self.transform_counts {
            write!(f, " {}", count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_every_counter() {
        let mut a = ProcessStats::new();
        a.games = 3;
        a.positions = 40;
        a.records_written = 3;
        a.files_processed = 1;
        a.outcome_counts = [1, 0, 2];
        a.transform_counts[0] = 2;
        a.transform_counts[5] = 1;

        let mut b = ProcessStats::new();
        b.games = 2;
        b.positions = 10;
        b.records_written = 2;
        b.files_failed = 1;
        b.substitutions = 1;
        b.outcome_counts = [0, 2, 0];
        b.transform_counts[0] = 1;

        a.merge(&b);
        assert_eq!(a.games, 5);
        assert_eq!(a.positions, 50);
        assert_eq!(a.records_written, 5);
        assert_eq!(a.files_processed, 1);
        assert_eq!(a.files_failed, 1);
        assert_eq!(a.substitutions, 1);
        assert_eq!(a.outcome_counts, [1, 2, 2]);
        assert_eq!(a.transform_counts[0], 3);
        assert_eq!(a.transform_counts[5], 1);
    }

    #[test]
    fn outcome_tallies_by_sign() {
        let mut stats = ProcessStats::new();
        stats.record_outcome(1.0);
        stats.record_outcome(-1.0);
        stats.record_outcome(0.0);
        stats.record_outcome(1.0);
        assert_eq!(stats.outcome_counts, [1, 1, 2]);
    }

    #[test]
    fn summary_mentions_totals() {
        let mut stats = ProcessStats::new();
        stats.games = 7;
        let text = stats.to_string();
        assert!(text.contains("Games processed: 7"));
        assert!(text.contains("Transform usage:"));
    }
}
