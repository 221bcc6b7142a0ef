//! Training-data conversion pipeline.
//!
//! Walks a directory of game files, encodes each game's final position
//! history into input planes, and writes one training record per game to
//! a matching output file. Files are statically striped across a fixed
//! pool of workers: worker `k` of `n` takes files `k, k+n, k+2n, ...`,
//! so no two workers ever touch the same input or output file and the
//! run needs no locking. A failure inside one file is logged with the
//! file name and processing moves on; configuration problems are caught
//! before any work starts.

pub mod source;
pub mod stats;
pub mod subs;

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::nn::encoding::{encode_position_for_nn, FillEmptyHistory, InputFormat};
use crate::training::record::{TrainingRecord, RECORD_VERSION};
use crate::training::writer::TrainingDataWriter;

use source::{player_index, GameSource, SourceError};
use stats::ProcessStats;
use subs::{OutcomeSubs, SubsError};

pub use source::{Game, GameResult, TextGameSource};

/// Settings for one conversion run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the input game files.
    pub input_dir: PathBuf,
    /// Directory the training files are written into. Must already exist.
    pub output_dir: PathBuf,
    /// Worker count for static file striping.
    pub threads: usize,
    /// Plane encoding to produce.
    pub input_format: InputFormat,
    /// History padding policy for short games.
    pub fill_empty_history: FillEmptyHistory,
    /// History slots to fill per position.
    pub history_planes: usize,
    /// Optional JSON outcome-substitution table.
    pub subs_path: Option<PathBuf>,
    /// Delete each input file after it was processed successfully.
    pub delete_files: bool,
    /// Suppress per-file progress on stderr.
    pub quiet: bool,
}

impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        PipelineConfig {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            threads: 1,
            input_format: InputFormat::Classical,
            fill_empty_history: FillEmptyHistory::No,
            history_planes: crate::nn::encoding::MOVE_HISTORY,
            subs_path: None,
            delete_files: false,
            quiet: false,
        }
    }
}

/// Configuration-time failures. These abort the run before any file is
/// touched; per-file failures are handled inside the run instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("input directory {0:?} does not exist")]
    MissingInputDir(PathBuf),

    #[error("output directory {0:?} does not exist")]
    MissingOutputDir(PathBuf),

    #[error("no files to process in {0:?}")]
    NoInputFiles(PathBuf),

    #[error("thread count must be at least 1")]
    InvalidThreadCount,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Subs(#[from] SubsError),
}

/// Failures scoped to a single input file.
#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Runs a conversion over every file in the input directory.
///
/// Returns the merged statistics of all workers.
pub fn run<S: GameSource + Sync>(
    config: &PipelineConfig,
    source: &S,
) -> Result<ProcessStats, PipelineError> {
    if config.threads == 0 {
        return Err(PipelineError::InvalidThreadCount);
    }
    if !config.input_dir.is_dir() {
        return Err(PipelineError::MissingInputDir(config.input_dir.clone()));
    }
    if !config.output_dir.is_dir() {
        return Err(PipelineError::MissingOutputDir(config.output_dir.clone()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&config.input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(PipelineError::NoInputFiles(config.input_dir.clone()));
    }

    let table = match &config.subs_path {
        Some(path) => OutcomeSubs::load(path)?,
        None => OutcomeSubs::new(),
    };

    if config.threads > 1 {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .expect("failed to build rayon thread pool");
        let worker_stats: Vec<ProcessStats> = pool.install(|| {
            (0..config.threads)
                .into_par_iter()
                .map(|offset| process_stripe(config, source, &table, &files, offset))
                .collect()
        });
        let mut totals = ProcessStats::new();
        for stats in &worker_stats {
            totals.merge(stats);
        }
        Ok(totals)
    } else {
        Ok(process_stripe(config, source, &table, &files, 0))
    }
}

/// Processes files `offset, offset + threads, ...` and returns this
/// worker's accumulator.
fn process_stripe<S: GameSource>(
    config: &PipelineConfig,
    source: &S,
    table: &OutcomeSubs,
    files: &[PathBuf],
    offset: usize,
) -> ProcessStats {
    let mut stats = ProcessStats::new();
    if !config.quiet {
        eprintln!("Worker {} starting", offset);
    }
    let mut index = offset;
    while index < files.len() {
        let file = &files[index];
        index += config.threads;

        if !source.matches(file) {
            if !config.quiet {
                eprintln!("Skipping: {}", file.display());
            }
            stats.files_skipped += 1;
            continue;
        }
        match process_file(config, source, table, file, &mut stats) {
            Ok(()) => {
                stats.files_processed += 1;
                if config.delete_files {
                    if let Err(err) = fs::remove_file(file) {
                        eprintln!("Failed to delete {}: {}", file.display(), err);
                    }
                }
            }
            Err(err) => {
                eprintln!("While processing: {} - {}", file.display(), err);
                stats.files_failed += 1;
            }
        }
    }
    stats
}

/// Converts one input file into one training file.
fn process_file<S: GameSource>(
    config: &PipelineConfig,
    source: &S,
    table: &OutcomeSubs,
    file: &PathBuf,
    stats: &mut ProcessStats,
) -> Result<(), FileError> {
    let games = source.read_games(file)?;
    let file_name = file.file_name().expect("listed files have names");
    let mut writer = TrainingDataWriter::create(config.output_dir.join(file_name))?;

    for game in &games {
        let p1_index = player_index(&game.player1)?;
        let p2_index = player_index(&game.player2)?;

        let (planes, transform) = encode_position_for_nn(
            config.input_format,
            &game.history,
            config.history_planes,
            config.fill_empty_history,
        );

        let mut result_q = game.result.result_q();
        let mut result_d = game.result.result_d();
        if !game.moves.is_empty() {
            if let Some(sub) = table.lookup(&game.moves) {
                result_q = sub.q;
                result_d = sub.d;
                stats.substitutions += 1;
            }
        }

        let record = TrainingRecord::from_planes(
            RECORD_VERSION,
            config.input_format,
            &planes,
            result_q,
            result_d,
            p1_index,
            p2_index,
        );
        writer.write_record(&record)?;

        stats.games += 1;
        stats.positions += game.history.len() as u64;
        stats.records_written += 1;
        stats.record_outcome(result_q);
        stats.transform_counts[transform as usize] += 1;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("octant-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_directories_fail_before_work() {
        let out = temp_dir("pipe-out-missing-in");
        let config = PipelineConfig {
            input_dir: PathBuf::from("/nonexistent/octant-input"),
            output_dir: out.clone(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run(&config, &TextGameSource),
            Err(PipelineError::MissingInputDir(_))
        ));

        let input = temp_dir("pipe-in-missing-out");
        fs::write(input.join("a.games"), "").unwrap();
        let config = PipelineConfig {
            input_dir: input.clone(),
            output_dir: PathBuf::from("/nonexistent/octant-output"),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run(&config, &TextGameSource),
            Err(PipelineError::MissingOutputDir(_))
        ));

        fs::remove_dir_all(&out).unwrap();
        fs::remove_dir_all(&input).unwrap();
    }

    #[test]
    fn empty_input_directory_fails() {
        let input = temp_dir("pipe-empty-in");
        let output = temp_dir("pipe-empty-out");
        let config = PipelineConfig {
            input_dir: input.clone(),
            output_dir: output.clone(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run(&config, &TextGameSource),
            Err(PipelineError::NoInputFiles(_))
        ));
        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn zero_threads_is_invalid() {
        let config = PipelineConfig {
            threads: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run(&config, &TextGameSource),
            Err(PipelineError::InvalidThreadCount)
        ));
    }

    #[test]
    fn unmatched_files_are_skipped() {
        struct NothingSource;
        impl GameSource for NothingSource {
            fn matches(&self, _: &Path) -> bool {
                false
            }
            fn read_games(&self, _: &Path) -> Result<Vec<Game>, SourceError> {
                unreachable!("matches() rejected everything")
            }
        }

        let input = temp_dir("pipe-skip-in");
        let output = temp_dir("pipe-skip-out");
        fs::write(input.join("a.pgn"), "").unwrap();
        fs::write(input.join("b.pgn"), "").unwrap();

        let config = PipelineConfig {
            input_dir: input.clone(),
            output_dir: output.clone(),
            quiet: true,
            ..PipelineConfig::default()
        };
        let stats = run(&config, &NothingSource).unwrap();
        assert_eq!(stats.files_skipped, 2);
        assert_eq!(stats.files_processed, 0);

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn bad_file_fails_alone() {
        let input = temp_dir("pipe-fail-in");
        let output = temp_dir("pipe-fail-out");
        fs::write(input.join("bad.games"), "game 1-0 a-1 b-2\nnot a fen\n").unwrap();
        fs::write(
            input.join("good.games"),
            "game 1-0 a-1 b-2\nrnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\n",
        )
        .unwrap();

        let config = PipelineConfig {
            input_dir: input.clone(),
            output_dir: output.clone(),
            quiet: true,
            ..PipelineConfig::default()
        };
        let stats = run(&config, &TextGameSource).unwrap();
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.games, 1);
        assert!(output.join("good.games").is_file());

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&output).unwrap();
    }
}
