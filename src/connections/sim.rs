/*
 * MIT License
 *
 * Copyright (c) 2022 Joseph Sacchini
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use super::{prelude::*, puzzle::*, solver::*};
use instant::Instant;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptErr {
    #[error("invalid attempt, expected 4 groups but got {0}")]
    WrongGroupCount(usize),
    #[error("invalid attempt, group {group} has {size} words (expected 4)")]
    WrongGroupSize { group: usize, size: usize },
}

///
/// Counts the answer groups that appear among the attempt's groups. Both sides are compared as
/// sets, so neither the order of the groups nor the order of words inside a group matters. A score
/// of NUM_GROUPS means the attempt reproduced the answer exactly.
///
/// An attempt without exactly NUM_GROUPS groups of GROUP_SIZE words is rejected.
///
pub fn score_puzzle(answer: &[Vec<Word>], attempt: &[Vec<Word>]) -> Result<usize, AttemptErr> {
    if attempt.len() != NUM_GROUPS {
        return Err(AttemptErr::WrongGroupCount(attempt.len()));
    }

    if let Some((group, g)) = attempt.iter().enumerate().find(|(_, g)| g.len() != GROUP_SIZE) {
        return Err(AttemptErr::WrongGroupSize { group, size: g.len() });
    }

    let attempt_sets: Vec<HashSet<&Word>> = attempt.iter().map(|g| g.iter().collect()).collect();
    Ok(answer
        .iter()
        .map(|g| g.iter().collect::<HashSet<&Word>>())
        .filter(|s| attempt_sets.contains(s))
        .count())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SimulatorStats {
    pub total: usize,
    pub correct: usize,
    pub matching_groups: usize,
    pub invalid_attempts: usize,
}

impl SimulatorStats {
    pub fn invalid_attempt(&mut self) {
        self.total += 1;
        self.invalid_attempts += 1;
    }

    pub fn inc(&mut self, matching_groups: usize) {
        self.total += 1;
        self.matching_groups += matching_groups;
        if matching_groups == NUM_GROUPS {
            self.correct += 1;
        }
    }

    /// Scores one attempt against its puzzle and counts the outcome
    pub fn record(&mut self, puzzle: &Puzzle, attempt: &[Vec<Word>]) {
        let answer = puzzle.answers();
        match score_puzzle(&answer, attempt) {
            Ok(matching) => {
                if matching != NUM_GROUPS && log::log_enabled!(log::Level::Debug) {
                    log::debug!(
                        "{}\nAnswer: {:?}\nModel:  {:?}",
                        puzzle.date(),
                        answer,
                        sorted_groups(attempt)
                    );
                }
                self.inc(matching);
            }
            Err(err) => {
                log::debug!("{}: {}", puzzle.date(), err);
                self.invalid_attempt();
            }
        }
    }
}

fn sorted_groups(groups: &[Vec<Word>]) -> Vec<Vec<Word>> {
    groups
        .iter()
        .map(|g| {
            let mut g = g.clone();
            g.sort();
            g
        })
        .collect()
}

/// Shared flag to stop a batch between puzzles. Clones all point at the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunMode {
    Sequential,
    Parallel,
}

///
/// Runs the strategy on every puzzle in order, scoring as it goes. Stops early (keeping what has
/// been scored so far) if the token is cancelled between puzzles.
///
/// A strategy error aborts the whole batch.
///
pub fn run_sequential(
    puzzles: &[Puzzle],
    strategy: &dyn Strategy,
    cancel: &CancelToken,
) -> Result<SimulatorStats, SolveErr> {
    let mut stats = SimulatorStats::default();
    for puzzle in puzzles {
        if cancel.is_cancelled() {
            log::info!("cancelled after {} of {} puzzles", stats.total, puzzles.len());
            break;
        }

        let attempt = strategy.solve(puzzle.words())?;
        stats.record(puzzle, &attempt);
    }

    Ok(stats)
}

///
/// Solves every puzzle independently on the rayon pool, then scores the attempts on this thread in
/// puzzle order. Gives exactly the same stats as run_sequential.
///
/// Puzzles not yet started when the token is cancelled are skipped, and scoring stops at the first
/// skipped puzzle, so only an in-order prefix of the batch is counted.
///
pub fn run_parallel(
    puzzles: &[Puzzle],
    strategy: &dyn Strategy,
    cancel: &CancelToken,
) -> Result<SimulatorStats, SolveErr> {
    let attempts: Vec<Option<Result<Vec<Vec<Word>>, SolveErr>>> = puzzles
        .par_iter()
        .map(|puzzle| {
            if cancel.is_cancelled() {
                None
            } else {
                Some(strategy.solve(puzzle.words()))
            }
        })
        .collect();

    let mut stats = SimulatorStats::default();
    for (puzzle, attempt) in puzzles.iter().zip(attempts) {
        match attempt {
            Some(attempt) => stats.record(puzzle, &attempt?),
            None => {
                log::info!("cancelled after {} of {} puzzles", stats.total, puzzles.len());
                break;
            }
        }
    }

    Ok(stats)
}

pub fn run(
    puzzles: &[Puzzle],
    strategy: &dyn Strategy,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<SimulatorStats, SolveErr> {
    match mode {
        RunMode::Sequential => run_sequential(puzzles, strategy, cancel),
        RunMode::Parallel => run_parallel(puzzles, strategy, cancel),
    }
}

/// Summary of a finished batch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub strategy: String,
    pub seconds: f64,
    pub total_puzzles: usize,
    pub correct_puzzles: usize,
    pub puzzle_pct: f64,
    pub total_groups: usize,
    pub correct_groups: usize,
    pub group_pct: f64,
    pub invalid_attempts: usize,
}

impl Report {
    pub fn new(strategy: &str, seconds: f64, stats: &SimulatorStats) -> Self {
        let total_groups = stats.total * NUM_GROUPS;
        Self {
            strategy: strategy.to_string(),
            seconds,
            total_puzzles: stats.total,
            correct_puzzles: stats.correct,
            puzzle_pct: pct(stats.correct, stats.total),
            total_groups,
            correct_groups: stats.matching_groups,
            group_pct: pct(stats.matching_groups, total_groups),
            invalid_attempts: stats.invalid_attempts,
        }
    }
}

// percentage rounded to 2 decimal places, 0 for an empty batch
fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Done running {}, took {:.4} seconds", self.strategy, self.seconds)?;
        writeln!(f, "------")?;
        writeln!(
            f,
            "Total puzzles: {}, Correct puzzles: {}, Pct: {}",
            self.total_puzzles, self.correct_puzzles, self.puzzle_pct
        )?;
        writeln!(
            f,
            "Total groups: {}, Correct groups: {}, Pct: {}",
            self.total_groups, self.correct_groups, self.group_pct
        )?;
        write!(f, "Invalid attempts: {}", self.invalid_attempts)
    }
}

/// Runs a batch and times it
pub fn simulate(
    puzzles: &[Puzzle],
    strategy: &dyn Strategy,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<Report, SolveErr> {
    let start = Instant::now();
    let stats = run(puzzles, strategy, mode, cancel)?;
    let seconds = start.elapsed().as_secs_f64();
    log::info!("{} scored {} puzzles in {:.2}s", strategy.name(), stats.total, seconds);
    Ok(Report::new(strategy.name(), seconds, &stats))
}
