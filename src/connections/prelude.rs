// This file allows you to configure some of the constants that define the connections puzzle and
// the heuristics used to solve it.
//
// The puzzle shape (4 groups of 4) is fixed by the game, but the rest of the code is written
// against these constants rather than literal numbers.


// how many words are in a single group?
pub const GROUP_SIZE: usize = 4;
// how many groups make up a puzzle?
pub const NUM_GROUPS: usize = 4;
// how many words does a whole puzzle contain?
pub const PUZZLE_SIZE: usize = GROUP_SIZE * NUM_GROUPS;
// the highest difficulty level a group can have (levels are 0..=MAX_LEVEL)
pub const MAX_LEVEL: u8 = (NUM_GROUPS - 1) as u8;
// absolute lexical similarity a word needs (against the root) to join a group in the threshold
// variant of the lexical grouper. This value was picked by hand.
pub const LEXICAL_THRESHOLD: ConnFloat = 0.88;
// per-member bar in the average-growth variant: a candidate joins when its summed similarity to
// the group exceeds GROWTH_FACTOR * group size
pub const GROWTH_FACTOR: ConnFloat = 0.8;
// seed used for k-means initialization, so partitions are reproducible
pub const KMEANS_SEED: u64 = 42;
// how many Lloyd iterations k-means may run before we give up on convergence
pub const KMEANS_MAX_ITERATIONS: usize = 300;
// how many puzzles the simulator runs when not told otherwise
pub const DEFAULT_PUZZLE_COUNT: usize = 5;

// This type allows you to switch between using f64 for all calculations and f32 if you so desire.
pub type ConnFloat = f64;

pub use crate::util::*;

/// Given some input &str, clean it up into the canonical form of a puzzle word: surrounding
/// whitespace removed and all letters upper-cased. Puzzle words are compared in this form only.
pub fn normalize_word(str: &str) -> String {
    str.trim().to_uppercase()
}

/// Cosine similarity (1 - cosine distance) of two equally sized vectors. Zero-length vectors have
/// no direction, so they are treated as unrelated to everything (similarity 0).
pub fn cosine_similarity(a: &[ConnFloat], b: &[ConnFloat]) -> ConnFloat {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Euclidean distance between two equally sized vectors
pub fn euclidean_distance(a: &[ConnFloat], b: &[ConnFloat]) -> ConnFloat {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<ConnFloat>()
        .sqrt()
}

/// Shifts and scales a single vector so its own components have mean 0 and (population) standard
/// deviation 1. Returns None when the vector is constant, because it cannot be scaled.
pub fn standardize(v: &[ConnFloat]) -> Option<Vec<ConnFloat>> {
    if v.is_empty() {
        return None;
    }

    let n = v.len() as ConnFloat;
    let mean = v.iter().sum::<ConnFloat>() / n;
    let variance = v.iter().map(|x| (x - mean) * (x - mean)).sum::<ConnFloat>() / n;
    let std = variance.sqrt();
    if !std.is_finite() || std == 0.0 {
        return None;
    }

    Some(v.iter().map(|x| (x - mean) / std).collect())
}
