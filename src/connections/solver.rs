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
use super::{
    category::*, lexical::*, oracle::*, partition::*, prelude::*, puzzle::Word, similarity::*,
};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupingErr {
    #[error("need at least {need} words to form a group, got {got}")]
    InsufficientInput { need: usize, got: usize },
    #[error("{words} words cannot be split evenly into groups of {group_size}")]
    UnevenPartition { words: usize, group_size: usize },
    #[error("clustering failed: {0}")]
    Clustering(String),
    #[error("got {vectors} vectors for {words} words")]
    Misaligned { words: usize, vectors: usize },
    #[error(transparent)]
    Oracle(#[from] OracleErr),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveErr {
    ///
    /// Every link of a fallback chain failed on the same words. The final link is normally the
    /// vector search, which cannot fail with 4+ words, so this means something is badly wrong
    /// (usually an oracle missing data for one of the words, which `last` then holds).
    ///
    #[error("every grouping strategy failed with {remaining} words left{}", last_failure(.last))]
    ChainExhausted { remaining: usize, last: Option<GroupingErr> },
    #[error(transparent)]
    Grouping(#[from] GroupingErr),
    #[error(transparent)]
    Oracle(#[from] OracleErr),
    #[error("strategy '{strategy}' needs a {oracle} oracle, but none was provided")]
    MissingOracle { strategy: StrategyKind, oracle: &'static str },
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

fn last_failure(last: &Option<GroupingErr>) -> String {
    match last {
        Some(err) => format!(" (last failure: {})", err),
        None => String::new(),
    }
}

///
/// Anything that can turn a puzzle's word list into a full set of groups.
///
/// Strategies are shared across worker threads by the parallel simulator, so they must not hold
/// any per-puzzle mutable state.
///
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, words: &[Word]) -> Result<Vec<Vec<Word>>, SolveErr>;
}

///
/// Finds (at most) one confident group among the words still in play. Returning Ok(None) means
/// "nothing I'm sure about", which is not an error: the chain just moves on to the next finder.
///
pub trait GroupFinder: Send + Sync {
    fn name(&self) -> &'static str;

    fn find_group(&self, remaining: &[Word]) -> Result<Option<Vec<Word>>, GroupingErr>;
}

///
/// Snapshot of the words not yet placed into a group. Taking a group out produces the next
/// snapshot instead of modifying this one, so finders only ever see an immutable word list.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Remaining {
    words: Vec<Word>,
}

impl Remaining {
    pub fn new(words: &[Word]) -> Self {
        Self { words: words.to_vec() }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The next snapshot: these words minus the group (order of the rest is kept)
    pub fn without(&self, group: &[Word]) -> Self {
        Self {
            words: self.words.iter().filter(|w| !group.contains(w)).cloned().collect(),
        }
    }

    /// Whether a group is acceptable here: GROUP_SIZE distinct words, all still in play
    pub fn accepts(&self, group: &[Word]) -> bool {
        let distinct: HashSet<&Word> = group.iter().collect();
        group.len() == GROUP_SIZE
            && distinct.len() == GROUP_SIZE
            && group.iter().all(|w| self.words.contains(w))
    }
}

///
/// Solves a puzzle one group at a time. Each round asks the finders in order for a group among the
/// remaining words, and the first acceptable answer is taken out of play. Rounds repeat until no
/// words remain.
///
/// For a 16 word puzzle that ends with a VectorFinder this always takes exactly 4 rounds.
///
pub struct FallbackChain {
    name: String,
    links: Vec<Box<dyn GroupFinder>>,
}

impl FallbackChain {
    pub fn new(name: impl Into<String>, links: Vec<Box<dyn GroupFinder>>) -> Self {
        Self { name: name.into(), links }
    }

    fn next_group(&self, remaining: &Remaining) -> Result<Vec<Word>, SolveErr> {
        let mut last = None;
        for link in &self.links {
            match link.find_group(remaining.words()) {
                Ok(Some(group)) if remaining.accepts(&group) => {
                    log::debug!("{} found {:?}", link.name(), group);
                    return Ok(group);
                }
                Ok(Some(group)) => {
                    log::warn!(
                        "{} returned an unusable group {:?}, falling back",
                        link.name(),
                        group
                    );
                }
                Ok(None) => {
                    let n = remaining.len();
                    log::debug!("{} found nothing among {} words, falling back", link.name(), n);
                }
                Err(err) => {
                    log::debug!("{} failed ({}), falling back", link.name(), err);
                    last = Some(err);
                }
            }
        }

        let err = SolveErr::ChainExhausted {
            remaining: remaining.len(),
            last,
        };
        log::warn!("{}: {}", self.name, err);
        Err(err)
    }
}

impl Strategy for FallbackChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, words: &[Word]) -> Result<Vec<Vec<Word>>, SolveErr> {
        let mut remaining = Remaining::new(words);
        let mut out = Vec::with_capacity(words.len() / GROUP_SIZE);
        while !remaining.is_empty() {
            let group = self.next_group(&remaining)?;
            remaining = remaining.without(&group);
            out.push(group);
        }

        Ok(out)
    }
}

/// Most mutually similar 4 words by embedding. Never comes back empty handed with 4+ words.
pub struct VectorFinder {
    embedder: Arc<dyn Embedder>,
}

impl VectorFinder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

impl GroupFinder for VectorFinder {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn find_group(&self, remaining: &[Word]) -> Result<Option<Vec<Word>>, GroupingErr> {
        let vectors = self.embedder.embed_all(remaining)?;
        best_quad(&vectors, remaining).map(Some)
    }
}

pub struct LexicalThresholdFinder {
    oracle: Arc<dyn LexicalOracle>,
    threshold: ConnFloat,
}

impl LexicalThresholdFinder {
    pub fn new(oracle: Arc<dyn LexicalOracle>) -> Self {
        Self { oracle, threshold: LEXICAL_THRESHOLD }
    }

    pub fn with_threshold(mut self, threshold: ConnFloat) -> Self {
        self.threshold = threshold;
        self
    }
}

impl GroupFinder for LexicalThresholdFinder {
    fn name(&self) -> &'static str {
        "lexical-threshold"
    }

    fn find_group(&self, remaining: &[Word]) -> Result<Option<Vec<Word>>, GroupingErr> {
        Ok(threshold_group(remaining, self.oracle.as_ref(), self.threshold))
    }
}

pub struct LexicalAverageFinder {
    oracle: Arc<dyn LexicalOracle>,
    factor: ConnFloat,
}

impl LexicalAverageFinder {
    pub fn new(oracle: Arc<dyn LexicalOracle>) -> Self {
        Self { oracle, factor: GROWTH_FACTOR }
    }
}

impl GroupFinder for LexicalAverageFinder {
    fn name(&self) -> &'static str {
        "lexical-average"
    }

    fn find_group(&self, remaining: &[Word]) -> Result<Option<Vec<Word>>, GroupingErr> {
        Ok(average_growth_group(remaining, self.oracle.as_ref(), self.factor))
    }
}

pub struct CategoryFinder {
    categories: Arc<dyn CategoryOracle>,
}

impl CategoryFinder {
    pub fn new(categories: Arc<dyn CategoryOracle>) -> Self {
        Self { categories }
    }
}

impl GroupFinder for CategoryFinder {
    fn name(&self) -> &'static str {
        "category"
    }

    fn find_group(&self, remaining: &[Word]) -> Result<Option<Vec<Word>>, GroupingErr> {
        Ok(category_group(remaining, self.categories.as_ref()))
    }
}

/// Solves the whole puzzle in one go with the balanced partitioner
pub struct BalancedStrategy {
    embedder: Arc<dyn Embedder>,
}

impl BalancedStrategy {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

impl Strategy for BalancedStrategy {
    fn name(&self) -> &str {
        "kmeans"
    }

    fn solve(&self, words: &[Word]) -> Result<Vec<Vec<Word>>, SolveErr> {
        let vectors = self.embedder.embed_all(words)?;
        Ok(partition(&vectors, words, GROUP_SIZE)?.into_values().collect())
    }
}

/// Baseline that just cuts the word list into consecutive runs of GROUP_SIZE
pub struct ChunkStrategy;

impl Strategy for ChunkStrategy {
    fn name(&self) -> &str {
        "mock"
    }

    fn solve(&self, words: &[Word]) -> Result<Vec<Vec<Word>>, SolveErr> {
        Ok(words.chunks(GROUP_SIZE).map(|c| c.to_vec()).collect())
    }
}

/// The named strategy configurations the simulator can run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Mock,
    CosineSimilarity,
    Kmeans,
    Wordnet,
    WordnetAverage,
    Wikipedia,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Mock,
        StrategyKind::CosineSimilarity,
        StrategyKind::Kmeans,
        StrategyKind::Wordnet,
        StrategyKind::WordnetAverage,
        StrategyKind::Wikipedia,
    ];

    pub fn as_str(&self) -> &'static str {
        use StrategyKind::*;
        match self {
            Mock => "mock",
            CosineSimilarity => "cosine_similarity",
            Kmeans => "kmeans",
            Wordnet => "wordnet",
            WordnetAverage => "wordnet_average",
            Wikipedia => "wikipedia",
        }
    }

    ///
    /// Assembles the strategy out of whichever oracles it needs. Fallback chains always end with
    /// the vector search, so every chain needs an embedder.
    ///
    pub fn build(self, oracles: &Oracles) -> Result<Box<dyn Strategy>, SolveErr> {
        use StrategyKind::*;
        let name = self.as_str();
        let strategy: Box<dyn Strategy> = match self {
            Mock => Box::new(ChunkStrategy),
            CosineSimilarity => Box::new(FallbackChain::new(name, vec![
                Box::new(VectorFinder::new(oracles.embedder(self)?)),
            ])),
            Kmeans => Box::new(BalancedStrategy::new(oracles.embedder(self)?)),
            Wordnet => Box::new(FallbackChain::new(name, vec![
                Box::new(LexicalThresholdFinder::new(oracles.lexical(self)?)),
                Box::new(VectorFinder::new(oracles.embedder(self)?)),
            ])),
            WordnetAverage => Box::new(FallbackChain::new(name, vec![
                Box::new(LexicalAverageFinder::new(oracles.lexical(self)?)),
                Box::new(VectorFinder::new(oracles.embedder(self)?)),
            ])),
            Wikipedia => Box::new(FallbackChain::new(name, vec![
                Box::new(CategoryFinder::new(oracles.categories(self)?)),
                Box::new(LexicalThresholdFinder::new(oracles.lexical(self)?)),
                Box::new(VectorFinder::new(oracles.embedder(self)?)),
            ])),
        };

        Ok(strategy)
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SolveErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| SolveErr::UnknownStrategy(s.to_string()))
    }
}

/// The outside services available to strategies (each optional, depending on what data was given)
#[derive(Clone, Default)]
pub struct Oracles {
    pub embedder: Option<Arc<dyn Embedder>>,
    pub lexical: Option<Arc<dyn LexicalOracle>>,
    pub categories: Option<Arc<dyn CategoryOracle>>,
}

impl Oracles {
    fn embedder(&self, strategy: StrategyKind) -> Result<Arc<dyn Embedder>, SolveErr> {
        self.embedder.clone().ok_or(SolveErr::MissingOracle { strategy, oracle: "embedding" })
    }

    fn lexical(&self, strategy: StrategyKind) -> Result<Arc<dyn LexicalOracle>, SolveErr> {
        self.lexical.clone().ok_or(SolveErr::MissingOracle { strategy, oracle: "lexical" })
    }

    fn categories(&self, strategy: StrategyKind) -> Result<Arc<dyn CategoryOracle>, SolveErr> {
        self.categories.clone().ok_or(SolveErr::MissingOracle { strategy, oracle: "category" })
    }
}
