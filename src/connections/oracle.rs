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
//!
//! The grouping heuristics never compute meaning themselves, they ask one of three outside
//! services (embeddings, lexical similarity, category tags). Each service is a trait here, so the
//! algorithms can run against a real data source or a deterministic in-memory fake alike.
//!
//! Every oracle must be Send + Sync, since the parallel simulator shares one across worker threads.
//!

use super::{data::LoadDataErr, prelude::*, puzzle::Word};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleErr {
    #[error("no data for word '{0}'")]
    UnknownWord(Word),
    #[error("embedding for '{word}' has {got} dimensions, expected {expected}")]
    DimensionMismatch { word: Word, got: usize, expected: usize },
}

/// Maps words to fixed-length vectors
pub trait Embedder: Send + Sync {
    fn embed(&self, word: &Word) -> Result<Vec<ConnFloat>, OracleErr>;

    /// Embeds every word, output aligned by index with the input
    fn embed_all(&self, words: &[Word]) -> Result<Vec<Vec<ConnFloat>>, OracleErr> {
        words.iter().map(|w| self.embed(w)).collect()
    }
}

/// Semantic relatedness of two words in [0, 1]. Implementations are not trusted to be symmetric.
pub trait LexicalOracle: Send + Sync {
    fn similarity(&self, a: &Word, b: &Word) -> ConnFloat;
}

/// Any plain function or closure can act as a lexical oracle (handy for fakes)
impl<F> LexicalOracle for F
where
    F: Fn(&Word, &Word) -> ConnFloat + Send + Sync,
{
    fn similarity(&self, a: &Word, b: &Word) -> ConnFloat {
        self(a, b)
    }
}

/// Similarity of a and b asked in both directions, keeping the larger answer
pub fn symmetric_similarity<O>(oracle: &O, a: &Word, b: &Word) -> ConnFloat
where
    O: LexicalOracle + ?Sized,
{
    oracle.similarity(a, b).max(oracle.similarity(b, a))
}

/// The set of category tags associated with a word (empty when nothing is known)
pub trait CategoryOracle: Send + Sync {
    fn tags(&self, word: &Word) -> HashSet<String>;
}

///
/// Word embeddings held in memory. All vectors share one dimension.
///
/// Can be filled directly, or parsed from a whitespace separated text table with one word per line
/// followed by its components (the GloVe text format):
///
/// BASS 0.12 -0.5 0.33 ...
///
#[derive(Clone, Debug, Default)]
pub struct EmbeddingTable {
    dim: Option<usize>,
    vectors: HashMap<Word, Vec<ConnFloat>>,
}

impl EmbeddingTable {
    pub fn insert(&mut self, word: Word, vector: Vec<ConnFloat>) -> Result<(), OracleErr> {
        match self.dim {
            Some(expected) if expected != vector.len() => {
                return Err(OracleErr::DimensionMismatch { word, got: vector.len(), expected });
            }
            _ => self.dim = Some(vector.len()),
        }

        self.vectors.insert(word, vector);
        Ok(())
    }

    pub fn parse(raw: &str) -> Result<Self, LoadDataErr> {
        let mut out = Self::default();
        for (idx, line) in raw.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let word = match parts.next() {
                Some(w) => Word::new(w),
                None => continue,
            };

            let vector = parts
                .map(|p| {
                    p.parse::<ConnFloat>()
                        .map_err(|err| LoadDataErr::BadFloatStr(p.to_string(), err))
                })
                .collect::<Result<Vec<_>, _>>()?;

            out.insert(word, vector).map_err(|err| LoadDataErr::MalformedRow {
                line: idx + 1,
                reason: err.to_string(),
            })?;
        }

        log::debug!("got {} embeddings of dimension {:?}", out.len(), out.dim);
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl Embedder for EmbeddingTable {
    fn embed(&self, word: &Word) -> Result<Vec<ConnFloat>, OracleErr> {
        self.vectors
            .get(word)
            .cloned()
            .ok_or_else(|| OracleErr::UnknownWord(word.clone()))
    }
}

///
/// Precomputed pairwise lexical similarities. Lookups try (a, b) then (b, a), and unknown pairs
/// score 0.0 (nothing known = not related).
///
/// Text format is one pair per line:
///
/// BASS TROUT 0.93
///
#[derive(Clone, Debug, Default)]
pub struct LexicalTable {
    scores: HashMap<(Word, Word), ConnFloat>,
}

impl LexicalTable {
    pub fn insert(&mut self, a: Word, b: Word, score: ConnFloat) {
        self.scores.insert((a, b), score);
    }

    pub fn parse(raw: &str) -> Result<Self, LoadDataErr> {
        let mut out = Self::default();
        for (idx, line) in raw.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                [] => continue,
                [a, b, score] => {
                    let score = score
                        .parse::<ConnFloat>()
                        .map_err(|err| LoadDataErr::BadFloatStr(score.to_string(), err))?;
                    out.insert(Word::new(a), Word::new(b), score);
                }
                _ => {
                    return Err(LoadDataErr::MalformedRow {
                        line: idx + 1,
                        reason: format!("expected 'WORD WORD SCORE', got {} fields", parts.len()),
                    })
                }
            }
        }

        log::debug!("got {} lexical similarity pairs", out.scores.len());
        Ok(out)
    }
}

impl LexicalOracle for LexicalTable {
    fn similarity(&self, a: &Word, b: &Word) -> ConnFloat {
        // tuple keys can't be borrowed as (&Word, &Word), so we build an owned key
        let key = (a.clone(), b.clone());
        if let Some(score) = self.scores.get(&key) {
            return *score;
        }

        let key = (key.1, key.0);
        self.scores.get(&key).copied().unwrap_or(0.0)
    }
}

///
/// Category tags per word, held in memory.
///
/// Usually built from cached search results, a JSON array like:
///
/// [{"word": "CHICAGO", "results": ["Chicago", "Chicago (musical)", "Chicago Bears", "Chicago (hot dog)"]}]
///
/// where the tags of a word are the parenthesized parts of its result titles (so "musical" and
/// "hot dog" above).
///
#[derive(Clone, Debug, Default)]
pub struct CategoryIndex {
    tags: HashMap<Word, HashSet<String>>,
}

#[derive(Deserialize)]
struct SearchResultsEntry {
    word: Word,
    results: Vec<String>,
}

// this parenthetical is attached to so many unrelated titles that it carries no meaning
const MEANINGLESS_TAG: &str = "disambiguation";

impl CategoryIndex {
    pub fn insert<S: Into<String>>(&mut self, word: Word, tags: impl IntoIterator<Item = S>) {
        self.tags.entry(word).or_default().extend(tags.into_iter().map(Into::into));
    }

    pub fn from_search_results_json(raw: &str) -> Result<Self, LoadDataErr> {
        let entries: Vec<SearchResultsEntry> = serde_json::from_str(raw)?;
        let mut out = Self::default();
        for entry in entries {
            out.insert(entry.word, tags_from_titles(&entry.results));
        }

        log::debug!("got category tags for {} words", out.tags.len());
        Ok(out)
    }
}

impl CategoryOracle for CategoryIndex {
    fn tags(&self, word: &Word) -> HashSet<String> {
        self.tags.get(word).cloned().unwrap_or_default()
    }
}

impl CategoryOracle for HashMap<Word, HashSet<String>> {
    fn tags(&self, word: &Word) -> HashSet<String> {
        self.get(word).cloned().unwrap_or_default()
    }
}

/// Collects the first parenthetical of every title, minus the meaningless "disambiguation"
pub fn tags_from_titles<S: AsRef<str>>(titles: &[S]) -> HashSet<String> {
    let mut out: HashSet<String> = titles
        .iter()
        .filter_map(|t| first_parenthetical(t.as_ref()))
        .map(|t| t.to_string())
        .collect();
    out.remove(MEANINGLESS_TAG);
    out
}

///
/// Finds the first "(...)" with non-empty contents and returns the contents. An opening paren
/// directly followed by a closing one doesn't count, the search moves on past it.
///
fn first_parenthetical(title: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(open) = title[from..].find('(').map(|i| i + from) {
        let close = open + 1 + title[open + 1..].find(')')?;
        if close > open + 1 {
            return Some(&title[open + 1..close]);
        }
        from = open + 1;
    }

    None
}

///
/// A grow-only, read-through memo table. Values are computed on the first miss and never evicted.
///
/// Many threads may read at once; a miss computes the value outside the lock, so two threads
/// missing on the same key may both compute it (the oracles are deterministic, so either result
/// is fine to keep).
///
#[derive(Debug)]
pub struct Memo<K, V> {
    table: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { table: RwLock::new(HashMap::new()) }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn get_or_try_insert_with<E, F>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.table.read().get(&key) {
            return Ok(hit.clone());
        }

        let value = f()?;
        self.table.write().entry(key).or_insert_with(|| value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

/// Read-through cache in front of any Embedder
#[derive(Debug)]
pub struct CachedEmbedder<E> {
    inner: E,
    memo: Memo<Word, Vec<ConnFloat>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self { inner, memo: Memo::default() }
    }

    pub fn cached(&self) -> usize {
        self.memo.len()
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn embed(&self, word: &Word) -> Result<Vec<ConnFloat>, OracleErr> {
        self.memo.get_or_try_insert_with(word.clone(), || self.inner.embed(word))
    }
}

/// Read-through cache in front of any LexicalOracle (keyed by the ordered pair)
#[derive(Debug)]
pub struct CachedLexical<O> {
    inner: O,
    memo: Memo<(Word, Word), ConnFloat>,
}

impl<O: LexicalOracle> CachedLexical<O> {
    pub fn new(inner: O) -> Self {
        Self { inner, memo: Memo::default() }
    }

    pub fn cached(&self) -> usize {
        self.memo.len()
    }
}

impl<O: LexicalOracle> LexicalOracle for CachedLexical<O> {
    fn similarity(&self, a: &Word, b: &Word) -> ConnFloat {
        let out: Result<_, std::convert::Infallible> = self
            .memo
            .get_or_try_insert_with((a.clone(), b.clone()), || Ok(self.inner.similarity(a, b)));
        match out {
            Ok(score) => score,
            Err(never) => match never {},
        }
    }
}

/// Read-through cache in front of any CategoryOracle
#[derive(Debug)]
pub struct CachedCategories<C> {
    inner: C,
    memo: Memo<Word, HashSet<String>>,
}

impl<C: CategoryOracle> CachedCategories<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, memo: Memo::default() }
    }
}

impl<C: CategoryOracle> CategoryOracle for CachedCategories<C> {
    fn tags(&self, word: &Word) -> HashSet<String> {
        let out: Result<_, std::convert::Infallible> = self
            .memo
            .get_or_try_insert_with(word.clone(), || Ok(self.inner.tags(word)));
        match out {
            Ok(tags) => tags,
            Err(never) => match never {},
        }
    }
}
