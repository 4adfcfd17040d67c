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
use super::{prelude::*, puzzle::Word, solver::GroupingErr};

///
/// Square matrix of pairwise similarities over the indices of a word list. The diagonal is always
/// 0.0 (a word's similarity with itself is never used).
///
/// Matrices built from cosine similarity are symmetric by construction. Matrices built from an
/// outside oracle might not be, and should be passed through symmetrized() before use.
///
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<ConnFloat>,
}

impl SimilarityMatrix {
    /// Builds the matrix by calling f(i, j) for every i != j
    pub fn from_fn<F>(n: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> ConnFloat,
    {
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    values[i * n + j] = f(i, j);
                }
            }
        }

        Self { n, values }
    }

    pub fn cosine(vectors: &[Vec<ConnFloat>]) -> Self {
        Self::from_fn(vectors.len(), |i, j| cosine_similarity(&vectors[i], &vectors[j]))
    }

    /// Copy of this matrix where (i, j) and (j, i) both hold the larger of the two
    pub fn symmetrized(&self) -> Self {
        Self::from_fn(self.n, |i, j| self.get(i, j).max(self.get(j, i)))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> ConnFloat {
        self.values[i * self.n + j]
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Sum of the similarities over every unordered pair of the given indices
    pub fn clique_score(&self, indices: &[usize]) -> ConnFloat {
        let mut out = 0.0;
        for (a, i) in indices.iter().enumerate() {
            for j in &indices[a + 1..] {
                out += self.get(*i, *j);
            }
        }
        out
    }

    ///
    /// Exhaustively scores every GROUP_SIZE subset of indices (C(16, 4) = 1820 at most in a real
    /// puzzle) and returns the best one with its score. Subsets are visited in lexicographic order
    /// and a later subset only wins with a strictly greater score, so ties always go to the
    /// lexicographically first subset.
    ///
    pub fn best_clique(&self) -> Option<(ConnFloat, [usize; GROUP_SIZE])> {
        IndexCombinations::<GROUP_SIZE>::new(self.n)
            .first_max_by_score(|indices| self.clique_score(indices))
    }
}

///
/// Finds the 4 words whose vectors are most mutually similar (greatest summed pairwise cosine
/// similarity), returned in index order.
///
/// This always succeeds when given at least 4 words, which is what makes it the final fallback of
/// every other strategy. Only ever give it the words still in play.
///
pub fn best_quad(vectors: &[Vec<ConnFloat>], words: &[Word]) -> Result<Vec<Word>, GroupingErr> {
    if vectors.len() != words.len() {
        return Err(GroupingErr::Misaligned {
            words: words.len(),
            vectors: vectors.len(),
        });
    }

    if words.len() < GROUP_SIZE {
        return Err(GroupingErr::InsufficientInput {
            need: GROUP_SIZE,
            got: words.len(),
        });
    }

    let (score, indices) = SimilarityMatrix::cosine(vectors)
        .best_clique()
        .ok_or(GroupingErr::InsufficientInput {
            need: GROUP_SIZE,
            got: words.len(),
        })?;

    let out: Vec<Word> = indices.iter().map(|i| words[*i].clone()).collect();
    log::debug!("best quad of {} words: {:?} (score {:.4})", words.len(), out, score);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::puzzle::words;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn one_hot(dim: usize, at: usize) -> Vec<ConnFloat> {
        let mut out = vec![0.0; dim];
        out[at] = 1.0;
        out
    }

    fn letters(n: usize) -> Vec<Word> {
        (0..n).map(|i| Word::new(&format!("w{}", i))).collect()
    }

    fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<ConnFloat>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect()
    }

    #[test]
    fn test_near_identical_quad_found() {
        // four words near e0 (a tiny nudge each), twelve words on their own orthogonal axes
        let dim = 16;
        let mut vectors = Vec::new();
        for k in 0..4 {
            let mut v = one_hot(dim, 0);
            if k > 0 {
                v[k] = 0.01;
            }
            vectors.push(v);
        }
        for k in 4..dim {
            vectors.push(one_hot(dim, k));
        }

        // shuffle the quad into the middle of the list
        let mut order: Vec<usize> = (0..16).collect();
        order.rotate_left(6);
        let vectors: Vec<Vec<ConnFloat>> = order.iter().map(|i| vectors[*i].clone()).collect();
        let names: Vec<Word> = order.iter().map(|i| Word::new(&format!("w{}", i))).collect();

        let out: HashSet<Word> = best_quad(&vectors, &names).unwrap().into_iter().collect();
        let expected: HashSet<Word> = words(["w0", "w1", "w2", "w3"]).into_iter().collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_returns_four_distinct_input_words() {
        for n in 4..=16 {
            let names = letters(n);
            let vectors = random_vectors(n, 8, n as u64);
            let out = best_quad(&vectors, &names).unwrap();
            assert_eq!(out.len(), GROUP_SIZE);
            let distinct: HashSet<&Word> = out.iter().collect();
            assert_eq!(distinct.len(), GROUP_SIZE, "{:?}", out);
            assert!(out.iter().all(|w| names.contains(w)));
        }
    }

    #[test]
    fn test_best_clique_beats_every_other_combination() {
        for seed in 0..5 {
            let vectors = random_vectors(9, 5, seed);
            let matrix = SimilarityMatrix::cosine(&vectors);
            let (best, indices) = matrix.best_clique().unwrap();
            assert_eq!(best, matrix.clique_score(&indices));

            for a in 0..9 {
                for b in (a + 1)..9 {
                    for c in (b + 1)..9 {
                        for d in (c + 1)..9 {
                            let score = matrix.clique_score(&[a, b, c, d]);
                            assert!(best >= score, "{:?} beat {:?}", [a, b, c, d], indices);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_ties_resolve_to_first_combination() {
        // all orthogonal = every quad scores 0
        let vectors: Vec<Vec<ConnFloat>> = (0..6).map(|i| one_hot(6, i)).collect();
        let out = best_quad(&vectors, &letters(6)).unwrap();
        assert_eq!(out, words(["w0", "w1", "w2", "w3"]));
    }

    #[test]
    fn test_insufficient_input() {
        let vectors: Vec<Vec<ConnFloat>> = (0..3).map(|i| one_hot(3, i)).collect();
        assert_eq!(
            best_quad(&vectors, &letters(3)),
            Err(GroupingErr::InsufficientInput { need: 4, got: 3 }),
        );
    }

    #[test]
    fn test_misaligned_input() {
        let vectors: Vec<Vec<ConnFloat>> = (0..4).map(|i| one_hot(4, i)).collect();
        assert!(matches!(
            best_quad(&vectors, &letters(5)),
            Err(GroupingErr::Misaligned { words: 5, vectors: 4 }),
        ));
    }

    #[test]
    fn test_symmetrized_takes_max() {
        let m = SimilarityMatrix::from_fn(3, |i, j| if i < j { 0.9 } else { 0.1 });
        assert_eq!(m.get(0, 1), 0.9);
        assert_eq!(m.get(1, 0), 0.1);
        let s = m.symmetrized();
        assert_eq!(s.get(1, 0), 0.9);
        assert_eq!(s.get(0, 1), 0.9);
        assert_eq!(s.get(2, 2), 0.0);
    }
}
