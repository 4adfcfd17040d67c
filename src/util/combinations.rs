use std::iter::FusedIterator;

///
/// Iterates every K-element subset of the indices 0..n, each emitted as a sorted [usize; K].
///
/// The subsets come out in lexicographic order, for example with n=5, K=3:
///
/// [0, 1, 2]
/// [0, 1, 3]
/// [0, 1, 4]
/// [0, 2, 3]
/// ...
/// [2, 3, 4]
///
/// which is what makes any "keep the first best" search over them deterministic.
///
pub struct IndexCombinations<const K: usize> {
    n: usize,
    next: Option<[usize; K]>,
    remaining: usize,
}

impl<const K: usize> IndexCombinations<K> {
    pub fn new(n: usize) -> Self {
        let next = if K <= n {
            let mut first = [0; K];
            for (i, slot) in first.iter_mut().enumerate() {
                *slot = i;
            }
            Some(first)
        } else {
            None
        };

        Self {
            n,
            next,
            remaining: binomial(n, K),
        }
    }
}

impl<const K: usize> Iterator for IndexCombinations<K> {
    type Item = [usize; K];

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.remaining -= 1;

        // like an odometer... find the right-most index which can still be bumped (index k may go
        // up to n - K + k), bump it, then reset everything to its right to count up from there.
        // When no index can be bumped we've emitted the last combination.
        let mut bumped = cur;
        self.next = None;
        for k in (0..K).rev() {
            if bumped[k] < self.n - K + k {
                bumped[k] += 1;
                for j in (k + 1)..K {
                    bumped[j] = bumped[j - 1] + 1;
                }
                self.next = Some(bumped);
                break;
            }
        }

        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const K: usize> ExactSizeIterator for IndexCombinations<K> {}
impl<const K: usize> FusedIterator for IndexCombinations<K> {}

/// n choose k
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }

    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(16, 4, 1820)]
    #[test_case(12, 4, 495)]
    #[test_case(8, 4, 70)]
    #[test_case(4, 4, 1)]
    #[test_case(3, 4, 0)]
    fn test_binomial(n: usize, k: usize, expected: usize) {
        assert_eq!(binomial(n, k), expected);
    }

    #[test]
    fn test_combinations_count_and_order() {
        let all: Vec<[usize; 4]> = IndexCombinations::<4>::new(8).collect();
        assert_eq!(all.len(), 70);
        assert_eq!(all.first(), Some(&[0, 1, 2, 3]));
        assert_eq!(all.last(), Some(&[4, 5, 6, 7]));

        let mut sorted = all.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(all, sorted, "combinations should be unique and in lexicographic order");
        assert!(all.iter().all(|c| c.windows(2).all(|w| w[0] < w[1])));
    }

    #[test]
    fn test_combinations_too_few_indices() {
        assert_eq!(IndexCombinations::<4>::new(3).count(), 0);
    }

    #[test]
    fn test_combinations_size_hint() {
        let mut itr = IndexCombinations::<2>::new(4);
        assert_eq!(itr.len(), 6);
        itr.next();
        assert_eq!(itr.len(), 5);
    }
}
