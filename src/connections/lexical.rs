use super::{oracle::*, prelude::*, puzzle::Word, similarity::SimilarityMatrix};
use std::collections::HashSet;

///
/// Greedy lexical grouping, threshold flavor.
///
/// Each word (in input order) takes a turn as the root. The root's group is the root plus every
/// other word scoring at least `threshold` against it. A group of exactly GROUP_SIZE is returned
/// right away; any other size is thrown out, and the words in it don't get a turn as root.
///
/// Returns None when no root produced a group of the right size.
///
pub fn threshold_group<O>(words: &[Word], oracle: &O, threshold: ConnFloat) -> Option<Vec<Word>>
where
    O: LexicalOracle + ?Sized,
{
    let mut used: HashSet<&Word> = HashSet::new();
    for root in words {
        if used.contains(root) {
            continue;
        }

        let mut group = vec![root];
        group.extend(
            words
                .iter()
                .filter(|other| *other != root)
                .filter(|other| symmetric_similarity(oracle, root, other) >= threshold),
        );

        if group.len() == GROUP_SIZE {
            return Some(group.into_iter().cloned().collect());
        }

        log::trace!("root {} grew a group of {}, discarding", root, group.len());
        used.extend(group);
    }

    None
}

///
/// Greedy lexical grouping, average-growth flavor.
///
/// All pairwise similarities are computed once up front. Each word (in input order) takes a turn as
/// the root, and the group grows one word at a time: the candidate with the highest summed
/// similarity to the current members joins, as long as that sum is above `factor` times the
/// current group size (i.e. its average similarity to the members beats `factor`). Growth stops
/// as soon as the best candidate falls short.
///
/// Returns None when no root grew to exactly GROUP_SIZE. A root that keeps growing past
/// GROUP_SIZE is not confident about any particular 4, so it is passed over like a small group.
///
pub fn average_growth_group<O>(words: &[Word], oracle: &O, factor: ConnFloat) -> Option<Vec<Word>>
where
    O: LexicalOracle + ?Sized,
{
    let n = words.len();
    if n < GROUP_SIZE {
        return None;
    }

    let matrix =
        SimilarityMatrix::from_fn(n, |i, j| oracle.similarity(&words[i], &words[j])).symmetrized();

    for root in 0..n {
        let mut group = vec![root];
        loop {
            let best = (0..n)
                .filter(|c| !group.contains(c))
                .map(|c| (c, group.iter().map(|g| matrix.get(c, *g)).sum::<ConnFloat>()))
                .first_max_by_score(|(_, sum)| *sum);

            match best {
                Some((sum, (candidate, _))) if sum > factor * group.len() as ConnFloat => {
                    group.push(candidate)
                }
                _ => break,
            }
        }

        if group.len() == GROUP_SIZE {
            return Some(group.into_iter().map(|i| words[i].clone()).collect());
        }

        log::trace!("root {} grew a group of {}, discarding", words[root], group.len());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::puzzle::words;

    fn sixteen() -> Vec<Word> {
        (0..16).map(|i| Word::new(&format!("w{}", i))).collect()
    }

    // 1.0 between any two members of the set, 0.0 otherwise
    fn clique_oracle(members: Vec<Word>) -> impl Fn(&Word, &Word) -> ConnFloat + Send + Sync {
        move |a: &Word, b: &Word| {
            if members.contains(a) && members.contains(b) {
                1.0
            } else {
                0.0
            }
        }
    }

    #[test]
    fn test_threshold_finds_designated_quad() {
        let quad = words(["w3", "w5", "w9", "w12"]);
        let oracle = clique_oracle(quad.clone());
        assert_eq!(threshold_group(&sixteen(), &oracle, LEXICAL_THRESHOLD), Some(quad));
    }

    #[test]
    fn test_threshold_nothing_related() {
        let oracle = |_: &Word, _: &Word| 0.0;
        assert_eq!(threshold_group(&sixteen(), &oracle, LEXICAL_THRESHOLD), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let quad = words(["w0", "w1", "w2", "w3"]);
        let members = quad.clone();
        let oracle = move |a: &Word, b: &Word| {
            if members.contains(a) && members.contains(b) {
                LEXICAL_THRESHOLD
            } else {
                0.5
            }
        };
        assert_eq!(threshold_group(&sixteen(), &oracle, LEXICAL_THRESHOLD), Some(quad));
    }

    #[test]
    fn test_threshold_rejects_oversized_group() {
        let oracle = clique_oracle(words(["w0", "w1", "w2", "w3", "w4"]));
        assert_eq!(threshold_group(&sixteen(), &oracle, LEXICAL_THRESHOLD), None);
    }

    #[test]
    fn test_threshold_uses_both_directions() {
        // only answers when asked (member, root) and not (root, member)
        let quad = words(["w1", "w2", "w3", "w4"]);
        let members = quad.clone();
        let oracle = move |a: &Word, b: &Word| {
            if members.contains(a) && members.contains(b) && a > b {
                0.95
            } else {
                0.0
            }
        };
        assert_eq!(threshold_group(&sixteen(), &oracle, LEXICAL_THRESHOLD), Some(quad));
    }

    #[test]
    fn test_threshold_discarded_words_skip_root_turn() {
        // w0 relates to w1 and w2 only (group of 3, discarded), w1 would otherwise root a group
        // {w1, w0, w2, w3}, but it was already used so w3 roots instead: {w3, w1} ... too small.
        let oracle = |a: &Word, b: &Word| {
            let pair = |x: &str, y: &str| {
                (a.as_str() == x && b.as_str() == y) || (a.as_str() == y && b.as_str() == x)
            };
            if pair("W0", "W1") || pair("W0", "W2") || pair("W1", "W2") || pair("W1", "W3") {
                1.0
            } else {
                0.0
            }
        };
        let input = words(["w0", "w1", "w2", "w3", "w4"]);
        assert_eq!(threshold_group(&input, &oracle, LEXICAL_THRESHOLD), None);
    }

    #[test]
    fn test_average_growth_finds_designated_quad() {
        let quad = words(["w3", "w5", "w9", "w12"]);
        let oracle = clique_oracle(quad.clone());
        assert_eq!(average_growth_group(&sixteen(), &oracle, GROWTH_FACTOR), Some(quad));
    }

    #[test]
    fn test_average_growth_nothing_related() {
        let oracle = |_: &Word, _: &Word| 0.0;
        assert_eq!(average_growth_group(&sixteen(), &oracle, GROWTH_FACTOR), None);
    }

    #[test]
    fn test_average_growth_rejects_oversized_group() {
        // five mutually related words: both variants must pass on it rather than pick 4 of the 5
        let oracle = clique_oracle(words(["w0", "w1", "w2", "w3", "w4"]));
        assert_eq!(average_growth_group(&sixteen(), &oracle, GROWTH_FACTOR), None);
        assert_eq!(threshold_group(&sixteen(), &oracle, LEXICAL_THRESHOLD), None);
    }

    #[test]
    fn test_average_growth_skips_oversized_root() {
        // w0..w4 form a 5-clique, w10..w13 a separate quad further down the list
        let big = words(["w0", "w1", "w2", "w3", "w4"]);
        let quad = words(["w10", "w11", "w12", "w13"]);
        let (a, b) = (big.clone(), quad.clone());
        let oracle = move |x: &Word, y: &Word| {
            let related = (a.contains(x) && a.contains(y)) || (b.contains(x) && b.contains(y));
            if related {
                1.0
            } else {
                0.0
            }
        };
        assert_eq!(average_growth_group(&sixteen(), &oracle, GROWTH_FACTOR), Some(quad));
    }

    #[test]
    fn test_average_growth_bar_rises_with_group() {
        // w0-w1 strongly related, w2 related only to w0: sum to {w0, w1} is 0.9, under 0.8 * 2
        let oracle = |a: &Word, b: &Word| {
            let (a, b) = if a < b { (a.as_str(), b.as_str()) } else { (b.as_str(), a.as_str()) };
            match (a, b) {
                ("W0", "W1") => 1.0,
                ("W0", "W2") => 0.9,
                ("W0", "W3") => 0.9,
                _ => 0.0,
            }
        };
        let input = words(["w0", "w1", "w2", "w3"]);
        assert_eq!(average_growth_group(&input, &oracle, GROWTH_FACTOR), None);
    }

    #[test]
    fn test_too_few_words() {
        let oracle = |_: &Word, _: &Word| 1.0;
        assert_eq!(average_growth_group(&words(["a", "b", "c"]), &oracle, GROWTH_FACTOR), None);
        assert_eq!(threshold_group(&words(["a", "b", "c"]), &oracle, LEXICAL_THRESHOLD), None);
    }
}
