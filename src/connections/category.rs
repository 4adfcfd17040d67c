use super::{oracle::CategoryOracle, prelude::*, puzzle::Word};
use std::collections::HashSet;

/// Whether two words could share a category, judging by their tags
#[inline]
pub fn categories_match(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    !a.is_disjoint(b)
}

///
/// Greedy grouping by shared category tags.
///
/// Each word (in input order) takes a turn as the root. Starting from just the root, the group
/// repeatedly admits the first remaining word whose tags overlap the tags of *every* current
/// member, until no word qualifies. The first group to end up with exactly GROUP_SIZE members is
/// returned.
///
/// Returns None if no root produced such a group.
///
pub fn category_group<C>(words: &[Word], categories: &C) -> Option<Vec<Word>>
where
    C: CategoryOracle + ?Sized,
{
    let tags: Vec<HashSet<String>> = words.iter().map(|w| categories.tags(w)).collect();

    for root in 0..words.len() {
        let mut group = vec![root];
        while let Some(next) = (0..words.len())
            .filter(|c| !group.contains(c))
            .find(|c| group.iter().all(|g| categories_match(&tags[*g], &tags[*c])))
        {
            group.push(next);
        }

        if group.len() == GROUP_SIZE {
            return Some(group.into_iter().map(|i| words[i].clone()).collect());
        }

        log::trace!("root {} gathered {} words by category", words[root], group.len());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::oracle::CategoryIndex;
    use crate::connections::puzzle::words;

    fn index(entries: &[(&str, &[&str])]) -> CategoryIndex {
        let mut out = CategoryIndex::default();
        for (word, tags) in entries {
            out.insert(Word::new(word), tags.iter().copied());
        }
        out
    }

    #[test]
    fn test_finds_group_sharing_a_tag() {
        let categories = index(&[
            ("mercury", &["planet", "element"]),
            ("bass", &["fish", "instrument"]),
            ("mars", &["planet", "band"]),
            ("venus", &["planet"]),
            ("trout", &["fish"]),
            ("saturn", &["planet", "car"]),
        ]);
        let input = words(["mercury", "bass", "mars", "venus", "trout", "saturn"]);
        assert_eq!(
            category_group(&input, &categories),
            Some(words(["mercury", "mars", "venus", "saturn"])),
        );
    }

    #[test]
    fn test_every_member_must_overlap() {
        // a-b share x, b-c share y, a-c share nothing: chain but no clique
        let categories = index(&[
            ("a", &["x", "z"]),
            ("b", &["x", "y"]),
            ("c", &["y"]),
            ("d", &["z"]),
        ]);
        assert_eq!(category_group(&words(["a", "b", "c", "d"]), &categories), None);
    }

    #[test]
    fn test_oversized_group_rejected() {
        let categories = index(&[
            ("a", &["x"]),
            ("b", &["x"]),
            ("c", &["x"]),
            ("d", &["x"]),
            ("e", &["x"]),
        ]);
        assert_eq!(category_group(&words(["a", "b", "c", "d", "e"]), &categories), None);
    }

    #[test]
    fn test_first_qualifying_candidate_admitted() {
        // root a can take b (via x) or c (via y); taking b first locks out c and d joins via x
        let categories = index(&[
            ("a", &["x", "y"]),
            ("b", &["x"]),
            ("c", &["y"]),
            ("d", &["x"]),
            ("e", &["x"]),
        ]);
        assert_eq!(
            category_group(&words(["a", "b", "c", "d", "e"]), &categories),
            Some(words(["a", "b", "d", "e"])),
        );
    }

    #[test]
    fn test_untagged_words() {
        let categories = CategoryIndex::default();
        assert_eq!(category_group(&words(["a", "b", "c", "d"]), &categories), None);
    }
}
