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
use super::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use thiserror::Error;

///
/// A single puzzle word. Words are always held in normalized form (see normalize_word), so two
/// Words compare equal whenever they differ only in case or surrounding whitespace.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Word(String);

impl Word {
    pub fn new(raw: &str) -> Self {
        Self(normalize_word(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Word {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Word {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl Borrow<str> for Word {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a Vec<Word> out of anything string-like, normalizing along the way
pub fn words<S: AsRef<str>>(raw: impl IntoIterator<Item = S>) -> Vec<Word> {
    raw.into_iter().map(|s| Word::new(s.as_ref())).collect()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleErr {
    #[error(
        "word '{word}' tagged ({name}, {level}) cannot join group ({existing_name}, {existing_level})"
    )]
    GroupConflict {
        word: Word,
        name: String,
        level: u8,
        existing_name: String,
        existing_level: u8,
    },
    #[error("row dated '{date}' cannot join puzzle dated '{existing}'")]
    PuzzleConflict { date: String, existing: String },
    #[error("group level {0} is not a valid level (0 to 3)")]
    BadLevel(i64),
    #[error("word '{0}' appears more than once in puzzle '{1}'")]
    DuplicateWord(Word, String),
    #[error("puzzle '{date}' group {level} has {size} words, expected 4")]
    IncompletePuzzle { date: String, level: usize, size: usize },
}

///
/// One of the answer categories of a puzzle. Starts out untagged; the first word added fixes the
/// group's name and level, and every later word must carry the same pair.
///
/// Words are kept sorted so two groups with the same members always look the same.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    name: Option<String>,
    level: Option<u8>,
    words: Vec<Word>,
}

impl Group {
    pub fn add_word(&mut self, name: &str, level: u8, word: Word) -> Result<(), PuzzleErr> {
        let name_conflict = matches!(&self.name, Some(existing) if existing != name);
        let level_conflict = matches!(self.level, Some(existing) if existing != level);
        if name_conflict || level_conflict {
            return Err(PuzzleErr::GroupConflict {
                word,
                name: name.to_string(),
                level,
                existing_name: self.name.clone().unwrap_or_default(),
                existing_level: self.level.unwrap_or_default(),
            });
        }

        self.name = Some(name.to_string());
        self.level = Some(level);
        let at = self.words.binary_search(&word).unwrap_or_else(|at| at);
        self.words.insert(at, word);
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn level(&self) -> Option<u8> {
        self.level
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
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Group name: {}, Words: ", self.name().unwrap_or(""))?;
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", word)?;
        }

        Ok(())
    }
}

///
/// One day's puzzle: the ground-truth groups (indexed by level) and every word in the order the
/// rows supplied them. Built incrementally by the loader, then only read.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Puzzle {
    date: Option<String>,
    all_words: Vec<Word>,
    groups: [Group; NUM_GROUPS],
}

impl Puzzle {
    ///
    /// Adds a single (date, group name, level, word) row. The level picks which group receives the
    /// word. Fails if the row belongs to a different date, the level is out of range, the word is
    /// already present, or the group is tagged differently.
    ///
    pub fn add_word(
        &mut self,
        date: &str,
        group_name: &str,
        level: i64,
        word: Word,
    ) -> Result<(), PuzzleErr> {
        if let Some(existing) = &self.date {
            if existing != date {
                return Err(PuzzleErr::PuzzleConflict {
                    date: date.to_string(),
                    existing: existing.clone(),
                });
            }
        }

        let level = u8::try_from(level)
            .ok()
            .filter(|l| *l <= MAX_LEVEL)
            .ok_or(PuzzleErr::BadLevel(level))?;

        if self.all_words.contains(&word) {
            return Err(PuzzleErr::DuplicateWord(word, date.to_string()));
        }

        self.groups[level as usize].add_word(group_name, level, word.clone())?;
        self.date = Some(date.to_string());
        self.all_words.push(word);
        Ok(())
    }

    /// Verifies the puzzle is whole: every group holds exactly GROUP_SIZE words
    pub fn validate(&self) -> Result<(), PuzzleErr> {
        for (level, group) in self.groups.iter().enumerate() {
            if group.len() != GROUP_SIZE {
                return Err(PuzzleErr::IncompletePuzzle {
                    date: self.date().to_string(),
                    level,
                    size: group.len(),
                });
            }
        }

        Ok(())
    }

    pub fn date(&self) -> &str {
        self.date.as_deref().unwrap_or("")
    }

    /// All words in the order their rows appeared (this is what a strategy gets to see)
    pub fn words(&self) -> &[Word] {
        &self.all_words
    }

    pub fn groups(&self) -> &[Group; NUM_GROUPS] {
        &self.groups
    }

    /// The answer groups as plain word lists, ordered by level
    pub fn answers(&self) -> Vec<Vec<Word>> {
        self.groups.iter().map(|g| g.words().to_vec()).collect()
    }
}

impl Display for Puzzle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Date: {}, Groups: ", self.date())?;
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", group)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_group(puzzle: &mut Puzzle, date: &str, name: &str, level: i64, members: [&str; 4]) {
        for w in members {
            puzzle.add_word(date, name, level, Word::new(w)).expect("row should be accepted");
        }
    }

    #[test]
    fn test_word_normalized_equality() {
        assert_eq!(Word::new(" bass"), Word::new("BASS"));
        assert_eq!(Word::new("Trout").as_str(), "TROUT");
    }

    #[test]
    fn test_group_sorted_and_tagged() {
        let mut group = Group::default();
        group.add_word("FISH", 0, Word::new("trout")).unwrap();
        group.add_word("FISH", 0, Word::new("bass")).unwrap();
        assert_eq!(group.words(), &words(["BASS", "TROUT"])[..]);
        assert_eq!(group.name(), Some("FISH"));
        assert_eq!(group.level(), Some(0));
    }

    #[test]
    fn test_group_conflict_name() {
        let mut group = Group::default();
        group.add_word("FISH", 0, Word::new("bass")).unwrap();
        let err = group.add_word("BIRDS", 0, Word::new("heron")).unwrap_err();
        assert!(matches!(err, PuzzleErr::GroupConflict { .. }), "got {:?}", err);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_group_conflict_level() {
        let mut group = Group::default();
        group.add_word("FISH", 0, Word::new("bass")).unwrap();
        let err = group.add_word("FISH", 1, Word::new("trout")).unwrap_err();
        assert!(matches!(err, PuzzleErr::GroupConflict { level: 1, existing_level: 0, .. }));
    }

    #[test]
    fn test_puzzle_conflicting_date() {
        let mut puzzle = Puzzle::default();
        puzzle.add_word("2024-01-01", "FISH", 0, Word::new("bass")).unwrap();
        let err = puzzle.add_word("2024-01-02", "FISH", 0, Word::new("trout")).unwrap_err();
        assert_eq!(err, PuzzleErr::PuzzleConflict {
            date: "2024-01-02".to_string(),
            existing: "2024-01-01".to_string(),
        });
    }

    #[test]
    fn test_puzzle_bad_level() {
        let mut puzzle = Puzzle::default();
        assert_eq!(
            puzzle.add_word("d", "X", 4, Word::new("a")),
            Err(PuzzleErr::BadLevel(4)),
        );
        assert_eq!(
            puzzle.add_word("d", "X", -1, Word::new("a")),
            Err(PuzzleErr::BadLevel(-1)),
        );
    }

    #[test]
    fn test_puzzle_duplicate_word() {
        let mut puzzle = Puzzle::default();
        puzzle.add_word("d", "X", 0, Word::new("a")).unwrap();
        let err = puzzle.add_word("d", "Y", 1, Word::new("A")).unwrap_err();
        assert!(matches!(err, PuzzleErr::DuplicateWord(..)));
    }

    #[test]
    fn test_puzzle_complete() {
        let date = "2024-06-01";
        let mut puzzle = Puzzle::default();
        add_group(&mut puzzle, date, "FISH", 0, ["bass", "flounder", "salmon", "trout"]);
        add_group(&mut puzzle, date, "NBA", 1, ["bucks", "heat", "jazz", "nets"]);
        add_group(&mut puzzle, date, "SEW", 2, ["dart", "hem", "pleat", "seam"]);
        assert!(matches!(
            puzzle.validate(),
            Err(PuzzleErr::IncompletePuzzle { level: 3, size: 0, .. })
        ));

        add_group(&mut puzzle, date, "PRESERVE", 3, ["can", "cure", "dry", "freeze"]);
        assert_eq!(puzzle.validate(), Ok(()));
        assert_eq!(puzzle.words().len(), PUZZLE_SIZE);
        assert_eq!(puzzle.words()[0], Word::new("BASS"));
        assert_eq!(puzzle.answers()[1], words(["BUCKS", "HEAT", "JAZZ", "NETS"]));
        assert_eq!(puzzle.date(), date);
    }
}
