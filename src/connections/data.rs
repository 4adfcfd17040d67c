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
use crate::connections::puzzle::*;
use lazy_static::lazy_static;
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::io;
use std::num::ParseFloatError;
use std::path::Path;
use std::str::Utf8Error;
use thiserror::Error;

// Stores data files shipped with the binary (a small sample of past puzzles)
pub const EMBED_DATA_DIRECTORY: &str = "txt_data/";
pub const PUZZLES_FILE_NAME: &str = "puzzles.csv";

// Column names in the puzzle CSV (located by name, so their order does not matter)
pub const DATE_COLUMN: &str = "Puzzle Date";
pub const WORD_COLUMN: &str = "Word";
pub const GROUP_NAME_COLUMN: &str = "Group Name";
pub const GROUP_LEVEL_COLUMN: &str = "Group Level";

lazy_static! {
    pub static ref DATA: Data = Data::read().expect("embedded puzzle data should load");
}

#[derive(RustEmbed)]
#[folder = "txt_data/"]
struct RawData;

/// Holds all of the data represented by the static/embedded text files
#[derive(Clone, Debug)]
pub struct Data {
    /// Sample puzzles, in the order their dates first appear in the file
    pub puzzles: Vec<Puzzle>,
}

#[derive(Error, Debug)]
pub enum LoadDataErr {
    #[error("missing puzzles file")]
    MissingPuzzleFile,
    #[error(transparent)]
    EncodingError(#[from] Utf8Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("puzzle file has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("malformed row on line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
    #[error("malformed floating point text '{0}'")]
    BadFloatStr(String, #[source] ParseFloatError),
    #[error(transparent)]
    Puzzle(#[from] PuzzleErr),
}

impl Data {
    pub fn read() -> Result<Self, LoadDataErr> {
        let raw = retrieve_file_as_str(PUZZLES_FILE_NAME)?.ok_or(LoadDataErr::MissingPuzzleFile)?;
        let out = Self {
            puzzles: parse_puzzles(&raw)?,
        };
        log::debug!("got {} puzzles from embedded data", out.puzzles.len());
        Ok(out)
    }
}

/// Reads and parses a puzzle CSV from disk
pub fn load_puzzles<P: AsRef<Path>>(path: P) -> Result<Vec<Puzzle>, LoadDataErr> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let out = parse_puzzles(&raw)?;
    log::debug!("got {} puzzles from {}", out.len(), path.as_ref().display());
    Ok(out)
}

///
/// Parses puzzle CSV text. The first line is the header, every following non-blank line is one
/// (date, word, group name, group level) row.
///
/// Rows sharing a date assemble one puzzle. A row conflicting with what its puzzle (or group)
/// already holds aborts the whole load, as does any puzzle left incomplete at the end.
///
pub fn parse_puzzles(raw: &str) -> Result<Vec<Puzzle>, LoadDataErr> {
    let mut lines = raw.lines().enumerate();
    let header = match lines.next() {
        Some((_, header)) => split_csv_record(header)
            .map_err(|reason| LoadDataErr::MalformedRow { line: 1, reason })?,
        None => return Ok(Vec::default()),
    };

    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(LoadDataErr::MissingColumn(name))
    };
    let date_idx = column(DATE_COLUMN)?;
    let word_idx = column(WORD_COLUMN)?;
    let name_idx = column(GROUP_NAME_COLUMN)?;
    let level_idx = column(GROUP_LEVEL_COLUMN)?;

    let mut puzzles: Vec<Puzzle> = Vec::new();
    let mut by_date: HashMap<String, usize> = HashMap::new();

    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }

        let line_no = idx + 1;
        let fields = split_csv_record(line)
            .map_err(|reason| LoadDataErr::MalformedRow { line: line_no, reason })?;

        let field = |i: usize| {
            fields.get(i).map(|f| f.trim()).ok_or_else(|| LoadDataErr::MalformedRow {
                line: line_no,
                reason: format!("expected at least {} fields, got {}", i + 1, fields.len()),
            })
        };

        let date = field(date_idx)?;
        let word = field(word_idx)?;
        let group_name = field(name_idx)?;
        let level_raw = field(level_idx)?;
        let level = level_raw.parse::<i64>().map_err(|err| LoadDataErr::MalformedRow {
            line: line_no,
            reason: format!("bad group level '{}': {}", level_raw, err),
        })?;

        let puzzle_idx = *by_date.entry(date.to_string()).or_insert_with(|| {
            puzzles.push(Puzzle::default());
            puzzles.len() - 1
        });
        puzzles[puzzle_idx].add_word(date, group_name, level, Word::new(word))?;
    }

    for puzzle in &puzzles {
        puzzle.validate()?;
    }

    Ok(puzzles)
}

///
/// Splits one CSV record into its fields. Fields may be wrapped in double quotes, in which case
/// they can contain commas, and a doubled quote ("") stands for a literal quote.
///
/// Records spanning multiple lines are not supported.
///
pub fn split_csv_record(line: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (in_quotes, c) {
            (true, '"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cur.push('"');
                } else {
                    in_quotes = false;
                }
            }
            (true, c) => cur.push(c),
            (false, '"') if cur.is_empty() => in_quotes = true,
            (false, ',') => out.push(std::mem::take(&mut cur)),
            (false, c) => cur.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }

    out.push(cur);
    Ok(out)
}

fn retrieve_file_as_str(name: &str) -> Result<Option<String>, LoadDataErr> {
    let f: rust_embed::EmbeddedFile = if let Some(data) = RawData::get(name) {
        data
    } else {
        // not embedded (shouldn't happen with debug-embed), try the working directory instead
        return match std::fs::read_to_string(format!("{}{}", EMBED_DATA_DIRECTORY, name)) {
            Ok(out) => Ok(Some(out)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        };
    };

    Ok(Some(
        std::str::from_utf8(&f.data)
            .map_err(LoadDataErr::EncodingError)?
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::prelude::*;
    use test_case::test_case;

    const HEADER: &str = "Game ID,Puzzle Date,Word,Group Name,Group Level";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    fn full_puzzle_rows(id: usize, date: &str) -> Vec<String> {
        let groups = [
            ("FISH", ["BASS", "FLOUNDER", "SALMON", "TROUT"]),
            ("NBA TEAMS", ["BUCKS", "HEAT", "JAZZ", "NETS"]),
            ("FIRE ___", ["ANT", "DRILL", "ISLAND", "OPAL"]),
            ("PLANETS", ["MARS", "MERCURY", "SATURN", "VENUS"]),
        ];
        let mut out = Vec::new();
        for (level, (name, members)) in groups.iter().enumerate() {
            for w in members {
                out.push(format!("{},{},{},{},{}", id, date, w, name, level));
            }
        }
        out
    }

    #[test_case("a,b,c", &["a", "b", "c"])]
    #[test_case("a,\"b,c\",d", &["a", "b,c", "d"])]
    #[test_case("\"say \"\"hi\"\"\",x", &["say \"hi\"", "x"])]
    #[test_case("a,,b", &["a", "", "b"])]
    #[test_case("", &[""])]
    fn test_split_csv_record(line: &str, expected: &[&str]) {
        assert_eq!(split_csv_record(line), Ok(expected.iter().map(|s| s.to_string()).collect()));
    }

    #[test]
    fn test_split_csv_unterminated() {
        assert!(split_csv_record("a,\"b").is_err());
    }

    #[test]
    fn test_embedded_data_loads() {
        assert_eq!(DATA.puzzles.len(), DEFAULT_PUZZLE_COUNT);
        for puzzle in &DATA.puzzles {
            assert_eq!(puzzle.words().len(), PUZZLE_SIZE, "{}", puzzle);
        }
        assert_eq!(DATA.puzzles[0].date(), "2023-06-12");
        assert_eq!(DATA.puzzles[1].groups()[2].name(), Some("ASSOCIATED WITH \"STUB\""));
    }

    #[test]
    fn test_parse_two_puzzles_in_order() {
        let mut rows = full_puzzle_rows(2, "2024-02-02");
        rows.extend(full_puzzle_rows(1, "2024-01-01"));
        let rows: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let puzzles = parse_puzzles(&csv_with(&rows)).expect("should parse");
        assert_eq!(puzzles.len(), 2);
        assert_eq!(puzzles[0].date(), "2024-02-02");
        assert_eq!(puzzles[1].date(), "2024-01-01");
        assert_eq!(puzzles[1].answers()[3], words(["MARS", "MERCURY", "SATURN", "VENUS"]));
    }

    #[test]
    fn test_columns_found_by_name() {
        let raw = "Group Level,Word,Group Name,Puzzle Date\n0,bass,FISH,d\n";
        let err = parse_puzzles(raw).unwrap_err();
        // a single row parses but leaves the puzzle incomplete
        assert!(
            matches!(err, LoadDataErr::Puzzle(PuzzleErr::IncompletePuzzle { .. })),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_missing_column() {
        let err = parse_puzzles("Puzzle Date,Word,Group Name\n").unwrap_err();
        assert!(matches!(err, LoadDataErr::MissingColumn(GROUP_LEVEL_COLUMN)));
    }

    #[test]
    fn test_bad_level_aborts() {
        let err = parse_puzzles(&csv_with(&["1,d,BASS,FISH,7"])).unwrap_err();
        assert!(matches!(err, LoadDataErr::Puzzle(PuzzleErr::BadLevel(7))));

        let err = parse_puzzles(&csv_with(&["1,d,BASS,FISH,zero"])).unwrap_err();
        assert!(matches!(err, LoadDataErr::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_group_conflict_aborts() {
        let err = parse_puzzles(&csv_with(&["1,d,BASS,FISH,0", "1,d,HERON,BIRDS,0"])).unwrap_err();
        assert!(matches!(err, LoadDataErr::Puzzle(PuzzleErr::GroupConflict { .. })));
    }

    #[test]
    fn test_short_row() {
        let err = parse_puzzles(&csv_with(&["1,d,BASS"])).unwrap_err();
        assert!(matches!(err, LoadDataErr::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_puzzles("").expect("empty is fine").is_empty());
    }
}
