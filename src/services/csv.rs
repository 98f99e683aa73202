// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV export and import of problem records.
//!
//! The format is a fixed 12-column layout. Export quotes a field only when it
//! contains a comma, quote, or line break. Import is lenient about quoting
//! and reports problems per row instead of failing the whole file.

use std::borrow::Cow;

use crate::error::AppError;
use crate::models::{Difficulty, Problem, ProblemFields, ProblemInput};
use crate::time_utils::{format_date, parse_date_solved};

/// Column headers, in order.
pub const HEADERS: [&str; 12] = [
    "Title",
    "URL",
    "Difficulty",
    "Language Used",
    "Date Solved",
    "Solution Notes",
    "What Went Wrong",
    "Trigger Keywords",
    "Time Complexity",
    "Space Complexity",
    "Was Hard",
    "Categories",
];

/// Separator between category names in the Categories column.
const CATEGORY_SEPARATOR: &str = "; ";

/// Structural problems that reject an import before any row is stored.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CsvError {
    #[error("CSV must have headers and at least one data row")]
    TooFewRows,

    #[error("CSV headers don't match expected format")]
    HeaderMismatch,
}

impl From<CsvError> for AppError {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::TooFewRows => AppError::BadRequest(err.to_string()),
            CsvError::HeaderMismatch => AppError::InvalidCsvHeader {
                expected: HEADERS.to_vec(),
            },
        }
    }
}

/// One data row after parsing, numbered with the header as row 1.
#[derive(Debug)]
pub struct ParsedRow {
    pub row: usize,
    /// Validated fields, or the reason the row was rejected (without the row prefix).
    pub outcome: Result<ProblemFields, String>,
}

// ─── Export ──────────────────────────────────────────────────

/// Quote a field if it contains a delimiter, quote, or line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Serialize problems, in the order given, under the fixed header.
pub fn export_csv(problems: &[Problem]) -> String {
    let mut lines = Vec::with_capacity(problems.len() + 1);
    lines.push(HEADERS.join(","));

    for problem in problems {
        let date_solved = format_date(problem.date_solved);
        let categories = problem.categories.join(CATEGORY_SEPARATOR);
        let fields: [&str; 12] = [
            &problem.title,
            &problem.url,
            problem.difficulty.as_str(),
            &problem.language_used,
            &date_solved,
            &problem.solution_notes,
            &problem.what_went_wrong,
            &problem.trigger_keywords,
            &problem.time_complexity,
            &problem.space_complexity,
            if problem.was_hard { "true" } else { "false" },
            &categories,
        ];
        let line = fields
            .iter()
            .map(|field| escape_field(field))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

// ─── Import ──────────────────────────────────────────────────

/// Byte offsets of `delimiter` that fall outside quoted sections.
///
/// A quote opens a quoted section only at the start of a field (leading
/// blanks allowed) and closes it only when followed by blanks and then a
/// delimiter, line break, or end of input. `""` inside a section is an
/// escaped quote. Any other quote is literal text.
fn unquoted_offsets(text: &str, delimiter: u8) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut offsets = Vec::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        match (in_quotes, byte) {
            (true, b'"') if bytes.get(i + 1) == Some(&b'"') => i += 1,
            (true, b'"') if closes_section(&bytes[i + 1..]) => in_quotes = false,
            (true, _) => {}
            (false, b'"') if field_start => {
                in_quotes = true;
                field_start = false;
            }
            (false, b',' | b'\n') => {
                if byte == delimiter {
                    offsets.push(i);
                }
                field_start = true;
            }
            (false, b' ' | b'\t') => {}
            (false, _) => field_start = false,
        }
        i += 1;
    }
    offsets
}

fn closes_section(rest: &[u8]) -> bool {
    matches!(
        rest.iter().copied().find(|b| !matches!(b, b' ' | b'\t')),
        None | Some(b',' | b'\r' | b'\n')
    )
}

/// Split `text` at the given offsets, dropping the delimiter bytes.
fn split_at_offsets<'a>(text: &'a str, offsets: &[usize]) -> Vec<&'a str> {
    let mut parts = Vec::with_capacity(offsets.len() + 1);
    let mut start = 0;
    for &offset in offsets {
        parts.push(&text[start..offset]);
        start = offset + 1;
    }
    parts.push(&text[start..]);
    parts
}

/// Split text into records on newlines outside quoted fields.
///
/// Strips a leading BOM and one trailing `\r` per record, and drops blank
/// records.
pub fn split_records(text: &str) -> Vec<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    split_at_offsets(text, &unquoted_offsets(text, b'\n'))
        .into_iter()
        .map(|record| record.strip_suffix('\r').unwrap_or(record))
        .filter(|record| !record.trim().is_empty())
        .collect()
}

/// Split one record into fields.
///
/// Each field is trimmed. A field wrapped in quotes loses them and has
/// doubled quotes collapsed; any other field is taken as written.
pub fn parse_line(line: &str) -> Vec<String> {
    split_at_offsets(line, &unquoted_offsets(line, b','))
        .into_iter()
        .map(unquote)
        .collect()
}

fn unquote(raw: &str) -> String {
    let field = raw.trim();
    match field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.to_string(),
    }
}

/// Parse an uploaded file into per-row outcomes.
///
/// Fails as a whole only for structural problems: too few records or a
/// header that does not match [`HEADERS`].
pub fn parse_import(text: &str) -> Result<Vec<ParsedRow>, CsvError> {
    let records = split_records(text);
    if records.len() < 2 {
        return Err(CsvError::TooFewRows);
    }

    let header = parse_line(records[0]);
    if header.len() != HEADERS.len() || header.iter().zip(HEADERS).any(|(h, e)| h != e) {
        return Err(CsvError::HeaderMismatch);
    }

    Ok(records[1..]
        .iter()
        .enumerate()
        .map(|(i, record)| ParsedRow {
            row: i + 2,
            outcome: parse_row(parse_line(record)),
        })
        .collect())
}

fn parse_row(values: Vec<String>) -> Result<ProblemFields, String> {
    let values: [String; 12] = values
        .try_into()
        .map_err(|_| "Wrong number of columns".to_string())?;
    let [title, url, difficulty, language_used, date_solved, solution_notes, what_went_wrong, trigger_keywords, time_complexity, space_complexity, was_hard, categories] =
        values;

    if title.is_empty() || url.is_empty() || difficulty.is_empty() || language_used.is_empty() {
        return Err("Missing required fields".to_string());
    }
    let difficulty = Difficulty::parse(&difficulty)
        .ok_or_else(|| format!("Invalid difficulty \"{difficulty}\""))?;

    let input = ProblemInput {
        title,
        url,
        difficulty,
        language_used,
        solution_notes,
        what_went_wrong,
        trigger_keywords,
        time_complexity,
        space_complexity,
        was_hard: was_hard.eq_ignore_ascii_case("true"),
        date_solved: parse_date_solved(&date_solved),
        categories: categories.split(';').map(str::to_string).collect(),
    };
    input.into_fields().map_err(|e| e.to_string())
}
