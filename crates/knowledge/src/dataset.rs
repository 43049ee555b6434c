//! Question/answer dataset reader.
//!
//! The dataset is a CSV file whose header names a `question` and an `answer`
//! column. Other columns (such as a leading row index) are ignored.

use crate::types::QaRecord;
use kbhub_core::{AppError, AppResult};
use std::path::Path;

const QUESTION_COLUMN: &str = "question";
const ANSWER_COLUMN: &str = "answer";

/// Read every record from a dataset file.
pub fn read_records(path: &Path) -> AppResult<Vec<QaRecord>> {
    if !path.is_file() {
        return Err(AppError::DatasetNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let records = parse_records(&contents)?;

    if records.is_empty() {
        return Err(AppError::EmptyDataset(path.to_path_buf()));
    }

    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Parse CSV text into records. An input with only a header yields no records.
pub fn parse_records(contents: &str) -> AppResult<Vec<QaRecord>> {
    let rows = parse_csv(contents).map_err(AppError::InvalidDataset)?;
    let mut rows = rows.into_iter();

    let Some((_, header)) = rows.next() else {
        return Ok(Vec::new());
    };

    let question_idx = column_index(&header, QUESTION_COLUMN)?;
    let answer_idx = column_index(&header, ANSWER_COLUMN)?;

    rows.map(|(line, row)| {
        let field = |idx: usize| {
            row.get(idx).cloned().ok_or_else(|| {
                AppError::InvalidDataset(format!(
                    "line {}: expected at least {} fields, found {}",
                    line,
                    idx + 1,
                    row.len()
                ))
            })
        };

        Ok(QaRecord {
            question: field(question_idx)?,
            answer: field(answer_idx)?,
        })
    })
    .collect()
}

fn column_index(header: &[String], name: &str) -> AppResult<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            AppError::InvalidDataset(format!(
                "missing '{}' column (header: {})",
                name,
                header.join(",")
            ))
        })
}

/// Split CSV text into rows of fields, tagged with the line each row starts on.
///
/// Follows RFC 4180: fields may be quoted, quotes inside quoted fields are
/// doubled, and quoted fields may span lines. Blank lines are skipped.
fn parse_csv(contents: &str) -> Result<Vec<(usize, Vec<String>)>, String> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut line = 1usize;
    let mut row_line = 1usize;

    let mut chars = contents.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            '"' => return Err(format!("line {}: unexpected quote inside field", line)),
            ',' => {
                row.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                end_row(&mut rows, &mut row, &mut field, row_line, field_started);
                field_started = false;
                line += 1;
                row_line = line;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(format!("line {}: unterminated quoted field", row_line));
    }
    end_row(&mut rows, &mut row, &mut field, row_line, field_started);

    Ok(rows)
}

fn end_row(
    rows: &mut Vec<(usize, Vec<String>)>,
    row: &mut Vec<String>,
    field: &mut String,
    line: usize,
    field_started: bool,
) {
    if row.is_empty() && !field_started && field.is_empty() {
        return;
    }
    row.push(std::mem::take(field));
    rows.push((line, std::mem::take(row)));
}
