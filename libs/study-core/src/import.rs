//! Bulk item import from tab-separated text.
//!
//! # Format
//! ```text
//! # phrase	meanings	readings	example source	example destination
//! 猫	cat	ねこ	猫がいる	There is a cat
//! 犬	dog
//! 鳥	bird		鳥が飛ぶ	A bird flies
//! ```
//!
//! Phrase and meanings are required. Empty optional columns are absent.
//! Blank lines and lines starting with `#` are skipped.

use crate::error::{Result, StudyError};
use crate::item::Item;

const MAX_COLUMNS: usize = 5;

/// Parse tab-separated content into unowned items.
pub fn parse_tsv(content: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        match classify(line) {
            Line::Skip => {}
            Line::Record(columns) => items.push(build(&columns, line_num)?),
        }
    }

    Ok(items)
}

enum Line<'a> {
    Skip,
    Record(Vec<&'a str>),
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with('#') {
        Line::Skip
    } else {
        Line::Record(line.split('\t').collect())
    }
}

fn build(columns: &[&str], line: usize) -> Result<Item> {
    if columns.len() > MAX_COLUMNS {
        return Err(StudyError::Import {
            line,
            reason: format!("expected at most {MAX_COLUMNS} columns, found {}", columns.len()),
        });
    }

    let phrase = required(columns, 0, "phrase", line)?;
    let meanings = required(columns, 1, "meanings", line)?;

    let mut item = Item::new(phrase, meanings);
    item.readings = optional(columns, 2);
    item.example_source = optional(columns, 3);
    item.example_dest = optional(columns, 4);
    Ok(item)
}

fn required(columns: &[&str], index: usize, name: &str, line: usize) -> Result<String> {
    optional(columns, index).ok_or_else(|| StudyError::Import {
        line,
        reason: format!("missing {name}"),
    })
}

fn optional(columns: &[&str], index: usize) -> Option<String> {
    columns
        .get(index)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Render items back to tab-separated lines, one per item.
pub fn to_tsv(items: &[Item]) -> String {
    items
        .iter()
        .map(|item| {
            let mut columns = vec![
                item.phrase.as_str(),
                item.meanings.as_str(),
                item.readings.as_deref().unwrap_or(""),
                item.example_source.as_deref().unwrap_or(""),
                item.example_dest.as_deref().unwrap_or(""),
            ];
            while columns.len() > 2 && columns.last().is_some_and(|c| c.is_empty()) {
                columns.pop();
            }
            columns.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
