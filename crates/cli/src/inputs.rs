//! CSV input tables
//!
//! Small, header-driven reader: columns are looked up by name, fields may be
//! double-quoted (`""` escapes a quote), blank lines are ignored.

use citesurf_common::errors::{AppError, Result};
use citesurf_walker::{ColorTable, ImportantAuthors, KeywordTable};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parsed CSV: header plus `(line number, fields)` rows
#[derive(Debug)]
struct Table {
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();
        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break split_record(line.trim_start_matches('\u{feff}'));
                    }
                }
                None => {
                    return Err(AppError::InvalidFormat {
                        message: "table has no header".to_string(),
                    })
                }
            }
        };

        let mut rows = Vec::new();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push((index + 1, split_record(&line)));
        }
        Ok(Self { header, rows })
    }

    /// Index of a column, matched case-insensitively
    fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("missing column `{name}`"),
            })
    }

    /// Trimmed, non-empty values of one column with their line numbers
    fn values(&self, name: &str) -> Result<Vec<(usize, String)>> {
        let column = self.column(name)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|(line, fields)| {
                let value = fields.get(column)?.trim();
                (!value.is_empty()).then(|| (*line, value.to_string()))
            })
            .collect())
    }
}

/// Split one CSV record, honoring double quotes
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Seed identifiers from the `DOI` column
pub fn parse_corpus<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let table = Table::parse(reader)?;
    Ok(table.values("DOI")?.into_iter().map(|(_, doi)| doi).collect())
}

/// Keyword weights from the `keyterms` and `value` columns
pub fn parse_keywords<R: BufRead>(reader: R) -> Result<KeywordTable> {
    let table = Table::parse(reader)?;
    let key = table.column("keyterms")?;
    let value = table.column("value")?;

    let mut entries = Vec::with_capacity(table.rows.len());
    for (line, fields) in &table.rows {
        let Some(keyword) = fields.get(key).map(|k| k.trim()).filter(|k| !k.is_empty()) else {
            continue;
        };
        let raw = fields.get(value).map(|v| v.trim()).unwrap_or_default();
        let weight: f64 = raw.parse().map_err(|_| AppError::InvalidFormat {
            message: format!("line {line}: weight `{raw}` for `{keyword}` is not a number"),
        })?;
        if !weight.is_finite() {
            return Err(AppError::InvalidFormat {
                message: format!("line {line}: weight `{raw}` for `{keyword}` is not finite"),
            });
        }
        entries.push((keyword.to_string(), weight));
    }
    Ok(KeywordTable::new(entries))
}

/// Important author family names from the `Last` column
pub fn parse_important_authors<R: BufRead>(reader: R) -> Result<ImportantAuthors> {
    let table = Table::parse(reader)?;
    Ok(ImportantAuthors::new(
        table.values("Last")?.into_iter().map(|(_, name)| name).collect(),
    ))
}

/// Keyword to color mapping from the `abx` and `colour` columns
pub fn parse_colors<R: BufRead>(reader: R) -> Result<ColorTable> {
    let table = Table::parse(reader)?;
    let key = table.column("abx")?;
    let color = table.column("colour")?;
    let entries = table
        .rows
        .iter()
        .filter_map(|(_, fields)| Some((fields.get(key)?.clone(), fields.get(color)?.clone())))
        .collect();
    Ok(ColorTable::new(entries))
}

pub fn read_corpus(path: &Path) -> Result<Vec<String>> {
    parse_corpus(open(path)?)
}

pub fn read_keywords(path: &Path) -> Result<KeywordTable> {
    parse_keywords(open(path)?)
}

pub fn read_important_authors(path: &Path) -> Result<ImportantAuthors> {
    parse_important_authors(open(path)?)
}

pub fn read_colors(path: &Path) -> Result<ColorTable> {
    parse_colors(open(path)?)
}
