use std::collections::HashSet;

use super::mapping::{ARTICLE_ALIASES, AliasTable, CATEGORY_ALIASES};
use super::normalize::normalize_header;

/// Rows inspected when looking for the header row.
pub const HEADER_SCAN_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Number(value) => format_number(*value),
            Self::Bool(value) => value.to_string(),
        }
    }

    pub fn into_text(self) -> Self {
        match self {
            Self::Text(_) => self,
            other => Self::Text(other.display()),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One data row keyed by the literal header labels, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, CellValue)>,
}

impl RawRecord {
    /// A repeated header keeps its first position and takes the newer value.
    pub fn insert(&mut self, header: String, value: CellValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(key, _)| *key == header) {
            slot.1 = value;
        } else {
            self.fields.push((header, value));
        }
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Normalized header terms known to either schema.
#[derive(Debug, Clone)]
pub struct HeaderVocabulary {
    terms: HashSet<String>,
    identifiers: HashSet<String>,
}

impl HeaderVocabulary {
    pub fn from_tables(tables: &[&AliasTable]) -> Self {
        let mut terms = HashSet::new();
        let mut identifiers = HashSet::new();

        for table in tables {
            for field in table.fields {
                for alias in field.aliases {
                    let alias = normalize_header(alias);
                    if field.identifier {
                        identifiers.insert(alias.clone());
                    }
                    terms.insert(alias);
                }
            }
        }

        Self { terms, identifiers }
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.terms.contains(normalized)
    }

    pub fn is_identifier(&self, normalized: &str) -> bool {
        self.identifiers.contains(normalized)
    }
}

impl Default for HeaderVocabulary {
    fn default() -> Self {
        Self::from_tables(&[&CATEGORY_ALIASES, &ARTICLE_ALIASES])
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub header_row_index: Option<usize>,
    pub header_score: usize,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

pub fn extract_records(grid: &[Vec<CellValue>], vocabulary: &HeaderVocabulary) -> Extraction {
    let Some((header_index, header_score)) = locate_header_row(grid, vocabulary) else {
        return Extraction::default();
    };

    let headers: Vec<String> = grid[header_index].iter().map(CellValue::display).collect();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Extraction {
            header_row_index: Some(header_index),
            header_score,
            ..Extraction::default()
        };
    }

    let identifier_columns: Vec<bool> = headers
        .iter()
        .map(|header| vocabulary.is_identifier(&normalize_header(header)))
        .collect();

    let mut records = Vec::new();
    for row in &grid[header_index + 1..] {
        if row.iter().all(CellValue::is_empty) {
            continue;
        }

        let mut record = RawRecord::default();
        for (column, header) in headers.iter().enumerate() {
            let value = row
                .get(column)
                .cloned()
                .unwrap_or_else(|| CellValue::Text(String::new()));
            let value = if identifier_columns[column] {
                value.into_text()
            } else {
                value
            };
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    Extraction {
        header_row_index: Some(header_index),
        header_score,
        headers,
        records,
    }
}

/// Best scoring row among the first [`HEADER_SCAN_LIMIT`]; the earliest wins ties.
fn locate_header_row(
    grid: &[Vec<CellValue>],
    vocabulary: &HeaderVocabulary,
) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;

    for (index, row) in grid.iter().take(HEADER_SCAN_LIMIT).enumerate() {
        let score = row
            .iter()
            .filter(|cell| vocabulary.contains(&normalize_header(&cell.display())))
            .count();

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best
}
