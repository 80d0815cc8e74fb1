// Gesture code table: the wire code sent for each label.
// Invariants: every label resolves to a code; overrides can only replace defaults.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::gesture::GestureLabel;

/// Built-in code for a label.
pub fn code_for(label: GestureLabel) -> &'static str {
    match label {
        GestureLabel::ThumbsUp => "1",
        GestureLabel::ThumbsDown => "2",
        GestureLabel::KeepInTouch => "3",
        GestureLabel::Unity => "4",
        GestureLabel::FingerGunOrOffensive => "5",
        GestureLabel::Victory => "6",
        GestureLabel::ItsOkay => "7",
        GestureLabel::WeStandTogether => "8",
        GestureLabel::Palm => "9",
        GestureLabel::Unrecognized => "0",
    }
}

#[derive(Debug)]
pub enum CodeTableError {
    Csv(csv::Error),
    UnknownLabel { line: u64, label: String },
    EmptyCode { line: u64, label: String },
}

impl fmt::Display for CodeTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeTableError::Csv(err) => write!(f, "code table csv: {err}"),
            CodeTableError::UnknownLabel { line, label } => {
                write!(f, "line {line}: unknown gesture label {label:?}")
            }
            CodeTableError::EmptyCode { line, label } => {
                write!(f, "line {line}: empty code for {label}")
            }
        }
    }
}

impl std::error::Error for CodeTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodeTableError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for CodeTableError {
    fn from(err: csv::Error) -> Self {
        CodeTableError::Csv(err)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CodeEntry {
    pub label: GestureLabel,
    pub code: String,
}

#[derive(Clone, Debug)]
pub struct CodeTable {
    codes: HashMap<GestureLabel, String>,
}

impl CodeTable {
    /// Reads `label,code` rows (with a header) over the built-in codes.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CodeTableError> {
        let mut table = Self::default();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or(0);
            let name = record.get(0).unwrap_or_default();
            let label = name
                .parse::<GestureLabel>()
                .map_err(|_| CodeTableError::UnknownLabel {
                    line,
                    label: name.to_string(),
                })?;
            let code = record.get(1).unwrap_or_default();
            if code.is_empty() {
                return Err(CodeTableError::EmptyCode {
                    line,
                    label: name.to_string(),
                });
            }
            table.codes.insert(label, code.to_string());
        }
        Ok(table)
    }

    pub fn code(&self, label: GestureLabel) -> &str {
        self.codes
            .get(&label)
            .map(String::as_str)
            .unwrap_or_else(|| code_for(label))
    }

    pub fn entries(&self) -> Vec<CodeEntry> {
        GestureLabel::iter()
            .map(|label| CodeEntry {
                label,
                code: self.code(label).to_string(),
            })
            .collect()
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        let codes = GestureLabel::iter()
            .map(|label| (label, code_for(label).to_string()))
            .collect();
        Self { codes }
    }
}
