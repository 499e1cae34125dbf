use std::collections::BTreeMap;
use std::str::FromStr;

use cai_emulator::constants::LineNumber;
use thiserror::Error;

/// A program line, given either by its number or by a label pointing to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Line(LineNumber),
    Label(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("expected a line number or a label, got {0:?}")]
    Invalid(String),

    #[error("unknown label {0:?}")]
    UnknownLabel(String),
}

impl Location {
    pub fn resolve(
        &self,
        labels: &BTreeMap<String, LineNumber>,
    ) -> Result<LineNumber, LocationError> {
        match self {
            Self::Line(line) => Ok(*line),
            Self::Label(label) => labels
                .get(label)
                .copied()
                .ok_or_else(|| LocationError::UnknownLabel(label.clone())),
        }
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(line) = s.parse() {
            return Ok(Self::Line(line));
        }

        // Labels are trimmed on declaration, and may end up with a stray colon when copied
        let label = s.strip_suffix(':').unwrap_or(s);
        if label.is_empty() || label.contains(char::is_whitespace) {
            return Err(LocationError::Invalid(s.to_owned()));
        }

        Ok(Self::Label(label.to_owned()))
    }
}
