//! Document numbering - formats quote and invoice identifiers.
//!
//! A number is built from a prefix, a separator, an optional date component
//! and a zero-padded sequence: `DEVIS-2026-007`, `FACT/202603/0042`,
//! `D00012`. Formatting is pure; the sequence itself is tracked by the
//! storage layer (see [`crate::core::store::next_number`]).

use crate::errors::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Narrowest allowed sequence width.
pub const MIN_WIDTH: u8 = 3;
/// Widest allowed sequence width.
pub const MAX_WIDTH: u8 = 6;

/// Character placed between the parts of a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Separator {
    /// `DEVIS-2026-001`
    #[default]
    #[serde(rename = "-")]
    Dash,
    /// `DEVIS/2026/001`
    #[serde(rename = "/")]
    Slash,
    /// `DEVIS2026001`
    #[serde(rename = "")]
    None,
}

impl Separator {
    /// Text placed between the parts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dash => "-",
            Self::Slash => "/",
            Self::None => "",
        }
    }
}

/// Date part of a number, taken from the formatting date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateComponent {
    /// No date part; the sequence never restarts
    None,
    /// `YYYY`
    #[default]
    Year,
    /// `YYYYMM`
    #[serde(alias = "yearMonth")]
    YearMonth,
}

impl DateComponent {
    fn render(self, today: NaiveDate) -> Option<String> {
        match self {
            Self::None => None,
            Self::Year => Some(format!("{:04}", today.year())),
            Self::YearMonth => Some(format!("{:04}{:02}", today.year(), today.month())),
        }
    }
}

/// How a document number is put together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingFormat {
    /// Leading text, may be empty
    pub prefix: String,
    pub separator: Separator,
    pub date_component: DateComponent,
    /// Digits of the zero-padded sequence, 3 to 6
    pub width: u8,
}

impl Default for NumberingFormat {
    fn default() -> Self {
        Self::quotes()
    }
}

impl NumberingFormat {
    /// `DEVIS-YYYY-NNN`
    #[must_use]
    pub fn quotes() -> Self {
        Self {
            prefix: "DEVIS".to_string(),
            separator: Separator::Dash,
            date_component: DateComponent::Year,
            width: MIN_WIDTH,
        }
    }

    /// `FACT-YYYY-NNN`
    #[must_use]
    pub fn invoices() -> Self {
        Self {
            prefix: "FACT".to_string(),
            ..Self::quotes()
        }
    }

    /// Checks the width bounds.
    ///
    /// # Errors
    /// Returns `Error::Config` when `width` is outside 3..=6.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.width) {
            return Err(Error::Config {
                message: format!(
                    "Numbering width must be between {MIN_WIDTH} and {MAX_WIDTH}, got {}",
                    self.width
                ),
            });
        }
        Ok(())
    }

    /// Formats `sequence` for a document dated `today`.
    ///
    /// The sequence is padded to `width` digits but never truncated.
    #[must_use]
    pub fn format(&self, sequence: u32, today: NaiveDate) -> String {
        let separator = self.separator.as_str();
        let width = usize::from(self.width.clamp(MIN_WIDTH, MAX_WIDTH));
        let mut number = String::new();

        if !self.prefix.is_empty() {
            number.push_str(&self.prefix);
            number.push_str(separator);
        }
        if let Some(date) = self.date_component.render(today) {
            number.push_str(&date);
            number.push_str(separator);
        }
        number.push_str(&format!("{sequence:0width$}"));
        number
    }

    /// Key of the counter this format draws sequences from.
    ///
    /// Formats with a date component restart their sequence each period.
    #[must_use]
    pub fn counter_key(&self, scope: &str, today: NaiveDate) -> String {
        let period = self
            .date_component
            .render(today)
            .unwrap_or_else(|| "all".to_string());
        format!("{scope}:{}:{period}", self.prefix)
    }

    /// Recovers the format and sequence of an existing number.
    ///
    /// Unparseable parts fall back to the quote defaults, so this never fails.
    #[must_use]
    pub fn infer(existing: &str) -> (Self, Option<u32>) {
        let existing = existing.trim();
        let separator = if existing.contains('/') {
            Separator::Slash
        } else if existing.contains('-') {
            Separator::Dash
        } else {
            Separator::None
        };

        let parts: Vec<&str> = match separator {
            Separator::None => split_trailing_digits(existing),
            _ => existing.split(separator.as_str()).collect(),
        };

        let mut format = Self {
            separator,
            ..Self::quotes()
        };
        let (sequence_part, middle) = match parts.as_slice() {
            [] => return (format, None),
            [only] => {
                format.prefix = String::new();
                (*only, None)
            }
            [prefix, rest @ ..] => {
                format.prefix = (*prefix).to_string();
                let sequence_part = rest.last().copied().unwrap_or_default();
                let middle = if rest.len() >= 2 { Some(rest[0]) } else { None };
                (sequence_part, middle)
            }
        };

        format.date_component = match middle {
            Some(date) if is_digits(date) && date.len() == 4 => DateComponent::Year,
            Some(date) if is_digits(date) && date.len() == 6 => DateComponent::YearMonth,
            _ => DateComponent::None,
        };

        let sequence = sequence_part.parse::<u32>().ok();
        if sequence.is_some() {
            let digits = u8::try_from(sequence_part.len()).unwrap_or(MAX_WIDTH);
            format.width = digits.clamp(MIN_WIDTH, MAX_WIDTH);
        }
        (format, sequence)
    }
}

/// Formats `sequence` with `config` for a document dated `now`.
#[must_use]
pub fn format(config: &NumberingFormat, sequence: u32, now: NaiveDate) -> String {
    config.format(sequence, now)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn split_trailing_digits(s: &str) -> Vec<&str> {
    let split_at = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(s.len(), |(i, _)| i);
    let (head, digits) = s.split_at(split_at);
    [head, digits].into_iter().filter(|p| !p.is_empty()).collect()
}
