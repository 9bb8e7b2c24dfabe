//! # URI Templates
//!
//! Destination URIs may embed the run's logical date through `{{ ds }}`
//! (`YYYY-MM-DD`) or `{{ ds_nodash }}` (`YYYYMMDD`). Everything else, shard
//! wildcards included, is literal text. Years outside `0..=9999` render with
//! an explicit sign (`+10000-01-01`), so the width of a rendered date is found
//! while parsing it back rather than assumed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{DS_NODASH_TOKEN, DS_TOKEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unclosed template token starting at byte {position} in '{template}'")]
    UnclosedToken { template: String, position: usize },
    #[error("Unknown template token '{token}' in '{template}'")]
    UnknownToken { template: String, token: String },
    #[error("URI '{uri}' does not match template '{template}'")]
    Mismatch { template: String, uri: String },
    #[error("Template '{template}' contains no date token")]
    NoDateToken { template: String },
    #[error("URI '{uri}' carries conflicting dates for template '{template}'")]
    ConflictingDates { template: String, uri: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateToken {
    Ds,
    DsNodash,
}

impl DateToken {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            DS_TOKEN => Some(Self::Ds),
            DS_NODASH_TOKEN => Some(Self::DsNodash),
            _ => None,
        }
    }

    fn format(&self) -> &'static str {
        match self {
            Self::Ds => "%Y-%m-%d",
            Self::DsNodash => "%Y%m%d",
        }
    }

    /// Parse a rendered date at the start of `input`, returning it with its byte width
    fn parse_prefix(&self, input: &str) -> Option<(NaiveDate, usize)> {
        let year_widths = if input.starts_with(['+', '-']) {
            5..=7
        } else {
            4..=4
        };
        let separator = match self {
            Self::Ds => "-",
            Self::DsNodash => "",
        };

        year_widths.into_iter().find_map(|year_width| {
            let year: i32 = input.get(..year_width)?.parse().ok()?;
            let mut cursor = year_width;
            let mut field = || -> Option<u32> {
                let digits = input
                    .get(cursor..)?
                    .strip_prefix(separator)?
                    .get(..2)
                    .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))?;
                cursor += separator.len() + 2;
                digits.parse().ok()
            };
            let month = field()?;
            let day = field()?;

            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let rendered = input.get(..cursor)?;
            (date.format(self.format()).to_string() == rendered).then_some((date, cursor))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Date(DateToken),
}

/// A URI with per-run date substitution tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(raw: impl Into<String>) -> Result<Self, TemplateError> {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut rest = raw.as_str();
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or_else(|| TemplateError::UnclosedToken {
                    template: raw.clone(),
                    position: offset + open,
                })?;
            let name = after_open[..close].trim();
            let token = DateToken::from_name(name).ok_or_else(|| TemplateError::UnknownToken {
                template: raw.clone(),
                token: name.to_string(),
            })?;
            segments.push(Segment::Date(token));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn has_date_token(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Date(_)))
    }

    /// Substitute every date token with the logical date
    pub fn render(&self, logical_date: NaiveDate) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Date(token) => logical_date.format(token.format()).to_string(),
            })
            .collect()
    }

    /// Recover the logical date from a URI rendered by this template
    pub fn parse_date(&self, uri: &str) -> Result<NaiveDate, TemplateError> {
        let mismatch = || TemplateError::Mismatch {
            template: self.raw.clone(),
            uri: uri.to_string(),
        };

        let mut cursor = 0;
        let mut found: Option<NaiveDate> = None;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    if !uri[cursor..].starts_with(text.as_str()) {
                        return Err(mismatch());
                    }
                    cursor += text.len();
                }
                Segment::Date(token) => {
                    let (date, width) = uri
                        .get(cursor..)
                        .and_then(|rest| token.parse_prefix(rest))
                        .ok_or_else(mismatch)?;
                    match found {
                        Some(previous) if previous != date => {
                            return Err(TemplateError::ConflictingDates {
                                template: self.raw.clone(),
                                uri: uri.to_string(),
                            })
                        }
                        _ => found = Some(date),
                    }
                    cursor += width;
                }
            }
        }

        if cursor != uri.len() {
            return Err(mismatch());
        }
        found.ok_or_else(|| TemplateError::NoDateToken {
            template: self.raw.clone(),
        })
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for UriTemplate {
    type Error = TemplateError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<UriTemplate> for String {
    fn from(template: UriTemplate) -> Self {
        template.raw
    }
}
