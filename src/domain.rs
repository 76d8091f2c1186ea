use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PapersError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FormLevel(u8);

impl FormLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, PapersError> {
        Self::try_from(value)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        u8::try_from(value).ok().and_then(|v| Self::new(v).ok())
    }
}

impl TryFrom<u8> for FormLevel {
    type Error = PapersError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PapersError::InvalidForm(value.to_string()))
        }
    }
}

impl From<FormLevel> for u8 {
    fn from(value: FormLevel) -> Self {
        value.0
    }
}

impl fmt::Display for FormLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormLevel {
    type Err = PapersError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("form")
            .or_else(|| trimmed.strip_prefix("Form"))
            .or_else(|| trimmed.strip_prefix('f'))
            .or_else(|| trimmed.strip_prefix('F'))
            .unwrap_or(trimmed)
            .trim();
        digits
            .parse::<u8>()
            .map_err(|_| PapersError::InvalidForm(value.to_string()))
            .and_then(Self::new)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub form: FormLevel,
    pub subject: String,
    pub year: i32,
    pub title: String,
    pub pdf_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPayload {
    pub updated_at: String,
    pub papers: Vec<Paper>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestSource {
    Remote,
    Cache,
    Seed,
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::Remote => write!(f, "remote"),
            ManifestSource::Cache => write!(f, "cache"),
            ManifestSource::Seed => write!(f, "seed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    pub paper_id: String,
    pub local_uri: String,
    pub downloaded_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

pub type DownloadIndex = BTreeMap<String, DownloadRecord>;

pub fn sanitize_filename(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_form_level() {
        assert_eq!("3".parse::<FormLevel>().unwrap().get(), 3);
        assert_eq!("Form 4".parse::<FormLevel>().unwrap().get(), 4);
        assert_eq!("f1".parse::<FormLevel>().unwrap().get(), 1);
    }

    #[test]
    fn parse_form_level_out_of_range() {
        assert_matches!("6".parse::<FormLevel>(), Err(PapersError::InvalidForm(_)));
        assert_matches!("0".parse::<FormLevel>(), Err(PapersError::InvalidForm(_)));
        assert_matches!("two".parse::<FormLevel>(), Err(PapersError::InvalidForm(_)));
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("F1-Math/2025 Term#1"), "f1-math_2025_term_1");
        assert_eq!(sanitize_filename("already_safe-id"), "already_safe-id");
    }

    #[test]
    fn paper_uses_camel_case_fields() {
        let paper = Paper {
            id: "f1-math-2025".to_string(),
            form: FormLevel::new(1).unwrap(),
            subject: "Mathematics".to_string(),
            year: 2025,
            title: "Mathematics Form 1".to_string(),
            pdf_url: "https://example.org/f1.pdf".to_string(),
            size_bytes: None,
            updated_at: "2026-02-23T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["pdfUrl"], "https://example.org/f1.pdf");
        assert_eq!(json["form"], 1);
        assert!(json.get("sizeBytes").is_none());
    }
}
