use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Compliant,
    Partial,
    Missing,
}

impl ComplianceStatus {
    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceStatus::Compliant)
    }

    /// Plain-ASCII marker so standard PDF fonts can draw it
    pub fn glyph(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "[ok]",
            ComplianceStatus::Partial => "[!]",
            ComplianceStatus::Missing => "[x]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::Partial => "partial",
            ComplianceStatus::Missing => "missing",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a document kind, e.g. `compliance_policy`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentCategory(String);

impl DocumentCategory {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `compliance_policy` -> `Compliance Policy`
    pub fn display_name(&self) -> String {
        self.0
            .split(['_', '-'])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentCategory {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One evaluated requirement that may need a highlight.
///
/// Field names follow the upstream evaluation JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub id: String,
    /// Requirement title
    pub requirement: String,
    /// Regulatory category the requirement belongs to
    #[serde(default)]
    pub category: Option<String>,
    pub status: ComplianceStatus,
    #[serde(default)]
    pub key_quote: String,
    /// Reasoning or gap explanation
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub suggestion: Option<String>,
    /// Explicit document tag; overrides the configured requirement table
    #[serde(default)]
    pub target_document: Option<DocumentCategory>,
    #[serde(default)]
    pub found_in_document: Option<DocumentCategory>,
}

impl AnnotationRequest {
    pub fn new(
        id: impl Into<String>,
        requirement: impl Into<String>,
        status: ComplianceStatus,
    ) -> Self {
        Self {
            id: id.into(),
            requirement: requirement.into(),
            category: None,
            status,
            key_quote: String::new(),
            details: String::new(),
            suggestion: None,
            target_document: None,
            found_in_document: None,
        }
    }

    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.key_quote = quote.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<DocumentCategory>) -> Self {
        self.target_document = Some(target.into());
        self
    }

    pub fn with_found_in(mut self, found_in: impl Into<DocumentCategory>) -> Self {
        self.found_in_document = Some(found_in.into());
        self
    }
}

/// Which locator stage produced a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "words")]
pub enum MatchStage {
    Exact,
    Normalized,
    /// First `n` words of the quote
    WordPrefix(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedRegion {
    pub page_index: usize,
    pub rect: Rect,
    pub stage: MatchStage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightAction {
    pub request_id: String,
    pub page_index: usize,
    pub rect: Rect,
    pub color: Rgb,
    pub opacity: f32,
    pub status: ComplianceStatus,
    /// Requirement title, kept separately for annotation headers
    pub title: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedRecord {
    pub requirement: String,
    pub status: ComplianceStatus,
    pub details: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl From<&AnnotationRequest> for UnresolvedRecord {
    fn from(request: &AnnotationRequest) -> Self {
        Self {
            requirement: request.requirement.clone(),
            status: request.status,
            details: request.details.clone(),
            suggestion: request.suggestion.clone(),
        }
    }
}

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}", c(self.r), c(self.g), c(self.b))
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parse `#RRGGBB` or `RRGGBB`
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let hex = color.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("Invalid hex color: {}", color));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| format!("Invalid hex color: {}", color))
        };
        Ok(Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}
