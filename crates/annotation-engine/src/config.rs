//! Engine configuration
//!
//! TOML-based configuration holding the locator thresholds, the highlight
//! palette, and the canonical requirement table (requirement id to expected
//! document and fallback phrases).

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use shared_types::{ComplianceStatus, DocumentCategory, Rgb};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default)]
    pub relevance: RelevanceMode,
    /// Display titles for document categories
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
    #[serde(default)]
    pub requirements: Vec<RequirementEntry>,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use annotation_engine::config::EngineConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [[requirements]]
    ///     id = "aml_policy"
    ///     document = "compliance_policy"
    ///     fallback_phrases = ["anti-money laundering"]
    /// "#;
    /// let config = EngineConfig::from_str(toml)?;
    /// assert_eq!(config.fallback_phrases("aml_policy").len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.locator.snippet_word_counts.is_empty() {
            bail!("locator.snippet_word_counts must not be empty");
        }
        if !self.locator.adjacency_tolerance.is_finite() || self.locator.adjacency_tolerance < 0.0
        {
            bail!(
                "locator.adjacency_tolerance must be a non-negative number (found: {})",
                self.locator.adjacency_tolerance
            );
        }
        let mut seen = HashSet::new();
        for entry in &self.requirements {
            if !seen.insert(entry.id.as_str()) {
                bail!("Duplicate requirement id in configuration: {}", entry.id);
            }
        }
        Ok(())
    }

    /// Ordered fallback phrases configured for a requirement
    pub fn fallback_phrases(&self, requirement_id: &str) -> &[String] {
        self.requirement(requirement_id)
            .map(|entry| entry.fallback_phrases.as_slice())
            .unwrap_or(&[])
    }

    /// Document a requirement is expected to be evidenced in
    pub fn expected_document(&self, requirement_id: &str) -> Option<&DocumentCategory> {
        self.requirement(requirement_id)
            .and_then(|entry| entry.document.as_ref())
    }

    /// Title shown in the unresolved summary header
    pub fn document_title(&self, category: &DocumentCategory) -> String {
        self.documents
            .iter()
            .find(|d| &d.id == category)
            .map(|d| d.title.clone())
            .unwrap_or_else(|| category.display_name())
    }

    /// Index of the requirement table for repeated lookups
    pub fn requirement_index(&self) -> HashMap<&str, &RequirementEntry> {
        self.requirements
            .iter()
            .map(|entry| (entry.id.as_str(), entry))
            .collect()
    }

    fn requirement(&self, requirement_id: &str) -> Option<&RequirementEntry> {
        self.requirements.iter().find(|entry| entry.id == requirement_id)
    }
}

/// Thresholds for the staged quote search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Quotes shorter than this are never searched (default: 5)
    #[serde(default = "default_min_quote_chars")]
    pub min_quote_chars: usize,
    /// Minimum length of the normalized quote for the second stage (default: 10)
    #[serde(default = "default_min_normalized_chars")]
    pub min_normalized_chars: usize,
    /// Word-prefix snippet sizes, tried in descending order (default: 15, 10, 8, 6)
    #[serde(default = "default_snippet_word_counts")]
    pub snippet_word_counts: Vec<usize>,
    /// Snippets shorter than this many words are never tried (default: 6)
    #[serde(default = "default_min_snippet_words")]
    pub min_snippet_words: usize,
    /// Maximum vertical gap between rectangles of one block (default: 6.0)
    #[serde(default = "default_adjacency_tolerance")]
    pub adjacency_tolerance: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_quote_chars: default_min_quote_chars(),
            min_normalized_chars: default_min_normalized_chars(),
            snippet_word_counts: default_snippet_word_counts(),
            min_snippet_words: default_min_snippet_words(),
            adjacency_tolerance: default_adjacency_tolerance(),
        }
    }
}

fn default_min_quote_chars() -> usize {
    5
}

fn default_min_normalized_chars() -> usize {
    10
}

fn default_snippet_word_counts() -> Vec<usize> {
    vec![15, 10, 8, 6]
}

fn default_min_snippet_words() -> usize {
    6
}

fn default_adjacency_tolerance() -> f64 {
    6.0
}

/// Highlight colors, one per non-compliant status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default = "default_partial_color")]
    pub partial: Rgb,
    #[serde(default = "default_missing_color")]
    pub missing: Rgb,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Palette {
    /// Color for a non-compliant status. Compliant items are never
    /// highlighted; they share the partial color if asked.
    pub fn color_for(&self, status: ComplianceStatus) -> Rgb {
        match status {
            ComplianceStatus::Missing => self.missing,
            ComplianceStatus::Partial | ComplianceStatus::Compliant => self.partial,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            partial: default_partial_color(),
            missing: default_missing_color(),
            opacity: default_opacity(),
        }
    }
}

fn default_partial_color() -> Rgb {
    // #F59E0B
    Rgb::new(245.0 / 255.0, 158.0 / 255.0, 11.0 / 255.0)
}

fn default_missing_color() -> Rgb {
    // #EF4444
    Rgb::new(239.0 / 255.0, 68.0 / 255.0, 68.0 / 255.0)
}

fn default_opacity() -> f32 {
    0.4
}

/// How a request is matched to the document being annotated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceMode {
    /// Only the explicit tag (request tag, else requirement table) counts
    #[default]
    Tagged,
    /// The tag, or the document the evaluator recorded the evidence in
    IncludeFoundIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: DocumentCategory,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub id: String,
    #[serde(default)]
    pub document: Option<DocumentCategory>,
    #[serde(default)]
    pub fallback_phrases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r##"
        relevance = "include_found_in"

        [locator]
        adjacency_tolerance = 4.5

        [palette]
        partial = "#FFFF00"

        [[documents]]
        id = "compliance_policy"
        title = "Internal Compliance Policy"

        [[requirements]]
        id = "data_residency"
        document = "compliance_policy"
        fallback_phrases = ["data residency", "hosted in Qatar"]

        [[requirements]]
        id = "minimum_capital_psp"
        document = "business_plan"
    "##;

    #[test]
    fn test_parses_sample() {
        let config = EngineConfig::from_str(SAMPLE).unwrap();
        assert_eq!(config.relevance, RelevanceMode::IncludeFoundIn);
        assert_eq!(config.locator.adjacency_tolerance, 4.5);
        assert_eq!(config.locator.snippet_word_counts, vec![15, 10, 8, 6]);
        assert_eq!(config.palette.partial, Rgb::new(1.0, 1.0, 0.0));
        assert_eq!(config.palette.missing, default_missing_color());
        assert_eq!(
            config.fallback_phrases("data_residency"),
            &["data residency".to_string(), "hosted in Qatar".to_string()]
        );
        assert!(config.fallback_phrases("minimum_capital_psp").is_empty());
        assert!(config.fallback_phrases("unknown").is_empty());
        assert_eq!(
            config.expected_document("minimum_capital_psp"),
            Some(&DocumentCategory::from("business_plan"))
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_str("").unwrap();
        assert_eq!(config.locator, LocatorConfig::default());
        assert_eq!(config.palette, Palette::default());
        assert_eq!(config.relevance, RelevanceMode::Tagged);
        assert!(config.requirements.is_empty());
    }

    #[test]
    fn test_document_title_falls_back_to_display_name() {
        let config = EngineConfig::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.document_title(&DocumentCategory::from("compliance_policy")),
            "Internal Compliance Policy"
        );
        assert_eq!(
            config.document_title(&DocumentCategory::from("legal_structure")),
            "Legal Structure"
        );
    }

    #[test]
    fn test_duplicate_requirement_rejected() {
        let toml = r#"
            [[requirements]]
            id = "aml_policy"
            [[requirements]]
            id = "aml_policy"
        "#;
        let err = EngineConfig::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("aml_policy"));
    }

    #[test]
    fn test_empty_thresholds_rejected() {
        let toml = r#"
            [locator]
            snippet_word_counts = []
        "#;
        assert!(EngineConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_bad_color_rejected() {
        let toml = r#"
            [palette]
            missing = "red"
        "#;
        assert!(EngineConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = EngineConfig::from_file("/nonexistent/engine.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_palette_colors_by_status() {
        let palette = Palette::default();
        assert_eq!(palette.color_for(ComplianceStatus::Missing), palette.missing);
        assert_eq!(palette.color_for(ComplianceStatus::Partial), palette.partial);
        assert_ne!(palette.partial, palette.missing);
    }
}
