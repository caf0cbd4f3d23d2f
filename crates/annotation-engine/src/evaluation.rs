//! Parsing of the upstream evaluation reply
//!
//! The analysis step answers with a JSON object, often wrapped in a Markdown
//! code fence. Only the fields the engine needs are read; unknown fields are
//! ignored.

use serde::{Deserialize, Serialize};
use shared_types::AnnotationRequest;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Evaluation reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Evaluation reply has no requirements")]
    MissingRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub requirements: Vec<AnnotationRequest>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Evaluation {
    /// Requests that still need annotating (everything not compliant)
    pub fn annotation_requests(&self) -> Vec<AnnotationRequest> {
        self.requirements
            .iter()
            .filter(|r| !r.status.is_compliant())
            .cloned()
            .collect()
    }
}

/// Parse an evaluation reply, unwrapping a ```` ```json ```` or bare
/// ```` ``` ```` fence when present
pub fn parse_evaluation(reply: &str) -> Result<Evaluation, EvaluationError> {
    let evaluation: Evaluation = serde_json::from_str(strip_code_fence(reply))?;
    if evaluation.requirements.is_empty() {
        return Err(EvaluationError::MissingRequirements);
    }
    Ok(evaluation)
}

fn strip_code_fence(reply: &str) -> &str {
    let body = if let Some((_, rest)) = reply.split_once("```json") {
        rest
    } else if let Some((_, rest)) = reply.split_once("```") {
        rest
    } else {
        return reply.trim();
    };
    body.split("```").next().unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{ComplianceStatus, DocumentCategory};

    const REPLY: &str = r#"{
        "overall_score": 62,
        "requirements": [
            {
                "id": "minimum_capital_psp",
                "category": "Capital",
                "requirement": "Minimum Capital (PSP)",
                "status": "compliant",
                "details": "QAR 7.5m stated",
                "found_in_document": "business_plan",
                "key_quote": ""
            },
            {
                "id": "data_residency",
                "category": "Data Protection",
                "requirement": "Data Residency",
                "status": "missing",
                "details": "Hosting in eu-west-1",
                "found_in_document": "compliance_policy",
                "key_quote": "hosted on AWS in eu-west-1"
            }
        ],
        "recommendations": ["Move PII to a Qatar region"]
    }"#;

    #[test]
    fn test_parses_plain_json() {
        let evaluation = parse_evaluation(REPLY).unwrap();
        assert_eq!(evaluation.overall_score, Some(62.0));
        assert_eq!(evaluation.requirements.len(), 2);
        assert_eq!(evaluation.recommendations, vec!["Move PII to a Qatar region"]);
    }

    #[test]
    fn test_parses_json_fence() {
        let reply = format!("Here is the result:\n```json\n{}\n```\nThanks", REPLY);
        let evaluation = parse_evaluation(&reply).unwrap();
        assert_eq!(evaluation.requirements[1].id, "data_residency");
    }

    #[test]
    fn test_parses_bare_fence() {
        let reply = format!("```\n{}\n```", REPLY);
        assert!(parse_evaluation(&reply).is_ok());
    }

    #[test]
    fn test_annotation_requests_drop_compliant() {
        let requests = parse_evaluation(REPLY).unwrap().annotation_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, ComplianceStatus::Missing);
        assert_eq!(
            requests[0].found_in_document,
            Some(DocumentCategory::from("compliance_policy"))
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_evaluation("not json"),
            Err(EvaluationError::Json(_))
        ));
    }

    #[test]
    fn test_empty_requirements() {
        assert!(matches!(
            parse_evaluation(r#"{"requirements": []}"#),
            Err(EvaluationError::MissingRequirements)
        ));
    }
}
