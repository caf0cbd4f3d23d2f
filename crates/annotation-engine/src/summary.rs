//! Text of the trailing page listing requirements that could not be located

use shared_types::UnresolvedRecord;

/// Render the summary block for one document.
///
/// A header naming the document, then one block per record (status glyph
/// and title, details, optional suggestion), blocks separated by a blank line.
pub fn render_summary(document_title: &str, records: &[UnresolvedRecord]) -> String {
    let mut blocks = Vec::with_capacity(records.len() + 1);
    blocks.push(format!("Unresolved requirements: {}", document_title));

    for record in records {
        let mut block = format!("{} {}", record.status.glyph(), record.requirement);
        if !record.details.trim().is_empty() {
            block.push('\n');
            block.push_str(record.details.trim());
        }
        if let Some(suggestion) = record.suggestion.as_deref().map(str::trim) {
            if !suggestion.is_empty() {
                block.push_str("\nSuggestion: ");
                block.push_str(suggestion);
            }
        }
        blocks.push(block);
    }

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::ComplianceStatus;

    #[test]
    fn test_renders_header_and_blocks() {
        let records = vec![
            UnresolvedRecord {
                requirement: "AML Policy".to_string(),
                status: ComplianceStatus::Missing,
                details: "No anti-money laundering policy found.".to_string(),
                suggestion: None,
            },
            UnresolvedRecord {
                requirement: "Data Residency".to_string(),
                status: ComplianceStatus::Partial,
                details: "Hosting region unclear.".to_string(),
                suggestion: Some("State that PII is stored in Qatar.".to_string()),
            },
        ];

        let text = render_summary("Compliance Policy", &records);
        assert_eq!(
            text,
            "Unresolved requirements: Compliance Policy\n\n\
             [x] AML Policy\nNo anti-money laundering policy found.\n\n\
             [!] Data Residency\nHosting region unclear.\nSuggestion: State that PII is stored in Qatar."
        );
    }

    #[test]
    fn test_blank_fields_omitted() {
        let records = vec![UnresolvedRecord {
            requirement: "Board Structure".to_string(),
            status: ComplianceStatus::Missing,
            details: "  ".to_string(),
            suggestion: Some(String::new()),
        }];
        assert_eq!(
            render_summary("Legal Structure", &records),
            "Unresolved requirements: Legal Structure\n\n[x] Board Structure"
        );
    }
}
