//! The analyst prompt sent to the model.
//!
//! Keeping the prompt here (and not inline in the LLM stage) lets unit tests
//! pin the schema the renderer depends on: if a key disappears from the
//! prompt, the model stops producing it and the deck silently fills with
//! placeholders.
//!
//! Callers can override the template via
//! [`crate::config::DeckConfig::prompt_template`].

/// Placeholder substituted with the document text in custom templates.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Default instruction block: role framing, extraction rules, and the exact
/// JSON schema of [`crate::model::AnalysisResult`].
pub const ANALYST_PROMPT: &str = r#"Act as a Senior Partner at a top consulting firm.
Analyze the provided Annual Report text.

Goal: Extract data for a 'High Density' strategy deck.

CRITICAL:
1. Identify the Company Name dynamically.
2. If a specific metric (like ROE) is not found, estimate it from context or put "N/A".
3. Risks must include a 'Mitigation' or 'Impact' statement.

Output strict JSON:
{
    "company_name": "EXTRACTED_NAME",
    "current_fy": "2024",
    "exec_summary_intro": "A 40-word robust strategic summary of the fiscal year.",
    "kpis": {
        "ebitda_margin": "15.5%",
        "roe": "12%",
        "leverage": "0.5x"
    },
    "highlights": [
        "Detailed point 1 (20 words) with specific numbers/growth %.",
        "Detailed point 2 (20 words) regarding new product launches.",
        "Detailed point 3 (20 words) regarding geography/market expansion.",
        "Detailed point 4 (20 words) regarding capex or investment."
    ],
    "financials": [
        {"year": "2024", "revenue": 1000, "net_profit": 100},
        {"year": "2023", "revenue": 900, "net_profit": 90},
        {"year": "2022", "revenue": 800, "net_profit": 80}
    ],
    "financial_insights": [
        "Insight on Revenue Growth Drivers (Volume vs Price).",
        "Insight on Cost Structure or Margin changes.",
        "Insight on Capital Allocation or Debt reduction."
    ],
    "risks": [
        {"type": "Operational", "risk": "Supply chain disruption...", "mitigation": "Diversifying suppliers..."},
        {"type": "Market", "risk": "EV slowdown...", "mitigation": "Focusing on Hybrid..."},
        {"type": "Regulatory", "risk": "Carbon tax...", "mitigation": "Green manufacturing..."}
    ]
}
"#;

/// Build the full request text for `document_text`.
///
/// With no override the analyst prompt is followed by
/// `Source Text: <document>`. An override containing `{text}` has the
/// document substituted there; any other override gets the same
/// `Source Text:` suffix as the default.
pub fn build_analysis_prompt(document_text: &str, template: Option<&str>) -> String {
    match template {
        Some(t) if t.contains(TEXT_PLACEHOLDER) => t.replace(TEXT_PLACEHOLDER, document_text),
        Some(t) => format!("{}\n\nSource Text: {}", t.trim_end(), document_text),
        None => format!("{}\nSource Text: {}", ANALYST_PROMPT, document_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_names_every_schema_key() {
        for key in [
            "company_name",
            "current_fy",
            "exec_summary_intro",
            "kpis",
            "ebitda_margin",
            "roe",
            "leverage",
            "highlights",
            "financials",
            "net_profit",
            "financial_insights",
            "risks",
            "mitigation",
        ] {
            assert!(ANALYST_PROMPT.contains(key), "prompt lost schema key {key}");
        }
    }

    #[test]
    fn default_prompt_ends_with_source_text() {
        let p = build_analysis_prompt("Revenue grew 12%.", None);
        assert!(p.starts_with("Act as a Senior Partner"));
        assert!(p.ends_with("Source Text: Revenue grew 12%."));
    }

    #[test]
    fn custom_template_with_placeholder() {
        let p = build_analysis_prompt("BODY", Some("Summarise:\n{text}\nReturn JSON."));
        assert_eq!(p, "Summarise:\nBODY\nReturn JSON.");
    }

    #[test]
    fn custom_template_without_placeholder_appends_text() {
        let p = build_analysis_prompt("BODY", Some("Return JSON.\n"));
        assert_eq!(p, "Return JSON.\n\nSource Text: BODY");
    }
}
