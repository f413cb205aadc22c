//! Parsing of the model's JSON reply.

use deepsearch_core::error::AppError;
use deepsearch_entity::summary::SummaryResult;

/// Parse the model's reply into a summary result.
///
/// Models are instructed to answer with JSON only, but some wrap the
/// payload in a Markdown code fence anyway; both forms are accepted.
pub fn parse_reply(reply: &str) -> Result<SummaryResult, AppError> {
    let payload = strip_code_fence(reply.trim());

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| AppError::external(format!("Model reply is not valid JSON: {e}")))?;

    let summary = value
        .get("summary")
        .and_then(|s| s.as_str())
        .ok_or_else(|| AppError::external("Model reply is missing 'summary'"))?
        .to_string();

    let keywords = value
        .get("keywords")
        .and_then(|k| k.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|k| k.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(SummaryResult { summary, keywords })
}

/// Remove a surrounding ```/```json fence if present.
fn strip_code_fence(reply: &str) -> &str {
    let Some(rest) = reply.strip_prefix("```") else {
        return reply;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_json() {
        let reply = r#"{"summary": "A report.", "keywords": ["finance", "q3"]}"#;
        let result = parse_reply(reply).expect("parse");
        assert_eq!(result.summary, "A report.");
        assert_eq!(result.keywords, vec!["finance", "q3"]);
    }

    #[test]
    fn test_parses_fenced_json() {
        let reply = "```json\n{\"summary\": \"Fenced.\", \"keywords\": []}\n```";
        let result = parse_reply(reply).expect("parse");
        assert_eq!(result.summary, "Fenced.");
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn test_missing_keywords_defaults_to_empty() {
        let reply = r#"{"summary": "No keywords."}"#;
        let result = parse_reply(reply).expect("parse");
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn test_rejects_non_json_reply() {
        let err = parse_reply("Sure! Here is your summary: ...").expect_err("must fail");
        assert_eq!(err.kind, deepsearch_core::error::ErrorKind::ExternalService);
    }

    #[test]
    fn test_rejects_missing_summary() {
        assert!(parse_reply(r#"{"keywords": ["a"]}"#).is_err());
    }
}
