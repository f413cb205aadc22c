//! Prompt assembly for the summarization request.

/// Instruction template. The model must answer with JSON only so the reply
/// can be parsed mechanically.
const TEMPLATE: &str = r#"Summarize the following text concisely:

{content}

Produce the result in **valid JSON only**, in the following structure:

{
  "summary": "A brief summary of the content.",
  "keywords": ["keyword1", "keyword2", "keyword3"]
}
"#;

/// Build the user prompt for a page's OCR content, truncating overly long
/// input at a character boundary.
pub fn build(content: &str, max_chars: usize) -> String {
    let truncated: String = if content.chars().count() > max_chars {
        content.chars().take(max_chars).collect()
    } else {
        content.to_string()
    };
    TEMPLATE.replace("{content}", &truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_embedded() {
        let prompt = build("quarterly report", 100);
        assert!(prompt.contains("quarterly report"));
        assert!(prompt.contains("valid JSON only"));
    }

    #[test]
    fn test_long_content_is_truncated() {
        let content = "x".repeat(500);
        let prompt = build(&content, 100);
        assert!(!prompt.contains(&"x".repeat(101)));
        assert!(prompt.contains(&"x".repeat(100)));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let content = "é".repeat(50);
        let prompt = build(&content, 10);
        assert!(prompt.contains(&"é".repeat(10)));
    }
}
