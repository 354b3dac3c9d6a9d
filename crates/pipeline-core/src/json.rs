//! Lenient extraction of a JSON object from free-text model output.
//!
//! Classification prompts ask for "JSON only", but models still wrap
//! responses in markdown fences or prose. This module locates the
//! outermost balanced `{...}` span so the caller can decode it.

/// Extract the first balanced JSON object from a response.
///
/// Handles markdown code fences (```json or plain ```), leading prose,
/// and trailing text. Returns `None` when no balanced object is found.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    // Prefer the contents of a fenced block if one exists.
    if let Some(inner) = fenced_block(trimmed) {
        if let Some(obj) = balanced_object(inner) {
            return Some(obj);
        }
    }

    balanced_object(trimmed)
}

/// Contents of the first ``` fence, skipping an optional language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// The first balanced `{...}` span, tracking string literals and escapes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let out = extract_json_object(r#"{"task": "summary"}"#).unwrap();
        assert_eq!(out, r#"{"task": "summary"}"#);
    }

    #[test]
    fn test_object_with_surrounding_prose() {
        let out =
            extract_json_object(r#"Sure, here you go: {"task": "qa"} hope that helps"#).unwrap();
        assert_eq!(out, r#"{"task": "qa"}"#);
    }

    #[test]
    fn test_json_code_fence() {
        let response = "```json\n{\"task\": \"sentiment\", \"needs_clarification\": false}\n```";
        let out = extract_json_object(response).unwrap();
        let v: serde_json::Value = serde_json::from_str(out).unwrap();
        assert_eq!(v["task"], "sentiment");
    }

    #[test]
    fn test_plain_code_fence() {
        let response = "```\n{\"task\": \"none\"}\n```";
        assert_eq!(extract_json_object(response).unwrap(), r#"{"task": "none"}"#);
    }

    #[test]
    fn test_nested_objects() {
        let response = r#"{"a": {"b": 1}, "c": "x"}"#;
        assert_eq!(extract_json_object(response).unwrap(), response);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let response = r#"{"question": "what does {x} mean?"}"#;
        assert_eq!(extract_json_object(response).unwrap(), response);
    }

    #[test]
    fn test_no_object() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("").is_none());
        assert!(extract_json_object("{unclosed").is_none());
    }
}
