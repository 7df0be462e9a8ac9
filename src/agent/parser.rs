//! Response parsing for assistant outputs.
//!
//! Extracts SQL from responses that may contain markdown code blocks and
//! detects the termination marker the SQL expert emits when it is done.

/// Marker the SQL expert appends when the conversation should end.
pub const TERMINATE_MARKER: &str = "TERMINATE";

/// Result of parsing an assistant response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Any explanatory text before or after the SQL, marker removed.
    pub text: String,
    /// Extracted SQL query, if found.
    pub sql: Option<String>,
    /// Whether the response carried the termination marker.
    pub terminated: bool,
}

impl ParsedResponse {
    fn text_only(text: impl Into<String>, terminated: bool) -> Self {
        Self {
            text: text.into(),
            sql: None,
            terminated,
        }
    }

    fn with_sql(text: impl Into<String>, sql: impl Into<String>, terminated: bool) -> Self {
        Self {
            text: text.into(),
            sql: Some(sql.into()),
            terminated,
        }
    }
}

/// Parses an assistant response, extracting SQL from markdown code blocks.
///
/// Looks for SQL in the following formats:
/// - ```sql ... ```
/// - ``` ... ``` (no language specified)
///
/// If multiple code blocks are found, uses the first one. If no code block
/// is found, returns the full text with no SQL.
pub fn parse_response(response: &str) -> ParsedResponse {
    let terminated = is_termination(response);
    let response = strip_marker(response);

    if let Some(sql) = extract_code_block(&response, "sql") {
        let text = remove_code_block(&response, "sql");
        return ParsedResponse::with_sql(text.trim(), sql.trim(), terminated);
    }

    if let Some(sql) = extract_code_block(&response, "") {
        let text = remove_code_block(&response, "");
        return ParsedResponse::with_sql(text.trim(), sql.trim(), terminated);
    }

    ParsedResponse::text_only(response.trim(), terminated)
}

/// Returns true if the response carries the termination marker anywhere.
pub fn is_termination(response: &str) -> bool {
    response.contains(TERMINATE_MARKER)
}

/// Removes a trailing termination marker, leaving the rest of the text intact.
fn strip_marker(response: &str) -> String {
    let trimmed = response.trim_end();
    match trimmed.strip_suffix(TERMINATE_MARKER) {
        Some(rest) => rest.trim_end().to_string(),
        None => response.to_string(),
    }
}

/// Extracts content from a markdown code block with the specified language.
///
/// Pass an empty string for `lang` to match blocks without a language
/// specifier.
fn extract_code_block(text: &str, lang: &str) -> Option<String> {
    let start_pattern = if lang.is_empty() {
        "```".to_string()
    } else {
        format!("```{}", lang)
    };

    // Find the start of the code block
    let start_idx = text.find(&start_pattern)?;

    // Find the newline after the opening fence
    let content_start = text[start_idx + start_pattern.len()..]
        .find('\n')
        .map(|i| start_idx + start_pattern.len() + i + 1)?;

    // For generic blocks, make sure it's not actually a language-specific block
    if lang.is_empty() {
        let after_fence = &text[start_idx + 3..content_start - 1];
        if !after_fence.trim().is_empty() {
            return None;
        }
    }

    // Find the closing fence
    let end_idx = text[content_start..].find("```")?;

    Some(text[content_start..content_start + end_idx].to_string())
}

/// Removes the first code block from the text, returning the remaining text.
fn remove_code_block(text: &str, lang: &str) -> String {
    let start_pattern = if lang.is_empty() {
        "```".to_string()
    } else {
        format!("```{}", lang)
    };

    let Some(start_idx) = text.find(&start_pattern) else {
        return text.to_string();
    };

    // For generic blocks, verify it's not a language-specific block
    if lang.is_empty() {
        let after_fence_start = start_idx + 3;
        if let Some(newline_idx) = text[after_fence_start..].find('\n') {
            let after_fence = &text[after_fence_start..after_fence_start + newline_idx];
            if !after_fence.trim().is_empty() {
                return text.to_string();
            }
        }
    }

    let content_start = text[start_idx + start_pattern.len()..]
        .find('\n')
        .map(|i| start_idx + start_pattern.len() + i + 1);

    let Some(content_start) = content_start else {
        return text.to_string();
    };

    let Some(end_offset) = text[content_start..].find("```") else {
        return text.to_string();
    };

    let end_idx = content_start + end_offset + 3;

    let before = &text[..start_idx];
    let after = &text[end_idx..];

    format!("{}{}", before.trim_end(), after.trim_start())
}
