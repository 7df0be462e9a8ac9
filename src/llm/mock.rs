//! Mock LLM client for testing.
//!
//! Returns deterministic responses based on input patterns, emulating the
//! SQL-expert protocol (```sql fences, TERMINATE keyword) well enough to
//! drive the agent loop without API calls.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client with canned, pattern-matched responses.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern, response), checked first.
    custom_responses: Vec<(String, String)>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        // Analyst phase: summarize in plain English.
        if input.contains("Query Results:") {
            return "Based on the query results, here is the answer to your question."
                .to_string();
        }

        // Tool output fed back by the proxy: claim the answer and terminate.
        if input.contains("Columns:") || input.contains("returned no rows") {
            return format!("{}\nTERMINATE", input.trim());
        }

        if (input_lower.contains("delete") || input_lower.contains("drop"))
            && !input_lower.contains("select")
        {
            return "User is not allowed to modify the database TERMINATE".to_string();
        }

        if input_lower.contains("how many films") || input_lower.contains("count films") {
            return "```sql\nSELECT COUNT(*) FROM film;\n```".to_string();
        }

        if input_lower.contains("actors") {
            return "```sql\nSELECT first_name, last_name FROM actor;\n```".to_string();
        }

        if input_lower.contains("weather") {
            return "I can only answer questions about the Sakila database TERMINATE".to_string();
        }

        "```sql\nSELECT 1;\n```".to_string()
    }

    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}
