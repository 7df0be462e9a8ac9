//! Prompt construction for the SQL expert and data analyst phases.
//!
//! Builds system prompts with database profile context and the per-question
//! opening messages that carry the conversation history.

use crate::agent::ConversationTurn;
use std::collections::VecDeque;

/// System prompt template for the SQL expert phase.
const SQL_EXPERT_TEMPLATE: &str = r#"You are an expert PostgreSQL SQL developer for the Sakila database.
Your task is to translate user questions into efficient and correct SQL queries.

For context, here is the complete profile of the database:
{profile}

RULES:
1. If the user requests data modification, reject it by exactly saying 'User is not allowed to modify the database' and add the keyword 'TERMINATE' to end the chat.
2. If the user question is not related to the Sakila database, respond with 'I can only answer questions about the Sakila database' and add the keyword 'TERMINATE' to end the chat.
3. To run a SQL query, return it wrapped in ```sql code blocks (the default row limit is 30). You will receive the query results in the next message. If there are multiple queries, execute them one by one.
4. If you get a satisfactory answer to the user's question, respond with the query result (not natural language) and keyword 'TERMINATE' to end the chat."#;

/// System prompt for the data analyst phase.
pub const DATA_ANALYST_PROMPT: &str = r#"You are a data analyst. You receive SQL query results and provide a short, clear answer to the user's question.

Do not request tools or generate SQL queries.
Only interpret the results in plain English.
If the question is not about the data, respond with 'I can only answer questions about the database.'
There is a cap on how many rows can be returned from SQL queries (100), so if the row count is really big, show the 100 rows."#;

/// Builds the SQL expert system prompt with the database profile injected.
pub fn build_sql_expert_prompt(profile: &str) -> String {
    SQL_EXPERT_TEMPLATE.replace("{profile}", profile)
}

/// Formats the conversation history for prompt injection.
///
/// Returns `<no prior conversation>` when the history is empty.
pub fn format_history(history: &VecDeque<ConversationTurn>) -> String {
    if history.is_empty() {
        return "<no prior conversation>".to_string();
    }

    let mut text = String::new();
    for turn in history {
        text.push_str(&format!("User: {}\n", turn.user));
        text.push_str(&format!("Analyst: {}\n\n", turn.analyst));
    }
    text
}

/// Builds the opening message for the SQL expert phase.
pub fn build_expert_message(history: &VecDeque<ConversationTurn>, question: &str) -> String {
    format!(
        "You are continuing an ongoing conversation.\n\
         Conversation so far:\n\
         {}\n\n\
         New user question:\n\
         {}",
        format_history(history),
        question
    )
}

/// Builds the opening message for the data analyst phase.
pub fn build_analyst_message(
    history: &VecDeque<ConversationTurn>,
    question: &str,
    sql_results: &str,
) -> String {
    format!(
        "You are continuing an ongoing conversation.\n\
         Conversation so far:\n\
         {}\n\n\
         Based on the following SQL query results, answer:\n\
         User asked: '{}'\n\
         Query Results: {}",
        format_history(history),
        question,
        sql_results
    )
}
