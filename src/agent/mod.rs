//! Conversation orchestration.
//!
//! Drives the two-phase pipeline for each user question: a SQL expert loop
//! that emits queries through the guarded tool and terminates with a keyword,
//! followed by a single data analyst turn that restates the results in plain
//! English. The session owns a bounded conversation history that is injected
//! into both phases.

pub mod parser;
pub mod prompt;

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::db::DatabaseClient;
use crate::error::Result;
use crate::llm::{LlmClient, Message};
use crate::query;

/// Upper bound on SQL expert round-trips per question.
const MAX_EXPERT_TURNS: usize = 5;

/// Number of question/answer turns retained across the session.
const MAX_HISTORY: usize = 10;

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    /// The user's question, verbatim.
    pub user: String,
    /// The analyst's final answer.
    pub analyst: String,
}

/// A chat session over a single database.
///
/// Holds the LLM client, the database client used for tool calls, the
/// database profile captured at startup, and the rolling history.
pub struct Session {
    llm: Box<dyn LlmClient>,
    db: Box<dyn DatabaseClient>,
    profile: String,
    history: VecDeque<ConversationTurn>,
}

impl Session {
    /// Creates a session with a pre-built database profile.
    ///
    /// The profile may be a degraded error string; it is injected into the
    /// expert prompt either way.
    pub fn new(llm: Box<dyn LlmClient>, db: Box<dyn DatabaseClient>, profile: String) -> Self {
        Self {
            llm,
            db,
            profile,
            history: VecDeque::new(),
        }
    }

    /// Answers one user question and records the exchange in the history.
    ///
    /// Errors only on LLM transport failure; tool-call failures are rendered
    /// as strings and flow through the conversation instead.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let sql_results = self.run_expert_phase(question).await?;
        debug!(results = %sql_results, "expert phase complete");

        let final_answer = self.run_analyst_phase(question, &sql_results).await?;

        self.history.push_back(ConversationTurn {
            user: question.to_string(),
            analyst: final_answer.clone(),
        });
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        Ok(final_answer)
    }

    /// Runs the SQL expert loop: completion, SQL extraction, tool execution,
    /// result feedback. Returns the expert's summary of the results.
    async fn run_expert_phase(&mut self, question: &str) -> Result<String> {
        let mut messages = vec![
            Message::system(prompt::build_sql_expert_prompt(&self.profile)),
            Message::user(prompt::build_expert_message(&self.history, question)),
        ];

        let mut summary = String::new();

        for turn in 0..MAX_EXPERT_TURNS {
            let response = self.llm.complete(&messages).await?;
            let parsed = parser::parse_response(&response);
            messages.push(Message::assistant(response));

            if parsed.terminated {
                if !parsed.text.is_empty() {
                    summary = parsed.text;
                } else if let Some(sql) = parsed.sql {
                    // Terminated with only a fence; treat its content as the
                    // summary rather than executing it.
                    summary = sql;
                }
                debug!(turn, "expert terminated");
                break;
            }

            match parsed.sql {
                Some(sql) => {
                    info!(sql = %sql, "executing generated query");
                    let result =
                        query::execute_sql(self.db.as_ref(), &sql, query::DEFAULT_LIMIT).await;
                    summary = result.clone();
                    messages.push(Message::user(result));
                }
                None => {
                    // Plain text without a query or a terminator; nothing to
                    // feed back, so take it as the final word.
                    warn!(turn, "expert reply carried no query");
                    summary = parsed.text;
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Runs the single-turn data analyst phase.
    async fn run_analyst_phase(&mut self, question: &str, sql_results: &str) -> Result<String> {
        let messages = vec![
            Message::system(prompt::DATA_ANALYST_PROMPT.to_string()),
            Message::user(prompt::build_analyst_message(
                &self.history,
                question,
                sql_results,
            )),
        ];

        let response = self.llm.complete(&messages).await?;
        Ok(response.trim().to_string())
    }

    /// Number of turns currently held in the history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
