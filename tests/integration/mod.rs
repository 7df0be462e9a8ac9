//! Integration tests for Sakila Chat.

pub mod live_db_test;
pub mod pipeline_test;
pub mod session_test;
