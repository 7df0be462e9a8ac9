//! Sakila Chat - a natural-language assistant for the Sakila database.
//!
//! This library exposes the core modules for use in integration tests.

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod query;
pub mod safety;
