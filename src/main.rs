//! Sakila Chat - a natural-language assistant for the Sakila database.

use std::io::Write;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sakila_chat::agent::Session;
use sakila_chat::cli::Cli;
use sakila_chat::config::Config;
use sakila_chat::db::{DatabaseClient, MockDatabaseClient, PostgresClient};
use sakila_chat::error::{ChatError, Result};
use sakila_chat::llm;

const BANNER: &str = r#"
╔════════════════════════════════════════════════════════════╗
║         Sakila Database AI Chat Assistant                  ║
╚════════════════════════════════════════════════════════════╝
Ask questions about the film Sakila PostgreSQL database.
Type 'exit' or 'quit' or 'q' to end the chat.
"#;

#[tokio::main]
async fn main() {
    // .env is optional; real environment variables win.
    dotenvy::dotenv().ok();

    // Logs go to stderr so the chat transcript on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(provider) = &cli.llm {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }

    let db = build_database_client(&cli, &config)?;

    // Snapshot the database profile once at startup. A failure degrades to an
    // embedded error string rather than aborting the session.
    info!("Building database profile snapshot");
    let profile = db.database_profile().await;
    if profile.starts_with("Error generating database profile") {
        error!("{profile}");
    }

    let llm_client = llm::build_client(&config.llm)?;
    let mut session = Session::new(llm_client, db, profile);

    println!("{BANNER}");

    let stdin = std::io::stdin();
    loop {
        print!("\nYour question (type 'q' to exit): ");
        std::io::stdout()
            .flush()
            .map_err(|e| ChatError::internal(e.to_string()))?;

        let mut line = String::new();
        let bytes = stdin
            .read_line(&mut line)
            .map_err(|e| ChatError::internal(e.to_string()))?;
        if bytes == 0 {
            // EOF (closed stdin or Ctrl-D).
            println!("\nGoodbye!");
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
            println!("Goodbye!");
            break;
        }

        match session.ask(input).await {
            Ok(answer) => println!("Answer: {answer}"),
            Err(e) => {
                error!("{}: {}", e.category(), e);
                println!("Error: {e}");
            }
        }
    }

    Ok(())
}

/// Builds the database client from CLI flags and configuration.
fn build_database_client(cli: &Cli, config: &Config) -> Result<Box<dyn DatabaseClient>> {
    if cli.mock_db {
        info!("Using mock database");
        return Ok(Box::new(MockDatabaseClient::new()));
    }

    // Precedence: CLI arguments, then config file, then environment.
    let mut connection = match cli.to_connection_config()? {
        Some(conn) => conn,
        None => config.connection.clone(),
    };
    connection.apply_env_defaults();

    if connection.database.is_none() {
        return Err(ChatError::config(
            "No database configured. Pass a connection string, use -d/--database, \
             or set PGDATABASE. See --help for details.",
        ));
    }

    info!("Connection: {}", connection.display_string());
    Ok(Box::new(PostgresClient::new(connection)))
}
