use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sql_assistant::{logging, web, Assistant, AssistantConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "sql-assistant")]
#[command(about = "Ask questions about a SQLite database in natural language")]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Flags that take precedence over the environment
#[derive(Args)]
struct Overrides {
    /// SQLite database file (or set DATABASE_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Model identifier (or set LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Chat-completions base URL (or set LLM_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Address the form listens on (or set ASSISTANT_ADDR)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Only run single read-only queries
    #[arg(long, global = true)]
    read_only: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question and print the answer and the SQL used
    Ask {
        /// The question in natural language
        question: String,
    },
    /// Print the schema description the model is given
    Schema,
    /// Serve the question form
    Serve,
}

impl Overrides {
    fn apply(self, config: &mut AssistantConfig) {
        if let Some(db) = self.db {
            config.database_path = db;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(addr) = self.addr {
            config.listen_addr = addr;
        }
        if self.read_only {
            config.read_only = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = AssistantConfig::from_env()?;
    cli.overrides.apply(&mut config);

    match cli.command {
        Command::Ask { question } => {
            let assistant = Assistant::from_config(&config);
            let outcome = assistant.run(&question).await?;
            println!("{}", outcome.answer);
            println!("\n--- SQL ---\n{}", outcome.sql);
        }
        Command::Schema => {
            let assistant = Assistant::from_config(&config);
            let db = assistant.database();
            let schema = db
                .introspect()
                .with_context(|| format!("reading schema of {}", db.path().display()))?;
            print!("{}", schema.describe());
        }
        Command::Serve => {
            let assistant = Assistant::from_config(&config);
            let listener = TcpListener::bind(&config.listen_addr)
                .await
                .with_context(|| format!("binding {}", config.listen_addr))?;
            web::serve(listener, &assistant).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_before_or_after_subcommand() {
        for args in [
            vec!["sql-assistant", "--addr", "0.0.0.0:9000", "--read-only", "serve"],
            vec!["sql-assistant", "serve", "--addr", "0.0.0.0:9000", "--read-only"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(matches!(cli.command, Command::Serve));

            let mut config = AssistantConfig::default();
            cli.overrides.apply(&mut config);
            assert_eq!(config.listen_addr, "0.0.0.0:9000");
            assert!(config.read_only);
        }
    }

    #[test]
    fn test_addr_applies_to_other_commands() {
        let args = ["sql-assistant", "ask", "How many?", "--addr", "127.0.0.1:1"];
        let cli = Cli::try_parse_from(args).unwrap();
        let mut config = AssistantConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.listen_addr, "127.0.0.1:1");
        assert!(!config.read_only);
    }
}
