use anyhow::Result;
use askr::app::TuiApp;
use askr::config::Config;
use askr::qa::{AskBackend, QaClient};
use askr::logging;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "askr")]
#[command(version)]
#[command(about = "Chat with a question-answering endpoint from your terminal", long_about = None)]
struct Cli {
    /// Endpoint to send prompts to (overrides config and ASKR_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the answer
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write it to ~/.askr/config.toml as well
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(endpoint) = cli.endpoint {
        config.apply_endpoint_override(endpoint);
    }

    match cli.command {
        None => {
            logging::init_file(&config.log_path())?;
            let backend: Arc<dyn AskBackend> = Arc::new(QaClient::new(&config)?);
            let mut app = TuiApp::new(&config, backend)?;
            app.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ask { prompt }) => {
            logging::init_stderr();
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                return Ok(ExitCode::SUCCESS);
            }

            let client = QaClient::new(&config)?;
            match client.ask(prompt.trim()).await {
                Ok(answer) => {
                    println!("{}", answer);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("❌ {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Some(Commands::Config { init }) => {
            logging::init_stderr();
            if init {
                config.save()?;
                eprintln!("📝 Wrote {}", config.askr_home.join("config.toml").display());
            }
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
