use askweb::Result;
use askweb::commands::{ask, serve, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "askweb")]
#[command(about = "Web-grounded question answering over retrieval-augmented generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP answering service
    Serve {
        /// Port to listen on (overrides ASKWEB_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer a single question from the command line
    Ask {
        /// Natural-language question to answer
        question: String,
        /// Search query used to gather context (defaults to the question)
        #[arg(long)]
        query: Option<String>,
    },
    /// Show the resolved configuration with credentials redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => serve(port).await?,
        Commands::Ask { question, query } => {
            let query = query.unwrap_or_else(|| question.clone());
            ask(question, query).await?;
        }
        Commands::Config => show_config()?,
    }

    Ok(())
}
