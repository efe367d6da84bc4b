//! Command-line interface for advisor-rs

use advisor_core::{Portfolio, Position};
use advisor_server::{AppState, ServerConfig};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "AI stock analysis advisor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },
    /// Run one analysis and print the result as JSON
    Analyze {
        /// Ticker symbol
        symbol: String,

        /// Label recorded with the result
        #[arg(short = 't', long, default_value = "comprehensive")]
        analysis_type: String,

        /// Shares held, enables the portfolio dimension
        #[arg(long, requires = "avg_cost")]
        shares: Option<f64>,

        /// Average acquisition cost per share
        #[arg(long, requires = "shares")]
        avg_cost: Option<f64>,

        /// Total portfolio value
        #[arg(long, default_value_t = 0.0)]
        total_value: f64,
    },
    /// Ask a follow-up question about a symbol
    Chat {
        /// Ticker symbol
        symbol: String,

        /// The question to ask
        question: String,
    },
}

/// Build a single-position portfolio from the analyze flags
fn portfolio_from_flags(
    symbol: &str,
    shares: Option<f64>,
    avg_cost: Option<f64>,
    total_value: f64,
) -> Option<Portfolio> {
    let (shares, avg_cost) = shares.zip(avg_cost)?;
    let mut portfolio = Portfolio {
        total_value,
        ..Portfolio::default()
    };
    portfolio
        .positions
        .insert(symbol.to_uppercase(), Position { shares, avg_cost });
    Some(portfolio)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    advisor_utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            let mut config = ServerConfig::from_env();
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(host) = host {
                config = config.with_host(host);
            }
            advisor_server::run(config).await?;
        }
        Commands::Analyze {
            symbol,
            analysis_type,
            shares,
            avg_cost,
            total_value,
        } => {
            let portfolio = portfolio_from_flags(&symbol, shares, avg_cost, total_value);
            let state = AppState::from_env(&ServerConfig::from_env());
            info!(
                strategy = state.service.strategy_name(),
                %symbol,
                "running one-shot analysis"
            );
            let result = state
                .service
                .analyze(&symbol, &analysis_type, portfolio)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Chat { symbol, question } => {
            let state = AppState::from_env(&ServerConfig::from_env());
            let exchange = state.service.chat(&symbol, &question, None).await?;
            println!("{}", exchange.reply.content);
        }
    }

    Ok(())
}
