//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "multilogue")]
#[command(version)]
#[command(about = "Dialogue transcript converter and chat-completion runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Convert a transcript between representations
    Convert {
        /// Input file ("-" reads stdin)
        #[arg(value_name = "INPUT", default_value = "-")]
        input: String,

        /// Target representation: text, html, cmj, muj, or mpuj
        #[arg(long, value_name = "FORMAT")]
        to: String,

        /// Source representation (text or html); inferred from the input
        /// file extension when omitted
        #[arg(long, value_name = "FORMAT")]
        from: Option<String>,

        /// Assistant name for role assignment (cmj/muj/mpuj targets)
        #[arg(long, value_name = "NAME")]
        assistant: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Config file consulted for the assistant name
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send the transcript for one machine turn and update it in place
    Run {
        /// Transcript file, rewritten with the machine's reply appended
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Override the sampling temperature
        #[arg(long)]
        temperature: Option<f64>,

        /// Override the maximum output token budget
        #[arg(long, value_name = "N")]
        max_output_tokens: Option<u32>,

        /// Override the reasoning effort (low, medium, high)
        #[arg(long, value_name = "LEVEL")]
        effort: Option<String>,

        /// Write the normalized reasoning summary to this file
        #[arg(long, value_name = "PATH")]
        thoughts: Option<PathBuf>,

        /// Config file path
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Write a commented config template
    Init {
        /// Config file path (default location when omitted)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Show {
        /// Config file path (default location when omitted)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            to,
            from,
            assistant,
            output,
            config,
        } => commands::convert::run(commands::convert::ConvertOptions {
            input: &input,
            to: &to,
            from: from.as_deref(),
            assistant: assistant.as_deref(),
            output: output.as_deref(),
            config: config.as_deref(),
        }),
        Commands::Run {
            file,
            model,
            temperature,
            max_output_tokens,
            effort,
            thoughts,
            config,
        } => {
            commands::run::run(commands::run::RunOptions {
                file: &file,
                model: model.as_deref(),
                temperature,
                max_output_tokens,
                effort: effort.as_deref(),
                thoughts: thoughts.as_deref(),
                config: config.as_deref(),
            })
            .await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { config } => commands::config::init(config.as_deref()),
            ConfigCommands::Show { config } => commands::config::show(config.as_deref()),
        },
    }
}
