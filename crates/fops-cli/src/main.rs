use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fops")]
#[command(about = "Field-ops order-stage workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the stage requirement for (kind, stage, status)
    Resolve {
        /// delivery | pickup | task
        #[arg(long)]
        kind: String,

        /// Current stage, e.g. open, picking, picked, in_progress
        #[arg(long)]
        stage: String,

        /// Backend order status, e.g. OPEN, REQUESTED
        #[arg(long)]
        status: String,
    },

    /// Validate and build a transition payload without submitting it
    Preview {
        #[command(flatten)]
        input: commands::TransitionInput,
    },

    /// Submit a stage transition to the backend
    Transition {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[command(flatten)]
        input: commands::TransitionInput,

        /// File to upload before submitting (skipped if the form already has a URL)
        #[arg(long)]
        attach: Option<String>,

        /// MIME type of --attach
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,

        /// Submit even when the order has no active line items
        #[arg(long, default_value_t = false)]
        confirm_empty: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience); production injects env vars.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = fops_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Resolve {
            kind,
            stage,
            status,
        } => commands::resolve(&kind, &stage, &status)?,

        Commands::Preview { input } => commands::preview(&input)?,

        Commands::Transition {
            config_paths,
            input,
            attach,
            content_type,
            confirm_empty,
        } => {
            let opts = commands::TransitionOptions {
                attach,
                content_type,
                confirm_empty,
            };
            commands::transition(&config_paths, &input, &opts).await?;
        }
    }

    Ok(())
}
