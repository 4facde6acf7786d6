//! svedocs CLI - documentation site generator with file-based routing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "svedocs")]
#[command(about = "Documentation site generator with file-based routing")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new documentation project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        cwd: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Start development server with live reload
    Dev {
        /// Project directory
        #[arg(default_value = ".")]
        cwd: PathBuf,

        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to config)
        #[arg(long)]
        host: Option<String>,

        /// Open the browser
        #[arg(long)]
        open: bool,
    },

    /// Build static documentation site
    Build {
        /// Project directory
        #[arg(default_value = ".")]
        cwd: PathBuf,

        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Preview the built site
    Serve {
        /// Project directory
        #[arg(default_value = ".")]
        cwd: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "4173")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { cwd, yes } => {
            commands::init::run(&cwd, yes)?;
        }
        Commands::Dev {
            cwd,
            port,
            host,
            open,
        } => {
            commands::dev::run(&cwd, port, host, open).await?;
        }
        Commands::Build {
            cwd,
            out_dir,
            no_minify,
        } => {
            commands::build::run(&cwd, out_dir, !no_minify)?;
        }
        Commands::Serve { cwd, port } => {
            commands::serve::run(&cwd, port).await?;
        }
    }

    Ok(())
}
