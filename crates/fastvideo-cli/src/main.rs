//! fastvideo CLI - Video overlay inspector
//!
//! Features:
//! - Link classification and overlay/navigate checks
//! - Player surface descriptions
//! - History entry previews
//! - Analytics and promotions feed inspection

use clap::{Parser, Subcommand};
use fastvideo_core::OverlayConfig;

mod commands;
mod output;

/// fastvideo CLI - Video overlay toolkit
#[derive(Parser)]
#[command(name = "fastvideo")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Inspect how video links open as overlays", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    /// Locale path prefix ("", "/fr", "/jp", ...)
    #[arg(short, long, default_value = "", global = true)]
    locale: String,

    /// Feed request timeout in milliseconds
    #[arg(long, default_value = "10000", global = true)]
    timeout_ms: u64,

    /// Document title used for history entries
    #[arg(long, default_value = "Adobe Express", global = true)]
    document_title: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a video reference
    Classify {
        /// Alternate URLs of the same video
        #[arg(required = true)]
        urls: Vec<String>,

        /// Video title
        #[arg(short, long, default_value = "video")]
        title: String,
    },

    /// Check whether URLs open in an overlay
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Describe the player surface for a URL
    Surface {
        url: String,

        #[arg(short, long, default_value = "video")]
        title: String,

        /// Request autoplay
        #[arg(short, long)]
        autoplay: bool,
    },

    /// Preview the history entry pushed when a video opens
    History {
        url: String,

        #[arg(short, long, default_value = "video")]
        title: String,
    },

    /// Print the subtitle language for the locale
    Subtitle,

    /// Inspect the analytics feed of a site
    Analytics {
        /// Site origin, e.g. https://www.adobe.com
        origin: String,

        /// Page path to resolve against
        #[arg(long, requires = "src")]
        page: Option<String>,

        /// Media source to resolve
        #[arg(long, requires = "page")]
        src: Option<String>,
    },

    /// Inspect the promotions feed of a site
    Promotions {
        /// Site origin, e.g. https://www.adobe.com
        origin: String,

        /// Video URL to look up
        #[arg(long)]
        video: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    let config = OverlayConfig {
        locale_prefix: cli.locale.clone(),
        document_title: cli.document_title.clone(),
        request_timeout_ms: cli.timeout_ms,
        ..Default::default()
    };
    config.validate()?;

    match cli.command {
        Commands::Classify { urls, title } => {
            commands::classify_reference(urls, &title, &config, &cli.format)?;
        }
        Commands::Check { urls } => {
            commands::check(&urls, &cli.format)?;
        }
        Commands::Surface { url, title, autoplay } => {
            commands::surface(&url, &title, autoplay, &config, &cli.format)?;
        }
        Commands::History { url, title } => {
            commands::history(&url, &title, &config, &cli.format)?;
        }
        Commands::Subtitle => {
            commands::subtitle(&config)?;
        }
        Commands::Analytics { origin, page, src } => {
            commands::analytics(&origin, page.as_deref(), src.as_deref(), &config, &cli.format).await?;
        }
        Commands::Promotions { origin, video } => {
            commands::promotions(&origin, video.as_deref(), &config, &cli.format).await?;
        }
    }

    Ok(())
}
