//! CLI for the VDM media download manager.

mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vdm_core::config;
use vdm_core::extractor::ytdlp::YtDlpExtractor;
use vdm_core::job_store::{JobStore, MediaFormat};
use vdm_core::scheduler::Scheduler;

use commands::{run_download, run_export, run_file, run_status};

/// Top-level CLI for the VDM media download manager.
#[derive(Debug, Parser)]
#[command(name = "vdm")]
#[command(about = "VDM: media download manager driven by yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit one or more media URLs and run the downloads to completion.
    Download {
        /// Media page URLs (one job per valid URL).
        #[arg(required = true)]
        urls: Vec<String>,

        /// Quality selector: "best", "worst", or a height ceiling like "720p".
        #[arg(long, default_value = "best")]
        quality: String,

        /// Output format: mp4, mp3, webm, or avi.
        #[arg(long, default_value = "mp4")]
        format: String,
    },

    /// Show active jobs and recent completions.
    Status,

    /// Print every job as JSON for programmatic use.
    Export,

    /// Print the artifact path of a completed job.
    File {
        /// Job identifier.
        id: i64,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = JobStore::open_default().await?;
        let extractor = Arc::new(YtDlpExtractor::from_config(&cfg));
        let scheduler = Scheduler::new(store, extractor, cfg);

        match cli.command {
            CliCommand::Download {
                urls,
                quality,
                format,
            } => {
                let format = MediaFormat::parse(&format)
                    .ok_or_else(|| anyhow::anyhow!("unsupported format: {format}"))?;
                run_download(&scheduler, &urls, &quality, format).await?;
            }
            CliCommand::Status => run_status(&scheduler).await?,
            CliCommand::Export => run_export(&scheduler).await?,
            CliCommand::File { id } => run_file(&scheduler, id).await?,
        }

        Ok(())
    }
}
