use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubescribe::batch::{
    BatchOrchestrator, BatchResult, ConsoleProgress, NoopSink, ProgressSink, Selection,
};
use tubescribe::cli::{Cli, Commands};
use tubescribe::config::Config;
use tubescribe::extractors::youtube::YtDlp;
use tubescribe::extractors::{PlaylistResolver, Video, YtDlpPlaylistSource};
use tubescribe::output::validate_output_dir;
use tubescribe::transcribe::processor::YoutubeTranscriptSource;
use tubescribe::transcribe::TranscriptFetcher;
use tubescribe::utils::{self, truncate_title};
use tubescribe::ScribeError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "tubescribe=debug" } else { "tubescribe=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Load { url } => {
            let ytdlp = YtDlp::new(&config.app.yt_dlp_path);
            warn_missing_dependencies(&ytdlp).await;

            let videos = load_playlist(&config, ytdlp, &url, cli.quiet).await?;

            println!("Found {} videos in playlist:\n", videos.len());
            for (i, video) in videos.iter().enumerate() {
                println!("{:3}. {}", i + 1, truncate_title(&video.title, 70));
            }
        }
        Commands::Fetch {
            url,
            output,
            select,
            exclude,
            languages,
        } => {
            let output_dir = output
                .or_else(|| config.app.default_output_dir.clone())
                .unwrap_or_default();
            validate_output_dir(&output_dir)?;

            let config = match languages {
                Some(languages) => config.with_languages(&languages)?,
                None => config,
            };

            let ytdlp = YtDlp::new(&config.app.yt_dlp_path);
            warn_missing_dependencies(&ytdlp).await;

            let videos = load_playlist(&config, ytdlp.clone(), &url, cli.quiet).await?;
            let total = videos.len();
            let mut selection = Selection::new(videos);
            selection.apply(select.as_deref(), exclude.as_deref())?;
            if selection.selected_count() == 0 {
                return Err(ScribeError::EmptySelection.into());
            }

            let source = YoutubeTranscriptSource::new(ytdlp, &config.transcripts)?;
            let fetcher = TranscriptFetcher::new(
                Arc::new(source),
                config.transcripts.preferred_languages.clone(),
            );
            let orchestrator = BatchOrchestrator::new(fetcher, config.retry_policy())
                .with_reset_delay(config.progress_reset_delay());

            let sink: Arc<dyn ProgressSink> = if cli.quiet {
                Arc::new(NoopSink)
            } else {
                Arc::new(ConsoleProgress::new())
            };

            tracing::info!(
                "Fetching {} of {} videos into {}",
                selection.selected_count(),
                total,
                output_dir.display()
            );

            let result = orchestrator
                .run(selection.snapshot(), &output_dir, sink)
                .await?;

            print_summary(&result);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration file:");
                println!("  {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

async fn warn_missing_dependencies(ytdlp: &YtDlp) {
    // Non-fatal: the tool may still be found at run time
    let missing_deps = utils::check_dependencies(ytdlp).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   Install it: https://github.com/yt-dlp/yt-dlp");
    }
}

async fn load_playlist(
    config: &Config,
    ytdlp: YtDlp,
    url: &str,
    quiet: bool,
) -> Result<Vec<Video>> {
    let resolver = PlaylistResolver::new(
        Arc::new(YtDlpPlaylistSource::new(ytdlp)),
        config.playlist.max_entries,
    );

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message("Loading playlist...");
    progress.enable_steady_tick(Duration::from_millis(120));

    let result = resolver.resolve(url).await;
    match &result {
        Ok(videos) => {
            progress.finish_with_message(format!("Loaded {} videos from playlist", videos.len()))
        }
        Err(_) => progress.finish_and_clear(),
    }
    result
}

fn print_summary(result: &BatchResult) {
    println!();
    if result.failed == 0 {
        println!("{}", style(result.status_line()).green().bold());
    } else {
        println!("{}", style(result.status_line()).yellow().bold());
    }
    println!("{}", result.summary());
}
