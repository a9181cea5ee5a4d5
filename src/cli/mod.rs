use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tubescribe",
    about = "TubeScribe - Download YouTube playlist transcripts as timestamped markdown",
    version,
    long_about = "Resolve a YouTube playlist, pick videos, and save each transcript as a markdown file with MM:SS timestamps. Preferred languages are tried in order before falling back to the first available transcript."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the videos of a playlist
    Load {
        /// Playlist URL (youtube.com or youtu.be with a `list` parameter)
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Download transcripts for all or selected videos of a playlist
    Fetch {
        /// Playlist URL (youtube.com or youtu.be with a `list` parameter)
        #[arg(value_name = "URL")]
        url: String,

        /// Directory the markdown files are written to
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Only fetch these video numbers, e.g. `1,3,5-7` (default: all)
        #[arg(short, long, value_name = "NUMBERS")]
        select: Option<String>,

        /// Skip these video numbers, e.g. `2,4-6`
        #[arg(short, long, value_name = "NUMBERS")]
        exclude: Option<String>,

        /// Preferred transcript languages in order, e.g. `hi,en`
        #[arg(short, long, value_name = "LANGS", value_delimiter = ',')]
        languages: Option<Vec<String>>,
    },

    /// Show or locate the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::parse_from([
            "tubescribe",
            "fetch",
            "https://www.youtube.com/playlist?list=PL1",
            "-o",
            "/tmp/out",
            "--select",
            "1-3",
            "--languages",
            "en,hi",
        ]);

        match cli.command {
            Commands::Fetch {
                output,
                select,
                exclude,
                languages,
                ..
            } => {
                assert_eq!(output, Some(PathBuf::from("/tmp/out")));
                assert_eq!(select.as_deref(), Some("1-3"));
                assert!(exclude.is_none());
                assert_eq!(languages, Some(vec!["en".to_string(), "hi".to_string()]));
            }
            _ => panic!("expected fetch command"),
        }
    }
}
