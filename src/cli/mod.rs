use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::FileFormat;

#[derive(Parser)]
#[command(
    name = "transcript-dl",
    about = "Transcript Downloader - List, preview and export YouTube transcripts",
    version,
    long_about = "A CLI client for a YouTube transcript service. Discovers the transcript languages a video offers, previews transcript text and exports transcripts as TXT, PDF or DOCX files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the transcript service
    #[arg(long, global = true, env = "TRANSCRIPT_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the transcript languages available for a video
    Languages {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        url: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the first snippets of a transcript
    Preview {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        url: String,

        /// Transcript language code (config default if not specified)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Discover available languages first and fall back to the first one
        #[arg(long)]
        discover: bool,

        /// Keep HTML formatting tags in the text
        #[arg(long)]
        preserve_formatting: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a transcript as a file
    Download {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        url: String,

        /// Language codes in priority order (repeatable)
        #[arg(short, long = "language", value_name = "LANG")]
        languages: Vec<String>,

        /// Discover available languages first and fall back to the first one
        #[arg(long)]
        discover: bool,

        /// File format
        #[arg(short, long, value_enum)]
        format: Option<FileFormat>,

        /// Leave timestamps out of the exported text
        #[arg(long)]
        no_timestamps: bool,

        /// Keep HTML formatting tags in the text
        #[arg(long)]
        preserve_formatting: bool,

        /// Directory to save the file in
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Check that the transcript service is reachable
    Health,

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write a config file with default values
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_languages_repeatable() {
        let cli = Cli::try_parse_from([
            "transcript-dl",
            "download",
            "abc123",
            "-l",
            "th",
            "--language",
            "en",
            "-f",
            "docx",
            "--no-timestamps",
        ])
        .unwrap();

        match cli.command {
            Commands::Download {
                languages,
                format,
                no_timestamps,
                ..
            } => {
                assert_eq!(languages, vec!["th", "en"]);
                assert_eq!(format, Some(FileFormat::Docx));
                assert!(no_timestamps);
            }
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["transcript-dl", "download", "abc123", "-f", "odt"]).is_err());
    }
}
