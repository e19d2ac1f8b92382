use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_downloader::cli::{Cli, Commands};
use transcript_downloader::config::Config;
use transcript_downloader::output;
use transcript_downloader::sink::FileSink;
use transcript_downloader::store::{InteractionStateStore, Notice};
use transcript_downloader::{HttpTranscriptApi, Session, TranscriptApi};

type CliSession = Session<HttpTranscriptApi, FileSink>;

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "transcript_downloader=debug"
    } else {
        "transcript_downloader=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Print the notice and turn an error notice into a failing exit status
fn finish(session: &CliSession) -> Result<()> {
    match session.notice() {
        Some(Notice::Error(msg)) => anyhow::bail!("{}", msg),
        Some(notice) => {
            output::print_notice(notice);
            Ok(())
        }
        None => Ok(()),
    }
}

/// Run the lazy discovery the language picker would trigger on focus
async fn discover_first(session: &mut CliSession, quiet: bool) -> Result<()> {
    let progress = output::spinner("Discovering transcript languages...", quiet);
    session.focus_language_control().await;
    progress.finish_and_clear();

    if let Some(Notice::Error(msg)) = session.notice() {
        anyhow::bail!("{}", msg);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = Config::load(cli.api_url.as_deref())?;
    tracing::debug!("Using transcript service at {}", config.api.base_url);

    let output_dir = |override_dir: Option<PathBuf>| {
        override_dir
            .or_else(|| config.defaults.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    };

    let new_session = |dir: PathBuf| -> Result<CliSession> {
        let api = HttpTranscriptApi::new(&config.api.base_url, config.timeout())?;
        Ok(Session::new(
            InteractionStateStore::new(config.store_defaults()),
            api,
            FileSink::new(dir),
        ))
    };

    match cli.command {
        Commands::Languages { url, json } => {
            let mut session = new_session(output_dir(None))?;
            session.set_reference(&url);

            let progress = output::spinner("Discovering transcript languages...", cli.quiet);
            let started = session.discover().await;
            progress.finish_and_clear();
            started?;

            if let Some(result) = session.store().languages() {
                if json {
                    output::print_json(result)?;
                } else {
                    print!("{}", output::render_languages(result));
                }
            }
            finish(&session)?;
        }
        Commands::Preview {
            url,
            language,
            discover,
            preserve_formatting,
            json,
        } => {
            let mut session = new_session(output_dir(None))?;
            session.set_reference(&url);
            if let Some(language) = &language {
                session.store_mut().select_language(language);
            }
            if preserve_formatting {
                session.store_mut().set_preserve_formatting(true);
            }
            if discover {
                discover_first(&mut session, cli.quiet).await?;
            }

            let progress = output::spinner("Fetching preview...", cli.quiet);
            let started = session.preview().await;
            progress.finish_and_clear();
            started?;

            if let Some(preview) = session.store().preview() {
                if json {
                    output::print_json(preview)?;
                } else {
                    print!("{}", output::render_preview(preview));
                }
            }
            finish(&session)?;
        }
        Commands::Download {
            url,
            languages,
            discover,
            format,
            no_timestamps,
            preserve_formatting,
            output_dir: dir,
        } => {
            let mut session = new_session(output_dir(dir))?;
            session.set_reference(&url);

            let store = session.store_mut();
            let mut requested = languages.iter();
            if let Some(first) = requested.next() {
                store.select_language(first);
            }
            for extra in requested {
                store.add_export_language(extra);
            }
            if let Some(format) = format {
                store.set_file_format(format);
            }
            if no_timestamps {
                store.set_include_timestamps(false);
            }
            if preserve_formatting {
                store.set_preserve_formatting(true);
            }

            if discover {
                discover_first(&mut session, cli.quiet).await?;
            }

            let progress = output::spinner("Downloading transcript...", cli.quiet);
            let started = session.export().await;
            progress.finish_and_clear();
            started?;

            if let Some(saved) = session.store().last_saved() {
                println!("{}", output::render_saved(saved));
            }
            finish(&session)?;
        }
        Commands::Health => {
            let api = HttpTranscriptApi::new(&config.api.base_url, config.timeout())?;
            let status = api.health().await?;
            match status.timestamp {
                Some(ts) => println!("{}: {} ({})", config.api.base_url, status.status, ts),
                None => println!("{}: {}", config.api.base_url, status.status),
            }
        }
        Commands::Config { show, init } => {
            if init {
                let path = Config::default().save()?;
                println!("Wrote default configuration to: {}", path.display());
            } else if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Use --show to print the current values or --init to create it.");
            }
        }
    }

    Ok(())
}
