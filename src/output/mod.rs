use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::api::{DiscoveryResult, PreviewResult};
use crate::services::export::SavedArtifact;
use crate::store::Notice;
use crate::utils::{format_file_size, format_timestamp};

/// Spinner shown while a request is in flight; hidden in quiet mode
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        progress.set_style(template);
    }
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Print the store's notice; errors go to stderr
pub fn print_notice(notice: &Notice) {
    match notice {
        Notice::Error(msg) => eprintln!("{} {}", style("Error:").red().bold(), msg),
        Notice::Success(msg) => eprintln!("{} {}", style("Done:").green().bold(), msg),
    }
}

pub fn render_languages(result: &DiscoveryResult) -> String {
    if result.is_empty() {
        return format!("No transcripts available for {}", result.reference());
    }

    let mut out = format!("Available transcripts for {}:\n", result.reference());
    for descriptor in result.iter() {
        let kind = if descriptor.is_generated {
            "auto-generated"
        } else {
            "manual"
        };
        out.push_str(&format!(
            "  {:<8} {} ({})",
            descriptor.language_code, descriptor.language, kind
        ));
        if descriptor.is_translatable() {
            out.push_str(&format!(
                ", translatable into {} languages",
                descriptor.translation_count()
            ));
        }
        out.push('\n');
    }
    out
}

pub fn render_preview(preview: &PreviewResult) -> String {
    let mut out = String::new();

    if let Some(video_id) = &preview.video_id {
        out.push_str(&format!("Video ID: {}\n", video_id));
    }
    match &preview.language_code {
        Some(code) => out.push_str(&format!("Language: {} ({})\n", preview.language, code)),
        None => out.push_str(&format!("Language: {}\n", preview.language)),
    }
    if let Some(generated) = preview.is_generated {
        out.push_str(&format!("Auto-generated: {}\n", if generated { "yes" } else { "no" }));
    }

    if preview.is_truncated() {
        out.push_str(&format!(
            "Snippets: showing {} of {}\n\n",
            preview.snippets.len(),
            preview.total_snippets
        ));
    } else {
        out.push_str(&format!("Snippets: {}\n\n", preview.total_snippets));
    }

    for snippet in &preview.snippets {
        out.push_str(&format!("[{}] {}\n", format_timestamp(snippet.start), snippet.text));
    }
    out
}

pub fn render_saved(saved: &SavedArtifact) -> String {
    format!(
        "Saved {} ({})",
        saved.path.display(),
        format_file_size(saved.size)
    )
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
