//! Shared plumbing for the commands that call the model, plus `transcribe`
//! and `refine`.

use super::open_app;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use gemini_agent::GeminiClient;
use nexus_core::app::App;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Run one async model call on a fresh runtime.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    Ok(rt.block_on(fut))
}

pub fn client(app: &App) -> anyhow::Result<GeminiClient> {
    GeminiClient::from_config(&app.config().ai).context("AI features need an API key")
}

/// MIME type for an audio file, from its extension.
pub fn audio_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("aac") => "audio/aac",
        _ => "audio/webm",
    }
}

pub fn read_audio(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read audio file {}", path.display()))
}

#[derive(Args)]
pub struct TranscribeArgs {
    /// Audio recording to transcribe
    pub file: PathBuf,
    /// Spoken language
    #[arg(long, default_value = "English")]
    pub language: String,
    /// Override the MIME type guessed from the file extension
    #[arg(long)]
    pub mime: Option<String>,
    /// Run the transcript through a grammar and clarity pass
    #[arg(long)]
    pub refine: bool,
}

pub fn transcribe(root: &Path, args: TranscribeArgs, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    app.require_user()?;
    let client = client(&app)?;
    let audio = read_audio(&args.file)?;
    let mime = args
        .mime
        .unwrap_or_else(|| audio_mime(&args.file).to_string());

    let text = block_on(client.transcribe(&audio, &mime, &args.language))?
        .context("transcription failed")?;
    let text = if args.refine && !text.is_empty() {
        block_on(client.refine_text(&text))?
    } else {
        text
    };

    if json {
        print_json(&serde_json::json!({ "text": text }))?;
    } else {
        println!("{text}");
    }
    Ok(())
}

pub fn refine(root: &Path, text: &str, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    app.require_user()?;
    let client = client(&app)?;
    let refined = block_on(client.refine_text(text))?;
    if json {
        print_json(&serde_json::json!({ "original": text, "refined": refined }))?;
    } else {
        println!("{refined}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(audio_mime(Path::new("memo.MP3")), "audio/mpeg");
        assert_eq!(audio_mime(Path::new("note.wav")), "audio/wav");
        assert_eq!(audio_mime(Path::new("recording")), "audio/webm");
    }
}
