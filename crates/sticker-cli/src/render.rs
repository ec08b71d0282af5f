use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde_json::json;
use sticker_contracts::session::PreviewSession;
use sticker_engine::encoder::extension_for_mime;
use sticker_engine::{GeneratedPreview, PreviewEngine};

pub struct PreviewFiles {
    pub image_path: PathBuf,
    pub html_path: PathBuf,
}

/// Writes the decoded preview image and a page that displays the session's
/// `data:` URI. `preview.html` is overwritten on every success.
pub fn write_preview(
    out_dir: &Path,
    preview: &GeneratedPreview,
    session: &PreviewSession,
    engine: &PreviewEngine,
) -> Result<PreviewFiles> {
    let data_url = session
        .status()
        .data_url()
        .context("session has no preview to display")?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let image_path = out_dir.join(format!(
        "preview-{stamp}.{}",
        extension_for_mime(&preview.image.mime)
    ));
    let bytes = BASE64
        .decode(preview.image.b64.as_bytes())
        .context("preview base64 decode failed")?;
    fs::write(&image_path, bytes)
        .with_context(|| format!("failed to write {}", image_path.display()))?;

    let html_path = out_dir.join("preview.html");
    let page = preview_page(data_url, &session.selection().to_string(), &preview.prompt);
    fs::write(&html_path, page)
        .with_context(|| format!("failed to write {}", html_path.display()))?;

    engine.record_event(
        "preview_written",
        json!({
            "image_path": image_path.to_string_lossy(),
            "html_path": html_path.to_string_lossy(),
        }),
    );

    Ok(PreviewFiles {
        image_path,
        html_path,
    })
}

fn preview_page(data_url: &str, selection: &str, prompt: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Your Sticker Preview</title>
<style>
body {{ font-family: sans-serif; background: #f1f5f9; color: #1e293b; text-align: center; padding: 2rem; }}
img {{ max-width: 100%; max-height: 24rem; object-fit: contain; filter: drop-shadow(0 20px 25px rgb(0 0 0 / 0.25)); }}
pre {{ text-align: left; white-space: pre-wrap; display: inline-block; max-width: 48rem; }}
</style>
</head>
<body>
<h1>Your Sticker Preview</h1>
<p>{selection}</p>
<img src="{data_url}" alt="Generated sticker preview">
<details><summary>Prompt</summary><pre>{prompt}</pre></details>
</body>
</html>
"#,
        selection = escape_html(selection),
        data_url = escape_html(data_url),
        prompt = escape_html(prompt),
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
