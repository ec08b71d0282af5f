use std::io::{self, BufRead, ErrorKind, Write};
use std::path::Path;

use anyhow::Result;
use serde_json::json;
use sticker_contracts::chat::{chat_help_commands, parse_intent, Intent};
use sticker_contracts::prompt::build_prompt;
use sticker_contracts::selection::{Choice, Selection};
use sticker_contracts::session::{PreviewSession, PreviewStatus, UploadedImage};
use sticker_engine::{describe_status, PreviewEngine, SubmitOutcome};

use crate::{build_engine, render, ChatArgs};

pub fn run_chat(args: ChatArgs) -> Result<()> {
    let engine = build_engine(&args.out, args.events.clone(), &args.provider)?;
    let mut session = PreviewSession::new();

    println!("Sticker preview session started. Type /help for commands.");
    print_form(&session);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    drive(&engine, &mut session, &args.out, &mut input, &mut stdout)?;

    engine.record_event(
        "session_finished",
        json!({ "status": session.status().name() }),
    );
    Ok(())
}

enum Flow {
    Continue,
    Quit,
}

/// Reads commands until EOF or `/quit`. A command that fails is reported
/// and the loop keeps going.
fn drive(
    engine: &PreviewEngine,
    session: &mut PreviewSession,
    out_dir: &Path,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let mut line = String::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        let read = match input.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
        match handle_intent(engine, session, out_dir, intent, output) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            // The session outlives any single failed command.
            Err(err) => writeln!(output, "error: {err:#}")?,
        }
    }
    Ok(())
}

fn handle_intent(
    engine: &PreviewEngine,
    session: &mut PreviewSession,
    out_dir: &Path,
    intent: Intent,
    output: &mut impl Write,
) -> Result<Flow> {
    match intent {
        Intent::Noop => {}
        Intent::Help => {
            writeln!(output, "Commands:")?;
            for usage in chat_help_commands() {
                writeln!(output, "  {usage}")?;
            }
        }
        Intent::Quit => return Ok(Flow::Quit),
        Intent::Invalid(message) => writeln!(output, "{message}")?,
        Intent::Upload(path) => {
            if !path.is_file() {
                writeln!(output, "No such file: {}", path.display())?;
                return Ok(Flow::Continue);
            }
            let image = UploadedImage::new(path);
            engine.record_event(
                "image_uploaded",
                json!({
                    "path": image.path.to_string_lossy(),
                    "file_name": image.file_name,
                }),
            );
            writeln!(output, "Image set to {}", image.preview_ref().display())?;
            session.upload(image);
        }
        Intent::SetShape(shape) => {
            session.set_shape(shape);
            selection_changed(engine, session, output)?;
            if session.orientation_visible() {
                writeln!(
                    output,
                    "Rectangle orientation: {} (change with /orientation)",
                    session.selection().orientation.label()
                )?;
            }
        }
        Intent::SetMaterial(material) => {
            session.set_material(material);
            selection_changed(engine, session, output)?;
        }
        Intent::SetOrientation(orientation) => {
            session.set_orientation(orientation);
            if !session.orientation_visible() {
                writeln!(output, "Orientation only applies to rectangle stickers.")?;
            }
            selection_changed(engine, session, output)?;
        }
        Intent::ShowPrompt => writeln!(output, "{}", build_prompt(&session.selection()))?,
        Intent::Status => {
            print_form_to(session, output)?;
        }
        Intent::Generate => {
            if !session.can_submit() {
                writeln!(output, "Upload an image first (/upload <path>).")?;
                return Ok(Flow::Continue);
            }
            writeln!(output, "{}", describe_status(&PreviewStatus::Loading))?;
            output.flush()?;
            match engine.submit(session) {
                SubmitOutcome::Generated(preview) => {
                    let files = render::write_preview(out_dir, &preview, session, engine)?;
                    writeln!(output, "{}", describe_status(session.status()))?;
                    writeln!(output, "Preview image: {}", files.image_path.display())?;
                    writeln!(output, "Preview page: {}", files.html_path.display())?;
                }
                SubmitOutcome::Failed(_) => {
                    writeln!(output, "{}", describe_status(session.status()))?;
                }
                SubmitOutcome::Blocked(blocked) => writeln!(output, "{blocked}")?,
            }
        }
    }
    Ok(Flow::Continue)
}

fn selection_changed(
    engine: &PreviewEngine,
    session: &PreviewSession,
    output: &mut impl Write,
) -> Result<()> {
    let selection: Selection = session.selection();
    engine.record_event("selection_changed", json!({ "selection": selection }));
    writeln!(output, "Selection: {selection}")?;
    Ok(())
}

fn print_form(session: &PreviewSession) {
    let mut stdout = io::stdout();
    let _ = print_form_to(session, &mut stdout);
}

fn print_form_to(session: &PreviewSession, output: &mut impl Write) -> io::Result<()> {
    let image = session
        .image()
        .map(|image| image.preview_ref().display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    writeln!(output, "1. Image: {image}")?;
    writeln!(output, "2. Shape: {}", options_line(session.selection().shape))?;
    if session.orientation_visible() {
        writeln!(
            output,
            "   Orientation: {}",
            options_line(session.selection().orientation)
        )?;
    }
    writeln!(
        output,
        "3. Material: {}",
        options_line(session.selection().material)
    )?;
    let generate = if session.can_submit() {
        "ready"
    } else {
        "disabled"
    };
    writeln!(output, "Generate: {generate}")?;
    writeln!(output, "{}", describe_status(session.status()))?;
    Ok(())
}

/// Renders every option of a control, marking the selected one.
fn options_line<T: Choice>(selected: T) -> String {
    T::ALL
        .iter()
        .map(|value| {
            if *value == selected {
                format!("[{}]", value.label())
            } else {
                value.label().to_string()
            }
        })
        .collect::<Vec<String>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use sticker_contracts::events::EventWriter;
    use sticker_contracts::selection::{StickerMaterial, StickerShape};
    use sticker_engine::config::GenerationConfig;

    use super::*;

    fn dryrun_engine(dir: &Path) -> Result<PreviewEngine> {
        let config = GenerationConfig {
            provider: "dryrun".to_string(),
            size: "8x8".to_string(),
            ..GenerationConfig::default()
        };
        Ok(PreviewEngine::new(
            config,
            EventWriter::new(dir.join("events.jsonl"), "s-test"),
        )?)
    }

    fn run_script(
        engine: &PreviewEngine,
        session: &mut PreviewSession,
        out_dir: &Path,
        script: &str,
    ) -> Result<String> {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        drive(engine, session, out_dir, &mut input, &mut output)?;
        Ok(String::from_utf8_lossy(&output).to_string())
    }

    #[test]
    fn generate_is_disabled_until_an_image_is_uploaded() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let engine = dryrun_engine(temp.path())?;
        let mut session = PreviewSession::new();

        let transcript = run_script(&engine, &mut session, temp.path(), "/generate\n/status\n")?;
        assert!(transcript.contains("Upload an image first"));
        assert!(transcript.contains("Generate: disabled"));
        assert_eq!(session.status(), &PreviewStatus::Idle);
        Ok(())
    }

    #[test]
    fn full_session_produces_a_preview() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let image = temp.path().join("logo.png");
        fs::write(&image, b"artwork")?;
        let engine = dryrun_engine(temp.path())?;
        let mut session = PreviewSession::new();

        let script = format!(
            "/upload {}\n/shape rectangle\n/orientation portrait\n/material domed\n/generate\n/quit\n/generate\n",
            image.display()
        );
        let transcript = run_script(&engine, &mut session, temp.path(), &script)?;

        assert!(transcript.contains("Rectangle orientation"));
        assert!(transcript.contains("Your sticker preview is ready"));
        assert_eq!(session.selection().shape, StickerShape::Rectangle);
        assert_eq!(session.selection().material, StickerMaterial::Domed);
        assert!(session
            .status()
            .data_url()
            .is_some_and(|url| url.starts_with("data:image/png;base64,")));
        assert!(temp.path().join("preview.html").is_file());
        assert_eq!(transcript.matches("creating your sticker").count(), 1);
        Ok(())
    }

    #[test]
    fn reupload_clears_previous_result() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let image = temp.path().join("logo.png");
        fs::write(&image, b"artwork")?;
        let engine = dryrun_engine(temp.path())?;
        let mut session = PreviewSession::new();

        let script = format!(
            "/upload {path}\n/generate\n/upload {path}\n",
            path = image.display()
        );
        run_script(&engine, &mut session, temp.path(), &script)?;
        assert_eq!(session.status(), &PreviewStatus::Idle);
        assert!(session.can_submit());
        Ok(())
    }

    #[test]
    fn missing_upload_path_keeps_previous_state() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let engine = dryrun_engine(temp.path())?;
        let mut session = PreviewSession::new();

        let script = format!("/upload {}\n", temp.path().join("nope.png").display());
        let transcript = run_script(&engine, &mut session, temp.path(), &script)?;
        assert!(transcript.contains("No such file"));
        assert!(session.image().is_none());
        Ok(())
    }

    #[test]
    fn failed_preview_write_keeps_the_session_running() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let image = temp.path().join("logo.png");
        fs::write(&image, b"artwork")?;
        // A regular file where the output directory should be.
        let out_dir = temp.path().join("out");
        fs::write(&out_dir, b"not a directory")?;
        let engine = dryrun_engine(temp.path())?;
        let mut session = PreviewSession::new();

        let script = format!(
            "/upload {}\n/generate\n/material domed\n/status\n",
            image.display()
        );
        let transcript = run_script(&engine, &mut session, &out_dir, &script)?;

        assert!(transcript.contains("error: failed to create"));
        assert!(transcript.contains("Selection: Round / Domed (raised resin)"));
        assert!(transcript.contains("Generate: ready"));
        assert_eq!(session.selection().material, StickerMaterial::Domed);
        Ok(())
    }

    #[test]
    fn unwritable_event_log_does_not_end_the_session() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let image = temp.path().join("logo.png");
        fs::write(&image, b"artwork")?;
        let events_dir = temp.path().join("events-dir");
        fs::create_dir(&events_dir)?;
        let config = GenerationConfig {
            provider: "dryrun".to_string(),
            size: "8x8".to_string(),
            ..GenerationConfig::default()
        };
        let engine = PreviewEngine::new(config, EventWriter::new(&events_dir, "s-test"))?;
        let mut session = PreviewSession::new();

        let script = format!(
            "/upload {}\n/shape square\n/generate\n",
            image.display()
        );
        let transcript = run_script(&engine, &mut session, temp.path(), &script)?;

        assert!(transcript.contains("Your sticker preview is ready"));
        assert!(!transcript.contains("error:"));
        assert_eq!(session.status().name(), "success");
        Ok(())
    }

    #[test]
    fn options_line_marks_selection() {
        assert_eq!(
            options_line(StickerShape::Square),
            "Round  [Square]  Rectangle"
        );
    }
}
