use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use sticker_contracts::events::EventWriter;
use sticker_contracts::prompt::build_prompt;
use sticker_contracts::selection::{
    parse_choice, RectangleOrientation, Selection, StickerMaterial, StickerShape,
};
use sticker_contracts::session::{PreviewSession, PreviewStatus, UploadedImage};
use sticker_engine::config::{ConfigOverrides, GenerationConfig};
use sticker_engine::{describe_status, PreviewEngine, SubmitOutcome};

mod chat;
mod render;

#[derive(Debug, Parser)]
#[command(
    name = "sticker-preview",
    version,
    about = "AI sticker previews from your own artwork"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session: upload, pick options, generate, repeat.
    Chat(ChatArgs),
    /// Generate a single preview and exit.
    Generate(GenerateArgs),
    /// Print the prompt a selection would send.
    Prompt(SelectionArgs),
}

#[derive(Debug, Args)]
struct ProviderArgs {
    /// Image provider (openai or dryrun).
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    size: Option<String>,
    #[arg(long)]
    api_base: Option<String>,
}

impl ProviderArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            size: self.size.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct SelectionArgs {
    #[arg(long, default_value = "round", value_parser = parse_choice::<StickerShape>)]
    shape: StickerShape,
    #[arg(long, default_value = "vinyl", value_parser = parse_choice::<StickerMaterial>)]
    material: StickerMaterial,
    #[arg(long, default_value = "landscape", value_parser = parse_choice::<RectangleOrientation>)]
    orientation: RectangleOrientation,
}

impl SelectionArgs {
    fn selection(&self) -> Selection {
        Selection::new(self.shape, self.material, self.orientation)
    }
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[command(flatten)]
    selection: SelectionArgs,
    #[command(flatten)]
    provider: ProviderArgs,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("sticker-preview error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            chat::run_chat(args)?;
            Ok(0)
        }
        Command::Generate(args) => run_generate(args),
        Command::Prompt(args) => {
            println!("{}", build_prompt(&args.selection()));
            Ok(0)
        }
    }
}

fn build_engine(
    out: &Path,
    events: Option<PathBuf>,
    provider: &ProviderArgs,
) -> Result<PreviewEngine> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    let events_path = events.unwrap_or_else(|| out.join("events.jsonl"));
    let writer = EventWriter::for_new_session(events_path);
    let config = GenerationConfig::from_env().with_overrides(&provider.overrides());
    let engine = PreviewEngine::new(config, writer).context("invalid image provider")?;
    engine.record_event(
        "session_started",
        json!({
            "out_dir": out.to_string_lossy(),
            "provider": engine.provider(),
            "model": engine.config().model,
            "size": engine.config().size,
        }),
    );
    Ok(engine)
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let engine = build_engine(&args.out, args.events.clone(), &args.provider)?;
    let mut session = PreviewSession::new();
    session.upload(UploadedImage::new(&args.image));
    let selection = args.selection.selection();
    session.set_shape(selection.shape);
    session.set_material(selection.material);
    session.set_orientation(selection.orientation);

    println!("{}", describe_status(&PreviewStatus::Loading));
    let outcome = engine.submit(&mut session);
    let code = match outcome {
        SubmitOutcome::Generated(preview) => {
            let files = render::write_preview(&args.out, &preview, &session, &engine)?;
            println!("{}", describe_status(session.status()));
            println!("Preview image: {}", files.image_path.display());
            println!("Preview page: {}", files.html_path.display());
            0
        }
        SubmitOutcome::Failed(err) => {
            println!("{}", describe_status(session.status()));
            eprintln!("cause: {err}");
            1
        }
        SubmitOutcome::Blocked(blocked) => {
            eprintln!("{blocked}");
            1
        }
    };
    engine.record_event(
        "session_finished",
        json!({ "status": session.status().name() }),
    );
    Ok(code)
}
