use std::path::PathBuf;

use super::command_registry::{find_command, ArgKind, CommandSpec};
use crate::selection::{
    parse_choice, RectangleOrientation, StickerMaterial, StickerShape,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Noop,
    Upload(PathBuf),
    SetShape(StickerShape),
    SetMaterial(StickerMaterial),
    SetOrientation(RectangleOrientation),
    ShowPrompt,
    Generate,
    Status,
    Help,
    Quit,
    Invalid(String),
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

fn intent_for(spec: &CommandSpec, arg: &str) -> Intent {
    let usage = || Intent::Invalid(format!("usage: {}", spec.usage));
    match spec.arg {
        ArgKind::None if !arg.is_empty() => usage(),
        ArgKind::None => match spec.command {
            "prompt" => Intent::ShowPrompt,
            "generate" => Intent::Generate,
            "status" => Intent::Status,
            "help" => Intent::Help,
            "quit" => Intent::Quit,
            other => Intent::Invalid(format!("unknown command /{other}; type /help")),
        },
        ArgKind::Path => {
            let path = parse_single_path_arg(arg);
            if path.is_empty() {
                return usage();
            }
            Intent::Upload(PathBuf::from(path))
        }
        _ if arg.is_empty() => usage(),
        ArgKind::Shape => parse_choice(arg).map_or_else(Intent::Invalid, Intent::SetShape),
        ArgKind::Material => parse_choice(arg).map_or_else(Intent::Invalid, Intent::SetMaterial),
        ArgKind::Orientation => {
            parse_choice(arg).map_or_else(Intent::Invalid, Intent::SetOrientation)
        }
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::Noop;
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        return Intent::Invalid("commands start with '/'; type /help".to_string());
    };

    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return Intent::Invalid("empty command; type /help".to_string());
    }
    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim();

    match find_command(&command) {
        Some(spec) => intent_for(spec, arg),
        None => Intent::Invalid(format!("unknown command /{command}; type /help")),
    }
}
