#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArgKind {
    None,
    Path,
    Shape,
    Material,
    Orientation,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub arg: ArgKind,
    pub usage: &'static str,
}

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "upload",
        arg: ArgKind::Path,
        usage: "/upload <path>",
    },
    CommandSpec {
        command: "shape",
        arg: ArgKind::Shape,
        usage: "/shape <round|square|rectangle>",
    },
    CommandSpec {
        command: "orientation",
        arg: ArgKind::Orientation,
        usage: "/orientation <landscape|portrait>",
    },
    CommandSpec {
        command: "material",
        arg: ArgKind::Material,
        usage: "/material <vinyl|domed>",
    },
    CommandSpec {
        command: "prompt",
        arg: ArgKind::None,
        usage: "/prompt",
    },
    CommandSpec {
        command: "generate",
        arg: ArgKind::None,
        usage: "/generate",
    },
    CommandSpec {
        command: "status",
        arg: ArgKind::None,
        usage: "/status",
    },
    CommandSpec {
        command: "help",
        arg: ArgKind::None,
        usage: "/help",
    },
    CommandSpec {
        command: "quit",
        arg: ArgKind::None,
        usage: "/quit",
    },
];

pub(crate) fn find_command(command: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.command == command)
}

/// Usage lines for `/help`, in registry order.
pub fn chat_help_commands() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|spec| spec.usage)
}
