use cmdtree_style::{rgb_to_ansi256, Theme};
use console::Style;
use once_cell::sync::Lazy;

/// Style role names shared by the renderers, templates and handlers.
pub mod names {
    pub const HEADER: &str = "header";
    pub const TITLE: &str = "title";
    pub const KEY: &str = "key";
    pub const COMMAND: &str = "command";
    pub const OPTION: &str = "option";
    pub const ERROR: &str = "error";
    pub const SUCCESS: &str = "success";
    pub const MUTED: &str = "muted";
}

pub static CLI_THEME: Lazy<Theme> = Lazy::new(|| {
    Theme::new()
        .add(names::HEADER, Style::new().bold().underlined())
        .add(names::TITLE, Style::new().bold())
        .add(names::KEY, Style::new().cyan())
        .add(names::COMMAND, Style::new().green())
        .add(names::OPTION, Style::new().yellow())
        .add(names::ERROR, Style::new().red().bold())
        .add(names::SUCCESS, Style::new().green().bold())
        .add(
            names::MUTED,
            Style::new()
                .color256(rgb_to_ansi256((154, 154, 154)))
                .italic(),
        )
});
