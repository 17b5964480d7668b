//! # cmdtree-style - Named Styles for Command Output
//!
//! Styling support for the `cmdtree` renderers. Help pages, table headers and
//! error lines are produced from templates and data, while colors are chosen by
//! *role name* (`"header"`, `"option"`, `"error"`, ...) rather than written inline.
//!
//! ## Pieces
//!
//! - [`Styles`]: a registry mapping role names to `console::Style` values
//! - [`Theme`]: a named collection of styles handed to renderers
//! - [`TemplateRenderer`]: pre-compiled minijinja templates with a `style` filter
//!
//! ## Example
//!
//! ```rust
//! use cmdtree_style::{TemplateRenderer, Theme};
//! use console::Style;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Usage { program: String }
//!
//! let theme = Theme::new().add("command", Style::new().bold());
//! let mut renderer = TemplateRenderer::with_color(theme, false);
//! renderer
//!     .add_template("usage", r#"Usage: {{ program | style("command") }} [COMMAND]"#)
//!     .unwrap();
//!
//! let out = renderer.render("usage", &Usage { program: "demo".into() }).unwrap();
//! assert_eq!(out, "Usage: demo [COMMAND]");
//! ```
//!
//! ## Color Control
//!
//! The renderer never probes the terminal itself: whether ANSI codes are emitted
//! is decided by the caller through `use_color`. With colors off, the `style`
//! filter still validates role names, so a typo in a template shows up in plain
//! output too.

use console::Style;
use minijinja::{Environment, Error, Value};
use serde::Serialize;
use std::collections::HashMap;

/// Error raised when a template fails to compile or render.
pub use minijinja::Error as TemplateError;

/// Default prefix shown when a style name is not found.
pub const DEFAULT_MISSING_STYLE_INDICATOR: &str = "(!?)";

/// A collection of named styles.
///
/// When a style name is not found, a configurable indicator is prepended to the
/// text (defaults to `(!?)`).
///
/// ```rust
/// use cmdtree_style::Styles;
/// use console::Style;
///
/// let styles = Styles::new()
///     .add("error", Style::new().bold().red())
///     .add("muted", Style::new().dim());
///
/// let unknown = styles.apply("typo", "Hello");
/// assert!(unknown.starts_with("(!?)"));
/// ```
#[derive(Clone)]
pub struct Styles {
    styles: HashMap<String, Style>,
    missing_indicator: String,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            styles: HashMap::new(),
            missing_indicator: DEFAULT_MISSING_STYLE_INDICATOR.to_string(),
        }
    }
}

impl Styles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indicator prepended when a style name is not found.
    /// An empty indicator disables the check.
    pub fn missing_indicator(mut self, indicator: &str) -> Self {
        self.missing_indicator = indicator.to_string();
        self
    }

    /// Adds a named style, replacing any previous style with that name.
    pub fn add(mut self, name: &str, style: Style) -> Self {
        self.styles.insert(name.to_string(), style);
        self
    }

    /// Applies a named style to text, emitting ANSI codes.
    pub fn apply(&self, name: &str, text: &str) -> String {
        match self.styles.get(name) {
            Some(style) => style.clone().force_styling(true).apply_to(text).to_string(),
            None if self.missing_indicator.is_empty() => text.to_string(),
            None => format!("{} {}", self.missing_indicator, text),
        }
    }

    /// Same lookup as [`Styles::apply`] but never emits ANSI codes.
    pub fn apply_plain(&self, name: &str, text: &str) -> String {
        if self.styles.contains_key(name) || self.missing_indicator.is_empty() {
            text.to_string()
        } else {
            format!("{} {}", self.missing_indicator, text)
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// A named collection of styles used when rendering.
#[derive(Clone, Default)]
pub struct Theme {
    styles: Styles,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_styles(styles: Styles) -> Self {
        Self { styles }
    }

    /// Adds a named style, returning the theme for chaining.
    pub fn add(mut self, name: &str, style: Style) -> Self {
        self.styles = self.styles.add(name, style);
        self
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    /// Styles `text` with the role `name`, or returns it unchanged (after the
    /// missing-role check) when `use_color` is off.
    pub fn paint(&self, name: &str, text: &str, use_color: bool) -> String {
        if use_color {
            self.styles.apply(name, text)
        } else {
            self.styles.apply_plain(name, text)
        }
    }
}

/// A set of pre-compiled templates sharing one theme.
///
/// Templates are compiled when added, so syntax errors surface at setup time
/// rather than in the middle of producing output.
pub struct TemplateRenderer {
    env: Environment<'static>,
    theme: Theme,
    use_color: bool,
}

impl TemplateRenderer {
    /// Creates a renderer with explicit color control.
    pub fn with_color(theme: Theme, use_color: bool) -> Self {
        let mut env = Environment::new();
        register_style_filter(&mut env, theme.clone(), use_color);
        Self {
            env,
            theme,
            use_color,
        }
    }

    /// Registers a named template. Fails if the template does not compile.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), Error> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
    }

    /// Renders a registered template with the given data.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, Error> {
        let tmpl = self.env.get_template(name)?;
        tmpl.render(data)
    }

    /// Styles a single fragment outside of any template.
    pub fn paint(&self, name: &str, text: &str) -> String {
        self.theme.paint(name, text, self.use_color)
    }

    pub fn uses_color(&self) -> bool {
        self.use_color
    }
}

fn register_style_filter(env: &mut Environment<'static>, theme: Theme, use_color: bool) {
    env.add_filter("style", move |value: Value, name: String| -> String {
        theme.paint(&name, &value.to_string(), use_color)
    });
}

/// Converts an RGB triplet to the nearest ANSI 256-color palette index.
pub fn rgb_to_ansi256((r, g, b): (u8, u8, u8)) -> u8 {
    if r == g && g == b {
        if r < 8 {
            16
        } else if r > 248 {
            231
        } else {
            232 + ((r as u16 - 8) * 24 / 247) as u8
        }
    } else {
        let red = (r as u16 * 5 / 255) as u8;
        let green = (g as u16 * 5 / 255) as u8;
        let blue = (b as u16 * 5 / 255) as u8;
        16 + 36 * red + 6 * green + blue
    }
}
