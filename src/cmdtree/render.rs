//! # Output Renderer
//!
//! Turns structured data into text. Renderers never write anything themselves;
//! they return strings and the caller decides where those go.
//!
//! Two interchangeable implementations sit behind the [`Renderer`] trait:
//! [`PlainRenderer`] emits no escape codes, [`StyledRenderer`] paints with the
//! [`CLI_THEME`]. Which one is used is decided once, when the dispatcher is
//! built, never while a command runs.
//!
//! Layout calculations (column widths, padding) stay in Rust because they need
//! Unicode-aware widths. Padding is computed on the raw cell text before any
//! styling is applied, so escape codes never skew alignment. Help pages go
//! through minijinja templates (see [`crate::templates`]).

use std::fmt;
use std::str::FromStr;

use cmdtree_style::TemplateRenderer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unicode_width::UnicodeWidthStr;

use crate::error::{CliError, Result};
use crate::registry::{CommandNode, CommandRegistry};
use crate::schema::{ArgKind, ArgumentSpec, HELP_ALIASES};
use crate::styles::{names, CLI_THEME};
use crate::templates::{HELP, HELP_TEMPLATE, USAGE, USAGE_TEMPLATE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 3] = ["json", "csv", "table"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CliError::InvalidChoice {
                name: "format".to_string(),
                value: other.to_string(),
                choices: Self::NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }
}

/// The structured payload of a render request.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderData {
    /// Ordered key/value pairs, shown as a two-column table without header.
    Pairs(Vec<(String, String)>),
    /// Tabular data. Rows shorter than the header are padded with empty cells.
    Rows {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub data: RenderData,
    pub format: OutputFormat,
    /// Printed above tables; ignored by the json and csv formats.
    pub title: Option<String>,
}

impl RenderRequest {
    pub fn pairs<I, K, V>(pairs: I, format: OutputFormat) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: RenderData::Pairs(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            format,
            title: None,
        }
    }

    pub fn rows(headers: Vec<String>, rows: Vec<Vec<String>>, format: OutputFormat) -> Self {
        Self {
            data: RenderData::Rows { headers, rows },
            format,
            title: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

/// A help page, laid out and ready for the help template.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HelpPage {
    pub usage: String,
    pub about: String,
    pub commands: Vec<HelpEntry>,
    pub arguments: Vec<HelpEntry>,
    pub options: Vec<HelpEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HelpEntry {
    pub label: String,
    /// Spaces aligning `help` across the section.
    pub padding: String,
    pub help: String,
}

impl HelpPage {
    pub fn for_command(registry: &CommandRegistry, node: &CommandNode) -> Self {
        let is_root = node.path().is_empty();
        let mut usage = registry.display_path(node);
        if node.is_leaf() {
            if node.args().options().next().is_some() {
                usage.push_str(" [OPTIONS]");
            }
            for spec in node.args().positionals() {
                if spec.required && spec.default.is_none() {
                    usage.push_str(&format!(" <{}>", spec.name.to_uppercase()));
                } else {
                    usage.push_str(&format!(" [{}]", spec.name.to_uppercase()));
                }
            }
        } else {
            usage.push_str(" <COMMAND>");
        }

        let commands = node
            .visible_children()
            .map(|child| {
                let label = std::iter::once(child.name())
                    .chain(child.aliases().iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(", ");
                (label, child.help_text().to_string())
            })
            .collect();

        let arguments = node
            .args()
            .positionals()
            .map(|spec| (spec.name.to_uppercase(), describe(spec)))
            .collect();

        let mut options: Vec<(String, String)> = node
            .args()
            .options()
            .map(|spec| (option_label(spec), describe(spec)))
            .collect();
        options.push((HELP_ALIASES.join(", "), "Print help".to_string()));
        if is_root && registry.version_string().is_some() {
            options.push(("-V, --version".to_string(), "Print version".to_string()));
        }

        Self {
            usage,
            about: node.help_text().to_string(),
            commands: aligned(commands),
            arguments: aligned(arguments),
            options: aligned(options),
        }
    }
}

fn option_label(spec: &ArgumentSpec) -> String {
    let (short, long): (Vec<&String>, Vec<&String>) =
        spec.aliases.iter().partition(|a| !a.starts_with("--"));
    let mut label = short
        .into_iter()
        .chain(long)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Some(negation) = &spec.negation {
        label.push_str(" / ");
        label.push_str(negation);
    }
    if spec.kind == ArgKind::Option {
        label.push(' ');
        label.push_str(&spec.value_name());
    }
    label
}

fn describe(spec: &ArgumentSpec) -> String {
    let mut help = spec.help.clone();
    let mut notes = Vec::new();
    match spec.default_value() {
        Some(default) if spec.kind != ArgKind::Flag || default.as_bool() == Some(true) => {
            notes.push(format!("[default: {}]", default));
        }
        _ => {}
    }
    if spec.value_type == crate::schema::ValueType::RepeatedString {
        notes.push("[repeatable]".to_string());
    }
    for note in notes {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str(&note);
    }
    help
}

fn aligned(entries: Vec<(String, String)>) -> Vec<HelpEntry> {
    let width = entries.iter().map(|(l, _)| l.width()).max().unwrap_or(0);
    entries
        .into_iter()
        .map(|(label, help)| HelpEntry {
            padding: " ".repeat(width - label.width()),
            label,
            help,
        })
        .collect()
}

/// Formats render requests and help pages.
pub trait Renderer {
    fn render(&self, request: &RenderRequest) -> Result<String>;

    fn help(&self, page: &HelpPage) -> Result<String>;

    /// Applies a theme role to a fragment of text.
    fn style(&self, role: &str, text: &str) -> String;
}

/// No escape codes, ever.
pub struct PlainRenderer {
    templates: TemplateRenderer,
    csv_header: bool,
}

impl PlainRenderer {
    pub fn new(csv_header: bool) -> Result<Self> {
        Ok(Self {
            templates: help_templates(false)?,
            csv_header,
        })
    }
}

impl Renderer for PlainRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String> {
        format_request(request, self.csv_header, &|_: &str, text: &str| text.to_string())
    }

    fn help(&self, page: &HelpPage) -> Result<String> {
        render_help(&self.templates, page)
    }

    fn style(&self, _role: &str, text: &str) -> String {
        text.to_string()
    }
}

/// Paints headers, keys and help pages with the [`CLI_THEME`].
pub struct StyledRenderer {
    templates: TemplateRenderer,
    csv_header: bool,
}

impl StyledRenderer {
    pub fn new(csv_header: bool) -> Result<Self> {
        Ok(Self {
            templates: help_templates(true)?,
            csv_header,
        })
    }
}

impl Renderer for StyledRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String> {
        format_request(request, self.csv_header, &|role: &str, text: &str| {
            self.templates.paint(role, text)
        })
    }

    fn help(&self, page: &HelpPage) -> Result<String> {
        render_help(&self.templates, page)
    }

    fn style(&self, role: &str, text: &str) -> String {
        self.templates.paint(role, text)
    }
}

/// Picks the implementation for the resolved color setting.
pub fn renderer_for(use_color: bool, csv_header: bool) -> Result<Box<dyn Renderer>> {
    tracing::debug!(use_color, csv_header, "selecting renderer");
    if use_color {
        Ok(Box::new(StyledRenderer::new(csv_header)?))
    } else {
        Ok(Box::new(PlainRenderer::new(csv_header)?))
    }
}

fn help_templates(use_color: bool) -> Result<TemplateRenderer> {
    let mut templates = TemplateRenderer::with_color(CLI_THEME.clone(), use_color);
    templates.add_template(USAGE, USAGE_TEMPLATE)?;
    templates.add_template(HELP, HELP_TEMPLATE)?;
    Ok(templates)
}

fn render_help(templates: &TemplateRenderer, page: &HelpPage) -> Result<String> {
    let mut text = templates.render(HELP, page)?;
    text.push('\n');
    Ok(text)
}

type Paint<'a> = dyn Fn(&str, &str) -> String + 'a;

fn format_request(request: &RenderRequest, csv_header: bool, paint: &Paint<'_>) -> Result<String> {
    match request.format {
        OutputFormat::Table => Ok(table(request, paint)),
        OutputFormat::Json => json(&request.data),
        OutputFormat::Csv => Ok(csv(&request.data, csv_header)),
    }
}

fn table(request: &RenderRequest, paint: &Paint<'_>) -> String {
    let mut out = String::new();
    if let Some(title) = &request.title {
        out.push_str(&paint(names::TITLE, title));
        out.push('\n');
    }
    match &request.data {
        RenderData::Pairs(pairs) => {
            let rows: Vec<[&str; 2]> = pairs.iter().map(|(k, v)| [k.as_str(), v.as_str()]).collect();
            let widths = column_widths(rows.iter().map(|r| &r[..]));
            for row in &rows {
                out.push_str(&table_line(row, &widths, |i, cell| {
                    if i == 0 {
                        paint(names::KEY, cell)
                    } else {
                        cell.to_string()
                    }
                }));
            }
        }
        RenderData::Rows { headers, rows } => {
            let header: Vec<&str> = headers.iter().map(String::as_str).collect();
            let body: Vec<Vec<&str>> = rows
                .iter()
                .map(|r| r.iter().map(String::as_str).collect())
                .collect();
            let widths = column_widths(
                std::iter::once(&header[..]).chain(body.iter().map(|r| &r[..])),
            );
            if !header.is_empty() {
                out.push_str(&table_line(&header, &widths, |_, cell| {
                    paint(names::HEADER, cell)
                }));
            }
            for row in &body {
                out.push_str(&table_line(row, &widths, |_, cell| cell.to_string()));
            }
        }
    }
    out
}

fn column_widths<'a>(rows: impl Iterator<Item = &'a [&'a str]>) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i == widths.len() {
                widths.push(0);
            }
            widths[i] = widths[i].max(cell.width());
        }
    }
    widths
}

/// One table row. Cells are separated by a single space and padded to their
/// column width; the last cell carries no trailing padding.
fn table_line(cells: &[&str], widths: &[usize], style: impl Fn(usize, &str) -> String) -> String {
    let last = cells.len().saturating_sub(1);
    let mut parts = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        let painted = style(i, cell);
        if i == last {
            parts.push(painted);
        } else {
            let pad = widths[i].saturating_sub(cell.width());
            parts.push(format!("{}{}", painted, " ".repeat(pad)));
        }
    }
    let mut line = parts.join(" ");
    line.push('\n');
    line
}

fn json(data: &RenderData) -> Result<String> {
    let value = match data {
        RenderData::Pairs(pairs) => {
            let mut map = Map::new();
            for (key, value) in pairs {
                insert_unique(&mut map, key, value.clone())?;
            }
            Value::Object(map)
        }
        RenderData::Rows { headers, rows } => Value::Array(
            rows.iter()
                .map(|row| -> Result<Value> {
                    let mut map = Map::new();
                    for (i, header) in headers.iter().enumerate() {
                        let cell = row.get(i).cloned().unwrap_or_default();
                        insert_unique(&mut map, header, cell)?;
                    }
                    Ok(Value::Object(map))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
    };
    let mut text = serde_json::to_string_pretty(&value)?;
    text.push('\n');
    Ok(text)
}

/// JSON objects cannot hold a key twice; refuse instead of dropping a value.
fn insert_unique(map: &mut Map<String, Value>, key: &str, value: String) -> Result<()> {
    if map.contains_key(key) {
        return Err(CliError::Render(format!(
            "duplicate key '{}' cannot be encoded as json",
            key
        )));
    }
    map.insert(key.to_string(), Value::String(value));
    Ok(())
}

fn csv(data: &RenderData, header: bool) -> String {
    let mut lines: Vec<String> = Vec::new();
    match data {
        RenderData::Pairs(pairs) => {
            if header {
                lines.push("key,value".to_string());
            }
            lines.extend(pairs.iter().map(|(k, v)| format!("{},{}", k, v)));
        }
        RenderData::Rows { headers, rows } => {
            lines.push(headers.join(","));
            lines.extend(rows.iter().map(|row| row.join(",")));
        }
    }
    lines.into_iter().map(|line| line + "\n").collect()
}
