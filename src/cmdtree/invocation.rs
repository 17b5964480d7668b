//! What a handler receives: the bound arguments ([`ParsedInvocation`]) and a
//! context for output, prompting and rendering ([`CommandContext`]).

use crate::error::{CliError, Result};
use crate::prompt::Prompter;
use crate::render::{OutputFormat, RenderRequest, Renderer};
use crate::terminal::Terminal;
use crate::value::TypedValue;

/// A resolved command plus one bound value per declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInvocation {
    path: Vec<String>,
    values: Vec<(String, TypedValue)>,
}

impl ParsedInvocation {
    pub fn new(path: Vec<String>, values: Vec<(String, TypedValue)>) -> Self {
        Self { path, values }
    }

    /// Command names from the root to the invoked leaf.
    pub fn command_path(&self) -> &[String] {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Bound values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.opt_str(name).ok_or_else(|| unbound(name, "string"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TypedValue::as_str)
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.opt_int(name).ok_or_else(|| unbound(name, "integer"))
    }

    pub fn opt_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(TypedValue::as_int)
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.get(name)
            .and_then(TypedValue::as_float)
            .ok_or_else(|| unbound(name, "float"))
    }

    /// `false` for anything but a bound `true`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(TypedValue::as_bool).unwrap_or(false)
    }

    /// Empty for anything but a bound list.
    pub fn list(&self, name: &str) -> &[String] {
        self.get(name).and_then(TypedValue::as_list).unwrap_or(&[])
    }
}

fn unbound(name: &str, expected: &str) -> CliError {
    CliError::HandlerFailure(anyhow::anyhow!(
        "argument '{}' is not bound to a {} value",
        name,
        expected
    ))
}

/// Output, prompting and rendering services for one handler call.
pub struct CommandContext<'a> {
    term: &'a mut dyn Terminal,
    renderer: &'a dyn Renderer,
    default_format: OutputFormat,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        term: &'a mut dyn Terminal,
        renderer: &'a dyn Renderer,
        default_format: OutputFormat,
    ) -> Self {
        Self {
            term,
            renderer,
            default_format,
        }
    }

    pub fn println(&mut self, line: impl AsRef<str>) -> Result<()> {
        self.term.write_out(&format!("{}\n", line.as_ref()))?;
        Ok(())
    }

    pub fn eprintln(&mut self, line: impl AsRef<str>) -> Result<()> {
        self.term.write_err(&format!("{}\n", line.as_ref()))?;
        Ok(())
    }

    /// Applies a theme role (see [`crate::styles::names`]); plain renderers
    /// return the text unchanged.
    pub fn styled(&self, role: &str, text: &str) -> String {
        self.renderer.style(role, text)
    }

    /// Renders `request` and writes it to the output stream.
    pub fn render(&mut self, request: &RenderRequest) -> Result<()> {
        let text = self.renderer.render(request)?;
        self.term.write_out(&text)?;
        Ok(())
    }

    pub fn prompt(&mut self) -> Prompter<'_> {
        Prompter::new(&mut *self.term)
    }

    /// The configured format for commands that do not take one explicitly.
    pub fn default_format(&self) -> OutputFormat {
        self.default_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PlainRenderer;
    use crate::terminal::MemoryTerminal;

    fn invocation() -> ParsedInvocation {
        ParsedInvocation::new(
            vec!["process-items".into()],
            vec![
                ("item".into(), TypedValue::List(vec!["a".into(), "b".into()])),
                ("verbose".into(), TypedValue::Bool(true)),
                ("count".into(), TypedValue::Int(2)),
                ("email".into(), TypedValue::Unset),
            ],
        )
    }

    #[test]
    fn typed_accessors() {
        let inv = invocation();
        assert_eq!(inv.list("item"), ["a".to_string(), "b".to_string()]);
        assert!(inv.flag("verbose"));
        assert_eq!(inv.int("count").unwrap(), 2);
        assert_eq!(inv.float("count").unwrap(), 2.0);
        assert_eq!(inv.opt_str("email"), None);
        assert!(inv.str("email").is_err());
        assert_eq!(inv.len(), 4);
    }

    #[test]
    fn values_keep_declaration_order() {
        let names: Vec<_> = invocation().values().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["item", "verbose", "count", "email"]);
    }

    #[test]
    fn context_writes_and_renders() {
        let renderer = PlainRenderer::new(false).unwrap();
        let mut term = MemoryTerminal::new();
        {
            let mut ctx = CommandContext::new(&mut term, &renderer, OutputFormat::Table);
            ctx.println("Processing 2 items...").unwrap();
            ctx.render(&RenderRequest::pairs([("a", "1")], OutputFormat::Csv))
                .unwrap();
            ctx.eprintln("warning").unwrap();
        }
        assert_eq!(term.output(), "Processing 2 items...\na,1\n");
        assert_eq!(term.errors(), "warning\n");
    }
}
