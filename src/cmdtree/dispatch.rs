//! # Dispatcher
//!
//! Turns an argument vector into exactly one handler call:
//!
//! 1. Root `--version`/`-V` prints `<program> <version>`.
//! 2. A help token (`-h`/`--help`) before `--` prints the help page of the
//!    deepest command named so far.
//! 3. The command path is resolved through the registry.
//! 4. Remaining tokens are bound: options by alias (consuming the next token,
//!    or the text after `=`), flags by presence, positionals in declared order.
//! 5. Unbound arguments fall back to their default, an empty list, unset, an
//!    interactive prompt (when the command opts in), or `MissingArgument`.
//! 6. Commands that require confirmation ask before running unless `--yes`.
//! 7. The handler runs with the bound values.
//!
//! Every failure in steps 1-6 happens before the handler runs. [`Dispatcher::run`]
//! reports failures on the error stream and maps them to an [`ExitStatus`].

use std::collections::HashMap;
use std::process::ExitCode;

use tracing::{debug, trace};

use crate::coerce::{append, coerce};
use crate::config::FrameworkConfig;
use crate::error::{CliError, Result};
use crate::invocation::{CommandContext, ParsedInvocation};
use crate::prompt::Prompter;
use crate::registry::{CommandNode, CommandRegistry, CONFIRM_FLAG};
use crate::render::{renderer_for, HelpPage, OutputFormat, Renderer};
use crate::schema::{ArgKind, ArgumentSet, ArgumentSpec, ValueType, HELP_ALIASES};
use crate::styles::names;
use crate::terminal::Terminal;
use crate::value::TypedValue;

const END_OF_OPTIONS: &str = "--";
const VERSION_ALIASES: &[&str] = &["--version", "-V"];
/// Logged in place of values bound to secret arguments.
const SECRET_PLACEHOLDER: &str = "***";

/// Process exit status of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// User abort or a failure inside the handler.
    Failure,
    /// Bad declarations or bad input, detected before the handler ran.
    Usage,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::Usage => 2,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

pub struct Dispatcher {
    registry: CommandRegistry,
    renderer: Box<dyn Renderer>,
    default_format: OutputFormat,
    interactive: bool,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, renderer: Box<dyn Renderer>) -> Self {
        Self {
            registry,
            renderer,
            default_format: OutputFormat::default(),
            interactive: true,
        }
    }

    /// Builds a dispatcher with the renderer and defaults `config` asks for.
    pub fn from_config(
        registry: CommandRegistry,
        config: &FrameworkConfig,
        terminal_supports_color: bool,
    ) -> Result<Self> {
        let renderer = renderer_for(
            config.color.use_color(terminal_supports_color),
            config.csv_header,
        )?;
        Ok(Self::new(registry, renderer)
            .default_format(config.default_format)
            .interactive(config.interactive))
    }

    pub fn default_format(mut self, format: OutputFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Whether commands that opt in may prompt for missing arguments.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Dispatches `argv` and reports any failure on the error stream.
    pub fn run(&self, argv: &[String], term: &mut dyn Terminal) -> ExitStatus {
        match self.dispatch(argv, term) {
            Ok(()) => ExitStatus::Success,
            Err(err) => {
                let status = err.exit_status();
                debug!(error = %err, code = status.code(), "command failed");
                if let Err(io_err) = self.report(&err, argv, term) {
                    debug!(error = %io_err, "could not report failure");
                }
                status
            }
        }
    }

    /// Dispatches `argv`, returning the failure instead of reporting it.
    pub fn dispatch(&self, argv: &[String], term: &mut dyn Terminal) -> Result<()> {
        if let (Some(first), Some(version)) = (argv.first(), self.registry.version_string()) {
            if VERSION_ALIASES.contains(&first.as_str()) {
                term.write_out(&format!("{} {}\n", self.registry.program(), version))?;
                return Ok(());
            }
        }

        let (deepest, rest) = self.registry.walk(argv);
        if wants_help(rest) {
            let page = HelpPage::for_command(&self.registry, deepest);
            term.write_out(&self.renderer.help(&page)?)?;
            return Ok(());
        }

        let (node, rest) = self.registry.resolve(argv)?;
        debug!(command = %self.registry.display_path(node), "resolved command");

        let invocation = self.bind(node, rest, term)?;
        self.confirm(node, &invocation, term)?;

        let Some(handler) = node.handler_fn() else {
            return Err(CliError::IncompleteCommand {
                command: self.registry.display_path(node),
                choices: Vec::new(),
            });
        };
        let mut ctx = CommandContext::new(term, self.renderer.as_ref(), self.default_format);
        let outcome = handler(&mut ctx, &invocation);
        debug!(ok = outcome.is_ok(), "handler finished");
        outcome
    }

    fn bind(
        &self,
        node: &CommandNode,
        tokens: &[String],
        term: &mut dyn Terminal,
    ) -> Result<ParsedInvocation> {
        let args = node.args();
        let mut bound: HashMap<String, TypedValue> = HashMap::new();
        let mut positionals = args.positionals();
        let mut options_done = false;

        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            i += 1;

            if !options_done && token == END_OF_OPTIONS {
                options_done = true;
                continue;
            }

            if !options_done && is_option_token(token, args) {
                let (spelling, inline) = split_inline(token);
                let (spec, negated) = args
                    .find(spelling)
                    .ok_or_else(|| CliError::UnknownOption(token.clone()))?;

                let value = match spec.kind {
                    ArgKind::Flag => match (inline, negated) {
                        (None, negated) => TypedValue::Bool(!negated),
                        (Some(raw), false) => coerce(raw, spec)?,
                        (Some(_), true) => return Err(CliError::UnknownOption(token.clone())),
                    },
                    ArgKind::Option => {
                        let raw = match inline {
                            Some(raw) => raw,
                            None => {
                                let next = tokens
                                    .get(i)
                                    .ok_or_else(|| CliError::MissingValue(spelling.to_string()))?;
                                i += 1;
                                next.as_str()
                            }
                        };
                        if spec.value_type == ValueType::RepeatedString {
                            append(bound.remove(&spec.name), raw, spec)
                        } else {
                            coerce(raw, spec)?
                        }
                    }
                    ArgKind::Positional => return Err(CliError::UnknownOption(token.clone())),
                };
                bound.insert(spec.name.clone(), value);
                continue;
            }

            let spec = positionals
                .next()
                .ok_or_else(|| CliError::TooManyArguments(token.clone()))?;
            bound.insert(spec.name.clone(), coerce(token, spec)?);
        }

        let mut values = Vec::with_capacity(args.len());
        for spec in args.iter() {
            let value = match bound.remove(&spec.name) {
                Some(value) => value,
                None => self.fallback(node, spec, term)?,
            };
            if spec.secret {
                trace!(argument = %spec.name, value = SECRET_PLACEHOLDER, "bound argument");
            } else {
                trace!(argument = %spec.name, value = %value, "bound argument");
            }
            values.push((spec.name.clone(), value));
        }

        Ok(ParsedInvocation::new(node.path().to_vec(), values))
    }

    fn fallback(
        &self,
        node: &CommandNode,
        spec: &ArgumentSpec,
        term: &mut dyn Terminal,
    ) -> Result<TypedValue> {
        if let Some(default) = spec.default_value() {
            return Ok(default);
        }
        if !spec.required {
            return Ok(match spec.value_type {
                ValueType::RepeatedString => TypedValue::List(Vec::new()),
                _ => TypedValue::Unset,
            });
        }
        if node.prompts_missing() && self.interactive {
            debug!(argument = %spec.name, "prompting for missing argument");
            return Prompter::new(term).prompt_argument(spec);
        }
        Err(CliError::MissingArgument(spec.name.clone()))
    }

    fn confirm(
        &self,
        node: &CommandNode,
        invocation: &ParsedInvocation,
        term: &mut dyn Terminal,
    ) -> Result<()> {
        let Some(question) = node.confirmation() else {
            return Ok(());
        };
        if invocation.flag(CONFIRM_FLAG) {
            return Ok(());
        }
        if !self.interactive || !Prompter::new(term).prompt_confirm(question, false)? {
            return Err(CliError::UserAbort);
        }
        Ok(())
    }

    fn report(&self, err: &CliError, argv: &[String], term: &mut dyn Terminal) -> Result<()> {
        let prefix = self.renderer.style(names::ERROR, "Error:");
        term.write_err(&format!("{} {}\n", prefix, err))?;

        let (node, _) = self.registry.walk(argv);
        match err {
            CliError::IncompleteCommand { .. } => {
                let page = HelpPage::for_command(&self.registry, node);
                term.write_err(&format!("\n{}", self.renderer.help(&page)?))?;
            }
            err if err.is_usage() => {
                term.write_err(&format!(
                    "Try '{} --help' for more information.\n",
                    self.registry.display_path(node)
                ))?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn wants_help(tokens: &[String]) -> bool {
    tokens
        .iter()
        .take_while(|t| t.as_str() != END_OF_OPTIONS)
        .any(|t| HELP_ALIASES.contains(&t.as_str()))
}

/// `--name=value` splits at the first `=`; short aliases never carry inline values.
fn split_inline(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((spelling, value)) if spelling.starts_with("--") => (spelling, Some(value)),
        _ => (token, None),
    }
}

/// A dash-led token is an option unless it is a bare `-` or a negative number
/// that matches no declared alias.
fn is_option_token(token: &str, args: &ArgumentSet) -> bool {
    if token.len() < 2 || !token.starts_with('-') {
        return false;
    }
    let (spelling, _) = split_inline(token);
    args.find(spelling).is_some() || token.parse::<f64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PlainRenderer;
    use crate::terminal::MemoryTerminal;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Option<ParsedInvocation>>>;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn recording(node: CommandNode, seen: &Seen) -> CommandNode {
        let seen = Arc::clone(seen);
        node.handler(move |_, inv| {
            *seen.lock().unwrap() = Some(inv.clone());
            Ok(())
        })
    }

    fn dispatcher(nodes: Vec<CommandNode>) -> Dispatcher {
        let mut registry = CommandRegistry::new("cmdtree").version("0.3.0");
        for node in nodes {
            registry.register(&[], node).unwrap();
        }
        Dispatcher::new(registry, Box::new(PlainRenderer::new(false).unwrap()))
    }

    fn process_items(seen: &Seen) -> CommandNode {
        recording(
            CommandNode::new("process-items")
                .alias("process")
                .arg(ArgumentSpec::option("item").short('i').repeated())
                .unwrap()
                .arg(ArgumentSpec::flag("verbose").short('v'))
                .unwrap()
                .arg(ArgumentSpec::option("offset").integer().default(0))
                .unwrap(),
            seen,
        )
    }

    #[test]
    fn repeated_option_preserves_order() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let mut term = MemoryTerminal::new();
        let status = d.run(&argv(&["process", "-i", "b", "--item=a", "-v"]), &mut term);
        assert_eq!(status, ExitStatus::Success);

        let inv = seen.lock().unwrap().clone().unwrap();
        assert_eq!(inv.list("item"), ["b".to_string(), "a".to_string()]);
        assert!(inv.flag("verbose"));
        assert_eq!(inv.int("offset").unwrap(), 0);
        assert_eq!(inv.command_path(), ["process-items".to_string()]);
    }

    #[test]
    fn absent_repeated_option_is_empty_list() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let mut term = MemoryTerminal::new();
        assert_eq!(d.run(&argv(&["process-items"]), &mut term), ExitStatus::Success);
        let inv = seen.lock().unwrap().clone().unwrap();
        assert!(inv.list("item").is_empty());
        assert!(!inv.flag("verbose"));
    }

    #[test]
    fn negative_numbers_are_values() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let mut term = MemoryTerminal::new();
        d.dispatch(&argv(&["process-items", "--offset", "-5"]), &mut term)
            .unwrap();
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().int("offset").unwrap(), -5);
    }

    #[test]
    fn unknown_option_reports_hint() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let mut term = MemoryTerminal::new();
        let status = d.run(&argv(&["process-items", "--bogus"]), &mut term);
        assert_eq!(status, ExitStatus::Usage);
        assert_eq!(
            term.errors(),
            "Error: unknown option '--bogus'\nTry 'cmdtree process-items --help' for more information.\n"
        );
        assert!(seen.lock().unwrap().is_none());
    }

    #[test]
    fn option_without_value_fails() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let err = d
            .dispatch(&argv(&["process-items", "-i"]), &mut MemoryTerminal::new())
            .unwrap_err();
        assert!(matches!(err, CliError::MissingValue(ref o) if o == "-i"));
    }

    #[test]
    fn end_of_options_marker_binds_dash_tokens_positionally() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("upper")
                .arg(ArgumentSpec::positional("text"))
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);
        let mut term = MemoryTerminal::new();
        d.dispatch(&argv(&["upper", "--", "--help"]), &mut term).unwrap();
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().str("text").unwrap(), "--help");
    }

    #[test]
    fn excess_positionals_fail() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("upper")
                .arg(ArgumentSpec::positional("text"))
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);
        let err = d
            .dispatch(&argv(&["upper", "a", "b"]), &mut MemoryTerminal::new())
            .unwrap_err();
        assert!(matches!(err, CliError::TooManyArguments(ref t) if t == "b"));
    }

    #[test]
    fn missing_required_argument_without_prompting() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("validate-email")
                .arg(ArgumentSpec::positional("email"))
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);
        let err = d
            .dispatch(&argv(&["validate-email"]), &mut MemoryTerminal::new())
            .unwrap_err();
        assert!(matches!(err, CliError::MissingArgument(ref n) if n == "email"));
    }

    #[test]
    fn opted_in_command_prompts_for_missing_arguments() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("create-user")
                .prompt_missing()
                .arg(ArgumentSpec::option("username").required())
                .unwrap()
                .arg(ArgumentSpec::option("password").required().secret())
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);
        let mut term = MemoryTerminal::with_input("hunter2\n");
        d.dispatch(&argv(&["create-user", "--username", "ada"]), &mut term)
            .unwrap();

        let inv = seen.lock().unwrap().clone().unwrap();
        assert_eq!(inv.str("password").unwrap(), "hunter2");
        assert!(term.output().starts_with("Password: "));
        assert!(!term.output().contains("hunter2"));

        let d = d.interactive(false);
        let err = d
            .dispatch(&argv(&["create-user", "--username", "ada"]), &mut MemoryTerminal::new())
            .unwrap_err();
        assert!(matches!(err, CliError::MissingArgument(_)));
    }

    #[test]
    fn negated_flag_binds_false() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("create-user")
                .arg(
                    ArgumentSpec::flag("active")
                        .default(true)
                        .negated_by("--inactive"),
                )
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);
        d.dispatch(&argv(&["create-user", "--inactive"]), &mut MemoryTerminal::new())
            .unwrap();
        assert!(!seen.lock().unwrap().as_ref().unwrap().flag("active"));
        d.dispatch(&argv(&["create-user"]), &mut MemoryTerminal::new())
            .unwrap();
        assert!(seen.lock().unwrap().as_ref().unwrap().flag("active"));
    }

    #[test]
    fn confirmation_declined_aborts() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("dangerous")
                .confirm("Are you sure you want to do this?")
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);

        let mut term = MemoryTerminal::with_input("n\n");
        assert_eq!(d.run(&argv(&["dangerous"]), &mut term), ExitStatus::Failure);
        assert_eq!(term.errors(), "Error: Aborted!\n");
        assert!(seen.lock().unwrap().is_none());

        let mut term = MemoryTerminal::new();
        assert_eq!(d.run(&argv(&["dangerous", "--yes"]), &mut term), ExitStatus::Success);
        assert!(seen.lock().unwrap().is_some());
    }

    #[test]
    fn help_anywhere_prints_node_help() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let mut term = MemoryTerminal::new();
        let status = d.run(&argv(&["process-items", "-i", "x", "--help"]), &mut term);
        assert_eq!(status, ExitStatus::Success);
        assert!(term.output().starts_with("Usage: cmdtree process-items [OPTIONS]"));
        assert!(seen.lock().unwrap().is_none());
    }

    #[test]
    fn version_is_printed_from_root() {
        let d = dispatcher(vec![]);
        let mut term = MemoryTerminal::new();
        assert_eq!(d.run(&argv(&["-V"]), &mut term), ExitStatus::Success);
        assert_eq!(term.output(), "cmdtree 0.3.0\n");
    }

    #[test]
    fn bare_root_prints_usage_with_children() {
        let seen = Seen::default();
        let d = dispatcher(vec![process_items(&seen)]);
        let mut term = MemoryTerminal::new();
        assert_eq!(d.run(&[], &mut term), ExitStatus::Usage);
        assert!(term
            .errors()
            .starts_with("Error: 'cmdtree' requires a subcommand; expected one of: process-items\n"));
        assert!(term.errors().contains("Usage: cmdtree <COMMAND>"));
        assert!(term.errors().contains("process-items, process"));
    }

    #[test]
    fn handler_failure_exits_with_one() {
        let node = CommandNode::new("divide").handler(|_, _| {
            Err(anyhow::anyhow!("Cannot divide by zero").into())
        });
        let d = dispatcher(vec![node]);
        let mut term = MemoryTerminal::new();
        assert_eq!(d.run(&argv(&["divide"]), &mut term), ExitStatus::Failure);
        assert_eq!(term.errors(), "Error: Cannot divide by zero\n");
    }

    /// Collects formatted log lines for one test.
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn secret_values_stay_out_of_logs() {
        let seen = Seen::default();
        let node = recording(
            CommandNode::new("login")
                .prompt_missing()
                .arg(ArgumentSpec::option("user").default("ada"))
                .unwrap()
                .arg(ArgumentSpec::option("password").required().secret())
                .unwrap(),
            &seen,
        );
        let d = dispatcher(vec![node]);

        let logs = LogCapture::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut term = MemoryTerminal::with_input("hunter2\n");
        let status = tracing::subscriber::with_default(subscriber, || {
            d.run(&argv(&["login"]), &mut term)
        });
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(
            seen.lock().unwrap().as_ref().unwrap().str("password").unwrap(),
            "hunter2"
        );

        let logged = logs.text();
        assert!(logged.contains("argument=user value=ada"), "{}", logged);
        assert!(logged.contains("argument=password"), "{}", logged);
        assert!(!logged.contains("hunter2"), "{}", logged);
    }

    fn rendering_dispatcher(config: &FrameworkConfig, terminal_supports_color: bool) -> Dispatcher {
        let mut registry = CommandRegistry::new("cmdtree");
        registry
            .register(
                &[],
                CommandNode::new("show").handler(|ctx, _| {
                    let format = ctx.default_format();
                    ctx.render(&crate::render::RenderRequest::pairs([("a", "1")], format))
                }),
            )
            .unwrap();
        Dispatcher::from_config(registry, config, terminal_supports_color).unwrap()
    }

    fn show_output(config: &FrameworkConfig, terminal_supports_color: bool) -> String {
        let d = rendering_dispatcher(config, terminal_supports_color);
        let mut term = MemoryTerminal::new();
        assert_eq!(d.run(&argv(&["show"]), &mut term), ExitStatus::Success);
        term.output().to_string()
    }

    #[test]
    fn renderer_follows_color_choice_and_terminal_support() {
        use crate::config::ColorChoice;

        let cases = [
            (ColorChoice::Always, false, true),
            (ColorChoice::Always, true, true),
            (ColorChoice::Never, false, false),
            (ColorChoice::Never, true, false),
            (ColorChoice::Auto, true, true),
            (ColorChoice::Auto, false, false),
        ];
        for (color, supported, styled) in cases {
            let config = FrameworkConfig {
                color,
                ..FrameworkConfig::default()
            };
            let out = show_output(&config, supported);
            assert_eq!(
                out.contains('\x1b'),
                styled,
                "color={} supported={} output={:?}",
                color,
                supported,
                out
            );
            if !styled {
                assert_eq!(out, "a 1\n");
            }
        }
    }

    #[test]
    fn config_reaches_the_renderer() {
        let config = FrameworkConfig {
            default_format: OutputFormat::Csv,
            color: crate::config::ColorChoice::Never,
            csv_header: true,
            ..FrameworkConfig::default()
        };
        assert_eq!(show_output(&config, false), "key,value\na,1\n");

        let config = FrameworkConfig {
            csv_header: false,
            ..config
        };
        assert_eq!(show_output(&config, false), "a,1\n");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(ExitStatus::Usage.code(), 2);
    }
}
