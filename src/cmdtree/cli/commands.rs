use super::handlers;
use super::setup::{init_logging, Launcher};
use clap::Parser;
use cmdtree::config::default_config_dir;
use cmdtree::{
    ArgumentSpec, CommandContext, CommandNode, CommandRegistry, Dispatcher, FrameworkConfig,
    ParsedInvocation, Result, StdTerminal, Terminal,
};
use std::process::ExitCode;
use tracing::debug;

type HandlerFn = fn(&mut CommandContext<'_>, &ParsedInvocation) -> Result<()>;

pub fn run() -> ExitCode {
    let launcher = Launcher::parse();
    init_logging();

    let mut term = StdTerminal::new();
    match build_dispatcher(&launcher) {
        Ok(dispatcher) => dispatcher.run(&launcher.args, &mut term).into(),
        Err(err) => {
            let status = err.exit_status();
            // Nothing left to report to if stderr itself fails.
            let _ = term.write_err(&format!("Error: {}\n", err));
            status.into()
        }
    }
}

fn build_dispatcher(launcher: &Launcher) -> Result<Dispatcher> {
    let mut config = match launcher.config_dir.clone().or_else(default_config_dir) {
        Some(dir) => {
            debug!(dir = %dir.display(), "loading config");
            FrameworkConfig::load(&dir)?
        }
        None => FrameworkConfig::default(),
    };
    if let Some(color) = launcher.color {
        config.color = color;
    }
    Dispatcher::from_config(build_registry()?, &config, console::colors_enabled())
}

/// The demo command tree.
pub fn build_registry() -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new("cmdtree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Command-tree framework demo");

    registry.register(&[], hello()?)?;
    registry.register(&[], create_user()?)?;
    registry.register(&[], deploy()?)?;
    registry.register(&[], process_items()?)?;
    registry.register(&[], show_info()?)?;
    registry.register(
        &[],
        CommandNode::new("interactive")
            .about("Prompt for a few values")
            .handler(handlers::interactive),
    )?;
    registry.register(
        &[],
        CommandNode::new("validate-email")
            .about("Check an email address")
            .arg(ArgumentSpec::positional("email").help("Address to check"))?
            .handler(handlers::validate_email),
    )?;
    registry.register(
        &[],
        CommandNode::new("dangerous")
            .about("An operation that asks first")
            .confirm("Are you sure you want to continue?")?
            .handler(handlers::dangerous),
    )?;

    register_files(&mut registry)?;
    registry.describe(&["files"], "File operations")?;
    register_calc(&mut registry)?;
    registry.describe(&["calc"], "Calculator")?;
    register_text(&mut registry)?;
    registry.describe(&["text"], "Text utilities")?;

    Ok(registry)
}

fn hello() -> Result<CommandNode> {
    Ok(CommandNode::new("hello")
        .about("Say hello")
        .arg(
            ArgumentSpec::option("name")
                .short('n')
                .default("World")
                .help("Who to greet"),
        )?
        .arg(
            ArgumentSpec::option("count")
                .short('c')
                .integer()
                .default(1)
                .min(1.0)
                .help("How many times"),
        )?
        .arg(
            ArgumentSpec::option("greeting")
                .short('g')
                .default("Hello")
                .help("Greeting word"),
        )?
        .arg(ArgumentSpec::flag("shout").short('s').help("Shout it"))?
        .handler(handlers::hello))
}

fn create_user() -> Result<CommandNode> {
    Ok(CommandNode::new("create-user")
        .about("Create a user")
        .prompt_missing()
        .arg(ArgumentSpec::positional("username").help("Username"))?
        .arg(
            ArgumentSpec::option("email")
                .short('e')
                .optional()
                .help("Email address"),
        )?
        .arg(
            ArgumentSpec::option("age")
                .short('a')
                .integer()
                .range(0.0, 150.0)
                .optional()
                .help("Age"),
        )?
        .arg(
            ArgumentSpec::flag("active")
                .default(true)
                .negated_by("--inactive")
                .help("Whether the account is active"),
        )?
        .handler(handlers::create_user))
}

fn deploy() -> Result<CommandNode> {
    Ok(CommandNode::new("deploy")
        .about("Deploy the application")
        .arg(
            ArgumentSpec::option("env")
                .short('e')
                .one_of(["development", "staging", "production"])
                .default("development")
                .help("Target environment"),
        )?
        .arg(ArgumentSpec::flag("force").short('f').help("Skip safety checks"))?
        .arg(ArgumentSpec::flag("dry_run").help("Show what would happen"))?
        .arg(
            ArgumentSpec::option("config")
                .short('c')
                .optional()
                .help("Config file"),
        )?
        .handler(handlers::deploy))
}

fn process_items() -> Result<CommandNode> {
    Ok(CommandNode::new("process-items")
        .alias("process")
        .about("Process a list of items")
        .arg(
            ArgumentSpec::option("item")
                .short('i')
                .repeated()
                .delimiter(',')
                .help("Item to process"),
        )?
        .arg(ArgumentSpec::flag("verbose").short('v').help("Show each step"))?
        .handler(handlers::process_items))
}

fn show_info() -> Result<CommandNode> {
    Ok(CommandNode::new("show-info")
        .alias("info")
        .about("Show library information")
        .arg(
            ArgumentSpec::option("format")
                .short('f')
                .one_of(["json", "csv", "table"])
                .optional()
                .help("Output format"),
        )?
        .handler(handlers::show_info))
}

fn register_files(registry: &mut CommandRegistry) -> Result<()> {
    registry.register(
        &["files"],
        CommandNode::new("create-file")
            .about("Create a file")
            .arg(ArgumentSpec::positional("filename").help("File to create"))?
            .arg(
                ArgumentSpec::option("content")
                    .short('c')
                    .default("Hello from cmdtree!")
                    .help("File content"),
            )?
            .handler(handlers::create_file),
    )?;
    registry.register(
        &["files"],
        CommandNode::new("read-file")
            .alias("cat")
            .about("Print a file")
            .arg(ArgumentSpec::positional("filename").help("File to read"))?
            .handler(handlers::read_file),
    )?;
    registry.register(
        &["files"],
        CommandNode::new("append-to-file")
            .about("Append a line to a file")
            .arg(ArgumentSpec::positional("filename").help("File to append to"))?
            .arg(ArgumentSpec::positional("content").help("Line to append"))?
            .handler(handlers::append_to_file),
    )
}

fn register_calc(registry: &mut CommandRegistry) -> Result<()> {
    let ops: [(&str, &str, HandlerFn); 4] = [
        ("add", "Add two numbers", handlers::add),
        ("subtract", "Subtract b from a", handlers::subtract),
        ("multiply", "Multiply two numbers", handlers::multiply),
        ("divide", "Divide a by b", handlers::divide),
    ];
    for (name, about, handler) in ops {
        registry.register(
            &["calc"],
            CommandNode::new(name)
                .about(about)
                .arg(ArgumentSpec::positional("a").float().help("First number"))?
                .arg(ArgumentSpec::positional("b").float().help("Second number"))?
                .handler(handler),
        )?;
    }
    Ok(())
}

fn register_text(registry: &mut CommandRegistry) -> Result<()> {
    let ops: [(&str, &str, HandlerFn); 4] = [
        ("upper", "Uppercase text", handlers::upper),
        ("lower", "Lowercase text", handlers::lower),
        ("reverse", "Reverse text", handlers::reverse),
        ("count-words", "Count words", handlers::count_words),
    ];
    for (name, about, handler) in ops {
        registry.register(
            &["text"],
            CommandNode::new(name)
                .about(about)
                .arg(ArgumentSpec::positional("text").help("Text to transform"))?
                .handler(handler),
        )?;
    }
    Ok(())
}
