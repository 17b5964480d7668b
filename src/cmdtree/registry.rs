//! Command registry.
//!
//! Commands form a tree. Leaves carry a handler, groups carry children, never
//! both. Each node records the names on its path from the root instead of a back
//! pointer to its parent, so the tree stays a plain owned structure.
//!
//! Lookup is exact: a token matches a child by name or by one of its aliases.
//! There is no prefix matching.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CliError, Result};
use crate::invocation::{CommandContext, ParsedInvocation};
use crate::schema::{ArgumentSet, ArgumentSpec};

/// The callable attached to a leaf command.
pub type Handler =
    Arc<dyn Fn(&mut CommandContext<'_>, &ParsedInvocation) -> Result<()> + Send + Sync>;

/// Name of the flag that skips a command's confirmation prompt.
pub const CONFIRM_FLAG: &str = "yes";

#[derive(Clone)]
pub struct CommandNode {
    name: String,
    about: String,
    aliases: Vec<String>,
    hidden: bool,
    args: ArgumentSet,
    handler: Option<Handler>,
    children: Vec<CommandNode>,
    prompt_missing: bool,
    confirmation: Option<String>,
    path: Vec<String>,
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("args", &self.args.len())
            .field("handler", &self.handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl CommandNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            about: String::new(),
            aliases: Vec::new(),
            hidden: false,
            args: ArgumentSet::new(name),
            handler: None,
            children: Vec::new(),
            prompt_missing: false,
            confirmation: None,
            path: vec![name.to_string()],
        }
    }

    pub fn about(mut self, about: &str) -> Self {
        self.about = about.to_string();
        self
    }

    /// An alternative name, matched exactly like the primary one.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Omitted from help listings but still dispatchable.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn arg(mut self, spec: ArgumentSpec) -> Result<Self> {
        self.args.define(spec)?;
        Ok(self)
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &ParsedInvocation) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Ask for missing required arguments interactively instead of failing.
    pub fn prompt_missing(mut self) -> Self {
        self.prompt_missing = true;
        self
    }

    /// Ask `prompt` before running; declining aborts. Adds a `--yes`/`-y` flag
    /// that answers the question up front.
    pub fn confirm(mut self, prompt: &str) -> Result<Self> {
        self.args.define(
            ArgumentSpec::flag(CONFIRM_FLAG)
                .short('y')
                .help("Confirm the action without prompting"),
        )?;
        self.confirmation = Some(prompt.to_string());
        Ok(self)
    }

    pub fn subcommand(mut self, child: CommandNode) -> Result<Self> {
        self.add_child(child)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help_text(&self) -> &str {
        &self.about
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn args(&self) -> &ArgumentSet {
        &self.args
    }

    pub fn handler_fn(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    pub fn visible_children(&self) -> impl Iterator<Item = &CommandNode> {
        self.children.iter().filter(|c| !c.hidden)
    }

    pub fn is_leaf(&self) -> bool {
        self.handler.is_some()
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn prompts_missing(&self) -> bool {
        self.prompt_missing
    }

    pub fn confirmation(&self) -> Option<&str> {
        self.confirmation.as_deref()
    }

    /// Names from the root down to and including this node. Empty for the root.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The path of the enclosing group.
    pub fn parent_path(&self) -> &[String] {
        match self.path.split_last() {
            Some((_, parent)) => parent,
            None => &[],
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }

    pub fn find_child(&self, token: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.matches(token))
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CliError::invalid_spec("", "command name cannot be empty"));
        }
        match (self.handler.is_some(), self.children.is_empty()) {
            (true, false) => Err(CliError::invalid_spec(
                &self.name,
                "a command cannot have both a handler and subcommands",
            )),
            (false, true) => Err(CliError::invalid_spec(
                &self.name,
                "a command needs a handler or subcommands",
            )),
            _ => {
                if self.is_group() && !self.args.is_empty() {
                    return Err(CliError::invalid_spec(
                        &self.name,
                        "command groups take no arguments",
                    ));
                }
                self.children.iter().try_for_each(CommandNode::validate)
            }
        }
    }

    /// Inserts `child`, merging it into an existing group of the same name. Any
    /// other name or alias collision is a duplicate.
    fn add_child(&mut self, mut child: CommandNode) -> Result<()> {
        let clash = self.children.iter().position(|existing| {
            existing.matches(&child.name) || child.aliases.iter().any(|a| existing.matches(a))
        });

        match clash {
            Some(idx)
                if self.children[idx].name == child.name
                    && self.children[idx].is_group()
                    && child.is_group() =>
            {
                let existing = &mut self.children[idx];
                if existing.about.is_empty() {
                    existing.about = std::mem::take(&mut child.about);
                }
                for grandchild in std::mem::take(&mut child.children) {
                    existing.add_child(grandchild)?;
                }
                Ok(())
            }
            Some(_) => {
                let mut path = self.path.clone();
                path.push(child.name);
                Err(CliError::DuplicateCommand(path.join(" ")))
            }
            None => {
                child.rebase(&self.path);
                self.children.push(child);
                Ok(())
            }
        }
    }

    fn rebase(&mut self, parent: &[String]) {
        self.path = parent.to_vec();
        self.path.push(self.name.clone());
        let path = self.path.clone();
        for child in &mut self.children {
            child.rebase(&path);
        }
    }
}

/// The command tree of one program.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    program: String,
    version: Option<String>,
    root: CommandNode,
}

impl CommandRegistry {
    pub fn new(program: &str) -> Self {
        let mut root = CommandNode::new(program);
        root.path.clear();
        Self {
            program: program.to_string(),
            version: None,
            root,
        }
    }

    pub fn about(mut self, about: &str) -> Self {
        self.root.about = about.to_string();
        self
    }

    /// Enables `--version`/`-V` on the root.
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn version_string(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Attaches `node` under `parent`, creating missing intermediate groups.
    pub fn register(&mut self, parent: &[&str], node: CommandNode) -> Result<()> {
        node.validate()?;

        let mut current = &mut self.root;
        for segment in parent {
            let idx = match current.children.iter().position(|c| c.matches(segment)) {
                Some(idx) => idx,
                None => {
                    let mut group = CommandNode::new(segment);
                    group.rebase(&current.path);
                    current.children.push(group);
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
            if current.is_leaf() {
                return Err(CliError::DuplicateCommand(current.path.join(" ")));
            }
        }

        debug!(parent = %parent.join(" "), command = %node.name, "registering command");
        current.add_child(node)
    }

    /// Sets the help text of an existing group or command.
    pub fn describe(&mut self, path: &[&str], about: &str) -> Result<()> {
        let mut current = &mut self.root;
        for segment in path {
            let idx = match current.children.iter().position(|c| c.matches(segment)) {
                Some(idx) => idx,
                None => return Err(unknown_command(&self.program, current, segment)),
            };
            current = &mut current.children[idx];
        }
        current.about = about.to_string();
        Ok(())
    }

    /// Looks a node up by exact path.
    pub fn find(&self, path: &[&str]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(&self.root, |node, segment| node.find_child(segment))
    }

    /// Descends as far as `tokens` name commands. Never fails; the remaining
    /// tokens start at the first one that is not a child of the returned node.
    pub fn walk<'t>(&self, tokens: &'t [String]) -> (&CommandNode, &'t [String]) {
        let mut node = &self.root;
        let mut rest = tokens;
        while let Some((token, tail)) = rest.split_first() {
            match node.find_child(token) {
                Some(child) if !node.is_leaf() => {
                    node = child;
                    rest = tail;
                }
                _ => break,
            }
        }
        (node, rest)
    }

    /// Descends to a leaf, returning it with the tokens left for its arguments.
    pub fn resolve<'t>(&self, tokens: &'t [String]) -> Result<(&CommandNode, &'t [String])> {
        let mut node = &self.root;
        let mut rest = tokens;
        loop {
            if node.is_leaf() {
                return Ok((node, rest));
            }
            let Some((token, tail)) = rest.split_first() else {
                return Err(CliError::IncompleteCommand {
                    command: self.display_path(node),
                    choices: visible_names(node),
                });
            };
            match node.find_child(token) {
                Some(child) => {
                    node = child;
                    rest = tail;
                }
                None => return Err(unknown_command(&self.program, node, token)),
            }
        }
    }

    /// The program name followed by the node's path, e.g. `cmdtree files create-file`.
    pub fn display_path(&self, node: &CommandNode) -> String {
        std::iter::once(self.program.as_str())
            .chain(node.path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn visible_names(node: &CommandNode) -> Vec<String> {
    node.visible_children().map(|c| c.name.clone()).collect()
}

fn unknown_command(program: &str, node: &CommandNode, token: &str) -> CliError {
    let command = std::iter::once(program)
        .chain(node.path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    CliError::UnknownCommand {
        command,
        token: token.to_string(),
        choices: visible_names(node),
    }
}
