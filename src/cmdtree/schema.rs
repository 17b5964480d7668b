//! Argument schema.
//!
//! An [`ArgumentSpec`] declares one parameter of a command: how it appears on the
//! command line ([`ArgKind`]), what it parses to ([`ValueType`]) and which
//! constraints apply. Specs are pure data; the only behavior here is structural
//! validation when a spec is added to a command's [`ArgumentSet`].

use crate::error::{CliError, Result};
use crate::value::TypedValue;

/// Tokens the dispatcher reserves for help output.
pub const HELP_ALIASES: &[&str] = &["-h", "--help"];

/// How an argument appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Bound by position, in declaration order.
    Positional,
    /// `--name value`, `--name=value` or a short alias followed by a value.
    Option,
    /// Presence sets `true`; consumes no following token.
    Flag,
}

/// What a raw token is converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Enum,
    /// One element per occurrence of the option, in order of appearance.
    RepeatedString,
}

impl ValueType {
    pub fn label(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Enum => "choice",
            ValueType::RepeatedString => "string list",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }
}

/// Declarative description of one command parameter.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    /// Unique within the command; the key handlers look values up by.
    pub name: String,
    pub kind: ArgKind,
    pub value_type: ValueType,
    pub default: Option<TypedValue>,
    pub required: bool,
    /// Full command-line spellings, e.g. `--count` and `-c`.
    pub aliases: Vec<String>,
    /// Off-switch for a flag, e.g. `--inactive` for `--active`.
    pub negation: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Allowed values for [`ValueType::Enum`].
    pub choices: Vec<String>,
    /// Splits each occurrence of a repeated option into several elements.
    pub delimiter: Option<char>,
    /// Prompted values are read without echo.
    pub secret: bool,
    pub help: String,
}

impl ArgumentSpec {
    fn new(name: &str, kind: ArgKind, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value_type,
            default: None,
            required: false,
            aliases: Vec::new(),
            negation: None,
            min: None,
            max: None,
            choices: Vec::new(),
            delimiter: None,
            secret: false,
            help: String::new(),
        }
    }

    /// A required string positional.
    pub fn positional(name: &str) -> Self {
        let mut spec = Self::new(name, ArgKind::Positional, ValueType::String);
        spec.required = true;
        spec
    }

    /// An optional string option spelled `--<name>` (underscores become hyphens).
    pub fn option(name: &str) -> Self {
        let mut spec = Self::new(name, ArgKind::Option, ValueType::String);
        spec.aliases.push(long_alias(name));
        spec
    }

    /// A boolean flag spelled `--<name>`, defaulting to `false`.
    pub fn flag(name: &str) -> Self {
        let mut spec = Self::new(name, ArgKind::Flag, ValueType::Boolean);
        spec.aliases.push(long_alias(name));
        spec.default = Some(TypedValue::Bool(false));
        spec
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn short(mut self, c: char) -> Self {
        self.aliases.push(format!("-{}", c));
        self
    }

    /// Adds an extra spelling. Must carry its own leading dashes.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn string(mut self) -> Self {
        self.value_type = ValueType::String;
        self
    }

    pub fn integer(mut self) -> Self {
        self.value_type = ValueType::Integer;
        self
    }

    pub fn float(mut self) -> Self {
        self.value_type = ValueType::Float;
        self
    }

    pub fn boolean(mut self) -> Self {
        self.value_type = ValueType::Boolean;
        self
    }

    /// Makes this an enum argument restricted to `choices`.
    pub fn one_of<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_type = ValueType::Enum;
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Sets allowed values without changing the value type.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn repeated(mut self) -> Self {
        self.value_type = ValueType::RepeatedString;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn default(mut self, value: impl Into<TypedValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn negated_by(mut self, alias: &str) -> Self {
        self.negation = Some(alias.to_string());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn is_positional(&self) -> bool {
        self.kind == ArgKind::Positional
    }

    pub fn matches_alias(&self, token: &str) -> bool {
        self.aliases.iter().any(|a| a == token)
    }

    /// The declared default, widened to the declared type (an integer default
    /// on a float argument becomes a float).
    pub fn default_value(&self) -> Option<TypedValue> {
        match (&self.default, self.value_type) {
            (Some(TypedValue::Int(v)), ValueType::Float) => Some(TypedValue::Float(*v as f64)),
            (default, _) => default.clone(),
        }
    }

    /// Placeholder shown in help, e.g. `<INTEGER>` or `<json|csv|table>`.
    pub fn value_name(&self) -> String {
        match self.value_type {
            ValueType::String => "<TEXT>".to_string(),
            ValueType::Integer => "<INTEGER>".to_string(),
            ValueType::Float => "<FLOAT>".to_string(),
            ValueType::Boolean => "<BOOLEAN>".to_string(),
            ValueType::Enum => format!("<{}>", self.choices.join("|")),
            ValueType::RepeatedString => "<TEXT>...".to_string(),
        }
    }

    /// Structural checks that do not depend on sibling arguments.
    pub fn validate_bounds(&self) -> Result<()> {
        let name = self.name.as_str();
        if name.is_empty() {
            return Err(CliError::invalid_spec(name, "name cannot be empty"));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(CliError::invalid_spec(
                    name,
                    format!("min {} is greater than max {}", min, max),
                ));
            }
        }
        if (self.min.is_some() || self.max.is_some()) && !self.value_type.is_numeric() {
            return Err(CliError::invalid_spec(
                name,
                "numeric bounds on a non-numeric argument",
            ));
        }
        match (self.value_type, self.choices.is_empty()) {
            (ValueType::Enum, true) => {
                return Err(CliError::invalid_spec(name, "enum argument without choices"))
            }
            (ValueType::Enum, false) => {}
            (_, false) => {
                return Err(CliError::invalid_spec(
                    name,
                    "enum constraints on a non-enum argument",
                ))
            }
            (_, true) => {}
        }
        if self.delimiter.is_some() && self.value_type != ValueType::RepeatedString {
            return Err(CliError::invalid_spec(
                name,
                "a delimiter requires a repeated argument",
            ));
        }

        match self.kind {
            ArgKind::Positional => {
                if !self.aliases.is_empty() || self.negation.is_some() {
                    return Err(CliError::invalid_spec(name, "positionals take no aliases"));
                }
                if self.value_type == ValueType::RepeatedString {
                    return Err(CliError::invalid_spec(
                        name,
                        "repeated values are only supported for options",
                    ));
                }
            }
            ArgKind::Option | ArgKind::Flag => {
                if self.aliases.is_empty() {
                    return Err(CliError::invalid_spec(name, "options need at least one alias"));
                }
                let spellings = self.aliases.iter().chain(self.negation.iter());
                for alias in spellings {
                    if !alias.starts_with('-') || alias.trim_start_matches('-').is_empty() {
                        return Err(CliError::invalid_spec(
                            name,
                            format!("alias '{}' must start with '-'", alias),
                        ));
                    }
                    if HELP_ALIASES.contains(&alias.as_str()) {
                        return Err(CliError::invalid_spec(
                            name,
                            format!("alias '{}' is reserved for help", alias),
                        ));
                    }
                }
            }
        }
        if self.kind == ArgKind::Flag && self.value_type != ValueType::Boolean {
            return Err(CliError::invalid_spec(name, "flags are always boolean"));
        }
        if self.negation.is_some() && self.kind != ArgKind::Flag {
            return Err(CliError::invalid_spec(name, "only flags can be negated"));
        }

        if let Some(default) = self.default_value() {
            self.validate_default(&default)?;
        }
        Ok(())
    }

    fn validate_default(&self, default: &TypedValue) -> Result<()> {
        let name = self.name.as_str();
        let type_ok = matches!(
            (self.value_type, default),
            (ValueType::String, TypedValue::Str(_))
                | (ValueType::Enum, TypedValue::Str(_))
                | (ValueType::Integer, TypedValue::Int(_))
                | (ValueType::Float, TypedValue::Float(_))
                | (ValueType::Boolean, TypedValue::Bool(_))
                | (ValueType::RepeatedString, TypedValue::List(_))
        );
        if !type_ok {
            return Err(CliError::invalid_spec(
                name,
                format!("default does not match type {}", self.value_type.label()),
            ));
        }
        if let TypedValue::Str(s) = default {
            if self.value_type == ValueType::Enum && !self.choices.contains(s) {
                return Err(CliError::invalid_spec(
                    name,
                    format!("default '{}' is not one of the choices", s),
                ));
            }
        }
        if let Some(v) = default.as_float() {
            let below = self.min.is_some_and(|min| v < min);
            let above = self.max.is_some_and(|max| v > max);
            if below || above {
                return Err(CliError::invalid_spec(name, "default is out of range"));
            }
        }
        Ok(())
    }
}

fn long_alias(name: &str) -> String {
    format!("--{}", name.replace('_', "-"))
}

/// The ordered arguments of one command.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSet {
    command: String,
    args: Vec<ArgumentSpec>,
}

impl ArgumentSet {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            args: Vec::new(),
        }
    }

    /// Adds an argument after validating it against its siblings.
    pub fn define(&mut self, spec: ArgumentSpec) -> Result<()> {
        spec.validate_bounds()?;

        if self.get(&spec.name).is_some() {
            return Err(self.duplicate(&spec.name));
        }

        let mut spellings: Vec<&str> = Vec::new();
        for alias in spec.aliases.iter().chain(spec.negation.iter()) {
            if spellings.contains(&alias.as_str()) || self.find(alias).is_some() {
                return Err(self.duplicate(alias));
            }
            spellings.push(alias);
        }

        if spec.is_positional() && spec.default.is_none() {
            if let Some(earlier) = self.positionals().find(|p| p.default.is_some()) {
                return Err(CliError::invalid_spec(
                    &spec.name,
                    format!("cannot follow defaulted positional '{}'", earlier.name),
                ));
            }
        }

        self.args.push(spec);
        Ok(())
    }

    fn duplicate(&self, name: &str) -> CliError {
        CliError::DuplicateArgument {
            command: self.command.clone(),
            name: name.to_string(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Looks up an option or flag by spelling. The boolean is `true` when the
    /// token is the flag's negation.
    pub fn find(&self, token: &str) -> Option<(&ArgumentSpec, bool)> {
        self.args.iter().find_map(|a| {
            if a.matches_alias(token) {
                Some((a, false))
            } else if a.negation.as_deref() == Some(token) {
                Some((a, true))
            } else {
                None
            }
        })
    }

    pub fn positionals(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.args.iter().filter(|a| a.is_positional())
    }

    pub fn options(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.args.iter().filter(|a| !a.is_positional())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
