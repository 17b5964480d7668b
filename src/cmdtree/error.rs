use crate::dispatch::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid argument spec '{name}': {reason}")]
    InvalidSpec { name: String, reason: String },

    #[error("duplicate argument '{name}' in command '{command}'")]
    DuplicateArgument { command: String, name: String },

    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("'{command}' requires a subcommand; expected one of: {}", .choices.join(", "))]
    IncompleteCommand {
        command: String,
        choices: Vec<String>,
    },

    #[error("unknown command '{token}' for '{command}'; expected one of: {}", .choices.join(", "))]
    UnknownCommand {
        command: String,
        token: String,
        choices: Vec<String>,
    },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' requires a value")]
    MissingValue(String),

    #[error("too many arguments: unexpected '{0}'")]
    TooManyArguments(String),

    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("invalid value '{value}' for '{name}': expected {expected}")]
    TypeMismatch {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid value '{value}' for '{name}': choose from {}", .choices.join(", "))]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("value {value} for '{name}' is out of range: {bound}")]
    OutOfRange {
        name: String,
        value: String,
        bound: String,
    },

    #[error("input stream closed")]
    InputClosed,

    #[error("Aborted!")]
    UserAbort,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0:#}")]
    HandlerFailure(#[from] anyhow::Error),
}

impl CliError {
    pub fn invalid_spec(name: &str, reason: impl Into<String>) -> Self {
        CliError::InvalidSpec {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Usage and validation failures: bad declarations or bad input, detected
    /// before a handler runs.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            CliError::InvalidSpec { .. }
                | CliError::DuplicateArgument { .. }
                | CliError::DuplicateCommand(_)
                | CliError::IncompleteCommand { .. }
                | CliError::UnknownCommand { .. }
                | CliError::UnknownOption(_)
                | CliError::MissingValue(_)
                | CliError::TooManyArguments(_)
                | CliError::MissingArgument(_)
                | CliError::TypeMismatch { .. }
                | CliError::InvalidChoice { .. }
                | CliError::OutOfRange { .. }
        )
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.is_usage() {
            ExitStatus::Usage
        } else {
            ExitStatus::Failure
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Render(err.to_string())
    }
}

impl From<cmdtree_style::TemplateError> for CliError {
    fn from(err: cmdtree_style::TemplateError) -> Self {
        CliError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
