use crate::error::{CliError, Result};
use crate::render::OutputFormat;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILENAME: &str = "cmdtree.json";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "CMDTREE_CONFIG_DIR";

/// When to emit ANSI styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `Auto` defers to whether the output terminal supports colors.
    pub fn use_color(self, terminal_supports_color: bool) -> bool {
        match self {
            ColorChoice::Auto => terminal_supports_color,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        })
    }
}

impl FromStr for ColorChoice {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(CliError::InvalidChoice {
                name: "color".to_string(),
                value: other.to_string(),
                choices: vec!["auto".into(), "always".into(), "never".into()],
            }),
        }
    }
}

/// Framework settings, stored as `cmdtree.json` in the config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameworkConfig {
    /// Format used by commands that do not take `--format` explicitly.
    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default)]
    pub color: ColorChoice,

    /// Emit a `key,value` header line when rendering pairs as csv.
    #[serde(default)]
    pub csv_header: bool,

    /// When off, commands never prompt for missing arguments.
    #[serde(default = "default_interactive")]
    pub interactive: bool,
}

fn default_interactive() -> bool {
    true
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::default(),
            color: ColorChoice::default(),
            csv_header: false,
            interactive: default_interactive(),
        }
    }
}

impl FrameworkConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        serde_json::from_str(&content).map_err(|e| {
            CliError::Config(format!("{}: {}", config_path.display(), e))
        })
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }
}

/// `$CMDTREE_CONFIG_DIR`, else the platform config directory.
pub fn default_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from("", "", "cmdtree").map(|dirs| dirs.config_dir().to_path_buf())
}
