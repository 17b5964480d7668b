//! Prompt engine.
//!
//! Blocking, sequential acquisition of values from the terminal's input stream.
//! Prompts that parse their answer re-ask on bad input, printing the error, until
//! they succeed or the input closes (`InputClosed`).

use crate::coerce::coerce;
use crate::error::{CliError, Result};
use crate::schema::{ArgumentSpec, ValueType};
use crate::terminal::Terminal;
use crate::value::TypedValue;

pub struct Prompter<'t> {
    term: &'t mut dyn Terminal,
}

impl<'t> Prompter<'t> {
    pub fn new(term: &'t mut dyn Terminal) -> Self {
        Self { term }
    }

    /// Reads one line as typed.
    pub fn prompt_text(&mut self, label: &str) -> Result<String> {
        self.ask(label, false)
    }

    /// Reads one line without echoing it.
    pub fn prompt_masked(&mut self, label: &str) -> Result<String> {
        self.ask(label, true)
    }

    /// Reads until the answer parses as `value_type`.
    ///
    /// Enum prompts need their choices; use [`Prompter::prompt_argument`].
    pub fn prompt_typed(&mut self, label: &str, value_type: ValueType) -> Result<TypedValue> {
        if value_type == ValueType::Enum {
            return Err(CliError::invalid_spec(label, "enum prompts need choices"));
        }
        let mut spec = ArgumentSpec::option(label);
        spec.value_type = value_type;
        self.ask_until_valid(label, &spec)
    }

    /// Prompts for a missing argument, honoring its type, bounds, choices and
    /// secrecy.
    pub fn prompt_argument(&mut self, spec: &ArgumentSpec) -> Result<TypedValue> {
        let mut label = if spec.help.is_empty() {
            capitalize(&spec.name.replace('_', " "))
        } else {
            spec.help.clone()
        };
        if !spec.choices.is_empty() {
            label = format!("{} [{}]", label, spec.choices.join("/"));
        }
        self.ask_until_valid(&label, spec)
    }

    /// Asks a yes/no question. Empty input picks `default_yes`.
    pub fn prompt_confirm(&mut self, label: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        loop {
            self.term.write_out(&format!("{} {}: ", label, hint))?;
            let line = self.term.read_line()?.ok_or(CliError::InputClosed)?;
            match line.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default_yes),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.term.write_err("Error: invalid input\n")?,
            }
        }
    }

    fn ask_until_valid(&mut self, label: &str, spec: &ArgumentSpec) -> Result<TypedValue> {
        loop {
            let raw = self.ask(label, spec.secret)?;
            if raw.is_empty() {
                continue;
            }
            match coerce(&raw, spec) {
                Ok(value) => return Ok(value),
                Err(err) => self.term.write_err(&format!("Error: {}\n", err))?,
            }
        }
    }

    fn ask(&mut self, label: &str, masked: bool) -> Result<String> {
        self.term.write_out(&format!("{}: ", label))?;
        let line = if masked {
            self.term.read_secret_line()?
        } else {
            self.term.read_line()?
        };
        line.ok_or(CliError::InputClosed)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::MemoryTerminal;

    #[test]
    fn text_prompt_returns_line() {
        let mut term = MemoryTerminal::with_input("Ada\n");
        let name = Prompter::new(&mut term).prompt_text("What's your name?").unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(term.output(), "What's your name?: Ada\n");
    }

    #[test]
    fn typed_prompt_retries_until_valid() {
        let mut term = MemoryTerminal::with_input("old\n42\n");
        let age = Prompter::new(&mut term)
            .prompt_typed("What's your age?", ValueType::Integer)
            .unwrap();
        assert_eq!(age, TypedValue::Int(42));
        assert!(term.errors().contains("expected integer"));
    }

    #[test]
    fn typed_prompt_fails_when_input_closes() {
        let mut term = MemoryTerminal::with_input("abc\n");
        let err = Prompter::new(&mut term)
            .prompt_typed("Amount", ValueType::Float)
            .unwrap_err();
        assert!(matches!(err, CliError::InputClosed));
    }

    #[test]
    fn masked_prompt_does_not_echo() {
        let mut term = MemoryTerminal::with_input("s3cret\n");
        let password = Prompter::new(&mut term).prompt_masked("Enter password").unwrap();
        assert_eq!(password, "s3cret");
        assert!(!term.output().contains("s3cret"));
    }

    #[test]
    fn confirm_uses_default_on_empty_line() {
        let mut term = MemoryTerminal::with_input("\n");
        let answer = Prompter::new(&mut term).prompt_confirm("Continue?", false).unwrap();
        assert!(!answer);
        assert!(term.output().starts_with("Continue? [y/N]: "));

        let mut term = MemoryTerminal::with_input("\n");
        assert!(Prompter::new(&mut term).prompt_confirm("Continue?", true).unwrap());
    }

    #[test]
    fn confirm_reprompts_on_unknown_answer() {
        let mut term = MemoryTerminal::with_input("maybe\nYES\n");
        assert!(Prompter::new(&mut term).prompt_confirm("Continue?", false).unwrap());
        assert_eq!(term.errors(), "Error: invalid input\n");
    }

    #[test]
    fn confirm_fails_when_input_closes() {
        let mut term = MemoryTerminal::new();
        let err = Prompter::new(&mut term).prompt_confirm("Continue?", true).unwrap_err();
        assert!(matches!(err, CliError::InputClosed));
    }

    #[test]
    fn argument_prompt_shows_choices_and_checks_them() {
        let spec = ArgumentSpec::option("format").one_of(["json", "csv"]);
        let mut term = MemoryTerminal::with_input("xml\ncsv\n");
        let value = Prompter::new(&mut term).prompt_argument(&spec).unwrap();
        assert_eq!(value, TypedValue::Str("csv".into()));
        assert!(term.output().starts_with("Format [json/csv]: "));
        assert!(term.errors().contains("choose from json, csv"));
    }

    #[test]
    fn argument_prompt_skips_empty_answers() {
        let spec = ArgumentSpec::positional("username");
        let mut term = MemoryTerminal::with_input("\nbob\n");
        let value = Prompter::new(&mut term).prompt_argument(&spec).unwrap();
        assert_eq!(value, TypedValue::Str("bob".into()));
    }

    #[test]
    fn enum_typed_prompt_is_rejected() {
        let mut term = MemoryTerminal::with_input("json\n");
        assert!(Prompter::new(&mut term)
            .prompt_typed("Format", ValueType::Enum)
            .is_err());
    }
}
