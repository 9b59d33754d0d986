//! Interactive completion of a [`PartialConfiguration`].
//!
//! Every required field that the command line left empty or got wrong is
//! asked for until the answer passes the field's validator. Subject
//! alternative names are collected in a yes/no loop, but only when no
//! `--san` flag yielded a valid entry.

use std::io::{self, BufRead, Write};

use log::warn;

use crate::config::{Configuration, Defaults, PartialConfiguration, SanEntry, SanType};
use crate::error::{CertIssueError, Result};
use crate::validate::{self, ValidationError};

/// Line-oriented operator input.
pub trait Prompter {
    /// Shows `message` and reads one line. `None` means the input ended.
    fn read_line(&mut self, message: &str) -> io::Result<Option<String>>;

    fn show_error(&mut self, message: &str) -> io::Result<()>;
}

/// A [`Prompter`] over any reader and writer, normally stdin and stdout.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn read_line(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn show_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "Error: {message}")
    }
}

/// The values the interview can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CommonName,
    Duration,
    CaCert,
    CaKey,
    CaSerial,
    AddSan,
    SanType,
    SanValue(SanType),
}

impl Field {
    /// Human name, also used in [`CertIssueError::InputClosed`].
    pub fn label(&self) -> &'static str {
        match self {
            Field::CommonName => "common name",
            Field::Duration => "validity in days",
            Field::CaCert => "CA certificate path",
            Field::CaKey => "CA private key path",
            Field::CaSerial => "CA serial file path",
            Field::AddSan => "add a subject alternative name",
            Field::SanType => "SAN type",
            Field::SanValue(SanType::Ip) => "SAN IP address",
            Field::SanValue(SanType::Dns) => "SAN DNS name",
        }
    }

    /// The command line flag that supplies this field, if any.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            Field::CommonName => Some("--cn"),
            Field::Duration => Some("--duration"),
            Field::CaCert => Some("--ca-cert"),
            Field::CaKey => Some("--ca-key"),
            Field::CaSerial => Some("--ca-serial"),
            Field::AddSan | Field::SanType | Field::SanValue(_) => None,
        }
    }

    pub fn default_value(&self, defaults: &Defaults) -> Option<String> {
        match self {
            Field::Duration => Some(defaults.duration_days.to_string()),
            _ => None,
        }
    }

    fn message(&self, defaults: &Defaults) -> String {
        let question = match self {
            Field::AddSan => "Add a subject alternative name? (Y/N)".to_string(),
            Field::SanType => {
                let choices = defaults
                    .san_types
                    .iter()
                    .map(SanType::as_str)
                    .collect::<Vec<_>>()
                    .join("/");
                format!("SAN type ({choices})")
            }
            other => {
                let label = other.label();
                let mut chars = label.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        };
        match self.default_value(defaults) {
            Some(default) => format!("{question} [{default}]: "),
            None => format!("{question}: "),
        }
    }
}

/// Fills in a [`PartialConfiguration`] by asking the operator.
pub struct Interview<'a> {
    prompter: &'a mut dyn Prompter,
    defaults: Defaults,
}

impl<'a> Interview<'a> {
    pub fn new(prompter: &'a mut dyn Prompter, defaults: Defaults) -> Self {
        Self { prompter, defaults }
    }

    pub fn complete(&mut self, partial: PartialConfiguration) -> Result<Configuration> {
        let common_name = self.resolve(
            Field::CommonName,
            partial.common_name.as_deref(),
            validate::common_name,
        )?;
        let duration_days =
            self.resolve(Field::Duration, partial.duration.as_deref(), validate::duration)?;
        let sans = self.resolve_sans(&partial.sans)?;
        let ca_cert = self.resolve(Field::CaCert, partial.ca_cert.as_deref(), validate::path)?;
        let ca_key = self.resolve(Field::CaKey, partial.ca_key.as_deref(), validate::path)?;
        let ca_serial =
            self.resolve(Field::CaSerial, partial.ca_serial.as_deref(), validate::path)?;

        Ok(Configuration::builder()
            .common_name(common_name)
            .duration_days(duration_days)
            .sans(sans)
            .ca_cert(ca_cert)
            .ca_key(ca_key)
            .ca_serial(ca_serial)
            .output_dir(partial.output_dir)
            .key_algorithm(partial.key_algorithm)
            .backend(partial.backend)
            .build())
    }

    /// Takes the flag value when it validates, otherwise asks.
    fn resolve<T>(
        &mut self,
        field: Field,
        supplied: Option<&str>,
        validator: impl Fn(&str) -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        if let Some(value) = supplied {
            match validator(value) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => warn!("ignoring {} {value:?}: {e}", field.flag().unwrap_or("value")),
            }
        }
        self.ask(field, validator)
    }

    /// Asks until the answer validates.
    fn ask<T>(
        &mut self,
        field: Field,
        validator: impl Fn(&str) -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        let message = field.message(&self.defaults);
        let default = field.default_value(&self.defaults);
        loop {
            let answer = self
                .prompter
                .read_line(&message)?
                .ok_or(CertIssueError::InputClosed(field.label()))?;
            let answer = match (&default, answer.is_empty()) {
                (Some(default), true) => default.clone(),
                _ => answer,
            };
            match validator(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => self.prompter.show_error(&e.to_string())?,
            }
        }
    }

    /// Keeps the valid `--san` values in order. Falls back to the SAN loop
    /// when none of them survive.
    fn resolve_sans(&mut self, supplied: &[String]) -> Result<Vec<SanEntry>> {
        let allowed = self.defaults.san_types;
        let sans: Vec<SanEntry> = supplied
            .iter()
            .filter_map(|value| match validate::san_entry(value, allowed) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("ignoring --san {value:?}: {e}");
                    None
                }
            })
            .collect();
        if sans.is_empty() {
            self.collect_sans()
        } else {
            Ok(sans)
        }
    }

    fn collect_sans(&mut self) -> Result<Vec<SanEntry>> {
        let mut sans = Vec::new();
        while self.ask(Field::AddSan, validate::yes_no)? {
            let allowed = self.defaults.san_types;
            let san_type = self.ask(Field::SanType, |input| validate::san_type(input, allowed))?;
            let entry = self.ask(Field::SanValue(san_type), |input| {
                SanEntry::new(san_type, input)
            })?;
            sans.push(entry);
        }
        Ok(sans)
    }
}
