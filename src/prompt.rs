//! The prompting seam.
//!
//! The merge and materialization loops never talk to a terminal directly —
//! they drive a [`Prompter`], which answers text questions, choice lists,
//! and confirmations, and receives status reports ("created", "conflict",
//! …). Two implementations:
//!
//! - [`ConsolePrompter`]: stdin/stdout, for the real CLI;
//! - [`ScriptedPrompter`]: a queued answer list that records every report,
//!   used by tests and by non-interactive drivers.
//!
//! Rendering niceties (colors, spinners, autocomplete) are deliberately out
//! of scope; this is the minimal surface the core needs.

use std::collections::VecDeque;
use std::io::{BufRead, Write as _};

use tracing::debug;

use crate::error::{Result, SprigError};

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// One entry in a choice list: a shortcut key, a human label, and the
/// stable value returned to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Choice {
    pub key: char,
    pub label: &'static str,
    pub value: &'static str,
}

impl Choice {
    #[must_use]
    pub const fn new(key: char, label: &'static str, value: &'static str) -> Self {
        Self { key, label, value }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Input validation applied by [`Prompter::input`]. Invalid input forces a
/// re-prompt on the console; a scripted answer failing validation is a hard
/// error (there is nobody to re-ask).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validator {
    #[default]
    None,
    /// npm-style package name (lowercase, URL-safe, ≤ 214 chars).
    PackageName,
    /// Semantic version: `MAJOR.MINOR.PATCH` with optional pre-release or
    /// build suffix.
    SemVer,
}

impl Validator {
    /// Check `input`, returning a user-facing rejection reason on failure.
    pub fn check(self, input: &str) -> std::result::Result<(), String> {
        match self {
            Self::None => Ok(()),
            Self::PackageName => check_package_name(input),
            Self::SemVer => check_semver(input),
        }
    }
}

fn check_package_name(input: &str) -> std::result::Result<(), String> {
    if input.is_empty() {
        return Err("name must not be empty".to_owned());
    }
    if input.len() > 214 {
        return Err("name must be at most 214 characters".to_owned());
    }
    // Scoped names look like @scope/name; validate each segment.
    let bare = input.strip_prefix('@').map_or(input, |rest| {
        rest.split_once('/').map_or(rest, |(_, name)| name)
    });
    if bare.starts_with('.') || bare.starts_with('_') {
        return Err("name must not start with '.' or '_'".to_owned());
    }
    if input.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("name must be lowercase".to_owned());
    }
    let ok = input
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "-._~@/".contains(c));
    if ok {
        Ok(())
    } else {
        Err("name may only contain URL-safe characters".to_owned())
    }
}

fn check_semver(input: &str) -> std::result::Result<(), String> {
    let err = || {
        "invalid version number; make sure your version complies with Semantic Versioning"
            .to_owned()
    };
    // Split off build metadata, then pre-release.
    let core = input.split_once('+').map_or(input, |(c, _)| c);
    let core = core.split_once('-').map_or(core, |(c, _)| c);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        return Err(err());
    }
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        if part.len() > 1 && part.starts_with('0') {
            return Err(err());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status reporting
// ---------------------------------------------------------------------------

/// Severity of a status report. Maps to the `[OK]` / `[WARN]` / `[..]`
/// prefixes on the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Info,
}

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

/// The abstract prompt/report capability consumed by the core.
pub trait Prompter {
    /// Ask for a line of text. Empty input takes the default; input failing
    /// `validator` is rejected and re-asked.
    fn input(&mut self, msg: &str, default: &str, validator: Validator) -> Result<String>;

    /// Ask the user to pick one of `choices`; returns the chosen value.
    fn select(&mut self, msg: &str, choices: &[Choice]) -> Result<String>;

    /// Yes/no question with a default.
    fn confirm(&mut self, msg: &str, default: bool) -> Result<bool>;

    /// One-way status output ("src/index.ts created", "package.json
    /// conflict", …).
    fn report(&mut self, status: Status, msg: &str);

    /// Print a block of prepared text (a diff, a document dump) between
    /// separator rules.
    fn show(&mut self, text: &str);
}

// ---------------------------------------------------------------------------
// ConsolePrompter
// ---------------------------------------------------------------------------

/// Interactive prompter over stdin/stdout.
#[derive(Debug, Default)]
pub struct ConsolePrompter {
    _private: (),
}

impl ConsolePrompter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_line() -> Result<String> {
        let mut line = String::new();
        let n = std::io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Err(SprigError::PromptClosed);
        }
        Ok(line.trim().to_owned())
    }
}

impl Prompter for ConsolePrompter {
    fn input(&mut self, msg: &str, default: &str, validator: Validator) -> Result<String> {
        loop {
            if default.is_empty() {
                print!("{msg} ");
            } else {
                print!("{msg} ({default}) ");
            }
            let _ = std::io::stdout().flush();

            let line = Self::read_line()?;
            let answer = if line.is_empty() { default } else { &line };
            match validator.check(answer) {
                Ok(()) => return Ok(answer.to_owned()),
                Err(reason) => println!("  {reason}"),
            }
        }
    }

    fn select(&mut self, msg: &str, choices: &[Choice]) -> Result<String> {
        loop {
            println!("{msg}");
            for c in choices {
                println!("  [{}] {}", c.key, c.label);
            }
            print!("> ");
            let _ = std::io::stdout().flush();

            let line = Self::read_line()?;
            let picked = choices.iter().find(|c| {
                line.eq_ignore_ascii_case(c.value)
                    || (line.len() == 1 && line.chars().next() == Some(c.key))
            });
            if let Some(c) = picked {
                return Ok(c.value.to_owned());
            }
            println!("  pick one of the listed keys");
        }
    }

    fn confirm(&mut self, msg: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            print!("{msg} ({hint}) ");
            let _ = std::io::stdout().flush();

            let line = Self::read_line()?;
            match line.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("  answer y or n"),
            }
        }
    }

    fn report(&mut self, status: Status, msg: &str) {
        match status {
            Status::Ok => println!("[OK] {msg}"),
            Status::Warn => println!("[WARN] {msg}"),
            Status::Info => println!("[..] {msg}"),
        }
    }

    fn show(&mut self, text: &str) {
        println!("{}", "-".repeat(72));
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
        println!("{}", "-".repeat(72));
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompter
// ---------------------------------------------------------------------------

/// A queued scripted answer.
#[derive(Clone, Debug)]
pub enum Answer {
    Text(String),
    Pick(&'static str),
    Yes(bool),
}

/// Non-interactive prompter: answers come from a queue, reports are
/// recorded. When the queue runs dry, `input` and `confirm` fall back to
/// their defaults (so scripts only name the answers that matter); `select`
/// has no safe default and errors instead.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    /// Everything reported via [`Prompter::report`], as `"status: msg"`.
    pub reports: Vec<String>,
    /// Everything displayed via [`Prompter::show`].
    pub shown: Vec<String>,
}

impl ScriptedPrompter {
    #[must_use]
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            reports: Vec::new(),
            shown: Vec::new(),
        }
    }

    /// True if any recorded report contains `needle`.
    #[must_use]
    pub fn reported(&self, needle: &str) -> bool {
        self.reports.iter().any(|r| r.contains(needle))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, msg: &str, default: &str, validator: Validator) -> Result<String> {
        let answer = match self.answers.pop_front() {
            Some(Answer::Text(text)) => text,
            Some(other) => {
                return Err(SprigError::InvalidInput {
                    prompt: msg.to_owned(),
                    reason: format!("scripted answer {other:?} is not text"),
                });
            }
            None => default.to_owned(),
        };
        validator
            .check(&answer)
            .map_err(|reason| SprigError::InvalidInput {
                prompt: msg.to_owned(),
                reason,
            })?;
        debug!(msg, answer, "scripted input");
        Ok(answer)
    }

    fn select(&mut self, msg: &str, choices: &[Choice]) -> Result<String> {
        match self.answers.pop_front() {
            Some(Answer::Pick(value)) => {
                if choices.iter().any(|c| c.value == value) {
                    Ok(value.to_owned())
                } else {
                    Err(SprigError::InvalidInput {
                        prompt: msg.to_owned(),
                        reason: format!("'{value}' is not one of the offered choices"),
                    })
                }
            }
            Some(other) => Err(SprigError::InvalidInput {
                prompt: msg.to_owned(),
                reason: format!("scripted answer {other:?} is not a choice"),
            }),
            None => Err(SprigError::PromptClosed),
        }
    }

    fn confirm(&mut self, msg: &str, default: bool) -> Result<bool> {
        match self.answers.pop_front() {
            Some(Answer::Yes(b)) => Ok(b),
            Some(other) => Err(SprigError::InvalidInput {
                prompt: msg.to_owned(),
                reason: format!("scripted answer {other:?} is not yes/no"),
            }),
            None => Ok(default),
        }
    }

    fn report(&mut self, status: Status, msg: &str) {
        self.reports.push(format!("{status:?}: {msg}"));
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_name_validator() {
        assert!(Validator::PackageName.check("my-project").is_ok());
        assert!(Validator::PackageName.check("@scope/pkg-1").is_ok());
        assert!(Validator::PackageName.check("").is_err());
        assert!(Validator::PackageName.check("Bad").is_err());
        assert!(Validator::PackageName.check("_private").is_err());
        assert!(Validator::PackageName.check(".hidden").is_err());
        assert!(Validator::PackageName.check("has space").is_err());
        assert!(Validator::PackageName.check(&"a".repeat(215)).is_err());
    }

    #[test]
    fn semver_validator() {
        assert!(Validator::SemVer.check("1.0.0").is_ok());
        assert!(Validator::SemVer.check("0.4.2").is_ok());
        assert!(Validator::SemVer.check("1.0.0-rc.1").is_ok());
        assert!(Validator::SemVer.check("1.0.0+build5").is_ok());
        assert!(Validator::SemVer.check("1.0").is_err());
        assert!(Validator::SemVer.check("1.0.x").is_err());
        assert!(Validator::SemVer.check("01.0.0").is_err());
        assert!(Validator::SemVer.check("").is_err());
    }

    #[test]
    fn scripted_falls_back_to_defaults_when_exhausted() {
        let mut p = ScriptedPrompter::new(vec![]);
        assert_eq!(
            p.input("Author:", "someone", Validator::None).unwrap(),
            "someone"
        );
        assert!(p.confirm("Accept?", true).unwrap());
    }

    #[test]
    fn scripted_select_requires_listed_value() {
        let choices = [Choice::new('k', "keep", "keep"), Choice::new('r', "replace", "replace")];
        let mut p = ScriptedPrompter::new(vec![Answer::Pick("replace")]);
        assert_eq!(p.select("Resolve:", &choices).unwrap(), "replace");

        let mut p = ScriptedPrompter::new(vec![Answer::Pick("bogus")]);
        assert!(p.select("Resolve:", &choices).is_err());

        let mut p = ScriptedPrompter::new(vec![]);
        assert!(matches!(
            p.select("Resolve:", &choices),
            Err(SprigError::PromptClosed)
        ));
    }

    #[test]
    fn scripted_validates_text_answers() {
        let mut p = ScriptedPrompter::new(vec![Answer::Text("not a version".to_owned())]);
        assert!(p.input("Version:", "1.0.0", Validator::SemVer).is_err());
    }
}
