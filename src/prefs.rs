//! Preference gathering.
//!
//! Collects everything the manifest merger and template materializer need:
//! manifest fields (name, version, description, author, license) and the
//! authentication setup (role, issuer/audience names, signing key, audience
//! list). Defaults resolve existing-manifest value → user defaults file →
//! hard default, so re-running the tool offers what the project already
//! has.
//!
//! User-level defaults live at `~/.sprig` (flat JSON `{author, license,
//! version}`), read at the start of gathering and rewritten at the end when
//! `--save` was passed. A missing file is "no defaults available", not an
//! error.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::manifest::MANIFEST_PATH;
use crate::prompt::{Choice, Prompter, Status, Validator};
use crate::render::RenderContext;
use crate::stage::StagedFs;

// ---------------------------------------------------------------------------
// AuthRole
// ---------------------------------------------------------------------------

/// The JWT role this server fulfills. Conditions which auth packages stay
/// in the manifest and which template blocks render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthRole {
    /// No authentication feature set.
    #[default]
    None,
    /// Accepts tokens issued elsewhere.
    Audience,
    /// Issues tokens for one or more audience servers.
    Issuer,
}

impl AuthRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Audience => "audience",
            Self::Issuer => "issuer",
        }
    }

    fn from_value(value: &str) -> Self {
        match value {
            "audience" => Self::Audience,
            "issuer" => Self::Issuer,
            _ => Self::None,
        }
    }
}

impl std::fmt::Display for AuthRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// The gathered answers. Produced once per run and consumed read-only by
/// the merger and materializer.
#[derive(Clone, Debug, Default)]
pub struct Preferences {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub license: String,
    pub auth_role: AuthRole,
    pub auth_issuer_name: String,
    pub auth_audience_name: String,
    pub auth_jwt_key: String,
    /// Pre-rendered `'name': 'key'` lines for the environment template's
    /// audiences block (issuer role only).
    pub auth_audiences: String,
}

impl Preferences {
    /// The rendering context handed to every template.
    #[must_use]
    pub fn render_context(&self) -> RenderContext {
        let mut ctx = RenderContext::new();
        ctx.set("name", &self.name)
            .set("version", &self.version)
            .set("description", &self.description)
            .set("author", &self.author)
            .set("license", &self.license)
            .set(
                "auth_role",
                if self.auth_role == AuthRole::None {
                    ""
                } else {
                    self.auth_role.as_str()
                },
            )
            .set(
                "auth_is_audience",
                if self.auth_role == AuthRole::Audience { "1" } else { "" },
            )
            .set(
                "auth_is_issuer",
                if self.auth_role == AuthRole::Issuer { "1" } else { "" },
            )
            .set("auth_issuer_name", &self.auth_issuer_name)
            .set("auth_audience_name", &self.auth_audience_name)
            .set("auth_jwt_key", &self.auth_jwt_key)
            .set("auth_audiences", &self.auth_audiences);
        ctx
    }
}

// ---------------------------------------------------------------------------
// User defaults file
// ---------------------------------------------------------------------------

/// Flat user-level defaults persisted outside any project directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `~/.sprig`, or `None` when no home directory is discoverable.
#[must_use]
pub fn defaults_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| Path::new(&home).join(".sprig"))
}

/// Load defaults from `path`. Missing file → empty defaults. A corrupt
/// file is advisory only, so it degrades to empty defaults with a warning
/// instead of aborting the run.
pub fn load_defaults(path: &Path, prompter: &mut dyn Prompter) -> UserDefaults {
    match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(defaults) => {
                prompter.report(
                    Status::Ok,
                    &format!("loaded default preferences from {}", path.display()),
                );
                defaults
            }
            Err(e) => {
                prompter.report(
                    Status::Warn,
                    &format!("ignoring unparseable defaults file {}: {e}", path.display()),
                );
                UserDefaults::default()
            }
        },
        Err(_) => UserDefaults::default(),
    }
}

/// Persist defaults to `path`. Written directly (the file lives outside
/// the project, so it is not part of the staged overlay). Failure is
/// reported, not fatal.
pub fn save_defaults(path: &Path, defaults: &UserDefaults, prompter: &mut dyn Prompter) {
    let text = match serde_json::to_string_pretty(defaults) {
        Ok(text) => text,
        Err(e) => {
            prompter.report(Status::Warn, &format!("unable to save defaults: {e}"));
            return;
        }
    };
    match fs::write(path, text + "\n") {
        Ok(()) => prompter.report(Status::Ok, &format!("defaults saved to {}", path.display())),
        Err(e) => prompter.report(Status::Warn, &format!("unable to save defaults: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Gathering options
// ---------------------------------------------------------------------------

/// Options shared by `init` and `update-manifest`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GatherOptions {
    /// Answer every prompt with its default.
    pub accept_defaults: bool,
    /// Save {author, license, version} to `~/.sprig` afterwards.
    pub save: bool,
}

// ---------------------------------------------------------------------------
// PreferenceGatherer
// ---------------------------------------------------------------------------

const ROLE_CHOICES: [Choice; 3] = [
    Choice::new('a', "audience", "audience"),
    Choice::new('i', "issuer", "issuer"),
    Choice::new('n', "none", "none"),
];

/// Drives the preference prompts against the staged filesystem (for
/// current-value defaults) and the prompter.
pub struct PreferenceGatherer<'a> {
    stage: &'a mut StagedFs,
    prompter: &'a mut dyn Prompter,
    defaults_file: Option<PathBuf>,
}

impl<'a> PreferenceGatherer<'a> {
    pub fn new(stage: &'a mut StagedFs, prompter: &'a mut dyn Prompter) -> Self {
        Self {
            stage,
            prompter,
            defaults_file: defaults_path(),
        }
    }

    /// Use an explicit defaults-file location instead of `~/.sprig`.
    #[must_use]
    pub fn with_defaults_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults_file = Some(path.into());
        self
    }

    /// Gather the full preferences record.
    pub fn gather(&mut self, opts: GatherOptions) -> Result<Preferences> {
        let defaults = match &self.defaults_file {
            Some(path) => {
                let path = path.clone();
                load_defaults(&path, self.prompter)
            }
            None => UserDefaults::default(),
        };

        let mut prefs = Preferences::default();
        self.gather_manifest_fields(&defaults, &mut prefs, opts)?;
        self.gather_auth(&mut prefs, opts)?;

        if opts.accept_defaults {
            self.prompter
                .report(Status::Info, "accepting default preferences:");
            self.prompter
                .report(Status::Ok, &format!("name: {}", prefs.name));
            self.prompter
                .report(Status::Ok, &format!("version: {}", prefs.version));
            self.prompter
                .report(Status::Ok, &format!("license: {}", prefs.license));
            self.prompter
                .report(Status::Ok, &format!("auth role: {}", prefs.auth_role));
        }

        if opts.save {
            if let Some(path) = self.defaults_file.clone() {
                let saved = UserDefaults {
                    author: Some(prefs.author.clone()),
                    license: Some(prefs.license.clone()),
                    version: Some(prefs.version.clone()),
                };
                save_defaults(&path, &saved, self.prompter);
            }
        }

        Ok(prefs)
    }

    fn gather_manifest_fields(
        &mut self,
        defaults: &UserDefaults,
        prefs: &mut Preferences,
        opts: GatherOptions,
    ) -> Result<()> {
        if !opts.accept_defaults {
            self.prompter.report(Status::Info, "package.json preferences:");
        }

        let manifest = self.stage.read_json(MANIFEST_PATH)?.unwrap_or_default();
        let field = |key: &str| -> Option<String> {
            manifest
                .get(key)
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned)
        };

        let author = field("author")
            .or_else(|| defaults.author.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "sprig developer".to_owned());
        let description = field("description").unwrap_or_else(|| "a sprig web service".to_owned());
        let name = field("name").unwrap_or_else(|| self.dir_name());
        let version = field("version")
            .or_else(|| defaults.version.clone())
            .unwrap_or_else(|| "0.0.0".to_owned());
        let license = field("license")
            .or_else(|| defaults.license.clone())
            .unwrap_or_else(|| "UNLICENSED".to_owned());

        if opts.accept_defaults {
            prefs.author = author;
            prefs.description = description;
            prefs.name = name;
            prefs.version = version;
            prefs.license = license;
            return Ok(());
        }

        prefs.author = self.prompter.input("Author:", &author, Validator::None)?;
        prefs.description = self
            .prompter
            .input("Description:", &description, Validator::None)?;
        prefs.license = self.prompter.input("License:", &license, Validator::None)?;
        prefs.name = self.prompter.input(
            "Project Name (npm name):",
            &name,
            Validator::PackageName,
        )?;
        prefs.version = self
            .prompter
            .input("Version:", &version, Validator::SemVer)?;
        Ok(())
    }

    fn gather_auth(&mut self, prefs: &mut Preferences, opts: GatherOptions) -> Result<()> {
        let current = self.detect_current_role()?;
        debug!(%current, "detected current auth role");

        prefs.auth_role = if opts.accept_defaults {
            current
        } else {
            self.prompter.report(Status::Info, "authentication preferences:");
            let value = self.prompter.select(
                &format!("What JWT role does this server fulfill? (currently: {current})"),
                &ROLE_CHOICES,
            )?;
            AuthRole::from_value(&value)
        };

        if prefs.auth_role == AuthRole::None {
            return Ok(());
        }

        let host = hostname();
        let issuer_default = format!("issuer.{host}");
        prefs.auth_issuer_name = if opts.accept_defaults {
            issuer_default
        } else {
            self.prompter
                .input("Server JWT Issuer Name:", &issuer_default, Validator::None)?
        };

        if prefs.auth_role == AuthRole::Audience {
            let audience_default = format!("audience.{host}");
            prefs.auth_audience_name = if opts.accept_defaults {
                audience_default
            } else {
                self.prompter.input(
                    "Server JWT Audience Name:",
                    &audience_default,
                    Validator::None,
                )?
            };
        }

        let key_default = generate_secret();
        prefs.auth_jwt_key = if opts.accept_defaults {
            key_default
        } else {
            self.prompter
                .input("Server JWT Signing Key:", &key_default, Validator::None)?
        };

        if prefs.auth_role == AuthRole::Issuer && !opts.accept_defaults {
            prefs.auth_audiences = self.gather_audiences(&host)?;
        }
        Ok(())
    }

    /// Issuer role: collect audience name/key pairs until the user types
    /// `done`.
    fn gather_audiences(&mut self, host: &str) -> Result<String> {
        self.prompter.report(
            Status::Info,
            "an issuer needs to know the audiences it serves <type done to continue>:",
        );

        let mut audiences: Vec<(String, String)> = Vec::new();
        let mut counter = 1;
        loop {
            for (i, (name, _)) in audiences.iter().enumerate() {
                self.prompter
                    .report(Status::Ok, &format!("[{i}] audience server: {name}"));
            }

            let default_name = format!("audience{counter}.{host}");
            counter += 1;
            let name = self
                .prompter
                .input("Audience Server Name:", &default_name, Validator::None)?;
            if name == "done"
                && self
                    .prompter
                    .confirm("Are you sure you're done defining audiences?", true)?
            {
                break;
            }

            let key = self.prompter.input(
                "Audience Server Key:",
                &generate_secret(),
                Validator::None,
            )?;
            audiences.push((name, key));
        }

        let lines: Vec<String> = audiences
            .iter()
            .map(|(name, key)| format!("        '{name}': '{key}'"))
            .collect();
        Ok(lines.join(",\n"))
    }

    /// Infer the project's current role from the staged app wiring file,
    /// so the role prompt can show what is already configured.
    fn detect_current_role(&mut self) -> Result<AuthRole> {
        let Some(app) = self.stage.read("src/sprig-app.ts")? else {
            return Ok(AuthRole::None);
        };
        if app.contains("useAuthIssuer") {
            Ok(AuthRole::Issuer)
        } else if app.contains("useAuthAudience") {
            Ok(AuthRole::Audience)
        } else {
            Ok(AuthRole::None)
        }
    }

    fn dir_name(&self) -> String {
        self.stage
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sprig-project".to_owned())
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}

/// 32-character alphanumeric secret for JWT signing key defaults.
#[must_use]
pub fn generate_secret() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
