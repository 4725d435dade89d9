//! Manifest (`package.json`) merge engine.
//!
//! [`ManifestMerger`] merges gathered preferences and the templated
//! dependency/script sets into the staged manifest, detecting per-field
//! conflicts against already-present values and driving an interactive
//! conflict-resolution state machine. Everything stays in the staged
//! overlay — the on-disk manifest is only read, never written, until the
//! run-wide commit.
//!
//! # Pass lifecycle
//!
//! ```text
//! Gathering → Reviewing → Accepted
//!     ↑           │
//!     └───────────┘  (review rejected: policy and document discarded,
//!                     base document freshly reloaded)
//! ```
//!
//! A *pass* is one complete attempt at gathering and reviewing changes. The
//! pass-level [`PassPolicy`] is decided at the first conflict and governs
//! every later conflict in the same pass; rejecting the final review resets
//! it.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::prefs::{AuthRole, Preferences};
use crate::prompt::{Choice, Prompter, Status};
use crate::stage::StagedFs;
use crate::{assets, diff};

/// Manifest file name, relative to the project root.
pub const MANIFEST_PATH: &str = "package.json";

/// Top-level field order applied before every comparison or display.
/// Remaining fields follow alphabetically, with the dependency maps last.
const FIELD_PRIORITY: [&str; 7] = [
    "name",
    "version",
    "description",
    "author",
    "license",
    "main",
    "scripts",
];

/// Auth plugin packages removed according to the selected role.
const AUDIENCE_PACKAGE: &str = "@sprig/auth-audience";
const NATIVE_AUTHORITY_PACKAGE: &str = "@sprig/auth-native-authority";

/// Issuer-only mailer packages, pruned unless the project issues tokens.
const ISSUER_ONLY_DEPENDENCIES: [&str; 2] = ["email-templates", "nodemailer"];
const ISSUER_ONLY_DEV_DEPENDENCIES: [&str; 2] = ["@types/email-templates", "@types/nodemailer"];

// ---------------------------------------------------------------------------
// Pass state machine
// ---------------------------------------------------------------------------

/// Named states of one merge pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassState {
    /// Walking each field to update, resolving conflicts as they appear.
    Gathering,
    /// Showing the full proposed document (or its diff against disk).
    Reviewing,
    /// Terminal: the user accepted the review.
    Accepted,
}

/// Pass-scoped conflict resolution policy. `None` until the first conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassPolicy {
    /// Keep the existing manifest value for every conflict.
    KeepExisting,
    /// Overwrite every conflicting field without further prompts.
    ReplaceAll,
    /// Ask per conflicting field.
    PickPerConflict,
}

/// Per-field resolution under [`PassPolicy::PickPerConflict`].
/// `replace-all` escalates the pass policy and replaces the field being
/// resolved too, not just the fields after it.
const FIELD_CHOICES: [Choice; 4] = [
    Choice::new('k', "keep original value", "keep"),
    Choice::new('r', "Replace with new value", "replace"),
    Choice::new('a', "Replace all (stop asking)", "replace-all"),
    Choice::new('d', "Diff the file with the proposed change included", "diff"),
];

const POLICY_CHOICES: [Choice; 3] = [
    Choice::new('k', "keep existing package.json", "keep"),
    Choice::new('r', "Replace all (accept all changes)", "replace"),
    Choice::new('p', "Pick per conflict", "pick"),
];

// ---------------------------------------------------------------------------
// ManifestMerger
// ---------------------------------------------------------------------------

/// Merges preferences and templated dependency sets into the staged
/// manifest. One instance drives one or more passes until the user accepts.
pub struct ManifestMerger<'a> {
    stage: &'a mut StagedFs,
    prompter: &'a mut dyn Prompter,
    policy: Option<PassPolicy>,
    doc: Value,
}

impl<'a> ManifestMerger<'a> {
    pub fn new(stage: &'a mut StagedFs, prompter: &'a mut dyn Prompter) -> Self {
        Self {
            stage,
            prompter,
            policy: None,
            doc: Value::Object(Map::new()),
        }
    }

    /// Run merge passes until the review is accepted, then prune and stage
    /// the result. Nothing is written to disk here.
    pub fn update(&mut self, prefs: &Preferences) -> Result<()> {
        let mut state = PassState::Gathering;
        loop {
            match state {
                PassState::Gathering => {
                    self.gather(prefs)?;
                    state = PassState::Reviewing;
                }
                PassState::Reviewing => {
                    if self.review()? {
                        state = PassState::Accepted;
                    } else {
                        // Pass restart: discard policy and document.
                        self.policy = None;
                        self.doc = Value::Object(Map::new());
                        self.prompter
                            .report(Status::Info, "restarting update to 'package.json'");
                        state = PassState::Gathering;
                    }
                }
                PassState::Accepted => break,
            }
        }

        self.prune_issuer_only(prefs.auth_role);
        self.stage.write_json(MANIFEST_PATH, &self.doc)
    }

    /// The Gathering state: reload the base document and walk every field.
    fn gather(&mut self, prefs: &Preferences) -> Result<()> {
        debug!("manifest gather pass starting");
        self.doc = self.stage.read_json(MANIFEST_PATH)?.unwrap_or_else(empty_object);
        sort_parts(&mut self.doc);

        self.prompter
            .report(Status::Info, "updating package.json with user preferences");

        self.safe_update("name", Value::String(prefs.name.clone()))?;
        self.safe_update("version", Value::String(prefs.version.clone()))?;
        self.safe_update("description", Value::String(prefs.description.clone()))?;
        self.safe_update("author", Value::String(prefs.author.clone()))?;
        self.safe_update("license", Value::String(prefs.license.clone()))?;

        self.prompter
            .report(Status::Info, "updating templated dependencies and scripts");
        self.update_section("devDependencies", &assets::dev_dependency_set())?;
        self.update_section("dependencies", &assets::dependency_set())?;
        self.update_section("scripts", &assets::script_set())?;

        // Auth plugin packages that the chosen role does not use.
        match prefs.auth_role {
            AuthRole::None => {
                remove_entry(&mut self.doc, "dependencies", AUDIENCE_PACKAGE);
                remove_entry(&mut self.doc, "dependencies", NATIVE_AUTHORITY_PACKAGE);
            }
            AuthRole::Audience => {
                remove_entry(&mut self.doc, "dependencies", NATIVE_AUTHORITY_PACKAGE);
            }
            AuthRole::Issuer => {}
        }

        sort_parts(&mut self.doc);
        Ok(())
    }

    /// The Reviewing state. Returns `true` when the user accepts.
    fn review(&mut self) -> Result<bool> {
        let disk = self.stage.read_disk_json(MANIFEST_PATH)?;
        match disk {
            None => {
                self.prompter
                    .report(Status::Info, "the following package.json will be created:");
                let text = serde_json::to_string_pretty(&self.doc).unwrap_or_default();
                self.prompter.show(&text);
            }
            Some(mut disk) => {
                sort_parts(&mut disk);
                self.prompter.report(
                    Status::Info,
                    "the following changes will be made to package.json:",
                );
                let text = diff::diff_json(&self.doc, &disk);
                self.prompter.show(&text);
            }
        }

        let accepted = self.prompter.confirm("Accept these changes?", true)?;
        if accepted {
            self.prompter.report(
                Status::Ok,
                "changes accepted (nothing is written to disk until the whole run completes)",
            );
        }
        Ok(accepted)
    }

    /// Merge one field: set when absent, no-op when equal, otherwise run
    /// the conflict machinery.
    fn safe_update(&mut self, field: &str, new_value: Value) -> Result<()> {
        let current = path_get(&self.doc, field).cloned();
        let Some(current) = current else {
            path_set(&mut self.doc, field, new_value);
            return Ok(());
        };
        if current == new_value {
            return Ok(());
        }

        debug!(field, "manifest field conflict");
        if self.policy.is_none() {
            self.policy = Some(self.ask_pass_policy()?);
        }

        match self.policy {
            Some(PassPolicy::ReplaceAll) => self.replace_field(field, new_value),
            Some(PassPolicy::KeepExisting) | None => {}
            Some(PassPolicy::PickPerConflict) => {
                self.resolve_field(field, &current, new_value)?;
            }
        }
        Ok(())
    }

    /// First-conflict prompt deciding the policy for the rest of the pass.
    /// "Replace all" gets a confirmation sub-prompt; declining re-asks.
    fn ask_pass_policy(&mut self) -> Result<PassPolicy> {
        loop {
            let choice = self
                .prompter
                .select("package.json conflict:", &POLICY_CHOICES)?;
            match choice.as_str() {
                "replace" => {
                    let sure = self.prompter.confirm(
                        "Are you sure you want to accept all changes to package.json?",
                        false,
                    )?;
                    if sure {
                        return Ok(PassPolicy::ReplaceAll);
                    }
                }
                "pick" => return Ok(PassPolicy::PickPerConflict),
                _ => return Ok(PassPolicy::KeepExisting),
            }
        }
    }

    /// Per-field loop under pick-per-conflict: show the old/new comparison,
    /// then keep / replace / escalate / diff.
    fn resolve_field(&mut self, field: &str, current: &Value, new_value: Value) -> Result<()> {
        self.prompter.report(Status::Warn, "package.json conflict:");
        self.prompter
            .show(&comparison_table(field, current, &new_value));

        loop {
            let choice = self
                .prompter
                .select("Resolve package.json conflict:", &FIELD_CHOICES)?;
            match choice.as_str() {
                "keep" => return Ok(()),
                "replace" => {
                    self.replace_field(field, new_value);
                    return Ok(());
                }
                "replace-all" => {
                    // Escalate: this and every remaining conflict replaces.
                    self.policy = Some(PassPolicy::ReplaceAll);
                    self.replace_field(field, new_value);
                    return Ok(());
                }
                _ => {
                    // Structural diff with this change speculatively applied.
                    let mut disk = self
                        .stage
                        .read_disk_json(MANIFEST_PATH)?
                        .unwrap_or_else(empty_object);
                    sort_parts(&mut disk);

                    let mut speculative = self.doc.clone();
                    path_set(&mut speculative, field, new_value.clone());
                    sort_parts(&mut speculative);

                    self.prompter.show(&diff::diff_json(&speculative, &disk));
                }
            }
        }
    }

    fn replace_field(&mut self, field: &str, new_value: Value) {
        let shown = display_value(&new_value);
        path_set(&mut self.doc, field, new_value);
        self.prompter
            .report(Status::Ok, &format!("updated {field} with '{shown}'"));
    }

    /// Batch update: every key of a templated section goes through the
    /// single-field algorithm as `<section>.<key>`.
    fn update_section(&mut self, section: &str, entries: &Value) -> Result<()> {
        let Some(map) = entries.as_object() else {
            return Ok(());
        };
        for (key, value) in map {
            self.safe_update(&format!("{section}.{key}"), value.clone())?;
        }
        Ok(())
    }

    /// Issuer-only mailer packages have no business in audience/none
    /// projects.
    fn prune_issuer_only(&mut self, role: AuthRole) {
        if role == AuthRole::Issuer {
            return;
        }
        for key in ISSUER_ONLY_DEPENDENCIES {
            remove_entry(&mut self.doc, "dependencies", key);
        }
        for key in ISSUER_ONLY_DEV_DEPENDENCIES {
            remove_entry(&mut self.doc, "devDependencies", key);
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Human form of a JSON value for status messages (strings unquoted).
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Two-column old/new comparison shown before the per-field prompt.
fn comparison_table(field: &str, current: &Value, new_value: &Value) -> String {
    let old = display_value(current);
    let new = display_value(new_value);
    let width = "original value".len().max(old.len());
    let mut out = String::new();
    let _ = writeln!(out, "field: {field}");
    let _ = writeln!(out, "  {:<width$} | new value", "original value");
    let _ = writeln!(out, "  {:<width$} | {new}", old);
    out
}

// ---------------------------------------------------------------------------
// Dotted-path access
// ---------------------------------------------------------------------------

/// Look up a dotted path (`dependencies.express`). Any missing intermediate
/// segment yields `None`.
#[must_use]
pub fn path_get<'v>(doc: &'v Value, field: &str) -> Option<&'v Value> {
    let mut cursor = doc;
    for part in field.split('.') {
        cursor = cursor.as_object()?.get(part)?;
    }
    Some(cursor)
}

/// Set a dotted path, creating empty intermediate objects as needed. A
/// non-object intermediate value is replaced by an object.
pub fn path_set(doc: &mut Value, field: &str, value: Value) {
    let mut cursor = doc;
    let parts: Vec<&str> = field.split('.').collect();
    for (i, part) in parts.iter().enumerate() {
        if !cursor.is_object() {
            *cursor = empty_object();
        }
        let map = match cursor.as_object_mut() {
            Some(map) => map,
            None => return,
        };
        if i == parts.len() - 1 {
            map.insert((*part).to_owned(), value);
            return;
        }
        cursor = map
            .entry((*part).to_owned())
            .or_insert_with(empty_object);
    }
}

fn remove_entry(doc: &mut Value, section: &str, key: &str) {
    if let Some(Value::Object(map)) = doc.get_mut(section) {
        map.shift_remove(key);
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Normalize the document for comparison and display: dependency / script
/// maps key-sorted ascending, then the fixed top-level order — priority
/// fields first, remaining fields alphabetically, dependency maps last.
pub fn sort_parts(doc: &mut Value) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };

    for section in ["dependencies", "devDependencies", "scripts"] {
        if let Some(Value::Object(map)) = obj.get(section) {
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(v) = map.get(&key) {
                    sorted.insert(key.clone(), v.clone());
                }
            }
            obj.insert(section.to_owned(), Value::Object(sorted));
        }
    }

    let old = std::mem::take(obj);
    for key in FIELD_PRIORITY {
        if let Some(v) = old.get(key) {
            obj.insert(key.to_owned(), v.clone());
        }
    }
    let mut rest: Vec<&String> = old
        .keys()
        .filter(|k| {
            !FIELD_PRIORITY.contains(&k.as_str())
                && *k != "dependencies"
                && *k != "devDependencies"
        })
        .collect();
    rest.sort();
    for key in rest {
        if let Some(v) = old.get(key) {
            obj.insert(key.clone(), v.clone());
        }
    }
    for key in ["dependencies", "devDependencies"] {
        if let Some(v) = old.get(key) {
            obj.insert(key.to_owned(), v.clone());
        }
    }
}
