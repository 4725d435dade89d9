//! Template materialization.
//!
//! Walks the embedded template set, renders each file against the gathered
//! preferences, and reconciles the result with whatever is already staged
//! or on disk at the destination path. Every write stays in the staged
//! overlay; each outcome is reported with a distinguishable status word —
//! `created`, `replaced`, `exists`, `skipped`, `conflict` — so the user can
//! reconstruct what happened after the run.
//!
//! # Per-file loop
//!
//! ```text
//! render → strip //- markers → compare with destination
//!   absent     → stage ("created")
//!   identical  → no-op ("exists")
//!   different  → { keep ("skipped") | replace ("replaced") | diff ↺ }
//! ```
//!
//! Files that render to nothing (an auth-conditional file with no role
//! selected, say) are skipped with a warning instead of materializing an
//! empty file.

use tracing::debug;

use crate::error::Result;
use crate::prefs::Preferences;
use crate::prompt::{Choice, Prompter, Status};
use crate::render;
use crate::stage::StagedFs;
use crate::{assets, diff};

/// Marker prefix for conditionally-blank structural comment lines.
const EMPTY_COMMENT_MARKER: &str = "//-";

const CONFLICT_CHOICES: [Choice; 3] = [
    Choice::new('k', "keep original file", "keep"),
    Choice::new('r', "Replace with new file", "replace"),
    Choice::new('d', "Diff the files", "diff"),
];

// ---------------------------------------------------------------------------
// TemplateFile
// ---------------------------------------------------------------------------

/// One template: destination path (relative to the project root) plus
/// source text. Verbatim files are nested templates the scaffolded project
/// renders itself — they pass through without rendering.
#[derive(Clone, Copy, Debug)]
pub struct TemplateFile {
    pub dest: &'static str,
    pub source: &'static str,
    pub verbatim: bool,
}

impl TemplateFile {
    #[must_use]
    pub const fn rendered(dest: &'static str, source: &'static str) -> Self {
        Self {
            dest,
            source,
            verbatim: false,
        }
    }

    #[must_use]
    pub const fn verbatim(dest: &'static str, source: &'static str) -> Self {
        Self {
            dest,
            source,
            verbatim: true,
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateMaterializer
// ---------------------------------------------------------------------------

/// Renders the template set and reconciles each file against the staged
/// filesystem, prompting on conflicts.
pub struct TemplateMaterializer<'a> {
    stage: &'a mut StagedFs,
    prompter: &'a mut dyn Prompter,
}

impl<'a> TemplateMaterializer<'a> {
    pub fn new(stage: &'a mut StagedFs, prompter: &'a mut dyn Prompter) -> Self {
        Self { stage, prompter }
    }

    /// Materialize every template in the set.
    pub fn create_files(&mut self, prefs: &Preferences) -> Result<()> {
        self.prompter.report(
            Status::Info,
            "creating files (nothing persists until the whole run completes)...",
        );

        let ctx = prefs.render_context();
        for template in assets::template_set() {
            let rendered = if template.verbatim {
                template.source.to_owned()
            } else {
                strip_marker_lines(&render::render(template.source, &ctx))
            };
            self.reconcile(template.dest, &rendered)?;
        }
        Ok(())
    }

    /// Compare rendered output with the destination and resolve.
    fn reconcile(&mut self, dest: &str, rendered: &str) -> Result<()> {
        let existing = self.stage.read(dest)?;
        debug!(dest, exists = existing.is_some(), "reconciling template");

        let Some(existing) = existing else {
            self.save_file(dest, rendered, "created");
            return Ok(());
        };
        if existing == rendered {
            self.prompter.report(Status::Ok, &format!("{dest} exists"));
            return Ok(());
        }

        self.prompter.report(Status::Warn, &format!("{dest} conflict"));
        loop {
            let choice = self
                .prompter
                .select("Resolve conflict:", &CONFLICT_CHOICES)?;
            match choice.as_str() {
                "keep" => {
                    self.prompter
                        .report(Status::Ok, &format!("{dest} skipped (keeping existing)"));
                    return Ok(());
                }
                "replace" => {
                    self.save_file(dest, rendered, "replaced");
                    return Ok(());
                }
                _ => self.prompter.show(&diff::diff_lines(rendered, &existing)),
            }
        }
    }

    /// Stage `content` unless it is empty or whitespace-only.
    fn save_file(&mut self, dest: &str, content: &str, verb: &str) {
        if content.trim().is_empty() {
            self.prompter
                .report(Status::Warn, &format!("{dest} skipped, no content"));
            return;
        }
        self.stage.write(dest, content);
        self.prompter.report(Status::Ok, &format!("{dest} {verb}"));
    }
}

// ---------------------------------------------------------------------------
// Marker stripping
// ---------------------------------------------------------------------------

/// Strip `//-` empty-comment markers from rendered output.
///
/// A line trimming to exactly `//-` is dropped; a line whose trimmed form
/// starts with `//-` followed by content keeps the content with the first
/// marker removed. The result is trimmed and terminated with one newline.
#[must_use]
pub fn strip_marker_lines(source: &str) -> String {
    let mut kept: Vec<String> = Vec::new();
    for line in source.split('\n') {
        let trimmed = line.trim();
        if trimmed == EMPTY_COMMENT_MARKER {
            continue;
        }
        if trimmed.starts_with(EMPTY_COMMENT_MARKER) {
            kept.push(line.replacen(EMPTY_COMMENT_MARKER, "", 1));
        } else {
            kept.push(line.to_owned());
        }
    }
    let joined = kept.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::AuthRole;
    use crate::prompt::{Answer, ScriptedPrompter};

    fn test_prefs() -> Preferences {
        Preferences {
            name: "demo".to_owned(),
            version: "1.0.0".to_owned(),
            description: "a demo".to_owned(),
            author: "someone".to_owned(),
            license: "MIT".to_owned(),
            auth_role: AuthRole::None,
            ..Preferences::default()
        }
    }

    #[test]
    fn marker_lines_stripped_per_contract() {
        // Bare markers drop, prefixed content survives without the marker.
        assert_eq!(strip_marker_lines("a\n//-\n//-b\nc"), "a\nb\nc\n");
        assert_eq!(strip_marker_lines("//-only-if-role-issuer"), "only-if-role-issuer\n");
        assert_eq!(strip_marker_lines("//-"), "");
        assert_eq!(strip_marker_lines("  //-  \n"), "");
    }

    #[test]
    fn fresh_directory_reports_created_for_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![]);

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();

        assert!(prompter.reported("README.md created"));
        assert!(prompter.reported("src/index.ts created"));
        // Nothing reached disk.
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn identical_file_reports_exists_and_stages_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![]);

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();
        stage.commit().unwrap();

        // Second run against the committed output: everything "exists".
        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![]);
        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();

        assert!(prompter.reported("README.md exists"));
        assert!(!prompter.reported("created"));
        assert!(!prompter.reported("conflict"));
        assert_eq!(stage.pending(), 0);
    }

    #[test]
    fn conflicting_file_keep_leaves_disk_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "my own readme\n").unwrap();

        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![Answer::Pick("keep")]);

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();

        assert!(prompter.reported("README.md conflict"));
        assert!(prompter.reported("README.md skipped"));
        stage.commit().unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "my own readme\n"
        );
    }

    #[test]
    fn conflicting_file_replace_stages_rendered_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "my own readme\n").unwrap();

        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![Answer::Pick("replace")]);

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();

        assert!(prompter.reported("README.md replaced"));
        stage.commit().unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(on_disk.contains("# demo"));
    }

    #[test]
    fn diff_choice_shows_diff_then_reprompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "my own readme\n").unwrap();

        let mut stage = StagedFs::new(dir.path());
        let mut prompter =
            ScriptedPrompter::new(vec![Answer::Pick("diff"), Answer::Pick("keep")]);

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();

        assert!(prompter.shown.iter().any(|s| s.contains("my own readme")));
        assert!(prompter.reported("README.md skipped"));
    }

    #[test]
    fn empty_render_is_skipped_with_warning() {
        // With no auth role, the app wiring template renders to comments
        // only... the sprig-app file still has content, so exercise the
        // skip path directly.
        let dir = tempfile::tempdir().unwrap();
        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![]);
        let mut mat = TemplateMaterializer::new(&mut stage, &mut prompter);

        mat.save_file("ghost.ts", "", "created");
        mat.save_file("blank.ts", "  \n\t\n", "created");

        assert!(prompter.reported("ghost.ts skipped, no content"));
        assert!(prompter.reported("blank.ts skipped, no content"));
        assert_eq!(stage.pending(), 0);
        assert!(!dir.path().join("ghost.ts").exists());
    }

    #[test]
    fn verbatim_templates_keep_their_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![]);

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&test_prefs())
            .unwrap();

        let tmpl = stage.read("generators/route.ts.tmpl").unwrap().unwrap();
        assert!(tmpl.contains("{{class_name}}"));
    }

    #[test]
    fn auth_environment_only_rendered_for_auth_roles() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = StagedFs::new(dir.path());
        let mut prompter = ScriptedPrompter::new(vec![]);

        let mut prefs = test_prefs();
        prefs.auth_role = AuthRole::Issuer;
        prefs.auth_issuer_name = "issuer.example".to_owned();
        prefs.auth_jwt_key = "sekrit".to_owned();

        TemplateMaterializer::new(&mut stage, &mut prompter)
            .create_files(&prefs)
            .unwrap();

        let env = stage.read("src/config/environment.ts").unwrap().unwrap();
        assert!(env.contains("issuer: 'issuer.example'"));
        assert!(env.contains("key: 'sekrit'"));

        let app = stage.read("src/sprig-app.ts").unwrap().unwrap();
        assert!(app.contains("useAuthIssuer"));
        assert!(!app.contains("useAuthAudience"));
        assert!(!app.contains("//-"));
    }
}
