//! The `init` and `update-manifest` orchestrators.
//!
//! `init` wires the whole pipeline together: root selection, the
//! non-empty-directory guard, `git init`, preference gathering, the
//! manifest merge, template materialization, and finally the single
//! commit that flushes the staged filesystem to disk. Everything before
//! the commit is reversible; aborting at any prompt leaves the directory
//! untouched.

use anyhow::Result;
use tracing::debug;

use crate::exec::{ProcessRunner, docker_present, git_init, npm_install};
use crate::manifest::ManifestMerger;
use crate::prefs::{GatherOptions, PreferenceGatherer, Preferences};
use crate::prompt::{Prompter, Status};
use crate::stage::StagedFs;
use crate::templates::TemplateMaterializer;

/// Options for `sprig init`.
#[derive(Clone, Debug, Default)]
pub struct InitOptions {
    /// Target directory, relative to the current root. Created if missing.
    pub path: Option<String>,
    /// Save author/license/version answers to the defaults file.
    pub save: bool,
    /// Skip `npm install` after the commit.
    pub skip_install: bool,
    /// Skip the `package.json` merge pass.
    pub skip_manifest: bool,
    /// Answer every prompt with its default.
    pub accept_defaults: bool,
    /// Skip the non-empty-directory guard.
    pub skip_directory_check: bool,
    /// Stage everything but never touch disk or run external commands.
    pub dry_run: bool,
}

/// Options for `sprig update-manifest`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateManifestOptions {
    pub save: bool,
    pub skip_install: bool,
    pub accept_defaults: bool,
    pub dry_run: bool,
}

/// Scaffold a project into the staged root.
pub fn init(
    stage: &mut StagedFs,
    prompter: &mut dyn Prompter,
    runner: &mut dyn ProcessRunner,
    opts: &InitOptions,
) -> Result<()> {
    if let Some(path) = &opts.path {
        stage.set_root(path)?;
    }
    debug!(root = %stage.root().display(), "initializing project");

    let listing = stage.list_root()?;
    if !listing.is_empty() && !opts.skip_directory_check {
        prompter.report(
            Status::Warn,
            &format!(
                "there are {} file(s) in '{}'",
                listing.len(),
                stage.root().display()
            ),
        );
        if !prompter.confirm("Proceed anyway?", false)? {
            prompter.report(Status::Info, "nothing written");
            return Ok(());
        }
    }

    if listing.iter().any(|name| name == ".git") {
        debug!("git repository already present");
    } else if opts.dry_run {
        prompter.report(Status::Warn, "dry run: skipping `git init`");
    } else {
        let root = stage.root().to_path_buf();
        git_init(runner, &root, prompter)?;
    }

    let prefs = gather(stage, prompter, opts.accept_defaults, opts.save)?;

    if opts.skip_manifest {
        prompter.report(Status::Info, "skipping 'package.json' update");
    } else {
        ManifestMerger::new(stage, prompter).update(&prefs)?;
    }
    TemplateMaterializer::new(stage, prompter).create_files(&prefs)?;

    commit(stage, prompter, opts.dry_run)?;

    if opts.dry_run {
        return Ok(());
    }
    if !opts.skip_install {
        let root = stage.root().to_path_buf();
        npm_install(runner, &root, prompter)?;
    }
    let root = stage.root().to_path_buf();
    if !docker_present(runner, &root) {
        prompter.report(
            Status::Warn,
            "docker not found on PATH; `npm run docker:up` will not work until it is installed",
        );
    }

    prompter.show(concat!(
        "All done. To start your server:\n",
        "\n",
        "    npm start\n",
        "\n",
        "then visit http://localhost:8001/api\n",
    ));
    Ok(())
}

/// Re-run the preference and manifest passes against an existing project.
pub fn update_manifest(
    stage: &mut StagedFs,
    prompter: &mut dyn Prompter,
    runner: &mut dyn ProcessRunner,
    opts: UpdateManifestOptions,
) -> Result<()> {
    let prefs = gather(stage, prompter, opts.accept_defaults, opts.save)?;
    ManifestMerger::new(stage, prompter).update(&prefs)?;
    commit(stage, prompter, opts.dry_run)?;

    if !opts.dry_run && !opts.skip_install {
        let root = stage.root().to_path_buf();
        npm_install(runner, &root, prompter)?;
    }
    Ok(())
}

fn gather(
    stage: &mut StagedFs,
    prompter: &mut dyn Prompter,
    accept_defaults: bool,
    save: bool,
) -> Result<Preferences> {
    let prefs = PreferenceGatherer::new(stage, prompter).gather(GatherOptions {
        accept_defaults,
        save,
    })?;
    Ok(prefs)
}

/// Flush the staged filesystem, or explain why it will not be flushed.
fn commit(stage: &mut StagedFs, prompter: &mut dyn Prompter, dry_run: bool) -> Result<()> {
    let pending = stage.pending();
    if dry_run {
        prompter.report(
            Status::Warn,
            &format!("dry run: {pending} staged change(s) will not be saved"),
        );
        return Ok(());
    }
    stage.commit()?;
    prompter.report(Status::Ok, &format!("wrote {pending} file(s)"));
    Ok(())
}
