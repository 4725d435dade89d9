//! The `outdated` command: walk `npm outdated --json` interactively.
//!
//! npm exits non-zero whenever outdated packages exist, so the exit code
//! is ignored and the captured stdout is parsed regardless. Each package
//! gets a choice of skip / wanted / latest; installs go to the right
//! dependency section based on the project manifest.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::exec::{ProcessRunner, npm_install_package, npm_test};
use crate::manifest::MANIFEST_PATH;
use crate::prompt::{Choice, Prompter, Status};
use crate::stage::StagedFs;

const SKIP: Choice = Choice::new('s', "skip", "skip");
const WANTED: Choice = Choice::new('w', "install wanted", "wanted");
const LATEST: Choice = Choice::new('l', "install latest", "latest");

/// Options for `sprig outdated`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutdatedOptions {
    /// Never offer the latest version, only the wanted (semver-compatible)
    /// one.
    pub skip_latest: bool,
    /// Skip `npm test` after each install.
    pub skip_tests: bool,
    /// Walk and report choices, but never install or test.
    pub dry_run: bool,
}

/// One row of `npm outdated --json` output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutdatedPackage {
    pub name: String,
    pub current: String,
    pub wanted: String,
    pub latest: String,
    /// True when the package lives in `devDependencies`.
    pub is_dev: bool,
}

/// Parse `npm outdated --json` stdout. Packages missing a version field
/// are skipped; membership in `dev_names` marks the dev section.
#[must_use]
pub fn parse_outdated(stdout: &str, dev_names: &[String]) -> Vec<OutdatedPackage> {
    let Ok(Value::Object(map)) = serde_json::from_str(stdout) else {
        return Vec::new();
    };
    let mut packages = Vec::new();
    for (name, info) in map {
        let field = |key: &str| info.get(key).and_then(Value::as_str).map(ToOwned::to_owned);
        let (Some(current), Some(wanted), Some(latest)) =
            (field("current"), field("wanted"), field("latest"))
        else {
            debug!(package = %name, "skipping incomplete outdated entry");
            continue;
        };
        let is_dev = dev_names.contains(&name);
        packages.push(OutdatedPackage {
            name,
            current,
            wanted,
            latest,
            is_dev,
        });
    }
    packages
}

/// Run the interactive outdated walk against the staged root.
pub fn outdated(
    stage: &mut StagedFs,
    prompter: &mut dyn Prompter,
    runner: &mut dyn ProcessRunner,
    opts: OutdatedOptions,
) -> Result<()> {
    let root = stage.root().to_path_buf();

    prompter.report(Status::Info, "checking for outdated packages...");
    // Exit code 1 just means outdated packages exist.
    let (_code, stdout) = runner.run_capture(&root, "npm", &["outdated", "--json"])?;

    let dev_names = dev_dependency_names(stage)?;
    let packages = parse_outdated(&stdout, &dev_names);
    if packages.is_empty() {
        prompter.report(Status::Ok, "all packages up to date");
        return Ok(());
    }
    prompter.report(
        Status::Warn,
        &format!("{} outdated package(s)", packages.len()),
    );

    let choices: Vec<Choice> = if opts.skip_latest {
        vec![SKIP, WANTED]
    } else {
        vec![SKIP, WANTED, LATEST]
    };

    for package in packages {
        prompter.show(&format!(
            "{}{}\n  current: {}\n  wanted:  {}\n  latest:  {}",
            package.name,
            if package.is_dev { " (dev)" } else { "" },
            package.current,
            package.wanted,
            package.latest,
        ));
        let pick = prompter.select(&format!("Update '{}'?", package.name), &choices)?;
        let version = match pick.as_str() {
            "wanted" => &package.wanted,
            "latest" => &package.latest,
            _ => {
                prompter.report(Status::Info, &format!("{} skipped", package.name));
                continue;
            }
        };
        if *version == package.current {
            prompter.report(
                Status::Ok,
                &format!("{} already at {version}", package.name),
            );
            continue;
        }
        if opts.dry_run {
            prompter.report(
                Status::Warn,
                &format!("dry run: {}@{version} not installed", package.name),
            );
            continue;
        }

        let code = npm_install_package(runner, &root, &package.name, version, package.is_dev)?;
        if code == 0 {
            prompter.report(Status::Ok, &format!("{}@{version} installed", package.name));
        } else {
            prompter.report(
                Status::Warn,
                &format!("npm exited with code {code} installing {}", package.name),
            );
            continue;
        }

        if !opts.skip_tests {
            npm_test(runner, &root, prompter)?;
        }
    }
    Ok(())
}

fn dev_dependency_names(stage: &mut StagedFs) -> crate::error::Result<Vec<String>> {
    let Some(doc) = stage.read_json(MANIFEST_PATH)? else {
        return Ok(Vec::new());
    };
    Ok(doc
        .get("devDependencies")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default())
}
