use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use sprig::doctor;
use sprig::exec::SystemRunner;
use sprig::init::{self, InitOptions, UpdateManifestOptions};
use sprig::outdated::{self, OutdatedOptions};
use sprig::prompt::ConsolePrompter;
use sprig::stage::StagedFs;
use sprig::telemetry;

/// Scaffold and maintain sprig web services
///
/// `sprig init` creates a new project: package.json, TypeScript sources,
/// docker-compose, and JWT authentication wiring for the role you pick.
/// Nothing is written to disk until the whole run completes — every
/// conflicting file gets a keep / replace / diff prompt first.
///
/// QUICK START:
///
///   mkdir my-api && cd my-api
///   sprig init
///   npm start
#[derive(Parser)]
#[command(name = "sprig")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'sprig <command> --help' for more information on a specific command.")]
struct Cli {
    /// Stage everything but write nothing and run no external commands
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a project in the current (or given) directory
    ///
    /// Merges with whatever is already there: existing package.json fields
    /// and files are never overwritten without asking.
    Init(InitArgs),

    /// Re-run the package.json merge against an existing project
    #[command(name = "update-manifest")]
    UpdateManifest(UpdateManifestArgs),

    /// Walk `npm outdated` interactively, updating one package at a time
    Outdated(OutdatedArgs),

    /// Check that git, npm, and docker are available
    Doctor,
}

#[derive(Args)]
struct InitArgs {
    /// Target directory (created if missing); defaults to the current one
    path: Option<String>,

    /// Save author, license, and version answers to ~/.sprig
    #[arg(long)]
    save: bool,

    /// Skip `npm install` at the end
    #[arg(long)]
    skip_install: bool,

    /// Skip the package.json merge pass
    #[arg(long)]
    skip_manifest: bool,

    /// Answer every prompt with its default
    #[arg(long)]
    accept_defaults: bool,

    /// Proceed without asking when the directory is not empty
    #[arg(long)]
    skip_directory_check: bool,
}

#[derive(Args)]
struct UpdateManifestArgs {
    /// Save author, license, and version answers to ~/.sprig
    #[arg(long)]
    save: bool,

    /// Skip `npm install` at the end
    #[arg(long)]
    skip_install: bool,

    /// Answer every prompt with its default
    #[arg(long)]
    accept_defaults: bool,
}

#[derive(Args)]
struct OutdatedArgs {
    /// Only offer the wanted (semver-compatible) version, never latest
    #[arg(long)]
    skip_latest: bool,

    /// Skip `npm test` after each install
    #[arg(long)]
    skip_tests: bool,
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let mut stage = StagedFs::new(std::env::current_dir()?);
    let mut prompter = ConsolePrompter::new();
    let mut runner = SystemRunner;

    match cli.command {
        Commands::Init(args) => {
            let opts = InitOptions {
                path: args.path,
                save: args.save,
                skip_install: args.skip_install,
                skip_manifest: args.skip_manifest,
                accept_defaults: args.accept_defaults,
                skip_directory_check: args.skip_directory_check,
                dry_run: cli.dry_run,
            };
            init::init(&mut stage, &mut prompter, &mut runner, &opts)
        }
        Commands::UpdateManifest(args) => {
            let opts = UpdateManifestOptions {
                save: args.save,
                skip_install: args.skip_install,
                accept_defaults: args.accept_defaults,
                dry_run: cli.dry_run,
            };
            init::update_manifest(&mut stage, &mut prompter, &mut runner, opts)
        }
        Commands::Outdated(args) => {
            let opts = OutdatedOptions {
                skip_latest: args.skip_latest,
                skip_tests: args.skip_tests,
                dry_run: cli.dry_run,
            };
            outdated::outdated(&mut stage, &mut prompter, &mut runner, opts)
        }
        Commands::Doctor => {
            doctor::doctor(&mut prompter, &mut runner)?;
            Ok(())
        }
    }
}
