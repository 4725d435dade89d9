//! Whole-command flows through the `init` orchestrator, with scripted
//! prompts and a scripted process runner standing in for npm and git.

mod common;

use common::{empty_project, read_manifest};
use sprig::exec::ScriptedRunner;
use sprig::init::{InitOptions, init};
use sprig::prompt::{Answer, ScriptedPrompter};

fn accept_defaults_opts() -> InitOptions {
    InitOptions {
        accept_defaults: true,
        skip_install: true,
        ..InitOptions::default()
    }
}

#[test]
fn init_into_empty_directory_scaffolds_a_runnable_project() {
    let (dir, mut stage) = empty_project();
    let mut prompter = ScriptedPrompter::new(vec![]);
    let mut runner = ScriptedRunner::default();

    init(&mut stage, &mut prompter, &mut runner, &accept_defaults_opts()).unwrap();

    let doc = read_manifest(dir.path());
    assert!(doc["version"].is_string());
    assert_eq!(doc["scripts"]["start"].as_str().unwrap(), "npm run build && node dist/index.js");
    assert!(dir.path().join("src/sprig-app.ts").is_file());
    assert!(dir.path().join("docker-compose.yml").is_file());
    assert_eq!(runner.calls[0], "git init");
}

#[test]
fn rerunning_init_is_idempotent() {
    let (dir, mut stage) = empty_project();
    let mut prompter = ScriptedPrompter::new(vec![]);
    let mut runner = ScriptedRunner::default();
    init(&mut stage, &mut prompter, &mut runner, &accept_defaults_opts()).unwrap();
    let first = read_manifest(dir.path());

    // Second run: confirm past the non-empty-directory guard; everything
    // else matches what is on disk, so no conflicts and no rewrites.
    let mut stage = sprig::stage::StagedFs::new(dir.path());
    let mut prompter = ScriptedPrompter::new(vec![Answer::Yes(true)]);
    let mut runner = ScriptedRunner::default();
    init(&mut stage, &mut prompter, &mut runner, &accept_defaults_opts()).unwrap();

    assert!(prompter.reported("src/index.ts exists"));
    assert!(prompter.reported("tsconfig.json exists"));
    assert_eq!(read_manifest(dir.path()), first);
}

#[test]
fn interactive_issuer_init_wires_authentication() {
    let (dir, mut stage) = empty_project();
    let mut prompter = ScriptedPrompter::new(vec![
        Answer::Text("tester".to_owned()),          // author
        Answer::Text("issuer fixture".to_owned()),  // description
        Answer::Text("MIT".to_owned()),             // license
        Answer::Text("issuer-api".to_owned()),      // name
        Answer::Text("1.2.3".to_owned()),           // version
        Answer::Pick("issuer"),                     // role
        Answer::Text("issuer.test".to_owned()),     // issuer name
        Answer::Text("sixteen-byte-key".to_owned()), // signing key
        Answer::Text("aud.one".to_owned()),         // first audience
        Answer::Text("aud-one-key".to_owned()),
        Answer::Text("done".to_owned()),
        Answer::Yes(true), // done confirm
    ]);
    let mut runner = ScriptedRunner::default();
    let opts = InitOptions {
        skip_install: true,
        ..InitOptions::default()
    };

    init(&mut stage, &mut prompter, &mut runner, &opts).unwrap();

    let doc = read_manifest(dir.path());
    assert_eq!(doc["name"], "issuer-api");
    assert_eq!(doc["version"], "1.2.3");
    assert!(doc["dependencies"]["@sprig/auth-native-authority"].is_string());

    let app = std::fs::read_to_string(dir.path().join("src/sprig-app.ts")).unwrap();
    assert!(app.contains("useAuthIssuer"));
    assert!(!app.contains("useAuthAudience"));
    assert!(!app.contains("{{"));

    let env = std::fs::read_to_string(dir.path().join("src/config/environment.ts")).unwrap();
    assert!(env.contains("'aud.one': 'aud-one-key'"));
    assert!(env.contains("issuer.test"));
}
