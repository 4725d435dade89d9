//! Merge-pass behavior against real on-disk manifests: key ordering,
//! conflict policies, pass restarts, and role-based dependency pruning.

mod common;

use common::{empty_project, project_with_manifest, read_manifest, sample_prefs};
use sprig::manifest::ManifestMerger;
use sprig::prefs::AuthRole;
use sprig::prompt::{Answer, ScriptedPrompter};

fn run_merge(
    stage: &mut sprig::stage::StagedFs,
    answers: Vec<Answer>,
    role: AuthRole,
) -> ScriptedPrompter {
    let mut prompter = ScriptedPrompter::new(answers);
    ManifestMerger::new(stage, &mut prompter)
        .update(&sample_prefs(role))
        .unwrap();
    stage.commit().unwrap();
    prompter
}

#[test]
fn fresh_manifest_lands_in_canonical_key_order() {
    let (dir, mut stage) = empty_project();
    run_merge(&mut stage, vec![], AuthRole::Issuer);

    let text = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
    let pos = |key: &str| {
        text.find(&format!("\"{key}\""))
            .unwrap_or_else(|| panic!("{key} missing"))
    };
    assert!(pos("name") < pos("version"));
    assert!(pos("version") < pos("description"));
    assert!(pos("description") < pos("author"));
    assert!(pos("author") < pos("license"));
    assert!(pos("license") < pos("scripts"));
    assert!(pos("scripts") < pos("dependencies"));
    assert!(pos("dependencies") < pos("devDependencies"));
}

#[test]
fn existing_sections_and_extras_are_sorted() {
    let (dir, mut stage) = project_with_manifest(
        r#"{
            "zeta": 1,
            "name": "demo-api",
            "alpha": 2,
            "dependencies": {"zz-lib": "^1.0.0", "aa-lib": "^1.0.0"}
        }"#,
    );
    // name/version equal-or-absent, so no conflicts; the extra top-level
    // keys sort alphabetically between the priority block and the
    // dependency sections.
    run_merge(&mut stage, vec![], AuthRole::Issuer);

    let text = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
    let pos = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("{needle} missing"));
    assert!(pos("\"license\"") < pos("\"alpha\""));
    assert!(pos("\"alpha\"") < pos("\"zeta\""));
    assert!(pos("\"zeta\"") < pos("\"dependencies\""));
    assert!(pos("\"aa-lib\"") < pos("\"zz-lib\""));

    let doc = read_manifest(dir.path());
    assert!(doc["dependencies"]["@sprig/core"].is_string());
    assert_eq!(doc["dependencies"]["zz-lib"], "^1.0.0");
}

#[test]
fn replace_all_policy_rewrites_every_conflicting_field() {
    let (dir, mut stage) =
        project_with_manifest(r#"{"name": "old-name", "version": "9.9.9"}"#);
    let prompter = run_merge(
        &mut stage,
        vec![Answer::Pick("replace"), Answer::Yes(true)],
        AuthRole::None,
    );

    let doc = read_manifest(dir.path());
    assert_eq!(doc["name"], "demo-api");
    assert_eq!(doc["version"], "0.1.0");
    assert!(prompter.reported("updated name with 'demo-api'"));
}

#[test]
fn rejected_review_restarts_with_a_fresh_policy() {
    let (dir, mut stage) = project_with_manifest(r#"{"name": "old-name"}"#);
    // Pass 1: keep-existing, then reject the review. Pass 2: the policy
    // was discarded, so the conflict prompts again; replace-all this time,
    // then accept.
    let prompter = run_merge(
        &mut stage,
        vec![
            Answer::Pick("keep"),
            Answer::Yes(false),
            Answer::Pick("replace"),
            Answer::Yes(true),
            Answer::Yes(true),
        ],
        AuthRole::None,
    );

    assert!(prompter.reported("restarting update to 'package.json'"));
    let doc = read_manifest(dir.path());
    assert_eq!(doc["name"], "demo-api");
}

#[test]
fn audience_role_prunes_issuer_only_packages() {
    let (dir, mut stage) = empty_project();
    run_merge(&mut stage, vec![], AuthRole::Audience);

    let doc = read_manifest(dir.path());
    let deps = doc["dependencies"].as_object().unwrap();
    assert!(deps.contains_key("@sprig/auth-audience"));
    assert!(!deps.contains_key("@sprig/auth-native-authority"));
    assert!(!deps.contains_key("email-templates"));
    assert!(!deps.contains_key("nodemailer"));
    let dev = doc["devDependencies"].as_object().unwrap();
    assert!(!dev.contains_key("@types/nodemailer"));
}

#[test]
fn no_auth_role_prunes_every_auth_package() {
    let (dir, mut stage) = empty_project();
    run_merge(&mut stage, vec![], AuthRole::None);

    let doc = read_manifest(dir.path());
    let deps = doc["dependencies"].as_object().unwrap();
    assert!(!deps.contains_key("@sprig/auth-audience"));
    assert!(!deps.contains_key("@sprig/auth-native-authority"));
    assert!(!deps.contains_key("email-templates"));
    assert!(deps.contains_key("@sprig/core"));
}

#[test]
fn issuer_role_keeps_the_full_dependency_set() {
    let (dir, mut stage) = empty_project();
    run_merge(&mut stage, vec![], AuthRole::Issuer);

    let doc = read_manifest(dir.path());
    let deps = doc["dependencies"].as_object().unwrap();
    assert!(deps.contains_key("@sprig/auth-audience"));
    assert!(deps.contains_key("@sprig/auth-native-authority"));
    assert!(deps.contains_key("email-templates"));
    assert!(deps.contains_key("nodemailer"));
}
