//! Shared test helpers for sprig integration tests.
//!
//! All tests use temp directories — no side effects outside them, and no
//! real npm/git processes (the scripted runner answers every call).

#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

use sprig::prefs::{AuthRole, Preferences};
use sprig::stage::StagedFs;

/// Fresh empty project directory plus a staged filesystem rooted there.
pub fn empty_project() -> (TempDir, StagedFs) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let stage = StagedFs::new(dir.path());
    (dir, stage)
}

/// Project directory seeded with an on-disk `package.json`.
pub fn project_with_manifest(json: &str) -> (TempDir, StagedFs) {
    let (dir, stage) = empty_project();
    std::fs::write(dir.path().join("package.json"), json).expect("failed to seed manifest");
    (dir, stage)
}

/// Parse the committed `package.json` from disk.
pub fn read_manifest(root: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(root.join("package.json")).expect("manifest not on disk");
    serde_json::from_str(&text).expect("manifest not valid JSON")
}

/// A fully-populated answer set, as if the user accepted sensible values.
pub fn sample_prefs(role: AuthRole) -> Preferences {
    Preferences {
        name: "demo-api".to_owned(),
        version: "0.1.0".to_owned(),
        description: "integration fixture".to_owned(),
        author: "tester".to_owned(),
        license: "MIT".to_owned(),
        auth_role: role,
        auth_issuer_name: "issuer.test".to_owned(),
        auth_audience_name: "audience.test".to_owned(),
        auth_jwt_key: "0123456789abcdef0123456789abcdef".to_owned(),
        auth_audiences: String::new(),
    }
}
