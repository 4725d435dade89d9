//! Minimal template rendering.
//!
//! The template set only needs two constructs, so the renderer stays small
//! instead of pulling in a full template engine:
//!
//! - `{{key}}` — variable interpolation (unknown keys render empty);
//! - `{{#if key}}` / `{{else}}` / `{{/if}}` — line-delimited conditional
//!   blocks, truthy when the key has a non-empty value. Control lines must
//!   be alone on their line and are dropped from the output.
//!
//! Rendering is a pure function of (template, context) — identical inputs
//! always produce identical output, which is what makes re-running the
//! scaffolder a no-op.

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Key/value context for rendering. Missing keys interpolate as empty and
/// are falsy in conditionals.
#[derive(Clone, Debug, Default)]
pub struct RenderContext {
    vars: BTreeMap<String, String>,
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// Render `template` against `ctx`.
#[must_use]
pub fn render(template: &str, ctx: &RenderContext) -> String {
    // Stack of conditional frames; each holds whether its branch emits.
    let mut frames: Vec<bool> = Vec::new();
    let mut out = String::new();

    for line in template.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(key) = trimmed
            .strip_prefix("{{#if ")
            .and_then(|rest| rest.strip_suffix("}}"))
        {
            frames.push(ctx.truthy(key.trim()));
            continue;
        }
        if trimmed == "{{else}}" {
            if let Some(frame) = frames.last_mut() {
                *frame = !*frame;
            }
            continue;
        }
        if trimmed == "{{/if}}" {
            frames.pop();
            continue;
        }

        if frames.iter().all(|&emit| emit) {
            out.push_str(&interpolate(line, ctx));
        }
    }
    out
}

/// Replace every `{{key}}` occurrence in `line`. Unknown keys render empty.
fn interpolate(line: &str, ctx: &RenderContext) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        if let Some(end) = after.find("}}") {
            let key = after[..end].trim();
            if let Some(value) = ctx.get(key) {
                out.push_str(value);
            }
            rest = &after[end + 2..];
        } else {
            // Unterminated marker: emit literally.
            out.push_str(&rest[start..]);
            return out;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> RenderContext {
        let mut c = RenderContext::new();
        for (k, v) in pairs {
            c.set(*k, *v);
        }
        c
    }

    #[test]
    fn interpolates_variables() {
        let c = ctx(&[("name", "demo")]);
        assert_eq!(render("project {{name}}!\n", &c), "project demo!\n");
    }

    #[test]
    fn unknown_keys_render_empty() {
        assert_eq!(render("[{{missing}}]\n", &RenderContext::new()), "[]\n");
    }

    #[test]
    fn conditional_blocks_respect_truthiness() {
        let template = "{{#if auth}}\nauth on\n{{else}}\nauth off\n{{/if}}\n";
        assert_eq!(render(template, &ctx(&[("auth", "issuer")])), "auth on\n");
        assert_eq!(render(template, &ctx(&[("auth", "")])), "auth off\n");
        assert_eq!(render(template, &RenderContext::new()), "auth off\n");
    }

    #[test]
    fn nested_conditionals() {
        let template = "{{#if a}}\n{{#if b}}\nboth\n{{/if}}\nonly a\n{{/if}}\n";
        assert_eq!(
            render(template, &ctx(&[("a", "1"), ("b", "1")])),
            "both\nonly a\n"
        );
        assert_eq!(render(template, &ctx(&[("a", "1")])), "only a\n");
        assert_eq!(render(template, &ctx(&[("b", "1")])), "");
    }

    #[test]
    fn idempotent_for_identical_inputs() {
        let c = ctx(&[("name", "x"), ("auth", "issuer")]);
        let t = "{{#if auth}}\n{{name}} with auth\n{{/if}}\n";
        assert_eq!(render(t, &c), render(t, &c));
    }

    #[test]
    fn unterminated_marker_is_literal() {
        assert_eq!(render("oops {{name\n", &RenderContext::new()), "oops {{name\n");
    }
}
