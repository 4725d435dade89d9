//! Embedded template set and templated manifest sections.
//!
//! The scaffolded project files ship inside the binary as string constants
//! rather than a directory that has to be located at runtime. Destination
//! paths are relative to the project root.
//!
//! Template text uses the renderer's `{{…}}` constructs plus the `//-`
//! marker understood by [`crate::templates::strip_marker_lines`]: a bare
//! `//-` line disappears after rendering, and `//-`-prefixed content keeps
//! the content but drops the marker. This lets a template emit structural
//! comment lines only when a conditional block actually rendered something.

use serde_json::{json, Value};

use crate::templates::TemplateFile;

/// Templated `dependencies` merged into the manifest. Role-dependent
/// entries are pruned afterwards by the manifest merger.
#[must_use]
pub fn dependency_set() -> Value {
    json!({
        "@sprig/core": "^0.12.0",
        "@sprig/auth-audience": "^0.5.1",
        "@sprig/auth-native-authority": "^0.6.0",
        "email-templates": "^3.5.0",
        "nodemailer": "^4.6.7",
        "express": "^4.16.3"
    })
}

/// Templated `devDependencies`.
#[must_use]
pub fn dev_dependency_set() -> Value {
    json!({
        "@types/email-templates": "^3.5.0",
        "@types/express": "^4.16.0",
        "@types/node": "^10.5.2",
        "@types/nodemailer": "^4.6.2",
        "ts-node": "^7.0.0",
        "typescript": "^2.9.2"
    })
}

/// Templated `scripts`.
#[must_use]
pub fn script_set() -> Value {
    json!({
        "build": "tsc",
        "start": "npm run build && node dist/index.js",
        "test": "npm run build && node dist/spec/run.js",
        "docker:up": "docker-compose up -d",
        "docker:down": "docker-compose down"
    })
}

/// The full template file set, in materialization order.
#[must_use]
pub fn template_set() -> Vec<TemplateFile> {
    vec![
        TemplateFile::rendered(".gitignore", GITIGNORE),
        TemplateFile::rendered("README.md", README),
        TemplateFile::rendered("docker-compose.yml", DOCKER_COMPOSE),
        TemplateFile::rendered("tsconfig.json", TSCONFIG),
        TemplateFile::rendered("src/index.ts", INDEX_TS),
        TemplateFile::rendered("src/sprig-app.ts", SPRIG_APP_TS),
        TemplateFile::rendered("src/config/environment.ts", ENVIRONMENT_TS),
        // Nested generator template: copied verbatim, rendered later by
        // the project itself.
        TemplateFile::verbatim("generators/route.ts.tmpl", ROUTE_GENERATOR),
    ]
}

const GITIGNORE: &str = "\
node_modules/
dist/
*.log
";

const README: &str = "\
# {{name}}

{{description}}

Scaffolded with sprig. Start the server with `npm start` and browse to
http://localhost:8001/api.

## License

{{license}}
";

const DOCKER_COMPOSE: &str = "\
version: '3'
services:
  mongo:
    image: mongo:4
    ports:
      - '37001:27017'
";

const TSCONFIG: &str = r#"{
  "compilerOptions": {
    "module": "commonjs",
    "outDir": "dist",
    "strict": true,
    "target": "es2017"
  },
  "include": ["src/**/*"]
}
"#;

const INDEX_TS: &str = "\
import {app} from './sprig-app';

app.listen(8001).catch((err) => {
  console.error(err);
  process.exit(1);
});
";

const SPRIG_APP_TS: &str = "\
// {{name}} application wiring
import {Sprig} from '@sprig/core';
import {environment} from './config/environment';

export const app = new Sprig(environment);
//-
{{#if auth_role}}
//-// authentication ({{auth_role}} role)
{{/if}}
{{#if auth_is_audience}}
app.useAuthAudience(environment.authentication);
{{/if}}
{{#if auth_is_issuer}}
app.useAuthIssuer(environment.authentication);
{{/if}}
";

const ENVIRONMENT_TS: &str = "\
// environment for {{name}} v{{version}}
export const environment = {
  name: '{{name}}',
  port: 8001,
//-
{{#if auth_role}}
  authentication: {
    jwt: {
      issuer: '{{auth_issuer_name}}',
{{#if auth_audience_name}}
      audience: '{{auth_audience_name}}',
{{/if}}
      key: '{{auth_jwt_key}}',
{{#if auth_audiences}}
      audiences: {
{{auth_audiences}}
      },
{{/if}}
    },
  },
{{/if}}
};
";

const ROUTE_GENERATOR: &str = "\
import {Routable} from '@sprig/core';

@Routable({baseUrl: '{{route_base}}'})
export class {{class_name}} {
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_sets_are_objects() {
        assert!(dependency_set().is_object());
        assert!(dev_dependency_set().is_object());
        assert!(script_set().is_object());
    }

    #[test]
    fn template_destinations_are_unique_and_relative() {
        let set = template_set();
        let mut dests: Vec<&str> = set.iter().map(|t| t.dest).collect();
        assert!(dests.iter().all(|d| !d.starts_with('/')));
        dests.sort_unstable();
        dests.dedup();
        assert_eq!(dests.len(), set.len());
    }

    #[test]
    fn only_nested_templates_are_verbatim() {
        for t in template_set() {
            assert_eq!(t.verbatim, t.dest.ends_with(".tmpl"), "{}", t.dest);
        }
    }
}
