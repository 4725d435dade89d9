//! Environment probes for the tools a scaffolded project relies on.

use anyhow::Result;

use crate::exec::ProcessRunner;
use crate::prompt::{Prompter, Status};

const PROBES: [(&str, &[&str], &str); 3] = [
    ("git", &["--version"], "version control for the new project"),
    ("npm", &["--version"], "dependency installs and scripts"),
    ("docker", &["--version"], "the docker-compose dev environment"),
];

/// Check that git, npm, and docker are runnable. Returns the number of
/// missing tools.
pub fn doctor(prompter: &mut dyn Prompter, runner: &mut dyn ProcessRunner) -> Result<usize> {
    let cwd = std::env::current_dir()?;
    let mut missing = 0;
    for (program, args, purpose) in PROBES {
        match runner.run_capture(&cwd, program, args) {
            Ok((0, version)) => {
                prompter.report(
                    Status::Ok,
                    &format!("{program}: {}", version.lines().next().unwrap_or("found")),
                );
            }
            _ => {
                missing += 1;
                prompter.report(Status::Warn, &format!("{program} not found ({purpose})"));
            }
        }
    }
    if missing == 0 {
        prompter.report(Status::Ok, "environment looks good");
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;
    use crate::prompt::ScriptedPrompter;

    #[test]
    fn reports_each_probe() {
        let mut prompter = ScriptedPrompter::new(vec![]);
        let mut runner = ScriptedRunner::new(vec![
            (0, "git version 2.43.0\n".to_owned()),
            (0, "10.2.4\n".to_owned()),
            (1, String::new()),
        ]);

        let missing = doctor(&mut prompter, &mut runner).unwrap();

        assert_eq!(missing, 1);
        assert!(prompter.reported("git version 2.43.0"));
        assert!(prompter.reported("docker not found"));
    }

    #[test]
    fn all_present_is_a_clean_bill() {
        let mut prompter = ScriptedPrompter::new(vec![]);
        let mut runner = ScriptedRunner::new(vec![
            (0, "git version 2.43.0\n".to_owned()),
            (0, "10.2.4\n".to_owned()),
            (0, "Docker version 25.0\n".to_owned()),
        ]);

        assert_eq!(doctor(&mut prompter, &mut runner).unwrap(), 0);
        assert!(prompter.reported("environment looks good"));
    }
}
