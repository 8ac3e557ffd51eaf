use crate::error::ExternalCommandError;
use std::process::Command;

/// Seam between the admin tasks and the operating system.
pub trait CommandRunner {
    /// Runs `program` with `args` and returns its standard output.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExternalCommandError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExternalCommandError> {
        log::debug!("running {program} {}", args.join(" "));

        let out = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ExternalCommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !out.status.success() {
            return Err(ExternalCommandError::Failed {
                program: program.to_string(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// Windows PowerShell writes piped output in the OEM code page unless told otherwise.
const UTF8_OUTPUT: &str = "[Console]::OutputEncoding = [Text.Encoding]::UTF8; ";

#[must_use]
pub fn powershell_script(script: &str) -> String {
    format!("{UTF8_OUTPUT}{script}")
}

/// Runs `script` through `powershell` with UTF-8 output.
pub fn run_powershell(
    runner: &impl CommandRunner,
    script: &str,
) -> Result<String, ExternalCommandError> {
    let script = powershell_script(script);
    runner.run("powershell", &["-NoProfile", "-Command", script.as_str()])
}
