use super::CrontabStore;
use crate::error::{CronError, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Crontab of a user, managed through the `crontab` program
#[derive(Debug, Clone)]
pub struct SystemCrontab {
    program: PathBuf,
    user: Option<String>,
}

impl SystemCrontab {
    pub fn new(user: Option<String>) -> Self {
        Self {
            program: PathBuf::from(crate::DEFAULT_CRONTAB_PROGRAM),
            user,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(ref user) = self.user {
            cmd.arg("-u").arg(user);
        }
        cmd
    }
}

impl CrontabStore for SystemCrontab {
    fn read(&self) -> Result<Vec<String>> {
        let output = self
            .command()
            .arg("-l")
            .output()
            .map_err(|e| CronError::store("read", format!("{}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // crontab exits non-zero with "no crontab for USER" when none is installed
            if stderr.trim_start().starts_with("no crontab") {
                return Ok(vec![stderr.trim().to_string()]);
            }
            return Err(CronError::store(
                "read",
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        // foreign lines are written back on commit, so they must survive as read
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| CronError::store("read", format!("crontab is not valid UTF-8: {}", e)))?;
        Ok(stdout.lines().map(str::to_string).collect())
    }

    fn write(&self, lines: &[String]) -> Result<()> {
        let mut child = self
            .command()
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CronError::store("write", format!("{}: {}", self.program.display(), e)))?;

        let piped = match child.stdin.take() {
            Some(mut stdin) => lines.iter().try_for_each(|line| writeln!(stdin, "{}", line)),
            None => Ok(()),
        };
        // stdin is closed here so crontab sees EOF

        let output = child
            .wait_with_output()
            .map_err(|e| CronError::store("write", e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CronError::store(
                "write",
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }
        piped.map_err(|e| CronError::store("write", e.to_string()))?;

        log::debug!(
            "installed {} crontab lines for {}",
            lines.len(),
            self.user.as_deref().unwrap_or("current user")
        );
        Ok(())
    }
}
