//! Shell command runner for verification and post-processing.

use async_trait::async_trait;
use std::path::Path;
use tessera_error::{GenerationError, GenerationErrorKind, TesseraResult};
use tessera_interface::{CommandOutput, CommandRunner};
use tokio::process::Command;

pub(crate) const FILE_PLACEHOLDER: &str = "{{file}}";

/// Runs command templates through `sh -c`.
///
/// `{{file}}` is replaced by the single-quoted file path. A template without the
/// placeholder receives the path as its last argument.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner {
    shell: Option<String>,
}

impl ShellCommandRunner {
    /// Runner using `sh`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner using a different POSIX shell.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: Some(shell.into()),
        }
    }

    /// Substitute the file path into a command template.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_pipeline::ShellCommandRunner;
    /// use std::path::Path;
    ///
    /// let line = ShellCommandRunner::render("jq . {{file}}", Path::new("/tmp/it's.json"));
    /// assert_eq!(line, r#"jq . '/tmp/it'\''s.json'"#);
    /// ```
    pub fn render(command: &str, file: &Path) -> String {
        let quoted = shell_quote(&file.display().to_string());
        let normalized = command.replace("{{ file }}", FILE_PLACEHOLDER);
        if normalized.contains(FILE_PLACEHOLDER) {
            normalized.replace(FILE_PLACEHOLDER, &quoted)
        } else {
            format!("{} {}", normalized, quoted)
        }
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    #[tracing::instrument(skip(self), fields(file = %file.display()))]
    async fn run(&self, command: &str, file: &Path) -> TesseraResult<CommandOutput> {
        let line = Self::render(command, file);
        let shell = self.shell.as_deref().unwrap_or("sh");

        let output = Command::new(shell)
            .arg("-c")
            .arg(&line)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::CommandFailed {
                    command: line.clone(),
                    message: e.to_string(),
                })
            })?;

        let status = output.status.code().unwrap_or(-1);
        tracing::debug!(command = %line, status, "Command finished");

        Ok(CommandOutput::new(
            status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        ))
    }
}
