//! Process configuration

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for running an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Executable command
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory (None = current dir)
    pub working_dir: Option<PathBuf>,
    /// Environment variables (added to parent env)
    pub env: HashMap<String, String>,
    /// Timeout for process execution (None = no timeout)
    pub timeout: Option<Duration>,
    /// Stream output to the terminal instead of capturing it
    pub inherit_stdio: bool,
    /// Data written to the child's stdin (None = no stdin)
    pub stdin: Option<String>,
}

impl ProcessConfig {
    /// Create new process configuration
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            inherit_stdio: false,
            stdin: None,
        }
    }

    /// Set command arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn extend_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Set timeout duration
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Feed `data` to the child's stdin, e.g. a password for `--password-stdin`
    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Let the child write straight to the parent's stdout/stderr
    pub fn inherit_stdio(mut self, inherit: bool) -> Self {
        self.inherit_stdio = inherit;
        self
    }
}

impl fmt::Display for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_arguments() {
        let config = ProcessConfig::new("aws")
            .args(["cloudformation", "deploy"])
            .arg("--no-fail-on-empty-changeset")
            .env("AWS_PAGER", "")
            .timeout_secs(30);

        assert_eq!(config.command, "aws");
        assert_eq!(
            config.args,
            vec!["cloudformation", "deploy", "--no-fail-on-empty-changeset"]
        );
        assert_eq!(config.env.get("AWS_PAGER").map(String::as_str), Some(""));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(!config.inherit_stdio);
    }

    #[test]
    fn test_display_renders_command_line() {
        let config = ProcessConfig::new("git").args(["describe", "--tags"]);
        assert_eq!(config.to_string(), "git describe --tags");
    }

    #[test]
    fn test_extend_args_appends() {
        let config = ProcessConfig::new("aws")
            .args(["sts", "get-caller-identity"])
            .extend_args(["--output", "text"]);
        assert_eq!(config.to_string(), "aws sts get-caller-identity --output text");
    }
}
