//! # panther-deploy-process
//!
//! **Purpose**: External command execution for the Panther deploy tool
//!
//! Every interaction with tooling outside this process (toolchain probes,
//! `git describe`, the docker daemon, the AWS CLI, packaging commands) goes
//! through [`ProcessManager`], which spawns the command, captures its output,
//! enforces an optional timeout and maps a non-zero exit into a typed error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use panther_deploy_process::{CommandRunner, ProcessConfig, ProcessManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ProcessManager::new();
//! let output = manager
//!     .run(ProcessConfig::new("git").args(["describe", "--tags"]))
//!     .await?;
//! println!("version: {}", output.stdout_trimmed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod runner;

pub use config::ProcessConfig;
pub use error::{ProcessError, Result};
pub use manager::{CommandOutput, ProcessManager};
pub use runner::CommandRunner;
