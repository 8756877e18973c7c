// Panther deploy CLI library

pub mod artifacts;
pub mod aws;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod router;

pub use artifacts::{CommandArtifactBuilder, PipLayerPackager};
pub use aws::{resolve_region, AwsCli};
pub use error::{CliError, CliResult};
pub use logging::{init_logging, VerbosityLevel};
pub use prompt::{LinePrompter, StdinPrompter};
pub use router::{Cli, CommandRouter, Commands};
