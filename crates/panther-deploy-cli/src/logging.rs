// Logging and verbosity control

use tracing::Level;

/// Verbosity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// Warnings and errors only
    Quiet,
    /// Progress lines and the final summary
    Normal,
    /// Debug output, including every external command
    Verbose,
}

impl VerbosityLevel {
    /// Pick the level from CLI flags; `--quiet` wins over `--verbose`
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Most detailed tracing level shown at this verbosity
    pub fn max_level(self) -> Level {
        match self {
            VerbosityLevel::Quiet => Level::WARN,
            VerbosityLevel::Normal => Level::INFO,
            VerbosityLevel::Verbose => Level::DEBUG,
        }
    }
}

/// Install the tracing subscriber; call once at startup
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = VerbosityLevel::from_flags(verbose, quiet);

    // Progress lines read like a log, not like a trace
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level.max_level())
        .with_target(level == VerbosityLevel::Verbose)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr);

    if level == VerbosityLevel::Verbose {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(VerbosityLevel::from_flags(false, false), VerbosityLevel::Normal);
        assert_eq!(VerbosityLevel::from_flags(true, false), VerbosityLevel::Verbose);
        assert_eq!(VerbosityLevel::from_flags(true, true), VerbosityLevel::Quiet);
    }

    #[test]
    fn test_levels() {
        assert_eq!(VerbosityLevel::Quiet.max_level(), Level::WARN);
        assert_eq!(VerbosityLevel::Normal.max_level(), Level::INFO);
        assert_eq!(VerbosityLevel::Verbose.max_level(), Level::DEBUG);
        assert!(VerbosityLevel::Quiet < VerbosityLevel::Verbose);
    }
}
