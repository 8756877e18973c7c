// Output formatting and styling

use colored::Colorize;

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    /// Styling without color codes
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format prompt
    pub fn prompt(&self, prompt: &str) -> String {
        if self.use_colors {
            prompt.magenta().bold().to_string()
        } else {
            prompt.to_string()
        }
    }

    /// Format header
    pub fn header(&self, title: &str) -> String {
        if self.use_colors {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_has_no_escape_codes() {
        let style = OutputStyle::plain();
        assert_eq!(style.error("failed"), "✗ failed");
        assert_eq!(style.prompt("Email: "), "Email: ");
        assert_eq!(style.header("Who?"), "Who?");
    }

    #[test]
    fn test_colored_output_keeps_text() {
        colored::control::set_override(true);
        let style = OutputStyle { use_colors: true };
        let header = style.header("Who will be the initial Panther admin user?");
        assert!(header.contains("initial Panther admin"));
        assert!(header.contains("\u{1b}["));
        colored::control::unset_override();
    }
}
