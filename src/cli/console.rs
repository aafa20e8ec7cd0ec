use colored::*;
use std::io::{self, Write};

use crate::coordinator::PermissionOutcome;

/// Console handles all terminal I/O with colored formatting
pub struct Console {
    prompt_color: Color,
    granted_color: Color,
    denied_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            prompt_color: Color::Cyan,
            granted_color: Color::Green,
            denied_color: Color::Red,
        }
    }

    /// Create a new Console with custom colors
    pub fn with_colors(prompt_color: Color, granted_color: Color, denied_color: Color) -> Self {
        Self {
            prompt_color,
            granted_color,
            denied_color,
        }
    }

    /// Print a permission outcome
    pub fn print_outcome(&self, outcome: &PermissionOutcome) {
        println!("{}", self.format_outcome(outcome));
    }

    /// Format a permission outcome for display
    pub fn format_outcome(&self, outcome: &PermissionOutcome) -> String {
        let status = if outcome.granted {
            "granted".color(self.granted_color).bold()
        } else {
            "denied".color(self.denied_color).bold()
        };

        let mut line = format!("{} {} {}", "Permission:".bold(), outcome.identifier, status);
        if outcome.should_show_rationale {
            line.push_str(&format!(" {}", "(explain why it is needed)".yellow()));
        }
        line
    }

    /// Print the aggregated result of a request
    pub fn print_all_granted(&self, all_granted: bool) {
        if all_granted {
            println!("{}", "All permissions granted".color(self.granted_color).bold());
        } else {
            println!("{}", "Some permissions were denied".color(self.denied_color).bold());
        }
    }

    /// Print a newline
    pub fn println(&self) {
        println!();
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Read a line of input from the user
    pub fn read_input(&self) -> io::Result<String> {
        print!("{} ", ">".color(self.prompt_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    /// Ask the user to allow or deny one permission
    pub fn ask_permission(&self, identifier: &str) -> io::Result<bool> {
        print!(
            "{} Allow {}? [y/N] ",
            "Prompt:".color(self.prompt_color).bold(),
            identifier.bold()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(parse_answer(&input))
    }

    /// Ask the user about every permission in a prompt batch, in order
    pub fn ask_batch(&self, identifiers: &[String]) -> io::Result<Vec<bool>> {
        identifiers
            .iter()
            .map(|id| self.ask_permission(id))
            .collect()
    }

    /// Print a welcome banner
    pub fn print_banner(&self) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  Permission Request Console".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Enter permission names separated by spaces. Type 'exit' or 'quit' to end the session.");
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer(" YES "));
        assert!(!parse_answer("n"));
        assert!(!parse_answer(""));
    }

    #[test]
    fn test_format_outcome() {
        colored::control::set_override(false);
        let console = Console::new();

        assert_eq!(
            console.format_outcome(&PermissionOutcome::granted("CAMERA")),
            "Permission: CAMERA granted"
        );
        assert_eq!(
            console.format_outcome(&PermissionOutcome::new("MIC", false, true)),
            "Permission: MIC denied (explain why it is needed)"
        );
    }
}
