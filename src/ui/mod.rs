//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and the console [Interaction]

use std::io::{self, BufRead, Write};

use crate::error::Result;
use crate::release::{Interaction, PollState};
use crate::warning::ReleaseWarning;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_analysis, display_error, display_report, display_run_state, display_section,
    display_status, display_success, display_warning, outcome_message,
};

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Displays the given prompt and accepts "y" or "yes" (case-insensitive) as confirmation.
/// Default is "no" if user presses Enter.
///
/// # Arguments
/// * `prompt` - The prompt message to display (without the "(y/N): " suffix)
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - Otherwise (including Enter, "n"/"no", or end of input)
/// * `Err` - If input error occurs
pub fn confirm_action(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    confirm_with(prompt, &mut stdin.lock(), &mut stdout)
}

fn confirm_with<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "\n{} (y/N): ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Interaction on the terminal: styled output and stdin prompts
#[derive(Debug, Default)]
pub struct ConsoleInteraction;

impl Interaction for ConsoleInteraction {
    fn status(&mut self, message: &str) {
        display_status(message);
    }

    fn success(&mut self, message: &str) {
        display_success(message);
    }

    fn warning(&mut self, warning: &ReleaseWarning) {
        display_warning(warning);
    }

    fn run_state(&mut self, state: PollState) {
        display_run_state(state);
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        confirm_action(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> bool {
        let mut out = Vec::new();
        confirm_with("Commit?", &mut Cursor::new(text.as_bytes()), &mut out).unwrap()
    }

    #[test]
    fn test_confirm_accepts_yes() {
        assert!(answer("y\n"));
        assert!(answer("YES\n"));
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        assert!(!answer("\n"));
        assert!(!answer("n\n"));
        assert!(!answer(""));
    }

    #[test]
    fn test_confirm_writes_prompt() {
        let mut out = Vec::new();
        confirm_with("Commit?", &mut Cursor::new(&b"y\n"[..]), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nCommit? (y/N): ");
    }
}
