//! Interactive overwrite prompt on stdin

use crate::mods::{ConflictDecision, ConflictPrompt, ContentKind};
use indicatif::ProgressBar;
use std::io::{self, BufRead, Write};

/// Asks on the terminal, pausing the progress bar while waiting
pub struct StdinPrompt {
    bar: ProgressBar,
}

impl StdinPrompt {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl ConflictPrompt for StdinPrompt {
    fn ask(&mut self, name: &str, kind: ContentKind) -> ConflictDecision {
        self.bar.suspend(|| loop {
            print!(
                "{} '{}' is already installed. Overwrite? [y]es / [a]ll / [n]o / [N]one: ",
                kind.label(),
                name
            );
            io::stdout().flush().ok();

            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => return ConflictDecision::No,
                Ok(_) => {}
            }
            if let Some(decision) = parse_answer(&line) {
                return decision;
            }
        })
    }
}

/// Parse a prompt answer; an empty answer keeps the installed folder
pub fn parse_answer(input: &str) -> Option<ConflictDecision> {
    match input.trim() {
        "y" | "Y" | "yes" => Some(ConflictDecision::Yes),
        "a" | "A" | "all" => Some(ConflictDecision::YesToAll),
        "" | "n" | "no" => Some(ConflictDecision::No),
        "N" | "none" => Some(ConflictDecision::NoToAll),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers() {
        assert_eq!(parse_answer("y\n"), Some(ConflictDecision::Yes));
        assert_eq!(parse_answer("all"), Some(ConflictDecision::YesToAll));
        assert_eq!(parse_answer("\n"), Some(ConflictDecision::No));
        assert_eq!(parse_answer("N"), Some(ConflictDecision::NoToAll));
        assert_eq!(parse_answer("maybe"), None);
    }
}
