//! Interactive operator decisions.
//!
//! Prompts go to stderr so stdout stays machine-readable JSON.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use archivist_core::constants::PRESET_DESTINATIONS;
use archivist_core::{Destination, RetainedFolder};
use archivist_services::DecisionProvider;

const MENU_LABELS: &[&str] = &["Remote server", "External drive", "Cloud storage"];

pub struct PromptDecisions<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
    assume_yes: bool,
    destination: Option<Destination>,
}

impl PromptDecisions<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio(assume_yes: bool, destination: Option<Destination>) -> Self {
        Self::new(io::stdin().lock(), io::stderr(), assume_yes, destination)
    }
}

impl<R: BufRead, W: Write> PromptDecisions<R, W> {
    /// `assume_yes` skips the confirmation; a preset `destination` skips the menu
    pub fn new(input: R, output: W, assume_yes: bool, destination: Option<Destination>) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
            assume_yes,
            destination,
        }
    }

    fn say(&self, text: &str) {
        let mut out = self.output.borrow_mut();
        if let Err(e) = write!(out, "{}", text).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "Failed to write prompt");
        }
    }

    /// `None` on end of input or a read error
    fn read_answer(&self) -> Option<String> {
        let mut line = String::new();
        match self.input.borrow_mut().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read operator input");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> DecisionProvider for PromptDecisions<R, W> {
    fn confirm_proceed(&self, expired: &[RetainedFolder]) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut listing = String::from("\nFolders eligible for archival:\n");
        for folder in expired {
            listing.push_str(&format!(" - {}\n", folder.name));
        }
        self.say(&listing);
        self.say("\nProceed with archive and deletion? (yes/no): ");

        self.read_answer()
            .map(|answer| answer.eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }

    fn choose_destination(&self) -> Option<Destination> {
        if let Some(destination) = &self.destination {
            return Some(destination.clone());
        }

        let mut menu = String::from("\nSelect archive destination:\n");
        for (i, label) in MENU_LABELS.iter().enumerate() {
            menu.push_str(&format!("{}. {}\n", i + 1, label));
        }
        self.say(&menu);
        self.say("Select option: ");

        let answer = self.read_answer()?;
        let index = answer.parse::<usize>().ok()?.checked_sub(1)?;
        PRESET_DESTINATIONS
            .get(index)
            .and_then(|name| Destination::new(*name))
    }
}
