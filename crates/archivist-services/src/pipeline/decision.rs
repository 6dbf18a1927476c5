use archivist_core::{Destination, RetainedFolder};

/// Supplies the two run-time decisions the pipeline cannot make itself
pub trait DecisionProvider {
    /// Asked once, after the scan, with the folders about to be archived
    fn confirm_proceed(&self, expired: &[RetainedFolder]) -> bool;

    /// `None` means no valid destination was chosen and the run stops
    fn choose_destination(&self) -> Option<Destination>;
}

/// Decisions fixed up front (non-interactive runs, tests)
#[derive(Debug, Clone, Default)]
pub struct PresetDecisions {
    proceed: bool,
    destination: Option<Destination>,
}

impl PresetDecisions {
    pub fn new(proceed: bool, destination: Option<Destination>) -> Self {
        Self {
            proceed,
            destination,
        }
    }

    /// Proceed to the given destination
    pub fn approve(destination: Destination) -> Self {
        Self::new(true, Some(destination))
    }

    pub fn decline() -> Self {
        Self::new(false, None)
    }
}

impl DecisionProvider for PresetDecisions {
    fn confirm_proceed(&self, _expired: &[RetainedFolder]) -> bool {
        self.proceed
    }

    fn choose_destination(&self) -> Option<Destination> {
        self.destination.clone()
    }
}
