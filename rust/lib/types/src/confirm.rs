/// Asks the operator to confirm a destructive action.
///
/// The CLI prompts on stdin; tests plug in fixed answers.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines every prompt.
pub struct AssumeNo;

impl Confirm for AssumeNo {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Result of an action that may need confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sent to the backend and the list reloaded.
    Applied,
    /// The operator said no; nothing was sent.
    Declined,
}
