//! The interactive surface used by every flow
//!
//! Flows never talk to a terminal directly. They ask a [`Prompter`], which is
//! backed by cliclack in the binary and by scripted answers in tests.

use crate::error::Result;

/// One entry of a select or multiselect prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub hint: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hint: String::new(),
        }
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }
}

/// Prompts and user-facing log lines
///
/// Prompt methods suspend until answered and return [`crate::Error::Cancelled`]
/// when the user interrupts.
pub trait Prompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Returns the index of the chosen option
    fn select(&mut self, prompt: &str, options: &[SelectOption]) -> Result<usize>;

    /// Returns the indices of the chosen options, in option order
    fn multiselect(
        &mut self,
        prompt: &str,
        options: &[SelectOption],
        initial: &[usize],
    ) -> Result<Vec<usize>>;

    fn input(&mut self, prompt: &str, default: &str) -> Result<String>;

    /// Read a secret value, hiding it on screen when `masked` is set
    fn secret(&mut self, prompt: &str, masked: bool) -> Result<String>;

    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    fn error(&mut self, message: &str);
    fn success(&mut self, message: &str);
}
