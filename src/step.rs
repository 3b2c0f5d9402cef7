//! Input steps and the key byte sequences used to drive interactive prompts.

use std::time::Duration;

/// Submit the current answer (carriage return, what prompt libraries listen for).
pub const ENTER: &str = "\x0D";
/// Toggle a checkbox choice.
pub const SPACE: &str = "\x20";
/// Move the selection cursor up.
pub const UP: &str = "\x1B\x5B\x41";
/// Move the selection cursor down.
pub const DOWN: &str = "\x1B\x5B\x42";

/// Default wait before each input. Prompt libraries need time to register
/// their stdin listener between questions; anything much lower drops keystrokes.
pub const DEFAULT_DELAY_BETWEEN_INPUTS: Duration = Duration::from_millis(400);

/// One scheduled unit of injected input.
///
/// A step is the text to write to the program's stdin plus an optional
/// explicit delay. Steps without an explicit delay wait the ambient default;
/// a step *with* one both waits that long and makes it the new ambient
/// default for every later step that omits its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStep {
    pub text: String,
    pub delay_before: Option<Duration>,
}

impl InputStep {
    /// Create a step that uses the ambient default delay.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delay_before: None,
        }
    }

    /// Create a step with an explicit delay before it fires.
    pub fn timed(text: impl Into<String>, delay_before: Duration) -> Self {
        Self {
            text: text.into(),
            delay_before: Some(delay_before),
        }
    }

    /// Attach an explicit delay to an existing step.
    pub fn with_delay(mut self, delay_before: Duration) -> Self {
        self.delay_before = Some(delay_before);
        self
    }
}

impl From<&str> for InputStep {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for InputStep {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<(&str, Duration)> for InputStep {
    fn from((text, delay): (&str, Duration)) -> Self {
        Self::timed(text, delay)
    }
}

impl From<(String, Duration)> for InputStep {
    fn from((text, delay): (String, Duration)) -> Self {
        Self::timed(text, delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_step_has_no_explicit_delay() {
        let step = InputStep::text("hello");
        assert_eq!(step.text, "hello");
        assert_eq!(step.delay_before, None);
    }

    #[test]
    fn test_timed_step() {
        let step = InputStep::timed("hello", Duration::from_millis(1300));
        assert_eq!(step.delay_before, Some(Duration::from_millis(1300)));
    }

    #[test]
    fn test_from_tuple() {
        let step: InputStep = ("hi", Duration::from_secs(2)).into();
        assert_eq!(step.text, "hi");
        assert_eq!(step.delay_before, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_key_constants() {
        assert_eq!(ENTER, "\r");
        assert_eq!(SPACE, " ");
        assert_eq!(UP, "\x1b[A");
        assert_eq!(DOWN, "\x1b[B");
    }
}
