//! Settlement: turning an exit code and a delivery result into one verdict.
//!
//! A run settles exactly once, after the process has exited *and* the input
//! delivery has finished (successfully or not). Delivery failure takes
//! precedence over the exit code: a process that died mid-script usually
//! exits non-zero too, and "your script exited early" is the actionable
//! diagnosis, not the child's code.

use crate::error::ExecError;
use crate::router::Transcript;
use crate::scheduler::DeliveryFailure;

/// The settled result of a successful run: exit code zero, every input
/// delivered, both transcripts complete.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub code: i32,
    pub output: Transcript,
    pub error: Transcript,
}

impl Outcome {
    /// Concatenated stdout text, lossily decoded.
    pub fn output_text(&self) -> String {
        self.output.text()
    }

    /// Concatenated stderr text, lossily decoded.
    pub fn error_text(&self) -> String {
        self.error.text()
    }
}

/// Fold the exit code and the delivery result into the run's single verdict.
///
/// `exit_code` is the child's code, or -1 when it was killed by a signal.
pub(crate) fn settle(
    exit_code: i32,
    delivery: Result<(), DeliveryFailure>,
    command: &str,
    output: Transcript,
    error: Transcript,
) -> Result<Outcome, ExecError> {
    if let Err(failure) = delivery {
        return Err(ExecError::InputDelivery {
            input: failure.input,
            source: failure.source,
            output,
            error,
        });
    }

    if exit_code != 0 {
        return Err(ExecError::NonZeroExit {
            command: command.to_string(),
            code: exit_code,
            output,
            error,
        });
    }

    Ok(Outcome {
        code: exit_code,
        output,
        error,
    })
}
