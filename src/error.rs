//! The engine's failure taxonomy.
//!
//! Every failure carries enough context to diagnose the run: non-zero exits
//! and delivery failures keep both transcripts, so output captured before the
//! failure stays available. Nothing is retried and nothing is swallowed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::router::Transcript;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The shell itself could not be started or waited on, e.g. the working
    /// directory does not exist.
    #[error("failed to run {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and terminated with a non-zero code. A child killed by
    /// a signal reports code -1.
    #[error("failed executing {command:?} with exit code {code}")]
    NonZeroExit {
        command: String,
        code: i32,
        output: Transcript,
        error: Transcript,
    },

    /// A write to the process's stdin failed, typically because the process
    /// exited before all scripted inputs were delivered.
    #[error("unable to send input {input:?} to the cli; check that your script didn't exit early")]
    InputDelivery {
        input: String,
        #[source]
        source: io::Error,
        output: Transcript,
        error: Transcript,
    },

    /// The ephemeral driver script could not be created or removed.
    #[error("failed to stage driver script at {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExecError {
    /// The exit code this failure reports to the caller.
    ///
    /// Delivery failures always report 1, whatever the process's true exit
    /// code was. Spawn failures use the shell's command-not-runnable
    /// convention. Non-zero exits surface the child's code verbatim.
    pub fn code(&self) -> i32 {
        match self {
            ExecError::Spawn { .. } => 127,
            ExecError::NonZeroExit { code, .. } => *code,
            ExecError::InputDelivery { .. } => 1,
            ExecError::Staging { .. } => 1,
        }
    }

    /// The output transcript captured before the failure, when one exists.
    pub fn output(&self) -> Option<&Transcript> {
        match self {
            ExecError::NonZeroExit { output, .. } | ExecError::InputDelivery { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// The error transcript captured before the failure, when one exists.
    pub fn error_output(&self) -> Option<&Transcript> {
        match self {
            ExecError::NonZeroExit { error, .. } | ExecError::InputDelivery { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }
}
