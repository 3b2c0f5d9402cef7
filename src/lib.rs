//! # Clirig
//!
//! A scripted process-interaction rig for driving command-line programs.
//!
//! Clirig spawns a shell command with fully piped stdio, captures its stdout
//! and stderr in real time, and injects a scripted sequence of keystrokes
//! into its stdin on a timed schedule. It is useful for end-to-end testing
//! of interactive CLI tools, driving prompt flows unattended, and capturing
//! faithful transcripts of what a program printed.
//!
//! ## Quick start
//!
//! ```no_run
//! use clirig::{ExecOptions, exec};
//! use clirig::step::ENTER;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let outcome = exec(
//!         ExecOptions::new("npx create-thing")
//!             .input("my-project")
//!             .input(ENTER)
//!             .input(ENTER),
//!     )
//!     .await?;
//!
//!     println!("{}", outcome.output_text());
//!     Ok(())
//! }
//! ```
//!
//! A run settles exactly once, after the process has exited *and* every
//! scripted input has been delivered. Anything else is an [`ExecError`]:
//! non-zero exits carry the child's code, and a write to a process that
//! exited early surfaces as a delivery failure naming the undelivered input.
//!
//! ## Input timing
//!
//! Each input waits before it is written. The default wait is 400 ms, which
//! gives prompt libraries time to re-register their stdin listener between
//! questions. A step with an explicit delay waits that long instead *and*
//! makes it the new default for every later step without its own:
//!
//! ```no_run
//! use std::time::Duration;
//! use clirig::{ExecOptions, exec};
//!
//! # async fn demo() -> Result<(), clirig::ExecError> {
//! let outcome = exec(
//!     ExecOptions::new("slow-cli setup")
//!         .input("fast answer")
//!         .input(("slow answer", Duration::from_secs(3)))
//!         .input("also waits 3s"),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Input script syntax
//!
//! Inputs can also come from a small line-oriented script via [`parse_str`]
//! or [`parse_file`]:
//!
//! | Directive | Description |
//! |-----------|-------------|
//! | `send "text"` | Write the quoted text to the program's stdin |
//! | `key Enter` | Write a named key (`Enter`, `Space`, `Up`, `Down`) |
//! | `after 500ms send "x"` | Explicit delay before a directive (`ms` or `s`, floats allowed) |
//! | `# comment` | Full-line or inline comment |
//!
//! ## Custom output handling
//!
//! Attach sinks to observe chunks as they are captured; both streams are
//! always recorded in transcripts regardless:
//!
//! ```no_run
//! use clirig::{ExecOptions, exec};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let captured = std::sync::Arc::new(std::sync::Mutex::new(Vec::<u8>::new()));
//!     let sink = captured.clone();
//!
//!     let outcome = exec(ExecOptions::new("ls -la").output_sink(move |chunk| {
//!         sink.lock().unwrap().extend_from_slice(chunk);
//!     }))
//!     .await?;
//!
//!     println!("{}", String::from_utf8_lossy(&captured.lock().unwrap()));
//!     Ok(())
//! }
//! ```
//!
//! ## Staged driver scripts
//!
//! [`StagedScript`](staging::StagedScript) writes an ephemeral driver file
//! to the temp directory and runs it through a configured runner, loading
//! mock modules before the target so they can patch what it reads at load
//! time. The file is removed after a clean run and kept for inspection
//! after a failed one.

pub mod command;
pub mod error;
pub mod exec;
pub mod logging;
pub mod outcome;
pub mod parser;
pub mod router;
pub(crate) mod scheduler;
pub mod staging;
pub mod step;

pub use command::ShellCommand;
pub use error::ExecError;
pub use exec::{ExecOptions, exec};
pub use outcome::Outcome;
pub use parser::{parse_file, parse_str};
pub use router::{Sink, Transcript};
pub use staging::{IncludeStyle, StagedScript};
pub use step::InputStep;
