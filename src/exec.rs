//! The run engine: spawn, pump, deliver, settle.
//!
//! [`exec`] wires the pieces together. The child's stdout/stderr are drained
//! by the router from the moment of spawn; inputs are delivered sequentially
//! by the scheduler while the engine waits on process exit. Settlement
//! happens exactly once, after exit *and* delivery have both finished, so a
//! late write failure cannot race a clean exit verdict.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::command::ShellCommand;
use crate::error::ExecError;
use crate::outcome::{Outcome, settle};
use crate::router::{Router, Sink};
use crate::scheduler::deliver;
use crate::staging::StagedScript;
use crate::step::{DEFAULT_DELAY_BETWEEN_INPUTS, InputStep};

/// What to run: either a shell command line as-is, or a script staged to a
/// temp file first and run through its configured runner.
enum CommandSource {
    Shell(String),
    Staged(StagedScript),
}

/// Everything configurable about one run.
///
/// Build with [`ExecOptions::new`] (shell command) or [`ExecOptions::staged`]
/// (staged script), chain the setters, then hand it to [`exec`].
///
/// ```no_run
/// use clirig::exec::{exec, ExecOptions};
/// use clirig::step::ENTER;
///
/// # async fn demo() -> Result<(), clirig::error::ExecError> {
/// let outcome = exec(
///     ExecOptions::new("my-cli init")
///         .input("project-name")
///         .input(ENTER)
///         .output_sink(|chunk| print!("{}", String::from_utf8_lossy(chunk))),
/// )
/// .await?;
/// assert_eq!(outcome.code, 0);
/// # Ok(())
/// # }
/// ```
pub struct ExecOptions {
    source: CommandSource,
    inputs: Vec<InputStep>,
    cwd: Option<PathBuf>,
    delay_between_inputs: Duration,
    output_sink: Option<Sink>,
    error_sink: Option<Sink>,
    merge_stderr: bool,
    defer_input_until_output: bool,
}

impl ExecOptions {
    /// Run `command` through the platform shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self::from_source(CommandSource::Shell(command.into()))
    }

    /// Stage `script` to a temp file and run it through its runner.
    pub fn staged(script: StagedScript) -> Self {
        Self::from_source(CommandSource::Staged(script))
    }

    fn from_source(source: CommandSource) -> Self {
        Self {
            source,
            inputs: Vec::new(),
            cwd: None,
            delay_between_inputs: DEFAULT_DELAY_BETWEEN_INPUTS,
            output_sink: None,
            error_sink: None,
            merge_stderr: false,
            defer_input_until_output: false,
        }
    }

    /// Append one input step.
    pub fn input(mut self, step: impl Into<InputStep>) -> Self {
        self.inputs.push(step.into());
        self
    }

    /// Append a batch of input steps, in order.
    pub fn inputs<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<InputStep>,
    {
        self.inputs.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Run in `dir` instead of the caller's current directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Override the ambient default wait before each input.
    pub fn delay_between_inputs(mut self, delay: Duration) -> Self {
        self.delay_between_inputs = delay;
        self
    }

    /// Receive every captured stdout chunk as it arrives.
    pub fn output_sink(mut self, sink: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.output_sink = Some(Arc::new(sink));
        self
    }

    /// Receive every captured stderr chunk as it arrives. Ignored when
    /// [`merge_stderr`](Self::merge_stderr) is set.
    pub fn error_sink(mut self, sink: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.error_sink = Some(Arc::new(sink));
        self
    }

    /// Route stderr chunks to the output sink and transcript. For tools that
    /// write progress text to stderr without meaning failure.
    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }

    /// Hold the first input until the process has produced its first output
    /// chunk. Useful when the program takes a while to reach its first
    /// prompt and a fixed delay would be a guess.
    pub fn defer_input_until_output(mut self, defer: bool) -> Self {
        self.defer_input_until_output = defer;
        self
    }
}

/// Run the command to completion and settle its verdict.
///
/// Resolves once, after the process has exited and every scripted input has
/// been delivered (or delivery has failed). Both transcripts are complete by
/// the time this returns, on success and on failure alike.
pub async fn exec(mut opts: ExecOptions) -> Result<Outcome, ExecError> {
    let source = std::mem::replace(&mut opts.source, CommandSource::Shell(String::new()));
    match source {
        CommandSource::Shell(command) => run(&command, opts).await,
        CommandSource::Staged(script) => {
            let driver = script.materialize()?;
            debug!(path = %driver.path().display(), "staged driver script");
            let result = run(&driver.command_line(), opts).await;
            if result.is_ok() {
                driver.cleanup()?;
            }
            result
        }
    }
}

async fn run(command: &str, opts: ExecOptions) -> Result<Outcome, ExecError> {
    let mut shell = ShellCommand::new(command);
    if let Some(dir) = &opts.cwd {
        shell = shell.cwd(dir);
    }

    let spawned = shell.spawn()?;
    let mut child = spawned.child;

    let router = Router::attach(
        spawned.stdout,
        spawned.stderr,
        opts.output_sink,
        opts.error_sink,
        opts.merge_stderr,
    );

    let start_gate = opts
        .defer_input_until_output
        .then(|| router.first_output_gate());

    let (status, delivery) = tokio::join!(
        child.wait(),
        deliver(
            opts.inputs,
            spawned.stdin,
            opts.delay_between_inputs,
            start_gate,
        )
    );

    // Delivery handed the writer back on success; dropping it here closes
    // the pipe now that the child is gone.
    let delivery = delivery.map(drop);

    let status = status.map_err(|source| ExecError::Spawn {
        command: command.to_string(),
        source,
    })?;
    let exit_code = status.code().unwrap_or(-1);
    debug!(exit_code, "process exited");

    let (output, error) = router.drained().await;
    settle(exit_code, delivery, command, output, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_delay_is_ambient() {
        let opts = ExecOptions::new("true");
        assert_eq!(opts.delay_between_inputs, DEFAULT_DELAY_BETWEEN_INPUTS);
        assert!(opts.inputs.is_empty());
        assert!(!opts.merge_stderr);
        assert!(!opts.defer_input_until_output);
    }

    #[test]
    fn test_inputs_accumulate_in_order() {
        let opts = ExecOptions::new("true")
            .input("a")
            .inputs(["b", "c"])
            .input(("d", Duration::from_millis(5)));
        let texts: Vec<&str> = opts.inputs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
        assert_eq!(opts.inputs[3].delay_before, Some(Duration::from_millis(5)));
    }
}
