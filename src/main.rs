use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use clirig::logging::init_logging;
use clirig::staging::{IncludeStyle, StagedScript};
use clirig::{ExecOptions, exec, parse_file};

#[derive(Parser, Debug)]
#[command(
    name = "clirig",
    about = "Run a command-line program with scripted inputs and captured output",
    version
)]
struct Args {
    /// Shell command to run (mutually exclusive with --script-path)
    #[arg(short, long, conflicts_with = "script_path")]
    command: Option<String>,

    /// Path to a module staged as an ephemeral driver script and run via the runner
    #[arg(long)]
    script_path: Option<String>,

    /// Mock module loaded and invoked before the staged target (repeatable)
    #[arg(long = "mock-script")]
    mock_scripts: Vec<String>,

    /// Program that executes the staged driver
    #[arg(long, default_value = "node")]
    runner: String,

    /// Extension of the staged driver file, without the dot
    #[arg(long, default_value = "js")]
    extension: String,

    /// Force require-style includes in the staged driver
    #[arg(long, conflicts_with = "import_style")]
    require_style: bool,

    /// Force import-style includes in the staged driver
    #[arg(long)]
    import_style: bool,

    /// Argument appended after the staged driver's path (repeatable)
    #[arg(long = "script-arg")]
    script_args: Vec<String>,

    /// Keep the staged driver file after a clean run
    #[arg(long)]
    retain_script: bool,

    /// Path to an input script file (send/key/after directives)
    #[arg(short, long)]
    inputs_file: Option<PathBuf>,

    /// Working directory for the child process
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Default delay in milliseconds before each input
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Route stderr chunks to the output stream
    #[arg(long)]
    merge_stderr: bool,

    /// Hold the first input until the program produces its first output
    #[arg(long)]
    defer_input: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut opts = match (&args.command, &args.script_path) {
        (Some(command), None) => ExecOptions::new(command),
        (None, Some(target)) => {
            let mut script = StagedScript::module(target)
                .runner(&args.runner)
                .extension(&args.extension)
                .retain(args.retain_script);
            for mock in &args.mock_scripts {
                script = script.mock(mock);
            }
            for arg in &args.script_args {
                script = script.arg(arg);
            }
            if args.require_style {
                script = script.include_style(IncludeStyle::Require);
            } else if args.import_style {
                script = script.include_style(IncludeStyle::Import);
            }
            ExecOptions::staged(script)
        }
        _ => anyhow::bail!("exactly one of --command or --script-path is required"),
    };

    if let Some(path) = &args.inputs_file {
        let steps = parse_file(path)
            .with_context(|| format!("Failed to load inputs from {}", path.display()))?;
        opts = opts.inputs(steps);
    }
    if let Some(dir) = args.cwd {
        opts = opts.cwd(dir);
    }
    if let Some(ms) = args.delay_ms {
        opts = opts.delay_between_inputs(Duration::from_millis(ms));
    }

    opts = opts
        .merge_stderr(args.merge_stderr)
        .defer_input_until_output(args.defer_input)
        .output_sink(|chunk| {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(chunk);
            let _ = stdout.flush();
        });
    if !args.merge_stderr {
        opts = opts.error_sink(|chunk| {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(chunk);
            let _ = stderr.flush();
        });
    }

    match exec(opts).await {
        Ok(outcome) => std::process::exit(outcome.code),
        Err(err) => {
            eprintln!("clirig: {err:#}");
            std::process::exit(err.code());
        }
    }
}
