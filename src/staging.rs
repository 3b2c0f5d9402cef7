//! Staging ephemeral driver scripts to disk.
//!
//! A staged run writes a small driver file into the system temp directory,
//! executes it through a configured runner, and removes the file once the
//! run settles cleanly. Failed runs leave the file behind so the driver can
//! be inspected; `retain` keeps it unconditionally.
//!
//! Drivers come in two shapes: an inline body used verbatim, or a module
//! path plus mock modules rendered into include calls. Mocks are loaded and
//! invoked *before* the target module so they can patch what the target
//! reads at load time.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::debug;

use crate::error::ExecError;

/// How a rendered driver pulls in modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStyle {
    /// CommonJS `require(...)` calls.
    Require,
    /// Dynamic `await import(...)` expressions. Dynamic rather than static
    /// imports, so mocks run before the target loads instead of being
    /// hoisted past it.
    Import,
}

impl IncludeStyle {
    /// The style a file extension implies. TypeScript and ESM extensions
    /// get import syntax; everything else gets require.
    pub fn for_extension(extension: &str) -> Self {
        match extension {
            "ts" | "mts" | "mjs" => IncludeStyle::Import,
            _ => IncludeStyle::Require,
        }
    }

    fn renderer(self) -> DriverRenderer {
        INCLUDE_STYLES
            .iter()
            .find(|(style, _)| *style == self)
            .map(|(_, render)| *render)
            .unwrap_or(render_require)
    }
}

type DriverRenderer = fn(&str, &[String]) -> String;

static INCLUDE_STYLES: &[(IncludeStyle, DriverRenderer)] = &[
    (IncludeStyle::Require, render_require),
    (IncludeStyle::Import, render_import),
];

fn render_require(target: &str, mocks: &[String]) -> String {
    let mut body = String::new();
    for (i, mock) in mocks.iter().enumerate() {
        body.push_str(&format!(
            "const mock{i} = require('{}');\nmock{i}();\n",
            strip_module_extension(mock)
        ));
    }
    body.push_str(&format!("require('{}');\n", strip_module_extension(target)));
    body
}

fn render_import(target: &str, mocks: &[String]) -> String {
    let mut body = String::new();
    for (i, mock) in mocks.iter().enumerate() {
        body.push_str(&format!(
            "const mock{i} = (await import('{}')).default;\nmock{i}();\n",
            strip_module_extension(mock)
        ));
    }
    body.push_str(&format!(
        "await import('{}');\n",
        strip_module_extension(target)
    ));
    body
}

/// Drop a trailing `.js`/`.ts` so the include call resolves through the
/// runner's own loader instead of pinning a concrete file.
fn strip_module_extension(path: &str) -> &str {
    path.strip_suffix(".js")
        .or_else(|| path.strip_suffix(".ts"))
        .unwrap_or(path)
}

/// What the staged driver file contains.
#[derive(Debug, Clone)]
enum ScriptSource {
    Inline { body: String },
    ModulePath { target: String, mocks: Vec<String> },
}

/// A driver script ready to be staged and run.
///
/// ```no_run
/// use clirig::staging::StagedScript;
///
/// let script = StagedScript::module("/repo/dist/cli.js")
///     .mock("/repo/test/mock-home.js")
///     .arg("--dry-run");
/// ```
#[derive(Debug, Clone)]
pub struct StagedScript {
    source: ScriptSource,
    runner: String,
    extension: String,
    include_style: Option<IncludeStyle>,
    args: Vec<String>,
    retain: bool,
}

impl StagedScript {
    /// Stage `body` verbatim as the driver file.
    pub fn inline(body: impl Into<String>) -> Self {
        Self::from_source(ScriptSource::Inline { body: body.into() })
    }

    /// Render a driver that loads `target` after invoking any mocks.
    pub fn module(target: impl Into<String>) -> Self {
        Self::from_source(ScriptSource::ModulePath {
            target: target.into(),
            mocks: Vec::new(),
        })
    }

    fn from_source(source: ScriptSource) -> Self {
        Self {
            source,
            runner: "node".to_string(),
            extension: "js".to_string(),
            include_style: None,
            args: Vec::new(),
            retain: false,
        }
    }

    /// Add a mock module, loaded and invoked before the target. No effect
    /// on inline scripts.
    pub fn mock(mut self, path: impl Into<String>) -> Self {
        if let ScriptSource::ModulePath { mocks, .. } = &mut self.source {
            mocks.push(path.into());
        }
        self
    }

    /// The program that executes the staged file. Defaults to `node`.
    pub fn runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    /// Extension of the staged file, without the dot. Defaults to `js`;
    /// also picks the include style unless one is set explicitly.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Force an include style instead of deriving it from the extension.
    pub fn include_style(mut self, style: IncludeStyle) -> Self {
        self.include_style = Some(style);
        self
    }

    /// Append an argument passed to the staged file after its path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Keep the staged file on disk after a clean run.
    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    fn body(&self) -> String {
        match &self.source {
            ScriptSource::Inline { body } => body.clone(),
            ScriptSource::ModulePath { target, mocks } => {
                let style = self
                    .include_style
                    .unwrap_or_else(|| IncludeStyle::for_extension(&self.extension));
                style.renderer()(target, mocks)
            }
        }
    }

    /// Write the driver to a temp file and hand back the staged handle.
    pub fn materialize(self) -> Result<StagedDriver, ExecError> {
        let staging_err = |path: PathBuf| {
            move |source: std::io::Error| ExecError::Staging { path, source }
        };

        let mut file = Builder::new()
            .prefix("clirig-")
            .suffix(&format!(".{}", self.extension))
            .tempfile()
            .map_err(staging_err(std::env::temp_dir()))?;

        file.write_all(self.body().as_bytes())
            .map_err(staging_err(file.path().to_path_buf()))?;

        let temp_path = file.into_temp_path();
        let path = temp_path
            .keep()
            .map_err(|err| ExecError::Staging {
                path: std::env::temp_dir(),
                source: err.error,
            })?;

        debug!(path = %path.display(), runner = %self.runner, "staged driver");

        Ok(StagedDriver {
            path,
            runner: self.runner,
            args: self.args,
            retain: self.retain,
        })
    }
}

/// A driver file on disk plus how to run it.
pub struct StagedDriver {
    path: PathBuf,
    runner: String,
    args: Vec<String>,
    retain: bool,
}

impl StagedDriver {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The shell command line running this driver.
    pub fn command_line(&self) -> String {
        let mut command = format!("{} \"{}\"", self.runner, self.path.display());
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    /// Remove the staged file, unless it was marked for retention.
    pub fn cleanup(self) -> Result<(), ExecError> {
        if self.retain {
            debug!(path = %self.path.display(), "retaining staged driver");
            return Ok(());
        }
        std::fs::remove_file(&self.path).map_err(|source| ExecError::Staging {
            path: self.path,
            source,
        })
    }
}
