//! Page rendering: markdown → HTML → PDF via external tools.
//!
//! ## Why a trait?
//!
//! The pipeline only needs two file-to-file conversions. [`PageRenderer`]
//! captures exactly that, so the default [`ExternalRenderer`] (which spawns
//! `grip` and `wkhtmltopdf`) can be swapped for another toolchain or for an
//! in-process fake in tests, without touching the merge or cleanup stages.
//!
//! ## Exit codes
//!
//! Every invocation is checked: a missing executable, a non-zero exit status,
//! or an output file that was never written is a [`RenderError`]. The
//! renderer's stderr is captured and carried in the error so the failing
//! page can be diagnosed without re-running.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Placeholder replaced by the input file path in argument templates.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by the output file path in argument templates.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Converts one page between file formats.
///
/// Implementations run synchronously; the pipeline drives them from a
/// blocking thread.
pub trait PageRenderer: Send + Sync {
    /// Render markdown at `markdown` to an HTML file at `html`.
    fn render_html(&self, markdown: &Path, html: &Path) -> Result<(), RenderError>;

    /// Render HTML at `html` to a PDF file at `pdf`.
    fn render_pdf(&self, html: &Path, pdf: &Path) -> Result<(), RenderError>;
}

/// An external program plus its argument template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments; `{input}` and `{output}` are substituted per invocation.
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `grip --wide --export {input} {output}`
    pub fn default_html() -> Self {
        Self::new("grip", ["--wide", "--export", INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER])
    }

    /// `wkhtmltopdf -l {input} {output}`
    pub fn default_pdf() -> Self {
        Self::new("wkhtmltopdf", ["-l", INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER])
    }

    /// Substitute the placeholders for one invocation.
    pub fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| {
                a.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    /// Check the template is usable: non-empty program, both placeholders present.
    pub fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("renderer program must not be empty".into());
        }
        for placeholder in [INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
            if !self.args.iter().any(|a| a.contains(placeholder)) {
                return Err(format!(
                    "arguments for '{}' must contain {}",
                    self.program, placeholder
                ));
            }
        }
        Ok(())
    }

    /// Run the command and block until it exits.
    ///
    /// Succeeds only if the process exits with status 0 and `output` exists
    /// afterwards.
    pub fn run(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        let args = self.expand_args(input, output);
        debug!("Running {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::ToolNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    RenderError::SpawnFailed {
                        program: self.program.clone(),
                        source: e,
                    }
                }
            })?;

        if !result.status.success() {
            return Err(RenderError::NonZeroExit {
                program: self.program.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !output.exists() {
            return Err(RenderError::MissingOutput {
                program: self.program.clone(),
                output: output.to_path_buf(),
            });
        }

        Ok(())
    }
}

/// [`PageRenderer`] that shells out to two external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRenderer {
    pub html: ToolCommand,
    pub pdf: ToolCommand,
}

impl ExternalRenderer {
    pub fn new(html: ToolCommand, pdf: ToolCommand) -> Self {
        Self { html, pdf }
    }
}

impl Default for ExternalRenderer {
    fn default() -> Self {
        Self::new(ToolCommand::default_html(), ToolCommand::default_pdf())
    }
}

impl PageRenderer for ExternalRenderer {
    fn render_html(&self, markdown: &Path, html: &Path) -> Result<(), RenderError> {
        self.html.run(markdown, html)
    }

    fn render_pdf(&self, html: &Path, pdf: &Path) -> Result<(), RenderError> {
        self.pdf.run(html, pdf)
    }
}
