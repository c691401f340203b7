//! Execution engine boundary.
//!
//! The executor loop talks to the interpreter through the [`ExecutionEngine`]
//! trait. The engine is stateful and strictly single-threaded: it is created
//! before the executor thread starts, moved onto that thread, and executes
//! one snippet at a time for the life of the process.
//!
//! [`ProcessEngine`] is the concrete engine: it pipes each snippet to a
//! configured interpreter command and captures its output. Tests substitute
//! their own implementations of the trait.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;
use tracing::debug;

/// What one engine invocation produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineOutcome {
    /// Interpreter output in emission order, error lines prefixed "Error: ".
    pub text_lines: Vec<String>,

    /// Paths of graphic files emitted during this invocation.
    pub graphic_artifacts: Vec<String>,

    /// Whether the snippet itself raised an error while running.
    pub had_error: bool,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be brought up at all. Fatal at process level.
    #[error("engine initialization failed: {0}")]
    Init(String),

    /// The engine could not run this snippet. Converted to a per-task
    /// failure response, never fatal to the executor loop.
    #[error("engine execution failed: {0}")]
    Execution(String),
}

/// The single-threaded interpreter seam the executor loop drives.
pub trait ExecutionEngine: Send + 'static {
    /// Runs one snippet to completion and reports its output.
    ///
    /// Errors the snippet raised are not `Err`: they come back as an
    /// outcome with `had_error` set and the error text in `text_lines`.
    /// `Err` means the engine could not run the snippet at all.
    fn execute(&mut self, code: &str) -> Result<EngineOutcome, EngineError>;
}

/// Engine that pipes snippets to an external interpreter process.
///
/// Each `execute` call spawns `program args...`, writes the snippet to its
/// stdin and waits for exit. Stdout becomes the captured text lines, stderr
/// lines follow them prefixed with `Error: `, and a non-zero exit marks the
/// outcome as errored.
#[derive(Debug)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Probes the interpreter with an empty snippet.
    ///
    /// Run once at startup, before the executor thread exists. A failure
    /// here means the configured interpreter cannot run on this host and
    /// the process should not come up.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        self.run("")
            .map_err(|err| EngineError::Init(err.to_string()))?;
        debug!(program = %self.program, "execution engine initialized");
        Ok(())
    }

    fn run(&self, code: &str) -> Result<EngineOutcome, EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                EngineError::Execution(format!("failed to spawn {}: {}", self.program, err))
            })?;

        // The write and the output drain must run concurrently: a snippet
        // larger than the stdin pipe buffer whose early commands emit more
        // than a pipe buffer of output would otherwise deadlock, with the
        // child blocked on a full stdout and the parent blocked on stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            let snippet = code.as_bytes().to_vec();
            thread::spawn(move || stdin.write_all(&snippet))
        });

        let output = child.wait_with_output().map_err(|err| {
            EngineError::Execution(format!("failed to collect output: {}", err))
        })?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    return Err(EngineError::Execution(format!(
                        "failed to write snippet: {}",
                        err
                    )))
                }
                Err(_) => {
                    return Err(EngineError::Execution(
                        "snippet writer thread panicked".to_string(),
                    ))
                }
            }
        }

        let mut text_lines = capture_lines(&output.stdout, None);
        text_lines.extend(capture_lines(&output.stderr, Some("Error: ")));

        Ok(EngineOutcome {
            text_lines,
            graphic_artifacts: Vec::new(),
            had_error: !output.status.success(),
        })
    }
}

impl ExecutionEngine for ProcessEngine {
    fn execute(&mut self, code: &str) -> Result<EngineOutcome, EngineError> {
        self.run(code)
    }
}

/// Splits a captured stream into lines, stripping the trailing newline so
/// each captured section is its own line. Blank interior lines are kept.
fn capture_lines(bytes: &[u8], prefix: Option<&str>) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.strip_suffix('\n').unwrap_or(&text);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| match prefix {
            Some(prefix) => format!("{}{}", prefix, line),
            None => line.to_string(),
        })
        .collect()
}
