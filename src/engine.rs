//! External analysis engine boundary.
//!
//! The orchestrator never interprets engine output. An engine consumes the
//! staged workspace however it likes; the only contract is the report
//! artifact it is expected to leave behind, which callers verify by existence
//! and size alone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::util::has_extension;

/// Interval between child liveness polls while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Engine invocation failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine command is empty")]
    EmptyCommand,
    #[error("parse engine command {command:?}: {source}")]
    Parse {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },
    #[error("engine program {program:?} not found on PATH")]
    ProgramNotFound { program: String },
    #[error("no .{ext} file staged in {}", .workspace.display())]
    MissingPrimary { workspace: PathBuf, ext: String },
    #[error("inspect workspace {}: {source}", .workspace.display())]
    Workspace {
        workspace: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("spawn {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("wait on engine: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
    #[error("engine exceeded {limit_secs}s and was killed")]
    TimedOut { limit_secs: u64 },
}

/// Anything that can analyze a staged workspace.
///
/// Implementations run to completion synchronously and return the path where
/// the report artifact is expected. They are not trusted to report their own
/// success; callers verify the artifact instead.
pub trait AnalysisEngine {
    fn run_analysis(&self, workspace: &Path) -> Result<PathBuf, EngineError>;
}

/// Report artifact name for a primary file: stem plus the configured suffix.
pub fn report_artifact_name(primary: &str, suffix: &str) -> String {
    let stem = Path::new(primary)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| primary.to_string());
    format!("{stem}{suffix}")
}

/// Check a report artifact: its size when present and non-empty, otherwise
/// the reason it failed verification.
pub fn verify_artifact(path: &Path) -> Result<u64, String> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(format!("report artifact is empty at {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(format!("report artifact missing at {}", path.display()))
        }
        Err(err) => Err(format!(
            "report artifact unreadable at {}: {err}",
            path.display()
        )),
    }
}

/// Runs a configured command line as the analysis engine.
///
/// The program is resolved on PATH up front, so a misconfigured command fails
/// before the batch touches anything. Each invocation appends the workspace
/// path as the final argument. The exit status is logged, not consulted:
/// success is decided by artifact verification alone.
#[derive(Debug)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    report_dir: PathBuf,
    report_suffix: String,
    primary_ext: String,
    timeout: Option<Duration>,
}

impl CommandEngine {
    pub fn new(
        command: &str,
        report_dir: impl Into<PathBuf>,
        report_suffix: impl Into<String>,
        primary_ext: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, EngineError> {
        let words = shell_words::split(command).map_err(|source| EngineError::Parse {
            command: command.to_string(),
            source,
        })?;
        let Some((program, args)) = words.split_first() else {
            return Err(EngineError::EmptyCommand);
        };
        let program = which::which(program).map_err(|_| EngineError::ProgramNotFound {
            program: program.clone(),
        })?;
        Ok(Self {
            program,
            args: args.to_vec(),
            report_dir: report_dir.into(),
            report_suffix: report_suffix.into(),
            primary_ext: primary_ext.into(),
            timeout: timeout_secs.map(Duration::from_secs),
        })
    }

    /// First staged primary in the workspace, by sorted name.
    fn staged_primary(&self, workspace: &Path) -> Result<String, EngineError> {
        let entries = fs::read_dir(workspace).map_err(|source| EngineError::Workspace {
            workspace: workspace.to_path_buf(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| EngineError::Workspace {
                workspace: workspace.to_path_buf(),
                source,
            })?;
            if let Ok(name) = entry.file_name().into_string() {
                if has_extension(&name, &self.primary_ext) {
                    names.push(name);
                }
            }
        }
        names.sort();
        names
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::MissingPrimary {
                workspace: workspace.to_path_buf(),
                ext: self.primary_ext.clone(),
            })
    }

    fn wait_with_timeout(&self, child: &mut Child) -> Result<ExitStatus, EngineError> {
        let Some(limit) = self.timeout else {
            return child.wait().map_err(|source| EngineError::Wait { source });
        };
        let started = Instant::now();
        loop {
            match child
                .try_wait()
                .map_err(|source| EngineError::Wait { source })?
            {
                Some(status) => return Ok(status),
                None if started.elapsed() >= limit => {
                    // The child may exit between the poll and the kill.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EngineError::TimedOut {
                        limit_secs: limit.as_secs(),
                    });
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        }
    }
}

impl AnalysisEngine for CommandEngine {
    fn run_analysis(&self, workspace: &Path) -> Result<PathBuf, EngineError> {
        let primary = self.staged_primary(workspace)?;
        let artifact = self
            .report_dir
            .join(report_artifact_name(&primary, &self.report_suffix));
        tracing::info!(
            program = %self.program.display(),
            primary = %primary,
            "invoking analysis engine"
        );
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(workspace)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        let status = self.wait_with_timeout(&mut child)?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            exit = ?status.code(),
            "analysis engine exited"
        );
        Ok(artifact)
    }
}
