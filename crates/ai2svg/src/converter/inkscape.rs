//! Inkscape-backed converter.
//!
//! Drives Inkscape (1.0 or newer) in command-line mode. Every invocation is built
//! from an argument vector and spawned directly, never through a shell, and carries
//! a timeout; a timed-out child is killed when its handle is dropped.
//!
//! # Invocations
//!
//! - availability: `inkscape --version`
//! - probe: `inkscape --query-all <input>`
//! - first page: `inkscape <input> --export-type=svg --export-filename=<out>`
//! - page N: `inkscape <input> --pdf-page=N --export-type=svg --export-filename=<out>`
//! - whole document: `inkscape <input> --export-plain-svg --export-filename=<out>`
//!
//! # System Requirement
//!
//! - **macOS**: `brew install --cask inkscape`
//! - **Linux**: `apt install inkscape` or `dnf install inkscape`
//! - **Windows**: `winget install Inkscape.Inkscape`
//!
//! Set `AI2SVG_INKSCAPE_PATH` when Inkscape lives outside `PATH`.

use super::version::{MIN_MAJOR_VERSION, extract_version};
use super::{Converter, ConverterStatus, ExportOutcome, ExportTarget, InstallGuidance, ProbeReport};
use crate::core::SafePath;
use crate::core::config::ConverterConfig;
use crate::{Ai2SvgError, Result};
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Default timeout for a single Inkscape invocation (60 seconds)
pub const DEFAULT_INVOCATION_TIMEOUT: u64 = 60;

/// Availability checks get a shorter leash than conversions
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

fn inkscape_install_message() -> String {
    "Inkscape 1.0 or newer is required to convert Adobe Illustrator files. \
Install: macOS: 'brew install --cask inkscape', \
Linux: 'apt install inkscape', \
Windows: 'winget install Inkscape.Inkscape'. \
If Inkscape is installed in a custom location, set the AI2SVG_INKSCAPE_PATH environment variable to the inkscape executable."
        .to_string()
}

/// Whole seconds covering `limit`, rounded up so sub-second limits never read as zero.
fn seconds_ceil(limit: Duration) -> u64 {
    limit.as_secs() + u64::from(limit.subsec_nanos() > 0)
}

/// Outcome of spawning the converter and waiting for it.
#[derive(Debug)]
enum Invocation {
    Exited(Output),
    SpawnFailed(std::io::Error),
}

/// Converter backed by the `inkscape` executable.
#[derive(Debug, Clone)]
pub struct InkscapeConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for InkscapeConverter {
    fn default() -> Self {
        Self::new("inkscape", Duration::from_secs(DEFAULT_INVOCATION_TIMEOUT))
    }
}

impl InkscapeConverter {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.binary.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Argument vector for one export invocation.
    pub fn export_args(input: &Path, output: &Path, target: ExportTarget) -> Vec<OsString> {
        let mut args = vec![input.as_os_str().to_os_string()];

        match target {
            ExportTarget::FirstPage => args.push("--export-type=svg".into()),
            ExportTarget::Page(page) => {
                args.push(format!("--pdf-page={}", page).into());
                args.push("--export-type=svg".into());
            }
            ExportTarget::WholeDocument => args.push("--export-plain-svg".into()),
        }

        let mut filename = OsString::from("--export-filename=");
        filename.push(output.as_os_str());
        args.push(filename);
        args
    }

    /// Argument vector for the structural probe.
    pub fn probe_args(input: &Path) -> Vec<OsString> {
        vec!["--query-all".into(), input.as_os_str().to_os_string()]
    }

    async fn run<I, S>(&self, args: I, limit: Duration, operation: &str) -> Result<Invocation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let spawned = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => return Ok(Invocation::SpawnFailed(e)),
        };
        let child_id = child.id();

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(Invocation::Exited(output)),
            Ok(Err(e)) => Err(Ai2SvgError::Io(std::io::Error::other(format!(
                "Failed to wait for Inkscape: {}",
                e
            )))),
            Err(_) => {
                // wait_with_output was cancelled; kill_on_drop terminates the child
                tracing::warn!(
                    "Inkscape {} timed out after {}s (PID: {:?})",
                    operation,
                    seconds_ceil(limit),
                    child_id
                );
                Err(Ai2SvgError::Timeout {
                    operation: format!("Inkscape {}", operation),
                    seconds: seconds_ceil(limit),
                })
            }
        }
    }
}

/// Prefer stderr; fall back to stdout when the converter reports errors there.
fn diagnostic_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("Inkscape exited with status {}", output.status.code().unwrap_or(-1))
}

#[async_trait]
impl Converter for InkscapeConverter {
    fn name(&self) -> &str {
        "inkscape"
    }

    fn install_guidance(&self) -> InstallGuidance {
        InstallGuidance {
            macos: "brew install --cask inkscape".to_string(),
            linux: "apt install inkscape (or dnf install inkscape)".to_string(),
            windows: "winget install Inkscape.Inkscape".to_string(),
            docker: "RUN apt-get update && apt-get install -y --no-install-recommends inkscape".to_string(),
        }
    }

    async fn status(&self) -> ConverterStatus {
        let invocation = match self.run(["--version"], VERSION_CHECK_TIMEOUT, "version check").await {
            Ok(invocation) => invocation,
            Err(e) => return ConverterStatus::unavailable(format!("Inkscape version check failed: {}", e)),
        };

        match invocation {
            Invocation::Exited(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let version = extract_version(&stdout).or_else(|| extract_version(&stderr));

                match version {
                    Some(v) if !v.is_supported() => {
                        tracing::warn!("Inkscape {} predates {}.0; conversions may fail", v, MIN_MAJOR_VERSION);
                        ConverterStatus::available(
                            format!(
                                "Inkscape {} is available, but version {}.0 or newer is recommended",
                                v, MIN_MAJOR_VERSION
                            ),
                            Some(v.to_string()),
                        )
                    }
                    Some(v) => ConverterStatus::available(format!("Inkscape {} is available", v), Some(v.to_string())),
                    None => ConverterStatus::available("Inkscape is available (version unknown)", None),
                }
            }
            Invocation::Exited(output) => ConverterStatus::unavailable(format!(
                "Inkscape executable '{}' responded with a failure when checking '--version': {}. \
Please reinstall Inkscape.",
                self.binary.display(),
                diagnostic_text(&output)
            )),
            Invocation::SpawnFailed(err) => ConverterStatus::unavailable(format!(
                "Inkscape executable '{}' could not be executed: {}. {help}",
                self.binary.display(),
                err,
                help = inkscape_install_message()
            )),
        }
    }

    async fn probe(&self, input: &SafePath) -> Result<ProbeReport> {
        let invocation = self.run(Self::probe_args(input.as_path()), self.timeout, "probe").await?;

        Ok(match invocation {
            Invocation::Exited(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let object_count = stdout.lines().filter(|l| !l.trim().is_empty()).count();
                ProbeReport {
                    succeeded: true,
                    object_count: Some(object_count),
                    detail: format!("Inkscape reported {} objects", object_count),
                }
            }
            Invocation::Exited(output) => ProbeReport {
                succeeded: false,
                object_count: None,
                detail: diagnostic_text(&output),
            },
            Invocation::SpawnFailed(err) => ProbeReport {
                succeeded: false,
                object_count: None,
                detail: err.to_string(),
            },
        })
    }

    async fn export(&self, input: &SafePath, output: &Path, target: ExportTarget) -> Result<ExportOutcome> {
        let args = Self::export_args(input.as_path(), output, target);
        tracing::debug!("Running {} {:?}", self.binary.display(), args);

        let invocation = self.run(&args, self.timeout, "export").await?;

        Ok(match invocation {
            Invocation::Exited(out) if out.status.success() => ExportOutcome::Completed,
            Invocation::Exited(out) => ExportOutcome::Failed {
                diagnostic: diagnostic_text(&out),
            },
            Invocation::SpawnFailed(err) => ExportOutcome::Failed {
                diagnostic: format!("Failed to execute Inkscape at '{}': {}", self.binary.display(), err),
            },
        })
    }
}
