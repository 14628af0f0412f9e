//! Frame acquisition.
//!
//! A [`FrameSource`] makes sure a fresh image is readable at the image path
//! before a cycle classifies it.

use crate::error::{AcquisitionError, ConfigError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Allowance for filesystems that stamp modification times from a coarse clock.
const MTIME_SLACK: Duration = Duration::from_millis(250);

#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Produce a fresh frame at `image_path`.
    async fn acquire(&self, image_path: &Path) -> Result<(), AcquisitionError>;
}

/// Runs an external frame-grab utility, e.g. `fswebcam -r 1280x720 --no-banner`.
///
/// The image path is appended as the last argument. The frame only counts as
/// captured if the command succeeds and the file was written during the call.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace.
    ///
    /// Quotes and escapes are not interpreted, so an argument cannot contain
    /// whitespace.
    pub fn parse(command_line: &str) -> Result<Self, ConfigError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ConfigError::InvalidCaptureCommand(command_line.to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl FrameSource for CommandCapture {
    async fn acquire(&self, image_path: &Path) -> Result<(), AcquisitionError> {
        let started = SystemTime::now();
        debug!(
            "Capturing frame: {} {} {}",
            self.program,
            self.args.join(" "),
            image_path.display()
        );

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(AcquisitionError::Spawn)?;

        if !status.success() {
            return Err(AcquisitionError::CommandFailed(status));
        }

        let metadata = tokio::fs::metadata(image_path)
            .await
            .map_err(|_| AcquisitionError::MissingFrame(image_path.to_path_buf()))?;

        // Without mtime support there is nothing to compare against.
        if let Ok(modified) = metadata.modified() {
            if modified + MTIME_SLACK < started {
                return Err(AcquisitionError::StaleFrame(image_path.to_path_buf()));
            }
        }
        Ok(())
    }
}

/// Frames are refreshed by something outside the agent; only check that one exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistingFile;

#[async_trait]
impl FrameSource for ExistingFile {
    async fn acquire(&self, image_path: &Path) -> Result<(), AcquisitionError> {
        match tokio::fs::metadata(image_path).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            _ => Err(AcquisitionError::MissingFrame(image_path.to_path_buf())),
        }
    }
}
