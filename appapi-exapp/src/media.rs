//! Video to GIF conversion
//!
//! The ExApp does not decode video itself. [`FfmpegConverter`] hands the bytes
//! to an external `ffmpeg` through scratch files and reads the GIF back.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Frames kept in the output animation
const MAX_FRAMES: u32 = 60;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Converter exited with {status}: {stderr}")]
    ConverterFailed { status: String, stderr: String },

    #[error("Converter produced no output")]
    EmptyOutput,
}

#[async_trait]
pub trait MediaConverter: Send + Sync {
    /// Convert a complete video file into GIF bytes
    async fn convert(&self, input: Vec<u8>) -> Result<Vec<u8>, MediaError>;
}

/// Shells out to `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    program: PathBuf,
    width: u32,
    fps: u32,
}

impl FfmpegConverter {
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            width: 480,
            fps: 10,
        }
    }

    fn filter(&self) -> String {
        format!("fps={},scale={}:-1:flags=lanczos", self.fps, self.width)
    }
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaConverter for FfmpegConverter {
    async fn convert(&self, input: Vec<u8>) -> Result<Vec<u8>, MediaError> {
        let source = tempfile::Builder::new().prefix("appapi-in-").tempfile()?;
        let target = tempfile::Builder::new()
            .prefix("appapi-out-")
            .suffix(".gif")
            .tempfile()?;
        tokio::fs::write(source.path(), &input).await?;

        debug!(
            program = %self.program.display(),
            input_bytes = input.len(),
            "Running converter"
        );

        let output = Command::new(&self.program)
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(source.path())
            .arg("-vf")
            .arg(self.filter())
            .arg("-frames:v")
            .arg(MAX_FRAMES.to_string())
            .arg(target.path())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ConverterFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let gif = tokio::fs::read(target.path()).await?;
        if gif.is_empty() {
            return Err(MediaError::EmptyOutput);
        }
        Ok(gif)
    }
}
