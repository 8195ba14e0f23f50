//! FFprobe-based stream probing.

use std::path::Path;
use std::process::Command;

use doviconvert_common::{Error, Result};

use super::types::{ProbeOutput, StreamMetadata};

/// Probe the streams of `file` with the ffprobe binary at `ffprobe`.
pub fn probe_streams(ffprobe: &Path, file: &Path) -> Result<Vec<StreamMetadata>> {
    tracing::debug!("Probing streams of {:?}", file);

    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(file)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffprobe")
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed("ffprobe", stderr.trim().to_string()));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::probe(format!("Invalid UTF-8 from ffprobe: {}", e)))?;

    parse_streams(&json_str)
}

/// Parse the stream list out of ffprobe JSON output.
pub fn parse_streams(json_str: &str) -> Result<Vec<StreamMetadata>> {
    let output: ProbeOutput = serde_json::from_str(json_str)?;
    Ok(output.streams)
}
