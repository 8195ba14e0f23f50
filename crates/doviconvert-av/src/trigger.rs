//! Decides whether a probed file is enrolled for conversion.

use std::path::Path;

use doviconvert_common::paths::is_video_file;
use doviconvert_common::Result;

use crate::probe::{probe_streams, SideData, StreamMetadata};

/// ffprobe side-data type marking a Dolby Vision configuration record.
pub const DOVI_CONFIGURATION_RECORD: &str = "DOVI configuration record";

fn is_dovi_record(record: &SideData) -> bool {
    record.side_data_type.as_deref() == Some(DOVI_CONFIGURATION_RECORD)
}

/// True if any stream carries a Dolby Vision configuration record.
pub fn needs_conversion(streams: &[StreamMetadata]) -> bool {
    streams
        .iter()
        .flat_map(|s| s.side_data_list.iter())
        .any(is_dovi_record)
}

/// Profile number of the first Dolby Vision configuration record, if any.
pub fn dovi_profile(streams: &[StreamMetadata]) -> Option<u8> {
    streams
        .iter()
        .flat_map(|s| s.side_data_list.iter())
        .filter(|r| is_dovi_record(r))
        .find_map(|r| r.dv_profile)
}

/// Probe `file` and decide whether it needs conversion.
///
/// Non-video files are rejected by extension without probing.
pub fn needs_conversion_file(ffprobe: &Path, file: &Path) -> Result<bool> {
    if !is_video_file(file) {
        tracing::info!("File is not a video file: {}", file.display());
        return Ok(false);
    }

    let streams = probe_streams(ffprobe, file)?;
    let enroll = needs_conversion(&streams);
    if enroll {
        tracing::info!(
            profile = ?dovi_profile(&streams),
            "File has DOVI metadata: {}",
            file.display()
        );
    }
    Ok(enroll)
}
