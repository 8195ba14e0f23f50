//! Command lines for each conversion step.
//!
//! [`build`] is a pure mapping from a step number and the task's paths to the
//! executable and argument vector the host must run. Output paths are derived
//! from `file_path_out` by replacing its extension, so re-deriving a step with
//! the same inputs always yields the same command.

use std::fmt;
use std::path::{Path, PathBuf};

use doviconvert_common::paths::{path_arg, substitute_extension};
use doviconvert_common::{Error, Result};
use doviconvert_tools::ToolPaths;
use serde::{Deserialize, Serialize};

/// Number of the last step of the pipeline.
pub const FINAL_STEP: u32 = 4;

/// An external command to execute: executable plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub executable: String,
    pub arguments: Vec<String>,
}

impl CommandSpec {
    fn new(executable: &Path, arguments: Vec<String>) -> Self {
        Self {
            executable: path_arg(executable),
            arguments,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.executable))?;
        for arg in &self.arguments {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

/// The steps of the profile 7 to 8.1 pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Demux the video into a raw Annex-B HEVC elementary stream.
    ExtractHevc,
    /// Convert to profile 8.1, discarding the enhancement layer.
    ConvertLayers,
    /// Wrap the converted stream in an MP4 tagged as profile 8.1.
    MuxMp4,
    /// Take video from the mux and every other stream from the source.
    RemuxOriginal,
}

impl Step {
    pub const ALL: [Step; FINAL_STEP as usize] = [
        Step::ExtractHevc,
        Step::ConvertLayers,
        Step::MuxMp4,
        Step::RemuxOriginal,
    ];

    pub fn from_number(step: u32) -> Result<Self> {
        match step {
            1 => Ok(Step::ExtractHevc),
            2 => Ok(Step::ConvertLayers),
            3 => Ok(Step::MuxMp4),
            4 => Ok(Step::RemuxOriginal),
            _ => Err(Error::InvalidStep {
                step,
                final_step: FINAL_STEP,
            }),
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Step::ExtractHevc => 1,
            Step::ConvertLayers => 2,
            Step::MuxMp4 => 3,
            Step::RemuxOriginal => 4,
        }
    }

    /// Extension of the file this step writes.
    pub fn output_extension(self) -> &'static str {
        match self {
            Step::ExtractHevc | Step::ConvertLayers => "hevc",
            Step::MuxMp4 | Step::RemuxOriginal => "mp4",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::ExtractHevc => "extract HEVC elementary stream",
            Step::ConvertLayers => "convert to profile 8.1",
            Step::MuxMp4 => "mux into MP4",
            Step::RemuxOriginal => "remux with original audio and subtitles",
        }
    }

    /// Path this step writes, derived from the task's output path.
    pub fn output_path(self, file_path_out: &Path) -> PathBuf {
        substitute_extension(file_path_out, self.output_extension())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.description())
    }
}

/// Build the command for `step`.
///
/// Fails with [`Error::InvalidStep`] for step 0 or anything past
/// [`FINAL_STEP`].
pub fn build(
    step: u32,
    file_path_in: &Path,
    file_path_out: &Path,
    original_file_path: &Path,
    tools: &ToolPaths,
) -> Result<CommandSpec> {
    let step = Step::from_number(step)?;
    let input = path_arg(file_path_in);
    let output = path_arg(&step.output_path(file_path_out));

    let command = match step {
        Step::ExtractHevc => CommandSpec::new(
            &tools.ffmpeg,
            args(&[
                "-y",
                "-i",
                &input,
                "-dn",
                "-c:v",
                "copy",
                "-vbsf",
                "hevc_mp4toannexb",
                "-f",
                "hevc",
                &output,
            ]),
        ),
        Step::ConvertLayers => CommandSpec::new(
            &tools.dovi_tool,
            args(&["-i", &input, "-m", "2", "convert", "--discard", "-o", &output]),
        ),
        Step::MuxMp4 => CommandSpec::new(
            &tools.mp4box,
            args(&[
                "-add",
                &format!("{}:dvp=8.1:xps_inband:hdr=none", input),
                "-brand",
                "mp42isom",
                "-ab",
                "dby1",
                "-no-iod",
                "-enable",
                "1",
                &output,
            ]),
        ),
        Step::RemuxOriginal => CommandSpec::new(
            &tools.ffmpeg,
            args(&[
                "-i",
                &input,
                "-i",
                &path_arg(original_file_path),
                "-map",
                "0:v",
                "-map",
                "1",
                "-map",
                "-1:v",
                "-c",
                "copy",
                &output,
            ]),
        ),
    };

    Ok(command)
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolPaths {
        ToolPaths {
            ffmpeg: PathBuf::from("/opt/bin/ffmpeg"),
            dovi_tool: PathBuf::from("/cache/bin/linux/dovi_tool"),
            mp4box: PathBuf::from("/usr/bin/MP4Box"),
        }
    }

    fn build_step(step: u32, input: &str, output: &str) -> Result<CommandSpec> {
        build(
            step,
            Path::new(input),
            Path::new(output),
            Path::new("/media/movie.mkv"),
            &tools(),
        )
    }

    #[test]
    fn step_one_extracts_annexb_stream() {
        let cmd = build_step(1, "/media/movie.mkv", "/work/movie.mkv").unwrap();
        assert_eq!(cmd.executable, "/opt/bin/ffmpeg");
        assert_eq!(
            cmd.arguments,
            vec![
                "-y",
                "-i",
                "/media/movie.mkv",
                "-dn",
                "-c:v",
                "copy",
                "-vbsf",
                "hevc_mp4toannexb",
                "-f",
                "hevc",
                "/work/movie.hevc"
            ]
        );
    }

    #[test]
    fn step_two_discards_enhancement_layer() {
        let cmd = build_step(2, "/work/movie.hevc", "/work/movie.hevc").unwrap();
        assert_eq!(cmd.executable, "/cache/bin/linux/dovi_tool");
        assert_eq!(
            cmd.arguments,
            vec![
                "-i",
                "/work/movie.hevc",
                "-m",
                "2",
                "convert",
                "--discard",
                "-o",
                "/work/movie.hevc"
            ]
        );
    }

    #[test]
    fn step_three_tags_profile_8_1() {
        let cmd = build_step(3, "/work/movie.step2.hevc", "/work/movie.step2.hevc").unwrap();
        assert_eq!(cmd.executable, "/usr/bin/MP4Box");
        assert_eq!(
            cmd.arguments,
            vec![
                "-add",
                "/work/movie.step2.hevc:dvp=8.1:xps_inband:hdr=none",
                "-brand",
                "mp42isom",
                "-ab",
                "dby1",
                "-no-iod",
                "-enable",
                "1",
                "/work/movie.step2.mp4"
            ]
        );
    }

    #[test]
    fn step_four_remuxes_with_original() {
        let cmd = build_step(4, "/work/movie.mp4", "/work/movie.mp4").unwrap();
        assert_eq!(cmd.executable, "/opt/bin/ffmpeg");
        assert_eq!(
            cmd.arguments,
            vec![
                "-i",
                "/work/movie.mp4",
                "-i",
                "/media/movie.mkv",
                "-map",
                "0:v",
                "-map",
                "1",
                "-map",
                "-1:v",
                "-c",
                "copy",
                "/work/movie.mp4"
            ]
        );
    }

    #[test]
    fn extension_is_substituted_not_appended() {
        let cmd = build_step(1, "/media/movie.mkv", "/work/movie.hevc").unwrap();
        assert_eq!(cmd.arguments.last().unwrap(), "/work/movie.hevc");

        let cmd = build_step(3, "/work/movie.hevc", "/work/movie.mp4").unwrap();
        assert_eq!(cmd.arguments.last().unwrap(), "/work/movie.mp4");
    }

    #[test]
    fn build_is_deterministic() {
        for step in 1..=FINAL_STEP {
            let a = build_step(step, "/media/a b.mkv", "/work/a b.mkv").unwrap();
            let b = build_step(step, "/media/a b.mkv", "/work/a b.mkv").unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn out_of_range_steps_are_rejected() {
        for step in [0, FINAL_STEP + 1, 99] {
            let err = build_step(step, "/a.mkv", "/b.mkv").unwrap_err();
            assert!(matches!(err, Error::InvalidStep { step: s, final_step: 4 } if s == step));
        }
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let cmd = build_step(2, "/media/My Movie.hevc", "/work/out.hevc").unwrap();
        assert_eq!(
            cmd.to_string(),
            "/cache/bin/linux/dovi_tool -i \"/media/My Movie.hevc\" -m 2 convert --discard -o /work/out.hevc"
        );
    }

    #[test]
    fn step_numbers_round_trip() {
        for step in Step::ALL {
            assert_eq!(Step::from_number(step.number()).unwrap(), step);
        }
        assert_eq!(Step::ALL.len() as u32, FINAL_STEP);
    }
}
