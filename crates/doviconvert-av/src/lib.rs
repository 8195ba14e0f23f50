//! # doviconvert-av
//!
//! Dolby Vision profile 7 to 8.1 conversion planning.
//!
//! This crate provides:
//! - Stream probing through ffprobe and the enrollment predicate
//! - The command line for each of the four conversion steps
//! - A step orchestrator that advances host-owned task state
//!
//! Nothing here spawns the conversion tools; the host runs each returned
//! [`CommandSpec`] and calls back while [`TaskState::repeat`] is set.
//!
//! ## Example
//!
//! ```
//! use doviconvert_av::{advance_with, TaskState};
//! use doviconvert_tools::ToolPaths;
//!
//! let tools = ToolPaths {
//!     ffmpeg: "ffmpeg".into(),
//!     dovi_tool: "dovi_tool".into(),
//!     mp4box: "MP4Box".into(),
//! };
//!
//! let mut state = TaskState::new("/media/movie.mkv", "/work/movie.mkv");
//! loop {
//!     let (next, command) = advance_with(state, &tools)?;
//!     println!("{}", command);
//!     state = next;
//!     if !state.repeat {
//!         break;
//!     }
//! }
//! assert_eq!(state.step, 4);
//! # Ok::<(), doviconvert_common::Error>(())
//! ```

pub mod command;
pub mod orchestrator;
pub mod probe;
pub mod trigger;

pub use command::{build, CommandSpec, Step, FINAL_STEP};
pub use orchestrator::{advance_with, StepOrchestrator, TaskState};
pub use probe::{parse_streams, probe_streams, SideData, StreamMetadata};
pub use trigger::{dovi_profile, needs_conversion, needs_conversion_file, DOVI_CONFIGURATION_RECORD};
