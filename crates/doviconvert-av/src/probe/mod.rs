//! Media file probing module.
//!
//! Stream metadata comes from the ffprobe CLI; only the fields the
//! conversion trigger needs are modeled.

mod ffprobe;
mod types;

pub use ffprobe::{parse_streams, probe_streams};
pub use types::*;
