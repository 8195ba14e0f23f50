//! doviconvert - Dolby Vision profile 7 to 8.1 conversion
//!
//! This library crate exposes the host side of the conversion for the binary
//! and for integration testing.

pub mod command;
pub mod config;
pub mod host;
