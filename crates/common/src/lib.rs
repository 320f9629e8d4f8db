//! Ambient facilities shared by the tunnel crates.

pub mod logging;
