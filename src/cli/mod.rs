//! Terminal rendering shared by the binaries

pub mod display;

pub use display::Display;
