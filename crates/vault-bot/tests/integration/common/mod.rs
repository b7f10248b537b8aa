//! Helpers shared by several test binaries.
#![allow(dead_code)]

pub mod log_lines;
