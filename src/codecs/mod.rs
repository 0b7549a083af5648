// src/codecs/mod.rs
//
// Hand-built codecs with no library shortcut.

pub mod data_url;
pub mod ico;
