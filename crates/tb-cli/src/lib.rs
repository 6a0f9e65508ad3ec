//! toxicblend CLI library
//!
//! Exports the command implementations and the OBJ file bridge so the
//! binary and its tests share them.

pub mod commands;
pub mod obj;
pub mod output;
