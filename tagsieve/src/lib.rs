// tagsieve/src/lib.rs
//! # tagsieve CLI Application
//!
//! Terminal front end for `tagsieve-core`: reads markup from a file or stdin,
//! cleans it against the embedded or a user-supplied policy, and reports what
//! was changed.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
