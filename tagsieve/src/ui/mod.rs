// tagsieve/src/ui/mod.rs
//! Terminal presentation: themes, message styling, diffs and summaries.

pub mod diagnostics_summary;
pub mod diff_viewer;
pub mod output_format;
pub mod theme;
