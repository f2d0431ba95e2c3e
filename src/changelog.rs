//! Changelog entries: rendering, merging and the on-disk document.
pub mod document;
pub mod entry;
pub mod merge;
pub mod render;

pub use document::Changelog;
pub use entry::{ChangelogEntry, ChangelogLine, ChangelogSection, Contributor};
pub use merge::merge;
pub use render::{Renderer, SectionFilter};
