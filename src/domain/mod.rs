//! Domain logic - pure version rules independent of git, feeds and processes

pub mod minver;
pub mod nightly;
pub mod pack_version;
pub mod supersession;
pub mod tag;
pub mod version;

pub use minver::{MinVerSettings, TaggedVersion};
pub use nightly::is_nightly;
pub use pack_version::PackVersion;
pub use supersession::{CandidateNightly, KnownVersionSet, VersionRecord};
pub use tag::Tag;
pub use version::Version;
