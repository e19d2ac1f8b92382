//! The three request operations. Each one validates its reference locally before
//! touching the network, so an invalid input never produces a request.

pub mod discovery;
pub mod export;
pub mod preview;

pub use discovery::{discover, Discovery, Selection};
pub use export::{
    derive_filename, export_file, filename_from_disposition, persist, DownloadedArtifact,
    SavedArtifact,
};
pub use preview::preview;
