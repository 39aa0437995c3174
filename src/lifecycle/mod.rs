//! Lifecycle policies for file handlers: when to rotate, how to archive,
//! what to keep

pub mod compression;
pub mod retention;
pub mod rotation;

pub use compression::{Compression, CompressionFormat};
pub use retention::{wildcard_match, RetainedFile, Retention};
pub use rotation::{Rotation, Schedule, TimeRotation};
