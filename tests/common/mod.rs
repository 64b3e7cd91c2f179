mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from facesheet for tests
pub use facesheet::detection::{FaceRect, TextReader};
