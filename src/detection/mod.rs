//! Per-image analysis: OCR for page text and face detection for matched pages.
//!
//! Both are built on [`crate::pipeline`]; the OCR engine and the face cascade sit
//! behind the [`TextRecognizer`] and [`FaceDetector`] traits so they are loaded
//! once at startup and handed to the readers explicitly.

pub mod preprocessing;
pub mod ocr;
pub mod faces;
pub mod steps;

pub use faces::{CascadeFaceDetector, FaceDetector, FaceFinder, FaceRect, FaceScan};
pub use ocr::{OcrsRecognizer, TextReader, TextRecognizer};
