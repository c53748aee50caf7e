pub mod capture;
pub mod clip;

pub use capture::{CaptureError, ClipSource, CpalClipSource};
pub use clip::{AudioClip, ClipSpec};
