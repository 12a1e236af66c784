pub mod client;
pub mod dto;
pub mod services;
pub mod session;

pub use dto::{ImageFile, UploadOutcome};
