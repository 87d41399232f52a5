//! Upload a food photo, ask Gemini for a calorie breakdown, show the answer.

pub mod config;
pub mod error;
pub mod gemini;
pub mod pipeline;
pub mod prompt;
pub mod upload;
pub mod web;

pub use error::{Error, ServiceError};
pub use gemini::{GeminiClient, GenerateContentRequest, Generator};
pub use pipeline::{estimate_calories, ModelResponse};
pub use upload::{acquire, ImagePart, UploadedImage};
