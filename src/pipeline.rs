use tracing::info;

use crate::error::Error;
use crate::gemini::{GenerateContentRequest, Generator};
use crate::prompt::CALORIE_PROMPT;
use crate::upload::{acquire, UploadedImage};

/// Generated text for one submission, exactly as the service returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
}

/// Runs one submission end to end: acquire the upload, package it with the
/// calorie prompt and ask the generator. Nothing is sent without an upload.
pub async fn estimate_calories<G: Generator>(
    generator: &G,
    upload: Option<UploadedImage>,
) -> Result<ModelResponse, Error> {
    let image = acquire(upload)?;
    info!(
        mime_type = %image[0].mime_type,
        bytes = image[0].data.len(),
        "estimating calories"
    );

    let request = GenerateContentRequest::package(CALORIE_PROMPT, image);
    let text = generator.generate(&request).await?;
    Ok(ModelResponse { text })
}
