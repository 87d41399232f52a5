use image::ImageFormat;

use crate::error::Error;

/// MIME types the upload form accepts (jpg, jpeg and png files).
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// Raw bytes of a submitted file together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Inline image payload for the generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl UploadedImage {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Checks the declared type against the form's filter and sniffs the
    /// bytes, so that a renamed text file never reaches the service.
    pub fn ensure_supported(&self) -> Result<(), Error> {
        let declared = self.mime_type.to_ascii_lowercase();
        if !ACCEPTED_MIME_TYPES.contains(&declared.as_str()) {
            return Err(Error::UnsupportedImage(format!(
                "content type {} is not jpg or png",
                self.mime_type
            )));
        }

        match image::guess_format(&self.bytes) {
            Ok(ImageFormat::Jpeg) | Ok(ImageFormat::Png) => Ok(()),
            Ok(other) => Err(Error::UnsupportedImage(format!(
                "file content is {other:?}, expected jpg or png"
            ))),
            Err(_) => Err(Error::UnsupportedImage(
                "file content is not a recognizable image".to_string(),
            )),
        }
    }
}

/// Turns an upload into the one-element image payload the generation call
/// expects. Without an upload there is nothing to send.
pub fn acquire(upload: Option<UploadedImage>) -> Result<[ImagePart; 1], Error> {
    let upload = upload.ok_or(Error::MissingInput)?;
    Ok([ImagePart {
        mime_type: upload.mime_type,
        data: upload.bytes,
    }])
}
