//! HTML form and JSON endpoint in front of the calorie pipeline.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::error::Error;
use crate::gemini::Generator;
use crate::pipeline::{estimate_calories, ModelResponse};
use crate::upload::UploadedImage;

/// Name of the multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub text: String,
    pub model: String,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router<G: Generator + 'static>(generator: Arc<G>) -> Router {
    Router::new()
        .route("/", get(index).post(submit::<G>))
        .route("/api/analyze", post(analyze::<G>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(generator)
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::MissingInput | Error::Multipart(_) => StatusCode::BAD_REQUEST,
        Error::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        Error::UnsupportedImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Error::Service(_) => StatusCode::BAD_GATEWAY,
    }
}

fn form_error(error: MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::TooLarge(format!("{} bytes", MAX_UPLOAD_BYTES))
    } else {
        Error::Multipart(error.body_text())
    }
}

/// Pulls the image field out of the form. An empty file field is what a
/// browser sends when nothing was picked, so it counts as no upload.
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedImage>, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(form_error)?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let no_file_name = field.file_name().map_or(true, str::is_empty);
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(form_error)?;

        if bytes.is_empty() && no_file_name {
            return Ok(None);
        }
        return Ok(Some(UploadedImage::new(mime_type, bytes.to_vec())));
    }
    Ok(None)
}

async fn run<G: Generator>(
    generator: &G,
    upload: Option<UploadedImage>,
) -> Result<ModelResponse, Error> {
    if let Some(upload) = &upload {
        upload.ensure_supported()?;
    }
    estimate_calories(generator, upload).await
}

async fn index() -> Html<String> {
    Html(render_page(None, None))
}

async fn submit<G: Generator>(State(generator): State<Arc<G>>, multipart: Multipart) -> Response {
    let outcome = match read_upload(multipart).await {
        Ok(upload) => {
            let preview = upload.as_ref().map(preview_src);
            run(generator.as_ref(), upload)
                .await
                .map(|response| (preview, response))
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok((preview, response)) => {
            Html(render_page(preview.as_deref(), Some(Ok(response.text.as_str())))).into_response()
        }
        Err(e) => {
            warn!("submission failed: {e}");
            let page = render_page(None, Some(Err(e.to_string().as_str())));
            (status_for(&e), Html(page)).into_response()
        }
    }
}

async fn analyze<G: Generator>(State(generator): State<Arc<G>>, multipart: Multipart) -> Response {
    let start = Instant::now();
    let result = match read_upload(multipart).await {
        Ok(upload) => run(generator.as_ref(), upload).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Json(AnalyzeResponse {
            text: response.text,
            model: generator.model().to_string(),
            processing_time_ms: start.elapsed().as_millis(),
        })
        .into_response(),
        Err(e) => {
            warn!("analyze request failed: {e}");
            let body = ErrorResponse {
                error: e.to_string(),
            };
            (status_for(&e), Json(body)).into_response()
        }
    }
}

fn preview_src(upload: &UploadedImage) -> String {
    format!(
        "data:{};base64,{}",
        upload.mime_type,
        general_purpose::STANDARD.encode(&upload.bytes)
    )
}

fn render_page(preview: Option<&str>, outcome: Option<Result<&str, &str>>) -> String {
    let preview = preview
        .map(|src| {
            format!(
                r#"<figure><img class="preview" src="{}" alt="Uploaded image"><figcaption>Uploaded Image.</figcaption></figure>"#,
                escaper::encode_minimal(src)
            )
        })
        .unwrap_or_default();

    let outcome = match outcome {
        Some(Ok(text)) => format!(
            r#"<h2>The Response is</h2><div class="response">{}</div>"#,
            escaper::encode_minimal(text)
        ),
        Some(Err(message)) => format!(
            r#"<div class="error">Error: {}</div>"#,
            escaper::encode_minimal(message)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Gemini Health App</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f5f7f2;
            margin: 0;
            padding: 20px;
        }}
        .container {{
            background: white;
            border-radius: 16px;
            box-shadow: 0 10px 30px rgba(0,0,0,0.1);
            max-width: 760px;
            margin: 0 auto;
            padding: 32px;
        }}
        h1 {{ color: #2f4f2f; }}
        form {{ display: flex; flex-direction: column; gap: 16px; }}
        button {{
            background: #3c8d40;
            color: white;
            border: none;
            border-radius: 8px;
            padding: 12px;
            font-size: 1em;
            cursor: pointer;
        }}
        .preview {{ max-width: 100%; border-radius: 10px; }}
        figcaption {{ color: #777; font-size: 0.85em; text-align: center; }}
        .response {{ white-space: pre-wrap; line-height: 1.6; }}
        .error {{
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Gemini Health App</h1>
        <form method="post" action="/" enctype="multipart/form-data">
            <label for="image">Choose an image...</label>
            <input type="file" id="image" name="{IMAGE_FIELD}" accept=".jpg,.jpeg,.png,image/jpeg,image/png">
            <button type="submit">Tell me the total calories</button>
        </form>
        {preview}
        {outcome}
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::error::ServiceError;
    use crate::pipeline::tests::RecordingGenerator;

    const BOUNDARY: &str = "calorie-lens-boundary";
    const JPEG_BLOB: [u8; 10] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn multipart_body(name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn index_shows_the_form() {
        let app = router(Arc::new(RecordingGenerator::default()));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_string(response).await;
        assert!(page.contains("<h1>Gemini Health App</h1>"));
        assert!(page.contains("Tell me the total calories"));
        assert!(page.contains(r#"name="image""#));
        assert!(!page.contains("The Response is"));
    }

    #[tokio::test]
    async fn submit_renders_the_reply() {
        let generator = Arc::new(RecordingGenerator::replying([Ok(
            "1. Apple - 95 calories".to_string()
        )]));
        let app = router(generator.clone());
        let body = multipart_body("image", "apple.jpg", "image/jpeg", &JPEG_BLOB);

        let response = app.oneshot(post("/", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_string(response).await;
        assert!(page.contains("The Response is"));
        assert!(page.contains("1. Apple - 95 calories"));
        assert!(page.contains("Uploaded Image."));
        assert!(page.contains("data:image/jpeg;base64,"));
        assert_eq!(generator.requests().len(), 1);
    }

    #[tokio::test]
    async fn reply_markup_is_escaped_on_the_page() {
        let generator = Arc::new(RecordingGenerator::replying([Ok(
            "<script>alert(1)</script>".to_string()
        )]));
        let app = router(generator);
        let body = multipart_body("image", "apple.jpg", "image/jpeg", &JPEG_BLOB);

        let page = body_string(app.oneshot(post("/", body)).await.unwrap()).await;
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn empty_file_field_is_missing_input() {
        let generator = Arc::new(RecordingGenerator::replying([Ok("unused".to_string())]));
        let app = router(generator.clone());
        let body = multipart_body("image", "", "application/octet-stream", &[]);

        let response = app.oneshot(post("/", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("no file uploaded"));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn form_without_image_field_is_missing_input() {
        let generator = Arc::new(RecordingGenerator::default());
        let app = router(generator.clone());
        let body = multipart_body("other", "apple.jpg", "image/jpeg", &JPEG_BLOB);

        let response = app.oneshot(post("/", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_before_the_call() {
        let generator = Arc::new(RecordingGenerator::replying([Ok("unused".to_string())]));
        let app = router(generator.clone());
        let body = multipart_body("image", "cat.gif", "image/gif", b"GIF89a\x01\x00\x01\x00");

        let response = app.oneshot(post("/", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let generator = Arc::new(RecordingGenerator::replying([Ok("unused".to_string())]));
        let app = router(generator.clone());
        let mut photo = JPEG_BLOB.to_vec();
        photo.resize(MAX_UPLOAD_BYTES + 1024 * 1024, 0);
        let body = multipart_body("image", "huge.jpg", "image/jpeg", &photo);

        let response = app.oneshot(post("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let parsed: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(parsed.error.contains("size limit"));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn analyze_returns_text_verbatim() {
        let reply = "1. Apple - 95 calories\n\nHealthy: yes ".to_string();
        let generator = Arc::new(RecordingGenerator::replying([Ok(reply.clone())]));
        let app = router(generator);
        let body = multipart_body("image", "apple.jpg", "image/jpeg", &JPEG_BLOB);

        let response = app.oneshot(post("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let parsed: AnalyzeResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(parsed.text, reply);
        assert_eq!(parsed.model, "recording");
    }

    #[tokio::test]
    async fn analyze_reports_service_failure() {
        let generator = Arc::new(RecordingGenerator::replying([Err(
            ServiceError::EmptyResponse,
        )]));
        let app = router(generator.clone());
        let body = multipart_body("image", "apple.jpg", "image/jpeg", &JPEG_BLOB);

        let response = app.oneshot(post("/api/analyze", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let parsed: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(parsed.error.contains("no text"));
        assert_eq!(generator.requests().len(), 1);
    }
}
