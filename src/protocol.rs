//! Server response contracts.
//!
//! | Status | Content-Type | Body | Result |
//! |--------|--------------|------|--------|
//! | 200 | `image/png` | raw PNG | [`RenderRequest::Image`] |
//! | 200 | anything else | `{"image": {"content_type": "image/png", "data": "<base64>"}}` | [`RenderRequest::Image`] |
//! | 200 | anything else | `{"message": "line one\nline two"}` | [`RenderRequest::Text`] |
//! | 200 | anything else | any other JSON object | [`Dispatch::Empty`] |
//! | other | - | ignored | [`Dispatch::Status`] |
//!
//! An `image` whose content type is not PNG falls through to `message`.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::image::decode_base64;
use crate::text::split_lines;
use crate::transport::HttpResponse;

/// Media type of PNG payloads.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// What to draw for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    /// Lines of text, before wrapping
    Text {
        /// Message split on line breaks
        lines: Vec<String>,
    },
    /// Encoded PNG file
    Image {
        /// PNG bytes
        raw_bytes: Vec<u8>,
    },
}

/// Classification of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Something to draw
    Render(RenderRequest),
    /// Non-200 status; shown as an error on the panel
    Status(StatusCode),
    /// Well-formed, but nothing to draw
    Empty,
}

/// JSON body of a 200 response that is not a raw PNG.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPayload {
    /// Embedded image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,

    /// Text to show
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Base64 image embedded in a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Media type, only `image/png` is drawn
    pub content_type: String,
    /// Base64 (standard alphabet) file contents
    pub data: String,
}

impl ServerPayload {
    /// A text message payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            image: None,
            message: Some(message.into()),
        }
    }

    /// A base64 PNG payload.
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            image: Some(ImagePayload {
                content_type: PNG_CONTENT_TYPE.to_string(),
                data: data.into(),
            }),
            message: None,
        }
    }

    /// Pick what to render, preferring a PNG image over the message.
    pub fn into_request(self) -> Result<Option<RenderRequest>, Error> {
        if let Some(image) = self.image.filter(|image| is_png(&image.content_type)) {
            let raw_bytes = decode_base64(&image.data)?;
            return Ok(Some(RenderRequest::Image { raw_bytes }));
        }
        Ok(self.message.map(|message| RenderRequest::Text {
            lines: split_lines(&message),
        }))
    }
}

/// Classify a response.
///
/// Errors are malformed JSON bodies and undecodable base64 payloads.
pub fn dispatch(response: &HttpResponse) -> Result<Dispatch, Error> {
    if response.status != StatusCode::OK {
        return Ok(Dispatch::Status(response.status));
    }

    if response.content_type().is_some_and(is_png) {
        return Ok(Dispatch::Render(RenderRequest::Image {
            raw_bytes: response.body.clone(),
        }));
    }

    let payload: ServerPayload = serde_json::from_slice(&response.body)?;
    Ok(payload
        .into_request()?
        .map_or(Dispatch::Empty, Dispatch::Render))
}

/// Compare a media type with `image/png`, ignoring parameters and case.
pub fn is_png(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PNG_CONTENT_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;

    fn json(body: &str) -> HttpResponse {
        HttpResponse::new(StatusCode::OK)
            .with_content_type("application/json")
            .with_body(body)
    }

    #[test]
    fn test_is_png() {
        assert!(is_png("image/png"));
        assert!(is_png("IMAGE/PNG"));
        assert!(is_png("image/png; charset=binary"));
        assert!(!is_png("image/jpeg"));
        assert!(!is_png("application/json"));
    }

    #[test]
    fn test_raw_png() {
        let response = HttpResponse::new(StatusCode::OK)
            .with_content_type("image/png")
            .with_body(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(
            dispatch(&response).unwrap(),
            Dispatch::Render(RenderRequest::Image {
                raw_bytes: vec![0x89, b'P', b'N', b'G']
            })
        );
    }

    #[test]
    fn test_message() {
        let response = json(r#"{"message": "hello\nworld"}"#);
        assert_eq!(
            dispatch(&response).unwrap(),
            Dispatch::Render(RenderRequest::Text {
                lines: vec!["hello".to_string(), "world".to_string()]
            })
        );
    }

    #[test]
    fn test_base64_image() {
        let response = json(r#"{"image": {"content_type": "image/png", "data": "aGVsbG8="}}"#);
        assert_eq!(
            dispatch(&response).unwrap(),
            Dispatch::Render(RenderRequest::Image {
                raw_bytes: b"hello".to_vec()
            })
        );
    }

    #[test]
    fn test_image_preferred_over_message() {
        let response = json(
            r#"{"image": {"content_type": "image/png", "data": "aGVsbG8="}, "message": "hi"}"#,
        );
        assert!(matches!(
            dispatch(&response).unwrap(),
            Dispatch::Render(RenderRequest::Image { .. })
        ));
    }

    #[test]
    fn test_non_png_image_falls_through_to_message() {
        let response =
            json(r#"{"image": {"content_type": "image/jpeg", "data": "AAAA"}, "message": "hi"}"#);
        assert_eq!(
            dispatch(&response).unwrap(),
            Dispatch::Render(RenderRequest::Text {
                lines: vec!["hi".to_string()]
            })
        );

        let response = json(r#"{"image": {"content_type": "image/jpeg", "data": "AAAA"}}"#);
        assert_eq!(dispatch(&response).unwrap(), Dispatch::Empty);
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(dispatch(&json("{}")).unwrap(), Dispatch::Empty);
    }

    #[test]
    fn test_non_200() {
        let response = HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_content_type("image/png")
            .with_body(vec![1, 2, 3]);
        assert_eq!(
            dispatch(&response).unwrap(),
            Dispatch::Status(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = dispatch(&json("<html>")).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_bad_base64() {
        let response = json(r#"{"image": {"content_type": "image/png", "data": "!!!"}}"#);
        assert!(matches!(
            dispatch(&response).unwrap_err(),
            Error::Image(ImageError::InvalidData(_))
        ));
    }

    #[test]
    fn test_payload_serializes_without_nulls() {
        let body = serde_json::to_string(&ServerPayload::message("hi")).unwrap();
        assert_eq!(body, r#"{"message":"hi"}"#);
    }
}
