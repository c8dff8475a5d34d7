//! `POST /send-message` request parsing.
//!
//! Three encodings are accepted:
//!
//! - `multipart/form-data`: a `message` field, one `numbers` (or `numbers[]`,
//!   `numbers[N]`) field per recipient or a single field holding a JSON array, and an
//!   optional `file` part.
//! - `application/x-www-form-urlencoded`: `message=...&numbers[]=...`, with
//!   the same key rules as multipart (text only).
//! - `application/json`: `{"message": "...", "numbers": ["..."]}` (text only).
//!
//! Shape problems surface as [`ApiError::InvalidInput`]; whether the values
//! make a valid campaign is decided by [`SendForm::into_campaign_input`].

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::{Form, Json};
use axum::http::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::errors::ApiError;

/// An uploaded attachment held in memory until it is stored.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: Option<String>,
    /// Client-declared content type.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

/// Parsed `POST /send-message` body.
#[derive(Clone, Debug, Default)]
pub struct SendForm {
    /// Message text.
    pub message: Option<String>,
    /// Raw recipient identifiers.
    pub numbers: Option<Vec<String>>,
    /// Optional attachment.
    pub file: Option<UploadedFile>,
}

#[derive(Deserialize)]
struct JsonSendRequest {
    message: Option<String>,
    numbers: Option<Vec<String>>,
}

impl SendForm {
    /// Require a non-empty message and a non-empty recipient list.
    pub fn into_campaign_input(self) -> Result<(String, Vec<String>, Option<UploadedFile>), ApiError> {
        match (self.message, self.numbers) {
            (Some(message), Some(numbers)) if !message.trim().is_empty() && !numbers.is_empty() => {
                Ok((message, numbers, self.file))
            }
            _ => Err(ApiError::InvalidInput),
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!(error = %e, "malformed multipart body");
            ApiError::InvalidInput
        })? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "message" => {
                    form.message = Some(field.text().await.map_err(|_| ApiError::InvalidInput)?);
                }
                key if is_numbers_key(key) => {
                    let value = field.text().await.map_err(|_| ApiError::InvalidInput)?;
                    let numbers = form.numbers.get_or_insert_with(Vec::new);
                    numbers.extend(split_numbers_field(&value)?);
                }
                "file" => {
                    let file_name = field.file_name().map(ToOwned::to_owned);
                    let content_type = field.content_type().map(ToOwned::to_owned);
                    let bytes = field.bytes().await.map_err(|_| ApiError::InvalidInput)?;
                    // Browsers submit an empty, unnamed part when no file is picked.
                    if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                        continue;
                    }
                    form.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                other => debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut form = Self::default();
        for (key, value) in pairs {
            if key == "message" {
                form.message = Some(value);
            } else if is_numbers_key(&key) {
                let numbers = form.numbers.get_or_insert_with(Vec::new);
                numbers.extend(split_numbers_field(&value)?);
            } else {
                debug!(field = %key, "ignoring unknown form field");
            }
        }
        Ok(form)
    }
}

/// `numbers`, `numbers[]` and indexed `numbers[3]` all name the recipient list.
fn is_numbers_key(key: &str) -> bool {
    key == "numbers" || (key.starts_with("numbers[") && key.ends_with(']'))
}

/// A `numbers` field is either one recipient or a JSON array of recipients.
fn split_numbers_field(value: &str) -> Result<Vec<String>, ApiError> {
    if value.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<String>>(value).map_err(|_| ApiError::InvalidInput)
    } else {
        Ok(vec![value.to_owned()])
    }
}

impl<S> FromRequest<S> for SendForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|_| ApiError::InvalidInput)?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| {
                    debug!(error = %e, "rejected urlencoded body");
                    ApiError::InvalidInput
                })?;
            return Self::from_pairs(pairs);
        }

        let Json(body) = Json::<JsonSendRequest>::from_request(req, state)
            .await
            .map_err(|e| {
                debug!(error = %e, "rejected JSON body");
                ApiError::InvalidInput
            })?;
        Ok(Self {
            message: body.message,
            numbers: body.numbers,
            file: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request {
        let mut body = String::new();
        for (name, file_name, value) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        HttpRequest::builder()
            .method("POST")
            .uri("/send-message")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/send-message")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn multipart_repeated_numbers() {
        let req = multipart_request(&[
            ("message", None, "hi"),
            ("numbers", None, "3001234567"),
            ("numbers", None, "573009876543"),
        ]);
        let form = SendForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.message.as_deref(), Some("hi"));
        assert_eq!(
            form.numbers.unwrap(),
            vec!["3001234567", "573009876543"]
        );
        assert!(form.file.is_none());
    }

    #[tokio::test]
    async fn multipart_bracket_names_and_json_array() {
        let req = multipart_request(&[
            ("message", None, "hi"),
            ("numbers[]", None, "1"),
            ("numbers", None, r#"["2", "3"]"#),
        ]);
        let form = SendForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.numbers.unwrap(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn multipart_with_file() {
        let req = multipart_request(&[
            ("message", None, "caption"),
            ("numbers", None, "1"),
            ("file", Some("cat.png"), "PNGDATA"),
        ]);
        let form = SendForm::from_request(req, &()).await.unwrap();
        let file = form.file.unwrap();
        assert_eq!(file.file_name.as_deref(), Some("cat.png"));
        assert_eq!(file.content_type.as_deref(), Some("image/png"));
        assert_eq!(&file.bytes[..], b"PNGDATA");
    }

    #[tokio::test]
    async fn malformed_json_array_field_rejected() {
        let req = multipart_request(&[("message", None, "hi"), ("numbers", None, "[1, 2")]);
        assert!(matches!(
            SendForm::from_request(req, &()).await,
            Err(ApiError::InvalidInput)
        ));
    }

    fn urlencoded_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/send-message")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn urlencoded_repeated_numbers() {
        let req = urlencoded_request(
            "message=hola+mundo&numbers%5B%5D=3001234567&numbers[]=573009876543&numbers=1&numbers[3]=2",
        );
        let form = SendForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.message.as_deref(), Some("hola mundo"));
        assert_eq!(
            form.numbers.unwrap(),
            vec!["3001234567", "573009876543", "1", "2"]
        );
        assert!(form.file.is_none());
    }

    #[tokio::test]
    async fn urlencoded_without_numbers_fails_validation() {
        let req = urlencoded_request("message=hi&other=x");
        let form = SendForm::from_request(req, &()).await.unwrap();
        assert!(form.numbers.is_none());
        assert!(matches!(form.into_campaign_input(), Err(ApiError::InvalidInput)));
    }

    #[test]
    fn numbers_key_forms() {
        for key in ["numbers", "numbers[]", "numbers[0]"] {
            assert!(is_numbers_key(key), "{key}");
        }
        for key in ["number", "numbers[", "xnumbers", "message"] {
            assert!(!is_numbers_key(key), "{key}");
        }
    }

    #[tokio::test]
    async fn json_body() {
        let req = json_request(r#"{"message": "hi", "numbers": ["1", "2"]}"#);
        let form = SendForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.message.as_deref(), Some("hi"));
        assert_eq!(form.numbers.unwrap(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn json_numbers_must_be_array() {
        let req = json_request(r#"{"message": "hi", "numbers": "1"}"#);
        assert!(matches!(
            SendForm::from_request(req, &()).await,
            Err(ApiError::InvalidInput)
        ));
    }

    #[tokio::test]
    async fn missing_content_type_rejected() {
        let req = HttpRequest::builder()
            .method("POST")
            .uri("/send-message")
            .body(Body::from("message=hi"))
            .unwrap();
        assert!(matches!(
            SendForm::from_request(req, &()).await,
            Err(ApiError::InvalidInput)
        ));
    }

    #[test]
    fn campaign_input_requires_message_and_numbers() {
        let ok = SendForm {
            message: Some("hi".into()),
            numbers: Some(vec!["1".into()]),
            file: None,
        };
        assert!(ok.into_campaign_input().is_ok());

        for form in [
            SendForm::default(),
            SendForm {
                message: Some(String::new()),
                numbers: Some(vec!["1".into()]),
                file: None,
            },
            SendForm {
                message: Some("hi".into()),
                numbers: Some(Vec::new()),
                file: None,
            },
            SendForm {
                message: Some("hi".into()),
                numbers: None,
                file: None,
            },
        ] {
            assert!(matches!(form.into_campaign_input(), Err(ApiError::InvalidInput)));
        }
    }
}
