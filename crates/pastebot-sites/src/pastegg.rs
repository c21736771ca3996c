//! paste.gg (https://github.com/ascclemens/paste/blob/master/api.md), the default site.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use pastebot_core::destinations::{PasteService, ServiceError};

use crate::{request_error, status_error};

pub const SITE_NAME: &str = "paste.gg";
pub const MAX_SIZE_BYTES: u64 = 1_000_000;

const API_URL: &str = "https://api.paste.gg/v1/pastes";
const PASTE_URL: &str = "https://paste.gg/p/anonymous/";
const EXPIRY_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    expires: String,
    files: Vec<RequestFile<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestFile<'a> {
    name: &'a str,
    content: RequestFileContent<'a>,
}

#[derive(Debug, Serialize)]
struct RequestFileContent<'a> {
    format: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResultStatus {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
struct CreateResult {
    status: ResultStatus,
    result: Option<CreatedPaste>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPaste {
    id: String,
}

fn build_request<'a>(filename: &'a str, contents: &'a str, now: DateTime<Utc>) -> CreateRequest<'a> {
    CreateRequest {
        name: filename,
        expires: (now + Duration::days(EXPIRY_DAYS)).to_rfc3339_opts(SecondsFormat::Millis, true),
        files: vec![RequestFile {
            name: filename,
            content: RequestFileContent {
                format: "text",
                value: contents,
            },
        }],
    }
}

fn parse_result(body: &str) -> Result<String, ServiceError> {
    let result: CreateResult =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    match result.status {
        ResultStatus::Success => result
            .result
            .map(|paste| format!("{PASTE_URL}{}", paste.id))
            .ok_or_else(|| ServiceError::Malformed("success without result".to_string())),
        ResultStatus::Error => Err(ServiceError::Rejected(format!(
            "{} - {}",
            result.error.as_deref().unwrap_or("error"),
            result.message.as_deref().unwrap_or("no message")
        ))),
    }
}

#[derive(Clone, Debug)]
pub struct PasteggService {
    http: reqwest::Client,
}

impl PasteggService {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PasteService for PasteggService {
    async fn create(&self, filename: &str, contents: &str) -> Result<String, ServiceError> {
        let resp = self
            .http
            .post(API_URL)
            .json(&build_request(filename, contents, Utc::now()))
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(request_error)?;
        // paste.gg reports validation failures as 4xx with a JSON error body.
        if !status.is_success() {
            return match parse_result(&body) {
                Err(ServiceError::Rejected(msg)) => Err(ServiceError::Rejected(msg)),
                _ => Err(status_error(status, &body)),
            };
        }
        parse_result(&body)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn request_body_shape() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let v = serde_json::to_value(build_request("latest.txt", "hello", now)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "name": "latest.txt",
                "expires": "2024-03-08T12:00:00.000Z",
                "files": [{
                    "name": "latest.txt",
                    "content": { "format": "text", "value": "hello" }
                }]
            })
        );
    }

    #[test]
    fn success_yields_anonymous_paste_url() {
        let body = r#"{"status":"success","result":{"id":"abc123","name":"a.txt","visibility":"unlisted","files":[]}}"#;
        assert_eq!(
            parse_result(body).unwrap(),
            "https://paste.gg/p/anonymous/abc123"
        );
    }

    #[test]
    fn error_combines_code_and_message() {
        let body = r#"{"status":"error","error":"bad_expiry","message":"The expiry date was in the past."}"#;
        assert_eq!(
            parse_result(body).unwrap_err().to_string(),
            "bad_expiry - The expiry date was in the past."
        );
    }
}
