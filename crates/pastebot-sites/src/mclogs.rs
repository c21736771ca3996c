//! mclo.gs (https://api.mclo.gs/), preferred for log files.

use async_trait::async_trait;
use serde::Deserialize;

use pastebot_core::destinations::{PasteService, ServiceError};

use crate::{request_error, status_error};

pub const SITE_NAME: &str = "mclo.gs";
pub const MAX_SIZE_BYTES: u64 = 10_000_000;
pub const PREFERRED_PATTERNS: &[&str] = &[r".*\.log(?:\.gz)?$"];

const API_URL: &str = "https://api.mclo.gs/1/log";

#[derive(Debug, Deserialize)]
struct CreateResult {
    success: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MclogsService {
    http: reqwest::Client,
}

impl MclogsService {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn parse_result(body: &str) -> Result<String, ServiceError> {
    let result: CreateResult =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    match result {
        CreateResult {
            success: true,
            url: Some(url),
            ..
        } => Ok(url),
        CreateResult {
            success: true,
            url: None,
            ..
        } => Err(ServiceError::Malformed("success without url".to_string())),
        CreateResult { error, .. } => Err(ServiceError::Rejected(
            error.unwrap_or_else(|| "unknown error".to_string()),
        )),
    }
}

#[async_trait]
impl PasteService for MclogsService {
    async fn create(&self, _filename: &str, contents: &str) -> Result<String, ServiceError> {
        let resp = self
            .http
            .post(API_URL)
            .form(&[("content", contents)])
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_result(&body)
    }
}
