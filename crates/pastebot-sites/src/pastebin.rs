//! Pastebin.com (https://pastebin.com/doc_api). Only registered when an API key is configured.

use async_trait::async_trait;

use pastebot_core::destinations::{PasteService, ServiceError};

use crate::{request_error, status_error};

pub const SITE_NAME: &str = "Pastebin.com";
pub const MAX_SIZE_BYTES: u64 = 500_000;

const API_URL: &str = "https://pastebin.com/api/api_post.php";
const BAD_REQUEST_PREFIX: &str = "Bad API request";

/// Values accepted by `api_paste_expire_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PastebinExpiry {
    Never,
    TenMinutes,
    OneHour,
    OneDay,
    #[default]
    OneWeek,
    TwoWeeks,
    OneMonth,
    SixMonths,
    OneYear,
}

impl PastebinExpiry {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Never => "N",
            Self::TenMinutes => "10M",
            Self::OneHour => "1H",
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::TwoWeeks => "2W",
            Self::OneMonth => "1M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
        }
    }
}

/// (api_paste_format, extensions)
const FORMATS: &[(&str, &[&str])] = &[
    ("bash", &["sh"]),
    ("dos", &["bat"]),
    ("c", &["c"]),
    ("csharp", &["cs"]),
    ("cpp", &["cpp"]),
    ("cmake", &["cmake"]),
    ("css", &["css"]),
    ("dart", &["dart"]),
    ("diff", &["diff"]),
    ("erlang", &["erl", "hrl"]),
    ("gml", &["gml"]),
    ("gdscript", &["gdc"]),
    ("go", &["go"]),
    ("groovy", &["groovy", "gvy", "gy", "gsh"]),
    ("haskell", &["hs"]),
    ("html5", &["html"]),
    ("ini", &["ini"]),
    ("java", &["java"]),
    ("javascript", &["js"]),
    ("json", &["json"]),
    ("kotlin", &["kt"]),
    ("lisp", &["lisp"]),
    ("lolcode", &["lol", "lols"]),
    ("lua", &["lua"]),
    ("make", &["make"]),
    ("markdown", &["md"]),
    ("matlab", &["m", "mat"]),
    (
        "glsl",
        &["glsl", "vert", "tesc", "tese", "geom", "frag", "comp"],
    ),
    ("pascal", &["pas"]),
    ("perl", &["pl"]),
    ("php", &["php"]),
    ("powershell", &["ps1"]),
    ("properties", &["properties"]),
    ("python", &["py"]),
    ("ruby", &["rb"]),
    ("rust", &["rs"]),
    ("scala", &["scala", "sc"]),
    ("sql", &["sql"]),
    ("swift", &["swift"]),
    ("typescript", &["ts"]),
    ("uscript", &["uc"]),
    ("xml", &["xml"]),
    ("yaml", &["yaml"]),
];

/// Syntax highlighting format for a filename, keyed on the text after the last `.`.
pub fn format_for_filename(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.trim().is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find(|(_, exts)| exts.contains(&ext))
        .map(|(format, _)| *format)
}

#[derive(Clone)]
pub struct PastebinService {
    http: reqwest::Client,
    api_key: String,
    expiry: PastebinExpiry,
}

impl std::fmt::Debug for PastebinService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PastebinService")
            .field("api_key", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl PastebinService {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            expiry: PastebinExpiry::default(),
        }
    }

    pub fn with_expiry(mut self, expiry: PastebinExpiry) -> Self {
        self.expiry = expiry;
        self
    }

    fn build_params<'a>(&'a self, filename: &'a str, contents: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("api_dev_key", self.api_key.as_str()),
            ("api_option", "paste"),
            ("api_paste_private", "0"),
            ("api_paste_expire_date", self.expiry.as_param()),
            ("api_paste_name", filename),
        ];
        if let Some(format) = format_for_filename(filename) {
            params.push(("api_paste_format", format));
        }
        params.push(("api_paste_code", contents));
        params
    }
}

fn parse_result(body: &str) -> Result<String, ServiceError> {
    let body = body.trim();
    if body.starts_with(BAD_REQUEST_PREFIX) {
        return Err(ServiceError::Rejected(body.to_string()));
    }
    if body.is_empty() {
        return Err(ServiceError::Malformed("empty body".to_string()));
    }
    Ok(body.to_string())
}

#[async_trait]
impl PasteService for PastebinService {
    async fn create(&self, filename: &str, contents: &str) -> Result<String, ServiceError> {
        let resp = self
            .http
            .post(API_URL)
            .form(&self.build_params(filename, contents))
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        let url = parse_result(&body)?;
        tracing::debug!(filename, %url, "pastebin accepted paste");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_follow_last_extension() {
        assert_eq!(format_for_filename("Main.kt"), Some("kotlin"));
        assert_eq!(format_for_filename("shader.frag"), Some("glsl"));
        assert_eq!(format_for_filename("build.gradle.gy"), Some("groovy"));
        assert_eq!(format_for_filename("archive.tar.rs"), Some("rust"));
        assert_eq!(format_for_filename("notes.txt"), None);
        assert_eq!(format_for_filename("Makefile"), None);
        assert_eq!(format_for_filename("trailing."), None);
    }

    #[test]
    fn params_include_format_only_when_known() {
        let svc = PastebinService::new(reqwest::Client::new(), "k".to_string());
        let params = svc.build_params("run.py", "print(1)");
        assert_eq!(
            params,
            vec![
                ("api_dev_key", "k"),
                ("api_option", "paste"),
                ("api_paste_private", "0"),
                ("api_paste_expire_date", "1W"),
                ("api_paste_name", "run.py"),
                ("api_paste_format", "python"),
                ("api_paste_code", "print(1)"),
            ]
        );

        let params = svc.build_params("notes.txt", "hi");
        assert!(params.iter().all(|(k, _)| *k != "api_paste_format"));
    }

    #[test]
    fn expiry_override() {
        let svc = PastebinService::new(reqwest::Client::new(), "k".to_string())
            .with_expiry(PastebinExpiry::OneDay);
        assert!(svc
            .build_params("a", "b")
            .contains(&("api_paste_expire_date", "1D")));
    }

    #[test]
    fn body_is_url_unless_rejected() {
        assert_eq!(
            parse_result("https://pastebin.com/UIFdu235s\n").unwrap(),
            "https://pastebin.com/UIFdu235s"
        );
        assert_eq!(
            parse_result("Bad API request, invalid api_dev_key").unwrap_err(),
            ServiceError::Rejected("Bad API request, invalid api_dev_key".to_string())
        );
    }
}
