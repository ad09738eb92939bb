use std::time::Duration;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::{FailureKind, FetchError, RawPage};

pub const DEFAULT_BASE_URL: &str = "https://www.seek.com.au";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Scheme and host of the job board; pages live at `{base_url}/job/{id}`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

impl FetchSettings {
    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/job/{}", self.base_url.trim_end_matches('/'), job_id)
    }
}

/// Retrieves one job page per call. Implementations keep no per-job state
/// and never retry.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, job_id: &str) -> Result<RawPage, FetchError>;
}

/// HTTP fetcher sharing one client, and so one connection pool, across jobs.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, FetchError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(policy)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, job_id: &str) -> Result<RawPage, FetchError> {
        let url = self.settings.job_url(job_id);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let html = decode_body(&bytes, content_type.as_deref())?;

        Ok(RawPage {
            job_id: job_id.to_string(),
            final_url,
            status: status.as_u16(),
            content_type,
            html,
        })
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

/// Decodes a page body: BOM first, then the `Content-Type` charset, then
/// statistical detection.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, FetchError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(FetchError::new(
            FailureKind::Decode,
            format!("body is not valid {}", encoding.name()),
        ));
    }
    Ok(text.into_owned())
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_url_joins_base_without_double_slash() {
        let settings = FetchSettings {
            base_url: "http://127.0.0.1:9000/".into(),
            ..FetchSettings::default()
        };
        assert_eq!(settings.job_url("59702994"), "http://127.0.0.1:9000/job/59702994");
    }

    #[test]
    fn charset_is_read_case_insensitively() {
        assert_eq!(charset_label("text/html; Charset=\"ISO-8859-1\""), Some("ISO-8859-1"));
        assert_eq!(charset_label("text/html"), None);
    }

    #[test]
    fn decode_prefers_bom_over_header() {
        let text =
            decode_body(b"\xEF\xBB\xBFhello", Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn decode_uses_header_charset() {
        let text = decode_body(b"caf\xe9", Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(text, "caf\u{e9}");
    }
}
