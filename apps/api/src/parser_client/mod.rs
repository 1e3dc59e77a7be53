//! Client for the remote resume-parsing service.
//!
//! Output is untrusted and partial: every field is optional, nulls are
//! tolerated, and array sections stay as raw JSON until the fan-out stage
//! decides which elements are usable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::session::BearerToken;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parser returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("parser rejected the resume: {0}")]
    Rejected(String),

    #[error("parser unavailable after {retries} retries")]
    Exhausted { retries: u32 },
}

/// Structured fields the parser could recover.
///
/// Each field decodes on its own: a value of the wrong type becomes empty
/// instead of failing the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, alias = "phone", deserialize_with = "lenient_phone")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub headline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, alias = "about", deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub experience_years: Option<i32>,
    #[serde(default, deserialize_with = "lenient_skills")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_section")]
    pub education: Vec<Value>,
    #[serde(default, alias = "work_history", deserialize_with = "lenient_section")]
    pub employment: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_section")]
    pub internships: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_section")]
    pub projects: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_section")]
    pub languages: Vec<Value>,
    #[serde(default, alias = "certifications", deserialize_with = "lenient_section")]
    pub accomplishments: Vec<Value>,
}

/// Strings only; anything else is treated as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Phone numbers sometimes come back as bare numbers.
fn lenient_phone<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) if n.is_u64() => Some(n.to_string()),
        _ => None,
    })
}

/// A list of names, a list of `{"name": ..}` objects, or one comma or
/// semicolon separated string.
fn lenient_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let split = |s: &str| -> Vec<String> {
        s.split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => split(&s),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Object(mut map) => match map.remove("name").or_else(|| map.remove("skill")) {
                    Some(Value::String(s)) => Some(s),
                    _ => None,
                },
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Array sections stay raw; a lone object counts as a one-element list and
/// any other shape is dropped.
fn lenient_section<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    })
}

/// Accepts `4`, `4.5`, `"4"` or `"4+ years"`; anything else becomes `None`.
fn lenient_years<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n >= 0),
        Some(Value::String(s)) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParserReply {
    Failure { error: String },
    Success(ParsedResume),
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    resume_text: &'a str,
}

#[async_trait]
pub trait ResumeParser: Send + Sync {
    /// Parses extracted resume text on behalf of the token's owner.
    async fn parse(&self, resume_text: &str, token: &BearerToken) -> Result<ParsedResume, ParserError>;
}

#[derive(Clone)]
pub struct HttpResumeParser {
    client: Client,
    url: String,
}

impl HttpResumeParser {
    pub fn new(url: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            url,
        })
    }
}

#[async_trait]
impl ResumeParser for HttpResumeParser {
    /// Retries on 429 and 5xx with exponential backoff.
    async fn parse(&self, resume_text: &str, token: &BearerToken) -> Result<ParsedResume, ParserError> {
        let body = ParseRequest { resume_text };
        let mut last_error: Option<ParserError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Resume parser attempt {attempt} failed, retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&self.url)
                .bearer_auth(token.as_str())
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ParserError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                last_error = Some(ParserError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(ParserError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return match response.json::<ParserReply>().await? {
                ParserReply::Failure { error } => Err(ParserError::Rejected(error)),
                ParserReply::Success(parsed) => {
                    debug!(
                        "Resume parsed: {} skills, {} employment entries",
                        parsed.skills.len(),
                        parsed.employment.len()
                    );
                    Ok(parsed)
                }
            };
        }

        Err(last_error.unwrap_or(ParserError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}
