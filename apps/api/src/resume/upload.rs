use bytes::Bytes;
use serde::Deserialize;

use crate::config::Config;
use crate::errors::AppError;

const PDF_MIME: &str = "application/pdf";
const DOC_MIME: &str = "application/msword";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Doc,
    Docx,
}

impl ResumeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "pdf",
            ResumeFormat::Doc => "doc",
            ResumeFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => PDF_MIME,
            ResumeFormat::Doc => DOC_MIME,
            ResumeFormat::Docx => DOCX_MIME,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime.split(';').next().map(str::trim) {
            Some(PDF_MIME) => Some(ResumeFormat::Pdf),
            Some(DOC_MIME) => Some(ResumeFormat::Doc),
            Some(DOCX_MIME) => Some(ResumeFormat::Docx),
            _ => None,
        }
    }

    /// Format implied by a file name or storage path extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "doc" => Some(ResumeFormat::Doc),
            "docx" => Some(ResumeFormat::Docx),
            _ => None,
        }
    }
}

/// Size limit for one upload call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn onboarding(config: &Config) -> Self {
        Self {
            max_bytes: config.onboarding_resume_max_bytes,
        }
    }

    pub fn profile_edit(config: &Config) -> Self {
        Self {
            max_bytes: config.profile_resume_max_bytes,
        }
    }
}

/// Which screen the upload came from; selects the `UploadPolicy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadContext {
    Onboarding,
    #[default]
    Profile,
}

impl UploadContext {
    pub fn policy(self, config: &Config) -> UploadPolicy {
        match self {
            UploadContext::Onboarding => UploadPolicy::onboarding(config),
            UploadContext::Profile => UploadPolicy::profile_edit(config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Checks type and size. Browsers often send `application/octet-stream`
/// for Word files, so an unknown or generic MIME falls back to the file
/// extension.
pub fn validate_resume_file(upload: &ResumeUpload, policy: &UploadPolicy) -> Result<ResumeFormat, AppError> {
    let format = upload
        .content_type
        .as_deref()
        .and_then(ResumeFormat::from_mime)
        .or_else(|| {
            let generic = upload
                .content_type
                .as_deref()
                .map_or(true, |m| m.starts_with("application/octet-stream"));
            if generic {
                upload.file_name.as_deref().and_then(ResumeFormat::from_path)
            } else {
                None
            }
        })
        .ok_or_else(|| AppError::Validation("resume must be a PDF, DOC or DOCX file".to_string()))?;

    if upload.bytes.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }
    if upload.bytes.len() > policy.max_bytes {
        return Err(AppError::Validation(format!(
            "resume exceeds the {} MB limit",
            policy.max_bytes / (1024 * 1024)
        )));
    }
    Ok(format)
}
