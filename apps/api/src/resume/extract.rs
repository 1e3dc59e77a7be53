use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;
use crate::resume::upload::ResumeFormat;

/// Shorter output usually means a scanned or image-only document.
pub const MIN_EXTRACTED_CHARS: usize = 100;

const PAGE_BREAK: char = '\u{c}';
const PARAGRAPH_SEPARATOR: &str = "\n\n";
const MIN_RUN_CHARS: usize = 4;

/// Extracts plain text and enforces the minimum length.
pub async fn extract_text(format: ResumeFormat, bytes: Bytes) -> Result<String, AppError> {
    let text = match format {
        ResumeFormat::Pdf => {
            let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| AppError::TextExtraction(format!("PDF parser aborted: {e}")))?
                .map_err(|e| AppError::TextExtraction(e.to_string()))?;
            join_pages(&raw)
        }
        ResumeFormat::Doc | ResumeFormat::Docx => decode_word(&bytes),
    };
    debug!("Extracted {} characters from {:?} resume", text.chars().count(), format);
    ensure_enough_text(text)
}

/// Trims each page and joins non-empty pages with a blank line.
pub fn join_pages(raw: &str) -> String {
    raw.split(PAGE_BREAK)
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

/// Lossy decode for Word files: keeps runs of printable characters and
/// drops binary noise. Compressed `.docx` bodies mostly yield nothing.
pub fn decode_word(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut flush = |current: &mut String| {
        let run = current.trim();
        if run.chars().count() >= MIN_RUN_CHARS {
            runs.push(run.to_string());
        }
        current.clear();
    };
    for c in decoded.chars() {
        let printable = c != char::REPLACEMENT_CHARACTER && (!c.is_control() || c == '\n' || c == '\t');
        if printable {
            current.push(c);
        } else {
            flush(&mut current);
        }
    }
    flush(&mut current);
    runs.join("\n")
}

pub fn ensure_enough_text(text: String) -> Result<String, AppError> {
    let trimmed = text.trim();
    let chars = trimmed.chars().count();
    if chars < MIN_EXTRACTED_CHARS {
        return Err(AppError::TextExtraction(format!(
            "only {chars} characters found; the file may be a scanned image"
        )));
    }
    Ok(trimmed.to_string())
}
