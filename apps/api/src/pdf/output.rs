//! Download naming and the ways a generated PDF reaches the client.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::contract::ContractForm;
use crate::pdf::PdfSelection;

/// How the generated PDF is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Raw `application/pdf` body.
    Inline,
    /// JSON with the document base64 encoded.
    #[default]
    Base64,
    /// Uploaded to object storage, JSON with a presigned download URL.
    Storage,
}

#[derive(Debug, Serialize)]
pub struct Base64Pdf {
    pub pdf_base64: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct StoredPdf {
    pub url: String,
    pub filename: String,
    pub expires_in_secs: u64,
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Sanitized identifier, or `default` when the value is missing or empty.
/// Whitespace is not trimmed: it is replaced like any other unsafe character.
fn identifier(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// `{rendszam}-{alvazszam}-{YYYY-MM-DD}` with unsafe characters replaced by `_`.
pub fn filename_base(form: &ContractForm, today: NaiveDate) -> String {
    format!(
        "{}-{}-{}",
        identifier(&form.rendszam, "rendszam"),
        identifier(&form.alvazszam, "alvazszam"),
        today.format("%Y-%m-%d")
    )
}

/// Full download name; a single template gets its kind as a suffix.
pub fn filename(form: &ContractForm, selection: PdfSelection, today: NaiveDate) -> String {
    let base = filename_base(form, today);
    match selection.single() {
        Some(kind) => format!("{base}-{}.pdf", kind.as_str()),
        None => format!("{base}.pdf"),
    }
}

pub fn encode_base64(pdf: &[u8], filename: String) -> Base64Pdf {
    Base64Pdf {
        pdf_base64: general_purpose::STANDARD.encode(pdf),
        filename,
    }
}

/// Object key a generated contract is stored under.
pub fn storage_key(filename: &str, today: NaiveDate) -> String {
    format!("contracts/{}/{}/{}", today.format("%Y-%m-%d"), Uuid::new_v4(), filename)
}

/// Uploads the PDF and returns a presigned GET URL valid for `ttl_secs`.
pub async fn upload_pdf(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    pdf: Vec<u8>,
    ttl_secs: u64,
) -> Result<String, AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(pdf))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;
    info!("Uploaded contract PDF to s3://{bucket}/{key}");

    let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
        .map_err(|e| AppError::S3(format!("invalid presign TTL: {e}")))?;
    let request = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(presigning)
        .await
        .map_err(|e| AppError::S3(format!("presigning {key} failed: {e}")))?;
    Ok(request.uri().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_filename_replaces_unsafe_characters() {
        let form = ContractForm {
            rendszam: Some("ABC 123".into()),
            alvazszam: Some("WVW/ZZZ.1".into()),
            ..Default::default()
        };
        assert_eq!(filename_base(&form, today()), "ABC_123-WVW_ZZZ_1-2026-10-19");
    }

    #[test]
    fn test_filename_defaults_for_missing_identifiers() {
        let form = ContractForm {
            rendszam: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            filename(&form, PdfSelection::All, today()),
            "rendszam-alvazszam-2026-10-19.pdf"
        );
    }

    #[test]
    fn test_filename_keeps_whitespace_as_underscores() {
        let form = ContractForm {
            rendszam: Some(" ABC".into()),
            alvazszam: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(filename_base(&form, today()), "_ABC-__-2026-10-19");
    }

    #[test]
    fn test_filename_single_template_suffix() {
        let form = ContractForm {
            rendszam: Some("ABC-123".into()),
            alvazszam: Some("X1".into()),
            ..Default::default()
        };
        assert_eq!(
            filename(&form, PdfSelection::Meghatalmazas, today()),
            "ABC-123-X1-2026-10-19-meghatalmazas.pdf"
        );
    }

    #[test]
    fn test_hungarian_letters_are_not_kept() {
        assert_eq!(sanitize("ÁRVÍZ-1"), "_RV_Z-1");
    }

    #[test]
    fn test_base64_payload() {
        let payload = encode_base64(b"%PDF-1.5", "a.pdf".to_string());
        assert_eq!(payload.pdf_base64, "JVBERi0xLjU=");
        assert_eq!(payload.filename, "a.pdf");
    }

    #[test]
    fn test_delivery_defaults_to_base64() {
        assert_eq!(Delivery::default(), Delivery::Base64);
        let d: Delivery = serde_json::from_str(r#""storage""#).unwrap();
        assert_eq!(d, Delivery::Storage);
    }

    #[test]
    fn test_storage_key_is_dated() {
        let key = storage_key("a.pdf", today());
        assert!(key.starts_with("contracts/2026-10-19/"));
        assert!(key.ends_with("/a.pdf"));
    }
}
