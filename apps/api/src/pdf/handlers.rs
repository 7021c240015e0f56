use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{info, warn};

use crate::amount::spell_cached;
use crate::errors::AppError;
use crate::models::contract::{non_blank, ContractForm};
use crate::pdf::output::{self, Delivery, StoredPdf};
use crate::pdf::{render, PdfSelection};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeneratePdfRequest {
    #[serde(alias = "formData")]
    pub form_data: ContractForm,
    #[serde(default, alias = "pdfType")]
    pub pdf_type: PdfSelection,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryQuery {
    pub delivery: Option<Delivery>,
}

/// Fills `vetelar_betukkel` from the price when the user left it blank.
/// A speller failure leaves the field blank rather than failing the document.
async fn complete_price_words(state: &AppState, form: &mut ContractForm) -> Result<(), AppError> {
    if non_blank(&form.vetelar_betukkel).is_some() {
        return Ok(());
    }
    let Some(price) = form.price()?.filter(|p| *p > 0) else {
        return Ok(());
    };
    match spell_cached(state.speller.as_ref(), &state.redis, price).await {
        Ok(words) => form.vetelar_betukkel = Some(words),
        Err(e) => warn!("Could not spell price {price}: {e}"),
    }
    Ok(())
}

/// POST /api/v1/pdf?delivery=inline|base64|storage
///
/// Fills the selected templates, merges them when there are several and
/// returns the document the requested way.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Query(query): Query<DeliveryQuery>,
    Json(req): Json<GeneratePdfRequest>,
) -> Result<Response, AppError> {
    let GeneratePdfRequest {
        form_data: mut form,
        pdf_type: selection,
    } = req;
    form.validate()?;
    complete_price_words(&state, &mut form).await?;

    let today: NaiveDate = Local::now().date_naive();
    let kinds = selection.kinds();
    let templates = state.templates.load_templates(&kinds).await?;
    let font = state.templates.load_font().await?;
    let font_size = state.config.pdf_font_size;
    let filename = output::filename(&form, selection, today);

    let pdf = tokio::task::spawn_blocking(move || render(&templates, &form, today, &font, font_size))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF task failed: {e}")))??;

    info!(
        "Generated {filename} ({} bytes, {} template(s))",
        pdf.len(),
        kinds.len()
    );

    let response = match query.delivery.unwrap_or_default() {
        Delivery::Inline => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            pdf,
        )
            .into_response(),
        Delivery::Base64 => Json(output::encode_base64(&pdf, filename)).into_response(),
        Delivery::Storage => {
            let key = output::storage_key(&filename, today);
            let ttl = state.config.presigned_url_ttl_secs;
            let url =
                output::upload_pdf(&state.s3, &state.config.s3_bucket, &key, pdf, ttl).await?;
            Json(StoredPdf {
                url,
                filename,
                expires_in_secs: ttl,
            })
            .into_response()
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_camel_case_keys() {
        let req: GeneratePdfRequest = serde_json::from_str(
            r#"{"formData": {"rendszam": "ABC-123"}, "pdfType": "main"}"#,
        )
        .unwrap();
        assert_eq!(req.form_data.rendszam.as_deref(), Some("ABC-123"));
        assert_eq!(req.pdf_type, PdfSelection::Main);
    }

    #[test]
    fn test_pdf_type_defaults_to_all() {
        let req: GeneratePdfRequest = serde_json::from_str(r#"{"form_data": {}}"#).unwrap();
        assert_eq!(req.pdf_type, PdfSelection::All);
    }
}
