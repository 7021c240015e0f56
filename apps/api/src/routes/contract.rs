use axum::Json;
use chrono::Local;

use crate::models::contract::ContractForm;

/// GET /api/v1/contract/defaults
///
/// A blank form with every date set to today.
pub async fn handle_contract_defaults() -> Json<ContractForm> {
    Json(ContractForm::with_defaults(Local::now().date_naive()))
}
