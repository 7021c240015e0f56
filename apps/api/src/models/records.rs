use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::contract::ContractForm;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SellerRow {
    pub id: Uuid,
    pub name: String,
    pub representative_name: Option<String>,
    pub document_number: Option<String>,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WitnessRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub id_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SavedJobRow {
    pub id: Uuid,
    pub form_data: Json<ContractForm>,
    pub rendszam: String,
    pub created_at: DateTime<Utc>,
}
