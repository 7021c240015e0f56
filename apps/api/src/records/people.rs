use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::records::{SellerRow, WitnessRow};

/// The two person collections a record can be deleted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonCollection {
    Sellers,
    Witnesses,
}

impl PersonCollection {
    fn table(&self) -> &'static str {
        match self {
            PersonCollection::Sellers => "sellers",
            PersonCollection::Witnesses => "witnesses",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewSeller {
    pub name: String,
    #[serde(default, alias = "kepviseloName")]
    pub representative_name: Option<String>,
    #[serde(default, alias = "documentNumber")]
    pub document_number: Option<String>,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct NewWitness {
    pub name: String,
    pub address: String,
    #[serde(alias = "idNumber")]
    pub id_number: String,
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl NewSeller {
    pub fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("address", &self.address)
    }
}

impl NewWitness {
    pub fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("address", &self.address)?;
        require("id_number", &self.id_number)
    }
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn create_seller(pool: &PgPool, seller: &NewSeller) -> Result<SellerRow, AppError> {
    seller.validate()?;
    let row = sqlx::query_as::<_, SellerRow>(
        r#"
        INSERT INTO sellers (id, name, representative_name, document_number, address)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(seller.name.trim())
    .bind(blank_to_none(&seller.representative_name))
    .bind(blank_to_none(&seller.document_number))
    .bind(seller.address.trim())
    .fetch_one(pool)
    .await?;

    info!("Saved seller {} ({})", row.id, row.name);
    Ok(row)
}

pub async fn list_sellers(pool: &PgPool) -> Result<Vec<SellerRow>, AppError> {
    Ok(
        sqlx::query_as::<_, SellerRow>("SELECT * FROM sellers ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn create_witness(pool: &PgPool, witness: &NewWitness) -> Result<WitnessRow, AppError> {
    witness.validate()?;
    let row = sqlx::query_as::<_, WitnessRow>(
        r#"
        INSERT INTO witnesses (id, name, address, id_number)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(witness.name.trim())
    .bind(witness.address.trim())
    .bind(witness.id_number.trim())
    .fetch_one(pool)
    .await?;

    info!("Saved witness {} ({})", row.id, row.name);
    Ok(row)
}

pub async fn list_witnesses(pool: &PgPool) -> Result<Vec<WitnessRow>, AppError> {
    Ok(
        sqlx::query_as::<_, WitnessRow>("SELECT * FROM witnesses ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?,
    )
}

/// Deletes one person record. The table name comes from the enum, never from input.
pub async fn delete_person(
    pool: &PgPool,
    collection: PersonCollection,
    id: Uuid,
) -> Result<(), AppError> {
    let sql = format!("DELETE FROM {} WHERE id = $1", collection.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "{} record {id} not found",
            collection.table()
        )));
    }

    info!("Deleted {id} from {}", collection.table());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_accepts_ui_aliases() {
        let seller: NewSeller = serde_json::from_str(
            r#"{"name": "Autó Kft.", "kepviseloName": "Kiss Péter", "documentNumber": "01-09-123456", "address": "Budapest"}"#,
        )
        .unwrap();
        assert_eq!(seller.representative_name.as_deref(), Some("Kiss Péter"));
        assert_eq!(seller.document_number.as_deref(), Some("01-09-123456"));
        assert!(seller.validate().is_ok());
    }

    #[test]
    fn test_seller_requires_address() {
        let seller = NewSeller {
            name: "Autó Kft.".to_string(),
            representative_name: None,
            document_number: None,
            address: "   ".to_string(),
        };
        assert!(matches!(seller.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_witness_requires_id_number() {
        let witness: NewWitness =
            serde_json::from_str(r#"{"name": "Nagy Anna", "address": "Pomáz", "idNumber": ""}"#)
                .unwrap();
        assert!(witness.validate().is_err());
    }

    #[test]
    fn test_collection_deserializes_lowercase() {
        let c: PersonCollection = serde_json::from_str(r#""witnesses""#).unwrap();
        assert_eq!(c, PersonCollection::Witnesses);
        assert_eq!(c.table(), "witnesses");
    }
}
