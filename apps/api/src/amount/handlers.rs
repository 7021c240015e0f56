use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::amount::spell_cached;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AmountWordsRequest {
    pub number: f64,
}

#[derive(Debug, Serialize)]
pub struct AmountWordsResponse {
    pub words: String,
}

/// Whole forints to spell, or `None` when the field should be cleared.
pub fn spellable_amount(number: f64) -> Result<Option<u64>, AppError> {
    if !number.is_finite() || number.fract() != 0.0 {
        return Err(AppError::Validation(format!(
            "number must be a whole amount, got {number}"
        )));
    }
    if number <= 0.0 {
        return Ok(None);
    }
    Ok(Some(number as u64))
}

/// POST /api/v1/amount/words
///
/// Non-positive numbers return empty words.
pub async fn handle_amount_words(
    State(state): State<AppState>,
    Json(req): Json<AmountWordsRequest>,
) -> Result<Json<AmountWordsResponse>, AppError> {
    let words = match spellable_amount(req.number)? {
        Some(amount) => spell_cached(state.speller.as_ref(), &state.redis, amount).await?,
        None => String::new(),
    };
    Ok(Json(AmountWordsResponse { words }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_clears_words() {
        assert_eq!(spellable_amount(0.0).unwrap(), None);
        assert_eq!(spellable_amount(-10.0).unwrap(), None);
    }

    #[test]
    fn test_fractional_amount_rejected() {
        assert!(spellable_amount(12.5).is_err());
        assert!(spellable_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_whole_amount_accepted() {
        assert_eq!(spellable_amount(1_250_000.0).unwrap(), Some(1_250_000));
    }
}
