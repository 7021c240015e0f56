//! Vehicle sale contract form data.
//!
//! Field names are the wire keys the form UI sends and mostly match the PDF
//! template field names one to one. `szerrzodes_nap` is misspelled on purpose:
//! both the UI and the templates use that spelling.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const MONTH_NAMES: [&str; 12] = [
    "január",
    "február",
    "március",
    "április",
    "május",
    "június",
    "július",
    "augusztus",
    "szeptember",
    "október",
    "november",
    "december",
];

/// Hungarian name of a month, 1-based. Out of range months yield an empty string.
pub fn hungarian_month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Long Hungarian date as printed on the warranty statement, e.g. `2026. október 19.`
pub fn hungarian_long_date(date: NaiveDate) -> String {
    format!(
        "{}. {} {}.",
        date.year(),
        hungarian_month_name(date.month()),
        date.day()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "készpénz")]
    Cash,
    #[serde(rename = "utalás")]
    Transfer,
    #[serde(rename = "készpénz és utalás")]
    CashAndTransfer,
    #[serde(rename = "egyéb")]
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "készpénz",
            PaymentMethod::Transfer => "utalás",
            PaymentMethod::CashAndTransfer => "készpénz és utalás",
            PaymentMethod::Other => "egyéb",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            PaymentMethod::Cash,
            PaymentMethod::Transfer,
            PaymentMethod::CashAndTransfer,
            PaymentMethod::Other,
        ]
        .into_iter()
        .find(|m| m.as_str() == label.trim())
    }
}

/// Every value the contract form collects. All fields are optional free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractForm {
    // Vehicle
    pub rendszam: Option<String>,
    pub alvazszam: Option<String>,
    pub motorszam: Option<String>,
    pub km_allas: Option<String>,
    pub torzskonyv_szam: Option<String>,
    pub forgalmi_szam: Option<String>,
    pub gyartmany_tipus: Option<String>,
    pub km_idopont: Option<String>,

    // Seller (company)
    pub ceg_neve: Option<String>,
    pub ceg_kepviselo: Option<String>,
    pub cegjegyzekszam: Option<String>,
    pub szekhely: Option<String>,

    // Buyer
    pub vevo_nev: Option<String>,
    pub vevo_szul_hely_ido: Option<String>,
    pub vevo_anyja_neve: Option<String>,
    pub vevo_okmany_szam: Option<String>,
    pub vevo_lakcim: Option<String>,

    // Authorised person and warranty notes
    pub meghatalmazott_adatok: Option<String>,
    pub kell_tovabbi_info: Option<String>,

    // Dates
    pub atadas_ev: Option<String>,
    pub atadas_ho: Option<String>,
    pub atadas_nap: Option<String>,
    pub hataly_ev: Option<String>,
    pub hataly_ho: Option<String>,
    pub hataly_nap: Option<String>,
    pub birtok_ev: Option<String>,
    pub birtok_ho: Option<String>,
    pub birtok_nap: Option<String>,
    pub birtok_ora: Option<String>,
    pub birtok_perc: Option<String>,
    pub szerzodes_ev: Option<String>,
    pub szerzodes_ho: Option<String>,
    pub szerrzodes_nap: Option<String>,

    // Witnesses
    pub tanu1_nev: Option<String>,
    pub tanu1_lakcim: Option<String>,
    pub tanu1_szig: Option<String>,
    pub tanu2_nev: Option<String>,
    pub tanu2_lakcim: Option<String>,
    pub tanu2_szig: Option<String>,

    // Price
    pub vetelar_szam: Option<String>,
    pub vetelar_betukkel: Option<String>,
    pub fizetesi_mod: Option<String>,
    pub egyeb_fizetesi_mod: Option<String>,
    pub fizetesi_datum: Option<String>,
}

fn some(value: impl Into<String>) -> Option<String> {
    Some(value.into())
}

/// Returns the trimmed value when it is present and not blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ContractForm {
    /// A fresh form: every date group set to `today`, possession at 12:00, cash payment.
    pub fn with_defaults(today: NaiveDate) -> Self {
        let year = today.year().to_string();
        let month = hungarian_month_name(today.month()).to_string();
        let day = today.day().to_string();
        let iso = today.format("%Y-%m-%d").to_string();

        ContractForm {
            km_idopont: some(iso.clone()),
            atadas_ev: some(year.clone()),
            atadas_ho: some(month.clone()),
            atadas_nap: some(day.clone()),
            hataly_ev: some(year.clone()),
            hataly_ho: some(month.clone()),
            hataly_nap: some(day.clone()),
            birtok_ev: some(year.clone()),
            birtok_ho: some(month.clone()),
            birtok_nap: some(day.clone()),
            birtok_ora: some("12"),
            birtok_perc: some("00"),
            szerzodes_ev: some(year),
            szerzodes_ho: some(month),
            szerrzodes_nap: some(day),
            fizetesi_mod: some(PaymentMethod::Cash.as_str()),
            fizetesi_datum: some(iso),
            ..Default::default()
        }
    }

    /// The payment method text printed on the contract. `egyéb` is replaced by the free text.
    pub fn effective_payment_method(&self) -> Option<String> {
        let method = non_blank(&self.fizetesi_mod)?;
        if PaymentMethod::from_label(method) == Some(PaymentMethod::Other) {
            non_blank(&self.egyeb_fizetesi_mod).map(str::to_string)
        } else {
            Some(method.to_string())
        }
    }

    /// Label a saved job is listed under.
    pub fn job_label(&self) -> String {
        non_blank(&self.rendszam)
            .or_else(|| non_blank(&self.alvazszam))
            .unwrap_or("Ismeretlen Munka")
            .to_string()
    }

    /// The purchase price as a whole number of forints, if one was entered.
    pub fn price(&self) -> Result<Option<u64>, AppError> {
        match non_blank(&self.vetelar_szam) {
            Some(raw) => parse_price(raw).map(Some),
            None => Ok(None),
        }
    }

    /// Server-side mirror of the form's own checks.
    pub fn validate(&self) -> Result<(), AppError> {
        self.price()?;

        if let Some(method) = non_blank(&self.fizetesi_mod) {
            match PaymentMethod::from_label(method) {
                Some(PaymentMethod::Other) if non_blank(&self.egyeb_fizetesi_mod).is_none() => {
                    return Err(AppError::Validation(
                        "egyeb_fizetesi_mod is required when fizetesi_mod is 'egyéb'".to_string(),
                    ));
                }
                Some(_) => {}
                None => {
                    return Err(AppError::Validation(format!(
                        "Unknown fizetesi_mod '{method}'"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Parses a price typed by a person: spaces, dots and a trailing `Ft` are tolerated.
pub fn parse_price(raw: &str) -> Result<u64, AppError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("Ft").unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '\u{a0}')
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "vetelar_szam must be a whole number, got '{raw}'"
        )));
    }

    digits
        .parse::<u64>()
        .map_err(|_| AppError::Validation(format!("vetelar_szam is out of range: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_fill_every_date_group() {
        let form = ContractForm::with_defaults(date(2026, 10, 19));
        assert_eq!(form.atadas_ev.as_deref(), Some("2026"));
        assert_eq!(form.hataly_ho.as_deref(), Some("október"));
        assert_eq!(form.birtok_nap.as_deref(), Some("19"));
        assert_eq!(form.szerrzodes_nap.as_deref(), Some("19"));
        assert_eq!(form.birtok_ora.as_deref(), Some("12"));
        assert_eq!(form.birtok_perc.as_deref(), Some("00"));
        assert_eq!(form.km_idopont.as_deref(), Some("2026-10-19"));
        assert_eq!(form.fizetesi_datum.as_deref(), Some("2026-10-19"));
        assert_eq!(form.fizetesi_mod.as_deref(), Some("készpénz"));
        assert!(form.rendszam.is_none());
    }

    #[test]
    fn test_long_date_uses_hungarian_month() {
        assert_eq!(hungarian_long_date(date(2025, 3, 7)), "2025. március 7.");
    }

    #[test]
    fn test_month_name_out_of_range_is_empty() {
        assert_eq!(hungarian_month_name(0), "");
        assert_eq!(hungarian_month_name(13), "");
    }

    #[test]
    fn test_other_payment_method_uses_free_text() {
        let form = ContractForm {
            fizetesi_mod: some("egyéb"),
            egyeb_fizetesi_mod: some("csere"),
            ..Default::default()
        };
        assert_eq!(form.effective_payment_method().as_deref(), Some("csere"));
    }

    #[test]
    fn test_regular_payment_method_passes_through() {
        let form = ContractForm {
            fizetesi_mod: some("utalás"),
            egyeb_fizetesi_mod: some("ignored"),
            ..Default::default()
        };
        assert_eq!(form.effective_payment_method().as_deref(), Some("utalás"));
    }

    #[test]
    fn test_validate_rejects_other_without_text() {
        let form = ContractForm {
            fizetesi_mod: some("egyéb"),
            ..Default::default()
        };
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_method() {
        let form = ContractForm {
            fizetesi_mod: some("bitcoin"),
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_price_tolerates_separators() {
        assert_eq!(parse_price("1 250 000").unwrap(), 1_250_000);
        assert_eq!(parse_price("1.250.000 Ft").unwrap(), 1_250_000);
        assert!(parse_price("12,5").is_err());
        assert!(parse_price("-5").is_err());
    }

    #[test]
    fn test_job_label_falls_back() {
        let mut form = ContractForm {
            alvazszam: some("WVWZZZ1JZXW000001"),
            ..Default::default()
        };
        assert_eq!(form.job_label(), "WVWZZZ1JZXW000001");
        form.rendszam = some("ABC-123");
        assert_eq!(form.job_label(), "ABC-123");
        assert_eq!(ContractForm::default().job_label(), "Ismeretlen Munka");
    }

    #[test]
    fn test_missing_keys_deserialize_as_none() {
        let form: ContractForm = serde_json::from_str(r#"{"rendszam": "ABC-123"}"#).unwrap();
        assert_eq!(form.rendszam.as_deref(), Some("ABC-123"));
        assert!(form.vevo_nev.is_none());
    }
}
