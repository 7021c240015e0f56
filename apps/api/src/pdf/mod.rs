//! Contract PDF generation: fill the AcroForm templates, flatten them and
//! merge the results into one document.

pub mod assets;
pub mod fields;
pub mod font;
pub mod form;
pub mod handlers;
pub mod merge;
pub mod output;

use bytes::Bytes;
use chrono::NaiveDate;
use lopdf::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::contract::ContractForm;
use font::{DocumentFont, FieldFont};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("invalid PDF: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("font error: {0}")]
    Font(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("empty input: {0}")]
    Empty(String),

    #[error("field '{0}' is not a text field")]
    NotTextField(String),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One of the fillable templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// The sale contract itself.
    Main,
    /// Statement on the statutory warranty.
    Kellekszavatossag,
    /// Authorisation for the registration office.
    Meghatalmazas,
}

impl TemplateKind {
    /// Merge order.
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::Main,
        TemplateKind::Kellekszavatossag,
        TemplateKind::Meghatalmazas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Main => "main",
            TemplateKind::Kellekszavatossag => "kellekszavatossag",
            TemplateKind::Meghatalmazas => "meghatalmazas",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::Main => "sablon.pdf",
            TemplateKind::Kellekszavatossag => "kellekszavatossagi_nyilatkozat.pdf",
            TemplateKind::Meghatalmazas => "meghatalmazas_okmanyiroda.pdf",
        }
    }
}

/// Which templates a request wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfSelection {
    #[default]
    All,
    Main,
    Kellekszavatossag,
    Meghatalmazas,
}

impl PdfSelection {
    pub fn kinds(&self) -> Vec<TemplateKind> {
        match self {
            PdfSelection::All => TemplateKind::ALL.to_vec(),
            PdfSelection::Main => vec![TemplateKind::Main],
            PdfSelection::Kellekszavatossag => vec![TemplateKind::Kellekszavatossag],
            PdfSelection::Meghatalmazas => vec![TemplateKind::Meghatalmazas],
        }
    }

    /// The single template selected, if any.
    pub fn single(&self) -> Option<TemplateKind> {
        match self {
            PdfSelection::All => None,
            PdfSelection::Main => Some(TemplateKind::Main),
            PdfSelection::Kellekszavatossag => Some(TemplateKind::Kellekszavatossag),
            PdfSelection::Meghatalmazas => Some(TemplateKind::Meghatalmazas),
        }
    }
}

/// Fills one template with the form data and flattens it.
///
/// Fields missing from the template, or not text fields, are logged and
/// skipped. Blank values leave their field untouched.
pub fn fill_template(
    template: &[u8],
    kind: TemplateKind,
    form: &ContractForm,
    today: NaiveDate,
    font: &FieldFont,
    font_size: f32,
) -> Result<Document, PdfError> {
    let mut doc = Document::load_mem(template)?;
    let form_fields = form::collect_fields(&doc)?;
    if form_fields.is_empty() {
        warn!("Template {} has no form fields", kind.file_name());
    }

    let mut doc_font = DocumentFont::reserve(&mut doc, font);
    let mut filled = 0;
    for (name, value) in fields::field_values(kind, form, today) {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let Some(field) = form_fields.iter().find(|f| f.name == name) else {
            warn!("Field '{name}' not found in {}", kind.file_name());
            continue;
        };
        match form::fill_text_field(&mut doc, field, &value, &mut doc_font, font_size) {
            Ok(()) => filled += 1,
            Err(e) => warn!("Could not fill '{name}' in {}: {e}", kind.file_name()),
        }
    }
    doc_font.finish(&mut doc)?;

    let painted = form::flatten(&mut doc)?;
    debug!(
        template = kind.as_str(),
        filled, painted, "Template filled and flattened"
    );
    Ok(doc)
}

/// Fills every template in order and returns the serialized PDF, merged
/// when there is more than one.
pub fn render(
    templates: &[(TemplateKind, Bytes)],
    form: &ContractForm,
    today: NaiveDate,
    font: &FieldFont,
    font_size: f32,
) -> Result<Vec<u8>, PdfError> {
    if templates.is_empty() {
        return Err(PdfError::Empty("no templates selected".to_string()));
    }

    let documents = templates
        .iter()
        .map(|(kind, bytes)| fill_template(bytes, *kind, form, today, font, font_size))
        .collect::<Result<Vec<_>, _>>()?;

    let mut document = merge::merge_documents(documents)?;
    document.compress();

    let mut out = Vec::new();
    document.save_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::form::tests::form_document;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn template_bytes(fields: &[&str]) -> Bytes {
        let mut doc = form_document(fields);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        Bytes::from(out)
    }

    fn contains_text_stream(doc: &Document, needle: &str) -> bool {
        doc.objects.values().any(|obj| {
            obj.as_stream()
                .ok()
                .and_then(|s| s.decompressed_content().ok().or_else(|| Some(s.content.clone())))
                .map(|c| String::from_utf8_lossy(&c).contains(needle))
                .unwrap_or(false)
        })
    }

    #[test]
    fn test_selection_kinds_keep_merge_order() {
        assert_eq!(PdfSelection::All.kinds(), TemplateKind::ALL.to_vec());
        assert_eq!(PdfSelection::Meghatalmazas.kinds(), vec![TemplateKind::Meghatalmazas]);
        assert_eq!(PdfSelection::All.single(), None);
    }

    #[test]
    fn test_selection_deserializes_lowercase() {
        let s: PdfSelection = serde_json::from_str(r#""kellekszavatossag""#).unwrap();
        assert_eq!(s, PdfSelection::Kellekszavatossag);
        assert!(serde_json::from_str::<PdfSelection>(r#""other""#).is_err());
    }

    #[test]
    fn test_fill_template_flattens_filled_fields() {
        let form = ContractForm {
            rendszam: Some("ABC-123".into()),
            motorszam: Some("   ".into()),
            ..Default::default()
        };
        let bytes = template_bytes(&["rendszam", "motorszam"]);
        let doc = fill_template(&bytes, TemplateKind::Main, &form, today(), &FieldFont::Standard, 12.0)
            .unwrap();

        assert!(form::collect_fields(&doc).unwrap().is_empty());
        assert!(contains_text_stream(&doc, "<4142432D313233> Tj"));
    }

    #[test]
    fn test_missing_fields_are_not_fatal() {
        let form = ContractForm {
            vevo_nev: Some("Kiss Péter".into()),
            ..Default::default()
        };
        let bytes = template_bytes(&["rendszam"]);
        assert!(fill_template(&bytes, TemplateKind::Main, &form, today(), &FieldFont::Standard, 12.0).is_ok());
    }

    #[test]
    fn test_render_merges_all_templates() {
        let form = ContractForm {
            rendszam: Some("ABC-123".into()),
            alvazszam: Some("WVWZZZ1JZXW000001".into()),
            ..Default::default()
        };
        let templates = vec![
            (TemplateKind::Main, template_bytes(&["rendszam"])),
            (TemplateKind::Kellekszavatossag, template_bytes(&["kell_rendszam", "kell_datum"])),
            (TemplateKind::Meghatalmazas, template_bytes(&["meghatalmazas_rendszam_megh"])),
        ];
        let out = render(&templates, &form, today(), &FieldFont::Standard, 12.0).unwrap();
        assert!(out.starts_with(b"%PDF-"));
        assert_eq!(Document::load_mem(&out).unwrap().get_pages().len(), 3);
    }

    #[test]
    fn test_render_with_embedded_font_reloads() {
        let font = FieldFont::Embedded(
            font::EmbeddedFont::from_bytes(
                include_bytes!("../../assets/fonts/DejaVuSans.ttf").to_vec(),
            )
            .unwrap(),
        );
        let form = ContractForm {
            rendszam: Some("ABC-123".into()),
            vevo_nev: Some("Kovács Ödön".into()),
            vevo_lakcim: Some("9021 Győr, Szűcs utca 1.".into()),
            ..Default::default()
        };
        let templates = vec![
            (TemplateKind::Main, template_bytes(&["rendszam", "vevo_nev", "vevo_lakcim"])),
            (TemplateKind::Meghatalmazas, template_bytes(&["meghatalmazo_nev_megh"])),
        ];
        let out = render(&templates, &form, today(), &font, 12.0).unwrap();

        let reloaded = Document::load_mem(&out).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
        let embedded_fonts = reloaded
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| {
                d.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"CIDFontType2".as_slice())
            })
            .count();
        assert_eq!(embedded_fonts, 2, "one embedded font per filled template");
    }

    #[test]
    fn test_render_rejects_garbage_template() {
        let templates = vec![(TemplateKind::Main, Bytes::from_static(b"not a pdf"))];
        let result = render(&templates, &ContractForm::default(), today(), &FieldFont::Standard, 12.0);
        assert!(matches!(result, Err(PdfError::Lopdf(_))));
    }

    #[test]
    fn test_render_without_templates_is_an_error() {
        let result = render(&[], &ContractForm::default(), today(), &FieldFont::Standard, 12.0);
        assert!(matches!(result, Err(PdfError::Empty(_))));
    }
}
