//! Fonts used to draw field appearances.
//!
//! `FieldFont::Embedded` carries a TrueType font that is embedded as a
//! Type0 / CIDFontType2 font with `Identity-H` encoding, so Hungarian
//! letters such as `ő` and `ű` render as typed. `FieldFont::Standard` is the
//! built-in Helvetica with WinAnsi encoding and needs no font file.

use std::collections::BTreeMap;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use owned_ttf_parser::{AsFaceRef as _, Face, GlyphId, OwnedFace};

use crate::pdf::PdfError;

/// A parsed TrueType font together with the bytes it was loaded from.
#[derive(Clone)]
pub struct EmbeddedFont {
    bytes: Arc<Vec<u8>>,
    face: Arc<OwnedFace>,
}

impl std::fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("bytes", &self.bytes.len())
            .field("units_per_em", &self.face().units_per_em())
            .finish()
    }
}

impl EmbeddedFont {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PdfError> {
        if bytes.is_empty() {
            return Err(PdfError::Font("font file is empty".to_string()));
        }
        let face = OwnedFace::from_vec(bytes.clone(), 0)
            .map_err(|e| PdfError::Font(format!("failed to parse font: {e}")))?;
        Ok(Self {
            bytes: Arc::new(bytes),
            face: Arc::new(face),
        })
    }

    fn face(&self) -> &Face<'_> {
        self.face.as_face_ref()
    }

    /// Scale from font units to the 1000-unit glyph space PDF expects.
    fn scale(&self) -> f32 {
        1000.0 / f32::from(self.face().units_per_em().max(1))
    }

    fn glyph(&self, c: char) -> u16 {
        self.face().glyph_index(c).map(|g| g.0).unwrap_or(0)
    }

    fn advance(&self, glyph: u16) -> f32 {
        self.face()
            .glyph_hor_advance(GlyphId(glyph))
            .map(|w| f32::from(w) * self.scale())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub enum FieldFont {
    Standard,
    Embedded(EmbeddedFont),
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722, 667,
    611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500,
    222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// WinAnsi has no double-acute letters; they fall back to their umlaut forms.
fn transliterate(c: char) -> char {
    match c {
        'ő' => 'ö',
        'Ő' => 'Ö',
        'ű' => 'ü',
        'Ű' => 'Ü',
        '–' | '—' => '-',
        '„' | '”' | '“' => '"',
        '’' | '‘' => '\'',
        other => other,
    }
}

/// Latin-1 letters map to their own code in WinAnsi; 0x80..0x9F is not Latin-1 there.
fn winansi_byte(c: char) -> u8 {
    let c = transliterate(c);
    match c as u32 {
        code @ 0x20..=0x7E => code as u8,
        code @ 0xA0..=0xFF => code as u8,
        _ => b'?',
    }
}

fn helvetica_width(byte: u8) -> f32 {
    let base = match byte {
        0x20..=0x7E => byte,
        // Accented Latin-1 letters take the width of their lowercase/uppercase base
        0xC0..=0xDE => b'A',
        0xDF..=0xFF => b'a',
        _ => b'n',
    };
    f32::from(HELVETICA_WIDTHS[(base - 0x20) as usize])
}

impl FieldFont {
    /// Ascent and descent in 1/1000 em.
    pub fn vertical_metrics(&self) -> (f32, f32) {
        match self {
            FieldFont::Standard => (718.0, -207.0),
            FieldFont::Embedded(font) => {
                let face = font.face();
                (
                    f32::from(face.ascender()) * font.scale(),
                    f32::from(face.descender()) * font.scale(),
                )
            }
        }
    }

    /// Width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = match self {
            FieldFont::Standard => text.chars().map(|c| helvetica_width(winansi_byte(c))).sum(),
            FieldFont::Embedded(font) => text.chars().map(|c| font.advance(font.glyph(c))).sum(),
        };
        units * size / 1000.0
    }
}

/// A font as used inside one PDF document: its reserved object id plus the
/// glyphs drawn so far, which decide the widths and ToUnicode entries written
/// by [`DocumentFont::finish`].
pub struct DocumentFont<'f> {
    font: &'f FieldFont,
    id: ObjectId,
    used: BTreeMap<u16, char>,
    missing: Vec<char>,
}

impl<'f> DocumentFont<'f> {
    pub fn reserve(doc: &mut Document, font: &'f FieldFont) -> Self {
        Self {
            font,
            id: doc.new_object_id(),
            used: BTreeMap::new(),
            missing: Vec::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn font(&self) -> &FieldFont {
        self.font
    }

    /// Encodes `text` into the byte string a `Tj` operator expects for this font.
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        match self.font {
            FieldFont::Standard => text.chars().map(winansi_byte).collect(),
            FieldFont::Embedded(font) => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let glyph = font.glyph(c);
                    if glyph == 0 && !self.missing.contains(&c) {
                        self.missing.push(c);
                    }
                    self.used.entry(glyph).or_insert(c);
                    out.extend_from_slice(&glyph.to_be_bytes());
                }
                out
            }
        }
    }

    /// Inserts the font dictionary under the reserved id.
    pub fn finish(self, doc: &mut Document) -> Result<(), PdfError> {
        if !self.missing.is_empty() {
            tracing::warn!("Font has no glyph for {:?}; drawn as .notdef", self.missing);
        }
        let dict = match self.font {
            FieldFont::Standard => Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(b"Helvetica".to_vec())),
                ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ]),
            FieldFont::Embedded(font) => embed_type0(doc, font, &self.used),
        };
        doc.objects.insert(self.id, Object::Dictionary(dict));
        Ok(())
    }
}

const BASE_FONT: &[u8] = b"KitoltoEmbedded";

fn embed_type0(doc: &mut Document, font: &EmbeddedFont, used: &BTreeMap<u16, char>) -> Dictionary {
    let face = font.face();
    let scale = font.scale();
    let scaled = |v: i16| Object::Integer((f32::from(v) * scale).round() as i64);

    let font_file = Stream::new(
        Dictionary::from_iter(vec![("Length1", Object::Integer(font.bytes.len() as i64))]),
        font.bytes.as_ref().clone(),
    );
    let font_file_id = doc.add_object(font_file);

    let bbox = face.global_bounding_box();
    let descriptor = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"FontDescriptor".to_vec())),
        ("FontName", Object::Name(BASE_FONT.to_vec())),
        ("Flags", Object::Integer(32)),
        (
            "FontBBox",
            Object::Array(vec![
                scaled(bbox.x_min),
                scaled(bbox.y_min),
                scaled(bbox.x_max),
                scaled(bbox.y_max),
            ]),
        ),
        ("ItalicAngle", Object::Integer(0)),
        ("Ascent", scaled(face.ascender())),
        ("Descent", scaled(face.descender())),
        (
            "CapHeight",
            scaled(face.capital_height().unwrap_or(face.ascender())),
        ),
        ("StemV", Object::Integer(80)),
        ("FontFile2", Object::Reference(font_file_id)),
    ]);
    let descriptor_id = doc.add_object(descriptor);

    let mut widths = Vec::with_capacity(used.len() * 2);
    for glyph in used.keys() {
        widths.push(Object::Integer(i64::from(*glyph)));
        widths.push(Object::Array(vec![Object::Integer(
            font.advance(*glyph).round() as i64,
        )]));
    }

    let cid_font = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
        ("BaseFont", Object::Name(BASE_FONT.to_vec())),
        (
            "CIDSystemInfo",
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Registry", Object::String(b"Adobe".to_vec(), StringFormat::Literal)),
                ("Ordering", Object::String(b"Identity".to_vec(), StringFormat::Literal)),
                ("Supplement", Object::Integer(0)),
            ])),
        ),
        ("FontDescriptor", Object::Reference(descriptor_id)),
        ("W", Object::Array(widths)),
        ("DW", Object::Integer(1000)),
        ("CIDToGIDMap", Object::Name(b"Identity".to_vec())),
    ]);
    let cid_font_id = doc.add_object(cid_font);

    let to_unicode = Stream::new(Dictionary::new(), to_unicode_cmap(used).into_bytes());
    let to_unicode_id = doc.add_object(to_unicode);

    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type0".to_vec())),
        ("BaseFont", Object::Name(BASE_FONT.to_vec())),
        ("Encoding", Object::Name(b"Identity-H".to_vec())),
        ("DescendantFonts", Object::Array(vec![Object::Reference(cid_font_id)])),
        ("ToUnicode", Object::Reference(to_unicode_id)),
    ])
}

/// ToUnicode CMap for the glyphs in `used`. `bfchar` blocks hold at most 100 entries.
pub(crate) fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().filter(|(glyph, _)| **glyph != 0).collect();
    for block in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for (glyph, c) in block {
            let mut utf16 = [0u16; 2];
            let unicode: String = c
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            cmap.push_str(&format!("<{glyph:04X}> <{unicode}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winansi_transliterates_double_acute() {
        assert_eq!(winansi_byte('ő'), 0xF6);
        assert_eq!(winansi_byte('Ű'), 0xDC);
        assert_eq!(winansi_byte('é'), 0xE9);
        assert_eq!(winansi_byte('A'), b'A');
        assert_eq!(winansi_byte('€'), b'?');
    }

    #[test]
    fn test_standard_width_matches_helvetica() {
        // "AB" = 667 + 667
        let width = FieldFont::Standard.text_width("AB", 10.0);
        assert!((width - 13.34).abs() < 0.001, "got {width}");
    }

    #[test]
    fn test_standard_encoding_is_single_byte() {
        let mut doc = Document::with_version("1.5");
        let font = FieldFont::Standard;
        let mut doc_font = DocumentFont::reserve(&mut doc, &font);
        assert_eq!(doc_font.encode("Kő"), vec![b'K', 0xF6]);
        doc_font.finish(&mut doc).unwrap();
    }

    #[test]
    fn test_standard_font_dictionary_is_inserted() {
        let mut doc = Document::with_version("1.5");
        let font = FieldFont::Standard;
        let doc_font = DocumentFont::reserve(&mut doc, &font);
        let id = doc_font.id();
        doc_font.finish(&mut doc).unwrap();
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }

    #[test]
    fn test_cmap_skips_notdef_and_chunks_blocks() {
        let mut used = BTreeMap::new();
        used.insert(0u16, '?');
        for i in 1..=150u16 {
            used.insert(i, 'a');
        }
        used.insert(200, 'ő');
        let cmap = to_unicode_cmap(&used);
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("51 beginbfchar"));
        assert!(cmap.contains("<00C8> <0151>"));
        assert!(!cmap.contains("<0000> <003F>"));
    }

    const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

    fn dejavu() -> EmbeddedFont {
        EmbeddedFont::from_bytes(DEJAVU_SANS.to_vec()).unwrap()
    }

    /// The Type0 dictionary written under `id` and its CIDFontType2 descendant.
    fn type0_parts(doc: &Document, id: ObjectId) -> (&Dictionary, &Dictionary) {
        let type0 = doc.get_dictionary(id).unwrap();
        let descendant = type0.get(b"DescendantFonts").unwrap().as_array().unwrap()[0]
            .as_reference()
            .unwrap();
        (type0, doc.get_dictionary(descendant).unwrap())
    }

    #[test]
    fn test_embedded_encoding_uses_glyph_ids() {
        let embedded = dejavu();
        let gid = embedded.glyph('ő');
        assert_ne!(gid, 0, "DejaVu Sans covers Hungarian");

        let font = FieldFont::Embedded(embedded);
        let mut doc = Document::with_version("1.5");
        let mut doc_font = DocumentFont::reserve(&mut doc, &font);
        assert_eq!(doc_font.encode("ő"), gid.to_be_bytes().to_vec());
        assert!(doc_font.missing.is_empty());
    }

    #[test]
    fn test_embedded_width_follows_advances() {
        let embedded = dejavu();
        let expected = (embedded.advance(embedded.glyph('G')) + embedded.advance(embedded.glyph('ő')))
            * 10.0
            / 1000.0;
        let font = FieldFont::Embedded(embedded);
        let width = font.text_width("Gő", 10.0);
        assert!(width > 0.0);
        assert!((width - expected).abs() < 0.001, "got {width}, want {expected}");
    }

    #[test]
    fn test_embedded_font_writes_widths_and_unicode_map() {
        let embedded = dejavu();
        let gid = embedded.glyph('ő');
        let font = FieldFont::Embedded(embedded);
        let mut doc = Document::with_version("1.5");
        let mut doc_font = DocumentFont::reserve(&mut doc, &font);
        doc_font.encode("Győr");
        let id = doc_font.id();
        doc_font.finish(&mut doc).unwrap();

        let (type0, cid_font) = type0_parts(&doc, id);
        assert_eq!(type0.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
        assert_eq!(cid_font.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");

        let widths = cid_font.get(b"W").unwrap().as_array().unwrap();
        let listed: Vec<i64> = widths.iter().step_by(2).map(|o| o.as_i64().unwrap()).collect();
        assert_eq!(listed.len(), 4, "one entry per distinct glyph of 'Győr'");
        assert!(listed.contains(&i64::from(gid)));

        let descriptor = cid_font.get(b"FontDescriptor").unwrap().as_reference().unwrap();
        let descriptor = doc.get_dictionary(descriptor).unwrap();
        let font_file = descriptor.get(b"FontFile2").unwrap().as_reference().unwrap();
        let font_file = doc.get_object(font_file).unwrap().as_stream().unwrap();
        assert_eq!(font_file.content.len(), DEJAVU_SANS.len());

        let to_unicode = type0.get(b"ToUnicode").unwrap().as_reference().unwrap();
        let cmap = doc.get_object(to_unicode).unwrap().as_stream().unwrap();
        let cmap = String::from_utf8_lossy(&cmap.content);
        assert!(cmap.contains(&format!("<{gid:04X}> <0151>")), "{cmap}");
    }

    #[test]
    fn test_embedded_font_tracks_missing_glyphs() {
        let font = FieldFont::Embedded(dejavu());
        let mut doc = Document::with_version("1.5");
        let mut doc_font = DocumentFont::reserve(&mut doc, &font);
        let encoded = doc_font.encode("A\u{10FFFD}");
        assert_eq!(&encoded[2..], &[0, 0]);
        assert_eq!(doc_font.missing, vec!['\u{10FFFD}']);
        doc_font.finish(&mut doc).unwrap();
    }

    #[test]
    fn test_unparseable_font_rejected() {
        assert!(matches!(
            EmbeddedFont::from_bytes(b"not a font".to_vec()),
            Err(PdfError::Font(_))
        ));
    }

    #[test]
    fn test_empty_font_bytes_rejected() {
        assert!(matches!(
            EmbeddedFont::from_bytes(Vec::new()),
            Err(PdfError::Font(_))
        ));
    }
}
