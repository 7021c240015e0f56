//! AcroForm access: field lookup, text field filling with regenerated
//! appearance streams, and flattening widgets into page content.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use tracing::warn;

use crate::pdf::font::DocumentFont;
use crate::pdf::PdfError;

/// Field flag bit 13: multi-line text field.
const FF_MULTILINE: i64 = 1 << 12;
/// Annotation flag bit 2: hidden.
const F_HIDDEN: i64 = 1 << 1;
const MAX_FIELD_DEPTH: usize = 32;
const PADDING: f32 = 2.0;
const MIN_FONT_SIZE: f32 = 6.0;
const APPEARANCE_FONT: &str = "KF0";
/// Line spacing as a multiple of the font's ascent-to-descent height.
const LEADING: f32 = 1.1;
const SHRINK_STEP: f32 = 0.5;

/// A terminal form field and the widget annotations that display it.
#[derive(Debug, Clone)]
pub struct FormField {
    /// Fully qualified name, parts joined with `.`.
    pub name: String,
    pub id: ObjectId,
    pub field_type: Option<Vec<u8>>,
    pub flags: i64,
    /// Text alignment: 0 left, 1 centred, 2 right.
    pub quadding: i64,
    pub widgets: Vec<ObjectId>,
}

impl FormField {
    pub fn is_text(&self) -> bool {
        self.field_type.as_deref() == Some(b"Tx".as_slice())
    }

    fn is_multiline(&self) -> bool {
        self.flags & FF_MULTILINE != 0
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, PdfError> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn integer(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key) {
        Ok(Object::Integer(i)) => Some(*i),
        _ => None,
    }
}

fn references(doc: &Document, obj: Option<&Object>) -> Result<Vec<ObjectId>, PdfError> {
    let Some(obj) = obj else {
        return Ok(Vec::new());
    };
    match resolve(doc, obj)? {
        Object::Array(items) => Ok(items
            .iter()
            .filter_map(|o| o.as_reference().ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Normalised `[x1 y1 x2 y2]` with x1 <= x2 and y1 <= y2.
fn rectangle(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let items = resolve(doc, obj).ok()?.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let v: Vec<f32> = items
        .iter()
        .filter_map(|o| resolve(doc, o).ok().and_then(number))
        .collect();
    if v.len() != 4 {
        return None;
    }
    Some([v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])])
}

/// Decodes a PDF text string: UTF-16BE with BOM, otherwise single-byte.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|b| char::from(*b)).collect()
    }
}

/// Encodes a field value: plain ASCII stays literal, anything else becomes UTF-16BE.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn catalog_id(doc: &Document) -> Result<ObjectId, PdfError> {
    Ok(doc.trailer.get(b"Root")?.as_reference()?)
}

#[derive(Clone, Copy, Default)]
struct Inherited<'a> {
    field_type: Option<&'a [u8]>,
    flags: Option<i64>,
    quadding: Option<i64>,
}

/// Collects every terminal field of the document's AcroForm. A document
/// without a form yields an empty list.
pub fn collect_fields(doc: &Document) -> Result<Vec<FormField>, PdfError> {
    let catalog = doc.get_dictionary(catalog_id(doc)?)?;
    let Ok(acroform) = catalog.get(b"AcroForm") else {
        return Ok(Vec::new());
    };
    let acroform = resolve(doc, acroform)?.as_dict()?;
    let inherited = Inherited {
        quadding: integer(acroform, b"Q"),
        ..Default::default()
    };

    let mut fields = Vec::new();
    for root in references(doc, acroform.get(b"Fields").ok())? {
        visit_field(doc, root, "", inherited, &mut fields, 0)?;
    }
    Ok(fields)
}

fn visit_field<'a>(
    doc: &'a Document,
    id: ObjectId,
    parent: &str,
    inherited: Inherited<'a>,
    out: &mut Vec<FormField>,
    depth: usize,
) -> Result<(), PdfError> {
    if depth > MAX_FIELD_DEPTH {
        return Err(PdfError::Malformed(format!(
            "form field tree deeper than {MAX_FIELD_DEPTH}"
        )));
    }
    let dict = doc.get_dictionary(id)?;

    let partial = match dict.get(b"T") {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    };
    let name = match partial {
        Some(p) if parent.is_empty() => p,
        Some(p) => format!("{parent}.{p}"),
        None => parent.to_string(),
    };

    let inherited = Inherited {
        field_type: dict
            .get(b"FT")
            .ok()
            .and_then(|o| o.as_name().ok())
            .or(inherited.field_type),
        flags: integer(dict, b"Ff").or(inherited.flags),
        quadding: integer(dict, b"Q").or(inherited.quadding),
    };

    let kids = references(doc, dict.get(b"Kids").ok())?;
    let mut widgets = Vec::new();
    let mut children = Vec::new();
    for kid in kids.iter().copied() {
        if doc.get_dictionary(kid)?.has(b"T") {
            children.push(kid);
        } else {
            widgets.push(kid);
        }
    }
    if kids.is_empty() {
        widgets.push(id);
    }

    if !widgets.is_empty() {
        out.push(FormField {
            name: name.clone(),
            id,
            field_type: inherited.field_type.map(<[u8]>::to_vec),
            flags: inherited.flags.unwrap_or(0),
            quadding: inherited.quadding.unwrap_or(0),
            widgets,
        });
    }
    for child in children {
        visit_field(doc, child, &name, inherited, out, depth + 1)?;
    }
    Ok(())
}

/// Breaks `text` into lines no wider than `max_width`, honouring explicit newlines.
fn wrap_lines(font: &DocumentFont<'_>, text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if !current.is_empty() && font.font().text_width(&candidate, size) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

fn format_number(value: f32) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Builds the content of a text widget's normal appearance of size `width` x `height`.
pub fn text_appearance(
    font: &mut DocumentFont<'_>,
    field: &FormField,
    value: &str,
    width: f32,
    height: f32,
    font_size: f32,
) -> String {
    let (ascent, descent) = font.font().vertical_metrics();
    let line_height = |size: f32| (ascent - descent) * size / 1000.0;
    let inner_width = (width - 2.0 * PADDING).max(1.0);

    let mut size = font_size;
    if line_height(size) > height {
        size = height * 1000.0 / (ascent - descent);
    }

    let lines = if field.is_multiline() {
        let available = (height - 2.0 * PADDING).max(0.0);
        let block_height = |lines: usize, size: f32| lines as f32 * line_height(size) * LEADING;
        let mut lines = wrap_lines(font, value, size, inner_width);
        while size > MIN_FONT_SIZE && block_height(lines.len(), size) > available {
            size = (size - SHRINK_STEP).max(MIN_FONT_SIZE);
            lines = wrap_lines(font, value, size, inner_width);
        }
        if block_height(lines.len(), size) > available {
            warn!(
                "Field '{}' overflows its box at {MIN_FONT_SIZE} pt ({} lines)",
                field.name,
                lines.len()
            );
        }
        lines
    } else {
        let single = value.replace(['\r', '\n'], " ");
        let text_width = font.font().text_width(&single, size);
        if text_width > inner_width {
            size *= inner_width / text_width;
        }
        vec![single]
    };
    let size = size.max(MIN_FONT_SIZE);

    let mut content = format!("/Tx BMC\nq\nBT\n/{APPEARANCE_FONT} {} Tf\n0 g\n", format_number(size));
    let leading = line_height(size) * LEADING;
    let first_baseline = if field.is_multiline() {
        height - PADDING - ascent * size / 1000.0
    } else {
        (height - line_height(size)) / 2.0 - descent * size / 1000.0
    };

    for (i, line) in lines.iter().enumerate() {
        let text_width = font.font().text_width(line, size);
        let x = match field.quadding {
            1 => (width - text_width) / 2.0,
            2 => width - PADDING - text_width,
            _ => PADDING,
        };
        let y = first_baseline - i as f32 * leading;
        let encoded = font.encode(line);
        content.push_str(&format!(
            "1 0 0 1 {} {} Tm\n<{}> Tj\n",
            format_number(x),
            format_number(y),
            hex(&encoded)
        ));
    }
    content.push_str("ET\nQ\nEMC\n");
    content
}

/// Sets a text field's value and regenerates the appearance of every widget.
pub fn fill_text_field(
    doc: &mut Document,
    field: &FormField,
    value: &str,
    font: &mut DocumentFont<'_>,
    font_size: f32,
) -> Result<(), PdfError> {
    if !field.is_text() {
        return Err(PdfError::NotTextField(field.name.clone()));
    }

    let mut appearances = Vec::with_capacity(field.widgets.len());
    for widget in &field.widgets {
        let rect = doc
            .get_dictionary(*widget)?
            .get(b"Rect")
            .ok()
            .and_then(|r| rectangle(doc, r))
            .ok_or_else(|| PdfError::Malformed(format!("widget of '{}' has no Rect", field.name)))?;
        let (width, height) = (rect[2] - rect[0], rect[3] - rect[1]);
        let content = text_appearance(font, field, value, width, height, font_size);

        let stream = Stream::new(
            Dictionary::from_iter(vec![
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Form".to_vec())),
                (
                    "BBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(width as _),
                        Object::Real(height as _),
                    ]),
                ),
                (
                    "Resources",
                    Object::Dictionary(Dictionary::from_iter(vec![(
                        "Font",
                        Object::Dictionary(Dictionary::from_iter(vec![(
                            APPEARANCE_FONT,
                            Object::Reference(font.id()),
                        )])),
                    )])),
                ),
            ]),
            content.into_bytes(),
        );
        appearances.push((*widget, doc.add_object(stream)));
    }

    doc.get_object_mut(field.id)?
        .as_dict_mut()?
        .set("V", encode_text_string(value));
    for (widget, appearance) in appearances {
        doc.get_object_mut(widget)?.as_dict_mut()?.set(
            "AP",
            Object::Dictionary(Dictionary::from_iter(vec![("N", Object::Reference(appearance))])),
        );
    }
    Ok(())
}

/// The normal appearance stream of a widget, picking the `/AS` state when
/// `/N` is a state dictionary.
fn normal_appearance(doc: &Document, widget: &Dictionary) -> Option<ObjectId> {
    let ap = resolve(doc, widget.get(b"AP").ok()?).ok()?.as_dict().ok()?;
    let normal = ap.get(b"N").ok()?;
    let normal_id = normal.as_reference().ok();
    match resolve(doc, normal).ok()? {
        Object::Stream(_) => normal_id,
        Object::Dictionary(states) => {
            let state = widget.get(b"AS").ok()?.as_name().ok()?;
            states.get(state).ok()?.as_reference().ok()
        }
        _ => None,
    }
}

/// The appearance's `/Matrix`, identity when absent or malformed.
fn form_matrix(doc: &Document, dict: &Dictionary) -> [f32; 6] {
    const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let Some(items) = dict
        .get(b"Matrix")
        .ok()
        .and_then(|m| resolve(doc, m).ok())
        .and_then(|m| m.as_array().ok())
    else {
        return IDENTITY;
    };
    let values: Vec<f32> = items
        .iter()
        .filter_map(|o| resolve(doc, o).ok().and_then(number))
        .collect();
    <[f32; 6]>::try_from(values).unwrap_or(IDENTITY)
}

/// Bounding box of `bbox` after transformation by `m`.
fn transformed_bbox(bbox: [f32; 4], m: [f32; 6]) -> [f32; 4] {
    let corners = [
        (bbox[0], bbox[1]),
        (bbox[2], bbox[1]),
        (bbox[0], bbox[3]),
        (bbox[2], bbox[3]),
    ];
    let mut out = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
    for (x, y) in corners {
        let tx = m[0] * x + m[2] * y + m[4];
        let ty = m[1] * x + m[3] * y + m[5];
        out = [out[0].min(tx), out[1].min(ty), out[2].max(tx), out[3].max(ty)];
    }
    out
}

/// Page-space `cm` operands that land the appearance on the widget Rect.
/// `Do` applies the form's own `/Matrix`, so only the mapping from the
/// transformed BBox onto the Rect is returned.
fn placement(doc: &Document, appearance: ObjectId, rect: [f32; 4]) -> Option<[f32; 6]> {
    let stream = doc.get_object(appearance).ok()?.as_stream().ok()?;
    let bbox = stream
        .dict
        .get(b"BBox")
        .ok()
        .and_then(|b| rectangle(doc, b))
        .unwrap_or([0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]]);
    let bbox = transformed_bbox(bbox, form_matrix(doc, &stream.dict));
    let (bw, bh) = (bbox[2] - bbox[0], bbox[3] - bbox[1]);
    let sx = if bw.abs() > f32::EPSILON { (rect[2] - rect[0]) / bw } else { 1.0 };
    let sy = if bh.abs() > f32::EPSILON { (rect[3] - rect[1]) / bh } else { 1.0 };
    Some([sx, 0.0, 0.0, sy, rect[0] - bbox[0] * sx, rect[1] - bbox[1] * sy])
}

struct FlattenedWidget {
    name: String,
    appearance: ObjectId,
    matrix: [f32; 6],
}

/// Paints every visible widget appearance into its page, removes widgets from
/// the pages and drops the AcroForm. Unreferenced form objects are pruned.
pub fn flatten(doc: &mut Document) -> Result<usize, PdfError> {
    let mut painted = 0;

    for (_, page_id) in doc.get_pages() {
        let annots = references(doc, doc.get_dictionary(page_id)?.get(b"Annots").ok())?;
        if annots.is_empty() {
            continue;
        }

        let mut kept = Vec::new();
        let mut drawn = Vec::new();
        for annot in annots {
            let dict = doc.get_dictionary(annot)?;
            let is_widget = dict
                .get(b"Subtype")
                .ok()
                .and_then(|s| s.as_name().ok())
                == Some(b"Widget".as_slice());
            if !is_widget {
                kept.push(Object::Reference(annot));
                continue;
            }
            if integer(dict, b"F").unwrap_or(0) & F_HIDDEN != 0 {
                continue;
            }
            let Some(rect) = dict.get(b"Rect").ok().and_then(|r| rectangle(doc, r)) else {
                continue;
            };
            let Some(appearance) = normal_appearance(doc, dict) else {
                continue;
            };
            if let Some(matrix) = placement(doc, appearance, rect) {
                drawn.push(FlattenedWidget {
                    name: format!("FlatW{}_{}", annot.0, annot.1),
                    appearance,
                    matrix,
                });
            }
        }

        if !drawn.is_empty() {
            let mut ops = String::new();
            for widget in &drawn {
                let m: Vec<String> = widget.matrix.iter().map(|v| format_number(*v)).collect();
                ops.push_str(&format!("q\n{} cm\n/{} Do\nQ\n", m.join(" "), widget.name));
            }
            let xobjects: Vec<(String, ObjectId)> = drawn
                .iter()
                .map(|w| (w.name.clone(), w.appearance))
                .collect();
            add_page_xobjects(doc, page_id, &xobjects)?;
            append_page_content(doc, page_id, ops.into_bytes())?;
            painted += drawn.len();
        }

        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        if kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", Object::Array(kept));
        }
    }

    let catalog = catalog_id(doc)?;
    doc.get_object_mut(catalog)?.as_dict_mut()?.remove(b"AcroForm");
    doc.prune_objects();
    Ok(painted)
}

/// Resources a page inherits from its ancestors in the page tree.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?.get(b"Parent").ok()?.as_reference().ok();
    let mut depth = 0;
    while let Some(node_id) = current {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources).ok()?.as_dict().ok().cloned();
        }
        depth += 1;
        if depth > MAX_FIELD_DEPTH {
            return None;
        }
        current = node.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
    }
    None
}

/// Where a dictionary entry lives relative to its owner.
enum Entry {
    Shared(ObjectId),
    Inline,
    Missing,
}

fn entry(dict: &Dictionary, key: &[u8]) -> Entry {
    match dict.get(key) {
        Ok(Object::Reference(id)) => Entry::Shared(*id),
        Ok(Object::Dictionary(_)) => Entry::Inline,
        _ => Entry::Missing,
    }
}

fn add_page_xobjects(
    doc: &mut Document,
    page_id: ObjectId,
    xobjects: &[(String, ObjectId)],
) -> Result<(), PdfError> {
    // Inherited resources are copied onto the page before being extended.
    let resources_ref = match entry(doc.get_dictionary(page_id)?, b"Resources") {
        Entry::Shared(id) => Some(id),
        Entry::Inline => None,
        Entry::Missing => {
            let inherited = inherited_resources(doc, page_id).unwrap_or_else(Dictionary::new);
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", Object::Dictionary(inherited));
            None
        }
    };

    let resources = page_resources_mut(doc, page_id, resources_ref)?;
    let xobject_ref = match entry(resources, b"XObject") {
        Entry::Shared(id) => Some(id),
        Entry::Inline => None,
        Entry::Missing => {
            resources.set("XObject", Object::Dictionary(Dictionary::new()));
            None
        }
    };

    let target = match xobject_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => page_resources_mut(doc, page_id, resources_ref)?
            .get_mut(b"XObject")?
            .as_dict_mut()?,
    };
    for (name, id) in xobjects {
        target.set(name.as_str(), Object::Reference(*id));
    }
    Ok(())
}

fn page_resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    resources_ref: Option<ObjectId>,
) -> Result<&mut Dictionary, PdfError> {
    match resources_ref {
        Some(id) => Ok(doc.get_object_mut(id)?.as_dict_mut()?),
        None => Ok(doc
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .get_mut(b"Resources")?
            .as_dict_mut()?),
    }
}

/// Appends `content` after the page's existing content, which is wrapped in
/// `q`/`Q` so its graphics state cannot leak into the appended operators.
fn append_page_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<(), PdfError> {
    let mut contents: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let prefix = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut suffix_bytes = b"\nQ\n".to_vec();
    suffix_bytes.extend_from_slice(&content);
    let suffix = doc.add_object(Stream::new(Dictionary::new(), suffix_bytes));

    contents.insert(0, Object::Reference(prefix));
    contents.push(Object::Reference(suffix));
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}
