//! Page-by-page concatenation of independent documents.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::pdf::PdfError;

const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];
const MAX_TREE_DEPTH: usize = 32;

/// Copies attributes a page inherits from its `/Pages` ancestors onto the page
/// itself, so the page survives being moved under a new parent.
fn materialise_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfError> {
    let mut missing: Vec<&[u8]> = {
        let page = doc.get_dictionary(page_id)?;
        INHERITABLE.iter().copied().filter(|key| !page.has(key)).collect()
    };
    let mut inherited = Vec::new();
    let mut parent = doc
        .get_dictionary(page_id)?
        .get(b"Parent")
        .ok()
        .and_then(|p| p.as_reference().ok());

    let mut depth = 0;
    while let (Some(node_id), false) = (parent, missing.is_empty()) {
        let node = doc.get_dictionary(node_id)?;
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(PdfError::Malformed("page tree too deep".to_string()));
        }
    }

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

fn is_structural(obj: &Object) -> bool {
    let Ok(dict) = obj.as_dict() else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog") | Ok(b"Pages")
    )
}

/// Concatenates `documents` in order into a single document. One document is
/// returned as is; an empty list is an error.
pub fn merge_documents(documents: Vec<Document>) -> Result<Document, PdfError> {
    let mut documents = documents.into_iter();
    let Some(first) = documents.next() else {
        return Err(PdfError::Empty("nothing to merge".to_string()));
    };
    let rest: Vec<Document> = documents.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let mut merged = Document::with_version(first.version.clone());
    let mut page_ids = Vec::new();
    let mut next_id = 1;

    for mut doc in std::iter::once(first).chain(rest) {
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in &pages {
            materialise_inherited(&mut doc, *page_id)?;
        }
        page_ids.extend(pages);

        merged
            .objects
            .extend(doc.objects.into_iter().filter(|(_, obj)| !is_structural(obj)));
    }
    merged.max_id = next_id;

    let pages_id = merged.new_object_id();
    for page_id in &page_ids {
        merged
            .get_object_mut(*page_id)?
            .as_dict_mut()?
            .set("Parent", Object::Reference(pages_id));
    }
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    merged.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = merged.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.prune_objects();
    merged.renumber_objects();
    Ok(merged)
}
