//! Interactive-form value injection.
//!
//! Fields are matched by name against the profile mapping. Any failure
//! here (no AcroForm, no matching names) is the caller's signal to fall
//! back to the flat overlay path for the whole document.

use crate::error::{FormFillError, FormFillResult};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Sets `/V` on every AcroForm field whose name matches a profile key and
/// flags the form for appearance regeneration.
///
/// Returns the number of fields filled; zero matches is an error so the
/// caller can fall back to the flat path.
pub fn fill_form_fields(
    doc: &mut Document,
    values: &BTreeMap<String, String>,
) -> FormFillResult<usize> {
    let (acroform_ref, field_ids) = locate_fields(doc)?;

    let mut filled = 0usize;
    for field_id in field_ids {
        let field = match doc.get_object_mut(field_id).and_then(Object::as_dict_mut) {
            Ok(d) => d,
            Err(_) => continue,
        };
        let name = match field.get(b"T") {
            Ok(Object::String(bytes, _)) => String::from_utf8_lossy(bytes).into_owned(),
            _ => continue,
        };
        if let Some(value) = values.get(&name) {
            field.set("V", Object::string_literal(value.clone()));
            // Stale appearance streams would keep showing the old value.
            field.remove(b"AP");
            filled += 1;
            log::debug!("filled form field '{}'", name);
        }
    }

    if filled == 0 {
        return Err(FormFillError::PdfProcessing {
            message: "no form field names match the profile".to_string(),
            page: None,
        });
    }

    set_need_appearances(doc, acroform_ref)?;
    Ok(filled)
}

/// Finds the AcroForm dictionary and collects its field object ids.
fn locate_fields(doc: &Document) -> FormFillResult<(Option<ObjectId>, Vec<ObjectId>)> {
    let catalog = doc.catalog()?;
    let acroform_entry = catalog
        .get(b"AcroForm")
        .map_err(|_| FormFillError::PdfProcessing {
            message: "document has no AcroForm".to_string(),
            page: None,
        })?;

    let (acroform_ref, fields_obj) = match acroform_entry {
        Object::Reference(id) => {
            let dict = doc.get_object(*id)?.as_dict()?;
            (Some(*id), dict.get(b"Fields").map(|o| o.clone()))
        }
        Object::Dictionary(dict) => (None, dict.get(b"Fields").map(|o| o.clone())),
        _ => {
            return Err(FormFillError::PdfProcessing {
                message: "malformed AcroForm entry".to_string(),
                page: None,
            })
        }
    };

    let fields = match fields_obj {
        Ok(Object::Array(items)) => items,
        _ => {
            return Err(FormFillError::PdfProcessing {
                message: "AcroForm has no Fields array".to_string(),
                page: None,
            })
        }
    };

    let ids = fields
        .iter()
        .filter_map(|f| f.as_reference().ok())
        .collect();
    Ok((acroform_ref, ids))
}

fn set_need_appearances(doc: &mut Document, acroform_ref: Option<ObjectId>) -> FormFillResult<()> {
    match acroform_ref {
        Some(id) => {
            let dict = doc.get_object_mut(id)?.as_dict_mut()?;
            dict.set("NeedAppearances", Object::Boolean(true));
        }
        None => {
            let root_id = doc.trailer.get(b"Root")?.as_reference()?;
            let catalog = doc.get_object_mut(root_id)?.as_dict_mut()?;
            let acroform = catalog.get_mut(b"AcroForm")?.as_dict_mut()?;
            acroform.set("NeedAppearances", Object::Boolean(true));
        }
    }
    Ok(())
}
