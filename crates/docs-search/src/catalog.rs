/// Loading and validation of the document catalog.
///
/// The catalog is a JSON array of `DocumentRecord` objects. Records are decoded one
/// at a time so that a malformed entry is reported by position and id instead of
/// as a bare serde error. The catalog is read once at startup and never mutated.
use std::collections::HashSet;
use std::path::Path;

use crate::error::AppError;
use crate::model::DocumentRecord;

/// The documentation site's own catalog, compiled into the binary.
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

pub fn builtin_catalog() -> Result<Vec<DocumentRecord>, AppError> {
    parse_catalog(BUILTIN_CATALOG)
}

pub fn load_catalog(path: &Path) -> Result<Vec<DocumentRecord>, AppError> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse and validate a JSON catalog.
pub fn parse_catalog(json: &str) -> Result<Vec<DocumentRecord>, AppError> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;

    let mut documents = Vec::with_capacity(raw.len());
    for (position, value) in raw.into_iter().enumerate() {
        let label = record_label(position, value.get("id").and_then(|v| v.as_str()));
        let document: DocumentRecord =
            serde_json::from_value(value).map_err(|e| AppError::Catalog {
                record: label,
                message: e.to_string(),
            })?;
        documents.push(document);
    }

    validate_catalog(&documents)?;
    Ok(documents)
}

/// Reject empty ids, empty titles and duplicate ids.
pub fn validate_catalog(documents: &[DocumentRecord]) -> Result<(), AppError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(documents.len());

    for (position, doc) in documents.iter().enumerate() {
        let id = doc.id.trim();
        if id.is_empty() {
            return Err(AppError::Catalog {
                record: record_label(position, None),
                message: "id must not be empty".to_string(),
            });
        }
        if doc.title.trim().is_empty() {
            return Err(AppError::Catalog {
                record: record_label(position, Some(id)),
                message: "title must not be empty".to_string(),
            });
        }
        if !seen.insert(doc.id.as_str()) {
            return Err(AppError::Catalog {
                record: record_label(position, Some(id)),
                message: format!("duplicate id '{id}'"),
            });
        }
    }

    Ok(())
}

fn record_label(position: usize, id: Option<&str>) -> String {
    match id {
        Some(id) if !id.trim().is_empty() => format!("#{position} ('{id}')"),
        _ => format!("#{position}"),
    }
}
