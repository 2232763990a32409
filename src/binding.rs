//! Per-file binding of condition fields to header values.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::expr::FieldSet;
use crate::header::HeaderRecord;
use crate::value::Value;

/// Values bound for one file, one per referenced field.
///
/// Only [`resolve`] builds this, and only when every field was found, so an
/// environment handed to the evaluator is always complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingEnvironment {
    values: BTreeMap<String, Value>,
}

impl BindingEnvironment {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Referenced fields absent from a file's header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing header keywords: {}", .names.join(", "))]
pub struct MissingFields {
    pub names: Vec<String>,
}

/// Bind every field in `fields` to its value in `record`.
///
/// # Errors
///
/// Returns every missing field name when at least one is absent.
pub fn resolve(fields: &FieldSet, record: &HeaderRecord) -> Result<BindingEnvironment, MissingFields> {
    let mut values = BTreeMap::new();
    let mut missing = Vec::new();

    for name in fields.iter() {
        match record.get(name) {
            Some(value) => {
                values.insert(name.to_owned(), value.clone());
            }
            None => missing.push(name.to_owned()),
        }
    }

    if missing.is_empty() {
        Ok(BindingEnvironment { values })
    } else {
        Err(MissingFields { names: missing })
    }
}
