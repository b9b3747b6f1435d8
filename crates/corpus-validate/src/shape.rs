use crate::ValidationError;
use corpus_model::{Locale, PageId};
use serde_json::Value;

/// Declared shape of a decoded JSON value.
///
/// Objects only constrain the fields they name; other fields pass through.
#[derive(Debug, Clone)]
pub enum Shape {
    Number,
    Str,
    /// A string that parses as a [`Locale`].
    Locale,
    Array(Box<Shape>),
    Object(Vec<(&'static str, Shape)>),
    /// An object keyed by numeric page ids, every value of the same shape.
    PageMap { value: Box<Shape>, min_len: usize },
}

impl Shape {
    pub fn array(item: Shape) -> Self {
        Shape::Array(Box::new(item))
    }

    pub fn object<const N: usize>(fields: [(&'static str, Shape); N]) -> Self {
        Shape::Object(fields.into())
    }

    pub fn page_map(value: Shape, min_len: usize) -> Self {
        Shape::PageMap {
            value: Box::new(value),
            min_len,
        }
    }

    /// Check `value` against this shape, stopping at the first mismatch.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        self.check_at(value, "$")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        match self {
            Shape::Number => expect(value.is_number(), "number", value, path),
            Shape::Str => expect(value.is_string(), "string", value, path),
            Shape::Locale => {
                let Some(code) = value.as_str() else {
                    return expect(false, "locale string", value, path);
                };
                Locale::parse(code)
                    .map(|_| ())
                    .map_err(|source| ValidationError::InvalidLocale {
                        path: path.to_string(),
                        source,
                    })
            }
            Shape::Array(item) => {
                let Some(items) = value.as_array() else {
                    return expect(false, "array", value, path);
                };
                for (i, v) in items.iter().enumerate() {
                    item.check_at(v, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            Shape::Object(fields) => {
                let Some(map) = value.as_object() else {
                    return expect(false, "object", value, path);
                };
                for (name, shape) in fields {
                    let field_path = format!("{path}.{name}");
                    match map.get(*name) {
                        Some(v) => shape.check_at(v, &field_path)?,
                        None => return Err(ValidationError::MissingField { path: field_path }),
                    }
                }
                Ok(())
            }
            Shape::PageMap { value: item, min_len } => {
                let Some(map) = value.as_object() else {
                    return expect(false, "object", value, path);
                };
                if map.len() < *min_len {
                    return Err(ValidationError::EmptyRecord {
                        path: path.to_string(),
                    });
                }
                for (key, v) in map {
                    if PageId::parse(key).is_none() {
                        return Err(ValidationError::NonNumericKey {
                            path: path.to_string(),
                            key: key.clone(),
                        });
                    }
                    item.check_at(v, &format!("{path}.{key}"))?;
                }
                Ok(())
            }
        }
    }
}

fn expect(ok: bool, expected: &'static str, found: &Value, path: &str) -> Result<(), ValidationError> {
    if ok {
        return Ok(());
    }
    Err(ValidationError::WrongType {
        path: path.to_string(),
        expected,
        found: type_name(found),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
