use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{Error, FieldErrors, Result};
use crate::model::Id;

/// How an inbound body is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Replace,
    Patch,
}

impl WriteMode {
    fn requires_all(&self) -> bool {
        !matches!(self, WriteMode::Patch)
    }
}

/// A relation as clients may send it: a bare id or an object carrying one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RefInput {
    Id(Id),
    Object { id: Id },
}

impl RefInput {
    pub fn id(&self) -> Id {
        match self {
            RefInput::Id(id) | RefInput::Object { id } => *id,
        }
    }
}

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";

/// Inbound JSON object being applied onto a record.
///
/// Each accessor consumes its key and returns `None` when the client did
/// not send it; malformed values are recorded against the field and also
/// yield `None`.
#[derive(Debug)]
pub struct Input {
    fields: Map<String, Value>,
    errors: FieldErrors,
}

impl Input {
    /// Check the body's shape against a field list before any value is read.
    pub fn parse(
        body: Value,
        fields: &[&str],
        read_only: &[&str],
        required: &[&str],
        mode: WriteMode,
    ) -> Result<Self> {
        let Value::Object(mut map) = body else {
            return Err(Error::field("non_field_errors", "Expected a JSON object."));
        };
        map.retain(|key, _| !read_only.contains(&key.as_str()));

        let mut errors = FieldErrors::new();
        for key in map.keys() {
            if !fields.contains(&key.as_str()) {
                errors.add(key.clone(), "Unknown field.");
            }
        }
        if mode.requires_all() {
            for field in required {
                if !map.contains_key(*field) {
                    errors.add(*field, REQUIRED);
                }
            }
        }
        errors.into_result()?;

        Ok(Self {
            fields: map,
            errors: FieldErrors::new(),
        })
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn take<T: DeserializeOwned>(&mut self, field: &str) -> Option<T> {
        let value = self.fields.remove(field)?;
        if value.is_null() {
            self.error(field, NOT_NULL);
            return None;
        }
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.error(field, format!("Invalid value: {}", e));
                None
            }
        }
    }

    /// Free text. `null` is stored as the empty string.
    pub fn text(&mut self, field: &str) -> Option<String> {
        match self.fields.get(field) {
            Some(Value::Null) => {
                self.fields.remove(field);
                Some(String::new())
            }
            Some(Value::String(_)) => self.take(field),
            Some(_) => {
                self.fields.remove(field);
                self.error(field, "Not a valid string.");
                None
            }
            None => None,
        }
    }

    pub fn choice<T: FromStr<Err = String>>(&mut self, field: &str) -> Option<T> {
        let raw: String = self.take(field)?;
        match raw.parse() {
            Ok(choice) => Some(choice),
            Err(message) => {
                self.error(field, message);
                None
            }
        }
    }

    /// Optional relation: `Some(None)` when the client cleared it.
    pub fn relation(&mut self, field: &str) -> Option<Option<Id>> {
        match self.fields.get(field) {
            Some(Value::Null) => {
                self.fields.remove(field);
                Some(None)
            }
            Some(_) => self.take::<RefInput>(field).map(|r| Some(r.id())),
            None => None,
        }
    }

    pub fn required_relation(&mut self, field: &str) -> Option<Id> {
        self.take::<RefInput>(field).map(|r| r.id())
    }

    pub fn relations(&mut self, field: &str) -> Option<Vec<Id>> {
        self.take::<Vec<RefInput>>(field)
            .map(|refs| refs.iter().map(RefInput::id).collect())
    }

    /// Fail with every error recorded while applying.
    pub fn finish(self) -> Result<()> {
        self.errors.into_result()
    }
}

/// Slugs are letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Six hexadecimal digits, no leading `#`.
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::generate_id;
    use serde_json::json;

    const FIELDS: &[&str] = &["id", "url", "name", "template", "peering", "tags"];
    const READ_ONLY: &[&str] = &["id", "url"];

    fn parse(body: Value, mode: WriteMode) -> Result<Input> {
        Input::parse(body, FIELDS, READ_ONLY, &["name", "peering"], mode)
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = parse(json!({"name": "x", "peering": generate_id(), "colour": "red"}), WriteMode::Create)
            .unwrap_err();
        match err {
            Error::Validation(fields) => assert!(fields.contains("colour")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_only_checked_on_full_writes() {
        assert!(parse(json!({"name": "x"}), WriteMode::Create).is_err());
        assert!(parse(json!({"name": "x"}), WriteMode::Replace).is_err());
        assert!(parse(json!({"name": "x"}), WriteMode::Patch).is_ok());
    }

    #[test]
    fn test_read_only_fields_are_dropped() {
        let mut input = parse(json!({"id": generate_id(), "url": "/x", "name": "a", "peering": generate_id()}), WriteMode::Create)
            .unwrap();
        assert_eq!(input.take::<Value>("id"), None);
        assert_eq!(input.text("name").as_deref(), Some("a"));
        assert!(input.finish().is_ok());
    }

    #[test]
    fn test_relations_accept_id_or_object() {
        let id = generate_id();
        let mut input = parse(json!({"template": {"id": id}, "peering": id, "tags": [id, {"id": id}]}), WriteMode::Patch)
            .unwrap();

        assert_eq!(input.relation("template"), Some(Some(id)));
        assert_eq!(input.required_relation("peering"), Some(id));
        assert_eq!(input.relations("tags"), Some(vec![id, id]));
        assert!(input.finish().is_ok());
    }

    #[test]
    fn test_null_clears_optional_but_not_required_relation() {
        let mut input = parse(json!({"template": null, "peering": null}), WriteMode::Patch).unwrap();

        assert_eq!(input.relation("template"), Some(None));
        assert_eq!(input.required_relation("peering"), None);
        match input.finish().unwrap_err() {
            Error::Validation(fields) => assert!(fields.contains("peering")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_slug_and_color_formats() {
        assert!(is_valid_slug("upstream_transit-1"));
        assert!(!is_valid_slug("up stream"));
        assert!(is_valid_color("ff00AA"));
        assert!(!is_valid_color("#ff00aa"));
    }
}
