//! Dotted-path field updates and equality filters.

use serde::Serialize;
use serde_json::{Map, Value};

use super::StoreError;

/// A set of field assignments addressed by dotted paths
/// (`"referral_details.referral_points"`).
///
/// Missing intermediate objects are created. Assignments apply in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Vec<(String, Value)>,
}

impl Patch {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Assign a JSON value to a path.
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    /// Assign any serializable value to a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn set_serialized<T: Serialize + ?Sized>(
        self,
        path: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(self.set(path, serde_json::to_value(value)?))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Paths touched by this patch, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(path, _)| path.as_str())
    }

    /// Apply every assignment to a document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAnObject` if the document is not an object and
    /// `StoreError::InvalidPath` if a path runs through a scalar or array. On
    /// error the document may hold the assignments made before the failing one.
    pub fn apply(&self, doc: &mut Value) -> Result<(), StoreError> {
        for (path, value) in &self.fields {
            set_path(doc, path, value.clone())?;
        }
        Ok(())
    }
}

fn set_path(doc: &mut Value, path: &str, value: Value) -> Result<(), StoreError> {
    let mut current = doc.as_object_mut().ok_or(StoreError::NotAnObject)?;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_owned(), value);
            return Ok(());
        }

        current = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidPath {
                path: path.to_owned(),
                segment: segment.to_owned(),
            })?;
    }

    Ok(())
}

/// Equality predicate on one (possibly nested) field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    path: String,
    value: Value,
}

impl FieldFilter {
    /// Match documents where `path` equals `value`.
    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Whether a document satisfies the predicate.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.path
            .split('.')
            .try_fold(doc, |node, segment| node.get(segment))
            .is_some_and(|found| *found == self.value)
    }

    /// The predicate as a nested object for `JSONB` containment (`@>`).
    ///
    /// `referral_details.referral_code = "REF-X"` becomes
    /// `{"referral_details": {"referral_code": "REF-X"}}`.
    #[must_use]
    pub fn containment(&self) -> Value {
        self.path
            .rsplit('.')
            .fold(self.value.clone(), |inner, segment| {
                let mut map = Map::new();
                map.insert(segment.to_owned(), inner);
                Value::Object(map)
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_patch_sets_nested_fields() {
        let mut doc = json!({"referral_details": {"referral_points": 5, "referrals_count": 1}});

        Patch::new()
            .set("referral_details.referral_points", 105)
            .set("subscription_status", "active")
            .apply(&mut doc)
            .unwrap();

        assert_eq!(
            doc,
            json!({
                "referral_details": {"referral_points": 105, "referrals_count": 1},
                "subscription_status": "active"
            })
        );
    }

    #[test]
    fn test_patch_creates_missing_parents() {
        let mut doc = json!({});
        Patch::new().set("a.b.c", true).apply(&mut doc).unwrap();
        assert_eq!(doc, json!({"a": {"b": {"c": true}}}));
    }

    #[test]
    fn test_patch_refuses_to_descend_into_scalars() {
        let mut doc = json!({"total_gallons": 40});
        let err = Patch::new()
            .set("total_gallons.extra", 1)
            .apply(&mut doc)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
    }

    #[test]
    fn test_patch_rejects_non_object_documents() {
        let mut doc = json!([1, 2]);
        assert!(matches!(
            Patch::new().set("a", 1).apply(&mut doc),
            Err(StoreError::NotAnObject)
        ));
    }

    #[test]
    fn test_filter_matches_nested_field() {
        let doc = json!({"referral_details": {"referral_code": "REF-ABCD1234"}});

        assert!(FieldFilter::eq("referral_details.referral_code", "REF-ABCD1234").matches(&doc));
        assert!(!FieldFilter::eq("referral_details.referral_code", "REF-OTHER000").matches(&doc));
        assert!(!FieldFilter::eq("referral_details.missing", "x").matches(&doc));
    }

    #[test]
    fn test_filter_containment() {
        let filter = FieldFilter::eq("referral_details.referral_code", "REF-ABCD1234");
        assert_eq!(
            filter.containment(),
            json!({"referral_details": {"referral_code": "REF-ABCD1234"}})
        );
        assert_eq!(FieldFilter::eq("type", "one-time").containment(), json!({"type": "one-time"}));
    }
}
