//! Records and batch parsing.
//!
//! A [`Record`] is one flat JSON object on its way to becoming one table row:
//! every key is a validated column [`Identifier`] and every value is either
//! text or SQL `NULL`.

use std::collections::{BTreeMap, BTreeSet, btree_map};

use serde_json::{Map, Value};

use crate::{Error, Identifier, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
  fields: BTreeMap<Identifier, Option<String>>,
}

impl Record {
  pub fn new() -> Self { Self::default() }

  /// Set a field, validating `key` as a column name. A later insert of the
  /// same key replaces the earlier value.
  pub fn insert(
    &mut self,
    key: impl Into<String>,
    value: Option<String>,
  ) -> Result<&mut Self> {
    self.fields.insert(Identifier::column(key)?, value);
    Ok(self)
  }

  /// Build a record from a decoded JSON object, coercing each value to text.
  pub fn from_json_object(object: Map<String, Value>) -> Result<Self> {
    let mut record = Self::new();
    for (key, value) in object {
      record.insert(key, coerce(value))?;
    }
    Ok(record)
  }

  pub fn get(&self, key: &str) -> Option<Option<&str>> {
    self.fields.get(key).map(Option::as_deref)
  }

  pub fn keys(&self) -> btree_map::Keys<'_, Identifier, Option<String>> {
    self.fields.keys()
  }

  pub fn iter(&self) -> btree_map::Iter<'_, Identifier, Option<String>> {
    self.fields.iter()
  }

  pub fn len(&self) -> usize { self.fields.len() }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl<'a> IntoIterator for &'a Record {
  type IntoIter = btree_map::Iter<'a, Identifier, Option<String>>;
  type Item = (&'a Identifier, &'a Option<String>);

  fn into_iter(self) -> Self::IntoIter { self.fields.iter() }
}

impl FromIterator<(Identifier, Option<String>)> for Record {
  fn from_iter<T: IntoIterator<Item = (Identifier, Option<String>)>>(
    iter: T,
  ) -> Self {
    Self { fields: iter.into_iter().collect() }
  }
}

/// Coerce a JSON value to its stored text form.
///
/// Strings are stored as-is, numbers and booleans as their JSON text, `null`
/// as SQL `NULL`. Nested arrays and objects are flattened to compact JSON so
/// the record stays one level deep.
pub fn coerce(value: Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s),
    Value::Bool(b) => Some(b.to_string()),
    Value::Number(n) => Some(n.to_string()),
    nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
  }
}

/// The union of keys over a batch, in column order.
pub fn key_union(records: &[Record]) -> BTreeSet<&Identifier> {
  records.iter().flat_map(Record::keys).collect()
}

/// Parse loader input.
///
/// Returns `Ok(None)` for empty or whitespace-only input. Accepts a JSON array
/// of objects, or a single object as a one-record batch.
pub fn parse_batch(text: &str) -> Result<Option<Vec<Record>>> {
  if text.trim().is_empty() {
    return Ok(None);
  }

  let records = match serde_json::from_str::<Value>(text)? {
    Value::Array(items) => items
      .into_iter()
      .enumerate()
      .map(|(index, item)| match item {
        Value::Object(object) => Record::from_json_object(object),
        other => Err(Error::Parse(format!(
          "element {index} is {}, expected an object",
          kind_of(&other)
        ))),
      })
      .collect::<Result<Vec<_>>>()?,
    Value::Object(object) => vec![Record::from_json_object(object)?],
    other => {
      return Err(Error::Parse(format!(
        "input is {}, expected an array of objects",
        kind_of(&other)
      )));
    }
  };

  Ok(Some(records))
}

fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn empty_and_blank_input_is_none() {
    assert!(parse_batch("").unwrap().is_none());
    assert!(parse_batch("  \n\t ").unwrap().is_none());
  }

  #[test]
  fn malformed_json_is_parse_error() {
    let err = parse_batch("{not json").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
  }

  #[test]
  fn array_of_objects() {
    let batch = parse_batch(r#"[{"a":"1","b":"2"},{"a":"3","c":"4"}]"#)
      .unwrap()
      .unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].get("a"), Some(Some("1")));
    assert_eq!(batch[0].get("c"), None);
    assert_eq!(batch[1].get("c"), Some(Some("4")));
  }

  #[test]
  fn single_object_is_one_record_batch() {
    let batch = parse_batch(r#"{"name":"invoice"}"#).unwrap().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].get("name"), Some(Some("invoice")));
  }

  #[test]
  fn non_object_element_is_rejected_with_index() {
    let err = parse_batch(r#"[{"a":"1"}, 7]"#).unwrap_err();
    match err {
      Error::Parse(msg) => assert!(msg.contains("element 1"), "{msg}"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn scalar_top_level_is_rejected() {
    assert!(matches!(parse_batch("42"), Err(Error::Parse(_))));
    assert!(matches!(parse_batch(r#""text""#), Err(Error::Parse(_))));
  }

  #[test]
  fn values_are_coerced_to_text() {
    let record = Record::from_json_object(
      json!({
        "s": "plain",
        "n": 12.5,
        "i": -3,
        "t": true,
        "z": null,
        "list": [1, "two"],
        "obj": {"k": "v"}
      })
      .as_object()
      .unwrap()
      .clone(),
    )
    .unwrap();

    assert_eq!(record.get("s"), Some(Some("plain")));
    assert_eq!(record.get("n"), Some(Some("12.5")));
    assert_eq!(record.get("i"), Some(Some("-3")));
    assert_eq!(record.get("t"), Some(Some("true")));
    assert_eq!(record.get("z"), Some(None));
    assert_eq!(record.get("list"), Some(Some(r#"[1,"two"]"#)));
    assert_eq!(record.get("obj"), Some(Some(r#"{"k":"v"}"#)));
  }

  #[test]
  fn hostile_key_is_rejected() {
    let err = parse_batch(r#"[{"x\" TEXT); DROP TABLE documents; --":"1"}]"#)
      .unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier { .. }));
  }

  #[test]
  fn key_union_spans_all_records() {
    let batch = parse_batch(r#"[{"a":"1","b":"2"},{"a":"3","c":"4"},{}]"#)
      .unwrap()
      .unwrap();
    let keys: Vec<&str> =
      key_union(&batch).into_iter().map(Identifier::as_str).collect();
    assert_eq!(keys, ["a", "b", "c"]);
  }
}
