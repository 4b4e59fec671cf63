//! Schema-less JSON value used to carry payloads between the wire, the
//! encryption stages and the document store.
//!
//! Numeric widening: BSON `Int32` and `Int64` both decode to [`DynamicValue::Int`],
//! and `Int` always encodes back as `Int64`. JSON integers above `i64::MAX`
//! decode to [`DynamicValue::Double`]. Non-finite doubles serialize as JSON `null`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

use bson::{Bson, Document};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub type DynamicMap = BTreeMap<String, DynamicValue>;

/// Errors raised while building or converting dynamic values
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("Malformed JSON payload: {0}")]
    MalformedPayload(String),

    #[error("Expected a JSON object, found {0}")]
    NotAMap(&'static str),

    #[error("Failed to encode value: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<DynamicValue>),
    Map(DynamicMap),
}

static NULL: DynamicValue = DynamicValue::Null;

impl DynamicValue {
    /// Empty map value, the usual starting point for building response payloads
    pub fn map() -> Self {
        DynamicValue::Map(DynamicMap::new())
    }

    /// Parse raw wire-JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValueError> {
        serde_json::from_slice::<DynamicValue>(bytes)
            .map_err(|e| ValueError::MalformedPayload(e.to_string()))
    }

    /// Parse a wire-JSON string
    pub fn parse(json: &str) -> Result<Self, ValueError> {
        Self::from_slice(json.as_bytes())
    }

    /// Build from any serializable DTO, dropping `ignoring` keys at every
    /// nesting level (maps nested in maps and in arrays).
    pub fn from_serializable<T: serde::Serialize>(
        value: &T,
        ignoring: &[&str],
    ) -> Result<Self, ValueError> {
        let json = serde_json::to_value(value).map_err(|e| ValueError::Encoding(e.to_string()))?;
        let mut dynamic = DynamicValue::from(json);
        if !ignoring.is_empty() {
            dynamic.remove_keys_recursively(ignoring);
        }
        Ok(dynamic)
    }

    /// Deterministic BSON mapping: object ids become hex strings, datetimes
    /// become epoch seconds, 32/64-bit integers both become `Int`.
    pub fn from_bson(bson: Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined | Bson::MaxKey | Bson::MinKey => DynamicValue::Null,
            Bson::Boolean(b) => DynamicValue::Bool(b),
            Bson::Int32(i) => DynamicValue::Int(i64::from(i)),
            Bson::Int64(i) => DynamicValue::Int(i),
            Bson::Double(d) => DynamicValue::Double(d),
            Bson::String(s) | Bson::Symbol(s) => DynamicValue::String(s),
            Bson::ObjectId(oid) => DynamicValue::String(oid.to_hex()),
            Bson::DateTime(dt) => DynamicValue::Double(dt.timestamp_millis() as f64 / 1000.0),
            Bson::Timestamp(ts) => DynamicValue::Int(i64::from(ts.time)),
            Bson::Array(items) => {
                DynamicValue::Array(items.into_iter().map(DynamicValue::from_bson).collect())
            }
            Bson::Document(doc) => Self::from_document(doc),
            other => DynamicValue::String(other.to_string()),
        }
    }

    pub fn from_document(document: Document) -> Self {
        DynamicValue::Map(
            document
                .into_iter()
                .map(|(key, value)| (key, DynamicValue::from_bson(value)))
                .collect(),
        )
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            DynamicValue::Null => Bson::Null,
            DynamicValue::Bool(b) => Bson::Boolean(*b),
            DynamicValue::Int(i) => Bson::Int64(*i),
            DynamicValue::Double(d) => Bson::Double(*d),
            DynamicValue::String(s) => Bson::String(s.clone()),
            DynamicValue::Array(items) => Bson::Array(items.iter().map(DynamicValue::to_bson).collect()),
            DynamicValue::Map(map) => {
                let mut doc = Document::new();
                for (key, value) in map {
                    doc.insert(key.clone(), value.to_bson());
                }
                Bson::Document(doc)
            }
        }
    }

    /// Convert a map value into a store document, skipping top-level `ignoring` keys
    pub fn to_document(&self, ignoring: &[&str]) -> Result<Document, ValueError> {
        let map = self.as_map().ok_or(ValueError::NotAMap(self.kind()))?;
        let mut doc = Document::new();
        for (key, value) in map {
            if ignoring.contains(&key.as_str()) {
                continue;
            }
            doc.insert(key.clone(), value.to_bson());
        }
        Ok(doc)
    }

    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }

    /// Compact wire-JSON bytes
    pub fn to_vec(&self) -> Result<Vec<u8>, ValueError> {
        serde_json::to_vec(self).map_err(|e| ValueError::Encoding(e.to_string()))
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Int(_) => "int",
            DynamicValue::Double(_) => "double",
            DynamicValue::String(_) => "string",
            DynamicValue::Array(_) => "array",
            DynamicValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn exists(&self) -> bool {
        !self.is_null()
    }

    // Strict accessors: None unless the variant matches

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Ints widen to doubles, nothing else converts
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Double(d) => Some(*d),
            DynamicValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DynamicMap> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut DynamicMap> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    // Coercing accessors: fall back to an empty/zero default

    pub fn string_value(&self) -> String {
        match self {
            DynamicValue::String(s) => s.clone(),
            DynamicValue::Int(i) => i.to_string(),
            DynamicValue::Double(d) => d.to_string(),
            DynamicValue::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn int_value(&self) -> i64 {
        match self {
            DynamicValue::Int(i) => *i,
            DynamicValue::Double(d) => *d as i64,
            DynamicValue::String(s) => s.trim().parse().unwrap_or(0),
            DynamicValue::Bool(b) => i64::from(*b),
            _ => 0,
        }
    }

    pub fn double_value(&self) -> f64 {
        match self {
            DynamicValue::Double(d) => *d,
            DynamicValue::Int(i) => *i as f64,
            DynamicValue::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn bool_value(&self) -> bool {
        match self {
            DynamicValue::Bool(b) => *b,
            DynamicValue::Int(i) => *i != 0,
            DynamicValue::Double(d) => *d != 0.0,
            DynamicValue::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn array_value(&self) -> &[DynamicValue] {
        self.as_array().unwrap_or(&[])
    }

    pub fn map_value(&self) -> DynamicMap {
        self.as_map().cloned().unwrap_or_default()
    }

    /// Value under `key`, or `Null` when absent or when this is not a map
    pub fn get(&self, key: &str) -> &DynamicValue {
        self.as_map().and_then(|map| map.get(key)).unwrap_or(&NULL)
    }

    /// Element at `index`, or `Null` when out of range or not an array
    pub fn at(&self, index: usize) -> &DynamicValue {
        self.as_array().and_then(|items| items.get(index)).unwrap_or(&NULL)
    }

    /// Insert into a map value. A `Null` value becomes an empty map first;
    /// any other variant is left untouched and the value is handed back.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DynamicValue>,
    ) -> Result<Option<DynamicValue>, DynamicValue> {
        if self.is_null() {
            *self = DynamicValue::map();
        }
        match self {
            DynamicValue::Map(map) => Ok(map.insert(key.into(), value.into())),
            _ => Err(value.into()),
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        let _ = self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<DynamicValue> {
        self.as_map_mut().and_then(|map| map.remove(key))
    }

    /// Shallow merge: keys from `source` overwrite ours. No-op unless both are maps.
    pub fn merge(&mut self, source: &DynamicValue) {
        if let (DynamicValue::Map(target), DynamicValue::Map(entries)) = (&mut *self, source) {
            for (key, value) in entries {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn merge_map(&mut self, entries: DynamicMap) {
        if let DynamicValue::Map(target) = self {
            target.extend(entries);
        }
    }

    fn remove_keys_recursively(&mut self, keys: &[&str]) {
        match self {
            DynamicValue::Map(map) => {
                map.retain(|key, _| !keys.contains(&key.as_str()));
                for value in map.values_mut() {
                    value.remove_keys_recursively(keys);
                }
            }
            DynamicValue::Array(items) => {
                for item in items {
                    if matches!(item, DynamicValue::Map(_)) {
                        item.remove_keys_recursively(keys);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Index<&str> for DynamicValue {
    type Output = DynamicValue;

    fn index(&self, key: &str) -> &DynamicValue {
        self.get(key)
    }
}

impl Index<usize> for DynamicValue {
    type Output = DynamicValue;

    fn index(&self, index: usize) -> &DynamicValue {
        self.at(index)
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("unknown"),
        }
    }
}

// Typed constructors per source shape

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Bool(value)
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        DynamicValue::Int(i64::from(value))
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Int(value)
    }
}

impl From<u32> for DynamicValue {
    fn from(value: u32) -> Self {
        DynamicValue::Int(i64::from(value))
    }
}

impl From<u64> for DynamicValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(DynamicValue::Int)
            .unwrap_or(DynamicValue::Double(value as f64))
    }
}

impl From<usize> for DynamicValue {
    fn from(value: usize) -> Self {
        DynamicValue::from(value as u64)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Double(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::String(value)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DynamicValue::Null)
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        DynamicValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DynamicValue>> From<BTreeMap<String, T>> for DynamicValue {
    fn from(map: BTreeMap<String, T>) -> Self {
        DynamicValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<DynamicValue>> From<HashMap<String, T>> for DynamicValue {
    fn from(map: HashMap<String, T>) -> Self {
        DynamicValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<DynamicValue>> FromIterator<(K, V)> for DynamicValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        DynamicValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Bson> for DynamicValue {
    fn from(value: Bson) -> Self {
        DynamicValue::from_bson(value)
    }
}

impl From<Document> for DynamicValue {
    fn from(value: Document) -> Self {
        DynamicValue::from_document(value)
    }
}

impl From<Value> for DynamicValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DynamicValue::Null,
            Value::Bool(b) => DynamicValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DynamicValue::Int(i)
                } else {
                    DynamicValue::Double(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => DynamicValue::String(s),
            Value::Array(items) => DynamicValue::Array(items.into_iter().map(DynamicValue::from).collect()),
            Value::Object(map) => {
                DynamicValue::Map(map.into_iter().map(|(k, v)| (k, DynamicValue::from(v))).collect())
            }
        }
    }
}

impl From<DynamicValue> for Value {
    fn from(value: DynamicValue) -> Self {
        match value {
            DynamicValue::Null => Value::Null,
            DynamicValue::Bool(b) => Value::Bool(b),
            DynamicValue::Int(i) => Value::Number(i.into()),
            DynamicValue::Double(d) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
            DynamicValue::String(s) => Value::String(s),
            DynamicValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            DynamicValue::Map(map) => {
                let mut object = Map::new();
                for (key, value) in map {
                    object.insert(key, Value::from(value));
                }
                Value::Object(object)
            }
        }
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicValue::Null => serializer.serialize_unit(),
            DynamicValue::Bool(b) => serializer.serialize_bool(*b),
            DynamicValue::Int(i) => serializer.serialize_i64(*i),
            DynamicValue::Double(d) if d.is_finite() => serializer.serialize_f64(*d),
            DynamicValue::Double(_) => serializer.serialize_unit(),
            DynamicValue::String(s) => serializer.serialize_str(s),
            DynamicValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DynamicValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

struct DynamicValueVisitor;

impl<'de> Visitor<'de> for DynamicValueVisitor {
    type Value = DynamicValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<DynamicValue, D::Error> {
        DynamicValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DynamicValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DynamicValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DynamicValue, A::Error> {
        let mut map = DynamicMap::new();
        while let Some((key, value)) = access.next_entry::<String, DynamicValue>()? {
            map.insert(key, value);
        }
        Ok(DynamicValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    fn sample() -> DynamicValue {
        DynamicValue::map()
            .with("name", "Asha")
            .with("age", 31)
            .with("score", 4.5)
            .with("active", true)
            .with("notes", DynamicValue::Null)
            .with("tags", vec!["new", "priority"])
            .with("address", DynamicValue::map().with("city", "Deoghar").with("ward", 31))
    }

    #[test]
    fn wire_json_round_trip_preserves_every_variant() {
        let value = sample();
        let bytes = value.to_vec().unwrap();
        assert_eq!(DynamicValue::from_slice(&bytes).unwrap(), value);
    }

    #[test]
    fn integral_doubles_stay_doubles_on_the_wire() {
        let value = DynamicValue::Double(2.0);
        let text = value.to_json_string();
        assert_eq!(text, "2.0");
        assert_eq!(DynamicValue::parse(&text).unwrap(), value);
    }

    #[test]
    fn document_round_trip_preserves_every_variant() {
        let value = sample();
        assert_eq!(DynamicValue::from_bson(value.to_bson()), value);
    }

    #[test]
    fn bson_integers_widen_to_int() {
        let value = DynamicValue::from_document(doc! { "small": 7_i32, "large": 7_i64 });
        assert_eq!(value["small"], DynamicValue::Int(7));
        assert_eq!(value["large"], DynamicValue::Int(7));
        assert!(matches!(DynamicValue::Int(7).to_bson(), Bson::Int64(7)));
    }

    #[test]
    fn object_ids_and_datetimes_map_to_plain_values() {
        let oid = ObjectId::new();
        let when = bson::DateTime::from_millis(1_700_000_000_500);
        let value = DynamicValue::from_document(doc! { "_id": oid, "at": when });
        assert_eq!(value["_id"].as_str(), Some(oid.to_hex().as_str()));
        assert_eq!(value["at"], DynamicValue::Double(1_700_000_000.5));
    }

    #[test]
    fn huge_unsigned_numbers_widen_to_double() {
        let value = DynamicValue::parse("18446744073709551615").unwrap();
        assert!(matches!(value, DynamicValue::Double(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = DynamicValue::from_slice(b"{\"name\": ").unwrap_err();
        assert!(matches!(err, ValueError::MalformedPayload(_)));
    }

    #[test]
    fn strict_accessors_reject_mismatched_variants() {
        let value = sample();
        assert_eq!(value["name"].as_str(), Some("Asha"));
        assert_eq!(value["name"].as_i64(), None);
        assert_eq!(value["age"].as_f64(), Some(31.0));
        assert_eq!(value["score"].as_i64(), None);
        assert!(value["missing"].is_null());
        assert!(value["tags"][5].is_null());
    }

    #[test]
    fn coercing_accessors_fall_back_to_defaults() {
        let value = DynamicValue::map()
            .with("page", "3")
            .with("ratio", 2.9)
            .with("flag", "TRUE");
        assert_eq!(value["page"].int_value(), 3);
        assert_eq!(value["ratio"].int_value(), 2);
        assert!(value["flag"].bool_value());
        assert_eq!(value["missing"].string_value(), "");
        assert_eq!(value["missing"].int_value(), 0);
        assert!(value["missing"].array_value().is_empty());
        assert!(value["missing"].map_value().is_empty());
    }

    #[test]
    fn merge_is_shallow_and_source_wins() {
        let mut target = DynamicValue::map()
            .with("status", "pending")
            .with("meta", DynamicValue::map().with("a", 1));
        let source = DynamicValue::map()
            .with("status", "confirmed")
            .with("meta", DynamicValue::map().with("b", 2));
        target.merge(&source);
        assert_eq!(target["status"].as_str(), Some("confirmed"));
        assert!(target["meta"]["a"].is_null());
        assert_eq!(target["meta"]["b"].as_i64(), Some(2));
    }

    #[test]
    fn merge_ignores_non_map_operands() {
        let mut target = DynamicValue::from("text");
        target.merge(&DynamicValue::map().with("a", 1));
        assert_eq!(target, DynamicValue::from("text"));
    }

    #[test]
    fn remove_returns_the_dropped_value() {
        let mut value = sample();
        assert_eq!(value.remove("age"), Some(DynamicValue::Int(31)));
        assert!(value["age"].is_null());
        assert_eq!(value.remove("age"), None);
    }

    #[test]
    fn serializable_conversion_drops_ignored_keys_at_depth() {
        #[derive(serde::Serialize)]
        struct Inner {
            secret: &'static str,
            keep: u8,
        }
        #[derive(serde::Serialize)]
        struct Outer {
            secret: &'static str,
            inner: Inner,
            list: Vec<Inner>,
        }
        let outer = Outer {
            secret: "x",
            inner: Inner { secret: "y", keep: 1 },
            list: vec![Inner { secret: "z", keep: 2 }],
        };
        let value = DynamicValue::from_serializable(&outer, &["secret"]).unwrap();
        assert!(value["secret"].is_null());
        assert!(value["inner"]["secret"].is_null());
        assert_eq!(value["inner"]["keep"].as_i64(), Some(1));
        assert!(value["list"][0]["secret"].is_null());
        assert_eq!(value["list"][0]["keep"].as_i64(), Some(2));
    }

    #[test]
    fn to_document_requires_a_map() {
        assert!(matches!(
            DynamicValue::from(vec![1, 2]).to_document(&[]),
            Err(ValueError::NotAMap("array"))
        ));
        let doc = sample().to_document(&["tags"]).unwrap();
        assert!(doc.get("tags").is_none());
        assert_eq!(doc.get_str("name").unwrap(), "Asha");
    }

    #[test]
    fn non_finite_doubles_serialize_as_null() {
        assert_eq!(DynamicValue::Double(f64::NAN).to_json_string(), "null");
        assert_eq!(DynamicValue::Double(f64::INFINITY).to_json(), Value::Null);
    }
}
