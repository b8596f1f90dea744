//! Typed view of the `objects_and_components` schema document.
//!
//! The document is maintained outside this project and is loosely typed in
//! places (booleans as `0`/`1`, empty maps encoded as `[]`), so the readers
//! here accept those spellings instead of rejecting the whole payload.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::diagnostic::ModgenError;

/// A string-keyed map that keeps the order keys appeared in the document.
///
/// Declaration order drives generated field order, so a hash map won't do.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserts a value, replacing an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }

    // PHP encodes an empty associative array as `[]`.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_type(de::Unexpected::Seq, &self));
        }
        Ok(OrderedMap::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::new())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

/// Root of the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    pub objects: OrderedMap<ObjectDef>,
    pub components: OrderedMap<NamespaceDef>,
}

#[derive(Deserialize)]
struct RawDocument {
    objects: Option<OrderedMap<ObjectDef>>,
    components: Option<OrderedMap<NamespaceDef>>,
}

impl SchemaDocument {
    /// Parses and validates a schema payload.
    ///
    /// `origin` names where the text came from (a URL or a path) for the
    /// error message.
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ModgenError> {
        let invalid = |message: String| ModgenError::SchemaInvalid {
            origin: origin.to_string(),
            message,
        };

        let raw: RawDocument = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;

        let objects = raw.objects.ok_or_else(|| invalid("missing top-level `objects`".into()))?;
        let components = raw
            .components
            .ok_or_else(|| invalid("missing top-level `components`".into()))?;

        Ok(Self { objects, components })
    }

    /// Total number of component methods across all namespaces.
    pub fn method_count(&self) -> usize {
        self.components.iter().map(|(_, ns)| ns.methods.len()).sum()
    }
}

/// A plain data record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObjectDef {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: OrderedMap<PropertyDef>,
}

/// The methods of one component namespace.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawNamespace")]
pub struct NamespaceDef {
    pub methods: OrderedMap<MethodDef>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNamespace {
    Wrapped { methods: OrderedMap<MethodDef> },
    Bare(OrderedMap<MethodDef>),
}

impl From<RawNamespace> for NamespaceDef {
    fn from(raw: RawNamespace) -> Self {
        match raw {
            RawNamespace::Wrapped { methods } | RawNamespace::Bare(methods) => Self { methods },
        }
    }
}

/// A remotely callable method.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MethodDef {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub secure: bool,
    #[serde(default, alias = "requireSession", deserialize_with = "lenient_bool")]
    pub require_session: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub redirect: bool,
    #[serde(default)]
    pub params: Option<OrderedMap<PropertyDef>>,
    #[serde(default, rename = "return")]
    pub returns: Option<OrderedMap<PropertyDef>>,
}

/// The atomic property descriptor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PropertyDef {
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default, deserialize_with = "lenient_array")]
    pub array: Option<Box<PropertyDef>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    })
}

fn lenient_array<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Box<PropertyDef>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value)
            .map(|def| Some(Box::new(def)))
            .map_err(de::Error::custom),
        Value::Bool(true) => Ok(Some(Box::default())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_declaration_order() {
        let doc = SchemaDocument::from_json(
            r#"{"objects":{"Zed":{"properties":{"b":{"type":"int"},"a":{"type":"string"}}},"Alpha":{}},"components":{}}"#,
            "test",
        )
        .unwrap();

        assert_eq!(doc.objects.keys().collect::<Vec<_>>(), vec!["Zed", "Alpha"]);
        let zed = doc.objects.get("Zed").unwrap();
        assert_eq!(zed.properties.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_accepts_wrapped_and_bare_namespaces() {
        let doc = SchemaDocument::from_json(
            r#"{"objects":{},"components":{
                "Gateway":{"methods":{"ping":{"secure":1}}},
                "Medal":{"unlock":{"requireSession":true,"params":{"id":{"type":"int","required":"true"}}}}
            }}"#,
            "test",
        )
        .unwrap();

        let gateway = doc.components.get("Gateway").unwrap();
        assert!(gateway.methods.get("ping").unwrap().secure);

        let unlock = doc.components.get("Medal").unwrap().methods.get("unlock").unwrap();
        assert!(unlock.require_session);
        assert!(unlock.params.as_ref().unwrap().get("id").unwrap().required);
        assert_eq!(doc.method_count(), 2);
    }

    #[test]
    fn test_empty_php_arrays_become_empty_maps() {
        let doc = SchemaDocument::from_json(
            r#"{"objects":{"Empty":{"properties":[]}},"components":{"App":{"methods":{"ping":{"params":[],"return":[]}}}}}"#,
            "test",
        )
        .unwrap();

        assert!(doc.objects.get("Empty").unwrap().properties.is_empty());
        let ping = doc.components.get("App").unwrap().methods.get("ping").unwrap();
        assert!(ping.returns.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_array_true_means_unknown_elements() {
        let prop: PropertyDef = serde_json::from_str(r#"{"array":true}"#).unwrap();
        assert_eq!(prop.array, Some(Box::default()));

        let prop: PropertyDef = serde_json::from_str(r#"{"type":"string","array":false}"#).unwrap();
        assert_eq!(prop.array, None);
    }

    #[test]
    fn test_rejects_missing_top_level_keys() {
        let err = SchemaDocument::from_json(r#"{"objects":{}}"#, "remote").unwrap_err();
        assert!(matches!(err, ModgenError::SchemaInvalid { .. }));

        let err = SchemaDocument::from_json("<html>nope</html>", "remote").unwrap_err();
        assert!(matches!(err, ModgenError::SchemaInvalid { .. }));

        let err = SchemaDocument::from_json("[]", "remote").unwrap_err();
        assert!(matches!(err, ModgenError::SchemaInvalid { .. }));
    }
}
