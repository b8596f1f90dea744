//! Entity collection.
//!
//! Walks the schema once and produces the three entity lists every back-end
//! renders from. Required lists and object-reference maps are derived here so
//! back-ends never re-derive them.

use serde_json::Value;

use super::shape::{Atom, Shape, ShapeKind, TypeSystem};
use crate::schema::{MethodDef, OrderedMap, PropertyDef, SchemaDocument};

/// Names that stand for hand-written base concepts and are never generated.
pub const SENTINELS: [&str; 2] = ["Result", "Execute"];

pub fn is_sentinel(name: &str) -> bool {
    SENTINELS.contains(&name)
}

/// A classified property of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl Property {
    pub fn from_def(name: &str, def: &PropertyDef) -> Self {
        Self {
            name: name.to_string(),
            shape: Shape::classify(def),
            required: def.required,
            default: def.default.clone().filter(|v| !v.is_null()),
            description: def.description.clone().filter(|d| !d.trim().is_empty()),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn native_type(&self, types: &dyn TypeSystem) -> String {
        self.shape.native_type(types)
    }

    pub fn is_polymorphic(&self) -> bool {
        self.kind() == ShapeKind::Polymorphic
    }

    /// The schema default, or `None` for "unset". No zero value is invented.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Everything except `mixed` and unrecognized shapes gets a setter check.
    pub fn requires_runtime_check(&self) -> bool {
        !matches!(
            self.shape,
            Shape::Single(Atom::Primitive(super::Primitive::Mixed)) | Shape::Single(Atom::Unknown)
        )
    }

    /// The object this property holds directly or per element.
    pub fn referenced_object(&self) -> Option<&str> {
        self.shape
            .single()
            .and_then(Atom::object_name)
            .or_else(|| self.list_element_object())
    }

    /// The element object of a list or polymorphic property.
    pub fn list_element_object(&self) -> Option<&str> {
        self.shape.element_atom().and_then(Atom::object_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Object,
    Component,
    Result,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Object => "object",
            EntityKind::Component => "component",
            EntityKind::Result => "result",
        }
    }
}

/// Call requirements of a component method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags {
    pub secure: bool,
    pub require_session: bool,
    pub redirect: bool,
}

/// One generated unit: an object, a component or a result.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    /// `User` for objects, `ScoreBoard.getScores` for components and results.
    pub name: String,
    pub namespace: Option<String>,
    pub method: Option<String>,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub required: Vec<String>,
    /// Property name to referenced object, for bare or per-element references.
    pub object_map: Vec<(String, String)>,
    /// Property name to element object, for properties that may hold a list.
    pub object_lists: Vec<(String, String)>,
    pub flags: MethodFlags,
}

impl Entity {
    fn new(
        kind: EntityKind,
        name: String,
        description: Option<String>,
        defs: Option<&OrderedMap<PropertyDef>>,
    ) -> Self {
        let properties: Vec<Property> = defs
            .map(|defs| defs.iter().map(|(n, d)| Property::from_def(n, d)).collect())
            .unwrap_or_default();

        let required = properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.clone())
            .collect();

        let object_map = properties
            .iter()
            .filter_map(|p| Some((p.name.clone(), p.referenced_object()?.to_string())))
            .collect();

        let object_lists = properties
            .iter()
            .filter_map(|p| Some((p.name.clone(), p.list_element_object()?.to_string())))
            .collect();

        Self {
            kind,
            name,
            namespace: None,
            method: None,
            description: description.filter(|d| !d.trim().is_empty()),
            properties,
            required,
            object_map,
            object_lists,
            flags: MethodFlags::default(),
        }
    }

    fn for_method(kind: EntityKind, ns: &str, method: &str, def: &MethodDef, defs: Option<&OrderedMap<PropertyDef>>) -> Self {
        let mut entity = Self::new(kind, format!("{}.{}", ns, method), def.description.clone(), defs);
        entity.namespace = Some(ns.to_string());
        entity.method = Some(method.to_string());
        entity.flags = MethodFlags {
            secure: def.secure,
            require_session: def.require_session,
            redirect: def.redirect,
        };
        entity
    }

    /// Lower-cased name used by the generated name lookup.
    pub fn index_key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Object names referenced by any property, deduplicated, in first-use order.
    pub fn referenced_objects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for prop in &self.properties {
            for name in prop.shape.object_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Whether any property defers to the result lookup.
    pub fn uses_result_lookup(&self) -> bool {
        self.properties.iter().any(|p| p.shape.mentions_result())
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// Options for [`collect`].
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Emit a result for every method, even those without a declared return.
    pub permissive_results: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self { permissive_results: true }
    }
}

/// Everything a back-end renders, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaModel {
    pub objects: Vec<Entity>,
    pub components: Vec<Entity>,
    pub results: Vec<Entity>,
}

impl SchemaModel {
    pub fn entity_count(&self) -> usize {
        self.objects.len() + self.components.len() + self.results.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.objects
            .iter()
            .chain(self.components.iter())
            .chain(self.results.iter())
    }
}

/// Builds the entity lists from a schema document.
pub fn collect(doc: &SchemaDocument, options: CollectOptions) -> SchemaModel {
    let mut model = SchemaModel::default();

    for (name, def) in doc.objects.iter() {
        if is_sentinel(name) {
            continue;
        }
        model.objects.push(Entity::new(
            EntityKind::Object,
            name.to_string(),
            def.description.clone(),
            Some(&def.properties),
        ));
    }

    for (ns, namespace) in doc.components.iter() {
        if is_sentinel(ns) {
            continue;
        }
        for (method, def) in namespace.methods.iter() {
            model.components.push(Entity::for_method(
                EntityKind::Component,
                ns,
                method,
                def,
                def.params.as_ref(),
            ));

            if def.returns.is_some() || options.permissive_results {
                model.results.push(Entity::for_method(
                    EntityKind::Result,
                    ns,
                    method,
                    def,
                    def.returns.as_ref(),
                ));
            }
        }
    }

    tracing::debug!(
        objects = model.objects.len(),
        components = model.components.len(),
        results = model.results.len(),
        "collected schema entities"
    );

    model
}
