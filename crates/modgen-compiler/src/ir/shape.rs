//! Shape classification for property descriptors.
//!
//! Every back-end consumes the same [`Shape`] so that a property is declared,
//! checked and decoded the same way in every target language.

use crate::schema::PropertyDef;

/// The object name standing for "any component result".
pub const RESULT_SENTINEL: &str = "Result";

/// Scalar `type` values understood by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    String,
    Boolean,
    Object,
    Array,
    Mixed,
}

impl Primitive {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(Primitive::Int),
            "float" | "number" | "double" => Some(Primitive::Float),
            "string" => Some(Primitive::String),
            "boolean" | "bool" => Some(Primitive::Boolean),
            "object" => Some(Primitive::Object),
            "array" => Some(Primitive::Array),
            "mixed" => Some(Primitive::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
            Primitive::Object => "object",
            Primitive::Array => "array",
            Primitive::Mixed => "mixed",
        }
    }
}

/// What a property declares at its own level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Primitive(Primitive),
    /// Reference to another schema object.
    Object(String),
    /// Reference to the polymorphic result base, resolved by name at decode time.
    Result,
    /// Nothing recognizable was declared.
    Unknown,
}

/// The closed set of property shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Single(Atom),
    List(Box<Shape>),
    /// Holds either a bare `single` value or a sequence of `element`.
    Either { single: Atom, element: Box<Shape> },
}

/// Coarse classification, mostly for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Scalar,
    ObjectRef,
    ResultRef,
    ArrayOfScalar,
    ArrayOfObject,
    Polymorphic,
    Unknown,
}

/// Maps shapes to type expressions in one target language.
pub trait TypeSystem {
    fn primitive(&self, primitive: Primitive) -> String;
    fn object(&self, name: &str) -> String;
    fn result_base(&self) -> String;
    fn unknown(&self) -> String;
    fn list(&self, element: &str) -> String;
    fn either(&self, single: &str, list: &str) -> String;
}

impl Atom {
    fn from_def(def: &PropertyDef) -> Option<Atom> {
        if let Some(name) = def.object.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            if name == RESULT_SENTINEL {
                return Some(Atom::Result);
            }
            return Some(Atom::Object(name.to_string()));
        }

        let ty = def.ty.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        match Primitive::parse(ty) {
            Some(p) => Some(Atom::Primitive(p)),
            None => {
                tracing::warn!(r#type = ty, "unrecognized property type, using a generic container");
                Some(Atom::Unknown)
            }
        }
    }

    pub fn native_type(&self, types: &dyn TypeSystem) -> String {
        match self {
            Atom::Primitive(p) => types.primitive(*p),
            Atom::Object(name) => types.object(name),
            Atom::Result => types.result_base(),
            Atom::Unknown => types.unknown(),
        }
    }

    pub fn object_name(&self) -> Option<&str> {
        match self {
            Atom::Object(name) => Some(name),
            _ => None,
        }
    }

    fn is_reference(&self) -> bool {
        matches!(self, Atom::Object(_) | Atom::Result)
    }
}

impl Shape {
    /// Classifies a raw descriptor.
    ///
    /// `object` wins over `type` when both are present, and `type: "array"`
    /// next to an `array` element descriptor is a plain list.
    pub fn classify(def: &PropertyDef) -> Shape {
        let own = match Atom::from_def(def) {
            Some(Atom::Primitive(Primitive::Array)) if def.array.is_some() => None,
            other => other,
        };

        match (own, def.array.as_deref()) {
            (Some(atom), None) => Shape::Single(atom),
            (None, Some(element)) => Shape::List(Box::new(Shape::classify(element))),
            (Some(single), Some(element)) => Shape::Either {
                single,
                element: Box::new(Shape::classify(element)),
            },
            (None, None) => Shape::Single(Atom::Unknown),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Single(Atom::Primitive(_)) => ShapeKind::Scalar,
            Shape::Single(Atom::Object(_)) => ShapeKind::ObjectRef,
            Shape::Single(Atom::Result) => ShapeKind::ResultRef,
            Shape::Single(Atom::Unknown) => ShapeKind::Unknown,
            Shape::List(element) => match element.as_ref() {
                Shape::Single(atom) if atom.is_reference() => ShapeKind::ArrayOfObject,
                _ => ShapeKind::ArrayOfScalar,
            },
            Shape::Either { .. } => ShapeKind::Polymorphic,
        }
    }

    pub fn native_type(&self, types: &dyn TypeSystem) -> String {
        match self {
            Shape::Single(atom) => atom.native_type(types),
            Shape::List(element) => types.list(&element.native_type(types)),
            Shape::Either { single, element } => {
                let list = types.list(&element.native_type(types));
                types.either(&single.native_type(types), &list)
            }
        }
    }

    /// The atom held when the value is not a sequence.
    pub fn single(&self) -> Option<&Atom> {
        match self {
            Shape::Single(atom) | Shape::Either { single: atom, .. } => Some(atom),
            Shape::List(_) => None,
        }
    }

    /// The element shape when the value may be a sequence.
    pub fn element(&self) -> Option<&Shape> {
        match self {
            Shape::List(element) | Shape::Either { element, .. } => Some(element),
            Shape::Single(_) => None,
        }
    }

    /// The atom of a single-level element, if the element is not itself nested.
    pub fn element_atom(&self) -> Option<&Atom> {
        match self.element()? {
            Shape::Single(atom) => Some(atom),
            _ => None,
        }
    }

    /// Whether any level of this shape refers to the result base.
    pub fn mentions_result(&self) -> bool {
        match self {
            Shape::Single(atom) => *atom == Atom::Result,
            Shape::List(element) => element.mentions_result(),
            Shape::Either { single, element } => *single == Atom::Result || element.mentions_result(),
        }
    }

    /// Every object name referenced at any level.
    pub fn object_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_object_names(&mut names);
        names
    }

    fn collect_object_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Shape::Single(atom) => out.extend(atom.object_name()),
            Shape::List(element) => element.collect_object_names(out),
            Shape::Either { single, element } => {
                out.extend(single.object_name());
                element.collect_object_names(out);
            }
        }
    }
}
