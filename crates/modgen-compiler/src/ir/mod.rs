//! Intermediate representation shared by every back-end.
//!
//! The schema document is turned into classified [`Shape`]s and uniform
//! [`Entity`] lists once per run. Renderers only ever see this layer.

mod entity;
mod shape;

pub use entity::{
    collect, is_sentinel, CollectOptions, Entity, EntityKind, MethodFlags, Property, SchemaModel,
    SENTINELS,
};
pub use shape::{Atom, Primitive, Shape, ShapeKind, TypeSystem, RESULT_SENTINEL};
