//! Name-keyed dispatch tables for the generated object index.
//!
//! Wire payloads name their concrete type with a string, so every target
//! gets one generated lookup from lower-cased entity name to constructor.

use crate::ir::{is_sentinel, Entity, SchemaModel};

/// One dispatch entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry<'a> {
    pub key: String,
    pub entity: &'a Entity,
}

/// The three lookup tables rendered into the index file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityIndex<'a> {
    pub objects: Vec<IndexEntry<'a>>,
    pub components: Vec<IndexEntry<'a>>,
    pub results: Vec<IndexEntry<'a>>,
}

impl<'a> EntityIndex<'a> {
    pub fn build(model: &'a SchemaModel) -> Self {
        Self {
            objects: table(&model.objects),
            components: table(&model.components),
            results: table(&model.results),
        }
    }

    pub fn create_object(&self, name: &str) -> Option<&'a Entity> {
        lookup(&self.objects, name)
    }

    pub fn create_component(&self, name: &str) -> Option<&'a Entity> {
        lookup(&self.components, name)
    }

    pub fn create_result(&self, name: &str) -> Option<&'a Entity> {
        lookup(&self.results, name)
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.components.len() + self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn table(entities: &[Entity]) -> Vec<IndexEntry<'_>> {
    let mut entries: Vec<IndexEntry<'_>> = Vec::with_capacity(entities.len());
    for entity in entities {
        if is_sentinel(&entity.name) {
            continue;
        }
        let key = entity.index_key();
        if entries.iter().any(|e| e.key == key) {
            tracing::warn!(entity = %entity.name, "duplicate index key after lower-casing, keeping the first");
            continue;
        }
        entries.push(IndexEntry { key, entity });
    }
    entries
}

fn lookup<'a>(entries: &[IndexEntry<'a>], name: &str) -> Option<&'a Entity> {
    let key = name.to_lowercase();
    entries.iter().find(|e| e.key == key).map(|e| e.entity)
}
