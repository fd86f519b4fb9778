// Member type classification against the primitive registry and known structs

use crate::primitive_registry::{PrimitiveRegistry, PrimitiveType};
use crate::schema::Struct;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    Primitive(&'a PrimitiveType),
    KnownStruct(&'a Struct),
    Unresolved,
}

// Primitives win over a struct of the same name; structs match first-wins
pub fn resolve<'a>(type_name: &str, structs: &'a [Struct], registry: &'a PrimitiveRegistry) -> Resolved<'a> {
    if let Some(primitive) = registry.get(type_name) {
        return Resolved::Primitive(primitive);
    }

    match structs.iter().find(|s| s.name == type_name) {
        Some(found) => Resolved::KnownStruct(found),
        None => Resolved::Unresolved,
    }
}

/// Byte size of `count` consecutive values of `primitive`, or `None` on overflow.
pub fn resolved_size(primitive: &PrimitiveType, count: u32) -> Option<u64> {
    u64::from(primitive.size).checked_mul(u64::from(count))
}
