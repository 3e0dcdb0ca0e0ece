mod entity;
mod kind;
mod relation;

pub use entity::EntitySchema;
pub use kind::EntityKind;
pub use relation::Relation;
