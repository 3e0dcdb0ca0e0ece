use crate::prelude::*;

///
/// Relation
///
/// A nested relation declared on the `entity` sub-object of a resource.
/// The normalizer extracts embedded targets into their own kind bucket and
/// leaves the target id in `field`.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Relation {
    pub field: &'static str,
    pub target: EntityKind,
    pub cardinality: Cardinality,
}

impl Relation {
    #[must_use]
    pub const fn one(field: &'static str, target: &'static str) -> Self {
        Self::new(field, target, Cardinality::One)
    }

    #[must_use]
    pub const fn opt(field: &'static str, target: &'static str) -> Self {
        Self::new(field, target, Cardinality::Opt)
    }

    #[must_use]
    pub const fn many(field: &'static str, target: &'static str) -> Self {
        Self::new(field, target, Cardinality::Many)
    }

    const fn new(field: &'static str, target: &'static str, cardinality: Cardinality) -> Self {
        Self {
            field,
            target: EntityKind::from_static(target),
            cardinality,
        }
    }
}
