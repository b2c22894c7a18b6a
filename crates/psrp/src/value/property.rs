use super::PsValue;

/// A single named entry of an `<Props>` (adapted) or `<MS>` (extended)
/// property bag. Bags are insertion-ordered (see [`crate::value::container`]
/// and [`super::ComplexObject`]), so this type carries only the pair and
/// leaves ordering to the `IndexMap` that stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PsProperty {
    pub name: String,
    pub value: PsValue,
}

impl PsProperty {
    pub fn new(name: impl Into<String>, value: impl Into<PsValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
