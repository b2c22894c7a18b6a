use std::cell::RefCell;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Container, PsEnum, PsPrimitiveValue, PsProperty, PsType};

/// Either a leaf primitive, a compound object, or a shared/cyclic handle to
/// one (see `Shared`).
#[derive(Debug, Clone)]
pub enum PsValue {
    Primitive(PsPrimitiveValue),
    Object(ComplexObject),
    /// A reference-counted handle to a `ComplexObject`, used to build or
    /// reconstruct shared subgraphs and cycles (spec §4.4 `Ref`/`RefId`).
    /// Two `Shared` values compare equal, and hash equal, only when they
    /// point at the *same* object (`Rc::ptr_eq`), not merely an equal one —
    /// this is what lets `obj.self` satisfy identity with `obj` after a
    /// deserialize round trip.
    Shared(Rc<RefCell<ComplexObject>>),
}

impl PartialEq for PsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PsValue::Primitive(a), PsValue::Primitive(b)) => a == b,
            (PsValue::Object(a), PsValue::Object(b)) => a == b,
            (PsValue::Shared(a), PsValue::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for PsValue {}

impl Hash for PsValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PsValue::Primitive(p) => p.hash(state),
            PsValue::Object(o) => o.hash(state),
            PsValue::Shared(rc) => (Rc::as_ptr(rc) as usize).hash(state),
        }
    }
}

impl<IntoPrimitive> From<IntoPrimitive> for PsValue
where
    IntoPrimitive: Into<PsPrimitiveValue>,
{
    fn from(p: IntoPrimitive) -> Self {
        PsValue::Primitive(p.into())
    }
}

impl Display for PsValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PsValue::Primitive(p) => p.fmt(f),
            PsValue::Object(o) => o.fmt(f),
            PsValue::Shared(rc) => rc.borrow().fmt(f),
        }
    }
}

impl PsValue {
    pub fn as_object(&self) -> Option<&ComplexObject> {
        if let PsValue::Object(obj) = self {
            Some(obj)
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PsValue::Primitive(PsPrimitiveValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PsValue::Primitive(PsPrimitiveValue::I32(val)) => Some(*val),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PsValue::Primitive(PsPrimitiveValue::I64(val)) => Some(*val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PsValue::Primitive(PsPrimitiveValue::Str(val)) => Some(val),
            _ => None,
        }
    }

    pub fn nil() -> Self {
        PsValue::Primitive(PsPrimitiveValue::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, PsValue::Primitive(PsPrimitiveValue::Nil))
    }

    /// Wraps a list of values as a `System.Collections.ArrayList`.
    pub fn from_list(values: Vec<PsValue>) -> Self {
        PsValue::Object(ComplexObject {
            type_def: Some(PsType::array_list()),
            to_string: None,
            content: ComplexObjectContent::Container(Container::List(values)),
            adapted_properties: IndexMap::new(),
            extended_properties: IndexMap::new(),
        })
    }

    pub fn from_string_list(strings: Vec<String>) -> Self {
        Self::from_list(strings.into_iter().map(Into::into).collect())
    }

    /// Wraps an enum's underlying `i32` with its type-name stack and
    /// `ToString` representation.
    pub fn from_enum(type_def: PsType, to_string: impl Into<String>, value: i32) -> Self {
        PsValue::Object(ComplexObject {
            type_def: Some(type_def),
            to_string: Some(to_string.into()),
            content: ComplexObjectContent::EnumValue(PsEnum { value }),
            adapted_properties: IndexMap::new(),
            extended_properties: IndexMap::new(),
        })
    }
}

/// Whether a `ComplexObject`'s content is a plain property bag or one of
/// the container wrappers (`<LST>`, `<STK>`, `<QUE>`, `<DCT>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ComplexObjectContent {
    #[default]
    Standard,
    Container(Container),
    /// An enum's underlying value, serialized as a bare primitive leaf
    /// directly under `<Obj>` rather than inside `<Props>`/`<MS>` (e.g.
    /// `RemoteHostMethodId`, `ApartmentState`).
    EnumValue(PsEnum),
}

/// A typed object: type-name stack, adapted/extended property bags
/// (insertion-ordered), optional `ToString`, and optional container
/// content.
///
/// <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/4706ecae-1feb-4f1a-8a4d-4e3db8c97b46>
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplexObject {
    pub type_def: Option<PsType>,
    pub to_string: Option<String>,
    pub content: ComplexObjectContent,
    pub adapted_properties: IndexMap<String, PsProperty>,
    pub extended_properties: IndexMap<String, PsProperty>,
}

// `IndexMap` has no `Hash` impl, so this can't be derived; property bags are
// folded the same order-independent way `Container::Dictionary` is.
impl Hash for ComplexObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_def.hash(state);
        self.to_string.hash(state);
        self.content.hash(state);
        hash_property_bag(&self.adapted_properties, state);
        hash_property_bag(&self.extended_properties, state);
    }
}

fn hash_property_bag<H: Hasher>(bag: &IndexMap<String, PsProperty>, state: &mut H) {
    let mut acc = 0u64;
    for (name, prop) in bag {
        let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
        name.hash(&mut entry_hasher);
        prop.hash(&mut entry_hasher);
        acc ^= entry_hasher.finish();
    }
    acc.hash(state);
}

impl Display for ComplexObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(to_string) = &self.to_string {
            return write!(f, "{to_string}");
        }
        match &self.content {
            ComplexObjectContent::Container(container) => container.fmt(f),
            ComplexObjectContent::EnumValue(e) => e.fmt(f),
            ComplexObjectContent::Standard => write!(f, ""),
        }
    }
}

impl ComplexObject {
    pub fn standard() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, type_def: PsType) -> Self {
        self.type_def = Some(type_def);
        self
    }

    #[must_use]
    pub fn with_extended(mut self, name: impl Into<String>, value: impl Into<PsValue>) -> Self {
        let name = name.into();
        self.extended_properties
            .insert(name.clone(), PsProperty::new(name, value));
        self
    }

    pub fn get_extended(&self, name: &str) -> Option<&PsValue> {
        self.extended_properties.get(name).map(|p| &p.value)
    }

    pub fn require_extended<'a>(&'a self, name: &str) -> crate::Result<&'a PsValue> {
        self.get_extended(name)
            .ok_or_else(|| crate::PsrpError::InvalidMessage(format!("missing property: {name}")))
    }

    pub fn as_enum_value(&self) -> Option<i32> {
        match &self.content {
            ComplexObjectContent::EnumValue(e) => Some(e.value),
            _ => None,
        }
    }
}
