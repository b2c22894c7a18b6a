mod container;
mod deserialize;
mod primitive;
mod property;
mod serialize;
mod types;
mod value;

pub use container::{Container, PsEnum};
pub use deserialize::{deserialize_value, DeserializationContext};
pub use primitive::PsPrimitiveValue;
pub use property::PsProperty;
pub use serialize::{serialize_value, SerializationContext};
pub use types::PsType;
pub use value::{ComplexObject, ComplexObjectContent, PsValue};
