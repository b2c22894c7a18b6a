use indexmap::IndexMap;

use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, ComplexObjectContent, Container, PsPrimitiveValue, PsType, PsValue};
use crate::{PsrpError, Result};

/// Server-to-client message carrying whatever private state the server
/// wants the client to hold on to for the lifetime of the runspace pool
/// (MS-PSRP §2.2.2.15). Opaque to this crate; the embedder interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationPrivateData {
    pub data: Option<IndexMap<String, PsValue>>,
}

impl PsObjectWithType for ApplicationPrivateData {
    fn message_type(&self) -> MessageType {
        MessageType::ApplicationPrivateData
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<ApplicationPrivateData> for ComplexObject {
    fn from(app_data: ApplicationPrivateData) -> Self {
        let value = match app_data.data {
            Some(data) => {
                let mut dict = IndexMap::new();
                for (key, value) in data {
                    dict.insert(PsValue::from(key.as_str()), value);
                }
                PsValue::Object(ComplexObject {
                    type_def: Some(PsType::ps_primitive_dictionary()),
                    content: ComplexObjectContent::Container(Container::Dictionary(dict)),
                    ..ComplexObject::standard()
                })
            }
            None => PsValue::nil(),
        };
        ComplexObject::standard().with_extended("ApplicationPrivateData", value)
    }
}

impl TryFrom<&ComplexObject> for ApplicationPrivateData {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let prop = value.require_extended("ApplicationPrivateData")?;
        if matches!(prop, PsValue::Primitive(PsPrimitiveValue::Nil)) {
            return Ok(Self { data: None });
        }
        let PsValue::Object(obj) = prop else {
            return Err(PsrpError::InvalidMessage("ApplicationPrivateData is not an Object".to_string()));
        };
        let ComplexObjectContent::Container(Container::Dictionary(dict)) = &obj.content else {
            return Err(PsrpError::InvalidMessage("ApplicationPrivateData is not a Dictionary".to_string()));
        };

        let mut result = IndexMap::new();
        for (key, value) in dict {
            let key = key
                .as_str()
                .ok_or_else(|| PsrpError::InvalidMessage("ApplicationPrivateData key is not a string".to_string()))?;
            result.insert(key.to_string(), value.clone());
        }
        Ok(Self { data: Some(result) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_round_trips_as_nil() {
        let data = ApplicationPrivateData::default();
        let obj: ComplexObject = data.clone().into();
        let restored = ApplicationPrivateData::try_from(&obj).unwrap();
        assert_eq!(data, restored);
    }

    #[test]
    fn populated_round_trips() {
        let mut map = IndexMap::new();
        map.insert("Foo".to_string(), PsValue::from("bar"));
        let data = ApplicationPrivateData { data: Some(map) };
        let obj: ComplexObject = data.clone().into();
        let restored = ApplicationPrivateData::try_from(&obj).unwrap();
        assert_eq!(data, restored);
    }
}
