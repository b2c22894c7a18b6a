use crate::envelope::{MessageType, ProtocolVersion};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// The first message either side sends: protocol/PS/serialization versions,
/// exchanged before anything else can happen (MS-PSRP §2.2.2.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCapability {
    pub protocol_version: ProtocolVersion,
    pub ps_version: String,
    pub serialization_version: String,
    pub time_zone: Option<String>,
}

impl SessionCapability {
    /// The capability this crate advertises.
    pub fn current(ps_version: impl Into<String>) -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            ps_version: ps_version.into(),
            serialization_version: "1.1.0.1".to_string(),
            time_zone: None,
        }
    }
}

impl PsObjectWithType for SessionCapability {
    fn message_type(&self) -> MessageType {
        MessageType::SessionCapability
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<SessionCapability> for ComplexObject {
    fn from(cap: SessionCapability) -> Self {
        let mut obj = ComplexObject::standard()
            .with_extended("protocolversion", cap.protocol_version.to_string())
            .with_extended("PSVersion", cap.ps_version)
            .with_extended("SerializationVersion", cap.serialization_version);
        if let Some(tz) = cap.time_zone {
            obj = obj.with_extended("TimeZone", PsValue::Primitive(crate::value::PsPrimitiveValue::ByteArray(
                tz.into_bytes(),
            )));
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for SessionCapability {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let protocol_version = value
            .require_extended("protocolversion")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("protocolversion is not a string".to_string()))?
            .parse()
            .map_err(|_| PsrpError::InvalidMessage("protocolversion is not a valid version".to_string()))?;
        let ps_version = value
            .require_extended("PSVersion")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("PSVersion is not a string".to_string()))?
            .to_string();
        let serialization_version = value
            .require_extended("SerializationVersion")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("SerializationVersion is not a string".to_string()))?
            .to_string();
        let time_zone = value.get_extended("TimeZone").and_then(|v| match v {
            PsValue::Primitive(crate::value::PsPrimitiveValue::ByteArray(bytes)) => {
                String::from_utf8(bytes.clone()).ok()
            }
            _ => None,
        });

        Ok(Self {
            protocol_version,
            ps_version,
            serialization_version,
            time_zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_round_trips() {
        let cap = SessionCapability::current("7.4.0");
        let obj: ComplexObject = cap.clone().into();
        let restored = SessionCapability::try_from(&obj).unwrap();
        assert_eq!(cap, restored);
    }

    #[test]
    fn round_trips_with_time_zone() {
        let cap = SessionCapability {
            protocol_version: ProtocolVersion::new(2, 2),
            ps_version: "5.1".to_string(),
            serialization_version: "1.1.0.1".to_string(),
            time_zone: Some("UTC".to_string()),
        };
        let obj: ComplexObject = cap.clone().into();
        let restored = SessionCapability::try_from(&obj).unwrap();
        assert_eq!(cap, restored);
    }
}
