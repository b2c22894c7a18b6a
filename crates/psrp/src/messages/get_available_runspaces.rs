use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{PsPrimitiveValue, PsValue};
use crate::{PsrpError, Result};

/// Client-to-server request for the current available-runspace count
/// (MS-PSRP §2.2.2.9). Bare `ci` correlation id, no wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetAvailableRunspaces {
    pub call_id: i64,
}

impl PsObjectWithType for GetAvailableRunspaces {
    fn message_type(&self) -> MessageType {
        MessageType::GetAvailableRunspaces
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Primitive(PsPrimitiveValue::I64(self.call_id))
    }
}

impl TryFrom<&PsValue> for GetAvailableRunspaces {
    type Error = PsrpError;

    fn try_from(value: &PsValue) -> Result<Self> {
        let call_id = value
            .as_i64()
            .ok_or_else(|| PsrpError::InvalidMessage("GetAvailableRunspaces payload is not an I64".to_string()))?;
        Ok(Self { call_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let msg = GetAvailableRunspaces { call_id: 12 };
        let value = msg.to_ps_object();
        let restored = GetAvailableRunspaces::try_from(&value).unwrap();
        assert_eq!(msg, restored);
    }
}
