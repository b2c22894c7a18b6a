use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Server-to-client reply to `ConnectRunspacePool`/the initial open
/// handshake, carrying the pool's actual bounds (MS-PSRP §2.2.2.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunspacePoolInitData {
    pub min_runspaces: i32,
    pub max_runspaces: i32,
}

impl PsObjectWithType for RunspacePoolInitData {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacePoolInitData
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<RunspacePoolInitData> for ComplexObject {
    fn from(msg: RunspacePoolInitData) -> Self {
        ComplexObject::standard()
            .with_extended("MinRunspaces", msg.min_runspaces)
            .with_extended("MaxRunspaces", msg.max_runspaces)
    }
}

impl TryFrom<&ComplexObject> for RunspacePoolInitData {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self {
            min_runspaces: value
                .require_extended("MinRunspaces")?
                .as_i32()
                .ok_or_else(|| PsrpError::InvalidMessage("MinRunspaces is not an I32".to_string()))?,
            max_runspaces: value
                .require_extended("MaxRunspaces")?
                .as_i32()
                .ok_or_else(|| PsrpError::InvalidMessage("MaxRunspaces is not an I32".to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let msg = RunspacePoolInitData {
            min_runspaces: 1,
            max_runspaces: 10,
        };
        let obj: ComplexObject = msg.into();
        let restored = RunspacePoolInitData::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }
}
