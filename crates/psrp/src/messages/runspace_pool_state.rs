use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::pool::RunspacePoolState;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Server-to-client runspace pool state transition (MS-PSRP §2.2.2.21).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunspacePoolStateMessage {
    pub state: RunspacePoolState,
    pub error_record: Option<PsValue>,
}

impl RunspacePoolStateMessage {
    pub fn new(state: RunspacePoolState) -> Self {
        Self {
            state,
            error_record: None,
        }
    }

    pub fn broken(error_record: PsValue) -> Self {
        Self {
            state: RunspacePoolState::Broken,
            error_record: Some(error_record),
        }
    }
}

impl PsObjectWithType for RunspacePoolStateMessage {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacePoolState
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<RunspacePoolStateMessage> for ComplexObject {
    fn from(msg: RunspacePoolStateMessage) -> Self {
        let mut obj = ComplexObject::standard().with_extended("RunspaceState", msg.state.as_i32());
        if let Some(record) = msg.error_record {
            obj = obj.with_extended("ExceptionAsErrorRecord", record);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for RunspacePoolStateMessage {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let state = RunspacePoolState::try_from(
            value
                .require_extended("RunspaceState")?
                .as_i32()
                .ok_or_else(|| PsrpError::InvalidMessage("RunspaceState is not an I32".to_string()))?,
        )?;
        let error_record = value.get_extended("ExceptionAsErrorRecord").cloned();

        Ok(Self { state, error_record })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opened_round_trips() {
        let msg = RunspacePoolStateMessage::new(RunspacePoolState::Opened);
        let obj: ComplexObject = msg.clone().into();
        let restored = RunspacePoolStateMessage::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn broken_round_trips() {
        let msg = RunspacePoolStateMessage::broken(PsValue::from("boom"));
        let obj: ComplexObject = msg.clone().into();
        let restored = RunspacePoolStateMessage::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }
}
