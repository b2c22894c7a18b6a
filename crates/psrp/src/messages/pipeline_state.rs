use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::pipeline::PSInvocationState;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Server-to-client pipeline state transition (MS-PSRP §2.2.2.22).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStateMessage {
    pub pipeline_state: PSInvocationState,
    pub exception_as_error_record: Option<PsValue>,
}

impl PipelineStateMessage {
    pub fn running() -> Self {
        Self {
            pipeline_state: PSInvocationState::Running,
            exception_as_error_record: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            pipeline_state: PSInvocationState::Completed,
            exception_as_error_record: None,
        }
    }

    pub fn failed_with_error(error_record: PsValue) -> Self {
        Self {
            pipeline_state: PSInvocationState::Failed,
            exception_as_error_record: Some(error_record),
        }
    }

    pub fn stopped_with_error(error_record: PsValue) -> Self {
        Self {
            pipeline_state: PSInvocationState::Stopped,
            exception_as_error_record: Some(error_record),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.pipeline_state.is_terminal()
    }
}

impl PsObjectWithType for PipelineStateMessage {
    fn message_type(&self) -> MessageType {
        MessageType::PipelineState
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<PipelineStateMessage> for ComplexObject {
    fn from(msg: PipelineStateMessage) -> Self {
        let mut obj =
            ComplexObject::standard().with_extended("PipelineState", msg.pipeline_state.as_i32());
        if let Some(record) = msg.exception_as_error_record {
            obj = obj.with_extended("ExceptionAsErrorRecord", record);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for PipelineStateMessage {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let pipeline_state = PSInvocationState::try_from(
            value
                .require_extended("PipelineState")?
                .as_i32()
                .ok_or_else(|| PsrpError::InvalidMessage("PipelineState is not an I32".to_string()))?,
        )?;
        let exception_as_error_record = value.get_extended("ExceptionAsErrorRecord").cloned();

        Ok(Self {
            pipeline_state,
            exception_as_error_record,
        })
    }
}
