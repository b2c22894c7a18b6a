use crate::envelope::MessageType;
use crate::messages::host_call::{self, HostCall};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Server-to-client host method call targeting a specific pipeline's host
/// (MS-PSRP §2.2.2.16) -- e.g. `Write-Progress`/`Read-Host` during a running
/// command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineHostCall(pub HostCall);

impl PsObjectWithType for PipelineHostCall {
    fn message_type(&self) -> MessageType {
        MessageType::PipelineHostCall
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<PipelineHostCall> for ComplexObject {
    fn from(call: PipelineHostCall) -> Self {
        host_call::to_complex_object(&call.0)
    }
}

impl TryFrom<&ComplexObject> for PipelineHostCall {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self(host_call::from_complex_object(value)?))
    }
}
