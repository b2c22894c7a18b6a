use crate::envelope::MessageType;
use crate::messages::host_call::{self, HostCall};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Server-to-client host method call targeting the runspace pool's host
/// rather than a pipeline's (MS-PSRP §2.2.2.13).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunspacePoolHostCall(pub HostCall);

impl PsObjectWithType for RunspacePoolHostCall {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacePoolHostCall
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<RunspacePoolHostCall> for ComplexObject {
    fn from(call: RunspacePoolHostCall) -> Self {
        host_call::to_complex_object(&call.0)
    }
}

impl TryFrom<&ComplexObject> for RunspacePoolHostCall {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self(host_call::from_complex_object(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RemoteHostMethodId;

    #[test]
    fn round_trips() {
        let call = RunspacePoolHostCall(HostCall {
            call_id: 3,
            method_id: RemoteHostMethodId::GetName,
            parameters: Vec::new(),
        });
        let obj: ComplexObject = call.clone().into();
        let restored = RunspacePoolHostCall::try_from(&obj).unwrap();
        assert_eq!(call, restored);
    }
}
