use crate::envelope::MessageType;
use crate::messages::host_response::{self, HostResponse};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Client-to-server reply to a `RunspacePoolHostCall` (MS-PSRP §2.2.2.14).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunspacePoolHostResponse(pub HostResponse);

impl PsObjectWithType for RunspacePoolHostResponse {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacePoolHostResponse
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<RunspacePoolHostResponse> for ComplexObject {
    fn from(response: RunspacePoolHostResponse) -> Self {
        host_response::to_complex_object(&response.0)
    }
}

impl TryFrom<&ComplexObject> for RunspacePoolHostResponse {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self(host_response::from_complex_object(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let response = RunspacePoolHostResponse(HostResponse {
            call_id: 9,
            return_value: Some(PsValue::from(true)),
            error_record: None,
        });
        let obj: ComplexObject = response.clone().into();
        let restored = RunspacePoolHostResponse::try_from(&obj).unwrap();
        assert_eq!(response, restored);
    }
}
