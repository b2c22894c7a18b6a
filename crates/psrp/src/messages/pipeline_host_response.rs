use crate::envelope::MessageType;
use crate::messages::host_response::{self, HostResponse};
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Client-to-server reply to a `PipelineHostCall` (MS-PSRP §2.2.2.17).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineHostResponse(pub HostResponse);

impl PsObjectWithType for PipelineHostResponse {
    fn message_type(&self) -> MessageType {
        MessageType::PipelineHostResponse
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<PipelineHostResponse> for ComplexObject {
    fn from(response: PipelineHostResponse) -> Self {
        host_response::to_complex_object(&response.0)
    }
}

impl TryFrom<&ComplexObject> for PipelineHostResponse {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self(host_response::from_complex_object(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_error() {
        let response = PipelineHostResponse(HostResponse {
            call_id: 4,
            return_value: None,
            error_record: Some(PsValue::from("denied")),
        });
        let obj: ComplexObject = response.clone().into();
        let restored = PipelineHostResponse::try_from(&obj).unwrap();
        assert_eq!(response, restored);
    }
}
