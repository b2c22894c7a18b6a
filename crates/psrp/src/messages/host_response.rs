use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Shared wire shape for `RunspacePoolHostResponse`/`PipelineHostResponse`
/// (MS-PSRP §2.2.2.14/§2.2.2.17): correlates back to a `HostCall`'s `ci`
/// with an optional return value and/or error record. Methods that
/// `RemoteHostMethodId::expects_response` says are `void` carry neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResponse {
    pub call_id: i64,
    pub return_value: Option<PsValue>,
    pub error_record: Option<PsValue>,
}

pub fn to_complex_object(response: &HostResponse) -> ComplexObject {
    let mut obj = ComplexObject::standard().with_extended("ci", response.call_id);
    if let Some(v) = &response.return_value {
        obj = obj.with_extended("mr", v.clone());
    }
    if let Some(v) = &response.error_record {
        obj = obj.with_extended("me", v.clone());
    }
    obj
}

pub fn from_complex_object(value: &ComplexObject) -> Result<HostResponse> {
    let call_id = value
        .require_extended("ci")?
        .as_i64()
        .ok_or_else(|| PsrpError::InvalidMessage("ci is not an I64".to_string()))?;

    Ok(HostResponse {
        call_id,
        return_value: value.get_extended("mr").cloned(),
        error_record: value.get_extended("me").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_return_value() {
        let response = HostResponse {
            call_id: 3,
            return_value: Some(PsValue::from("PowerShell")),
            error_record: None,
        };
        let obj = to_complex_object(&response);
        let restored = from_complex_object(&obj).unwrap();
        assert_eq!(response, restored);
    }

    #[test]
    fn round_trips_void_response() {
        let response = HostResponse {
            call_id: 1,
            return_value: None,
            error_record: None,
        };
        let obj = to_complex_object(&response);
        let restored = from_complex_object(&obj).unwrap();
        assert_eq!(response, restored);
    }
}
