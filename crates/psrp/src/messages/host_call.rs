use crate::host::RemoteHostMethodId;
use crate::value::{ComplexObject, ComplexObjectContent, Container, PsType, PsValue};
use crate::{PsrpError, Result};

/// Shared wire shape for `RunspacePoolHostCall`/`PipelineHostCall` (MS-PSRP
/// §2.2.2.13/§2.2.2.16): a correlation id, the host method being invoked,
/// and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCall {
    pub call_id: i64,
    pub method_id: RemoteHostMethodId,
    pub parameters: Vec<PsValue>,
}

pub fn to_complex_object(call: &HostCall) -> ComplexObject {
    let method_obj = ComplexObject {
        type_def: Some(PsType::remote_host_method_id()),
        to_string: Some(format!("{:?}", call.method_id)),
        content: ComplexObjectContent::EnumValue(crate::value::PsEnum {
            value: call.method_id.value(),
        }),
        ..ComplexObject::standard()
    };
    let parameters_obj = ComplexObject {
        type_def: Some(PsType::array_list()),
        content: ComplexObjectContent::Container(Container::List(call.parameters.clone())),
        ..ComplexObject::standard()
    };

    ComplexObject::standard()
        .with_extended("ci", call.call_id)
        .with_extended("mi", PsValue::Object(method_obj))
        .with_extended("mp", PsValue::Object(parameters_obj))
}

pub fn from_complex_object(value: &ComplexObject) -> Result<HostCall> {
    let call_id = value
        .require_extended("ci")?
        .as_i64()
        .ok_or_else(|| PsrpError::InvalidMessage("ci is not an I64".to_string()))?;

    let mi_obj = value
        .require_extended("mi")?
        .as_object()
        .ok_or_else(|| PsrpError::InvalidMessage("mi is not an Object".to_string()))?;
    let method_value = mi_obj
        .as_enum_value()
        .ok_or_else(|| PsrpError::InvalidMessage("mi is not an enum value".to_string()))?;
    let method_id = RemoteHostMethodId::try_from(method_value)?;

    let mp_obj = value
        .require_extended("mp")?
        .as_object()
        .ok_or_else(|| PsrpError::InvalidMessage("mp is not an Object".to_string()))?;
    let parameters = match &mp_obj.content {
        ComplexObjectContent::Container(Container::List(items)) => items.clone(),
        _ => Vec::new(),
    };

    Ok(HostCall {
        call_id,
        method_id,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let call = HostCall {
            call_id: 7,
            method_id: RemoteHostMethodId::ReadLine,
            parameters: vec![PsValue::from("prompt")],
        };
        let obj = to_complex_object(&call);
        let restored = from_complex_object(&obj).unwrap();
        assert_eq!(call, restored);
    }

    #[test]
    fn round_trips_with_no_parameters() {
        let call = HostCall {
            call_id: 1,
            method_id: RemoteHostMethodId::SetShouldExit,
            parameters: Vec::new(),
        };
        let obj = to_complex_object(&call);
        let restored = from_complex_object(&obj).unwrap();
        assert_eq!(call, restored);
    }
}
