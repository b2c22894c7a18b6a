use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{PsPrimitiveValue, PsValue};
use crate::{PsrpError, Result};

/// Server-to-client request for the client's key exchange public key
/// (MS-PSRP §2.2.2.2). The data blob is equivalent to an empty string,
/// serialized as a bare `<S></S>` leaf with no wrapping object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicKeyRequest;

impl PsObjectWithType for PublicKeyRequest {
    fn message_type(&self) -> MessageType {
        MessageType::PublicKeyRequest
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Primitive(PsPrimitiveValue::Str(String::new()))
    }
}

impl TryFrom<&PsValue> for PublicKeyRequest {
    type Error = PsrpError;

    fn try_from(value: &PsValue) -> Result<Self> {
        match value {
            PsValue::Primitive(PsPrimitiveValue::Str(s)) if s.is_empty() => Ok(Self),
            PsValue::Primitive(PsPrimitiveValue::Nil) => Ok(Self),
            other => Err(PsrpError::InvalidMessage(format!(
                "invalid PublicKeyRequest payload: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let req = PublicKeyRequest;
        let value = req.to_ps_object();
        let restored = PublicKeyRequest::try_from(&value).unwrap();
        assert_eq!(req, restored);
    }
}
