use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Client-to-server public key used for PSRP session key exchange
/// (MS-PSRP §2.2.2.3). Carries whatever `ClientKeyExchange::public_key_blob_base64`
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub public_key: String,
}

impl PsObjectWithType for PublicKey {
    fn message_type(&self) -> MessageType {
        MessageType::PublicKey
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<PublicKey> for ComplexObject {
    fn from(value: PublicKey) -> Self {
        ComplexObject::standard().with_extended("PublicKey", value.public_key)
    }
}

impl TryFrom<&ComplexObject> for PublicKey {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let public_key = value
            .require_extended("PublicKey")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("PublicKey is not a string".to_string()))?
            .to_string();
        Ok(Self { public_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let key = PublicKey {
            public_key: "base64blob".to_string(),
        };
        let obj: ComplexObject = key.clone().into();
        let restored = PublicKey::try_from(&obj).unwrap();
        assert_eq!(key, restored);
    }
}
