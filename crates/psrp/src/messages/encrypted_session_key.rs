use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Server-to-client encrypted session key (MS-PSRP §2.2.2.4). Carries
/// whatever `ServerKeyExchange::wrap_session_key` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSessionKey {
    pub encrypted_session_key: String,
}

impl PsObjectWithType for EncryptedSessionKey {
    fn message_type(&self) -> MessageType {
        MessageType::EncryptedSessionKey
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<EncryptedSessionKey> for ComplexObject {
    fn from(value: EncryptedSessionKey) -> Self {
        ComplexObject::standard().with_extended("EncryptedSessionKey", value.encrypted_session_key)
    }
}

impl TryFrom<&ComplexObject> for EncryptedSessionKey {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let encrypted_session_key = value
            .require_extended("EncryptedSessionKey")?
            .as_str()
            .ok_or_else(|| PsrpError::InvalidMessage("EncryptedSessionKey is not a string".to_string()))?
            .to_string();
        Ok(Self {
            encrypted_session_key,
        })
    }
}
