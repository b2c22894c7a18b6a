use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Client-to-server request to reattach to an already-open runspace pool
/// (MS-PSRP §2.2.2.5). Both fields are omitted unless the client wants to
/// change the pool's bounds as part of reconnecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectRunspacePool {
    pub min_runspaces: Option<i32>,
    pub max_runspaces: Option<i32>,
}

impl PsObjectWithType for ConnectRunspacePool {
    fn message_type(&self) -> MessageType {
        MessageType::ConnectRunspacePool
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<ConnectRunspacePool> for ComplexObject {
    fn from(msg: ConnectRunspacePool) -> Self {
        let mut obj = ComplexObject::standard();
        if let Some(n) = msg.min_runspaces {
            obj = obj.with_extended("MinRunspaces", n);
        }
        if let Some(n) = msg.max_runspaces {
            obj = obj.with_extended("MaxRunspaces", n);
        }
        obj
    }
}

impl TryFrom<&ComplexObject> for ConnectRunspacePool {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self {
            min_runspaces: value.get_extended("MinRunspaces").and_then(PsValue::as_i32),
            max_runspaces: value.get_extended("MaxRunspaces").and_then(PsValue::as_i32),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_round_trips() {
        let msg = ConnectRunspacePool::default();
        let obj: ComplexObject = msg.into();
        let restored = ConnectRunspacePool::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn with_bounds_round_trips() {
        let msg = ConnectRunspacePool {
            min_runspaces: Some(1),
            max_runspaces: Some(5),
        };
        let obj: ComplexObject = msg.into();
        let restored = ConnectRunspacePool::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }
}
