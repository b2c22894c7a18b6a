//! `SetMaxRunspaces`, `SetMinRunspaces` and `ResetRunspaceState` (MS-PSRP
//! §2.2.2.7/§2.2.2.8/§2.2.2.6): all three are client-to-server, all three
//! correlate their `RunspaceAvailability` response by `ci`.

use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

fn call_id_from(value: &ComplexObject) -> Result<i64> {
    value
        .require_extended("ci")?
        .as_i64()
        .ok_or_else(|| PsrpError::InvalidMessage("ci is not an I64".to_string()))
}

/// Client-to-server request to change the pool's maximum runspace count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMaxRunspaces {
    pub call_id: i64,
    pub max_runspaces: i32,
}

impl PsObjectWithType for SetMaxRunspaces {
    fn message_type(&self) -> MessageType {
        MessageType::SetMaxRunspaces
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<SetMaxRunspaces> for ComplexObject {
    fn from(msg: SetMaxRunspaces) -> Self {
        ComplexObject::standard()
            .with_extended("ci", msg.call_id)
            .with_extended("MaxRunspaces", msg.max_runspaces)
    }
}

impl TryFrom<&ComplexObject> for SetMaxRunspaces {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self {
            call_id: call_id_from(value)?,
            max_runspaces: value
                .require_extended("MaxRunspaces")?
                .as_i32()
                .ok_or_else(|| PsrpError::InvalidMessage("MaxRunspaces is not an I32".to_string()))?,
        })
    }
}

/// Client-to-server request to change the pool's minimum runspace count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMinRunspaces {
    pub call_id: i64,
    pub min_runspaces: i32,
}

impl PsObjectWithType for SetMinRunspaces {
    fn message_type(&self) -> MessageType {
        MessageType::SetMinRunspaces
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<SetMinRunspaces> for ComplexObject {
    fn from(msg: SetMinRunspaces) -> Self {
        ComplexObject::standard()
            .with_extended("ci", msg.call_id)
            .with_extended("MinRunspaces", msg.min_runspaces)
    }
}

impl TryFrom<&ComplexObject> for SetMinRunspaces {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self {
            call_id: call_id_from(value)?,
            min_runspaces: value
                .require_extended("MinRunspaces")?
                .as_i32()
                .ok_or_else(|| PsrpError::InvalidMessage("MinRunspaces is not an I32".to_string()))?,
        })
    }
}

/// Client-to-server request to drop the pool's local runspace state back to
/// its initial snapshot (MS-PSRP §2.2.2.6). Carries only the correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetRunspaceState {
    pub call_id: i64,
}

impl PsObjectWithType for ResetRunspaceState {
    fn message_type(&self) -> MessageType {
        MessageType::ResetRunspaceState
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<ResetRunspaceState> for ComplexObject {
    fn from(msg: ResetRunspaceState) -> Self {
        ComplexObject::standard().with_extended("ci", msg.call_id)
    }
}

impl TryFrom<&ComplexObject> for ResetRunspaceState {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        Ok(Self {
            call_id: call_id_from(value)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_max_runspaces_round_trips() {
        let msg = SetMaxRunspaces {
            call_id: 1,
            max_runspaces: 10,
        };
        let obj: ComplexObject = msg.into();
        let restored = SetMaxRunspaces::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn set_min_runspaces_round_trips() {
        let msg = SetMinRunspaces {
            call_id: 2,
            min_runspaces: 1,
        };
        let obj: ComplexObject = msg.into();
        let restored = SetMinRunspaces::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn reset_runspace_state_round_trips() {
        let msg = ResetRunspaceState { call_id: 3 };
        let obj: ComplexObject = msg.into();
        let restored = ResetRunspaceState::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }
}
