use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// The two shapes a `RunspaceAvailability` response's `SetMinMaxRunspacesResponse`
/// field can take, depending on which request it answers (MS-PSRP §2.2.2.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityResult {
    /// Answers `GetAvailableRunspaces`: the current available-runspace count.
    Count(i64),
    /// Answers `SetMaxRunspaces`/`SetMinRunspaces`/`ResetRunspaceState`.
    Success(bool),
}

/// Server-to-client response correlated back to one of the above requests
/// by `call_id` (MS-PSRP §2.2.2.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunspaceAvailability {
    pub call_id: i64,
    pub result: AvailabilityResult,
}

impl PsObjectWithType for RunspaceAvailability {
    fn message_type(&self) -> MessageType {
        MessageType::RunspaceAvailability
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<RunspaceAvailability> for ComplexObject {
    fn from(msg: RunspaceAvailability) -> Self {
        let value = match msg.result {
            AvailabilityResult::Count(count) => PsValue::from(count),
            AvailabilityResult::Success(ok) => PsValue::from(ok),
        };
        ComplexObject::standard()
            .with_extended("ci", msg.call_id)
            .with_extended("SetMinMaxRunspacesResponse", value)
    }
}

impl TryFrom<&ComplexObject> for RunspaceAvailability {
    type Error = PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let call_id = value
            .require_extended("ci")?
            .as_i64()
            .ok_or_else(|| PsrpError::InvalidMessage("ci is not an I64".to_string()))?;
        let response = value.require_extended("SetMinMaxRunspacesResponse")?;
        let result = if let Some(count) = response.as_i64() {
            AvailabilityResult::Count(count)
        } else if let Some(ok) = response.as_bool() {
            AvailabilityResult::Success(ok)
        } else {
            return Err(PsrpError::InvalidMessage(
                "SetMinMaxRunspacesResponse is neither an I64 nor a Bool".to_string(),
            ));
        };

        Ok(Self { call_id, result })
    }
}
