pub mod application_arguments;
pub mod application_private_data;
pub mod enums;
pub mod host;

pub use application_arguments::{ApplicationArguments, PsVersionTable};
pub use application_private_data::ApplicationPrivateData;
pub use enums::{ApartmentState, PSThreadOptions, PipelineResultTypes};
pub use host::{Coordinates, HostDefaultData, HostInfo, Size};

use crate::envelope::MessageType;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::Result;

/// Client-to-server message that opens a runspace pool (MS-PSRP §2.2.2.10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRunspacePool {
    pub min_runspaces: i32,
    pub max_runspaces: i32,
    pub thread_options: PSThreadOptions,
    pub apartment_state: ApartmentState,
    pub host_info: HostInfo,
    pub application_arguments: ApplicationArguments,
}

impl PsObjectWithType for InitRunspacePool {
    fn message_type(&self) -> MessageType {
        MessageType::InitRunspacePool
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.clone().into())
    }
}

impl From<InitRunspacePool> for ComplexObject {
    fn from(init: InitRunspacePool) -> Self {
        ComplexObject::standard()
            .with_extended("MinRunspaces", init.min_runspaces)
            .with_extended("MaxRunspaces", init.max_runspaces)
            .with_extended("PSThreadOptions", init.thread_options.to_ps_value())
            .with_extended("ApartmentState", init.apartment_state.to_ps_value())
            .with_extended("HostInfo", PsValue::Object(init.host_info.to_ps_object()))
            .with_extended("ApplicationArguments", init.application_arguments.to_ps_value())
    }
}

impl TryFrom<&ComplexObject> for InitRunspacePool {
    type Error = crate::PsrpError;

    fn try_from(value: &ComplexObject) -> Result<Self> {
        let min_runspaces = value
            .require_extended("MinRunspaces")?
            .as_i32()
            .ok_or_else(|| crate::PsrpError::InvalidMessage("MinRunspaces is not an I32".to_string()))?;
        let max_runspaces = value
            .require_extended("MaxRunspaces")?
            .as_i32()
            .ok_or_else(|| crate::PsrpError::InvalidMessage("MaxRunspaces is not an I32".to_string()))?;

        let thread_options_value = value
            .require_extended("PSThreadOptions")?
            .as_object()
            .and_then(ComplexObject::as_enum_value)
            .ok_or_else(|| crate::PsrpError::InvalidMessage("PSThreadOptions is not an enum value".to_string()))?;
        let thread_options = PSThreadOptions::try_from(thread_options_value)?;

        let apartment_state_value = value
            .require_extended("ApartmentState")?
            .as_object()
            .and_then(ComplexObject::as_enum_value)
            .ok_or_else(|| crate::PsrpError::InvalidMessage("ApartmentState is not an enum value".to_string()))?;
        let apartment_state = ApartmentState::try_from(apartment_state_value)?;

        let host_info_obj = value
            .require_extended("HostInfo")?
            .as_object()
            .ok_or_else(|| crate::PsrpError::InvalidMessage("HostInfo is not an Object".to_string()))?;
        let host_info = HostInfo::from_ps_object(host_info_obj)?;

        let application_arguments =
            ApplicationArguments::from_ps_value(value.require_extended("ApplicationArguments")?)?;

        Ok(Self {
            min_runspaces,
            max_runspaces,
            thread_options,
            apartment_state,
            host_info,
            application_arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_runspace_pool_round_trips() {
        let msg = InitRunspacePool {
            min_runspaces: 1,
            max_runspaces: 1,
            thread_options: PSThreadOptions::Default,
            apartment_state: ApartmentState::Unknown,
            host_info: HostInfo::enabled(HostDefaultData::default()),
            application_arguments: ApplicationArguments::default(),
        };
        let obj: ComplexObject = msg.clone().into();
        let restored = InitRunspacePool::try_from(&obj).unwrap();
        assert_eq!(msg, restored);
    }
}
