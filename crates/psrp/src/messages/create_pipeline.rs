use crate::envelope::{MessageType, ProtocolVersion};
use crate::messages::init_runspace_pool::HostInfo;
use crate::messages::powershell_pipeline::PowerShellPipeline;
use crate::messages::PsObjectWithType;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// Client-to-server request to start a new pipeline on a runspace pool
/// (MS-PSRP §2.2.2.15).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePipeline {
    pub no_input: bool,
    pub add_to_history: bool,
    pub host_info: HostInfo,
    pub power_shell: PowerShellPipeline,
    pub is_nested: bool,
}

impl CreatePipeline {
    pub fn new(power_shell: PowerShellPipeline, host_info: HostInfo) -> Self {
        Self {
            no_input: true,
            add_to_history: true,
            host_info,
            power_shell,
            is_nested: false,
        }
    }

    pub fn to_complex_object(&self, peer_version: ProtocolVersion) -> ComplexObject {
        ComplexObject::standard()
            .with_extended("NoInput", self.no_input)
            .with_extended("AddToHistory", self.add_to_history)
            .with_extended("HostInfo", PsValue::Object(self.host_info.to_ps_object()))
            .with_extended(
                "PowerShell",
                PsValue::Object(self.power_shell.to_complex_object(peer_version)),
            )
            .with_extended("IsNested", self.is_nested)
    }

    pub fn from_complex_object(value: &ComplexObject) -> Result<Self> {
        let no_input = value
            .require_extended("NoInput")?
            .as_bool()
            .ok_or_else(|| PsrpError::InvalidMessage("NoInput is not a bool".to_string()))?;
        let add_to_history = value
            .require_extended("AddToHistory")?
            .as_bool()
            .ok_or_else(|| PsrpError::InvalidMessage("AddToHistory is not a bool".to_string()))?;
        let host_info_obj = value
            .require_extended("HostInfo")?
            .as_object()
            .ok_or_else(|| PsrpError::InvalidMessage("HostInfo is not an Object".to_string()))?;
        let host_info = HostInfo::from_ps_object(host_info_obj)?;
        let power_shell_obj = value
            .require_extended("PowerShell")?
            .as_object()
            .ok_or_else(|| PsrpError::InvalidMessage("PowerShell is not an Object".to_string()))?;
        let power_shell = PowerShellPipeline::from_complex_object(power_shell_obj)?;
        let is_nested = value
            .require_extended("IsNested")?
            .as_bool()
            .ok_or_else(|| PsrpError::InvalidMessage("IsNested is not a bool".to_string()))?;

        Ok(Self {
            no_input,
            add_to_history,
            host_info,
            power_shell,
            is_nested,
        })
    }
}

impl PsObjectWithType for CreatePipeline {
    fn message_type(&self) -> MessageType {
        MessageType::CreatePipeline
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(self.to_complex_object(ProtocolVersion::CURRENT))
    }
}
