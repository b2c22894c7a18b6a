//! The PSRP message catalog (MS-PSRP §2.2.2): one module per message type,
//! each convertible to/from the `ComplexObject` that `Envelope::data` wraps.

pub mod command;
pub mod command_parameter;
pub mod connect_runspace_pool;
pub mod create_pipeline;
pub mod debug_record;
pub mod encrypted_session_key;
pub mod error_record;
pub mod get_available_runspaces;
pub mod get_command_metadata;
mod host_call;
mod host_response;
pub mod information_record;
pub mod init_runspace_pool;
pub mod pipeline_host_call;
pub mod pipeline_host_response;
pub mod pipeline_input;
pub mod pipeline_output;
pub mod pipeline_state;
pub mod powershell_pipeline;
pub mod progress_record;
pub mod public_key;
pub mod public_key_request;
pub mod remote_stream_options;
pub mod runspace_availability;
pub mod runspace_pool_control;
pub mod runspace_pool_host_call;
pub mod runspace_pool_host_response;
pub mod runspace_pool_init_data;
pub mod runspace_pool_state;
pub mod session_capability;
mod simple_record;
pub mod verbose_record;
pub mod warning_record;

pub use command::Command;
pub use command_parameter::CommandParameter;
pub use connect_runspace_pool::ConnectRunspacePool;
pub use create_pipeline::CreatePipeline;
pub use debug_record::DebugRecord;
pub use encrypted_session_key::EncryptedSessionKey;
pub use error_record::{ErrorCategory, ErrorRecord};
pub use get_available_runspaces::GetAvailableRunspaces;
pub use get_command_metadata::{CommandTypes, GetCommandMetadata};
pub use host_call::HostCall;
pub use host_response::HostResponse;
pub use information_record::{HostInformationMessage, InformationMessageData, InformationRecord};
pub use pipeline_host_call::PipelineHostCall;
pub use pipeline_host_response::PipelineHostResponse;
pub use pipeline_input::{EndOfPipelineInput, PipelineInput};
pub use pipeline_output::PipelineOutput;
pub use pipeline_state::PipelineStateMessage;
pub use powershell_pipeline::PowerShellPipeline;
pub use progress_record::{ProgressRecord, ProgressRecordType};
pub use public_key::PublicKey;
pub use public_key_request::PublicKeyRequest;
pub use remote_stream_options::RemoteStreamOptions;
pub use runspace_availability::{AvailabilityResult, RunspaceAvailability};
pub use runspace_pool_control::{ResetRunspaceState, SetMaxRunspaces, SetMinRunspaces};
pub use runspace_pool_host_call::RunspacePoolHostCall;
pub use runspace_pool_host_response::RunspacePoolHostResponse;
pub use runspace_pool_init_data::RunspacePoolInitData;
pub use runspace_pool_state::RunspacePoolStateMessage;
pub use session_capability::SessionCapability;
pub use verbose_record::VerboseRecord;
pub use warning_record::WarningRecord;

use crate::envelope::MessageType;
use crate::value::PsValue;

/// A PSRP message that knows its own `MessageType` and how to render
/// itself as the `ComplexObject` an `Envelope`'s data blob carries.
pub trait PsObjectWithType {
    fn message_type(&self) -> MessageType;
    fn to_ps_object(&self) -> PsValue;
}
