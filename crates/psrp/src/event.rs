//! The event registry (MS-PSRP message catalog, spec §4.5): turns a decoded
//! envelope + CLIXML body into a typed [`PsrpEvent`] the embedder can match
//! on, instead of a bag of bytes plus a message-type tag.

use uuid::Uuid;

use crate::envelope::{Envelope, MessageType};
use crate::messages::*;
use crate::value::{ComplexObject, PsValue};
use crate::{PsrpError, Result};

/// One decoded PSRP message, tagged with the pool (and, where relevant,
/// pipeline) it arrived on.
#[derive(Debug, Clone)]
pub struct PsrpEvent {
    pub runspace_pool_id: Uuid,
    pub pipeline_id: Option<Uuid>,
    pub kind: PsrpEventKind,
}

/// The payload of a [`PsrpEvent`], one variant per [`MessageType`].
///
/// `RunspaceAvailability`'s payload already carries the client/server
/// distinction as [`AvailabilityResult::Count`] vs [`AvailabilityResult::Success`]
/// (chosen at decode time by which wire field shape is present), so no
/// separate runtime branch is needed here beyond decoding that one type.
#[derive(Debug, Clone)]
pub enum PsrpEventKind {
    SessionCapability(SessionCapability),
    InitRunspacePool(init_runspace_pool::InitRunspacePool),
    PublicKey(PublicKey),
    PublicKeyRequest(PublicKeyRequest),
    EncryptedSessionKey(EncryptedSessionKey),
    ConnectRunspacePool(ConnectRunspacePool),
    RunspacePoolInitData(RunspacePoolInitData),
    ApplicationPrivateData(init_runspace_pool::ApplicationPrivateData),
    RunspacePoolState(RunspacePoolStateMessage),
    SetMaxRunspaces(SetMaxRunspaces),
    SetMinRunspaces(SetMinRunspaces),
    ResetRunspaceState(ResetRunspaceState),
    GetAvailableRunspaces(GetAvailableRunspaces),
    RunspaceAvailability(RunspaceAvailability),
    CreatePipeline(CreatePipeline),
    GetCommandMetadata(GetCommandMetadata),
    RunspacePoolHostCall(RunspacePoolHostCall),
    RunspacePoolHostResponse(RunspacePoolHostResponse),
    PipelineHostCall(PipelineHostCall),
    PipelineHostResponse(PipelineHostResponse),
    PipelineState(PipelineStateMessage),
    PipelineInput(PipelineInput),
    EndOfPipelineInput(EndOfPipelineInput),
    PipelineOutput(PipelineOutput),
    ErrorRecord(ErrorRecord),
    DebugRecord(DebugRecord),
    VerboseRecord(VerboseRecord),
    WarningRecord(WarningRecord),
    ProgressRecord(ProgressRecord),
    InformationRecord(InformationRecord),
    /// `UserEvent` (MS-PSRP §2.2.2.? arbitrary event notification). No
    /// message-catalog entry models its fields, so the raw decoded value is
    /// carried through unchanged; the embedder inspects it directly.
    UserEvent(PsValue),
}

impl PsrpEvent {
    /// Builds the typed event for `envelope`'s message type from its
    /// already CLIXML-decoded body.
    pub fn create(envelope: &Envelope, object: PsValue) -> Result<Self> {
        let complex = |v: &PsValue| -> Result<&ComplexObject> {
            v.as_object()
                .ok_or_else(|| PsrpError::InvalidMessage(format!("{:?} body is not an Object", envelope.message_type)))
        };

        let kind = match envelope.message_type {
            MessageType::SessionCapability => PsrpEventKind::SessionCapability(SessionCapability::try_from(complex(&object)?)?),
            MessageType::InitRunspacePool => {
                PsrpEventKind::InitRunspacePool(init_runspace_pool::InitRunspacePool::try_from(complex(&object)?)?)
            }
            MessageType::PublicKey => PsrpEventKind::PublicKey(PublicKey::try_from(complex(&object)?)?),
            MessageType::PublicKeyRequest => PsrpEventKind::PublicKeyRequest(PublicKeyRequest::try_from(&object)?),
            MessageType::EncryptedSessionKey => {
                PsrpEventKind::EncryptedSessionKey(EncryptedSessionKey::try_from(complex(&object)?)?)
            }
            MessageType::ConnectRunspacePool => {
                PsrpEventKind::ConnectRunspacePool(ConnectRunspacePool::try_from(complex(&object)?)?)
            }
            MessageType::RunspacePoolInitData => {
                PsrpEventKind::RunspacePoolInitData(RunspacePoolInitData::try_from(complex(&object)?)?)
            }
            MessageType::ApplicationPrivateData => PsrpEventKind::ApplicationPrivateData(
                init_runspace_pool::ApplicationPrivateData::try_from(complex(&object)?)?,
            ),
            MessageType::RunspacePoolState => {
                PsrpEventKind::RunspacePoolState(RunspacePoolStateMessage::try_from(complex(&object)?)?)
            }
            MessageType::SetMaxRunspaces => PsrpEventKind::SetMaxRunspaces(SetMaxRunspaces::try_from(complex(&object)?)?),
            MessageType::SetMinRunspaces => PsrpEventKind::SetMinRunspaces(SetMinRunspaces::try_from(complex(&object)?)?),
            MessageType::ResetRunspaceState => {
                PsrpEventKind::ResetRunspaceState(ResetRunspaceState::try_from(complex(&object)?)?)
            }
            MessageType::GetAvailableRunspaces => {
                PsrpEventKind::GetAvailableRunspaces(GetAvailableRunspaces::try_from(&object)?)
            }
            MessageType::RunspaceAvailability => {
                PsrpEventKind::RunspaceAvailability(RunspaceAvailability::try_from(complex(&object)?)?)
            }
            MessageType::CreatePipeline => PsrpEventKind::CreatePipeline(CreatePipeline::from_complex_object(complex(&object)?)?),
            MessageType::GetCommandMetadata => {
                PsrpEventKind::GetCommandMetadata(GetCommandMetadata::try_from(complex(&object)?)?)
            }
            MessageType::RunspacePoolHostCall => {
                PsrpEventKind::RunspacePoolHostCall(RunspacePoolHostCall::try_from(complex(&object)?)?)
            }
            MessageType::RunspacePoolHostResponse => {
                PsrpEventKind::RunspacePoolHostResponse(RunspacePoolHostResponse::try_from(complex(&object)?)?)
            }
            MessageType::PipelineHostCall => PsrpEventKind::PipelineHostCall(PipelineHostCall::try_from(complex(&object)?)?),
            MessageType::PipelineHostResponse => {
                PsrpEventKind::PipelineHostResponse(PipelineHostResponse::try_from(complex(&object)?)?)
            }
            MessageType::PipelineState => PsrpEventKind::PipelineState(PipelineStateMessage::try_from(complex(&object)?)?),
            MessageType::PipelineInput => PsrpEventKind::PipelineInput(PipelineInput::from(object)),
            MessageType::EndOfPipelineInput => PsrpEventKind::EndOfPipelineInput(EndOfPipelineInput),
            MessageType::PipelineOutput => PsrpEventKind::PipelineOutput(PipelineOutput::from(object)),
            MessageType::ErrorRecord => PsrpEventKind::ErrorRecord(ErrorRecord::try_from(complex(&object)?)?),
            MessageType::DebugRecord => PsrpEventKind::DebugRecord(DebugRecord::try_from(complex(&object)?)?),
            MessageType::VerboseRecord => PsrpEventKind::VerboseRecord(VerboseRecord::try_from(complex(&object)?)?),
            MessageType::WarningRecord => PsrpEventKind::WarningRecord(WarningRecord::try_from(complex(&object)?)?),
            MessageType::ProgressRecord => PsrpEventKind::ProgressRecord(ProgressRecord::try_from(complex(&object)?)?),
            MessageType::InformationRecord => PsrpEventKind::InformationRecord(InformationRecord::try_from(complex(&object)?)?),
            MessageType::UserEvent => PsrpEventKind::UserEvent(object),
        };

        Ok(Self {
            runspace_pool_id: envelope.runspace_pool_id,
            pipeline_id: envelope.pipeline_id,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::envelope::Destination;

    fn envelope(message_type: MessageType, pipeline_id: Option<Uuid>) -> Envelope {
        Envelope::new(Destination::Server, message_type, Uuid::new_v4(), pipeline_id, Vec::new())
    }

    #[test]
    fn decodes_a_bare_value_message() {
        let envelope = envelope(MessageType::PublicKeyRequest, None);
        let event = PsrpEvent::create(&envelope, PublicKeyRequest.to_ps_object()).unwrap();
        assert_eq!(event.runspace_pool_id, envelope.runspace_pool_id);
        assert_eq!(event.pipeline_id, None);
        assert!(matches!(event.kind, PsrpEventKind::PublicKeyRequest(_)));
    }

    #[test]
    fn decodes_a_complex_object_message_and_keeps_the_pipeline_id() {
        let pipeline_id = Some(Uuid::new_v4());
        let envelope = envelope(MessageType::PipelineState, pipeline_id);
        let state = PipelineStateMessage::completed();
        let event = PsrpEvent::create(&envelope, state.to_ps_object()).unwrap();
        assert_eq!(event.pipeline_id, pipeline_id);
        match event.kind {
            PsrpEventKind::PipelineState(message) => assert_eq!(message, state),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn user_event_carries_the_raw_value_through_unexamined() {
        let envelope = envelope(MessageType::UserEvent, None);
        let value = PsValue::from("anything");
        let event = PsrpEvent::create(&envelope, value.clone()).unwrap();
        assert!(matches!(event.kind, PsrpEventKind::UserEvent(v) if v == value));
    }

    #[test]
    fn rejects_a_complex_message_whose_body_is_not_an_object() {
        let envelope = envelope(MessageType::PipelineState, None);
        let err = PsrpEvent::create(&envelope, PsValue::from("not an object")).unwrap_err();
        assert!(matches!(err, PsrpError::InvalidMessage(_)));
    }
}
