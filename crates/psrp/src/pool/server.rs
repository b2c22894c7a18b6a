//! Server half of the runspace pool state machine (MS-PSRP §2.2.3, spec
//! §4.2's server-initiated operations and server-role incoming handlers).

use uuid::Uuid;

use crate::crypto::ServerKeyExchange;
use crate::envelope::{Destination, ProtocolVersion};
use crate::fragment::StreamType;
use crate::host::RemoteHostMethodId;
use crate::messages::{
    ApplicationPrivateData, DebugRecord, ErrorRecord, HostCall, HostResponse, InformationRecord, PipelineHostCall,
    PipelineOutput, PipelineStateMessage, ProgressRecord, RunspaceAvailability, RunspacePoolHostCall,
    RunspacePoolInitData, RunspacePoolStateMessage, SessionCapability, VerboseRecord, WarningRecord,
};
use crate::pipeline::PSInvocationState;
use crate::pool::core::{CiOrigin, RunspacePoolCore, VOID_CALL_ID};
use crate::pool::state::RunspacePoolState;
use crate::value::PsValue;
use crate::{PsrpError, PsrpEvent, PsrpEventKind, Result};

const PS_VERSION: &str = "2.0";

/// Server side of a runspace pool. Adopts the client's pool id from its
/// first `SessionCapability` rather than choosing one itself, matching the
/// role split in MS-PSRP's handshake.
#[derive(Debug)]
pub struct ServerRunspacePool {
    core: RunspacePoolCore,
    key_exchange: Option<ServerKeyExchange>,
    capability_sent: bool,
}

impl ServerRunspacePool {
    pub fn new(config: crate::pool::RunspacePoolConfig) -> Result<Self> {
        Ok(Self {
            core: RunspacePoolCore::new(config, Destination::Client)?,
            key_exchange: None,
            capability_sent: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.core.id
    }

    pub fn state(&self) -> RunspacePoolState {
        self.core.state
    }

    pub fn is_broken(&self) -> bool {
        self.core.is_broken()
    }

    /// Queues a server-to-client host method call. Allocates a correlation
    /// id unless the method is void (spec's void-method sentinel).
    pub fn host_call(&mut self, pipeline_id: Option<Uuid>, method_id: RemoteHostMethodId, parameters: Vec<PsValue>) -> Result<i64> {
        let call_id = if method_id.expects_response() {
            let ci = self.core.next_ci();
            self.core.ci_events.insert(ci, CiOrigin::HostCall { pipeline_id });
            ci
        } else {
            VOID_CALL_ID
        };
        let call = HostCall {
            call_id,
            method_id,
            parameters,
        };
        match pipeline_id {
            Some(id) => self
                .core
                .enqueue(&PipelineHostCall(call), Some(id), StreamType::Default)?,
            None => self
                .core
                .enqueue(&RunspacePoolHostCall(call), None, StreamType::Default)?,
        }
        Ok(call_id)
    }

    /// Requests the client's key-exchange public key.
    pub fn request_key(&mut self) -> Result<()> {
        self.core
            .enqueue(&crate::messages::PublicKeyRequest, None, StreamType::Default)
    }

    /// Answers a pending `SetMaxRunspaces`/`SetMinRunspaces`/`ResetRunspaceState`/
    /// `GetAvailableRunspaces` request, validating the response shape
    /// against what the request expects.
    pub fn runspace_availability_response(&mut self, call_id: i64, result: crate::messages::AvailabilityResult) -> Result<()> {
        use crate::messages::AvailabilityResult;
        let origin = self
            .core
            .ci_events
            .shift_remove(&call_id)
            .ok_or_else(|| PsrpError::InvalidMessage(format!("no pending request for ci {call_id}")))?;
        let expects_count = matches!(origin, CiOrigin::GetAvailableRunspaces);
        let shape_ok = match result {
            AvailabilityResult::Count(_) => expects_count,
            AvailabilityResult::Success(_) => !expects_count,
        };
        if !shape_ok {
            return Err(PsrpError::ResponseTypeMismatch);
        }
        self.core
            .enqueue(&RunspaceAvailability { call_id, result }, None, StreamType::Default)
    }

    pub fn set_broken(&mut self, error_record: PsValue) -> Result<()> {
        self.core
            .enqueue(&RunspacePoolStateMessage::broken(error_record), None, StreamType::Default)?;
        self.core.set_broken();
        Ok(())
    }

    /// Marks a pipeline registered by an incoming `CreatePipeline`/
    /// `GetCommandMetadata` as actually running. Symmetric with the
    /// client's own `start_pipeline`: receiving the creation request only
    /// registers the pipeline, the embedder decides when execution begins.
    pub fn start_pipeline(&mut self, pipeline_id: Uuid) -> Result<()> {
        let entry = self
            .core
            .pipelines
            .get_mut(&pipeline_id)
            .ok_or_else(|| PsrpError::InvalidMessage(format!("unknown pipeline {pipeline_id}")))?;
        if entry.state != PSInvocationState::NotStarted {
            return Err(PsrpError::InvalidPipelineState {
                action: "start",
                actual: entry.state,
                expected: vec![PSInvocationState::NotStarted],
            });
        }
        entry.state = PSInvocationState::Running;
        Ok(())
    }

    pub fn write_output(&mut self, pipeline_id: Uuid, data: PsValue) -> Result<()> {
        self.core
            .enqueue(&PipelineOutput::from(data), Some(pipeline_id), StreamType::Default)
    }

    pub fn write_error(&mut self, pipeline_id: Uuid, record: ErrorRecord) -> Result<()> {
        self.core.enqueue(&record, Some(pipeline_id), StreamType::Default)
    }

    pub fn write_debug(&mut self, pipeline_id: Uuid, record: DebugRecord) -> Result<()> {
        self.core.enqueue(&record, Some(pipeline_id), StreamType::Default)
    }

    pub fn write_verbose(&mut self, pipeline_id: Uuid, record: VerboseRecord) -> Result<()> {
        self.core.enqueue(&record, Some(pipeline_id), StreamType::Default)
    }

    pub fn write_warning(&mut self, pipeline_id: Uuid, record: WarningRecord) -> Result<()> {
        self.core.enqueue(&record, Some(pipeline_id), StreamType::Default)
    }

    pub fn write_progress(&mut self, pipeline_id: Uuid, record: ProgressRecord) -> Result<()> {
        self.core.enqueue(&record, Some(pipeline_id), StreamType::Default)
    }

    /// `InformationRecord` is a 2.3+ addition; the caller is responsible
    /// for not emitting it to an older peer (checked here defensively).
    pub fn write_information(&mut self, pipeline_id: Uuid, record: InformationRecord) -> Result<()> {
        self.core
            .require_protocol("write_information", ProtocolVersion::new(2, 3))?;
        self.core.enqueue(&record, Some(pipeline_id), StreamType::Default)
    }

    /// Reports a pipeline state transition to the client.
    pub fn report_pipeline_state(&mut self, pipeline_id: Uuid, message: PipelineStateMessage) -> Result<()> {
        if let Some(entry) = self.core.pipelines.get_mut(&pipeline_id) {
            entry.state = message.pipeline_state;
        }
        self.core.enqueue(&message, Some(pipeline_id), StreamType::Default)
    }

    pub fn complete(&mut self, pipeline_id: Uuid) -> Result<()> {
        self.report_pipeline_state(pipeline_id, PipelineStateMessage::completed())
    }

    pub fn stop(&mut self, pipeline_id: Uuid, error_record: Option<PsValue>) -> Result<()> {
        let message = match error_record {
            Some(record) => PipelineStateMessage::stopped_with_error(record),
            None => PipelineStateMessage {
                pipeline_state: PSInvocationState::Stopped,
                exception_as_error_record: None,
            },
        };
        self.report_pipeline_state(pipeline_id, message)
    }

    pub fn data_to_send(&mut self, limit: usize) -> Result<Option<(Vec<u8>, StreamType)>> {
        self.core.data_to_send(limit)
    }

    pub fn receive_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.core.receive_data(bytes)
    }

    pub fn next_event(&mut self) -> Result<Option<PsrpEvent>> {
        let Some((envelope, value)) = self.core.next_envelope()? else {
            return Ok(None);
        };
        let event = match PsrpEvent::create(&envelope, value) {
            Ok(event) => event,
            Err(err) => {
                self.core.set_broken();
                return Err(err);
            }
        };
        self.apply(&envelope, &event.kind)?;
        Ok(Some(event))
    }

    fn apply(&mut self, envelope: &crate::envelope::Envelope, kind: &PsrpEventKind) -> Result<()> {
        match kind {
            PsrpEventKind::SessionCapability(capability) => {
                self.core.peer_protocol_version = Some(capability.protocol_version);
                if self.core.state == RunspacePoolState::BeforeOpen {
                    self.core.id = envelope.runspace_pool_id;
                }
                if !self.capability_sent {
                    self.core
                        .enqueue(&SessionCapability::current(PS_VERSION), None, StreamType::Default)?;
                    self.capability_sent = true;
                }
            }
            PsrpEventKind::InitRunspacePool(init) => {
                self.core.min_runspaces = init.min_runspaces;
                self.core.max_runspaces = init.max_runspaces;
                self.core.apartment_state = init.apartment_state;
                self.core.thread_options = init.thread_options;
                self.core.host_info = init.host_info.clone();
                self.core.application_arguments = init.application_arguments.clone();
                self.core
                    .enqueue(&ApplicationPrivateData::default(), None, StreamType::Default)?;
                self.core.state = RunspacePoolState::Opened;
            }
            PsrpEventKind::ConnectRunspacePool(connect) => {
                let min_runspaces = connect.min_runspaces.unwrap_or(self.core.min_runspaces);
                let max_runspaces = connect.max_runspaces.unwrap_or(self.core.max_runspaces);
                self.core.min_runspaces = min_runspaces;
                self.core.max_runspaces = max_runspaces;
                self.core.enqueue(
                    &RunspacePoolInitData {
                        min_runspaces,
                        max_runspaces,
                    },
                    None,
                    StreamType::Default,
                )?;
                self.core
                    .enqueue(&ApplicationPrivateData::default(), None, StreamType::Default)?;
                self.core.state = RunspacePoolState::Opened;
            }
            PsrpEventKind::PublicKey(public_key) => {
                let exchange = ServerKeyExchange::generate(&mut rand::thread_rng());
                let encrypted = exchange.wrap_session_key(&mut rand::thread_rng(), &public_key.public_key)?;
                self.core.cipher = Some(*exchange.session_key());
                self.key_exchange = Some(exchange);
                self.core.enqueue(
                    &crate::messages::EncryptedSessionKey {
                        encrypted_session_key: encrypted,
                    },
                    None,
                    StreamType::Default,
                )?;
            }
            PsrpEventKind::SetMaxRunspaces(message) => {
                self.core
                    .ci_events
                    .insert(message.call_id, CiOrigin::SetMaxRunspaces);
            }
            PsrpEventKind::SetMinRunspaces(message) => {
                self.core
                    .ci_events
                    .insert(message.call_id, CiOrigin::SetMinRunspaces);
            }
            PsrpEventKind::ResetRunspaceState(message) => {
                self.core
                    .ci_events
                    .insert(message.call_id, CiOrigin::ResetRunspaceState);
            }
            PsrpEventKind::GetAvailableRunspaces(message) => {
                self.core
                    .ci_events
                    .insert(message.call_id, CiOrigin::GetAvailableRunspaces);
            }
            PsrpEventKind::CreatePipeline(create) => {
                if let Some(id) = envelope.pipeline_id {
                    self.core.pipelines.insert(
                        id,
                        crate::pool::core::PipelineEntry {
                            state: PSInvocationState::NotStarted,
                            is_nested: create.is_nested,
                            metadata: crate::pool::core::PipelineMetadata::PowerShell(create.clone()),
                        },
                    );
                }
            }
            PsrpEventKind::GetCommandMetadata(query) => {
                if let Some(id) = envelope.pipeline_id {
                    self.core.pipelines.insert(
                        id,
                        crate::pool::core::PipelineEntry {
                            state: PSInvocationState::NotStarted,
                            is_nested: false,
                            metadata: crate::pool::core::PipelineMetadata::CommandMetadata(query.clone()),
                        },
                    );
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::AvailabilityResult;
    use crate::pool::{ClientRunspacePool, RunspacePoolConfig};

    fn server() -> ServerRunspacePool {
        ServerRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap()
    }

    fn pump(client: &mut ClientRunspacePool, server: &mut ServerRunspacePool) {
        loop {
            let mut progressed = false;
            while let Some((bytes, _)) = client.data_to_send(4096).unwrap() {
                server.receive_data(&bytes).unwrap();
                progressed = true;
            }
            while let Some((bytes, _)) = server.data_to_send(4096).unwrap() {
                client.receive_data(&bytes).unwrap();
                progressed = true;
            }
            while client.next_event().unwrap().is_some() {
                progressed = true;
            }
            while server.next_event().unwrap().is_some() {
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    fn opened_pair() -> (ClientRunspacePool, ServerRunspacePool) {
        let mut client = ClientRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
        let mut server = server();
        client.open().unwrap();
        pump(&mut client, &mut server);
        (client, server)
    }

    #[test]
    fn new_pool_starts_before_open() {
        assert_eq!(server().state(), RunspacePoolState::BeforeOpen);
    }

    #[test]
    fn opening_a_client_brings_the_server_to_opened_with_the_same_id() {
        let (client, server) = opened_pair();
        assert_eq!(server.state(), RunspacePoolState::Opened);
        assert_eq!(server.id(), client.id());
    }

    #[test]
    fn host_call_on_a_void_method_skips_correlation() {
        let mut pool = server();
        let call_id = pool.host_call(None, RemoteHostMethodId::SetShouldExit, Vec::new()).unwrap();
        assert_eq!(call_id, VOID_CALL_ID);
        assert!(pool.core.ci_events.is_empty());
    }

    #[test]
    fn host_call_on_a_response_method_allocates_and_tracks_a_call_id() {
        let mut pool = server();
        let call_id = pool.host_call(None, RemoteHostMethodId::GetName, Vec::new()).unwrap();
        assert_ne!(call_id, VOID_CALL_ID);
        assert!(matches!(
            pool.core.ci_events.get(&call_id),
            Some(CiOrigin::HostCall { pipeline_id: None })
        ));
    }

    #[test]
    fn runspace_availability_response_rejects_a_shape_mismatch() {
        let mut pool = server();
        pool.core.ci_events.insert(7, CiOrigin::GetAvailableRunspaces);
        let err = pool
            .runspace_availability_response(7, AvailabilityResult::Success(true))
            .unwrap_err();
        assert!(matches!(err, PsrpError::ResponseTypeMismatch));
    }

    #[test]
    fn runspace_availability_response_accepts_a_matching_shape() {
        let mut pool = server();
        pool.core.ci_events.insert(7, CiOrigin::SetMaxRunspaces);
        pool.runspace_availability_response(7, AvailabilityResult::Success(true)).unwrap();
        assert!(pool.core.ci_events.is_empty());
    }

    #[test]
    fn start_pipeline_requires_not_started() {
        let (_client, mut server) = opened_pair();
        let id = Uuid::new_v4();
        server.core.pipelines.insert(
            id,
            crate::pool::core::PipelineEntry {
                state: PSInvocationState::Running,
                is_nested: false,
                metadata: crate::pool::core::PipelineMetadata::CommandMetadata(crate::messages::GetCommandMetadata::new(
                    "Get-Process",
                )),
            },
        );
        assert!(server.start_pipeline(id).is_err());
    }

    #[test]
    fn complete_marks_the_pipeline_entry_and_enqueues_a_state_message() {
        let (_client, mut server) = opened_pair();
        let id = Uuid::new_v4();
        server.core.pipelines.insert(
            id,
            crate::pool::core::PipelineEntry {
                state: PSInvocationState::Running,
                is_nested: false,
                metadata: crate::pool::core::PipelineMetadata::CommandMetadata(crate::messages::GetCommandMetadata::new(
                    "Get-Process",
                )),
            },
        );
        server.complete(id).unwrap();
        assert_eq!(server.core.pipelines[&id].state, PSInvocationState::Completed);
        assert!(server.data_to_send(4096).unwrap().is_some());
    }
}

