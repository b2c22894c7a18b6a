//! Client half of the runspace pool state machine (MS-PSRP §2.2.3, spec
//! §4.2's client-initiated operations and client-role incoming handlers).

use uuid::Uuid;

use crate::crypto::ClientKeyExchange;
use crate::envelope::{Destination, MessageType, ProtocolVersion};
use crate::fragment::StreamType;
use crate::messages::init_runspace_pool::InitRunspacePool;
use crate::messages::{
    ConnectRunspacePool, CreatePipeline, EndOfPipelineInput, GetAvailableRunspaces, GetCommandMetadata, HostResponse,
    PipelineHostResponse, PipelineInput, PublicKey, PublicKeyRequest, ResetRunspaceState, RunspacePoolHostResponse,
    SessionCapability, SetMaxRunspaces, SetMinRunspaces,
};
use crate::pipeline::PSInvocationState;
use crate::pool::core::{CiOrigin, ClientPendingCall, PipelineEntry, PipelineMetadata, RunspacePoolCore};
use crate::pool::state::RunspacePoolState;
use crate::value::PsValue;
use crate::{PsrpError, PsrpEvent, PsrpEventKind, Result};

/// The `PSVersion` this crate advertises in `SessionCapability`, matching
/// the conservative baseline `ironposh-client-core` itself negotiates.
const PS_VERSION: &str = "2.0";

/// Client side of a runspace pool: opens/connects, drives pipelines, and
/// answers host calls on behalf of an embedder. Sans-I/O: feed bytes in
/// with [`Self::receive_data`], drain bytes to send with
/// [`Self::data_to_send`], drain decoded events with [`Self::next_event`].
#[derive(Debug)]
pub struct ClientRunspacePool {
    core: RunspacePoolCore,
    key_exchange: Option<ClientKeyExchange>,
}

impl ClientRunspacePool {
    pub fn new(config: crate::pool::RunspacePoolConfig) -> Result<Self> {
        Ok(Self {
            core: RunspacePoolCore::new(config, Destination::Server)?,
            key_exchange: None,
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

    /// Opens a brand new pool: `SessionCapability` then `InitRunspacePool`.
    pub fn open(&mut self) -> Result<()> {
        self.core
            .require_state("open", &[RunspacePoolState::BeforeOpen])?;
        self.core
            .enqueue(&SessionCapability::current(PS_VERSION), None, StreamType::Default)?;
        self.core.enqueue(
            &InitRunspacePool {
                min_runspaces: self.core.min_runspaces,
                max_runspaces: self.core.max_runspaces,
                thread_options: self.core.thread_options,
                apartment_state: self.core.apartment_state,
                host_info: self.core.host_info.clone(),
                application_arguments: self.core.application_arguments.clone(),
            },
            None,
            StreamType::Default,
        )?;
        self.core.state = RunspacePoolState::Opening;
        Ok(())
    }

    /// Reattaches to an already-open pool: `SessionCapability` then
    /// `ConnectRunspacePool`. Completion is driven by the `ApplicationPrivateData`
    /// that follows.
    pub fn connect(&mut self) -> Result<()> {
        self.core.require_state(
            "connect",
            &[RunspacePoolState::BeforeOpen, RunspacePoolState::Disconnected],
        )?;
        self.core
            .enqueue(&SessionCapability::current(PS_VERSION), None, StreamType::Default)?;
        self.core
            .enqueue(&ConnectRunspacePool::default(), None, StreamType::Default)?;
        self.core.state = RunspacePoolState::Connecting;
        Ok(())
    }

    /// Starts the RSA/AES key exchange (spec §9's co-owned cipher). A no-op
    /// if one is already underway or complete.
    pub fn exchange_key(&mut self) -> Result<()> {
        if self.core.key_requested {
            return Ok(());
        }
        self.core.require_state("exchange_key", &[RunspacePoolState::Opened])?;
        let exchange = ClientKeyExchange::generate(&mut rand::thread_rng())?;
        let public_key = exchange.public_key_blob_base64()?;
        self.core
            .enqueue(&PublicKey { public_key }, None, StreamType::Default)?;
        self.key_exchange = Some(exchange);
        self.core.key_requested = true;
        Ok(())
    }

    /// Requests the pool's current available-runspace count. Returns the
    /// call id the eventual `RunspaceAvailability` response will carry.
    pub fn get_available_runspaces(&mut self) -> Result<i64> {
        self.core
            .require_state("get_available_runspaces", &[RunspacePoolState::Opened])?;
        let ci = self.core.next_ci();
        self.core.ci_handlers.insert(ci, ClientPendingCall::GetAvailableRunspaces);
        self.core
            .enqueue(&GetAvailableRunspaces { call_id: ci }, None, StreamType::Default)?;
        Ok(ci)
    }

    /// Requires protocol 2.3+ per spec's version gate on this operation.
    pub fn reset_runspace_state(&mut self) -> Result<i64> {
        self.core
            .require_state("reset_runspace_state", &[RunspacePoolState::Opened])?;
        self.core
            .require_protocol("reset_runspace_state", ProtocolVersion::new(2, 3))?;
        let ci = self.core.next_ci();
        self.core.ci_handlers.insert(ci, ClientPendingCall::ResetRunspaceState);
        self.core
            .enqueue(&ResetRunspaceState { call_id: ci }, None, StreamType::Default)?;
        Ok(ci)
    }

    /// Requests a new maximum runspace count. Returns `None` without wire
    /// traffic if the pool isn't open yet or `count` already matches.
    pub fn set_max_runspaces(&mut self, count: i32) -> Result<Option<i64>> {
        if self.core.state != RunspacePoolState::Opened || count == self.core.max_runspaces {
            return Ok(None);
        }
        let ci = self.core.next_ci();
        self.core.ci_handlers.insert(ci, ClientPendingCall::SetMaxRunspaces(count));
        self.core.enqueue(
            &SetMaxRunspaces {
                call_id: ci,
                max_runspaces: count,
            },
            None,
            StreamType::Default,
        )?;
        Ok(Some(ci))
    }

    /// Requests a new minimum runspace count. Returns `None` without wire
    /// traffic if the pool isn't open yet or `count` already matches.
    pub fn set_min_runspaces(&mut self, count: i32) -> Result<Option<i64>> {
        if self.core.state != RunspacePoolState::Opened || count == self.core.min_runspaces {
            return Ok(None);
        }
        let ci = self.core.next_ci();
        self.core.ci_handlers.insert(ci, ClientPendingCall::SetMinRunspaces(count));
        self.core.enqueue(
            &SetMinRunspaces {
                call_id: ci,
                min_runspaces: count,
            },
            None,
            StreamType::Default,
        )?;
        Ok(Some(ci))
    }

    /// Answers a `RunspacePoolHostCall`/`PipelineHostCall` previously
    /// surfaced as a [`PsrpEventKind::RunspacePoolHostCall`]/
    /// [`PsrpEventKind::PipelineHostCall`] event.
    pub fn host_response(&mut self, call_id: i64, return_value: Option<PsValue>, error_record: Option<PsValue>) -> Result<()> {
        let origin = self
            .core
            .ci_events
            .get(&call_id)
            .copied()
            .ok_or_else(|| PsrpError::InvalidMessage(format!("no pending host call for ci {call_id}")))?;
        let CiOrigin::HostCall { pipeline_id } = origin else {
            return Err(PsrpError::ResponseTypeMismatch);
        };
        let response = HostResponse {
            call_id,
            return_value,
            error_record,
        };
        match pipeline_id {
            Some(id) => self
                .core
                .enqueue(&PipelineHostResponse(response), Some(id), StreamType::PromptResponse)?,
            None => self
                .core
                .enqueue(&RunspacePoolHostResponse(response), None, StreamType::PromptResponse)?,
        }
        self.core.ci_events.shift_remove(&call_id);
        Ok(())
    }

    /// Registers a `PowerShell` pipeline against this pool. The pipeline
    /// stays `NotStarted` until [`Self::start_pipeline`] is called.
    pub fn create_pipeline(&mut self, create: CreatePipeline) -> Result<Uuid> {
        self.core
            .require_state("create_pipeline", &[RunspacePoolState::Opened])?;
        let id = Uuid::new_v4();
        self.core.pipelines.insert(
            id,
            PipelineEntry {
                state: PSInvocationState::NotStarted,
                is_nested: create.is_nested,
                metadata: PipelineMetadata::PowerShell(create),
            },
        );
        Ok(id)
    }

    /// Registers a `GetCommandMetadata` query pipeline against this pool.
    pub fn create_command_metadata_pipeline(&mut self, query: GetCommandMetadata) -> Result<Uuid> {
        self.core
            .require_state("create_command_metadata_pipeline", &[RunspacePoolState::Opened])?;
        let id = Uuid::new_v4();
        self.core.pipelines.insert(
            id,
            PipelineEntry {
                state: PSInvocationState::NotStarted,
                is_nested: false,
                metadata: PipelineMetadata::CommandMetadata(query),
            },
        );
        Ok(id)
    }

    /// Sends the pipeline's `CreatePipeline`/`GetCommandMetadata` message.
    /// Valid from `NotStarted`, `Stopped`, `Completed` (spec §4.3).
    pub fn start_pipeline(&mut self, pipeline_id: Uuid) -> Result<()> {
        let entry = self
            .core
            .pipelines
            .get(&pipeline_id)
            .ok_or_else(|| PsrpError::InvalidMessage(format!("unknown pipeline {pipeline_id}")))?;
        if !matches!(
            entry.state,
            PSInvocationState::NotStarted | PSInvocationState::Stopped | PSInvocationState::Completed
        ) {
            return Err(PsrpError::InvalidPipelineState {
                action: "start",
                actual: entry.state,
                expected: vec![
                    PSInvocationState::NotStarted,
                    PSInvocationState::Stopped,
                    PSInvocationState::Completed,
                ],
            });
        }

        let peer_version = self.core.peer_protocol_version.unwrap_or(ProtocolVersion::CURRENT);
        match entry.metadata.clone() {
            PipelineMetadata::PowerShell(create) => {
                let object = PsValue::Object(create.to_complex_object(peer_version));
                self.core
                    .enqueue_value(MessageType::CreatePipeline, &object, Some(pipeline_id), StreamType::Default)?;
            }
            PipelineMetadata::CommandMetadata(query) => {
                self.core.enqueue(&query, Some(pipeline_id), StreamType::Default)?;
            }
        }

        self.core.pipelines.get_mut(&pipeline_id).unwrap().state = PSInvocationState::Running;
        Ok(())
    }

    /// Sends one input object down a running pipeline's input stream.
    pub fn send_pipeline_input(&mut self, pipeline_id: Uuid, data: PsValue) -> Result<()> {
        self.require_pipeline_running("send", pipeline_id)?;
        self.core
            .enqueue(&PipelineInput::from(data), Some(pipeline_id), StreamType::Default)
    }

    /// Signals that no further pipeline input will be sent.
    pub fn send_pipeline_eof(&mut self, pipeline_id: Uuid) -> Result<()> {
        self.require_pipeline_running("send_eof", pipeline_id)?;
        self.core
            .enqueue(&EndOfPipelineInput, Some(pipeline_id), StreamType::Default)
    }

    /// Requests that a running pipeline stop. Actual termination is
    /// reported later via a `PipelineState` event.
    pub fn begin_stop_pipeline(&mut self, pipeline_id: Uuid) -> Result<()> {
        self.require_pipeline_running("begin_stop", pipeline_id)?;
        self.core.pipelines.get_mut(&pipeline_id).unwrap().state = PSInvocationState::Stopping;
        Ok(())
    }

    fn require_pipeline_running(&self, action: &'static str, pipeline_id: Uuid) -> Result<()> {
        let entry = self
            .core
            .pipelines
            .get(&pipeline_id)
            .ok_or_else(|| PsrpError::InvalidMessage(format!("unknown pipeline {pipeline_id}")))?;
        if entry.state != PSInvocationState::Running {
            return Err(PsrpError::InvalidPipelineState {
                action,
                actual: entry.state,
                expected: vec![PSInvocationState::Running],
            });
        }
        Ok(())
    }

    pub fn data_to_send(&mut self, limit: usize) -> Result<Option<(Vec<u8>, StreamType)>> {
        self.core.data_to_send(limit)
    }

    pub fn receive_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.core.receive_data(bytes)
    }

    /// Decodes and dispatches the next reassembled message, applying its
    /// side effects to pool/pipeline state, then returns it as an event.
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
            }
            PsrpEventKind::ApplicationPrivateData(data) => {
                self.core.application_private_data = data.data.clone();
                if self.core.state == RunspacePoolState::Connecting {
                    self.core.state = RunspacePoolState::Opened;
                }
            }
            PsrpEventKind::RunspacePoolInitData(init) => {
                self.core.min_runspaces = init.min_runspaces;
                self.core.max_runspaces = init.max_runspaces;
            }
            PsrpEventKind::RunspacePoolState(message) => {
                self.core.state = message.state;
            }
            PsrpEventKind::EncryptedSessionKey(encrypted) => {
                let exchange = self
                    .key_exchange
                    .as_ref()
                    .ok_or_else(|| PsrpError::InvalidMessage("received EncryptedSessionKey without a pending key exchange".to_string()))?;
                self.core.cipher = Some(exchange.unwrap_session_key(&encrypted.encrypted_session_key)?);
            }
            PsrpEventKind::PublicKeyRequest(_) => {
                self.exchange_key()?;
            }
            PsrpEventKind::RunspaceAvailability(availability) => {
                if let Some(handler) = self.core.ci_handlers.shift_remove(&availability.call_id) {
                    self.apply_availability_handler(handler, availability.result);
                }
            }
            PsrpEventKind::RunspacePoolHostCall(call) => {
                if call.0.call_id != crate::pool::core::VOID_CALL_ID {
                    self.core
                        .ci_events
                        .insert(call.0.call_id, CiOrigin::HostCall { pipeline_id: None });
                }
            }
            PsrpEventKind::PipelineHostCall(call) => {
                if call.0.call_id != crate::pool::core::VOID_CALL_ID {
                    self.core.ci_events.insert(
                        call.0.call_id,
                        CiOrigin::HostCall {
                            pipeline_id: envelope.pipeline_id,
                        },
                    );
                }
            }
            PsrpEventKind::PipelineState(message) => {
                if let Some(id) = envelope.pipeline_id {
                    if let Some(entry) = self.core.pipelines.get_mut(&id) {
                        entry.state = message.pipeline_state;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_availability_handler(&mut self, handler: ClientPendingCall, result: crate::messages::AvailabilityResult) {
        use crate::messages::AvailabilityResult;
        match (handler, result) {
            (ClientPendingCall::SetMaxRunspaces(n), AvailabilityResult::Success(true)) => {
                self.core.max_runspaces = n;
            }
            (ClientPendingCall::SetMinRunspaces(n), AvailabilityResult::Success(true)) => {
                self.core.min_runspaces = n;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Command, PowerShellPipeline};
    use crate::pool::{RunspacePoolConfig, ServerRunspacePool};

    fn client() -> ClientRunspacePool {
        ClientRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap()
    }

    /// Drains both sides' outgoing bytes into each other and their events
    /// into `sink` until neither has anything left to send or decode.
    fn pump(client: &mut ClientRunspacePool, server: &mut ServerRunspacePool, sink: &mut Vec<PsrpEventKind>) {
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
            while let Some(event) = client.next_event().unwrap() {
                sink.push(event.kind);
                progressed = true;
            }
            while let Some(event) = server.next_event().unwrap() {
                sink.push(event.kind);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    #[test]
    fn new_pool_starts_before_open() {
        assert_eq!(client().state(), RunspacePoolState::BeforeOpen);
    }

    #[test]
    fn open_enqueues_capability_and_init_and_transitions_to_opening() {
        let mut pool = client();
        pool.open().unwrap();
        assert_eq!(pool.state(), RunspacePoolState::Opening);
        assert!(pool.data_to_send(4096).unwrap().is_some());
    }

    #[test]
    fn open_rejects_a_pool_that_is_already_opening() {
        let mut pool = client();
        pool.open().unwrap();
        assert!(pool.open().is_err());
    }

    #[test]
    fn exchange_key_requires_an_opened_pool() {
        let mut pool = client();
        assert!(pool.exchange_key().is_err());
    }

    #[test]
    fn full_handshake_opens_both_sides_and_negotiates_a_cipher() {
        let mut client = client();
        let mut server = ServerRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
        let mut events = Vec::new();

        client.open().unwrap();
        pump(&mut client, &mut server, &mut events);

        assert_eq!(client.state(), RunspacePoolState::Opened);
        assert_eq!(server.state(), RunspacePoolState::Opened);
        assert_eq!(client.id(), server.id());

        client.exchange_key().unwrap();
        pump(&mut client, &mut server, &mut events);
        assert!(client.core.cipher.is_some());
        assert_eq!(client.core.cipher, server.core.cipher);
    }

    #[test]
    fn create_pipeline_registers_not_started_until_start_is_called() {
        let mut pool = client();
        pool.open().unwrap();
        pool.core.state = RunspacePoolState::Opened;
        let id = pool
            .create_pipeline(CreatePipeline::new(
                PowerShellPipeline::new(vec![Command::new("Get-Process")]),
                pool.core.host_info.clone(),
            ))
            .unwrap();
        assert_eq!(pool.core.pipelines[&id].state, PSInvocationState::NotStarted);

        pool.start_pipeline(id).unwrap();
        assert_eq!(pool.core.pipelines[&id].state, PSInvocationState::Running);
        assert!(pool.data_to_send(4096).unwrap().is_some());
    }

    #[test]
    fn sending_input_to_a_pipeline_that_is_not_running_is_rejected() {
        let mut pool = client();
        pool.core.state = RunspacePoolState::Opened;
        let id = pool
            .create_command_metadata_pipeline(GetCommandMetadata::new("Get-Process"))
            .unwrap();
        assert!(pool.send_pipeline_input(id, PsValue::from("x")).is_err());
    }

    #[test]
    fn begin_stop_pipeline_moves_a_running_pipeline_to_stopping() {
        let mut pool = client();
        pool.core.state = RunspacePoolState::Opened;
        let id = pool
            .create_command_metadata_pipeline(GetCommandMetadata::new("Get-Process"))
            .unwrap();
        pool.start_pipeline(id).unwrap();
        pool.begin_stop_pipeline(id).unwrap();
        assert_eq!(pool.core.pipelines[&id].state, PSInvocationState::Stopping);
    }
}
