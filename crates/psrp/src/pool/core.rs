use std::collections::VecDeque;

use indexmap::IndexMap;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::envelope::{Destination, Envelope, MessageType, ProtocolVersion};
use crate::fragment::{self, Defragmenter, OutgoingMessage, StreamType};
use crate::messages::init_runspace_pool::{ApartmentState, ApplicationArguments, HostInfo, PSThreadOptions};
use crate::messages::PsObjectWithType;
use crate::pool::state::RunspacePoolState;
use crate::value::PsValue;
use crate::{clixml, PsrpError, Result};

/// Construction-time options for a runspace pool (spec §6's recognized
/// pool-construction options), built the way `ironposh-psrp`'s own typed
/// message structs are: a `typed_builder::TypedBuilder` rather than a
/// struct-literal with a dozen positional fields.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RunspacePoolConfig {
    #[builder(default = 1)]
    pub min_runspaces: i32,
    #[builder(default = 1)]
    pub max_runspaces: i32,
    #[builder(default = ApartmentState::Unknown)]
    pub apartment_state: ApartmentState,
    #[builder(default = PSThreadOptions::Default)]
    pub thread_options: PSThreadOptions,
    #[builder(default = HostInfo::null())]
    pub host_info: HostInfo,
    #[builder(default)]
    pub application_arguments: ApplicationArguments,
    #[builder(default, setter(strip_option))]
    pub runspace_pool_id: Option<Uuid>,
}

impl RunspacePoolConfig {
    /// Validates the sizing invariant spec §6 calls out explicitly; other
    /// fields (`min_runspaces >= 1`) are enforced by the builder's callers
    /// using plain positive integers, not re-validated here.
    fn validate(&self) -> Result<()> {
        if self.min_runspaces < 1 {
            return Err(PsrpError::InvalidMessage("min_runspaces must be >= 1".to_string()));
        }
        if self.max_runspaces < self.min_runspaces {
            return Err(PsrpError::InvalidMessage(
                "max_runspaces must be >= min_runspaces".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a client-originated call id is waiting to do once the matching
/// `RunspaceAvailability` response arrives (spec's `ci_handlers`).
#[derive(Debug, Clone, Copy)]
pub(crate) enum ClientPendingCall {
    GetAvailableRunspaces,
    SetMaxRunspaces(i32),
    SetMinRunspaces(i32),
    ResetRunspaceState,
}

/// What an incoming call id originated as, kept around until the embedder
/// answers it (spec's `ci_events`).
#[derive(Debug, Clone, Copy)]
pub(crate) enum CiOrigin {
    HostCall { pipeline_id: Option<Uuid> },
    SetMaxRunspaces,
    SetMinRunspaces,
    ResetRunspaceState,
    GetAvailableRunspaces,
}

/// What a registered client pipeline will send when started (spec §4.3's
/// `start()`: "enqueues the pipeline's `CreatePipeline`/`GetCommandMetadata`").
/// Kept around (rather than discarded after the first `start()`) so a
/// pipeline can be restarted from `Stopped`/`Completed`.
#[derive(Debug, Clone)]
pub(crate) enum PipelineMetadata {
    PowerShell(crate::messages::CreatePipeline),
    CommandMetadata(crate::messages::GetCommandMetadata),
}

/// Per-pipeline bookkeeping the pool itself needs: just enough to route
/// messages and validate state transitions.
#[derive(Debug, Clone)]
pub(crate) struct PipelineEntry {
    pub state: crate::pipeline::PSInvocationState,
    pub is_nested: bool,
    pub metadata: PipelineMetadata,
}

/// The state and plumbing shared by [`crate::pool::ClientRunspacePool`] and
/// [`crate::pool::ServerRunspacePool`]: counters, send queue, defragmenter,
/// pipeline table, negotiated capability. Role-specific behavior (what
/// happens on `open()`, how an incoming `SessionCapability` is handled)
/// lives on the two wrapper types; this only supplies the mechanics both
/// need.
#[derive(Debug)]
pub struct RunspacePoolCore {
    pub(crate) destination: Destination,
    pub id: Uuid,
    pub state: RunspacePoolState,
    pub min_runspaces: i32,
    pub max_runspaces: i32,
    pub apartment_state: ApartmentState,
    pub thread_options: PSThreadOptions,
    pub host_info: HostInfo,
    pub application_arguments: ApplicationArguments,
    pub application_private_data: Option<IndexMap<String, crate::value::PsValue>>,
    pub our_protocol_version: ProtocolVersion,
    pub peer_protocol_version: Option<ProtocolVersion>,
    pub(crate) pipelines: IndexMap<Uuid, PipelineEntry>,
    ci_counter: i64,
    fragment_counter: u64,
    send_queue: VecDeque<OutgoingMessage>,
    defragmenter: Defragmenter,
    pending_bodies: VecDeque<Vec<u8>>,
    pub(crate) ci_handlers: IndexMap<i64, ClientPendingCall>,
    pub(crate) ci_events: IndexMap<i64, CiOrigin>,
    pub(crate) cipher: Option<[u8; 32]>,
    pub(crate) key_requested: bool,
}

impl RunspacePoolCore {
    /// `destination` is fixed for the lifetime of the pool: a client core
    /// always addresses the server and vice versa, since it's the two
    /// wrapper types (not this shared core) that know which role they are.
    pub(crate) fn new(config: RunspacePoolConfig, destination: Destination) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            destination,
            id: config.runspace_pool_id.unwrap_or_else(Uuid::new_v4),
            state: RunspacePoolState::BeforeOpen,
            min_runspaces: config.min_runspaces,
            max_runspaces: config.max_runspaces,
            apartment_state: config.apartment_state,
            thread_options: config.thread_options,
            host_info: config.host_info,
            application_arguments: config.application_arguments,
            application_private_data: None,
            our_protocol_version: ProtocolVersion::CURRENT,
            peer_protocol_version: None,
            pipelines: IndexMap::new(),
            ci_counter: 0,
            fragment_counter: 0,
            send_queue: VecDeque::new(),
            defragmenter: Defragmenter::new(),
            pending_bodies: VecDeque::new(),
            ci_handlers: IndexMap::new(),
            ci_events: IndexMap::new(),
            cipher: None,
            key_requested: false,
        })
    }

    /// Allocates the next call id. 1-based, monotonic, never reused.
    pub(crate) fn next_ci(&mut self) -> i64 {
        self.ci_counter += 1;
        self.ci_counter
    }

    fn next_object_id(&mut self) -> u64 {
        let id = self.fragment_counter;
        self.fragment_counter += 1;
        id
    }

    /// Requires the pool to be in one of `expected`, returning
    /// [`PsrpError::InvalidPoolState`] named `action` otherwise.
    pub(crate) fn require_state(&self, action: &'static str, expected: &[RunspacePoolState]) -> Result<()> {
        if expected.contains(&self.state) {
            Ok(())
        } else {
            Err(PsrpError::InvalidPoolState {
                action,
                actual: self.state,
                expected: expected.to_vec(),
            })
        }
    }

    pub(crate) fn require_protocol(&self, action: &'static str, required: ProtocolVersion) -> Result<()> {
        let actual = self.peer_protocol_version.unwrap_or(ProtocolVersion::CURRENT);
        if actual >= required {
            Ok(())
        } else {
            Err(PsrpError::IncompatibleProtocol { action, actual, required })
        }
    }

    /// Encodes `message` and queues it for fragmentation, targeting the
    /// pool (`pipeline_id = None`) or a specific pipeline.
    pub(crate) fn enqueue(
        &mut self,
        message: &impl PsObjectWithType,
        pipeline_id: Option<Uuid>,
        stream: StreamType,
    ) -> Result<()> {
        self.enqueue_value(message.message_type(), &message.to_ps_object(), pipeline_id, stream)
    }

    /// Like [`Self::enqueue`], but for callers (`CreatePipeline`'s
    /// `PowerShell` merge fields) that need to pick their CLIXML shape based
    /// on the peer's negotiated protocol version instead of going through
    /// [`PsObjectWithType::to_ps_object`], which always serializes at
    /// [`ProtocolVersion::CURRENT`].
    pub(crate) fn enqueue_value(
        &mut self,
        message_type: MessageType,
        value: &PsValue,
        pipeline_id: Option<Uuid>,
        stream: StreamType,
    ) -> Result<()> {
        // MS-PSRP fragments the whole packed message (destination, type,
        // pool/pipeline ids, CLIXML data), not just the CLIXML payload.
        let body = Envelope::new(
            self.destination,
            message_type,
            self.id,
            pipeline_id,
            clixml::encode(value, self.cipher.as_ref())?,
        )
        .pack();
        let object_id = self.next_object_id();
        self.send_queue
            .push_back(OutgoingMessage::new(message_type, body, self.id, pipeline_id, object_id, stream));
        Ok(())
    }

    /// Drains as many fragments as fit in `limit` bytes from the queue,
    /// wrapped in their envelope framing. Returns `None` once the queue is
    /// empty.
    pub fn data_to_send(&mut self, limit: usize) -> Result<Option<(Vec<u8>, StreamType)>> {
        Ok(fragment::pack(&mut self.send_queue, limit)?.map(|(bytes, stream, _pipeline_id)| (bytes, stream)))
    }

    /// Feeds newly-received bytes into the defragmenter and stashes any
    /// fully-reassembled message bodies for `next_event` to decode.
    pub fn receive_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.defragmenter.feed(bytes);
        self.pending_bodies.extend(self.defragmenter.unpack()?);
        Ok(())
    }

    /// Pops the next reassembled body, parsed into its envelope and
    /// CLIXML-decoded value, without dispatching it. Unknown message
    /// types are logged and skipped, matching spec §4.2's "unknown message
    /// types are logged and ignored".
    pub(crate) fn next_envelope(&mut self) -> Result<Option<(Envelope, crate::value::PsValue)>> {
        loop {
            let Some(raw) = self.pending_bodies.pop_front() else {
                return Ok(None);
            };
            let envelope = match Envelope::parse(&raw) {
                Ok(envelope) => envelope,
                Err(PsrpError::UnknownMessageType(code)) => {
                    tracing::warn!(message_type = format_args!("{code:#010x}"), "unknown message type");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let value = clixml::decode(&envelope.body, self.cipher.as_ref())?;
            return Ok(Some((envelope, value)));
        }
    }

    pub fn is_broken(&self) -> bool {
        self.state == RunspacePoolState::Broken
    }

    pub(crate) fn set_broken(&mut self) {
        self.state = RunspacePoolState::Broken;
    }
}

/// `ci = -100`, the wire sentinel meaning "this host call expects no
/// response" (spec's void-method marker, DESIGN NOTES "void host methods
/// sentinel"). Kept as a private constant instead of sprinkling the magic
/// number through `server.rs`.
pub(crate) const VOID_CALL_ID: i64 = -100;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::PublicKeyRequest;

    fn core() -> RunspacePoolCore {
        RunspacePoolCore::new(RunspacePoolConfig::builder().build(), Destination::Server).unwrap()
    }

    #[test]
    fn rejects_zero_min_runspaces() {
        let config = RunspacePoolConfig::builder().min_runspaces(0).build();
        assert!(RunspacePoolCore::new(config, Destination::Server).is_err());
    }

    #[test]
    fn rejects_max_below_min() {
        let config = RunspacePoolConfig::builder().min_runspaces(5).max_runspaces(2).build();
        assert!(RunspacePoolCore::new(config, Destination::Server).is_err());
    }

    #[test]
    fn ci_counter_is_monotonic_and_one_based() {
        let mut pool = core();
        assert_eq!(pool.next_ci(), 1);
        assert_eq!(pool.next_ci(), 2);
        assert_eq!(pool.next_ci(), 3);
    }

    #[test]
    fn require_state_rejects_unexpected_state() {
        let pool = core();
        assert!(pool
            .require_state("open", &[RunspacePoolState::Opened])
            .is_err());
        assert!(pool.require_state("open", &[RunspacePoolState::BeforeOpen]).is_ok());
    }

    #[test]
    fn require_protocol_assumes_current_until_peer_known() {
        let pool = core();
        assert!(pool.require_protocol("reset_runspace_state", ProtocolVersion::new(2, 3)).is_ok());
    }

    #[test]
    fn require_protocol_rejects_older_peer() {
        let mut pool = core();
        pool.peer_protocol_version = Some(ProtocolVersion::new(2, 1));
        assert!(pool.require_protocol("reset_runspace_state", ProtocolVersion::new(2, 3)).is_err());
    }

    #[test]
    fn enqueued_message_round_trips_through_data_to_send() {
        let mut pool = core();
        pool.enqueue(&PublicKeyRequest, None, StreamType::Default).unwrap();

        let (bytes, stream) = pool.data_to_send(4096).unwrap().unwrap();
        assert_eq!(stream, StreamType::Default);
        assert!(pool.data_to_send(4096).unwrap().is_none());

        let envelope = Envelope::parse(&bytes).unwrap();
        assert_eq!(envelope.message_type, MessageType::PublicKeyRequest);
        assert_eq!(envelope.runspace_pool_id, pool.id);
        assert_eq!(envelope.pipeline_id, None);
    }

    #[test]
    fn receive_data_reassembles_and_decodes_a_full_round_trip() {
        let mut sender = core();
        sender.enqueue(&PublicKeyRequest, None, StreamType::Default).unwrap();
        let (bytes, _) = sender.data_to_send(4096).unwrap().unwrap();

        let mut receiver = core();
        receiver.receive_data(&bytes).unwrap();
        let (envelope, value) = receiver.next_envelope().unwrap().unwrap();
        assert_eq!(envelope.message_type, MessageType::PublicKeyRequest);
        assert_eq!(PublicKeyRequest::try_from(&value).unwrap(), PublicKeyRequest);
        assert!(receiver.next_envelope().unwrap().is_none());
    }

    #[test]
    fn set_broken_reflects_in_is_broken() {
        let mut pool = core();
        assert!(!pool.is_broken());
        pool.set_broken();
        assert!(pool.is_broken());
    }
}
