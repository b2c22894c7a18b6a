/// Everything that can go wrong while driving a [`crate::pool::RunspacePool`]
/// or a [`crate::pipeline::Pipeline`].
///
/// Programmer errors (wrong state, below-minimum buffer, wrong response
/// type) are returned directly from the call that triggered them and never
/// mutate queues or counters. Protocol errors decoded from the wire
/// (`FragmentOutOfOrder`, `MalformedCLIXML`) poison the pool: the next call
/// to `next_event` surfaces them and the pool's state becomes `Broken`.
#[derive(Debug, thiserror::Error)]
pub enum PsrpError {
    #[error("invalid pool state for {action}: expected one of {expected:?}, was {actual:?}")]
    InvalidPoolState {
        action: &'static str,
        actual: crate::pool::RunspacePoolState,
        expected: Vec<crate::pool::RunspacePoolState>,
    },

    #[error("invalid pipeline state for {action}: expected one of {expected:?}, was {actual:?}")]
    InvalidPipelineState {
        action: &'static str,
        actual: crate::pipeline::PSInvocationState,
        expected: Vec<crate::pipeline::PSInvocationState>,
    },

    #[error("{action} requires protocol version >= {required}, peer is at {actual}")]
    IncompatibleProtocol {
        action: &'static str,
        actual: crate::envelope::ProtocolVersion,
        required: crate::envelope::ProtocolVersion,
    },

    #[error("fragment out of order: expected fragment id {expected}, got {actual}")]
    FragmentOutOfOrder { expected: u64, actual: u64 },

    #[error("data_to_send limit {0} is below the minimum of 22 bytes (21-byte header + 1 body byte)")]
    InputTooSmall(usize),

    #[error("attempted to (de)serialize a secure string before key exchange completed")]
    MissingCipher,

    #[error("unknown message type {0:#010x}")]
    UnknownMessageType(u32),

    #[error("response type does not match the originating runspace-availability request")]
    ResponseTypeMismatch,

    #[error("malformed CLIXML: {0}")]
    MalformedClixml(String),

    #[error("invalid stream redirection value")]
    InvalidRedirection,

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error(transparent)]
    Xml(#[from] psrp_xml::XmlError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("AES/CBC padding error")]
    Unpad,
}

pub type Result<T> = std::result::Result<T, PsrpError>;
