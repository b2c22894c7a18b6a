use std::fmt;
use std::io::Read;
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use uuid::Uuid;

use crate::{PsrpError, Result};

/// `major.minor`, as carried in `SessionCapability.protocolversion` and
/// compared against feature gates (e.g. the `CreatePipeline` `NoNewScope`
/// merge field, added in 2.2).
///
/// <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/497ac440-89fb-4cb3-9cc1-3434c1aa74c3>
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

impl ProtocolVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// The version this crate negotiates as its own capability.
    pub const CURRENT: Self = Self::new(2, 3);
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ProtocolVersion {
    type Err = PsrpError;

    fn from_str(s: &str) -> Result<Self> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| PsrpError::InvalidMessage(format!("invalid protocol version: {s}")))?;
        let major = major
            .parse()
            .map_err(|_| PsrpError::InvalidMessage(format!("invalid protocol version: {s}")))?;
        let minor = minor
            .parse()
            .map_err(|_| PsrpError::InvalidMessage(format!("invalid protocol version: {s}")))?;
        Ok(Self { major, minor })
    }
}

/// Which side a message travels towards.
///
/// The wire values are opposite the names' naive reading: a message
/// travelling *to* the server is tagged `Server`[sic] in MS-PSRP's own
/// enumeration, but this crate names the variant by the role it is
/// addressed to, per spec's literal value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Server = 0x0000_0002,
    Client = 0x0000_0001,
}

impl TryFrom<u32> for Destination {
    type Error = PsrpError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0x0000_0002 => Ok(Destination::Server),
            0x0000_0001 => Ok(Destination::Client),
            _ => Err(PsrpError::InvalidMessage(format!(
                "unknown destination value: {value:#010x}"
            ))),
        }
    }
}

/// One PSRP message type, tagged by its MS-PSRP wire constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    SessionCapability,
    InitRunspacePool,
    PublicKey,
    EncryptedSessionKey,
    PublicKeyRequest,
    ConnectRunspacePool,
    RunspacePoolInitData,
    ResetRunspaceState,
    SetMaxRunspaces,
    SetMinRunspaces,
    RunspaceAvailability,
    RunspacePoolState,
    CreatePipeline,
    GetAvailableRunspaces,
    UserEvent,
    ApplicationPrivateData,
    GetCommandMetadata,
    RunspacePoolHostCall,
    RunspacePoolHostResponse,
    PipelineInput,
    EndOfPipelineInput,
    PipelineOutput,
    ErrorRecord,
    PipelineState,
    DebugRecord,
    VerboseRecord,
    WarningRecord,
    ProgressRecord,
    InformationRecord,
    PipelineHostCall,
    PipelineHostResponse,
}

impl MessageType {
    pub const fn value(self) -> u32 {
        match self {
            MessageType::SessionCapability => 0x0001_0002,
            MessageType::InitRunspacePool => 0x0001_0004,
            MessageType::PublicKey => 0x0001_0005,
            MessageType::EncryptedSessionKey => 0x0001_0006,
            MessageType::PublicKeyRequest => 0x0001_0007,
            MessageType::ConnectRunspacePool => 0x0001_0008,
            MessageType::RunspacePoolInitData => 0x0002_100B,
            MessageType::ResetRunspaceState => 0x0002_100C,
            MessageType::SetMaxRunspaces => 0x0002_1002,
            MessageType::SetMinRunspaces => 0x0002_1003,
            MessageType::RunspaceAvailability => 0x0002_1004,
            MessageType::RunspacePoolState => 0x0002_1005,
            MessageType::CreatePipeline => 0x0002_1006,
            MessageType::GetAvailableRunspaces => 0x0002_1007,
            MessageType::UserEvent => 0x0002_1008,
            MessageType::ApplicationPrivateData => 0x0002_1009,
            MessageType::GetCommandMetadata => 0x0002_100A,
            MessageType::RunspacePoolHostCall => 0x0002_1100,
            MessageType::RunspacePoolHostResponse => 0x0002_1101,
            MessageType::PipelineInput => 0x0004_1002,
            MessageType::EndOfPipelineInput => 0x0004_1003,
            MessageType::PipelineOutput => 0x0004_1004,
            MessageType::ErrorRecord => 0x0004_1005,
            MessageType::PipelineState => 0x0004_1006,
            MessageType::DebugRecord => 0x0004_1007,
            MessageType::VerboseRecord => 0x0004_1008,
            MessageType::WarningRecord => 0x0004_1009,
            MessageType::ProgressRecord => 0x0004_1010,
            MessageType::InformationRecord => 0x0004_1011,
            MessageType::PipelineHostCall => 0x0004_1100,
            MessageType::PipelineHostResponse => 0x0004_1101,
        }
    }
}

impl TryFrom<u32> for MessageType {
    type Error = PsrpError;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            0x0001_0002 => MessageType::SessionCapability,
            0x0001_0004 => MessageType::InitRunspacePool,
            0x0001_0005 => MessageType::PublicKey,
            0x0001_0006 => MessageType::EncryptedSessionKey,
            0x0001_0007 => MessageType::PublicKeyRequest,
            0x0001_0008 => MessageType::ConnectRunspacePool,
            0x0002_100B => MessageType::RunspacePoolInitData,
            0x0002_100C => MessageType::ResetRunspaceState,
            0x0002_1002 => MessageType::SetMaxRunspaces,
            0x0002_1003 => MessageType::SetMinRunspaces,
            0x0002_1004 => MessageType::RunspaceAvailability,
            0x0002_1005 => MessageType::RunspacePoolState,
            0x0002_1006 => MessageType::CreatePipeline,
            0x0002_1007 => MessageType::GetAvailableRunspaces,
            0x0002_1008 => MessageType::UserEvent,
            0x0002_1009 => MessageType::ApplicationPrivateData,
            0x0002_100A => MessageType::GetCommandMetadata,
            0x0002_1100 => MessageType::RunspacePoolHostCall,
            0x0002_1101 => MessageType::RunspacePoolHostResponse,
            0x0004_1002 => MessageType::PipelineInput,
            0x0004_1003 => MessageType::EndOfPipelineInput,
            0x0004_1004 => MessageType::PipelineOutput,
            0x0004_1005 => MessageType::ErrorRecord,
            0x0004_1006 => MessageType::PipelineState,
            0x0004_1007 => MessageType::DebugRecord,
            0x0004_1008 => MessageType::VerboseRecord,
            0x0004_1009 => MessageType::WarningRecord,
            0x0004_1010 => MessageType::ProgressRecord,
            0x0004_1011 => MessageType::InformationRecord,
            0x0004_1100 => MessageType::PipelineHostCall,
            0x0004_1101 => MessageType::PipelineHostResponse,
            other => return Err(PsrpError::UnknownMessageType(other)),
        })
    }
}

/// The leading 3-byte UTF-8 byte-order mark some peers prefix CLIXML with.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// A decoded message envelope: destination, type, pool/pipeline ids, and the
/// (BOM-stripped) CLIXML body.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub destination: Destination,
    pub message_type: MessageType,
    pub runspace_pool_id: Uuid,
    pub pipeline_id: Option<Uuid>,
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(
        destination: Destination,
        message_type: MessageType,
        runspace_pool_id: Uuid,
        pipeline_id: Option<Uuid>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            destination,
            message_type,
            runspace_pool_id,
            pipeline_id,
            body,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(24 + self.body.len());
        buffer
            .write_u32::<LittleEndian>(self.destination as u32)
            .unwrap();
        buffer
            .write_u32::<LittleEndian>(self.message_type.value())
            .unwrap();
        buffer.extend_from_slice(self.runspace_pool_id.as_bytes());
        buffer.extend_from_slice(
            self.pipeline_id
                .unwrap_or_else(Uuid::nil)
                .as_bytes(),
        );
        buffer.extend_from_slice(&self.body);
        buffer
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(data);

        let destination = Destination::try_from(cursor.read_u32::<LittleEndian>()?)?;
        let message_type = MessageType::try_from(cursor.read_u32::<LittleEndian>()?)?;

        let mut pool_bytes = [0u8; 16];
        cursor.read_exact(&mut pool_bytes)?;
        let runspace_pool_id = Uuid::from_bytes(pool_bytes);

        let mut pipeline_bytes = [0u8; 16];
        cursor.read_exact(&mut pipeline_bytes)?;
        let pipeline_id = (pipeline_bytes != [0u8; 16]).then(|| Uuid::from_bytes(pipeline_bytes));

        let mut body = Vec::new();
        cursor.read_to_end(&mut body)?;
        if body.starts_with(&UTF8_BOM) {
            body.drain(..3);
        }

        Ok(Self {
            destination,
            message_type,
            runspace_pool_id,
            pipeline_id,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_envelope() {
        let pool_id = Uuid::new_v4();
        let envelope = Envelope::new(
            Destination::Server,
            MessageType::SessionCapability,
            pool_id,
            None,
            b"<Obj RefId=\"0\"/>".to_vec(),
        );
        let packed = envelope.pack();
        let parsed = Envelope::parse(&packed).unwrap();
        assert_eq!(parsed.destination, Destination::Server);
        assert_eq!(parsed.message_type, MessageType::SessionCapability);
        assert_eq!(parsed.runspace_pool_id, pool_id);
        assert_eq!(parsed.pipeline_id, None);
        assert_eq!(parsed.body, b"<Obj RefId=\"0\"/>");
    }

    #[test]
    fn strips_leading_bom() {
        let mut body = UTF8_BOM.to_vec();
        body.extend_from_slice(b"<Obj/>");
        let envelope = Envelope::new(
            Destination::Client,
            MessageType::PipelineOutput,
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            body,
        );
        let parsed = Envelope::parse(&envelope.pack()).unwrap();
        assert_eq!(parsed.body, b"<Obj/>");
    }

    #[test]
    fn parses_protocol_version() {
        let version: ProtocolVersion = "2.3".parse().unwrap();
        assert_eq!(version, ProtocolVersion::new(2, 3));
        assert!(version >= ProtocolVersion::new(2, 2));
    }
}
