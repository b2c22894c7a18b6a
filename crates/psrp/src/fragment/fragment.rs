use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::trace;

use crate::{PsrpError, Result};

/// One 21-byte-header chunk of an outgoing or incoming PSRP message.
///
/// <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/497ac440-89fb-47fb-9ADB-FA5B34Ea80BF>
#[derive(Debug, Clone)]
pub struct Fragment {
    pub object_id: u64,
    pub fragment_id: u64,
    pub start: bool,
    pub end: bool,
    pub data: Vec<u8>,
}

impl Fragment {
    pub fn new(object_id: u64, fragment_id: u64, data: Vec<u8>, start: bool, end: bool) -> Self {
        Self {
            object_id,
            fragment_id,
            start,
            end,
            data,
        }
    }

    /// Header size in bytes; the minimum acceptable `data_to_send` limit is
    /// this plus one body byte.
    pub const HEADER_LEN: usize = 21;

    pub fn pack(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(Self::HEADER_LEN + self.data.len());

        buffer.write_u64::<BigEndian>(self.object_id).unwrap();
        buffer.write_u64::<BigEndian>(self.fragment_id).unwrap();

        let mut flags = 0u8;
        if self.start {
            flags |= 0x01;
        }
        if self.end {
            flags |= 0x02;
        }
        buffer.push(flags);

        buffer
            .write_u32::<BigEndian>(self.data.len() as u32)
            .unwrap();
        buffer.extend_from_slice(&self.data);

        buffer
    }

    /// Unpacks one fragment from the front of `data`, returning it along
    /// with whatever bytes follow it.
    pub fn unpack(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < Self::HEADER_LEN {
            return Err(PsrpError::InvalidMessage(
                "fragment too short, need at least 21 header bytes".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let object_id = cursor.read_u64::<BigEndian>()?;
        let fragment_id = cursor.read_u64::<BigEndian>()?;

        let flags = cursor.read_u8()?;
        let start = (flags & 0x01) != 0;
        let end = (flags & 0x02) != 0;

        let length = cursor.read_u32::<BigEndian>()? as usize;
        trace!(object_id, fragment_id, start, end, length, "unpacked fragment header");

        if data.len() < Self::HEADER_LEN + length {
            return Err(PsrpError::InvalidMessage(format!(
                "fragment data truncated: expected {} bytes, got {}",
                Self::HEADER_LEN + length,
                data.len()
            )));
        }

        let fragment_data = data[Self::HEADER_LEN..Self::HEADER_LEN + length].to_vec();
        let remaining = &data[Self::HEADER_LEN + length..];

        Ok((Self::new(object_id, fragment_id, fragment_data, start, end), remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_pack_unpack() {
        let fragment = Fragment::new(7, 0, b"hello".to_vec(), true, false);
        let packed = fragment.pack();
        assert_eq!(packed.len(), Fragment::HEADER_LEN + 5);

        let (unpacked, rest) = Fragment::unpack(&packed).unwrap();
        assert!(rest.is_empty());
        assert_eq!(unpacked.object_id, 7);
        assert_eq!(unpacked.fragment_id, 0);
        assert!(unpacked.start);
        assert!(!unpacked.end);
        assert_eq!(unpacked.data, b"hello");
    }

    #[test]
    fn rejects_truncated_header() {
        let err = Fragment::unpack(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, PsrpError::InvalidMessage(_)));
    }

    #[test]
    fn rejects_truncated_body() {
        let fragment = Fragment::new(1, 0, b"0123456789".to_vec(), true, true);
        let mut packed = fragment.pack();
        packed.truncate(packed.len() - 3);
        let err = Fragment::unpack(&packed).unwrap_err();
        assert!(matches!(err, PsrpError::InvalidMessage(_)));
    }
}
