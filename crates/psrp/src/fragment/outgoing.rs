use uuid::Uuid;

use crate::envelope::MessageType;

/// Which `Data` stream a WinRM-level transport should tag a packed payload
/// with. PSRP itself is stream-agnostic; this only threads the host's
/// choice of stream through fragmentation so it can be recovered at
/// `data_to_send` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Default,
    PromptResponse,
}

/// One queued, not-yet-fully-sent PSRP message, plus the cursor tracking how
/// much of it has been fragmented already.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub message_type: MessageType,
    pub body: Vec<u8>,
    pub runspace_pool_id: Uuid,
    pub pipeline_id: Option<Uuid>,
    pub object_id: u64,
    pub stream: StreamType,
    /// Bytes of `body` already handed out as fragment payloads.
    cursor: usize,
    /// Next fragment id to assign within this object.
    next_fragment_id: u64,
}

impl OutgoingMessage {
    pub fn new(
        message_type: MessageType,
        body: Vec<u8>,
        runspace_pool_id: Uuid,
        pipeline_id: Option<Uuid>,
        object_id: u64,
        stream: StreamType,
    ) -> Self {
        Self {
            message_type,
            body,
            runspace_pool_id,
            pipeline_id,
            object_id,
            stream,
            cursor: 0,
            next_fragment_id: 0,
        }
    }

    pub fn is_first_fragment(&self) -> bool {
        self.next_fragment_id == 0
    }

    pub fn remaining(&self) -> &[u8] {
        &self.body[self.cursor..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.body.len()
    }

    /// Advances the cursor by `len` bytes and returns the fragment id to use
    /// for the chunk just taken, incrementing it for next time.
    pub fn advance(&mut self, len: usize) -> u64 {
        self.cursor += len;
        let id = self.next_fragment_id;
        self.next_fragment_id += 1;
        id
    }
}
