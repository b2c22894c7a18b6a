use std::collections::VecDeque;

use uuid::Uuid;

use crate::{PsrpError, Result};

use super::fragment::Fragment;
use super::outgoing::{OutgoingMessage, StreamType};

/// Packs queued messages into one fragmented payload that fits `limit`
/// bytes, removing fully-sent messages from `queue` and advancing the
/// fragment cursor of any message left partially sent.
///
/// Returns `None` if `queue` is empty. A single payload never mixes
/// messages bound for different pipelines.
pub fn pack(
    queue: &mut VecDeque<OutgoingMessage>,
    limit: usize,
) -> Result<Option<(Vec<u8>, StreamType, Option<Uuid>)>> {
    if limit < Fragment::HEADER_LEN + 1 {
        return Err(PsrpError::InputTooSmall(limit));
    }

    let Some(first) = queue.front() else {
        return Ok(None);
    };
    let stream = first.stream;
    let pipeline_id = first.pipeline_id;

    let mut buffer = Vec::new();
    let mut remaining_limit = limit;

    loop {
        let Some(message) = queue.front_mut() else {
            break;
        };
        if message.pipeline_id != pipeline_id {
            break;
        }
        if remaining_limit < Fragment::HEADER_LEN + 1 {
            break;
        }

        let budget = remaining_limit - Fragment::HEADER_LEN;
        let take = budget.min(message.remaining().len());
        let chunk = message.remaining()[..take].to_vec();
        let start = message.is_first_fragment();
        let fragment_id = message.advance(take);
        let end = message.is_exhausted();

        let fragment = Fragment::new(message.object_id, fragment_id, chunk, start, end);
        buffer.extend_from_slice(&fragment.pack());
        remaining_limit -= Fragment::HEADER_LEN + take;

        if end {
            queue.pop_front();
        }
    }

    if buffer.is_empty() {
        Ok(None)
    } else {
        Ok(Some((buffer, stream, pipeline_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageType;

    fn message(body_len: usize, object_id: u64, pipeline_id: Option<Uuid>) -> OutgoingMessage {
        OutgoingMessage::new(
            MessageType::PipelineInput,
            vec![0u8; body_len],
            Uuid::new_v4(),
            pipeline_id,
            object_id,
            StreamType::Default,
        )
    }

    #[test]
    fn rejects_limit_below_minimum() {
        let mut queue = VecDeque::from([message(10, 1, None)]);
        let err = pack(&mut queue, 21).unwrap_err();
        assert!(matches!(err, PsrpError::InputTooSmall(21)));
    }

    #[test]
    fn returns_none_for_empty_queue() {
        let mut queue = VecDeque::new();
        assert!(pack(&mut queue, 64).unwrap().is_none());
    }

    #[test]
    fn fragments_a_single_message_across_multiple_calls() {
        let mut queue = VecDeque::from([message(50, 9, None)]);

        let (payload, _, _) = pack(&mut queue, 22).unwrap().unwrap();
        assert_eq!(payload.len(), Fragment::HEADER_LEN + 1);
        let (frag, rest) = Fragment::unpack(&payload).unwrap();
        assert!(rest.is_empty());
        assert!(frag.start);
        assert!(!frag.end);
        assert_eq!(frag.object_id, 9);
        assert_eq!(frag.fragment_id, 0);

        // still queued: 49 bytes left
        assert_eq!(queue.len(), 1);
        let (payload, _, _) = pack(&mut queue, Fragment::HEADER_LEN + 49).unwrap().unwrap();
        let (frag, _) = Fragment::unpack(&payload).unwrap();
        assert!(!frag.start);
        assert!(frag.end);
        assert_eq!(frag.fragment_id, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn stops_before_mixing_pipelines() {
        let pid_a = Uuid::new_v4();
        let pid_b = Uuid::new_v4();
        let mut queue = VecDeque::from([message(5, 1, Some(pid_a)), message(5, 2, Some(pid_b))]);

        let (payload, _, returned_pid) = pack(&mut queue, 1024).unwrap().unwrap();
        assert_eq!(returned_pid, Some(pid_a));
        let (frag, rest) = Fragment::unpack(&payload).unwrap();
        assert!(rest.is_empty());
        assert_eq!(frag.object_id, 1);
        assert_eq!(queue.len(), 1);
    }
}
