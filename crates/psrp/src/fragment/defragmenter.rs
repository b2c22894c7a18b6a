use std::collections::HashMap;

use tracing::trace;

use crate::{PsrpError, Result};

use super::fragment::Fragment;

#[derive(Debug)]
struct Assembly {
    next_fragment_id: u64,
    data: Vec<u8>,
}

/// Reassembles fragmented PSRP messages from an incoming byte stream.
///
/// Fragments for different object ids may be in flight at once (one
/// `Assembly` each); within one object id, fragment ids must arrive
/// strictly increasing and contiguous from 0, or the stream is poisoned
/// with [`PsrpError::FragmentOutOfOrder`].
#[derive(Debug, Default)]
pub struct Defragmenter {
    pending: Vec<u8>,
    assemblies: HashMap<u64, Assembly>,
}

impl Defragmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    pub fn pending_objects(&self) -> usize {
        self.assemblies.len()
    }

    /// Drains as many complete message bodies as the currently-buffered
    /// bytes allow. Leaves any trailing partial fragment in the internal
    /// buffer for the next call.
    pub fn unpack(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut completed = Vec::new();

        loop {
            let (fragment, rest) = match Fragment::unpack(&self.pending) {
                Ok(parsed) => parsed,
                // Not a protocol error: just haven't received the rest yet.
                Err(_) => break,
            };
            let consumed = self.pending.len() - rest.len();

            trace!(
                object_id = fragment.object_id,
                fragment_id = fragment.fragment_id,
                start = fragment.start,
                end = fragment.end,
                "defragmenter consumed fragment"
            );

            if fragment.start && fragment.end {
                completed.push(fragment.data);
                self.pending.drain(..consumed);
                continue;
            }

            if fragment.start {
                self.assemblies.insert(
                    fragment.object_id,
                    Assembly {
                        next_fragment_id: 1,
                        data: fragment.data,
                    },
                );
                self.pending.drain(..consumed);
                continue;
            }

            let Some(assembly) = self.assemblies.get_mut(&fragment.object_id) else {
                return Err(PsrpError::FragmentOutOfOrder {
                    expected: 0,
                    actual: fragment.fragment_id,
                });
            };
            if fragment.fragment_id != assembly.next_fragment_id {
                return Err(PsrpError::FragmentOutOfOrder {
                    expected: assembly.next_fragment_id,
                    actual: fragment.fragment_id,
                });
            }

            assembly.data.extend_from_slice(&fragment.data);
            assembly.next_fragment_id += 1;

            if fragment.end {
                let assembly = self.assemblies.remove(&fragment.object_id).unwrap();
                completed.push(assembly.data);
            }

            self.pending.drain(..consumed);
        }

        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_a_single_fragment_message() {
        let mut defrag = Defragmenter::new();
        defrag.feed(&Fragment::new(1, 0, b"hello".to_vec(), true, true).pack());
        let messages = defrag.unpack().unwrap();
        assert_eq!(messages, vec![b"hello".to_vec()]);
    }

    #[test]
    fn reassembles_across_multiple_fragments() {
        let mut defrag = Defragmenter::new();
        defrag.feed(&Fragment::new(1, 0, b"hel".to_vec(), true, false).pack());
        defrag.feed(&Fragment::new(1, 1, b"lo".to_vec(), false, true).pack());
        let messages = defrag.unpack().unwrap();
        assert_eq!(messages, vec![b"hello".to_vec()]);
    }

    #[test]
    fn interleaves_different_object_ids() {
        let mut defrag = Defragmenter::new();
        defrag.feed(&Fragment::new(1, 0, b"A1".to_vec(), true, false).pack());
        defrag.feed(&Fragment::new(2, 0, b"B1".to_vec(), true, false).pack());
        defrag.feed(&Fragment::new(1, 1, b"A2".to_vec(), false, true).pack());
        defrag.feed(&Fragment::new(2, 1, b"B2".to_vec(), false, true).pack());
        let messages = defrag.unpack().unwrap();
        assert_eq!(messages, vec![b"A1A2".to_vec(), b"B1B2".to_vec()]);
    }

    #[test]
    fn rejects_a_gap_in_fragment_ids() {
        let mut defrag = Defragmenter::new();
        defrag.feed(&Fragment::new(1, 0, b"A".to_vec(), true, false).pack());
        defrag.feed(&Fragment::new(1, 2, b"C".to_vec(), false, true).pack());
        let err = defrag.unpack().unwrap_err();
        assert!(matches!(
            err,
            PsrpError::FragmentOutOfOrder { expected: 1, actual: 2 }
        ));
    }

    #[test]
    fn leaves_a_partial_fragment_buffered() {
        let mut defrag = Defragmenter::new();
        let packed = Fragment::new(1, 0, b"hello".to_vec(), true, true).pack();
        defrag.feed(&packed[..packed.len() - 2]);
        assert!(defrag.unpack().unwrap().is_empty());
        defrag.feed(&packed[packed.len() - 2..]);
        assert_eq!(defrag.unpack().unwrap(), vec![b"hello".to_vec()]);
    }
}
