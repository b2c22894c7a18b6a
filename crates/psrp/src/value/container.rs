use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use super::PsValue;

/// The four CLIXML container wrappers (`<STK>`, `<QUE>`, `<LST>`, `<DCT>`).
///
/// `Dictionary` uses an insertion-ordered `IndexMap` rather than a sorted
/// map: spec §3/§4.4 requires property and container ordering to survive a
/// serialize/deserialize round trip, and PowerShell hashtables themselves
/// have no canonical key order either — the wire order is whatever order
/// the sender inserted entries in.
///
/// <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/e9cf648e-38fe-42ba-9ca3-d89a9e0a856a>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Stack(Vec<PsValue>),
    Queue(Vec<PsValue>),
    List(Vec<PsValue>),
    Dictionary(IndexMap<PsValue, PsValue>),
}

// `IndexMap` has no `Hash` impl (like `HashMap`, key order isn't part of its
// equality, so a derive can't be order-independent). Dictionary entries are
// folded with XOR so the result doesn't depend on insertion order, matching
// `PartialEq`'s order-independent comparison.
impl Hash for Container {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Container::Stack(items) => {
                0u8.hash(state);
                items.hash(state);
            }
            Container::Queue(items) => {
                1u8.hash(state);
                items.hash(state);
            }
            Container::List(items) => {
                2u8.hash(state);
                items.hash(state);
            }
            Container::Dictionary(entries) => {
                3u8.hash(state);
                let mut acc = 0u64;
                for (k, v) in entries {
                    let mut entry_hasher = DefaultHasher::new();
                    k.hash(&mut entry_hasher);
                    v.hash(&mut entry_hasher);
                    acc ^= entry_hasher.finish();
                }
                acc.hash(state);
            }
        }
    }
}

impl Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Stack(_) => write!(f, "System.Collections.Stack"),
            Container::Queue(_) => write!(f, "System.Collections.Queue"),
            Container::List(items) => {
                let s: Vec<String> = items.iter().map(std::string::ToString::to_string).collect();
                write!(f, "{}", s.join(" "))
            }
            Container::Dictionary(_) => write!(f, "System.Collections.Hashtable"),
        }
    }
}

/// An enum value: underlying 32-bit integer plus the `ToString` the
/// surrounding `ComplexObject` carries.
///
/// <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/3eb085fd-2e30-4c21-ab81-10f5b72ba835>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PsEnum {
    pub value: i32,
}

impl Display for PsEnum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
