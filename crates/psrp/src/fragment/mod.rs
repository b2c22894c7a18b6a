mod defragmenter;
mod fragment;
mod fragmenter;
mod outgoing;

pub use defragmenter::Defragmenter;
pub use fragment::Fragment;
pub use fragmenter::pack;
pub use outgoing::{OutgoingMessage, StreamType};
