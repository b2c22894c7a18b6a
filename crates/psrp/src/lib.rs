//! Sans-I/O implementation of the PowerShell Remoting Protocol (MS-PSRP).
//!
//! This crate never touches a socket. Callers push received bytes in with
//! `receive_data`, pull bytes to send out with `data_to_send`, and drain
//! decoded events with `next_event`; how those bytes travel (WinRM, SSH,
//! named pipes) is entirely up to the embedder.

mod error;
pub mod clixml;
pub mod crypto;
pub mod envelope;
pub mod event;
pub mod fragment;
pub mod host;
pub mod messages;
pub mod pipeline;
pub mod pool;
pub mod shell;
pub mod value;

pub use error::{PsrpError, Result};
pub use event::{PsrpEvent, PsrpEventKind};
