//! Crate-level negotiation scenarios: a client and server pool driven
//! purely through their public APIs, bytes passed hand to hand the way an
//! embedder's transport would.

use psrp::pool::{ClientRunspacePool, RunspacePoolConfig, RunspacePoolState, ServerRunspacePool};
use psrp::PsrpEventKind;

/// Drains both sides' outgoing bytes into each other and collects every
/// decoded event until neither side has anything left to send or decode.
fn pump(client: &mut ClientRunspacePool, server: &mut ServerRunspacePool) -> Vec<PsrpEventKind> {
    let mut events = Vec::new();
    loop {
        let mut progressed = false;
        while let Some((bytes, _)) = client.data_to_send(4096).unwrap() {
            server.receive_data(&bytes).unwrap();
            progressed = true;
        }
        while let Some((bytes, _)) = server.data_to_send(4096).unwrap() {
            client.receive_data(&bytes).unwrap();
            progressed = true;
        }
        while let Some(event) = client.next_event().unwrap() {
            events.push(event.kind);
            progressed = true;
        }
        while let Some(event) = server.next_event().unwrap() {
            events.push(event.kind);
            progressed = true;
        }
        if !progressed {
            break;
        }
    }
    events
}

#[test]
fn open_reaches_opened_on_both_sides_and_agrees_on_a_pool_id() {
    let mut client = ClientRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
    let mut server = ServerRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();

    client.open().unwrap();
    pump(&mut client, &mut server);

    assert_eq!(client.state(), RunspacePoolState::Opened);
    assert_eq!(server.state(), RunspacePoolState::Opened);
    assert_eq!(client.id(), server.id());
}

#[test]
fn exchange_key_completes_without_either_side_going_broken() {
    let mut client = ClientRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
    let mut server = ServerRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();

    client.open().unwrap();
    pump(&mut client, &mut server);

    client.exchange_key().unwrap();
    pump(&mut client, &mut server);

    assert!(!client.is_broken());
    assert!(!server.is_broken());
}

#[test]
fn connect_reaches_opened_against_an_already_open_pool() {
    let mut client = ClientRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
    let mut server = ServerRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
    client.open().unwrap();
    pump(&mut client, &mut server);

    let mut reconnecting = ClientRunspacePool::new(
        RunspacePoolConfig::builder().runspace_pool_id(server.id()).build(),
    )
    .unwrap();
    reconnecting.connect().unwrap();
    pump(&mut reconnecting, &mut server);

    assert_eq!(reconnecting.state(), RunspacePoolState::Opened);
}
