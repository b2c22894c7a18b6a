//! Crate-level multi-fragment reassembly: the public `data_to_send`/
//! `receive_data` pair driven with a payload limit far smaller than a
//! single message, forcing the fragmenter/defragmenter to do real work
//! instead of the one-fragment-per-message happy path the other tests use.

use psrp::messages::init_runspace_pool::HostInfo;
use psrp::messages::{Command, CreatePipeline, PowerShellPipeline};
use psrp::pool::{ClientRunspacePool, RunspacePoolConfig, RunspacePoolState, ServerRunspacePool};
use psrp::value::PsValue;
use psrp::PsrpEventKind;

const FRAGMENT_LIMIT: usize = 64;

fn pump(client: &mut ClientRunspacePool, server: &mut ServerRunspacePool) -> Vec<PsrpEventKind> {
    let mut events = Vec::new();
    loop {
        let mut progressed = false;
        while let Some((bytes, _)) = client.data_to_send(FRAGMENT_LIMIT).unwrap() {
            server.receive_data(&bytes).unwrap();
            progressed = true;
        }
        while let Some((bytes, _)) = server.data_to_send(FRAGMENT_LIMIT).unwrap() {
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

fn opened_pair() -> (ClientRunspacePool, ServerRunspacePool) {
    let mut client = ClientRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
    let mut server = ServerRunspacePool::new(RunspacePoolConfig::builder().build()).unwrap();
    client.open().unwrap();
    pump(&mut client, &mut server);
    assert_eq!(client.state(), RunspacePoolState::Opened);
    (client, server)
}

#[test]
fn a_long_command_line_survives_being_split_into_many_fragments() {
    let (mut client, mut server) = opened_pair();

    // One long argument forces the CreatePipeline body across several
    // fragments at a 64-byte-per-packet limit.
    let long_argument = "x".repeat(2000);
    let create = CreatePipeline::new(
        PowerShellPipeline::new(vec![Command::new("Write-Output").with_argument(long_argument.as_str())]),
        HostInfo::null(),
    );

    let pipeline_id = client.create_pipeline(create).unwrap();
    client.start_pipeline(pipeline_id).unwrap();
    let events = pump(&mut client, &mut server);

    let found = events.iter().find_map(|event| match event {
        PsrpEventKind::CreatePipeline(create) => Some(create),
        _ => None,
    });
    let create = found.expect("server should have decoded the fragmented CreatePipeline");
    let argument = create.power_shell.commands[0].parameters[0]
        .value
        .as_str()
        .expect("expected the command argument to decode back to a string");
    assert_eq!(argument, long_argument);
}

#[test]
fn pipeline_output_reassembles_across_fragments_both_ways() {
    let (mut client, mut server) = opened_pair();

    let create = CreatePipeline::new(PowerShellPipeline::new(vec![Command::new("Get-Content")]), HostInfo::null());
    let pipeline_id = client.create_pipeline(create).unwrap();
    client.start_pipeline(pipeline_id).unwrap();
    pump(&mut client, &mut server);

    server.start_pipeline(pipeline_id).unwrap();
    let big_output = "y".repeat(3000);
    server.write_output(pipeline_id, PsValue::from(big_output.as_str())).unwrap();
    let events = pump(&mut client, &mut server);

    let output = events
        .iter()
        .find_map(|event| match event {
            PsrpEventKind::PipelineOutput(output) => Some(&output.data),
            _ => None,
        })
        .expect("client should have reassembled the fragmented PipelineOutput");
    assert_eq!(output, &PsValue::from(big_output.as_str()));
}
