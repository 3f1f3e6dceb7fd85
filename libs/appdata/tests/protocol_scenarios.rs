//! End-to-end protocol scenarios through a stream session

use appdata::test_utils::{bank_schema, CollectorListener, FailingListener};
use appdata::{
    ChannelListener, CompositeListener, Packet, ProtocolError, SessionState, Stage,
    StreamCapabilities, StreamSession,
};
use schema::{Field, Kind, ModuleSchema, ObjectType, ObjectUpdate, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn bank_update(key: u8, amount: &str) -> ObjectUpdate {
    ObjectUpdate::set("balances", vec![Value::Bytes(vec![key])], vec![Value::from(amount)])
}

fn open_session<L: appdata::Listener>(listener: L) -> StreamSession<L> {
    let mut session = StreamSession::new(listener);
    session
        .initialize(StreamCapabilities {
            has_event_aligned_writes: true,
        })
        .unwrap();
    session.initialize_module("bank", bank_schema()).unwrap();
    session
}

#[test]
fn duplicate_key_in_block_is_never_emitted() {
    init_tracing();
    let mut session = open_session(CollectorListener::new());

    session.start_block(7).unwrap();
    session.send_update("bank", bank_update(0x01, "100")).unwrap();
    let err = session.send_update("bank", bank_update(0x01, "200")).unwrap_err();

    match err {
        ProtocolError::DuplicateKey { module, key } => {
            assert_eq!(module, "bank");
            assert_eq!(key, "[0x01]");
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    let updates = session.listener().updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].update.value, [Value::from("100")]);
    assert_eq!(session.state(), SessionState::InBlock(7));
}

#[test]
fn integer_key_spellings_collide_within_a_block() {
    let counters = ModuleSchema::new(vec![ObjectType::new(
        "counters",
        vec![Field::new("id", Kind::IntegerString)],
        vec![Field::new("count", Kind::Uint32)],
    )])
    .unwrap();
    let counter = |id: &str, count: u32| {
        ObjectUpdate::set("counters", vec![Value::from(id)], vec![Value::Uint32(count)])
    };

    let mut session = open_session(CollectorListener::new());
    session.initialize_module("counters", counters).unwrap();

    session.start_block(7).unwrap();
    session.send_update("counters", counter("1", 10)).unwrap();
    let err = session.send_update("counters", counter("01", 11)).unwrap_err();
    assert!(matches!(err, ProtocolError::DuplicateKey { ref module, .. } if module == "counters"));

    let updates = session.listener().updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].update.value, [Value::Uint32(10)]);

    session.commit().unwrap();
    session.start_block(8).unwrap();
    session.send_update("counters", counter("01", 11)).unwrap();
    session.commit().unwrap();
    assert_eq!(session.listener().committed_heights(), [7, 8]);
}

#[test]
fn deleting_and_recreating_a_key_needs_two_blocks() {
    let mut session = open_session(CollectorListener::new());

    session.start_block(1).unwrap();
    session
        .send_update("bank", ObjectUpdate::delete("balances", vec![Value::Bytes(vec![2])]))
        .unwrap();
    assert!(session.send_update("bank", bank_update(2, "1")).is_err());
    session.commit().unwrap();

    session.start_block(2).unwrap();
    session.send_update("bank", bank_update(2, "1")).unwrap();
    session.commit().unwrap();

    assert_eq!(session.listener().committed_heights(), [1, 2]);
}

#[test]
fn listener_failure_mid_block_stops_delivery() {
    init_tracing();
    let mut session = open_session(FailingListener::on_update(2));

    session.start_block(1).unwrap();
    session.send_update("bank", bank_update(1, "1")).unwrap();
    let err = session.send_update("bank", bank_update(2, "2")).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::ListenerRejected {
            stage: Stage::ObjectUpdate,
            ..
        }
    ));

    assert_eq!(session.send_update("bank", bank_update(3, "3")), Err(ProtocolError::SessionFailed));
    assert_eq!(session.commit(), Err(ProtocolError::SessionFailed));

    let listener = session.into_listener();
    assert_eq!(listener.updates_seen(), 2);
    assert!(listener.collector().committed_heights().is_empty());
}

#[test]
fn failing_commit_leaves_height_uncommitted() {
    let mut session = open_session(FailingListener::on_commit());
    session.start_block(1).unwrap();
    session.send_update("bank", bank_update(1, "1")).unwrap();

    assert!(session.commit().unwrap_err().is_listener_failure());
    assert_eq!(session.last_committed_height(), None);
}

#[tokio::test]
async fn composite_feeds_channel_and_collector_identically() {
    let (channel, mut receiver) = ChannelListener::new();
    let composite = CompositeListener::new().with_listener("channel", channel);
    let mut session = open_session(composite);

    for height in 1..=3u64 {
        session.start_block(height).unwrap();
        session
            .send_update("bank", bank_update(height as u8, &height.to_string()))
            .unwrap();
        session.commit().unwrap();
    }
    drop(session);

    let mut received = Vec::new();
    while let Some(packet) = receiver.recv().await {
        received.push(packet);
    }

    // initialize + module + 3 × (start, update, commit)
    assert_eq!(received.len(), 11);
    assert!(matches!(received[0], Packet::Initialization(caps) if caps.has_event_aligned_writes));
    let heights: Vec<u64> = received
        .iter()
        .filter_map(|p| match p {
            Packet::StartBlock(data) => Some(data.height),
            _ => None,
        })
        .collect();
    assert_eq!(heights, [1, 2, 3]);
}
