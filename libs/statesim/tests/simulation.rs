//! Simulator runs against recording and failing listeners

use std::collections::{BTreeMap, HashSet};

use appdata::test_utils::{bank_schema, CollectorListener, FailingListener};
use appdata::{ObjectUpdateData, Packet, ProtocolError, Stage};
use codec::{decode_object_key, decode_object_value, encode_object_key, encode_object_value};
use proptest::prelude::*;
use schema::{ModuleSchema, ObjectUpdate, Value};
use statesim::{AppState, SimError, Simulator, SimulatorConfig, EXAMPLE_APP_SCHEMA};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn bank() -> BTreeMap<String, ModuleSchema> {
    BTreeMap::from([("bank".to_string(), bank_schema())])
}

fn deposit(address: u8, amount: &str) -> Packet {
    ObjectUpdateData::new(
        "bank",
        ObjectUpdate::set("balances", vec![Value::Bytes(vec![address])], vec![amount.into()]),
    )
    .into()
}

fn config(seed: u64, max_updates: usize) -> SimulatorConfig {
    SimulatorConfig::default()
        .with_seed(seed)
        .with_max_updates_per_block(max_updates)
}

#[test]
fn listener_failure_halts_block_without_commit() {
    init_tracing();
    let mut sim = Simulator::new(bank(), FailingListener::on_update(2), config(1, 10)).unwrap();
    sim.initialize().unwrap();

    let block = vec![deposit(1, "10"), deposit(2, "20"), deposit(3, "30")];
    let err = sim.process_block_data(block).unwrap_err();

    assert!(err.is_listener_failure());
    assert!(matches!(
        err,
        SimError::Protocol(ProtocolError::ListenerRejected {
            stage: Stage::ObjectUpdate,
            ..
        })
    ));
    assert_eq!(sim.block_num(), 0);
    assert_eq!(sim.state().object_count(), 1);

    let collection = sim.state().module("bank").unwrap().collection("balances").unwrap();
    assert!(collection.get(&[Value::Bytes(vec![3])]).unwrap().is_none());

    let listener = sim.into_listener();
    assert_eq!(listener.updates_seen(), 2);
    assert!(listener.collector().committed_heights().is_empty());
}

#[test]
fn failed_simulation_stays_failed() {
    let mut sim = Simulator::new(bank(), FailingListener::on_commit(), config(2, 10)).unwrap();
    sim.initialize().unwrap();

    let err = sim.process_block_data(vec![deposit(1, "1")]).unwrap_err();
    assert!(err.is_listener_failure());
    assert_eq!(sim.block_num(), 0);

    assert_eq!(
        sim.process_block_data(vec![deposit(2, "2")]),
        Err(SimError::Protocol(ProtocolError::SessionFailed))
    );
}

#[test]
fn state_error_mid_block_abandons_session() {
    let mut sim = Simulator::new(bank(), CollectorListener::new(), config(4, 10)).unwrap();
    sim.initialize().unwrap();

    let withdraw_missing: Packet = ObjectUpdateData::new(
        "bank",
        ObjectUpdate::delete("balances", vec![Value::Bytes(vec![9])]),
    )
    .into();
    let err = sim
        .process_block_data(vec![deposit(1, "10"), withdraw_missing, deposit(2, "20")])
        .unwrap_err();
    assert!(matches!(err, SimError::MissingObject { .. }));
    assert!(!err.is_listener_failure());
    assert_eq!(sim.block_num(), 0);

    assert_eq!(
        sim.process_block_data(vec![deposit(3, "30")]),
        Err(SimError::Protocol(ProtocolError::SessionFailed))
    );
    assert_eq!(sim.listener().updates().len(), 2);
    assert!(sim.listener().committed_heights().is_empty());
}

#[test]
fn rejected_update_mid_block_abandons_session() {
    let mut sim = Simulator::new(bank(), CollectorListener::new(), config(5, 10)).unwrap();
    sim.initialize().unwrap();
    sim.process_block_data(vec![deposit(1, "10")]).unwrap();

    let err = sim
        .process_block_data(vec![deposit(2, "20"), deposit(2, "21")])
        .unwrap_err();
    assert!(matches!(err, SimError::Protocol(ProtocolError::DuplicateKey { .. })));
    assert_eq!(sim.block_num(), 1);

    assert_eq!(
        sim.process_block_data(vec![deposit(3, "30")]),
        Err(SimError::Protocol(ProtocolError::SessionFailed))
    );
    assert_eq!(sim.listener().committed_heights(), [1]);
}

#[test]
fn heights_are_sequential_from_one() {
    let mut sim = Simulator::new(bank(), CollectorListener::new(), config(3, 5)).unwrap();
    sim.initialize().unwrap();
    sim.run_blocks(4).unwrap();

    assert_eq!(sim.block_num(), 4);
    assert_eq!(sim.listener().committed_heights(), [1, 2, 3, 4]);
}

#[test]
fn same_seed_same_stream() {
    let run = |seed| {
        let mut sim =
            Simulator::with_example_schema(CollectorListener::new(), config(seed, 20)).unwrap();
        sim.initialize().unwrap();
        sim.run_blocks(10).unwrap();
        sim.into_listener().packets().to_vec()
    };

    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn committed_updates_rebuild_the_reference_state() {
    init_tracing();
    let mut sim =
        Simulator::with_example_schema(CollectorListener::new(), config(7, 30)).unwrap();
    sim.initialize().unwrap();
    sim.run_blocks(25).unwrap();

    let mut replayed = AppState::new(EXAMPLE_APP_SCHEMA.clone());
    for data in sim.listener().updates() {
        replayed.apply_update(&data.module_name, &data.update).unwrap();
    }
    assert_eq!(&replayed, sim.state());
    assert!(sim.state().object_count() > 0);
}

#[test]
fn generated_updates_survive_binary_encoding() {
    let mut sim =
        Simulator::with_example_schema(CollectorListener::new(), config(11, 40)).unwrap();
    sim.initialize().unwrap();
    sim.run_blocks(15).unwrap();

    for data in sim.listener().updates() {
        let module = &EXAMPLE_APP_SCHEMA[&data.module_name];
        let object_type = module.lookup_object_type(&data.update.type_name).unwrap();

        let key = encode_object_key(object_type, &data.update.key).unwrap();
        assert_eq!(decode_object_key(object_type, &key).unwrap(), data.update.key);

        if !data.update.delete {
            let value = encode_object_value(object_type, &data.update.value).unwrap();
            assert_eq!(decode_object_value(object_type, &value).unwrap(), data.update.value);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn blocks_never_repeat_a_module_key(seed in any::<u64>(), max in 1usize..60) {
        let mut sim =
            Simulator::with_example_schema(CollectorListener::new(), config(seed, max)).unwrap();
        sim.initialize().unwrap();

        for _ in 0..3 {
            let block = sim.block_data().unwrap();
            prop_assert!((1..=max).contains(&block.len()));

            let identities: HashSet<(String, Vec<u8>)> = block
                .iter()
                .filter_map(Packet::as_object_update)
                .map(|d| {
                    let module = &EXAMPLE_APP_SCHEMA[&d.module_name];
                    let object_type = module.lookup_object_type(&d.update.type_name).unwrap();
                    let key = encode_object_key(object_type, &d.update.key).unwrap();
                    (d.module_name.clone(), key)
                })
                .collect();
            prop_assert_eq!(identities.len(), block.len());

            sim.process_block_data(block).unwrap();
        }
    }
}
