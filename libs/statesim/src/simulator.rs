//! Block generation and replay against a listener
//!
//! A [`Simulator`] owns a [`StreamSession`] around the listener under test and
//! an [`AppState`] reference model. Each processed block is delivered to the
//! listener first and applied to the model second, so after every successful
//! block the model holds exactly what a correct listener should hold.

use std::collections::{BTreeMap, HashSet};

use appdata::{InitializationResult, Listener, Packet, StreamCapabilities, StreamSession};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::ModuleSchema;
use tracing::{debug, info, warn};

use crate::config::SimulatorConfig;
use crate::error::{SimError, SimResult};
use crate::example_schema::example_app_schema;
use crate::state::AppState;
use crate::updates::random_update;

/// Packets of one block, without the surrounding start and commit
pub type BlockData = Vec<Packet>;

/// Draws per requested update before rejection sampling gives up
const MAX_DRAWS_PER_UPDATE: usize = 64;

/// Replays generated blocks to a listener and tracks the expected state
#[derive(Debug)]
pub struct Simulator<L: Listener> {
    session: StreamSession<L>,
    state: AppState,
    config: SimulatorConfig,
    rng: StdRng,
    block_num: u64,
}

impl<L: Listener> Simulator<L> {
    pub fn new(
        app_schema: BTreeMap<String, ModuleSchema>,
        listener: L,
        config: SimulatorConfig,
    ) -> SimResult<Self> {
        config.validate()?;
        if app_schema.values().all(ModuleSchema::is_empty) {
            return Err(SimError::EmptySchema);
        }

        info!(
            modules = app_schema.len(),
            seed = config.seed,
            max_updates_per_block = config.max_updates_per_block,
            "Simulator created"
        );
        Ok(Self {
            session: StreamSession::new(listener),
            state: AppState::new(app_schema),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            block_num: 0,
        })
    }

    /// Simulator over the built-in example schema
    pub fn with_example_schema(listener: L, config: SimulatorConfig) -> SimResult<Self> {
        Self::new(example_app_schema(), listener, config)
    }

    /// Send the initialization packet and every module schema in name order
    pub fn initialize(&mut self) -> SimResult<InitializationResult> {
        let result = self.session.initialize(StreamCapabilities {
            has_event_aligned_writes: self.config.event_aligned_writes,
        })?;
        if let Some(height) = result.start_from_block {
            warn!(height, "Listener asked to resume; simulated chains always start at 1");
        }

        for (name, schema) in self.state.module_schemas() {
            self.session.initialize_module(name, schema.clone())?;
        }
        Ok(result)
    }

    /// A block of between 1 and the configured maximum updates
    pub fn block_data(&mut self) -> SimResult<BlockData> {
        self.block_data_n(self.config.max_updates_per_block)
    }

    /// A block of between 1 and `max_updates_per_block` updates
    ///
    /// No two updates share a module and encoded key, the identity the
    /// stream session uses for duplicate detection. Draws are against the
    /// state as of the last processed block, so generate and process blocks
    /// alternately.
    pub fn block_data_n(&mut self, max_updates_per_block: usize) -> SimResult<BlockData> {
        let requested = self.rng.gen_range(1..=max_updates_per_block.max(1));
        let max_draws = requested.saturating_mul(MAX_DRAWS_PER_UPDATE);

        let mut seen: HashSet<(String, Vec<u8>)> = HashSet::with_capacity(requested);
        let mut packets = BlockData::with_capacity(requested);
        let mut draws = 0;
        while packets.len() < requested {
            if draws == max_draws {
                return Err(SimError::KeySpaceExhausted {
                    requested,
                    generated: packets.len(),
                });
            }
            draws += 1;

            let data = random_update(&mut self.rng, &self.state, &self.config)?;
            let key = self.state.encoded_key(&data.module_name, &data.update)?;
            if seen.insert((data.module_name.clone(), key)) {
                packets.push(data.into());
            }
        }

        debug!(updates = packets.len(), draws, "Block generated");
        Ok(packets)
    }

    /// Deliver one block at the next height and mirror it into the state
    ///
    /// Any error after the block has started stops it where it happened: the
    /// listener sees no commit, the block counter does not advance and the
    /// session is abandoned, so every later block fails with
    /// [`appdata::ProtocolError::SessionFailed`]. The listener and the state
    /// both hold part of an uncommitted block at that point.
    pub fn process_block_data(&mut self, data: BlockData) -> SimResult<()> {
        let height = self.block_num + 1;
        self.session.start_block(height)?;

        if let Err(error) = self.stream_block(data) {
            warn!(height, %error, "Block failed before commit");
            self.session.abandon();
            return Err(error);
        }
        self.block_num = height;
        Ok(())
    }

    fn stream_block(&mut self, data: BlockData) -> SimResult<()> {
        for packet in data {
            let update = packet.as_object_update().cloned();
            self.session.send_packet(packet)?;
            if let Some(update) = update {
                self.state.apply_update(&update.module_name, &update.update)?;
            }
        }
        self.session.commit()?;
        Ok(())
    }

    /// Generate and process `blocks` blocks in turn
    pub fn run_blocks(&mut self, blocks: u64) -> SimResult<()> {
        for _ in 0..blocks {
            let data = self.block_data()?;
            self.process_block_data(data)?;
        }
        info!(
            block_num = self.block_num,
            objects = self.state.object_count(),
            "Simulation run complete"
        );
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Height of the last committed block, 0 before the first
    pub fn block_num(&self) -> u64 {
        self.block_num
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn listener(&self) -> &L {
        self.session.listener()
    }

    pub fn into_listener(self) -> L {
        self.session.into_listener()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdata::test_utils::{bank_schema, CollectorListener};
    use appdata::{NoopListener, ProtocolError};

    fn bank() -> BTreeMap<String, ModuleSchema> {
        BTreeMap::from([("bank".to_string(), bank_schema())])
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulatorConfig::default().with_max_updates_per_block(0);
        assert!(matches!(
            Simulator::new(bank(), NoopListener, config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_empty_schema() {
        let result = Simulator::new(BTreeMap::new(), NoopListener, SimulatorConfig::default());
        assert!(matches!(result, Err(SimError::EmptySchema)));
    }

    #[test]
    fn test_initialize_announces_modules() {
        let mut sim =
            Simulator::with_example_schema(CollectorListener::new(), SimulatorConfig::default())
                .unwrap();
        sim.initialize().unwrap();

        let modules: Vec<&str> = sim
            .listener()
            .packets()
            .iter()
            .filter_map(|p| match p {
                Packet::ModuleInitialization(data) => Some(data.module_name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(modules, ["all_kinds", "test_cases"]);
    }

    #[test]
    fn test_blocks_before_initialize_fail() {
        let mut sim = Simulator::new(bank(), NoopListener, SimulatorConfig::default()).unwrap();
        let data = sim.block_data().unwrap();
        assert!(matches!(
            sim.process_block_data(data),
            Err(SimError::Protocol(ProtocolError::InvalidTransition { .. }))
        ));
        assert_eq!(sim.block_num(), 0);
    }

    #[test]
    fn test_block_size_bounds() {
        let mut sim = Simulator::new(bank(), NoopListener, SimulatorConfig::default()).unwrap();
        for _ in 0..50 {
            let data = sim.block_data_n(7).unwrap();
            assert!((1..=7).contains(&data.len()));
        }
    }

    #[test]
    fn test_key_space_exhaustion() {
        let schema = ModuleSchema::new(vec![schema::ObjectType::new(
            "flags",
            vec![schema::Field::new("on", schema::Kind::Bool)],
            vec![],
        )])
        .unwrap();
        let config = SimulatorConfig::default().with_seed(1);
        let mut sim =
            Simulator::new(BTreeMap::from([("m".to_string(), schema)]), NoopListener, config)
                .unwrap();

        let mut exhausted = false;
        for _ in 0..20 {
            match sim.block_data_n(10) {
                Ok(data) => assert!(data.len() <= 2),
                Err(SimError::KeySpaceExhausted { generated, .. }) => {
                    assert_eq!(generated, 2);
                    exhausted = true;
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert!(exhausted);
    }
}
