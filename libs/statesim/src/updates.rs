//! Random object updates drawn against the current reference state

use appdata::ObjectUpdateData;
use rand::seq::IteratorRandom;
use rand::Rng;
use schema::ObjectUpdate;

use crate::config::SimulatorConfig;
use crate::error::{SimError, SimResult};
use crate::generator::random_values;
use crate::state::{AppState, ObjectCollection};

/// Draw one update for a random module and object type
///
/// Existing objects may be deleted or rewritten; otherwise a fresh key is
/// drawn, which can still land on a live object and replace it.
pub fn random_update<R: Rng + ?Sized>(
    rng: &mut R,
    state: &AppState,
    config: &SimulatorConfig,
) -> SimResult<ObjectUpdateData> {
    let (module_name, module) = state
        .modules()
        .filter(|(_, module)| module.collections().next().is_some())
        .choose(rng)
        .ok_or(SimError::EmptySchema)?;
    let collection = module.collections().choose(rng).ok_or(SimError::EmptySchema)?;

    Ok(ObjectUpdateData::new(module_name, random_object_update(rng, collection, config)))
}

fn random_object_update<R: Rng + ?Sized>(
    rng: &mut R,
    collection: &ObjectCollection,
    config: &SimulatorConfig,
) -> ObjectUpdate {
    let object_type = collection.object_type();
    let type_name = object_type.name.clone();

    if !collection.is_empty() && rng.gen_bool(config.delete_probability) {
        if let Some(key) = collection.random_key(rng) {
            return ObjectUpdate::delete(type_name, key.to_vec());
        }
    }

    let key = match collection.random_key(rng) {
        Some(existing) if rng.gen_bool(config.update_existing_probability) => existing.to_vec(),
        _ => random_values(rng, &object_type.key_fields, config),
    };
    let value = random_values(rng, &object_type.value_fields, config);
    ObjectUpdate::set(type_name, key, value)
}
