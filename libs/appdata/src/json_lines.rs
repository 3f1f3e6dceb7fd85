//! Listener writing each packet as one line of JSON
//!
//! Object updates are rendered with [`codec::JsonCodec`] against the schema
//! announced for their module, so the output uses the canonical JSON form of
//! every field. The writer is flushed on every commit.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Write;

use codec::JsonCodec;
use schema::ModuleSchema;
use serde_json::{json, Value as JsonValue};

use crate::error::{ListenerError, ListenerResult};
use crate::listener::Listener;
use crate::packet::{
    Commit, InitializationResult, ModuleInitialization, ObjectUpdateData, StartBlock,
    StreamCapabilities,
};

#[derive(Debug)]
pub struct JsonLinesListener<W: Write + Send + Debug> {
    writer: W,
    codec: JsonCodec,
    modules: HashMap<String, ModuleSchema>,
}

impl<W: Write + Send + Debug> JsonLinesListener<W> {
    pub fn new(writer: W) -> Self {
        Self::with_codec(writer, JsonCodec::new())
    }

    /// Use a codec with a custom address renderer
    pub fn with_codec(writer: W, codec: JsonCodec) -> Self {
        Self {
            writer,
            codec,
            modules: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &JsonValue) -> ListenerResult<()> {
        serde_json::to_writer(&mut self.writer, line)
            .map_err(|e| ListenerError::Io(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write + Send + Debug> Listener for JsonLinesListener<W> {
    fn initialize(
        &mut self,
        capabilities: &StreamCapabilities,
    ) -> ListenerResult<InitializationResult> {
        self.write_line(&json!({
            "packet": "initialize",
            "event_aligned_writes": capabilities.has_event_aligned_writes,
        }))?;
        Ok(InitializationResult::default())
    }

    fn initialize_module_data(&mut self, data: &ModuleInitialization) -> ListenerResult<()> {
        let object_types: Vec<&str> = data.schema.object_types().map(|t| t.name.as_str()).collect();
        self.write_line(&json!({
            "packet": "initialize_module",
            "module": data.module_name,
            "object_types": object_types,
        }))?;
        self.modules
            .insert(data.module_name.clone(), data.schema.clone());
        Ok(())
    }

    fn start_block(&mut self, data: &StartBlock) -> ListenerResult<()> {
        self.write_line(&json!({"packet": "start_block", "height": data.height}))
    }

    fn on_object_update(&mut self, data: &ObjectUpdateData) -> ListenerResult<()> {
        let object_type = self
            .modules
            .get(&data.module_name)
            .and_then(|schema| schema.lookup_object_type(&data.update.type_name))
            .ok_or_else(|| {
                ListenerError::rejected(format!(
                    "no schema for {}.{}",
                    data.module_name, data.update.type_name
                ))
            })?;
        let update = self.codec.encode_object_update(object_type, &data.update)?;
        self.write_line(&json!({
            "packet": "object_update",
            "module": data.module_name,
            "update": update,
        }))
    }

    fn commit(&mut self, _data: &Commit) -> ListenerResult<()> {
        self.write_line(&json!({"packet": "commit"}))?;
        self.writer.flush()?;
        Ok(())
    }
}
