//! # Schema - Kinds, Values and Object Definitions
//!
//! ## Purpose
//!
//! Pure data layer for schema-described application state:
//! - **Kind registry**: the fixed set of value kinds, their identifiers and
//!   canonical names
//! - **Native values**: the closed [`Value`] representation every codec works on
//! - **Validation**: structural (native form) and deep (format) checks per kind
//! - **Schema model**: fields, enum types, object types and module schemas
//! - **Object updates**: the unit of change streamed to listeners
//!
//! ## Architecture Role
//!
//! ```text
//! libs/schema → libs/codec → libs/appdata → libs/statesim
//!     ↑             ↓             ↓               ↓
//!  Kinds        Encodings     Packets        Simulation
//!  Values       JSON / key    Listener       Reference state
//!  Schemas      value bytes   Sessions       Generators
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Encodings (belong in `codec`)
//! - Event delivery (belongs in `appdata`)

pub mod enum_type;
pub mod error;
pub mod field;
pub mod format;
pub mod kind;
pub mod module_schema;
pub mod object_type;
pub mod object_update;
pub mod validation;
pub mod value;

pub use enum_type::{EnumType, EnumValueDefinition};
pub use error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
pub use field::Field;
pub use format::{is_decimal, is_integer, is_valid_name, DECIMAL_FORMAT, INTEGER_FORMAT, NAME_FORMAT};
pub use kind::{Kind, MAX_ADDRESS_LENGTH, MAX_VALID_KIND};
pub use module_schema::ModuleSchema;
pub use object_type::ObjectType;
pub use object_update::ObjectUpdate;
pub use value::Value;

// Time types used by the native representation
pub use chrono::{DateTime, TimeDelta, Utc};
