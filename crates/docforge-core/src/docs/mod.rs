//! API documentation extraction
//!
//! Key components:
//! - `signature` - doc string to description / parameters / return type
//! - `registry` - statically declared module surfaces
//! - `scanner` - walks a registered module and emits `ApiEntry` records
//! - `entry` - the JSON interchange record

pub mod concept_forge;
pub mod entry;
pub mod registry;
pub mod scanner;
pub mod signature;

pub use entry::{ApiEntry, ParamMap, ANY_TYPE, NO_DESCRIPTION, UNKNOWN_TYPE};
pub use registry::{Attribute, ClassDef, MemberDef, MemberKind, ModuleCatalog, ModuleDef};
pub use scanner::{ApiSurfaceScanner, ScanError, OPERATOR_HOOKS};
pub use signature::{ParsedDoc, SignatureParser};
