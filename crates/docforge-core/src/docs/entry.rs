//! Structured API documentation records

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Description used when a doc string carries no prose
pub const NO_DESCRIPTION: &str = "No description";
/// Return type used when the signature line declares none
pub const UNKNOWN_TYPE: &str = "Unknown";
/// Type recorded for parameters without an annotation
pub const ANY_TYPE: &str = "Any";

/// Parameter name to type string, kept in declaration order.
/// Inserting a repeated name keeps its position and takes the new type.
pub type ParamMap = IndexMap<String, String>;

/// One documented callable, in the JSON shape exchanged between the
/// scanner and the corpus builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntry {
    /// `<TypeName>.<memberName>`
    #[serde(rename = "function")]
    pub qualified_name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: ParamMap,
    #[serde(rename = "returns", default = "default_returns")]
    pub return_type: String,
}

fn default_returns() -> String {
    "None".to_string()
}

impl ApiEntry {
    /// Member part of the qualified name (`add_cube` for `ConceptForge.add_cube`)
    pub fn member_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(_, member)| member)
            .unwrap_or(&self.qualified_name)
    }
}
