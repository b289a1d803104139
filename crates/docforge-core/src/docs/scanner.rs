//! API surface scanning over registered modules

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use super::entry::ApiEntry;
use super::registry::{Attribute, ClassDef, MemberDef, ModuleCatalog, ModuleDef};
use super::signature::SignatureParser;

/// Private members that are still documented because classes express
/// behavior through them
pub const OPERATOR_HOOKS: [&str; 4] = ["__add__", "__sub__", "__mul__", "__repr__"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("module '{0}' is not registered")]
    ModuleNotFound(String),
}

/// Produces [`ApiEntry`] records for every documented public member of a module
pub struct ApiSurfaceScanner<'a> {
    catalog: &'a ModuleCatalog,
}

impl<'a> ApiSurfaceScanner<'a> {
    pub fn new(catalog: &'a ModuleCatalog) -> Self {
        Self { catalog }
    }

    /// Scan a module by identifier
    pub fn scan(&self, module_name: &str) -> Result<Vec<ApiEntry>, ScanError> {
        let module = self
            .catalog
            .get(module_name)
            .ok_or_else(|| ScanError::ModuleNotFound(module_name.to_string()))?;

        let mut entries = Vec::new();

        for attr in module.attributes() {
            if is_private(attr.name()) {
                continue;
            }
            let Attribute::Class(class) = attr else {
                continue;
            };

            for member in resolve_members(module, class) {
                if let Some(entry) = document_member(class, member) {
                    push_entry(&mut entries, entry);
                }
            }
        }

        info!("Scanned module '{}': {} entries", module_name, entries.len());
        Ok(entries)
    }
}

fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

fn document_member(class: &ClassDef, member: &MemberDef) -> Option<ApiEntry> {
    if is_private(&member.name) && !OPERATOR_HOOKS.contains(&member.name.as_str()) {
        return None;
    }
    if !member.kind.is_callable() {
        return None;
    }

    let doc = member.doc.as_deref().filter(|doc| !doc.trim().is_empty())?;
    let parsed = SignatureParser::parse(Some(doc));
    if !parsed.has_description() {
        debug!("Skipping {}.{}: no description", class.name, member.name);
        return None;
    }

    Some(ApiEntry {
        qualified_name: format!("{}.{}", class.name, member.name),
        description: parsed.description,
        parameters: parsed.parameters,
        return_type: parsed.return_type,
    })
}

/// Same qualified name replaces the earlier entry in place
fn push_entry(entries: &mut Vec<ApiEntry>, entry: ApiEntry) {
    match entries
        .iter_mut()
        .find(|e| e.qualified_name == entry.qualified_name)
    {
        Some(slot) => *slot = entry,
        None => entries.push(entry),
    }
}

/// Own members followed by inherited ones; own declarations shadow bases
fn resolve_members<'m>(module: &'m ModuleDef, class: &'m ClassDef) -> Vec<&'m MemberDef> {
    let mut members = Vec::new();
    let mut seen_names = HashSet::new();
    let mut visited = HashSet::new();
    collect_members(module, class, &mut members, &mut seen_names, &mut visited);
    members
}

fn collect_members<'m>(
    module: &'m ModuleDef,
    class: &'m ClassDef,
    members: &mut Vec<&'m MemberDef>,
    seen_names: &mut HashSet<&'m str>,
    visited: &mut HashSet<&'m str>,
) {
    if !visited.insert(class.name.as_str()) {
        return;
    }

    for member in &class.members {
        if seen_names.insert(member.name.as_str()) {
            members.push(member);
        }
    }

    for base in &class.bases {
        match module.find_class(base) {
            Some(base_class) => collect_members(module, base_class, members, seen_names, visited),
            None => debug!(
                "Base '{}' of '{}' is not declared in '{}'",
                base, class.name, module.name
            ),
        }
    }
}
