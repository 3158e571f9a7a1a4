use indexmap::IndexMap;

use crate::error::MetadataError;
use crate::value::{Table, Value};

/// A constraint list entry: a bare `"<name> [<op> <ver>]…"` string, a flat
/// list of further entries, or a map keyed first by arch then by type,
/// selecting the variant that applies on the host (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintNode {
    Bare(String),
    List(Vec<ConstraintNode>),
    Keyed(IndexMap<String, ConstraintNode>),
}

impl ConstraintNode {
    pub fn empty() -> ConstraintNode {
        ConstraintNode::List(Vec::new())
    }

    pub fn from_value(value: &Value) -> Result<ConstraintNode, MetadataError> {
        match value {
            Value::Str(s) => Ok(ConstraintNode::Bare(s.clone())),
            Value::Num(_) => Err(MetadataError::WrongShape(
                "constraint entry",
                "string or table",
            )),
            Value::Table(t) => {
                if t.map.is_empty() {
                    let items = t
                        .list
                        .iter()
                        .map(ConstraintNode::from_value)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(ConstraintNode::List(items))
                } else if t.list.is_empty() {
                    let map = t
                        .map
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), ConstraintNode::from_value(v)?)))
                        .collect::<Result<IndexMap<_, _>, MetadataError>>()?;
                    Ok(ConstraintNode::Keyed(map))
                } else {
                    // Hybrid table: bare entries alongside arch-keyed overrides
                    // at the same level, e.g. `{ "common", Windows = {...} }`.
                    let mut items = t
                        .list
                        .iter()
                        .map(ConstraintNode::from_value)
                        .collect::<Result<Vec<_>, _>>()?;
                    for (k, v) in &t.map {
                        let mut single = IndexMap::new();
                        single.insert(k.clone(), ConstraintNode::from_value(v)?);
                        items.push(ConstraintNode::Keyed(single));
                    }
                    Ok(ConstraintNode::List(items))
                }
            }
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ConstraintNode::Bare(s) => Value::Str(s.clone()),
            ConstraintNode::List(items) => {
                Value::Table(Table::from_list(items.iter().map(ConstraintNode::to_value).collect()))
            }
            ConstraintNode::Keyed(map) => Value::Table(Table::from_map(
                map.iter().map(|(k, v)| (k.clone(), v.to_value())).collect(),
            )),
        }
    }

    /// Every bare entry reachable from this node, regardless of host
    /// arch/type. Validation needs to check every entry that could ever be
    /// selected, not just the ones that apply on the current host (§4.3).
    pub fn all_bare(&self) -> Vec<&str> {
        match self {
            ConstraintNode::Bare(s) => vec![s.as_str()],
            ConstraintNode::List(items) => items.iter().flat_map(ConstraintNode::all_bare).collect(),
            ConstraintNode::Keyed(map) => map.values().flat_map(ConstraintNode::all_bare).collect(),
        }
    }

    /// Resolve this node against a host arch/type, descending into arch-keyed
    /// then type-keyed tables and flattening everything else into the plain
    /// list of bare constraint strings that applies on this host.
    ///
    /// An arch-keyed map whose arch key does not match the host contributes
    /// nothing: it describes a variant for a different platform, not a
    /// fallback list.
    pub fn resolve(&self, arch: &str, kind: &str) -> Vec<String> {
        match self {
            ConstraintNode::Bare(s) => vec![s.clone()],
            ConstraintNode::List(items) => {
                items.iter().flat_map(|n| n.resolve(arch, kind)).collect()
            }
            ConstraintNode::Keyed(map) => match map.get(arch) {
                Some(ConstraintNode::Keyed(inner)) => match inner.get(kind) {
                    Some(by_type) => by_type.resolve(arch, kind),
                    None => inner.values().flat_map(|n| n.resolve(arch, kind)).collect(),
                },
                Some(other) => other.resolve(arch, kind),
                None => Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_list_resolves_unconditionally() {
        let node = ConstraintNode::List(vec![
            ConstraintNode::Bare("a".to_string()),
            ConstraintNode::Bare("b>=1.0".to_string()),
        ]);
        assert_eq!(node.resolve("Linux", "binary"), vec!["a", "b>=1.0"]);
    }

    #[test]
    fn arch_keyed_entry_only_applies_on_matching_host() {
        let mut windows_types = IndexMap::new();
        windows_types.insert(
            "binary".to_string(),
            ConstraintNode::List(vec![ConstraintNode::Bare("win-only".to_string())]),
        );
        let mut by_arch = IndexMap::new();
        by_arch.insert("Windows".to_string(), ConstraintNode::Keyed(windows_types));
        let node = ConstraintNode::List(vec![
            ConstraintNode::Bare("common".to_string()),
            ConstraintNode::Keyed(by_arch),
        ]);

        assert_eq!(
            node.resolve("Windows", "binary"),
            vec!["common", "win-only"]
        );
        assert_eq!(node.resolve("Linux", "binary"), vec!["common"]);
    }

    #[test]
    fn all_bare_reaches_entries_behind_every_arch_key() {
        let mut windows_types = IndexMap::new();
        windows_types.insert(
            "binary".to_string(),
            ConstraintNode::List(vec![ConstraintNode::Bare("win-only".to_string())]),
        );
        let mut by_arch = IndexMap::new();
        by_arch.insert("Windows".to_string(), ConstraintNode::Keyed(windows_types));
        let node = ConstraintNode::List(vec![
            ConstraintNode::Bare("common".to_string()),
            ConstraintNode::Keyed(by_arch),
        ]);

        let mut all = node.all_bare();
        all.sort_unstable();
        assert_eq!(all, vec!["common", "win-only"]);
    }
}
