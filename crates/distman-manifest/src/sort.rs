use distman_metadata::{DistInfo, DEFAULT_ARCH, DEFAULT_TYPE};

/// The ordering rule of §3: name ascending, then version descending, then
/// arch with `Universal` preferred last among ties, then type with `source`
/// preferred last among ties. `sort_by` is a stable sort, so entries already
/// tied on all four keys keep their original relative order — which is how
/// the first repository wins ties when manifests are concatenated in input
/// order (§4.3, "Composition").
pub fn sort_manifest(items: &mut [DistInfo]) {
    items.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| distman_version::compare(&b.version, &a.version))
            .then_with(|| (a.arch == DEFAULT_ARCH).cmp(&(b.arch == DEFAULT_ARCH)))
            .then_with(|| (a.kind == DEFAULT_TYPE).cmp(&(b.kind == DEFAULT_TYPE)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, version: &str, arch: &str, kind: &str) -> DistInfo {
        let mut d = DistInfo::new(name, version);
        d.arch = arch.to_string();
        d.kind = kind.to_string();
        d
    }

    #[test]
    fn sorts_by_name_then_version_descending() {
        let mut items = vec![
            info("widget", "1.0", "Universal", "source"),
            info("widget", "2.0", "Universal", "source"),
            info("acme", "1.0", "Universal", "source"),
        ];
        sort_manifest(&mut items);
        let names_versions: Vec<(&str, &str)> = items
            .iter()
            .map(|d| (d.name.as_str(), d.version.as_str()))
            .collect();
        assert_eq!(
            names_versions,
            vec![("acme", "1.0"), ("widget", "2.0"), ("widget", "1.0")]
        );
    }

    #[test]
    fn prefers_concrete_arch_and_binary_type_among_ties() {
        let mut items = vec![
            info("widget", "1.0", "Universal", "source"),
            info("widget", "1.0", "Linux", "source"),
            info("widget", "1.0", "Linux", "binary"),
        ];
        sort_manifest(&mut items);
        let arches_kinds: Vec<(&str, &str)> = items
            .iter()
            .map(|d| (d.arch.as_str(), d.kind.as_str()))
            .collect();
        assert_eq!(
            arches_kinds,
            vec![("Linux", "binary"), ("Linux", "source"), ("Universal", "source")]
        );
    }

    #[test]
    fn sort_is_idempotent() {
        let mut items = vec![
            info("widget", "2.0", "Linux", "binary"),
            info("widget", "1.0", "Universal", "source"),
            info("acme", "3.0", "Linux", "source"),
            info("acme", "3.0", "Universal", "binary"),
        ];
        sort_manifest(&mut items);
        let once = items.clone();
        sort_manifest(&mut items);
        assert_eq!(items, once);
    }

    #[test]
    fn stable_sort_preserves_input_order_among_full_ties() {
        let a = info("widget", "1.0", "Universal", "source");
        let b = info("widget", "1.0", "Universal", "source");
        let mut items = vec![a.clone(), b.clone()];
        sort_manifest(&mut items);
        // Both entries are identical, so this just confirms the sort doesn't panic
        // or reorder; real tie-break coverage lives at the pipeline composition level.
        assert_eq!(items.len(), 2);
    }
}
