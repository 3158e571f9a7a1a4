//! Recursive backtracking dependency resolution over an ordered manifest
//! (§2, §4.4). Candidate preference is entirely a function of manifest
//! order, which the manifest pipeline has already sorted; this crate never
//! re-ranks candidates itself.

mod error;

use distman_metadata::DistInfo;
use distman_version::NameConstraint;
use tracing::{instrument, trace};

pub use error::ResolutionError;

fn label(d: &DistInfo) -> String {
    format!("{}-{}", d.name, d.version)
}

/// Parse every entry `node.resolve(arch, kind)` yields into a
/// `NameConstraint`, silently skipping entries that fail to parse — the
/// manifest pipeline already rejected malformed constraints before a dist
/// ever reaches the resolver, so this is a defensive no-op in practice.
fn resolved_constraints(
    node: &distman_metadata::ConstraintNode,
    arch: &str,
    kind: &str,
) -> Vec<NameConstraint> {
    node.resolve(arch, kind)
        .iter()
        .filter_map(|entry| NameConstraint::parse(entry).ok())
        .collect()
}

/// Whether `d` could ever be deployed on this host: arch must be
/// `Universal` or the host arch, and type must be the host type, `all`, or
/// `source` (a source dist is always buildable locally). This mirrors the
/// rejection check deploy performs in §4.5 step 3, applied here so the
/// resolver never selects a dist deploy would reject outright — matching
/// the "Arch filter" scenario in §8, which expects resolution itself to
/// fail with "no suitable" rather than deploy failing afterward.
fn host_compatible(d: &DistInfo, arch: &str, kind: &str) -> bool {
    (d.arch == distman_metadata::DEFAULT_ARCH || d.arch == arch)
        && (d.kind == kind || d.kind == "all" || d.kind == "source")
}

/// Candidates for `requirement`, in manifest order (already preference
/// order: higher version, concrete arch, binary type come first per §3),
/// filtered to dists that are deployable on this host.
fn candidates<'m>(
    requirement: &NameConstraint,
    manifest: &'m [DistInfo],
    arch: &str,
    kind: &str,
) -> Vec<&'m DistInfo> {
    manifest
        .iter()
        .filter(|d| d.name == requirement.name && requirement.satisfied_by(&d.version))
        .filter(|d| host_compatible(d, arch, kind))
        .collect()
}

/// Conflict/consistency checks between a newly chosen candidate `c` and each
/// dist `p` already in the accumulator (§4.4 step 2). Returns `Ok(true)` if
/// `c` is redundant with an already-accepted `p` of the same version (the
/// caller should not append `c` again), `Ok(false)` if `c` is clear to
/// append, or an error naming the blocking pair.
fn check_consistency(
    c: &DistInfo,
    acc: &[DistInfo],
    arch: &str,
    kind: &str,
) -> Result<bool, ResolutionError> {
    for p in acc {
        if p.name == c.name {
            if distman_version::version_eq(&p.version, &c.version) {
                return Ok(true);
            }
            return Err(ResolutionError::Blocked {
                blocked: label(c),
                blocker: label(p),
            });
        }

        for nc in resolved_constraints(&p.depends, arch, kind) {
            if nc.name == c.name && !nc.satisfied_by(&c.version) {
                return Err(ResolutionError::Blocked {
                    blocked: label(c),
                    blocker: label(p),
                });
            }
        }

        for nc in resolved_constraints(&p.conflicts, arch, kind) {
            if nc.name == c.name && nc.satisfied_by(&c.version) {
                return Err(ResolutionError::Blocked {
                    blocked: label(c),
                    blocker: label(p),
                });
            }
        }
    }

    for p in acc {
        for nc in resolved_constraints(&c.conflicts, arch, kind) {
            if nc.name == p.name && nc.satisfied_by(&p.version) {
                return Err(ResolutionError::Blocked {
                    blocked: label(p),
                    blocker: label(c),
                });
            }
        }
    }

    Ok(false)
}

fn resolve_rec(
    pending: &[NameConstraint],
    manifest: &[DistInfo],
    arch: &str,
    kind: &str,
) -> Result<Vec<DistInfo>, ResolutionError> {
    let Some((r, rest)) = pending.split_first() else {
        return Ok(Vec::new());
    };

    let mut last_err = ResolutionError::NoCandidate(r.name.clone());
    for c in candidates(r, manifest, arch, kind) {
        trace!(name = %c.name, version = %c.version, "trying candidate");

        let mut new_pending = resolved_constraints(&c.depends, arch, kind);
        new_pending.extend(rest.iter().cloned());

        // A provides-satisfies-depends cycle can't actually loop here: a
        // synthetic provided record never carries its own `provides` (only
        // `name`/`version`/`provided`), so augmenting from one is always a
        // terminal step, never a new source of cycles (Open Question (f)).
        let mut augmented: Vec<DistInfo> = Vec::new();
        for entry in c.provides.resolve(arch, kind) {
            let Ok(nc) = NameConstraint::parse(&entry) else {
                continue;
            };
            let mut synthetic = DistInfo::new(nc.name, c.version.clone());
            synthetic.arch = c.arch.clone();
            synthetic.kind = c.kind.clone();
            synthetic.provided = Some(Box::new(c.clone()));
            augmented.push(synthetic);
        }
        augmented.extend(manifest.iter().cloned());

        match resolve_rec(&new_pending, &augmented, arch, kind) {
            Ok(mut acc) => {
                if let Some(provided) = &c.provided {
                    acc.push((**provided).clone());
                    return Ok(acc);
                }
                match check_consistency(c, &acc, arch, kind) {
                    Ok(true) => return Ok(acc),
                    Ok(false) => {
                        acc.push(c.clone());
                        return Ok(acc);
                    }
                    Err(e) => {
                        last_err = e;
                    }
                }
            }
            Err(e) => {
                last_err = e;
            }
        }
    }

    Err(last_err)
}

/// `resolve(requirements, manifest)` per §4.4: produce an ordered install
/// list such that every requirement is satisfied, every dependency is
/// satisfied by some other element, and no two elements conflict.
#[instrument(skip(manifest))]
pub fn resolve(
    requirements: &[NameConstraint],
    manifest: &[DistInfo],
    host_arch: &str,
    host_type: &str,
) -> Result<Vec<DistInfo>, ResolutionError> {
    resolve_rec(requirements, manifest, host_arch, host_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distman_metadata::ConstraintNode;

    fn dist(name: &str, version: &str) -> DistInfo {
        DistInfo::new(name, version)
    }

    fn with_depends(mut d: DistInfo, entries: &[&str]) -> DistInfo {
        d.depends = ConstraintNode::List(
            entries
                .iter()
                .map(|s| ConstraintNode::Bare(s.to_string()))
                .collect(),
        );
        d
    }

    fn with_provides(mut d: DistInfo, entries: &[&str]) -> DistInfo {
        d.provides = ConstraintNode::List(
            entries
                .iter()
                .map(|s| ConstraintNode::Bare(s.to_string()))
                .collect(),
        );
        d
    }

    fn with_conflicts(mut d: DistInfo, entries: &[&str]) -> DistInfo {
        d.conflicts = ConstraintNode::List(
            entries
                .iter()
                .map(|s| ConstraintNode::Bare(s.to_string()))
                .collect(),
        );
        d
    }

    fn req(s: &str) -> NameConstraint {
        NameConstraint::parse(s).unwrap()
    }

    #[test]
    fn linear_chain_resolves_dependencies_before_dependents() {
        let manifest = vec![
            with_depends(dist("a", "1.0"), &["b"]),
            with_depends(dist("b", "1.0"), &["c"]),
            dist("c", "1.0"),
        ];
        let result = resolve(&[req("a")], &manifest, "Universal", "source").unwrap();
        let names: Vec<&str> = result.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn version_preference_respects_constraint() {
        let manifest = vec![dist("lib", "2.0"), dist("lib", "1.0")];
        let result = resolve(&[req("lib<2")], &manifest, "Universal", "source").unwrap();
        assert_eq!(result[0].version, "1.0");

        let result = resolve(&[req("lib")], &manifest, "Universal", "source").unwrap();
        assert_eq!(result[0].version, "2.0");
    }

    #[test]
    fn provides_satisfies_dependency_without_standalone_candidate() {
        // A provides entry is parsed as a plain `NameConstraint`, so only its
        // `name` is used to synthesize a record (the synthesized version is
        // always the providing dist's own version, never a version embedded
        // in the entry) — so the entry naming the virtual package is the
        // bare name "widget", not "widget-1.0" (which the shared name
        // character class would otherwise accept as one literal name).
        let manifest = vec![
            with_provides(dist("bundle", "1.0"), &["widget"]),
            with_depends(dist("app", "1.0"), &["widget"]),
        ];
        let result = resolve(
            &[req("app"), req("bundle")],
            &manifest,
            "Universal",
            "source",
        )
        .unwrap();
        let names: Vec<&str> = result.iter().map(|d| d.name.as_str()).collect();
        assert!(names.contains(&"bundle"));
        assert!(names.contains(&"app"));
        // "widget" only ever appears as a synthetic back-reference, never a
        // standalone resolved dist, since no standalone "widget" exists in
        // the manifest.
        let widget_entries: Vec<&DistInfo> = result.iter().filter(|d| d.name == "widget").collect();
        assert!(widget_entries.iter().all(|d| d.provided.is_some()));
    }

    #[test]
    fn conflicting_dists_fail_naming_both() {
        let manifest = vec![with_conflicts(dist("a", "1.0"), &["b"]), dist("b", "1.0")];
        let err = resolve(&[req("a"), req("b")], &manifest, "Universal", "source").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a-1.0"));
        assert!(message.contains("b-1.0"));
    }

    #[test]
    fn arch_filtered_candidates_yield_no_suitable() {
        let mut linux_binary = dist("x", "1.0");
        linux_binary.arch = "Linux".to_string();
        linux_binary.kind = "binary".to_string();
        let manifest = vec![linux_binary];

        let err = resolve(&[req("x")], &manifest, "Windows", "binary").unwrap_err();
        assert!(matches!(err, ResolutionError::NoCandidate(_)));
    }

    #[test]
    fn dist_depending_on_its_own_provided_name_resolves_without_looping() {
        // "w" provides "a" and also depends on "a" — the only candidate for
        // "a" is w's own synthetic record, which is terminal (no further
        // provides/depends of its own), so this can't recurse forever.
        let manifest = vec![with_depends(
            with_provides(dist("w", "1.0"), &["a"]),
            &["a"],
        )];
        let result = resolve(&[req("w")], &manifest, "Universal", "source").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "w");
    }
}
