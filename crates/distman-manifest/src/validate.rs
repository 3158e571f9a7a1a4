use distman_metadata::DistInfo;
use distman_version::NameConstraint;
use tracing::warn;

use crate::pipeline::{Candidate, Origin};

fn is_valid_arch_or_type(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn constraint_entries_are_valid(info: &DistInfo) -> Result<(), String> {
    for (label, node) in [
        ("depends", &info.depends),
        ("conflicts", &info.conflicts),
        ("provides", &info.provides),
    ] {
        for entry in node.all_bare() {
            NameConstraint::parse(entry)
                .map_err(|e| format!("{label} entry `{entry}`: {e}"))?;
        }
    }
    Ok(())
}

/// Apply defaults, enforce the character-class rules of §3, and recursively
/// validate every constraint entry. Returns `None` if the candidate fails
/// any check; the caller logs the drop and keeps going rather than aborting
/// the whole pipeline (§4.3).
pub fn validate_and_place(candidate: Candidate) -> Option<DistInfo> {
    let Candidate { fields, origin } = candidate;

    let mut info = match DistInfo::from_raw(&fields) {
        Ok(info) => info,
        Err(e) => {
            warn!(error = %e, "dropping candidate: malformed dist.info");
            return None;
        }
    };

    if let Err(e) = distman_version::validate_name(&info.name) {
        warn!(error = %e, "dropping candidate: invalid name");
        return None;
    }
    if let Err(e) = distman_version::validate_version(&info.version) {
        warn!(error = %e, "dropping candidate: invalid version");
        return None;
    }
    if !is_valid_arch_or_type(&info.arch) {
        warn!(name = %info.name, arch = %info.arch, "dropping candidate: invalid arch");
        return None;
    }
    if !is_valid_arch_or_type(&info.kind) {
        warn!(name = %info.name, kind = %info.kind, "dropping candidate: invalid type");
        return None;
    }
    if let Err(reason) = constraint_entries_are_valid(&info) {
        warn!(name = %info.name, %reason, "dropping candidate: malformed constraint entry");
        return None;
    }

    match origin {
        Origin::LocalDir(dir) => info.path = Some(dir.to_string_lossy().into_owned()),
        Origin::LocalArchive(archive) => info.path = Some(archive.to_string_lossy().into_owned()),
        Origin::Remote(_) => {}
    }

    Some(info)
}
