use std::path::Path;

use distman_metadata::DistInfo;
use distman_version::NameConstraint;
use tracing::instrument;

use crate::error::DistmanError;

/// Installed dists: one entry per `dists/<name>-<version>/dist.info` under
/// `deployment`, in directory-listing order.
#[instrument]
pub fn read_installed(deployment: &Path) -> Result<Vec<DistInfo>, DistmanError> {
    let dists_dir = deployment.join("dists");
    if !dists_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<_> = fs_err::read_dir(&dists_dir)
        .map_err(|e| distman_fs::FsError::io(&dists_dir, e))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut out = Vec::new();
    for entry in entries {
        let info_path = entry.path().join("dist.info");
        if !info_path.is_file() {
            continue;
        }
        let text = fs_err::read_to_string(&info_path)
            .map_err(|e| distman_fs::FsError::io(&info_path, e))?;
        let fields = distman_metadata::parse_dist_info(&text)?;
        out.push(DistInfo::from_raw(&fields)?);
    }
    Ok(out)
}

/// Split a `host_provides` config entry ("name-version", §6) on its last
/// `-` so a versioned `depends` constraint (e.g. `libc>=2.28`) can match the
/// synthesized record. An entry with no `-` is treated as a bare name with
/// no meaningful version.
fn split_name_version(entry: &str) -> (String, String) {
    match entry.rsplit_once('-') {
        Some((name, version)) => (name.to_string(), version.to_string()),
        None => (entry.to_string(), "0".to_string()),
    }
}

/// Installed dists plus synthetic records for every `provides` entry of
/// each, and for every entry in the configured host-provided list (§4.7),
/// each carrying a `provided` back-reference — to the providing dist for
/// the former, to a placeholder "host" record for the latter.
#[instrument(skip(host_provides))]
pub fn get_deployed(
    deployment: &Path,
    host_arch: &str,
    host_type: &str,
    host_provides: &[String],
) -> Result<Vec<DistInfo>, DistmanError> {
    let installed = read_installed(deployment)?;
    let mut out = installed.clone();

    for d in &installed {
        for entry in d.provides.resolve(host_arch, host_type) {
            let Ok(nc) = NameConstraint::parse(&entry) else {
                continue;
            };
            let mut synthetic = DistInfo::new(nc.name, d.version.clone());
            synthetic.arch = d.arch.clone();
            synthetic.kind = d.kind.clone();
            synthetic.provided = Some(Box::new(d.clone()));
            out.push(synthetic);
        }
    }

    if !host_provides.is_empty() {
        let mut host = DistInfo::new("host", "0");
        host.arch = host_arch.to_string();
        host.kind = host_type.to_string();
        for entry in host_provides {
            let (name, version) = split_name_version(entry);
            let mut synthetic = DistInfo::new(name, version);
            synthetic.arch = host_arch.to_string();
            synthetic.kind = host_type.to_string();
            synthetic.provided = Some(Box::new(host.clone()));
            out.push(synthetic);
        }
    }

    Ok(out)
}

/// Installed dists whose name/version satisfy some requested constraint
/// (§4.7 `remove`/`pack`'s matching step).
pub fn match_installed(installed: &[DistInfo], names: &[NameConstraint]) -> Vec<DistInfo> {
    installed
        .iter()
        .filter(|d| {
            names
                .iter()
                .any(|nc| nc.name == d.name && nc.satisfied_by(&d.version))
        })
        .cloned()
        .collect()
}
