use std::path::{Path, PathBuf};

use distman_fetch::FetchClient;
use distman_fs::ArchiveDriver;
use distman_metadata::{parse_dist_info, parse_manifest, Value};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ManifestError;
use crate::locator::Locator;

const ARCHIVE_SUFFIXES: &[&str] = &[".zip", ".dist"];

/// Where a candidate's `path` should ultimately point, carried alongside the
/// raw parsed fields until validation rewrites it (§4.3's "Sorting"
/// paragraph).
#[derive(Debug, Clone)]
pub enum Origin {
    LocalDir(PathBuf),
    LocalArchive(PathBuf),
    Remote(Url),
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub fields: IndexMap<String, Value>,
    pub origin: Origin,
}

#[instrument(skip(fetch, archiver))]
pub fn acquire(
    locator: &Locator,
    fetch: &FetchClient,
    archiver: &dyn ArchiveDriver,
) -> Result<Vec<Candidate>, ManifestError> {
    match locator {
        Locator::Local(path) => acquire_local(path, archiver),
        Locator::Http(url) => acquire_remote(url, fetch),
    }
}

fn acquire_local(root: &Path, archiver: &dyn ArchiveDriver) -> Result<Vec<Candidate>, ManifestError> {
    let dist_info_path = root.join("dist.info");
    if dist_info_path.is_file() {
        let text = fs_err::read_to_string(&dist_info_path)
            .map_err(|e| distman_fs::FsError::io(&dist_info_path, e))?;
        let fields = parse_dist_info(&text)?;
        return Ok(vec![Candidate {
            fields,
            origin: Origin::LocalDir(root.to_path_buf()),
        }]);
    }

    if root.is_dir() {
        let mut out = Vec::new();
        walk_dir(root, archiver, &mut out)?;
        return Ok(out);
    }

    warn!(path = %root.display(), "local locator is neither a dist directory nor a directory");
    Ok(Vec::new())
}

fn walk_dir(
    dir: &Path,
    archiver: &dyn ArchiveDriver,
    out: &mut Vec<Candidate>,
) -> Result<(), ManifestError> {
    let entries = match fs_err::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return Err(distman_fs::FsError::io(dir, e).into()),
    };

    for entry in entries {
        let entry = entry.map_err(|e| distman_fs::FsError::io(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            let candidate_info = path.join("dist.info");
            if candidate_info.is_file() {
                let text = fs_err::read_to_string(&candidate_info)
                    .map_err(|e| distman_fs::FsError::io(&candidate_info, e))?;
                match parse_dist_info(&text) {
                    Ok(fields) => out.push(Candidate {
                        fields,
                        origin: Origin::LocalDir(path.clone()),
                    }),
                    Err(e) => warn!(path = %candidate_info.display(), error = %e, "dropping unparseable dist.info"),
                }
            } else {
                walk_dir(&path, archiver, out)?;
            }
            continue;
        }

        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            match archiver.find_member(&path, "dist.info") {
                Ok(Some(member)) => match archiver.read_member(&path, &member) {
                    Ok(text) => match parse_dist_info(&text) {
                        Ok(fields) => out.push(Candidate {
                            fields,
                            origin: Origin::LocalArchive(path.clone()),
                        }),
                        Err(e) => warn!(path = %path.display(), error = %e, "dropping unparseable archived dist.info"),
                    },
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to read archived dist.info"),
                },
                Ok(None) => debug!(path = %path.display(), "archive has no dist.info member"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to probe archive"),
            }
        }
    }

    Ok(())
}

fn acquire_remote(locator: &Url, fetch: &FetchClient) -> Result<Vec<Candidate>, ManifestError> {
    let manifest_url = format!("{}/dist.manifest", locator.as_str().trim_end_matches('/'));
    let bytes = fetch.get(&manifest_url)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let entries = parse_manifest(&text)?;
    Ok(entries
        .into_iter()
        .map(|fields| Candidate {
            fields,
            origin: Origin::Remote(locator.clone()),
        })
        .collect())
}
