//! Acquisition, validation, and ordering of dist metadata from heterogeneous
//! sources into a single comparable manifest (§2, §4.3).

mod error;
mod locator;
mod pipeline;
mod sort;
mod validate;

use distman_fetch::FetchClient;
use distman_fs::ArchiveDriver;
use distman_metadata::DistInfo;
use tracing::instrument;

pub use error::ManifestError;
pub use locator::Locator;
pub use pipeline::{acquire, Candidate, Origin};
pub use sort::sort_manifest;
pub use validate::validate_and_place;

/// Acquire, validate, and order dists from every locator, in input order.
/// Invalid candidates are dropped (logged, not fatal); the manifests from
/// each locator are concatenated before the single stable sort so that ties
/// resolve in favor of whichever locator was listed first.
#[instrument(skip(fetch, archiver))]
pub fn build_manifest(
    locators: &[Locator],
    fetch: &FetchClient,
    archiver: &dyn ArchiveDriver,
) -> Result<Vec<DistInfo>, ManifestError> {
    let mut out = Vec::new();
    for locator in locators {
        for candidate in acquire(locator, fetch, archiver)? {
            if let Some(info) = validate_and_place(candidate) {
                out.push(info);
            }
        }
    }
    sort_manifest(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distman_fs::ZipArchiveDriver;
    use tempfile::tempdir;

    #[test]
    fn builds_manifest_from_local_directory_of_dists() {
        let root = tempdir().unwrap();
        fs_err::create_dir_all(root.path().join("widget-1.0")).unwrap();
        fs_err::write(
            root.path().join("widget-1.0/dist.info"),
            b"name = \"widget\"\nversion = \"1.0\"\n",
        )
        .unwrap();
        fs_err::create_dir_all(root.path().join("widget-2.0")).unwrap();
        fs_err::write(
            root.path().join("widget-2.0/dist.info"),
            b"name = \"widget\"\nversion = \"2.0\"\n",
        )
        .unwrap();

        let locators = vec![Locator::parse(root.path().to_str().unwrap())];
        let fetch = FetchClient::builder()
            .cache_root(root.path().join("cache"))
            .build()
            .unwrap();
        let archiver = ZipArchiveDriver;

        let manifest = build_manifest(&locators, &fetch, &archiver).unwrap();
        assert_eq!(manifest.len(), 2);
        // version-descending: 2.0 before 1.0
        assert_eq!(manifest[0].version, "2.0");
        assert_eq!(manifest[1].version, "1.0");
    }

    #[test]
    fn single_unpacked_dist_locator_yields_one_entry() {
        let root = tempdir().unwrap();
        fs_err::write(
            root.path().join("dist.info"),
            b"name = \"widget\"\nversion = \"1.0\"\n",
        )
        .unwrap();

        let locators = vec![Locator::parse(root.path().to_str().unwrap())];
        let fetch = FetchClient::builder()
            .cache_root(root.path().join("cache"))
            .build()
            .unwrap();
        let archiver = ZipArchiveDriver;

        let manifest = build_manifest(&locators, &fetch, &archiver).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].path.as_deref(), Some(root.path().to_str().unwrap()));
    }
}
