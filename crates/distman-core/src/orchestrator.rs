use std::path::{Path, PathBuf};

use distman_fetch::{FetchClient, FetchClientBuilder};
use distman_fs::{host_platform, ArchiveDriver, Platform, ZipArchiveDriver};
use distman_manifest::{build_manifest, Locator};
use distman_metadata::DistInfo;
use distman_version::NameConstraint;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::instrument;

use crate::config::Config;
use crate::deployed::{get_deployed, match_installed, read_installed};
use crate::error::DistmanError;

/// `install`'s failure carries what it managed to deploy before aborting —
/// §4.7 calls for "the partial success indicator and an error message", not
/// a rollback.
#[derive(Debug, Error)]
#[error("install aborted after deploying {} dist(s): {source}", .deployed.len())]
pub struct InstallError {
    pub deployed: Vec<DistInfo>,
    #[source]
    pub source: DistmanError,
}

/// Public operations composing the manifest pipeline, resolver, and package
/// operations (§4.7). Single-threaded and synchronous throughout (§5); no
/// method here suspends or spawns.
pub struct Orchestrator {
    config: Config,
    fetch: FetchClient,
    archiver: Box<dyn ArchiveDriver>,
    platform: Box<dyn Platform>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Result<Orchestrator, DistmanError> {
        let fetch = FetchClientBuilder::new()
            .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
            .verify_tls(config.verify_tls)
            .cache_ttl(config.cache_ttl_secs.map(std::time::Duration::from_secs))
            .proxy(
                config
                    .proxy
                    .as_deref()
                    .and_then(|p| url::Url::parse(p).ok()),
            )
            .build()?;
        Ok(Orchestrator {
            config,
            fetch,
            archiver: Box::new(ZipArchiveDriver),
            platform: host_platform(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Acquire, validate, and order dists from every locator (§4.3).
    #[instrument(skip(self, locators))]
    pub fn acquire_manifest(&self, locators: &[Locator]) -> Result<Vec<DistInfo>, DistmanError> {
        Ok(build_manifest(locators, &self.fetch, self.archiver.as_ref())?)
    }

    /// `install(names, deployment, manifest, variables)` (§4.7): resolve
    /// `names` against `manifest` with already-deployed dists prepended,
    /// then deploy each selected dist in resolver order, aborting on the
    /// first failure with no rollback.
    #[instrument(skip(self, manifest, variables))]
    pub fn install(
        &self,
        names: &[NameConstraint],
        deployment: &Path,
        manifest: &[DistInfo],
        variables: &IndexMap<String, String>,
    ) -> Result<Vec<DistInfo>, InstallError> {
        self.install_inner(names, deployment, manifest, variables)
            .map_err(|(deployed, source)| InstallError { deployed, source })
    }

    fn install_inner(
        &self,
        names: &[NameConstraint],
        deployment: &Path,
        manifest: &[DistInfo],
        variables: &IndexMap<String, String>,
    ) -> Result<Vec<DistInfo>, (Vec<DistInfo>, DistmanError)> {
        let already_deployed =
            read_installed(deployment).map_err(|e| (Vec::new(), e))?;
        let mut augmented = already_deployed.clone();
        augmented.extend(manifest.iter().cloned());

        let selected = distman_resolver::resolve(
            names,
            &augmented,
            &self.config.host_arch,
            &self.config.host_type,
        )
        .map_err(|e| (Vec::new(), DistmanError::from(e)))?;

        let deployed_keys: std::collections::HashSet<(String, String)> = already_deployed
            .iter()
            .map(|d| (d.name.clone(), d.version.clone()))
            .collect();

        let build_driver = self.config.build_driver();
        let mut done = Vec::new();
        fs_err::create_dir_all(&self.config.temp_root).map_err(|e| {
            (
                done.clone(),
                DistmanError::from(distman_fs::FsError::io(&self.config.temp_root, e)),
            )
        })?;
        let scratch = tempfile::TempDir::new_in(&self.config.temp_root).map_err(|e| {
            (
                done.clone(),
                DistmanError::from(distman_fs::FsError::io(&self.config.temp_root, e)),
            )
        })?;
        let work_root = scratch.path().to_path_buf();

        for dist in &selected {
            if dist.provided.is_some() {
                // Synthetic provides record: never deployed (§3 invariant 3).
                continue;
            }
            if deployed_keys.contains(&(dist.name.clone(), dist.version.clone())) {
                done.push(dist.clone());
                continue;
            }

            let result: Result<DistInfo, DistmanError> = (|| {
                let package_dir =
                    distman_ops::unpack(dist, &work_root, &self.fetch, self.archiver.as_ref())?;
                let config_vars = IndexMap::new();
                let installed = distman_ops::deploy(
                    &package_dir,
                    deployment,
                    self.config.link_mode,
                    &self.config.host_arch,
                    &self.config.host_type,
                    &build_driver,
                    self.platform.as_ref(),
                    &config_vars,
                    variables,
                    &work_root,
                )?;
                Ok(installed)
            })();

            match result {
                Ok(installed) => done.push(installed),
                Err(e) => {
                    if self.config.debug {
                        let _ = scratch.into_path();
                    }
                    return Err((done, e));
                }
            }
        }

        if self.config.debug {
            let _ = scratch.into_path();
        }
        Ok(done)
    }

    /// `remove(names, deployment)` (§4.7): match installed dists against
    /// `names` with constraint semantics, deleting each in turn.
    #[instrument(skip(self))]
    pub fn remove(
        &self,
        names: &[NameConstraint],
        deployment: &Path,
    ) -> Result<Vec<DistInfo>, DistmanError> {
        let installed = read_installed(deployment)?;
        let matched = match_installed(&installed, names);
        for dist in &matched {
            distman_ops::delete(dist, deployment, self.platform.as_ref())?;
        }
        Ok(matched)
    }

    /// `pack(names, deployment, destDir)` (§4.7): match, then pack each.
    #[instrument(skip(self))]
    pub fn pack(
        &self,
        names: &[NameConstraint],
        deployment: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, DistmanError> {
        let installed = read_installed(deployment)?;
        let matched = match_installed(&installed, names);
        fs_err::create_dir_all(&self.config.temp_root)
            .map_err(|e| distman_fs::FsError::io(&self.config.temp_root, e))?;
        let scratch = tempfile::TempDir::new_in(&self.config.temp_root)
            .map_err(|e| distman_fs::FsError::io(&self.config.temp_root, e))?;

        let mut archives = Vec::new();
        for dist in &matched {
            let per_dist_dir = deployment
                .join("dists")
                .join(format!("{}-{}", dist.name, dist.version));
            let archive = distman_ops::pack(
                dist,
                &per_dist_dir,
                scratch.path(),
                dest_dir,
                self.archiver.as_ref(),
            )?;
            archives.push(archive);
        }

        if self.config.debug {
            let _ = scratch.into_path();
        }
        Ok(archives)
    }

    /// `getDeployed(deployment)` (§4.7).
    #[instrument(skip(self))]
    pub fn get_deployed(&self, deployment: &Path) -> Result<Vec<DistInfo>, DistmanError> {
        get_deployed(
            deployment,
            &self.config.host_arch,
            &self.config.host_type,
            &self.config.host_provides,
        )
    }
}
