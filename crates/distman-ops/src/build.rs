use std::path::{Path, PathBuf};
use std::process::Command;

use indexmap::IndexMap;
use tracing::instrument;

use crate::error::OpsError;

/// Shallow-merge `config_vars` then `caller_vars`, then override the three
/// variables that always reflect the current build/install layout (§4.5
/// step 5).
pub fn merged_variables(
    config_vars: &IndexMap<String, String>,
    caller_vars: &IndexMap<String, String>,
    install_prefix: &Path,
    deployment_root: &Path,
) -> IndexMap<String, String> {
    let mut merged = config_vars.clone();
    merged.extend(caller_vars.clone());
    merged.insert(
        "CMAKE_INSTALL_PREFIX".to_string(),
        install_prefix.display().to_string(),
    );
    merged.insert(
        "CMAKE_INCLUDE_PATH".to_string(),
        deployment_root.join("include").display().to_string(),
    );
    merged.insert(
        "CMAKE_LIBRARY_PATH".to_string(),
        format!(
            "{};{}",
            deployment_root.join("lib").display(),
            deployment_root.join("bin").display()
        ),
    );
    merged
}

/// Write a build-driver cache file: one `SET(<key> "<value>" CACHE STRING ""
/// FORCE)` line per entry (§4.5 step 5).
pub fn write_cache_file(path: &Path, vars: &IndexMap<String, String>) -> Result<(), OpsError> {
    let mut text = String::new();
    for (key, value) in vars {
        text.push_str(&format!(
            "SET({key} \"{}\" CACHE STRING \"\" FORCE)\n",
            value.replace('\\', "/").replace('"', "\\\"")
        ));
    }
    fs_err::write(path, text).map_err(|e| distman_fs::FsError::io(path, e))?;
    Ok(())
}

/// The native build step boundary (§2, §6's "Build driver"): invoked as
/// `cd <build> && <cmake> -C cache.cmake <src>` then `cd <build> && <make>`.
pub trait BuildDriver: Send + Sync {
    fn configure(&self, build_dir: &Path, cache_file: &Path, src_dir: &Path) -> Result<(), OpsError>;
    fn build(&self, build_dir: &Path) -> Result<(), OpsError>;
}

#[derive(Debug, Clone)]
pub struct ExternalBuildDriver {
    pub cmake: String,
    pub make: String,
}

impl Default for ExternalBuildDriver {
    fn default() -> Self {
        ExternalBuildDriver {
            cmake: "cmake".to_string(),
            make: "make".to_string(),
        }
    }
}

impl BuildDriver for ExternalBuildDriver {
    #[instrument(skip(self))]
    fn configure(&self, build_dir: &Path, cache_file: &Path, src_dir: &Path) -> Result<(), OpsError> {
        fs_err::create_dir_all(build_dir).map_err(|e| distman_fs::FsError::io(build_dir, e))?;
        let output = Command::new(&self.cmake)
            .current_dir(build_dir)
            .arg("-C")
            .arg(cache_file)
            .arg(src_dir)
            .output()
            .map_err(|e| OpsError::CommandFailed(PathBuf::from(&self.cmake), e))?;
        if !output.status.success() {
            return Err(OpsError::from_output("configure", &output));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn build(&self, build_dir: &Path) -> Result<(), OpsError> {
        let output = Command::new(&self.make)
            .current_dir(build_dir)
            .output()
            .map_err(|e| OpsError::CommandFailed(PathBuf::from(&self.make), e))?;
        if !output.status.success() {
            return Err(OpsError::from_output("build", &output));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_variables_override_layout_keys() {
        let mut config_vars = IndexMap::new();
        config_vars.insert("FOO".to_string(), "1".to_string());
        config_vars.insert("CMAKE_INSTALL_PREFIX".to_string(), "stale".to_string());
        let caller_vars = IndexMap::new();

        let merged = merged_variables(
            &config_vars,
            &caller_vars,
            Path::new("/tmp/prefix"),
            Path::new("/opt/deploy"),
        );

        assert_eq!(merged.get("FOO").map(String::as_str), Some("1"));
        assert_eq!(
            merged.get("CMAKE_INSTALL_PREFIX").map(String::as_str),
            Some("/tmp/prefix")
        );
        assert_eq!(
            merged.get("CMAKE_LIBRARY_PATH").map(String::as_str),
            Some("/opt/deploy/lib;/opt/deploy/bin")
        );
    }

    #[test]
    fn caller_vars_win_over_config_vars() {
        let mut config_vars = IndexMap::new();
        config_vars.insert("FOO".to_string(), "config".to_string());
        let mut caller_vars = IndexMap::new();
        caller_vars.insert("FOO".to_string(), "caller".to_string());

        let merged = merged_variables(
            &config_vars,
            &caller_vars,
            Path::new("/tmp/prefix"),
            Path::new("/opt/deploy"),
        );
        assert_eq!(merged.get("FOO").map(String::as_str), Some("caller"));
    }

    #[test]
    fn cache_file_renders_set_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = IndexMap::new();
        vars.insert("FOO".to_string(), "bar".to_string());
        let path = dir.path().join("cache.cmake");
        write_cache_file(&path, &vars).unwrap();
        let text = fs_err::read_to_string(&path).unwrap();
        assert_eq!(text, "SET(FOO \"bar\" CACHE STRING \"\" FORCE)\n");
    }
}
