use std::path::Path;

use distman_fs::{list_recursive, to_portable, Platform};
use distman_metadata::{serialize_dist_info, DistInfo, Value, DEFAULT_ARCH, DEFAULT_TYPE};
use indexmap::IndexMap;
use tracing::instrument;

use crate::build::{merged_variables, write_cache_file, BuildDriver};
use crate::error::OpsError;

/// Step 2 of §4.5: a `CMakeLists.txt` at the package root with no declared
/// `type` means the dist is an unbuilt CMake source tree, not whatever the
/// author's `arch` happened to say — force `Universal`/`source` before the
/// host-compatibility check ever sees it.
fn load_package_info(package_dir: &Path) -> Result<DistInfo, OpsError> {
    let info_path = package_dir.join("dist.info");
    let text =
        fs_err::read_to_string(&info_path).map_err(|e| distman_fs::FsError::io(&info_path, e))?;
    let mut fields = distman_metadata::parse_dist_info(&text)?;

    if !fields.contains_key("type") && package_dir.join("CMakeLists.txt").is_file() {
        fields.insert("arch".to_string(), Value::Str(DEFAULT_ARCH.to_string()));
        fields.insert("type".to_string(), Value::Str(DEFAULT_TYPE.to_string()));
    }

    Ok(DistInfo::from_raw(&fields)?)
}

fn reject_if_host_incompatible(
    info: &DistInfo,
    host_arch: &str,
    host_type: &str,
) -> Result<(), OpsError> {
    if info.arch != DEFAULT_ARCH && info.arch != host_arch {
        return Err(OpsError::ArchMismatch {
            name: info.name.clone(),
            version: info.version.clone(),
            arch: info.arch.clone(),
        });
    }
    if info.kind != host_type && info.kind != "all" && info.kind != "source" {
        return Err(OpsError::TypeMismatch {
            name: info.name.clone(),
            version: info.version.clone(),
            kind: info.kind.clone(),
        });
    }
    Ok(())
}

fn copy_entry(platform: &dyn Platform, src: &Path, dst: &Path) -> Result<(), OpsError> {
    if src.is_dir() {
        for rel in list_recursive(src)? {
            platform.copy_file(&src.join(&rel), &dst.join(&rel))?;
        }
    } else {
        platform.copy_file(src, dst)?;
    }
    Ok(())
}

/// The recorded-`files` entries one top-level package entry contributes:
/// itself if it is a plain file, or every file beneath it (prefixed by its
/// own name) if it is a directory. These are the paths the dist owns at the
/// deployment's top level (§3's Invariants).
fn recorded_files_for_entry(package_dir: &Path, entry_name: &str) -> Result<Vec<String>, OpsError> {
    let entry_path = package_dir.join(entry_name);
    if entry_path.is_dir() {
        Ok(list_recursive(&entry_path)?
            .into_iter()
            .map(|rel| format!("{entry_name}/{}", to_portable(&rel)))
            .collect())
    } else {
        Ok(vec![entry_name.to_string()])
    }
}

/// Step 4 of §4.5: install a non-source package into deployment `D`.
fn install(
    package_dir: &Path,
    deployment_root: &Path,
    link_mode: bool,
    info: &DistInfo,
    platform: &dyn Platform,
) -> Result<DistInfo, OpsError> {
    let per_dist_dir = deployment_root
        .join("dists")
        .join(format!("{}-{}", info.name, info.version));
    fs_err::create_dir_all(&per_dist_dir).map_err(|e| distman_fs::FsError::io(&per_dist_dir, e))?;

    let mut files = Vec::new();
    let entries =
        fs_err::read_dir(package_dir).map_err(|e| distman_fs::FsError::io(package_dir, e))?;
    let mut top_level: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "dist.info")
        .collect();
    top_level.sort();

    for name in &top_level {
        let src = package_dir.join(name);
        let per_dist_target = per_dist_dir.join(name);
        copy_entry(platform, &src, &per_dist_target)?;

        let deploy_target = deployment_root.join(name);
        if let Some(parent) = deploy_target.parent() {
            fs_err::create_dir_all(parent).map_err(|e| distman_fs::FsError::io(parent, e))?;
        }

        if link_mode {
            let base = deploy_target.parent().unwrap_or(deployment_root);
            let relative = pathdiff::diff_paths(&per_dist_target, base)
                .unwrap_or_else(|| per_dist_target.clone());
            platform.symlink(&relative, &deploy_target)?;
        } else {
            copy_entry(platform, &src, &deploy_target)?;
        }

        files.extend(recorded_files_for_entry(package_dir, name)?);
    }

    let mut installed = info.clone();
    installed.files = files;

    let text = serialize_dist_info(&installed.to_fields());
    fs_err::write(per_dist_dir.join("dist.info"), text)
        .map_err(|e| distman_fs::FsError::io(&per_dist_dir, e))?;

    Ok(installed)
}

/// Step 5 of §4.5: build a source package, then recurse into `install` on
/// the resulting install prefix, stamped with the host arch/type.
#[allow(clippy::too_many_arguments)]
fn build_and_install(
    package_dir: &Path,
    deployment_root: &Path,
    link_mode: bool,
    info: &DistInfo,
    host_arch: &str,
    host_type: &str,
    build_driver: &dyn BuildDriver,
    platform: &dyn Platform,
    config_vars: &IndexMap<String, String>,
    caller_vars: &IndexMap<String, String>,
    work_root: &Path,
) -> Result<DistInfo, OpsError> {
    let stamp = format!("{}-{}", info.name, info.version);
    let install_prefix = work_root.join(format!("{stamp}-prefix"));
    let build_dir = work_root.join(format!("{stamp}-build"));
    fs_err::create_dir_all(&install_prefix)
        .map_err(|e| distman_fs::FsError::io(&install_prefix, e))?;
    fs_err::create_dir_all(&build_dir).map_err(|e| distman_fs::FsError::io(&build_dir, e))?;

    let merged = merged_variables(config_vars, caller_vars, &install_prefix, deployment_root);
    let cache_file = build_dir.join("cache.cmake");
    write_cache_file(&cache_file, &merged)?;

    build_driver.configure(&build_dir, &cache_file, package_dir)?;
    build_driver.build(&build_dir)?;

    let mut built_info = info.clone();
    built_info.arch = host_arch.to_string();
    built_info.kind = host_type.to_string();
    let text = serialize_dist_info(&built_info.to_fields());
    fs_err::write(install_prefix.join("dist.info"), text)
        .map_err(|e| distman_fs::FsError::io(&install_prefix, e))?;

    install(&install_prefix, deployment_root, link_mode, &built_info, platform)
}

/// Deploy an unpacked package into deployment `D` (§4.5). `work_root` hosts
/// the temporary build prefix/directory when the package is type `source`.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(build_driver, platform, config_vars, caller_vars))]
pub fn deploy(
    package_dir: &Path,
    deployment_root: &Path,
    link_mode: bool,
    host_arch: &str,
    host_type: &str,
    build_driver: &dyn BuildDriver,
    platform: &dyn Platform,
    config_vars: &IndexMap<String, String>,
    caller_vars: &IndexMap<String, String>,
    work_root: &Path,
) -> Result<DistInfo, OpsError> {
    let info = load_package_info(package_dir)?;

    reject_if_host_incompatible(&info, host_arch, host_type)?;

    if info.kind == "source" {
        build_and_install(
            package_dir,
            deployment_root,
            link_mode,
            &info,
            host_arch,
            host_type,
            build_driver,
            platform,
            config_vars,
            caller_vars,
            work_root,
        )
    } else {
        install(package_dir, deployment_root, link_mode, &info, platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distman_fs::host_platform;
    use tempfile::tempdir;

    struct NoopBuildDriver;

    impl BuildDriver for NoopBuildDriver {
        fn configure(&self, _build_dir: &Path, _cache_file: &Path, _src_dir: &Path) -> Result<(), OpsError> {
            Ok(())
        }

        fn build(&self, _build_dir: &Path) -> Result<(), OpsError> {
            Ok(())
        }
    }

    #[test]
    fn cmakelists_with_no_declared_type_forces_universal_source() {
        let root = tempdir().unwrap();
        let package_dir = root.path().join("widget-1.0");
        fs_err::create_dir_all(&package_dir).unwrap();
        fs_err::write(package_dir.join("CMakeLists.txt"), b"").unwrap();
        // arch is explicitly authored, but type is left unset — the
        // CMakeLists.txt presence must still force both to Universal/source.
        fs_err::write(
            package_dir.join("dist.info"),
            b"name = \"widget\"\nversion = \"1.0\"\narch = \"Linux\"\n",
        )
        .unwrap();

        let info = load_package_info(&package_dir).unwrap();
        assert_eq!(info.arch, DEFAULT_ARCH);
        assert_eq!(info.kind, DEFAULT_TYPE);
    }

    #[test]
    fn cmake_source_with_declared_type_is_left_alone() {
        let root = tempdir().unwrap();
        let package_dir = root.path().join("widget-1.0");
        fs_err::create_dir_all(&package_dir).unwrap();
        fs_err::write(package_dir.join("CMakeLists.txt"), b"").unwrap();
        fs_err::write(
            package_dir.join("dist.info"),
            b"name = \"widget\"\nversion = \"1.0\"\narch = \"Linux\"\ntype = \"binary\"\n",
        )
        .unwrap();

        let info = load_package_info(&package_dir).unwrap();
        assert_eq!(info.arch, "Linux");
        assert_eq!(info.kind, "binary");
    }

    #[test]
    fn deploy_does_not_reject_cmake_source_declaring_a_foreign_arch() {
        let root = tempdir().unwrap();
        let package_dir = root.path().join("widget-1.0");
        fs_err::create_dir_all(&package_dir).unwrap();
        fs_err::write(package_dir.join("CMakeLists.txt"), b"").unwrap();
        // Declares an arch that would mismatch the host, but since `type` is
        // unset this is a CMake source tree and should deploy as Universal.
        fs_err::write(
            package_dir.join("dist.info"),
            b"name = \"widget\"\nversion = \"1.0\"\narch = \"PowerPC\"\n",
        )
        .unwrap();

        let deployment_root = root.path().join("D");
        let work_root = root.path().join("work");
        fs_err::create_dir_all(&work_root).unwrap();

        let platform = host_platform();
        let result = deploy(
            &package_dir,
            &deployment_root,
            false,
            "Linux",
            "binary",
            &NoopBuildDriver,
            platform.as_ref(),
            &IndexMap::new(),
            &IndexMap::new(),
            &work_root,
        );

        let installed = result.expect("CMake source with a foreign declared arch should still deploy");
        assert_eq!(installed.name, "widget");
        let per_dist_info = deployment_root
            .join("dists")
            .join("widget-1.0")
            .join("dist.info");
        assert!(per_dist_info.is_file());
    }
}
