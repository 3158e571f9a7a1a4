use std::path::PathBuf;

use distman_ops::ExternalBuildDriver;

/// Every knob the orchestrator needs, threaded explicitly rather than read
/// from ambient globals (Design Notes §9's "Globals" resolution): host
/// arch/type, placement policy, network and build behavior, and the
/// host-provided virtual-package list consumed by `getDeployed`.
#[derive(Debug, Clone)]
pub struct Config {
    pub host_arch: String,
    pub host_type: String,
    pub link_mode: bool,
    pub temp_root: PathBuf,
    pub debug: bool,
    pub cache_ttl_secs: Option<u64>,
    pub verify_tls: bool,
    pub proxy: Option<String>,
    pub fetch_timeout_secs: u64,
    pub host_provides: Vec<String>,
    pub cmake: String,
    pub make: String,
    pub cmake_debug: String,
    pub make_debug: String,
}

impl Config {
    /// A `Config` for the running host: `std::env::consts::ARCH`/`OS` stand
    /// in for the original's platform-detection shell-out, matching the
    /// teacher's preference for compile-time platform constants over
    /// spawning `uname`.
    pub fn for_host(temp_root: PathBuf) -> Config {
        Config {
            host_arch: std::env::consts::ARCH.to_string(),
            host_type: std::env::consts::OS.to_string(),
            link_mode: true,
            temp_root,
            debug: false,
            cache_ttl_secs: Some(24 * 60 * 60),
            verify_tls: true,
            proxy: None,
            fetch_timeout_secs: 30,
            host_provides: Vec::new(),
            cmake: "cmake".to_string(),
            make: "make".to_string(),
            cmake_debug: "cmake".to_string(),
            make_debug: "make".to_string(),
        }
    }

    /// The build driver for the current `debug` setting (spec.md's "configuration
    /// supplies debug variants of both commands"): a debug build may need its own
    /// `cmake`/`make` (e.g. a debug-configured toolchain wrapper), selected here
    /// rather than at every `ExternalBuildDriver` call site.
    pub fn build_driver(&self) -> ExternalBuildDriver {
        if self.debug {
            ExternalBuildDriver {
                cmake: self.cmake_debug.clone(),
                make: self.make_debug.clone(),
            }
        } else {
            ExternalBuildDriver {
                cmake: self.cmake.clone(),
                make: self.make.clone(),
            }
        }
    }
}
