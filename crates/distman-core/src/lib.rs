//! The orchestrator: `install`, `remove`, `pack`, and `getDeployed`,
//! composing the manifest pipeline, resolver, and package operations behind
//! one explicit `Config` (§4.7).

mod config;
mod deployed;
mod error;
mod orchestrator;

pub use config::Config;
pub use deployed::{get_deployed, match_installed, read_installed};
pub use error::DistmanError;
pub use orchestrator::{InstallError, Orchestrator};

pub use distman_manifest::Locator;
pub use distman_metadata::DistInfo;
pub use distman_version::NameConstraint;
