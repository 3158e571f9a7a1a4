mod build;
mod delete;
mod deploy;
mod error;
mod pack;
mod unpack;

pub use build::{merged_variables, write_cache_file, BuildDriver, ExternalBuildDriver};
pub use delete::delete;
pub use deploy::deploy;
pub use error::OpsError;
pub use pack::pack;
pub use unpack::unpack;
