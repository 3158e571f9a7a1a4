//! The `dist.info` / `dist.manifest` text codec and the `DistInfo` data
//! model (§3, §4.2, §6). Loading never evaluates untrusted text: this is a
//! dedicated recursive-descent parser, not an embedded interpreter, so there
//! is no ambient scope for loaded text to reach into (Design Notes §9).

mod constraint;
mod dist_info;
mod error;
mod lexer;
mod parser;
mod serializer;
mod value;

pub use constraint::ConstraintNode;
pub use dist_info::{DistInfo, DEFAULT_ARCH, DEFAULT_TYPE};
pub use error::MetadataError;
pub use parser::{parse_dist_info, parse_manifest};
pub use serializer::{serialize_dist_info, serialize_manifest};
pub use value::{Table, Value};
