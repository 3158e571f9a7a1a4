use indexmap::IndexMap;

use crate::constraint::ConstraintNode;
use crate::error::MetadataError;
use crate::value::{Table, Value};

pub const DEFAULT_ARCH: &str = "Universal";
pub const DEFAULT_TYPE: &str = "source";

/// Immutable metadata describing one dist (§3). `path`, `files`, and
/// `provided` are populated by the pipeline, package operations, and the
/// resolver respectively — never by a dist's author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistInfo {
    pub name: String,
    pub version: String,
    pub arch: String,
    pub kind: String,
    pub depends: ConstraintNode,
    pub conflicts: ConstraintNode,
    pub provides: ConstraintNode,
    pub url: Option<String>,
    pub desc: Option<String>,
    pub author: Option<String>,
    pub maintainer: Option<String>,
    pub license: Option<String>,
    pub message: Option<String>,
    pub path: Option<String>,
    pub files: Vec<String>,
    pub provided: Option<Box<DistInfo>>,
}

impl DistInfo {
    /// A minimal record with only the required fields set and every default
    /// applied, for tests and for synthesizing `provides` records.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> DistInfo {
        DistInfo {
            name: name.into(),
            version: version.into(),
            arch: DEFAULT_ARCH.to_string(),
            kind: DEFAULT_TYPE.to_string(),
            depends: ConstraintNode::empty(),
            conflicts: ConstraintNode::empty(),
            provides: ConstraintNode::empty(),
            url: None,
            desc: None,
            author: None,
            maintainer: None,
            license: None,
            message: None,
            path: None,
            files: Vec::new(),
            provided: None,
        }
    }

    fn field_str(
        fields: &IndexMap<String, Value>,
        key: &'static str,
    ) -> Result<Option<String>, MetadataError> {
        match fields.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(MetadataError::WrongShape(key, "string")),
        }
    }

    fn field_constraint(
        fields: &IndexMap<String, Value>,
        key: &'static str,
    ) -> Result<ConstraintNode, MetadataError> {
        match fields.get(key) {
            None => Ok(ConstraintNode::empty()),
            Some(v) => ConstraintNode::from_value(v),
        }
    }

    /// Materialize a `DistInfo` from the raw field map the codec parses,
    /// applying the arch/type defaults from §3. This does not check the
    /// name/version character class or resolve constraints against a host —
    /// that is the manifest pipeline's job (§4.3), since it needs the host
    /// arch/type that this crate has no notion of.
    pub fn from_raw(fields: &IndexMap<String, Value>) -> Result<DistInfo, MetadataError> {
        let name = Self::field_str(fields, "name")?.ok_or(MetadataError::MissingField("name"))?;
        let version =
            Self::field_str(fields, "version")?.ok_or(MetadataError::MissingField("version"))?;
        let arch = Self::field_str(fields, "arch")?.unwrap_or_else(|| DEFAULT_ARCH.to_string());
        let kind = Self::field_str(fields, "type")?.unwrap_or_else(|| DEFAULT_TYPE.to_string());

        let files = match fields.get("files") {
            None => Vec::new(),
            Some(Value::Table(Table { list, map })) if map.is_empty() => list
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or(MetadataError::WrongShape("files", "list of strings"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(MetadataError::WrongShape("files", "list of strings")),
        };

        let provided = match fields.get("provided") {
            None => None,
            Some(Value::Table(t)) => Some(Box::new(DistInfo::from_raw(&t.map)?)),
            Some(_) => return Err(MetadataError::WrongShape("provided", "table")),
        };

        Ok(DistInfo {
            name,
            version,
            arch,
            kind,
            depends: Self::field_constraint(fields, "depends")?,
            conflicts: Self::field_constraint(fields, "conflicts")?,
            provides: Self::field_constraint(fields, "provides")?,
            url: Self::field_str(fields, "url")?,
            desc: Self::field_str(fields, "desc")?,
            author: Self::field_str(fields, "author")?,
            maintainer: Self::field_str(fields, "maintainer")?,
            license: Self::field_str(fields, "license")?,
            message: Self::field_str(fields, "message")?,
            path: Self::field_str(fields, "path")?,
            files,
            provided,
        })
    }

    pub fn to_fields(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        out.insert("name".to_string(), Value::Str(self.name.clone()));
        out.insert("version".to_string(), Value::Str(self.version.clone()));
        out.insert("arch".to_string(), Value::Str(self.arch.clone()));
        out.insert("type".to_string(), Value::Str(self.kind.clone()));
        out.insert("depends".to_string(), self.depends.to_value());
        out.insert("conflicts".to_string(), self.conflicts.to_value());
        out.insert("provides".to_string(), self.provides.to_value());

        for (key, value) in [
            ("url", &self.url),
            ("desc", &self.desc),
            ("author", &self.author),
            ("maintainer", &self.maintainer),
            ("license", &self.license),
            ("message", &self.message),
            ("path", &self.path),
        ] {
            if let Some(v) = value {
                out.insert(key.to_string(), Value::Str(v.clone()));
            }
        }

        out.insert("files".to_string(), Value::string_list(self.files.clone()));

        if let Some(provided) = &self.provided {
            out.insert(
                "provided".to_string(),
                Value::Table(Table::from_map(provided.to_fields())),
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_dist_info, parse_manifest};
    use crate::serializer::{serialize_dist_info, serialize_manifest};

    #[test]
    fn applies_defaults() {
        let fields = parse_dist_info(r#"name = "widget"
version = "1.0"
"#)
        .unwrap();
        let d = DistInfo::from_raw(&fields).unwrap();
        assert_eq!(d.arch, DEFAULT_ARCH);
        assert_eq!(d.kind, DEFAULT_TYPE);
    }

    #[test]
    fn missing_name_is_an_error() {
        let fields = parse_dist_info(r#"version = "1.0""#).unwrap();
        assert!(DistInfo::from_raw(&fields).is_err());
    }

    #[test]
    fn round_trips_through_text() {
        let mut d = DistInfo::new("widget", "1.0");
        d.depends = ConstraintNode::List(vec![ConstraintNode::Bare("base>=1.0".to_string())]);
        d.files = vec!["bin/widget".to_string(), "lib/widget.so".to_string()];
        d.desc = Some("a widget".to_string());

        let text = serialize_dist_info(&d.to_fields());
        let parsed_fields = parse_dist_info(&text).unwrap();
        let parsed = DistInfo::from_raw(&parsed_fields).unwrap();

        assert_eq!(parsed, d);
    }

    #[test]
    fn round_trips_through_manifest() {
        let d = DistInfo::new("widget", "1.0");
        let text = serialize_manifest(&[d.to_fields()]);
        let entries = parse_manifest(&text).unwrap();
        let parsed = DistInfo::from_raw(&entries[0]).unwrap();
        assert_eq!(parsed, d);
    }
}
