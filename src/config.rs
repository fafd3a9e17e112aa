//! Loading schema declarations from JSON.
//!
//! ```json
//! { "attributes": [
//!   { "name": "a", "shape": [3] },
//!   { "name": "w", "shape": "a", "domain": "positive" },
//!   { "name": "f", "rank": 0, "domain": [3, 4], "default": 3.5 },
//!   { "name": "v", "convertible_to": { "framework": "symbolic", "unit": "cm / s" } }
//! ] }
//! ```
use crate::error::TraitError;
use crate::schema::{Schema, SchemaBuilder};
use crate::spec::{AttributeSpec, Domain, UnknownDomain};
use crate::units::{Framework, UnitObject, UnitParseError};
use crate::value::Value;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid schema declaration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("{name}: {source}")]
    Unit { name: String, source: UnitParseError },

    #[error("{name}: {source}")]
    Domain { name: String, source: UnknownDomain },

    #[error("{name}: default must be a number, a string or nested lists of numbers (found {found})")]
    Default { name: String, found: String },

    #[error("{name}: the {framework} unit framework is not available in this build")]
    FrameworkUnavailable { name: String, framework: Framework },

    #[error(transparent)]
    Trait(#[from] TraitError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaConfig {
    attributes: Vec<AttributeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeConfig {
    name: String,
    rank: Option<usize>,
    shape: Option<ShapeConfig>,
    domain: Option<DomainConfig>,
    default: Option<serde_json::Value>,
    convertible_to: Option<UnitConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShapeConfig {
    Fixed(Vec<usize>),
    Sibling(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DomainConfig {
    Named(String),
    Range([f64; 2]),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitConfig {
    framework: Framework,
    unit: String,
}

impl AttributeConfig {
    fn into_spec(self) -> Result<AttributeSpec, ConfigError> {
        let mut spec = AttributeSpec::new(self.name.clone());
        if let Some(rank) = self.rank {
            spec = spec.rank(rank);
        }
        spec = match self.shape {
            Some(ShapeConfig::Fixed(dims)) => spec.shape(dims),
            Some(ShapeConfig::Sibling(sibling)) => spec.shape_like(sibling),
            None => spec,
        };
        spec = match self.domain {
            Some(DomainConfig::Named(named)) => {
                let domain = named
                    .parse::<Domain>()
                    .map_err(|source| ConfigError::Domain { name: self.name.clone(), source })?;
                spec.domain(domain)
            }
            Some(DomainConfig::Range([low, high])) => spec.domain(Domain::Range(low, high)),
            None => spec,
        };
        match self.default {
            Some(serde_json::Value::Null) | None => {}
            Some(json) => spec = spec.default(default_value(&self.name, &json)?),
        }
        if let Some(unit) = &self.convertible_to {
            spec = spec.convertible_to_shared(target_unit(&self.name, unit)?);
        }
        Ok(spec)
    }
}

fn default_value(name: &str, json: &serde_json::Value) -> Result<Value, ConfigError> {
    use serde_json::Value as Json;

    match json {
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n.as_f64().map(Value::Float).ok_or_else(|| ConfigError::Default {
                name: name.to_string(),
                found: n.to_string(),
            }),
        },
        Json::String(s) => Ok(Value::Text(s.clone())),
        Json::Array(items) => items
            .iter()
            .map(|item| default_value(name, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => Err(ConfigError::Default { name: name.to_string(), found: other.to_string() }),
    }
}

fn target_unit(name: &str, config: &UnitConfig) -> Result<Arc<dyn UnitObject>, ConfigError> {
    let parse_failed = |source| ConfigError::Unit { name: name.to_string(), source };

    match config.framework {
        #[cfg(feature = "symbolic")]
        Framework::Symbolic => crate::units::symbolic::SymbolicUnit::parse(&config.unit)
            .map(|u| Arc::new(u) as Arc<dyn UnitObject>)
            .map_err(parse_failed),
        #[cfg(feature = "registry")]
        Framework::Registry => crate::units::registry::RegistryUnit::parse(&config.unit)
            .map(|u| Arc::new(u) as Arc<dyn UnitObject>)
            .map_err(parse_failed),
        #[cfg(feature = "dimensional")]
        Framework::Dimensional => crate::units::dimensional::DimensionalUnit::parse(&config.unit)
            .map(|u| Arc::new(u) as Arc<dyn UnitObject>)
            .map_err(parse_failed),
        #[allow(unreachable_patterns)]
        framework => Err(ConfigError::FrameworkUnavailable { name: name.to_string(), framework }),
    }
}

impl SchemaConfig {
    fn into_builder(self) -> Result<SchemaBuilder, ConfigError> {
        self.attributes
            .into_iter()
            .try_fold(Schema::builder(), |builder, attr| Ok(builder.attribute(attr.into_spec()?)))
    }
}

impl Schema {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SchemaConfig = serde_json::from_str(json)?;
        Ok(config.into_builder()?.build()?)
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let config: SchemaConfig = serde_json::from_reader(reader)?;
        Ok(config.into_builder()?.build()?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DECLARATION: &str = r#"{ "attributes": [
        { "name": "a", "shape": [3] },
        { "name": "w", "shape": "a", "domain": "positive" },
        { "name": "f", "rank": 0, "domain": [3, 4], "default": 3.5 },
        { "name": "v", "convertible_to": { "framework": "symbolic", "unit": "cm / s" } }
    ] }"#;

    #[test]
    #[cfg(feature = "symbolic")]
    fn test_declaration_round_trip() {
        let mut schema = Schema::from_json_str(DECLARATION).unwrap();
        assert_eq!(schema.len(), 4);
        let obj = schema.spawn().unwrap();

        assert_eq!(schema.get_by_name(obj, "f").unwrap(), Some(&Value::Float(3.5)));
        let err = schema.set_by_name(obj, "f", 7).unwrap_err();
        assert_eq!(err.to_string(), "f should be in the range [3:4]");

        schema.set_by_name(obj, "a", [1, 2, 3]).unwrap();
        let err = schema.set_by_name(obj, "w", [1, -2, 3]).unwrap_err();
        assert_eq!(err.to_string(), "All values of w should be positive");

        let v = schema.attr("v").unwrap();
        assert_eq!(schema.attribute(v).unwrap().framework(), Some(Framework::Symbolic));
        let err = schema.set(obj, v, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "v should be given as a symbolic Quantity instance");
    }

    #[test]
    fn test_nested_default() {
        let mut schema =
            Schema::from_json_str(r#"{"attributes": [{"name": "m", "default": [[1, 2], [3, 4.5]]}]}"#).unwrap();
        let expected = Value::Array(ndarray::array![[1.0, 2.0], [3.0, 4.5]].into_dyn());
        let obj = schema.spawn().unwrap();
        assert_eq!(schema.get_by_name(obj, "m").unwrap(), Some(&expected));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DECLARATION.as_bytes()).unwrap();
        let schema = Schema::from_json_file(file.path());
        #[cfg(feature = "symbolic")]
        assert!(schema.is_ok());
        #[cfg(not(feature = "symbolic"))]
        assert!(matches!(schema, Err(ConfigError::FrameworkUnavailable { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = Schema::from_json_file("/nonexistent/schema.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bad_domain_name() {
        let err = Schema::from_json_str(r#"{"attributes": [{"name": "b", "domain": "upwards"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Domain { .. }));
        assert!(err.to_string().starts_with("b: unknown domain 'upwards'"));
    }

    #[test]
    fn test_bad_default() {
        let err = Schema::from_json_str(r#"{"attributes": [{"name": "b", "default": {"x": 1}}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Default { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Schema::from_json_str(r#"{"attributes": [{"name": "b", "ndim": 1}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    #[cfg(feature = "registry")]
    fn test_unknown_unit() {
        let json = r#"{"attributes": [{"name": "a", "convertible_to": {"framework": "registry", "unit": "furlong"}}]}"#;
        let err = Schema::from_json_str(json).unwrap_err();
        assert_eq!(err.to_string(), "a: unknown unit 'furlong'");
    }

    #[test]
    fn test_declaration_errors_surface_as_trait_errors() {
        let err = Schema::from_json_str(r#"{"attributes": [{"name": "x", "rank": 3, "shape": [3, 3]}]}"#).unwrap_err();
        match err {
            ConfigError::Trait(inner) => assert_eq!(inner.kind(), ErrorKind::InconsistentRankShape),
            other => panic!("unexpected error: {other}"),
        }
    }
}
