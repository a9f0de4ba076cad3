//! Command manifests: YAML or JSON files declaring commands.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! prefix: "%"
//! commands:
//!   - name: role
//!     syntax: "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3"
//!     arguments:
//!       - { id: name, name: Role name }
//!       - id: tier
//!         name: Tier
//!         optional: true
//!         constraint: { kind: choice, values: [Novice, Expert] }
//!       - id: info
//!         name: Description
//!         constraint: { kind: string, max_length: 200 }
//! ```

use std::io::{BufReader, BufWriter};
use std::ops::Bound;
use std::path::Path;

use command_syntax_structure::leaves::{
    BOOLEAN_S, HEX_DIGEST, SNOWFLAKE, STATUS_LINK, UINT4_LIKE, UINT8_LIKE, hex_digest,
};
use command_syntax_structure::{Structure, string, validators};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RegistryError, Result};

fn default_prefix() -> String {
    "!".to_string()
}

/// Top-level manifest.
///
/// # Examples
///
/// ```
/// use command_syntax_registry::RegistryConfig;
///
/// let config = RegistryConfig::from_yaml_str(r#"
/// version: "1.0"
/// prefix: "%"
/// commands:
///   - name: ping
///     syntax: "<prefix>ping"
/// "#).unwrap();
/// assert_eq!(config.prefix, "%");
/// assert_eq!(config.commands[0].name, "ping");
/// assert!(config.commands[0].arguments.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Manifest format version (e.g., `"1.0"`).
    pub version: String,
    /// Prefix used to compile syntax strings at registration.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// One command declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    pub syntax: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
}

/// One declared argument. Order matters: the first entry is `$1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentConfig {
    pub id: String,
    /// Display name used in usage text.
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintConfig>,
}

/// Constraint applied to an argument's extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintConfig {
    /// Free text, optionally bounded in length (characters).
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// Platform identifier (17 to 20 digits).
    Snowflake,
    /// Unsigned 32-bit integer, optionally bounded.
    Uint4 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
    },
    /// Unsigned 64-bit integer.
    Uint8,
    /// yes/no/true/false.
    Boolean,
    /// One of a fixed set of words, normalized to the listed spelling.
    Choice { values: Vec<String> },
    /// Hex digest; any of the common lengths when `length` is absent.
    HexDigest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<usize>,
    },
    /// Link to a single post.
    StatusLink,
}

impl ConstraintConfig {
    /// Builds the structure this constraint describes.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the bounds are inverted or
    /// a choice list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_syntax_registry::ConstraintConfig;
    /// use serde_json::json;
    ///
    /// let tier = ConstraintConfig::Choice { values: vec!["Novice".into(), "Expert".into()] }
    ///     .to_structure()
    ///     .unwrap();
    /// assert_eq!(tier.check(&json!("expert")).unwrap(), json!("Expert"));
    /// assert!(tier.check(&json!("master")).is_err());
    /// ```
    pub fn to_structure(&self) -> std::result::Result<Structure<Value>, String> {
        let structure = match self {
            Self::String {
                min_length,
                max_length,
            } => {
                check_order(*min_length, *max_length)?;
                if min_length.is_none() && max_length.is_none() {
                    string().erase()
                } else {
                    string()
                        .named("Text")
                        .length((inclusive(*min_length), inclusive(*max_length)))
                        .erase()
                }
            }
            Self::Snowflake => SNOWFLAKE.clone().erase(),
            Self::Uint4 { min, max } => {
                check_order(*min, *max)?;
                if min.is_none() && max.is_none() {
                    UINT4_LIKE.clone().erase()
                } else {
                    UINT4_LIKE
                        .clone()
                        .validate(validators::in_range((inclusive(*min), inclusive(*max))))
                        .erase()
                }
            }
            Self::Uint8 => UINT8_LIKE.clone().erase(),
            Self::Boolean => BOOLEAN_S.clone().erase(),
            Self::Choice { values } => {
                if values.is_empty() {
                    return Err("choice constraint needs at least one value".to_string());
                }
                let canonical = values.clone();
                string()
                    .named("Choice")
                    .validate(validators::one_of(values.clone()))
                    .normalize(move |chosen| {
                        canonical
                            .iter()
                            .find(|c| c.eq_ignore_ascii_case(&chosen))
                            .cloned()
                            .unwrap_or(chosen)
                    })
                    .erase()
            }
            Self::HexDigest { length: None } => HEX_DIGEST.clone().erase(),
            Self::HexDigest { length: Some(0) } => {
                return Err("hex digest length must be positive".to_string());
            }
            Self::HexDigest {
                length: Some(length),
            } => hex_digest(*length).erase(),
            Self::StatusLink => STATUS_LINK.clone().erase(),
        };
        Ok(structure)
    }
}

fn check_order<N: PartialOrd + std::fmt::Display>(
    min: Option<N>,
    max: Option<N>,
) -> std::result::Result<(), String> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => {
            Err(format!("minimum {min} is greater than maximum {max}"))
        }
        _ => Ok(()),
    }
}

fn inclusive<N>(value: Option<N>) -> Bound<N> {
    value.map_or(Bound::Unbounded, Bound::Included)
}

impl RegistryConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.checked()
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.checked()
    }

    /// Loads a manifest, choosing JSON for `.json` files and YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](RegistryError::IoError) if the file cannot be
    /// read, a parse error for malformed content, or
    /// [`InvalidManifest`](RegistryError::InvalidManifest) for an empty
    /// prefix.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        config.checked()
    }

    /// Saves the manifest as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(std::fs::File::create(path)?);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    fn checked(self) -> Result<Self> {
        if self.prefix.is_empty() {
            return Err(RegistryError::InvalidManifest(
                "prefix must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}
