//! Declarative endpoint definitions.
//!
//! A service can be described as data, in YAML or JSON, instead of with
//! builders. Hooks cannot be expressed this way; attach them with
//! [`ServiceBuilder::request_hook`](crate::ServiceBuilder::request_hook) and
//! [`ServiceBuilder::response_hook`](crate::ServiceBuilder::response_hook).
//!
//! ## Examples
//!
//! ```rust
//! use rest_service::ServiceDefinition;
//!
//! let definition = ServiceDefinition::from_yaml_str(r#"
//! getGamesRegex:
//!   template: GET /players/{playerId}/games/{gameId}{?take,skip,limit}
//!   headers:
//!     x-site-code: { type: string, default: test }
//!     x-correlation-token: { type: string, required: true }
//!   query:
//!     take: { type: number, required: true }
//!     skip: { type: number, required: true }
//!   alias:
//!     playerId: id
//! getHealth:
//!   method: GET
//!   path: /diagnostics/health
//! "#).unwrap();
//!
//! assert_eq!(definition.len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::bucket::BucketKind;
use crate::descriptor::{AliasTable, EndpointDescriptor};
use crate::error::ConfigError;
use crate::method::RestMethod;
use crate::schema::ObjectSchema;

/// Alias names, either for every bucket or per bucket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AliasDefinition {
    /// `{bucket: {canonical: alternate}}`
    PerBucket(BTreeMap<BucketKind, BTreeMap<String, String>>),
    /// `{canonical: alternate}`
    Flat(BTreeMap<String, String>),
}

impl Default for AliasDefinition {
    fn default() -> Self {
        Self::Flat(BTreeMap::new())
    }
}

impl From<AliasDefinition> for AliasTable {
    fn from(definition: AliasDefinition) -> Self {
        let mut table = AliasTable::new();
        match definition {
            AliasDefinition::Flat(entries) => {
                for (canonical, alternate) in entries {
                    table.insert(canonical, alternate);
                }
            }
            AliasDefinition::PerBucket(buckets) => {
                for (bucket, entries) in buckets {
                    for (canonical, alternate) in entries {
                        table.insert_for(bucket, canonical, alternate);
                    }
                }
            }
        }
        table
    }
}

/// One endpoint described as data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointDefinition {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub method: Option<RestMethod>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<ObjectSchema>,
    #[serde(default)]
    pub params: Option<ObjectSchema>,
    #[serde(default)]
    pub query: Option<ObjectSchema>,
    #[serde(default)]
    pub payload: Option<ObjectSchema>,
    #[serde(default)]
    pub alias: AliasDefinition,
}

impl EndpointDefinition {
    pub fn into_descriptor(self) -> EndpointDescriptor {
        let mut builder = EndpointDescriptor::builder().alias_table(self.alias.into());
        if let Some(template) = self.template {
            builder = builder.template(template);
        }
        if let Some(method) = self.method {
            builder = builder.method(method);
        }
        if let Some(path) = self.path {
            builder = builder.path(path);
        }
        let schemas = [
            (BucketKind::Headers, self.headers),
            (BucketKind::Params, self.params),
            (BucketKind::Query, self.query),
            (BucketKind::Payload, self.payload),
        ];
        for (bucket, schema) in schemas {
            if let Some(schema) = schema {
                builder = builder.schema(bucket, schema);
            }
        }
        builder.build()
    }
}

/// A named set of endpoint definitions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ServiceDefinition {
    endpoints: BTreeMap<String, EndpointDefinition>,
}

impl ServiceDefinition {
    /// Parses definitions from YAML.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Definition`] if the document does not match the
    /// definition format.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Definition(e.to_string()))
    }

    /// Parses definitions from JSON.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Definition`] if the document does not match the
    /// definition format.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Definition(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&EndpointDefinition> {
        self.endpoints.get(name)
    }

    /// Converts every definition into a named descriptor.
    pub fn into_descriptors(self) -> impl Iterator<Item = (String, EndpointDescriptor)> {
        self.endpoints
            .into_iter()
            .map(|(name, definition)| (name, definition.into_descriptor()))
    }
}
