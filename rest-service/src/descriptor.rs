//! Endpoint descriptors.
//!
//! An [`EndpointDescriptor`] is the declarative definition of one endpoint:
//! its template, one optional schema per bucket, alias names and hooks. It is
//! immutable once handed to a [`ServiceBuilder`](crate::ServiceBuilder), which
//! compiles each schema's declared fields into a [`SchemaIndex`] so call-time
//! classification is a plain lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::bucket::{BucketKind, Buckets};
use crate::dispatch::{RequestHook, ResponseHook};
use crate::method::RestMethod;
use crate::schema::{FieldSpec, Schema};

/// Alternate argument names that resolve to a canonical field name.
///
/// Callers supply the alternate name; classification looks the field up under
/// the canonical one. Entries can apply to every bucket or to one bucket only,
/// and bucket-specific entries are consulted first. Alternate names match
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    global: Vec<(String, String)>,
    per_bucket: Buckets<Vec<(String, String)>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `alternate` to `canonical` in every bucket.
    pub fn insert(&mut self, canonical: impl Into<String>, alternate: impl Into<String>) {
        self.global.push((canonical.into(), alternate.into()));
    }

    /// Maps `alternate` to `canonical` for one bucket only.
    pub fn insert_for(
        &mut self,
        bucket: BucketKind,
        canonical: impl Into<String>,
        alternate: impl Into<String>,
    ) {
        self.per_bucket
            .get_mut(bucket)
            .push((canonical.into(), alternate.into()));
    }

    /// Returns the canonical name for `key` in `bucket`, or `key` itself when
    /// no alias applies.
    pub fn resolve<'a>(&'a self, bucket: BucketKind, key: &'a str) -> &'a str {
        let lookup = |entries: &'a [(String, String)]| {
            entries
                .iter()
                .find(|(_, alternate)| alternate.eq_ignore_ascii_case(key))
                .map(|(canonical, _)| canonical.as_str())
        };
        lookup(self.per_bucket.get(bucket).as_slice())
            .or_else(|| lookup(self.global.as_slice()))
            .unwrap_or(key)
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.per_bucket.iter().all(|(_, entries)| entries.is_empty())
    }
}

/// The declarative definition of one endpoint.
///
/// ## Examples
///
/// ```rust
/// use rest_service::EndpointDescriptor;
/// use rest_service::schema::{Field, ObjectSchema};
///
/// let descriptor = EndpointDescriptor::builder()
///     .template("GET /players/{playerId}/games/{gameId}{?take,skip,limit}")
///     .headers(ObjectSchema::new().field("x-site-code", Field::string().default("test")))
///     .query(ObjectSchema::new().field("take", Field::number().required()))
///     .alias("playerId", "id")
///     .build();
///
/// assert_eq!(
///     descriptor.resolved_template().as_deref(),
///     Some("GET /players/{playerId}/games/{gameId}{?take,skip,limit}")
/// );
/// ```
#[derive(Clone, Default)]
pub struct EndpointDescriptor {
    template: Option<String>,
    method: Option<RestMethod>,
    path: Option<String>,
    schemas: Buckets<Option<Arc<dyn Schema>>>,
    alias: AliasTable,
    on_request: Option<Arc<dyn RequestHook>>,
    on_response: Option<Arc<dyn ResponseHook>>,
}

impl fmt::Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("template", &self.template)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("schemas", &self.schemas)
            .field("alias", &self.alias)
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

impl EndpointDescriptor {
    pub fn builder() -> EndpointDescriptorBuilder {
        EndpointDescriptorBuilder::default()
    }

    /// The `"<METHOD> <path>"` template, taken from `template` or assembled
    /// from `method` and `path`. `None` when neither form is complete.
    pub fn resolved_template(&self) -> Option<String> {
        if let Some(template) = self.template.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(template.trim().to_string());
        }
        match (self.method, self.path.as_deref()) {
            (Some(method), Some(path)) if !path.trim().is_empty() => {
                Some(format!("{method} {}", path.trim()))
            }
            _ => None,
        }
    }

    pub fn schema(&self, bucket: BucketKind) -> Option<&Arc<dyn Schema>> {
        self.schemas.get(bucket).as_ref()
    }

    pub fn alias(&self) -> &AliasTable {
        &self.alias
    }

    pub fn request_hook(&self) -> Option<&Arc<dyn RequestHook>> {
        self.on_request.as_ref()
    }

    pub fn response_hook(&self) -> Option<&Arc<dyn ResponseHook>> {
        self.on_response.as_ref()
    }

    pub(crate) fn set_request_hook(&mut self, hook: Arc<dyn RequestHook>) {
        self.on_request = Some(hook);
    }

    pub(crate) fn set_response_hook(&mut self, hook: Arc<dyn ResponseHook>) {
        self.on_response = Some(hook);
    }

    /// Compiles every bucket schema into a lookup index.
    pub fn index(&self) -> SchemaIndex {
        SchemaIndex {
            buckets: Buckets::from_fn(|kind| {
                self.schema(kind)
                    .map(|schema| BucketIndex::new(Arc::clone(schema)))
            }),
        }
    }
}

/// Builder for [`EndpointDescriptor`].
#[derive(Debug, Default)]
pub struct EndpointDescriptorBuilder {
    descriptor: EndpointDescriptor,
}

impl EndpointDescriptorBuilder {
    /// Sets the `"<METHOD> <path>"` template.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.descriptor.template = Some(template.into());
        self
    }

    /// Sets the method, for descriptors written as method + path.
    pub fn method(mut self, method: RestMethod) -> Self {
        self.descriptor.method = Some(method);
        self
    }

    /// Sets the path, for descriptors written as method + path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.descriptor.path = Some(path.into());
        self
    }

    /// Sets the schema for a bucket.
    pub fn schema(mut self, bucket: BucketKind, schema: impl Schema + 'static) -> Self {
        *self.descriptor.schemas.get_mut(bucket) = Some(Arc::new(schema));
        self
    }

    /// Sets an already shared schema for a bucket.
    pub fn shared_schema(mut self, bucket: BucketKind, schema: Arc<dyn Schema>) -> Self {
        *self.descriptor.schemas.get_mut(bucket) = Some(schema);
        self
    }

    pub fn headers(self, schema: impl Schema + 'static) -> Self {
        self.schema(BucketKind::Headers, schema)
    }

    pub fn params(self, schema: impl Schema + 'static) -> Self {
        self.schema(BucketKind::Params, schema)
    }

    pub fn query(self, schema: impl Schema + 'static) -> Self {
        self.schema(BucketKind::Query, schema)
    }

    pub fn payload(self, schema: impl Schema + 'static) -> Self {
        self.schema(BucketKind::Payload, schema)
    }

    /// Lets callers pass `alternate` for the field named `canonical`, in any bucket.
    pub fn alias(mut self, canonical: impl Into<String>, alternate: impl Into<String>) -> Self {
        self.descriptor.alias.insert(canonical, alternate);
        self
    }

    /// Like [`alias`](Self::alias) but restricted to one bucket.
    pub fn bucket_alias(
        mut self,
        bucket: BucketKind,
        canonical: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        self.descriptor.alias.insert_for(bucket, canonical, alternate);
        self
    }

    /// Replaces the whole alias table.
    pub fn alias_table(mut self, alias: AliasTable) -> Self {
        self.descriptor.alias = alias;
        self
    }

    /// Installs the hook that sees (and may replace) every outgoing request.
    pub fn on_request(mut self, hook: impl RequestHook + 'static) -> Self {
        self.descriptor.on_request = Some(Arc::new(hook));
        self
    }

    /// Installs the hook that decides the final outcome of every call that
    /// reached the dispatcher.
    pub fn on_response(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.descriptor.on_response = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> EndpointDescriptor {
        self.descriptor
    }
}

/// Declared fields of one bucket schema, keyed by lower-cased name.
#[derive(Debug, Clone)]
pub struct BucketIndex {
    schema: Arc<dyn Schema>,
    fields: HashMap<String, FieldSpec>,
}

impl BucketIndex {
    fn new(schema: Arc<dyn Schema>) -> Self {
        let fields = schema
            .fields()
            .into_iter()
            .map(|spec| (spec.name.to_ascii_lowercase(), spec))
            .collect();
        Self { schema, fields }
    }

    /// Finds a declared field ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(&name.to_ascii_lowercase())
    }

    pub fn schema(&self) -> &Arc<dyn Schema> {
        &self.schema
    }
}

/// Compiled per-bucket field lookup for one descriptor.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    buckets: Buckets<Option<BucketIndex>>,
}

impl SchemaIndex {
    pub fn bucket(&self, kind: BucketKind) -> Option<&BucketIndex> {
        self.buckets.get(kind).as_ref()
    }

    /// Finds the field `name` declares in `kind`'s schema, ignoring case.
    pub fn lookup(&self, kind: BucketKind, name: &str) -> Option<&FieldSpec> {
        self.bucket(kind).and_then(|bucket| bucket.lookup(name))
    }
}
