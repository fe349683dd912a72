//! Argument buckets.
//!
//! Every call argument ends up in at most one of four buckets, each with its
//! own schema. The declaration order of [`BucketKind`] is the classification
//! priority.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A flat JSON object of named values, as supplied by callers and produced by
/// validation.
pub type Args = serde_json::Map<String, serde_json::Value>;

/// The four argument classes.
///
/// ## Examples
///
/// ```rust
/// use rest_service::BucketKind;
///
/// assert_eq!(BucketKind::PRIORITY[0], BucketKind::Headers);
/// assert_eq!(BucketKind::Query.to_string(), "query");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// Request headers.
    Headers,
    /// Path parameters substituted into the template.
    Params,
    /// Query-string parameters.
    Query,
    /// JSON request body fields.
    Payload,
}

impl BucketKind {
    /// Classification order: a key declared by several buckets goes to the
    /// earliest one.
    pub const PRIORITY: [BucketKind; 4] = [Self::Headers, Self::Params, Self::Query, Self::Payload];

    /// Position of this bucket in [`BucketKind::PRIORITY`].
    pub fn index(self) -> usize {
        match self {
            Self::Headers => 0,
            Self::Params => 1,
            Self::Query => 2,
            Self::Payload => 3,
        }
    }
}

/// One value per bucket, indexed by [`BucketKind`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Buckets<T> {
    slots: [T; 4],
}

impl<T> Buckets<T> {
    /// Builds a set of buckets by calling `f` for each kind in priority order.
    pub fn from_fn(mut f: impl FnMut(BucketKind) -> T) -> Self {
        Self {
            slots: BucketKind::PRIORITY.map(&mut f),
        }
    }

    /// Returns the value for a bucket.
    pub fn get(&self, kind: BucketKind) -> &T {
        &self.slots[kind.index()]
    }

    /// Returns the value for a bucket mutably.
    pub fn get_mut(&mut self, kind: BucketKind) -> &mut T {
        &mut self.slots[kind.index()]
    }

    /// Iterates `(kind, value)` pairs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (BucketKind, &T)> {
        BucketKind::PRIORITY.into_iter().zip(self.slots.iter())
    }

    /// Consumes the buckets, yielding values in priority order.
    pub fn into_array(self) -> [T; 4] {
        self.slots
    }
}

/// Classified or validated call arguments, one object per bucket.
pub type BucketArgs = Buckets<Args>;

impl BucketArgs {
    /// Headers bucket.
    pub fn headers(&self) -> &Args {
        self.get(BucketKind::Headers)
    }

    /// Path parameter bucket.
    pub fn params(&self) -> &Args {
        self.get(BucketKind::Params)
    }

    /// Query bucket.
    pub fn query(&self) -> &Args {
        self.get(BucketKind::Query)
    }

    /// Payload bucket.
    pub fn payload(&self) -> &Args {
        self.get(BucketKind::Payload)
    }
}

/// Renders a value the way it appears in a URL or header: strings verbatim,
/// whole numbers without a fractional part, everything else as compact JSON.
pub(crate) fn plain_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            // below 1e21 a whole float prints as plain digits
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
                (f as i128).to_string()
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
