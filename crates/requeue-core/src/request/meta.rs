//! Request metadata: an opaque key/value map with typed access to the
//! reserved retry keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller opt-out: when true, no retry is ever attempted for the request.
pub const DONT_RETRY: &str = "dont_retry";
/// Attempts already made. Absent means zero.
pub const RETRY_TIMES: &str = "retry_times";
/// Per-request replacement for the policy's maximum retry count.
pub const MAX_RETRY_TIMES: &str = "max_retry_times";

/// Arbitrary request attributes. Only the reserved keys above have meaning
/// to the retry engine; everything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta(Map<String, Value>);

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a flag by truthiness: `null`, `false`, zero and empty
    /// strings, arrays or objects are false; anything else is true.
    /// Absent means false.
    pub fn get_flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }

    /// Read a non-negative count that fits in `u32`.
    pub fn get_count(&self, key: &str) -> Option<u32> {
        let value = self.0.get(key)?;
        if value.is_null() {
            return None;
        }
        let parsed = value.as_u64().and_then(|n| u32::try_from(n).ok());
        if parsed.is_none() {
            tracing::warn!(key, value = %value, "ignoring meta value that is not a valid count");
        }
        parsed
    }

    /// Read a signed limit. Only `null` or a missing key count as absent.
    ///
    /// Fractions round down, booleans read as 0 or 1, and values past the
    /// `i64` range saturate. Any other value is a limit of 0.
    pub fn get_limit(&self, key: &str) -> Option<i64> {
        let value = self.0.get(key)?;
        let limit = match value {
            Value::Null => return None,
            Value::Bool(b) => i64::from(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => i,
                (None, Some(_)) => i64::MAX,
                // Saturating cast; NaN cannot come out of JSON.
                (None, None) => n.as_f64().map_or(0, |f| f.floor() as i64),
            },
            other => {
                tracing::warn!(key, value = %other, "meta value is not a number; treating limit as 0");
                0
            }
        };
        Some(limit)
    }
}

impl From<Map<String, Value>> for Meta {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Meta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
