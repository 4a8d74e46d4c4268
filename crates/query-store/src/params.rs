//! Ordered request parameters.
//!
//! Parameter order is insertion order so generated URLs are deterministic.
//! A name may carry several values (repeated filters on the same column).

use indexmap::IndexMap;

/// Wire-format parameters, keyed by parameter name.
pub type ParamMap = IndexMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParamValue {
    /// Add another value, promoting a single value to a list.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(v) => vec![v.as_str()],
            Self::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// The value when exactly one is present.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v),
            Self::Multiple(_) => None,
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

/// Set `name`, replacing any previous value.
pub fn set_param(params: &mut ParamMap, name: impl Into<String>, value: impl Into<ParamValue>) {
    params.insert(name.into(), value.into());
}

/// Append to `name`, accumulating into a list when it is already present.
pub fn append_param(params: &mut ParamMap, name: impl Into<String>, value: String) {
    match params.entry(name.into()) {
        indexmap::map::Entry::Occupied(mut e) => e.get_mut().push(value),
        indexmap::map::Entry::Vacant(e) => {
            e.insert(ParamValue::Single(value));
        }
    }
}

/// Copy every entry of `other` whose name is not yet in `params`.
pub fn apply_if_absent(params: &mut ParamMap, other: &ParamMap) {
    for (name, value) in other {
        if !params.contains_key(name) {
            params.insert(name.clone(), value.clone());
        }
    }
}
