//! # Request Carrier
//!
//! The request-like object routes match against: a raw URL, metadata lookups,
//! a mutable parameter bag and the set of persisted parameter names.
//!
//! Only what routing needs is modelled here; the HTTP transport that fills it
//! lives elsewhere.

use crate::error::{Error, Result};
use crate::types::{ParamValue, Params};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Metadata key resolving to the request method
pub const METHOD_KEY: &str = "http:method";

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// HTTP GET
    #[default]
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

impl Method {
    /// Canonical upper-case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(Error::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// Source of request metadata consulted by `meta` constraints
pub trait MetaLookup {
    /// Value for a namespaced key such as `http:method`
    fn lookup(&self, key: &str) -> Option<String>;
}

impl MetaLookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl MetaLookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Request carrier threaded through route matching
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Raw request path (without query string)
    url: String,
    /// Additional metadata (`http:host`, `env:HTTPS`, ...)
    meta: HashMap<String, String>,
    /// Parameters bound by routing so far
    pub params: Params,
    /// Parameter names that persist into generated URLs
    pub persist: Vec<String>,
}

impl Request {
    /// Create a request for `method` and `url`
    ///
    /// A query string, if present, is stripped from the path.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if let Some(pos) = url.find('?') {
            url.truncate(pos);
        }
        Self {
            method,
            url,
            ..Self::default()
        }
    }

    /// Attach a metadata value
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Request path
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Metadata value by key; `http:method` resolves to the method
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        if key == METHOD_KEY {
            return Some(self.method.to_string());
        }
        self.meta.get(key).cloned()
    }

    /// Bound parameter by name
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Merge `bound` into the parameter bag.
    ///
    /// Existing entries win: a name already present is left unchanged and
    /// only absent names are filled from `bound`. Chained routes rely on this.
    pub fn merge_params(&mut self, bound: Params) {
        for (key, value) in bound {
            self.params.entry(key).or_insert(value);
        }
    }

    /// Append persisted names, skipping ones already carried
    pub fn extend_persist<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        for name in names {
            if !self.persist.contains(name) {
                self.persist.push(name.clone());
            }
        }
    }
}

impl MetaLookup for Request {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key)
    }
}
