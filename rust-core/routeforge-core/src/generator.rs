//! # Generator
//!
//! Reverse routing: turns a parameter set back into a path for a compiled
//! route, with strict key checks.
//!
//! ## Pipeline
//!
//! 1. Implicit options (`action`, `http:method`) and query extraction
//! 2. Method check against the route's `http:method` constraint
//! 3. Key checks: `match` constraints, surplus/missing keys, defaults
//! 4. Formatters, then sub-pattern validation
//! 5. Template rewrite: right-edge default trimming, null removal,
//!    substitution

use crate::error::Mismatch;
use crate::request::METHOD_KEY;
use crate::route::{Route, ACTION_KEY, DEFAULT_ACTION};
use crate::template::{Capture, Segment, WILDCARD};
use crate::types::{ParamValue, Params};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Literal left in place of the wildcard by continuation routes
pub const WILDCARD_TOKEN: &str = "{:args}";

/// Query string attached to a generated path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    /// Already encoded, appended verbatim
    Encoded(String),
    /// Key/value pairs, form-encoded
    Pairs(BTreeMap<String, String>),
}

impl Query {
    /// Render as `?…`, or nothing when empty
    #[must_use]
    pub fn to_suffix(&self) -> String {
        let encoded = match self {
            Self::Encoded(raw) => raw.clone(),
            Self::Pairs(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
                .collect::<Vec<_>>()
                .join("&"),
        };
        if encoded.is_empty() {
            encoded
        } else {
            format!("?{encoded}")
        }
    }
}

/// Spaces as `+`, everything else percent-encoded
fn form_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Parameters for reverse routing.
///
/// Deserializes from a flat object where `"?"` holds the query and
/// `"scope"` lists extra names a route may ignore.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UrlOptions {
    /// Query string for the generated path
    #[serde(rename = "?", default)]
    pub query: Option<Query>,
    /// Names accepted without being route keys
    #[serde(default)]
    pub scope: Option<Vec<String>>,
    /// Key values; `Null` removes the segment
    #[serde(flatten)]
    pub params: Params,
}

impl UrlOptions {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set a parameter to `Null`
    #[must_use]
    pub fn null(mut self, key: impl Into<String>) -> Self {
        self.params.insert(key.into(), ParamValue::Null);
        self
    }

    /// Attach a query
    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Allow extra names
    #[must_use]
    pub fn scope<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

impl From<Params> for UrlOptions {
    fn from(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }
}

/// Result of reverse routing
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    /// A complete path, query included
    Path(String),
    /// Partial result of a continuation route
    Continuation {
        /// Rewritten template with the wildcard token left in place
        template: String,
        /// Resolved options, for the route generating the remainder
        params: Params,
        /// Query carried along untouched
        query: Option<Query>,
    },
}

impl Generated {
    /// The path, or the partial template for a continuation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Continuation { template, .. } => template,
        }
    }
}

fn implicit_options() -> [(&'static str, ParamValue); 2] {
    [
        (ACTION_KEY, ParamValue::from(DEFAULT_ACTION)),
        (METHOD_KEY, ParamValue::from("GET")),
    ]
}

/// Working copy of the template during rewrite
enum Piece<'a> {
    Text(Cow<'a, str>),
    Token(&'a Capture),
}

impl Route {
    /// Generate a path from `options`.
    ///
    /// # Errors
    ///
    /// - `Mismatch::ConstraintMismatch` - method or `match` constraint failed
    /// - `Mismatch::SurplusKey` - an option the route does not accept
    /// - `Mismatch::MissingKey` - a declared key without value or default
    /// - `Mismatch::SubPatternViolation` - a value its sub-pattern rejects
    pub fn generate(&self, options: impl Into<UrlOptions>) -> Result<Generated, Mismatch> {
        let result = self.generate_inner(options.into());
        match &result {
            Ok(generated) => {
                debug!(template = %self.template, path = %generated.as_str(), "URL generated");
            }
            Err(reason) => {
                trace!(template = %self.template, reason = %reason, "Route cannot generate");
            }
        }
        result
    }

    fn generate_inner(&self, options: UrlOptions) -> Result<Generated, Mismatch> {
        let UrlOptions {
            query,
            scope,
            mut params,
        } = options;

        if !self.continuation {
            for (key, value) in implicit_options() {
                params.entry(key.to_string()).or_insert(value);
            }
        }

        self.match_method(&mut params)?;
        let mut params = self.match_keys(params, scope.as_deref().unwrap_or_default())?;

        for (key, formatter) in &self.formatters {
            if let Some(value) = params.get_mut(key).filter(|v| !v.is_null()) {
                *value = ParamValue::String(formatter.apply(&value.as_string()));
            }
        }

        for (key, sub_pattern) in &self.sub_patterns {
            if let Some(value) = params.get(key).filter(|v| !v.is_null()) {
                if !sub_pattern.is_match(&value.as_string()) {
                    return Err(Mismatch::SubPatternViolation { key: key.clone() });
                }
            }
        }

        if self.continuation {
            let mut pinned = params.clone();
            pinned.insert(WILDCARD.to_string(), ParamValue::from(WILDCARD_TOKEN));
            return Ok(Generated::Continuation {
                template: self.write(&pinned, &self.defaults),
                params,
                query,
            });
        }

        let mut defaults = self.defaults.clone();
        for (key, value) in implicit_options() {
            defaults.entry(key.to_string()).or_insert(value);
        }
        defaults
            .entry(WILDCARD.to_string())
            .or_insert_with(|| ParamValue::from(""));

        let mut path = self.write(&params, &defaults);
        if let Some(query) = &query {
            path.push_str(&query.to_suffix());
        }
        Ok(Generated::Path(path))
    }

    /// The method option must satisfy the route's method constraint, if any.
    /// The option is consumed either way.
    fn match_method(&self, params: &mut Params) -> Result<(), Mismatch> {
        let given = params.remove(METHOD_KEY).filter(|v| !v.is_null());
        if let Some(required) = self.meta.get(METHOD_KEY) {
            let given = given.map(|v| v.as_string());
            if !required.admits(given.as_deref()) {
                return Err(Mismatch::ConstraintMismatch {
                    key: METHOD_KEY.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Verify the options cover this route exactly, then merge defaults.
    fn match_keys(&self, mut params: Params, scope: &[String]) -> Result<Params, Mismatch> {
        for (key, expected) in &self.match_params {
            if !params.get(key).is_some_and(|v| v.loose_eq(expected)) {
                return Err(Mismatch::ConstraintMismatch { key: key.clone() });
            }
        }

        if self.continuation {
            if let Some(key) = self.unresolved_key(&params) {
                return Err(Mismatch::MissingKey { key: key.clone() });
            }
        } else if let Some(key) = params.keys().find(|key| {
            !self.match_params.contains_key(*key)
                && !self.keys.contains(*key)
                && !scope.contains(*key)
        }) {
            return Err(Mismatch::SurplusKey { key: key.clone() });
        }

        for (key, value) in &self.defaults {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if let Some(key) = self.unresolved_key(&params) {
            return Err(Mismatch::MissingKey { key: key.clone() });
        }
        Ok(params)
    }

    /// First declared key, wildcard excepted, with no entry in `params`
    fn unresolved_key(&self, params: &Params) -> Option<&String> {
        self.keys
            .iter()
            .find(|key| key.as_str() != WILDCARD && !params.contains_key(*key))
    }

    /// Rewrite the template with `params`.
    ///
    /// Keys are visited right to left. While trimming, a key whose value
    /// equals its default and whose token ends the template is dropped along
    /// with trailing slashes. A null or absent value drops the token and its
    /// separator anywhere. Any other value is substituted; substituting a
    /// non-wildcard key ends trimming.
    fn write(&self, params: &Params, defaults: &Params) -> String {
        let mut pieces: Vec<Piece<'_>> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => Piece::Text(Cow::Borrowed(text)),
                Segment::Capture(capture) => Piece::Token(capture),
            })
            .collect();
        let mut trimming = true;

        for key in self.keys.iter().rev() {
            let value = match params.get(key) {
                Some(value) if !value.is_null() => Some(value),
                Some(_) => None,
                None if key == WILDCARD => defaults.get(key),
                None => None,
            };
            let wildcard = key == WILDCARD;

            let position = pieces
                .iter()
                .position(|piece| matches!(piece, Piece::Token(c) if c.name == *key));
            let Some(position) = position else {
                if value.is_some() && !wildcard {
                    trimming = false;
                }
                continue;
            };

            if trimming && position + 1 == pieces.len() {
                let is_default = defaults
                    .get(key)
                    .filter(|d| !d.is_null())
                    .zip(value)
                    .is_some_and(|(default, value)| value.loose_eq(default));
                if is_default {
                    pieces.pop();
                    trim_trailing_slashes(&mut pieces);
                    continue;
                }
            }

            let Some(value) = value else {
                pieces.remove(position);
                continue;
            };
            if !wildcard {
                trimming = false;
            }
            let rendered = match &pieces[position] {
                Piece::Token(capture) => capture.render(&value.as_string()),
                Piece::Text(text) => text.to_string(),
            };
            pieces[position] = Piece::Text(Cow::Owned(rendered));
        }

        let path: String = pieces
            .iter()
            .map(|piece| match piece {
                Piece::Text(text) => Cow::Borrowed(text.as_ref()),
                Piece::Token(capture) => Cow::Owned(capture.render(&capture.token())),
            })
            .collect();

        if path.is_empty() {
            "/".to_string()
        } else {
            path
        }
    }
}

fn trim_trailing_slashes(pieces: &mut Vec<Piece<'_>>) {
    loop {
        let Some(Piece::Text(text)) = pieces.last_mut() else {
            break;
        };
        let kept = text.trim_end_matches('/').len();
        if kept > 0 {
            if kept < text.len() {
                text.to_mut().truncate(kept);
            }
            break;
        }
        pieces.pop();
    }
}
