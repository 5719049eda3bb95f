//! # Route Configuration
//!
//! The uncompiled form of a route. A `RouteConfig` is plain data: it can be
//! built in code with the builder methods or loaded from JSON, and turns into
//! an immutable [`Route`] exactly once via [`RouteConfig::compile`].
//!
//! ```
//! use routeforge_core::RouteConfig;
//!
//! let route = RouteConfig::new("/{:controller}/{:action}/{:id:[0-9]+}")
//!     .param("http:method", "GET")
//!     .compile()
//!     .unwrap();
//! assert_eq!(route.keys(), ["controller", "action", "id"]);
//! ```

use crate::error::Result;
use crate::handler::Handler;
use crate::route::Route;
use crate::transform::Transforms;
use crate::types::{ParamValue, Params};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Construction-time configuration of a route
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteConfig {
    /// URL template, e.g. `/{:controller}/{:action}/{:args}`
    pub template: String,
    /// Pre-compiled pattern; when set the template is not compiled and
    /// `keys`, `defaults` and `match` are used as given
    pub pattern: Option<String>,
    /// Initial parameters: template keys get defaults, other keys become
    /// `match` constraints, namespaced keys (`http:method`) become `meta`
    pub params: Params,
    /// Match constraints (pre-compiled mode)
    #[serde(rename = "match")]
    pub match_params: Params,
    /// Request metadata constraints
    pub meta: Params,
    /// Default key values (pre-compiled mode)
    pub defaults: Params,
    /// Template keys (pre-compiled mode)
    pub keys: Vec<String>,
    /// Parameter names that persist once this route matched
    pub persist: Vec<String>,
    /// Continuation route: leaves `{:args}` unresolved so routing can chain
    #[serde(rename = "continue")]
    pub continuation: bool,
    /// Key -> transform name applied to captured values
    pub modifiers: BTreeMap<String, String>,
    /// Key -> transform name applied to option values when generating
    pub formatters: BTreeMap<String, String>,
    /// Unicode-aware matching
    pub unicode: bool,
    /// Post-match delegate
    #[serde(skip)]
    pub handler: Option<Arc<dyn Handler>>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            template: "/".to_string(),
            pattern: None,
            params: Params::new(),
            match_params: Params::new(),
            meta: Params::new(),
            defaults: Params::new(),
            keys: Vec::new(),
            persist: Vec::new(),
            continuation: false,
            modifiers: BTreeMap::new(),
            formatters: BTreeMap::new(),
            unicode: true,
            handler: None,
        }
    }
}

impl RouteConfig {
    /// Configuration for `template` with everything else defaulted
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for malformed JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add an initial parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Supply a pre-compiled pattern
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Add a metadata constraint
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Set the persisted parameter names
    #[must_use]
    pub fn persist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Mark as a continuation route
    #[must_use]
    pub fn continuation(mut self, continuation: bool) -> Self {
        self.continuation = continuation;
        self
    }

    /// Bind a modifier to a key
    #[must_use]
    pub fn modifier(mut self, key: impl Into<String>, transform: impl Into<String>) -> Self {
        self.modifiers.insert(key.into(), transform.into());
        self
    }

    /// Bind a formatter to a key
    #[must_use]
    pub fn formatter(mut self, key: impl Into<String>, transform: impl Into<String>) -> Self {
        self.formatters.insert(key.into(), transform.into());
        self
    }

    /// Toggle unicode-aware matching
    #[must_use]
    pub fn unicode(mut self, unicode: bool) -> Self {
        self.unicode = unicode;
        self
    }

    /// Attach a post-match handler
    #[must_use]
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Compile with the built-in transforms
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn compile(self) -> Result<Route> {
        Route::new(self)
    }

    /// Compile resolving transforms against `transforms`
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn compile_with(self, transforms: &Transforms) -> Result<Route> {
        Route::with_transforms(self, transforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults() {
        let config = RouteConfig::default();
        assert_eq!(config.template, "/");
        assert!(config.unicode);
        assert!(!config.continuation);
        assert!(config.handler.is_none());
    }

    #[test]
    fn test_from_json() {
        let config = RouteConfig::from_json(
            r#"{
                "template": "/{:controller}/{:id:[0-9]+}",
                "params": {"action": "view", "http:method": ["GET", "HEAD"]},
                "continue": false,
                "modifiers": {"controller": "camelize"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.template, "/{:controller}/{:id:[0-9]+}");
        assert_eq!(config.params["action"], ParamValue::from("view"));
        assert_eq!(config.modifiers["controller"], "camelize");
        assert!(config.unicode);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = RouteConfig::from_json(r#"{"templat": "/x"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_builder() {
        let config = RouteConfig::new("/admin/{:args}")
            .continuation(true)
            .param("admin", true)
            .persist(["admin"])
            .formatter("args", "lowercase");
        assert!(config.continuation);
        assert_eq!(config.persist, ["admin"]);
        assert_eq!(config.params["admin"], ParamValue::Bool(true));
    }
}
