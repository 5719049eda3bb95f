//! # Route
//!
//! A compiled URL template. Construction parses the template, synthesizes
//! the anchored matching pattern and derives keys, defaults and constraints;
//! afterwards the route is read-only and shared freely between threads.
//!
//! Matching lives in `matcher`, reverse generation in `generator`.

use crate::config::RouteConfig;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::template::{self, Segment, ROOT_PATTERN, WILDCARD};
use crate::transform::{Transform, Transforms};
use crate::types::{ParamValue, Params};
use regex::bytes::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Key of the implicit action parameter
pub const ACTION_KEY: &str = "action";
/// Implicit action value
pub const DEFAULT_ACTION: &str = "index";
/// Key persisted by default
pub const CONTROLLER_KEY: &str = "controller";

/// A user-declared sub-pattern with its anchored compiled form
#[derive(Clone)]
pub struct SubPattern {
    source: String,
    regex: Regex,
}

impl SubPattern {
    fn compile(key: &str, source: &str, unicode: bool) -> Result<Self> {
        let regex = RegexBuilder::new(&format!("^(?:{source})$"))
            .unicode(unicode)
            .build()
            .map_err(|e| Error::malformed(format!("{{:{key}:{source}}}"), e))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Regex as declared in the template
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `value` matches the whole sub-pattern
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value.as_bytes())
    }
}

impl fmt::Debug for SubPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubPattern").field(&self.source).finish()
    }
}

/// A compiled route
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) template: String,
    pub(crate) segments: Vec<Segment>,
    pub(crate) pattern: Regex,
    pub(crate) keys: Vec<String>,
    pub(crate) params: Params,
    pub(crate) defaults: Params,
    pub(crate) match_params: Params,
    pub(crate) meta: Params,
    pub(crate) sub_patterns: BTreeMap<String, SubPattern>,
    pub(crate) persist: Vec<String>,
    pub(crate) handler: Option<Arc<dyn Handler>>,
    pub(crate) continuation: bool,
    pub(crate) modifiers: BTreeMap<String, Transform>,
    pub(crate) formatters: BTreeMap<String, Transform>,
}

/// Serializable snapshot of a route, for debugging and introspection
#[derive(Debug, Clone, Serialize)]
pub struct RouteExport {
    /// URL template
    pub template: String,
    /// Pattern source
    pub pattern: String,
    /// Retained positional params
    pub params: Params,
    /// Match constraints
    #[serde(rename = "match")]
    pub match_params: Params,
    /// Metadata constraints
    pub meta: Params,
    /// Keys in template order
    pub keys: Vec<String>,
    /// Key defaults
    pub defaults: Params,
    /// Declared sub-patterns
    pub sub_patterns: BTreeMap<String, String>,
    /// Persisted names
    pub persist: Vec<String>,
    /// Continuation flag
    #[serde(rename = "continue")]
    pub continuation: bool,
    /// Handler name, if any
    pub handler: Option<&'static str>,
}

impl Route {
    /// Compile `config` with the built-in transforms
    ///
    /// # Errors
    ///
    /// - `Error::MalformedPattern` if the template, a sub-pattern or a
    ///   pre-compiled pattern cannot be compiled
    /// - `Error::UnknownTransform` if a modifier or formatter is not registered
    pub fn new(config: RouteConfig) -> Result<Self> {
        Self::with_transforms(config, &Transforms::default())
    }

    /// Compile `config`, resolving modifiers and formatters in `transforms`
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn with_transforms(config: RouteConfig, transforms: &Transforms) -> Result<Self> {
        let RouteConfig {
            template,
            pattern,
            mut params,
            match_params,
            mut meta,
            defaults,
            keys,
            persist,
            continuation,
            modifiers,
            formatters,
            unicode,
            handler,
        } = config;

        let segments = if template::is_root(&template) {
            Vec::new()
        } else {
            template::tokenize(&template)?
        };

        let constrained_action = template::captures(&segments)
            .any(|c| c.name == ACTION_KEY && c.pattern.is_some());
        if !continuation && !constrained_action {
            params
                .entry(ACTION_KEY.to_string())
                .or_insert_with(|| ParamValue::from(DEFAULT_ACTION));
        }

        let mut sub_patterns = BTreeMap::new();
        for capture in template::captures(&segments) {
            if let Some(source) = &capture.pattern {
                sub_patterns.insert(
                    capture.name.clone(),
                    SubPattern::compile(&capture.name, source, unicode)?,
                );
            }
        }

        let compiled = match pattern {
            Some(source) => {
                let keys = if keys.is_empty() {
                    template::captures(&segments).map(|c| c.name.clone()).collect()
                } else {
                    keys
                };
                Compiled {
                    source,
                    keys,
                    params,
                    defaults,
                    match_params,
                }
            }
            None => {
                let (meta_params, params): (Params, Params) =
                    params.into_iter().partition(|(key, _)| is_meta_key(key));
                meta.extend(meta_params);
                compile_template(&template, &segments, params)?
            }
        };

        let pattern = RegexBuilder::new(&compiled.source)
            .unicode(unicode)
            .build()
            .map_err(|e| Error::malformed(&compiled.source, e))?;

        let persist = if persist.is_empty()
            && (compiled.keys.iter().any(|k| k == CONTROLLER_KEY)
                || compiled.params.contains_key(CONTROLLER_KEY))
        {
            vec![CONTROLLER_KEY.to_string()]
        } else {
            persist
        };

        let resolve = |bindings: BTreeMap<String, String>| -> Result<BTreeMap<String, Transform>> {
            bindings
                .into_iter()
                .map(|(key, name)| {
                    let transform = transforms.resolve(&key, &name)?;
                    Ok((key, transform))
                })
                .collect()
        };
        let modifiers = resolve(modifiers)?;
        let formatters = resolve(formatters)?;

        debug!(
            template = %template,
            pattern = %compiled.source,
            keys = ?compiled.keys,
            "Route compiled"
        );

        Ok(Self {
            template,
            segments,
            pattern,
            keys: compiled.keys,
            params: compiled.params,
            defaults: compiled.defaults,
            match_params: compiled.match_params,
            meta,
            sub_patterns,
            persist,
            handler,
            continuation,
            modifiers,
            formatters,
        })
    }

    /// URL template
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Anchored pattern source
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Keys in template order
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Retained positional params
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Key defaults
    #[must_use]
    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    /// Match constraints
    #[must_use]
    pub fn match_params(&self) -> &Params {
        &self.match_params
    }

    /// Metadata constraints
    #[must_use]
    pub fn meta(&self) -> &Params {
        &self.meta
    }

    /// Sub-pattern declared for `key`
    #[must_use]
    pub fn sub_pattern(&self, key: &str) -> Option<&SubPattern> {
        self.sub_patterns.get(key)
    }

    /// Persisted parameter names
    #[must_use]
    pub fn persist(&self) -> &[String] {
        &self.persist
    }

    /// Returns a boolean value indicating whether this is a continuation route
    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.continuation
    }

    /// Snapshot of the route's properties
    #[must_use]
    pub fn export(&self) -> RouteExport {
        RouteExport {
            template: self.template.clone(),
            pattern: self.pattern().to_string(),
            params: self.params.clone(),
            match_params: self.match_params.clone(),
            meta: self.meta.clone(),
            keys: self.keys.clone(),
            defaults: self.defaults.clone(),
            sub_patterns: self
                .sub_patterns
                .iter()
                .map(|(k, p)| (k.clone(), p.source().to_string()))
                .collect(),
            persist: self.persist.clone(),
            continuation: self.continuation,
            handler: self.handler.as_ref().map(|h| h.name()),
        }
    }
}

/// Output of template compilation
struct Compiled {
    source: String,
    keys: Vec<String>,
    params: Params,
    defaults: Params,
    match_params: Params,
}

/// Namespaced keys (`http:method`) are metadata constraints.
///
/// A leading colon does not count as a namespace.
fn is_meta_key(key: &str) -> bool {
    key.find(':').is_some_and(|pos| pos > 0)
}

fn compile_template(template: &str, segments: &[Segment], params: Params) -> Result<Compiled> {
    if segments.is_empty() {
        return Ok(Compiled {
            source: ROOT_PATTERN.to_string(),
            keys: Vec::new(),
            defaults: Params::new(),
            match_params: params.clone(),
            params,
        });
    }

    let mut keys: Vec<String> = Vec::new();
    for capture in template::captures(segments) {
        if keys.contains(&capture.name) {
            return Err(Error::malformed(
                template,
                format!("duplicate capture name `{}`", capture.name),
            ));
        }
        keys.push(capture.name.clone());
    }

    let source = template::synthesize(segments, |capture| {
        capture.name == WILDCARD || params.contains_key(&capture.name)
    });

    let (defaults, match_params): (Params, Params) = params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(key, _)| keys.contains(key));

    Ok(Compiled {
        source,
        keys,
        params,
        defaults,
        match_params,
    })
}
