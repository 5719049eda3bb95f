//! # Value Transforms
//!
//! Named, pure string transforms bound to route keys.
//!
//! Routes refer to transforms by name (`"modifiers": {"controller": "camelize"}`)
//! and resolve them once at construction, so a compiled route only carries a
//! name and a plain function pointer. Modifiers run on captured values while
//! matching; formatters run on option values while generating.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Signature of a value transform
pub type TransformFn = fn(&str) -> String;

/// Built-in transforms, shared by every route compiled without a custom registry
static BUILTIN: Lazy<Transforms> = Lazy::new(Transforms::builtin);

/// A transform resolved for one route key
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: TransformFn,
}

impl Transform {
    /// Registered name of the transform
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the transform
    #[must_use]
    pub fn apply(&self, value: &str) -> String {
        (self.func)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}

/// Registry of named transforms
#[derive(Clone)]
pub struct Transforms {
    entries: HashMap<String, TransformFn>,
}

impl Default for Transforms {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl Transforms {
    /// Registry pre-populated with the built-in transforms:
    /// `lowercase`, `uppercase`, `camelize`, `underscore`, `urlencode`, `urldecode`
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("lowercase", |v| v.to_lowercase());
        registry.register("uppercase", |v| v.to_uppercase());
        registry.register("camelize", camelize);
        registry.register("underscore", underscore);
        registry.register("urlencode", |v| urlencoding::encode(v).into_owned());
        registry.register("urldecode", |v| {
            urlencoding::decode(v).map_or_else(|_| v.to_string(), |d| d.into_owned())
        });
        registry
    }

    /// Registry with no transforms at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) a transform under `name`
    pub fn register(&mut self, name: impl Into<String>, func: TransformFn) -> &mut Self {
        self.entries.insert(name.into(), func);
        self
    }

    /// Check if a transform is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve `name` for route key `key`
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownTransform` if nothing is registered under `name`.
    pub fn resolve(&self, key: &str, name: &str) -> Result<Transform> {
        self.entries
            .get(name)
            .map(|&func| Transform {
                name: name.to_string(),
                func,
            })
            .ok_or_else(|| Error::UnknownTransform {
                key: key.to_string(),
                name: name.to_string(),
            })
    }
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Transforms").field("names", &names).finish()
    }
}

/// `blog_posts` -> `BlogPosts`
fn camelize(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// `BlogPosts` -> `blog_posts`
fn underscore(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut prev_lower = false;
    for c in value.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
        } else if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = Transforms::default();
        for name in [
            "lowercase",
            "uppercase",
            "camelize",
            "underscore",
            "urlencode",
            "urldecode",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_camelize_underscore() {
        assert_eq!(camelize("blog_posts"), "BlogPosts");
        assert_eq!(camelize("users"), "Users");
        assert_eq!(underscore("BlogPosts"), "blog_posts");
        assert_eq!(underscore("users"), "users");
    }

    #[test]
    fn test_url_transforms() {
        let registry = Transforms::default();
        let encode = registry.resolve("q", "urlencode").unwrap();
        let decode = registry.resolve("q", "urldecode").unwrap();
        assert_eq!(encode.apply("a b"), "a%20b");
        assert_eq!(decode.apply("a%20b"), "a b");
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = Transforms::empty();
        let err = registry.resolve("id", "double").unwrap_err();
        assert!(matches!(err, Error::UnknownTransform { .. }));
    }

    #[test]
    fn test_register_custom() {
        let mut registry = Transforms::empty();
        registry.register("reverse", |v| v.chars().rev().collect());
        let t = registry.resolve("slug", "reverse").unwrap();
        assert_eq!(t.name(), "reverse");
        assert_eq!(t.apply("abc"), "cba");
    }
}
