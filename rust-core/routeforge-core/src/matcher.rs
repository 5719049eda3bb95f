//! # Matcher
//!
//! Applies a compiled route to an inbound path.
//!
//! [`Route::bind`] is the pure part: path + metadata in, bound parameters out.
//! [`Route::parse`] additionally merges the result into a [`Request`], extends
//! its persist set and runs the route handler.

use crate::error::Mismatch;
use crate::handler::Dispatch;
use crate::request::{MetaLookup, Request};
use crate::route::Route;
use crate::template::WILDCARD;
use crate::types::{ParamValue, Params};
use tracing::{debug, trace};

/// Normalize a path to a single leading slash and no trailing slash.
///
/// `"users/login/"` -> `"/users/login"`, `"///"` -> `"/"`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

impl Route {
    /// Match `path` and metadata, returning the bound parameter set.
    ///
    /// Captured values take priority over the route's params, which take
    /// priority over key defaults. An empty capture is dropped so the
    /// default applies; a wildcard that captured nothing binds to an empty
    /// list.
    ///
    /// # Errors
    ///
    /// - `Mismatch::NoStructuralMatch` if the path does not fit the pattern
    /// - `Mismatch::ConstraintMismatch` if a `meta` constraint fails
    pub fn bind(&self, path: &str, meta: &impl MetaLookup) -> Result<Params, Mismatch> {
        let result = self.bind_inner(path, meta);
        if let Err(reason) = &result {
            trace!(template = %self.template, path = %path, reason = %reason, "Route did not match");
        }
        result
    }

    fn bind_inner(&self, path: &str, meta: &impl MetaLookup) -> Result<Params, Mismatch> {
        let path = normalize_path(path);
        let captures = self
            .pattern
            .captures(path.as_bytes())
            .ok_or(Mismatch::NoStructuralMatch)?;

        for (key, expected) in &self.meta {
            if !expected.admits(meta.lookup(key).as_deref()) {
                return Err(Mismatch::ConstraintMismatch { key: key.clone() });
            }
        }

        let mut bound = Params::new();
        for key in &self.keys {
            match captures.name(key) {
                Some(raw) => {
                    let mut value = String::from_utf8_lossy(raw.as_bytes()).into_owned();
                    if let Some(modifier) = self.modifiers.get(key) {
                        value = modifier.apply(&value);
                    }
                    if !value.is_empty() {
                        bound.insert(key.clone(), ParamValue::String(value));
                    }
                }
                None if key == WILDCARD => {
                    bound.insert(key.clone(), ParamValue::List(Vec::new()));
                }
                None => {}
            }
        }

        for (key, value) in self.params.iter().chain(&self.defaults) {
            bound.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Ok(bound)
    }

    /// Match the request's own URL, see [`Route::parse_url`]
    ///
    /// # Errors
    ///
    /// Same as [`Route::bind`]; the request is left untouched on mismatch.
    pub fn parse(&self, request: &mut Request) -> Result<Dispatch, Mismatch> {
        let url = request.url().to_string();
        self.parse_url(request, &url)
    }

    /// Match `url` in place of the request's own path.
    ///
    /// On success the bound parameters are merged into `request.params`
    /// (existing entries win), the route's persisted names are appended to
    /// `request.persist`, and the handler, if any, decides the dispatch.
    ///
    /// # Errors
    ///
    /// Same as [`Route::bind`]; the request is left untouched on mismatch.
    pub fn parse_url(&self, request: &mut Request, url: &str) -> Result<Dispatch, Mismatch> {
        let bound = self.bind(url, &*request)?;
        request.merge_params(bound);
        request.extend_persist(&self.persist);

        debug!(
            template = %self.template,
            url = %url,
            params = ?request.params,
            "Route matched"
        );

        Ok(self
            .handler
            .as_ref()
            .map_or(Dispatch::Continue, |handler| handler.invoke(request)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::handler::{from_fn, Redirect, Response};
    use crate::request::Method;
    use crate::transform::Transforms;
    use crate::types::params_from;
    use std::collections::HashMap;

    fn no_meta() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("users/login/"), "/users/login");
        assert_eq!(normalize_path("///"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_controller_action() {
        let route = RouteConfig::new("/{:controller}/{:action}").compile().unwrap();
        let bound = route.bind("/users/login", &no_meta()).unwrap();
        assert_eq!(bound, params_from([("controller", "users"), ("action", "login")]));
    }

    #[test]
    fn test_default_fills_missing_capture() {
        let route = RouteConfig::new("/{:controller}/{:action}").compile().unwrap();
        let bound = route.bind("/users/", &no_meta()).unwrap();
        assert_eq!(bound, params_from([("controller", "users"), ("action", "index")]));
    }

    #[test]
    fn test_root_matches_only_slashes() {
        let route = RouteConfig::new("/").param("controller", "pages").compile().unwrap();
        assert!(route.bind("/", &no_meta()).is_ok());
        assert!(route.bind("", &no_meta()).is_ok());
        assert_eq!(
            route.bind("/about", &no_meta()),
            Err(Mismatch::NoStructuralMatch)
        );
    }

    #[test]
    fn test_sub_pattern_capture() {
        let route = RouteConfig::new("/photos/{:id:[0-9]+}.jpg").compile().unwrap();
        let bound = route.bind("/photos/42.jpg", &no_meta()).unwrap();
        assert_eq!(bound["id"], ParamValue::from("42"));
        assert!(route.bind("/photos/abc.jpg", &no_meta()).is_err());
        assert!(route.bind("/photos/42xjpg", &no_meta()).is_err());
    }

    #[test]
    fn test_wildcard_placeholder_and_capture() {
        let route = RouteConfig::new("/{:controller}/{:action}/{:args}")
            .compile()
            .unwrap();

        let bound = route.bind("/posts/view", &no_meta()).unwrap();
        assert_eq!(bound["args"], ParamValue::List(Vec::new()));

        let bound = route.bind("/posts/view/2024/05/hello", &no_meta()).unwrap();
        assert_eq!(bound["args"], ParamValue::from("2024/05/hello"));
    }

    #[test]
    fn test_dot_separator_optional() {
        let route = RouteConfig::new("/{:controller}/{:id:[0-9]+}.{:type}")
            .param("type", "html")
            .compile()
            .unwrap();

        let bound = route.bind("/posts/7.json", &no_meta()).unwrap();
        assert_eq!(bound["type"], ParamValue::from("json"));

        let bound = route.bind("/posts/7", &no_meta()).unwrap();
        assert_eq!(bound["id"], ParamValue::from("7"));
        assert_eq!(bound["type"], ParamValue::from("html"));
    }

    #[test]
    fn test_meta_constraint() {
        let route = RouteConfig::new("/login")
            .param("controller", "sessions")
            .param("http:method", ParamValue::List(vec!["POST".into(), "PUT".into()]))
            .compile()
            .unwrap();

        let post = Request::new(Method::Post, "/login");
        let get = Request::new(Method::Get, "/login");
        assert!(route.bind("/login", &post).is_ok());
        assert_eq!(
            route.bind("/login", &get),
            Err(Mismatch::ConstraintMismatch {
                key: "http:method".to_string()
            })
        );
    }

    #[test]
    fn test_modifier_applied() {
        let route = RouteConfig::new("/{:controller}")
            .modifier("controller", "camelize")
            .compile()
            .unwrap();
        let bound = route.bind("/blog_posts", &no_meta()).unwrap();
        assert_eq!(bound["controller"], ParamValue::from("BlogPosts"));
    }

    #[test]
    fn test_modifier_emptying_value_uses_default() {
        let mut transforms = Transforms::builtin();
        transforms.register("blank", |_| String::new());
        let route = RouteConfig::new("/{:controller}/{:action}")
            .modifier("action", "blank")
            .compile_with(&transforms)
            .unwrap();
        let bound = route.bind("/users/edit", &no_meta()).unwrap();
        assert_eq!(bound["action"], ParamValue::from("index"));
    }

    #[test]
    fn test_parse_merges_existing_wins_and_persists() {
        let route = RouteConfig::new("/{:controller}/{:action}").compile().unwrap();
        let mut request = Request::new(Method::Get, "/users/login");
        request.params.insert("action".into(), "preset".into());

        let dispatch = route.parse(&mut request).unwrap();
        assert_eq!(dispatch, Dispatch::Continue);
        assert_eq!(request.param("controller"), Some(&ParamValue::from("users")));
        assert_eq!(request.param("action"), Some(&ParamValue::from("preset")));
        assert_eq!(request.persist, ["controller"]);
    }

    #[test]
    fn test_parse_mismatch_leaves_request() {
        let route = RouteConfig::new("/posts/{:id:[0-9]+}").compile().unwrap();
        let mut request = Request::new(Method::Get, "/posts/new");
        assert!(route.parse(&mut request).is_err());
        assert!(request.params.is_empty());
        assert!(request.persist.is_empty());
    }

    #[test]
    fn test_persist_accumulates_without_duplicates() {
        let admin = RouteConfig::new("/admin/{:args}")
            .continuation(true)
            .param("admin", true)
            .persist(["admin", "locale"])
            .compile()
            .unwrap();
        let pages = RouteConfig::new("/{:controller}/{:action}").compile().unwrap();
        let localized = RouteConfig::new("/{:controller}/{:action}")
            .persist(["locale", "controller"])
            .compile()
            .unwrap();

        let mut request = Request::new(Method::Get, "/admin/users/edit");
        admin.parse(&mut request).unwrap();
        pages.parse_url(&mut request, "/users/edit").unwrap();
        localized.parse_url(&mut request, "/users/edit").unwrap();
        assert_eq!(request.persist, ["admin", "locale", "controller"]);
    }

    #[test]
    fn test_handler_result_replaces_dispatch() {
        let route = RouteConfig::new("/blog/{:slug}")
            .handler(Redirect::permanent("/articles/{:slug}"))
            .compile()
            .unwrap();
        let mut request = Request::new(Method::Get, "/blog/hello-world");
        let Dispatch::Respond(response) = route.parse(&mut request).unwrap() else {
            panic!("expected redirect");
        };
        assert_eq!(response.status, 301);
        assert_eq!(response.header("Location"), Some("/articles/hello-world"));
    }

    #[test]
    fn test_handler_sees_updated_request() {
        let route = RouteConfig::new("/photos/{:id:[0-9]+}.jpg")
            .handler(from_fn(|req: &mut Request| {
                let id = req.param("id").map(ParamValue::as_string).unwrap_or_default();
                Dispatch::Respond(Response::text(format!("photo {id}")))
            }))
            .compile()
            .unwrap();
        let mut request = Request::new(Method::Get, "/photos/42.jpg");
        assert_eq!(
            route.parse(&mut request).unwrap(),
            Dispatch::Respond(Response::text("photo 42"))
        );
    }

    #[test]
    fn test_match_is_deterministic() {
        let route = RouteConfig::new("/{:controller}/{:action}/{:args}")
            .param("http:method", "GET")
            .compile()
            .unwrap();
        let run = || {
            let mut request = Request::new(Method::Get, "/posts/view/1/2");
            request.params.insert("locale".into(), "en".into());
            route.parse(&mut request).unwrap();
            (request.params, request.persist)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_non_unicode_mode() {
        let route = RouteConfig::new("/tags/{:tag:\\w+}")
            .unicode(false)
            .compile()
            .unwrap();
        assert!(route.bind("/tags/rust", &no_meta()).is_ok());
        assert!(route.bind("/tags/größe", &no_meta()).is_err());

        let route = RouteConfig::new("/tags/{:tag:\\w+}").compile().unwrap();
        let bound = route.bind("/tags/größe", &no_meta()).unwrap();
        assert_eq!(bound["tag"], ParamValue::from("größe"));
    }

    #[test]
    fn test_precompiled_alias_pattern() {
        let mut config = RouteConfig::new("/users/{:user}")
            .pattern("^/u(?:sers)?(?:/(?P<user>[^/]+))$")
            .param("controller", "users");
        config.keys = vec!["user".to_string()];
        let route = config.compile().unwrap();

        for path in ["/users/nate", "/u/nate"] {
            let bound = route.bind(path, &no_meta()).unwrap();
            assert_eq!(bound["user"], ParamValue::from("nate"));
            assert_eq!(bound["controller"], ParamValue::from("users"));
        }
    }
}
