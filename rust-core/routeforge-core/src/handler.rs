//! # Route Handlers
//!
//! Optional post-match delegates. When a route with a handler matches, the
//! handler receives the updated request and decides how dispatch proceeds:
//! continue with the (possibly modified) parameters, or answer directly.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Each handler has a single responsibility
//! - **O**: Extensible via the `Handler` trait
//! - **D**: Routes depend on the trait, not on concrete handlers

use crate::request::Request;
use std::collections::BTreeMap;
use std::fmt;

/// Post-match delegate
pub trait Handler: Send + Sync + fmt::Debug {
    /// Called once the route has matched and the request has been updated
    fn invoke(&self, request: &mut Request) -> Dispatch;

    /// Handler name for logging and export
    fn name(&self) -> &'static str {
        "Handler"
    }
}

/// Outcome of a successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Continue dispatching with the request's parameters
    Continue,
    /// Short-circuit with this response
    Respond(Response),
}

/// Terminal response produced by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Content type
    pub content_type: String,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: String,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: "text/plain".to_string(),
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }
}

impl Response {
    /// Create a text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Create a JSON response
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            content_type: "application/json".to_string(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Set status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Header value by name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Redirects to a location built from the bound parameters.
///
/// `{:name}` tokens in the location are replaced with the request's
/// parameter of that name.
#[derive(Debug, Clone)]
pub struct Redirect {
    location: String,
    status: u16,
}

impl Redirect {
    /// Permanent (301) redirect
    #[must_use]
    pub fn permanent(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: 301,
        }
    }

    /// Temporary (302) redirect
    #[must_use]
    pub fn temporary(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: 302,
        }
    }

    /// Location with `{:name}` tokens filled from `request`
    #[must_use]
    pub fn target(&self, request: &Request) -> String {
        request
            .params
            .iter()
            .fold(self.location.clone(), |location, (key, value)| {
                location.replace(&format!("{{:{key}}}"), &value.as_string())
            })
    }
}

impl Handler for Redirect {
    fn invoke(&self, request: &mut Request) -> Dispatch {
        Dispatch::Respond(
            Response::default()
                .with_status(self.status)
                .with_header("Location", self.target(request)),
        )
    }

    fn name(&self) -> &'static str {
        "Redirect"
    }
}

/// Answers every match with a fixed response
#[derive(Debug, Clone)]
pub struct Respond(pub Response);

impl Handler for Respond {
    fn invoke(&self, _request: &mut Request) -> Dispatch {
        Dispatch::Respond(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "Respond"
    }
}

/// Explicitly continues dispatch unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Handler for PassThrough {
    fn invoke(&self, _request: &mut Request) -> Dispatch {
        Dispatch::Continue
    }

    fn name(&self) -> &'static str {
        "PassThrough"
    }
}

/// Handler backed by a closure, see [`from_fn`]
pub struct FnHandler<F> {
    func: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Request) -> Dispatch + Send + Sync,
{
    fn invoke(&self, request: &mut Request) -> Dispatch {
        (self.func)(request)
    }

    fn name(&self) -> &'static str {
        "FnHandler"
    }
}

/// Wrap a closure as a [`Handler`]
pub fn from_fn<F>(func: F) -> FnHandler<F>
where
    F: Fn(&mut Request) -> Dispatch + Send + Sync,
{
    FnHandler { func }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[test]
    fn test_redirect_target() {
        let mut req = Request::new(Method::Get, "/blog/hello");
        req.params.insert("slug".into(), "hello".into());

        let redirect = Redirect::permanent("/articles/{:slug}");
        let Dispatch::Respond(res) = redirect.invoke(&mut req) else {
            panic!("expected response");
        };
        assert_eq!(res.status, 301);
        assert_eq!(res.header("Location"), Some("/articles/hello"));
    }

    #[test]
    fn test_respond_handler() {
        let mut req = Request::new(Method::Get, "/ping");
        let handler = Respond(Response::json(r#"{"ok":true}"#));
        let dispatch = handler.invoke(&mut req);
        assert_eq!(dispatch, Dispatch::Respond(Response::json(r#"{"ok":true}"#)));
        assert_eq!(handler.name(), "Respond");
    }

    #[test]
    fn test_pass_through() {
        let mut req = Request::new(Method::Get, "/");
        assert_eq!(PassThrough.invoke(&mut req), Dispatch::Continue);
    }

    #[test]
    fn test_fn_handler_mutates_params() {
        let handler = from_fn(|req: &mut Request| {
            req.params.insert("locale".into(), "en".into());
            Dispatch::Continue
        });
        let mut req = Request::new(Method::Get, "/");
        assert_eq!(handler.invoke(&mut req), Dispatch::Continue);
        assert_eq!(req.param("locale").and_then(|v| v.as_str()), Some("en"));
    }
}
