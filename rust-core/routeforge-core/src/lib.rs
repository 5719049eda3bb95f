//! # routeforge Core
//!
//! Bidirectional URL templates. A route is compiled once from a template
//! such as `/{:controller}/{:action}/{:id:[0-9]+}` and then used in both
//! directions: matching inbound paths into parameters, and generating paths
//! from parameters.
//!
//! ## Modules
//!
//! - `template` - Template tokenizer and regex synthesis
//! - `route` - The compiled, immutable route
//! - `config` - Uncompiled route configuration (builder and JSON)
//! - `matcher` - Path and metadata matching
//! - `generator` - Reverse routing
//! - `request` - Request carrier and metadata lookup
//! - `handler` - Post-match delegates
//! - `transform` - Named value transforms for modifiers and formatters
//! - `types` - Parameter values
//! - `telemetry` - Tracing subscriber setup
//! - `error` - Error types and handling
//!
//! ## Example
//!
//! ```
//! use routeforge_core::{Method, Request, RouteConfig, UrlOptions};
//!
//! let route = RouteConfig::new("/{:controller}/{:action}").compile().unwrap();
//!
//! let mut request = Request::new(Method::Get, "/posts/view");
//! route.parse(&mut request).unwrap();
//! assert_eq!(request.param("action").unwrap().as_str(), Some("view"));
//!
//! let path = route
//!     .generate(UrlOptions::new().param("controller", "posts"))
//!     .unwrap();
//! assert_eq!(path.as_str(), "/posts");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod generator;
pub mod handler;
pub mod matcher;
pub mod request;
pub mod route;
pub mod telemetry;
pub mod template;
pub mod transform;
pub mod types;

pub use config::RouteConfig;
pub use error::{Error, Mismatch, Result};
pub use generator::{Generated, Query, UrlOptions};
pub use handler::{Dispatch, Handler, PassThrough, Redirect, Respond, Response};
pub use request::{MetaLookup, Method, Request};
pub use route::{Route, RouteExport};
pub use telemetry::init_tracing;
pub use transform::{Transform, Transforms};
pub use types::{ParamValue, Params};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
