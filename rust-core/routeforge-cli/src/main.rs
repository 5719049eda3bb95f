//! # routeforge CLI
//!
//! Compiles one route from a JSON file or an inline template and runs it in
//! either direction from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use routeforge_core::{
    init_tracing, Dispatch, Generated, Method, ParamValue, Query, Request, Route, RouteConfig,
    UrlOptions,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "routeforge")]
#[command(about = "Match and generate URLs with route templates", long_about = None)]
struct Cli {
    /// Route definition as JSON
    #[arg(short, long, conflicts_with = "template")]
    config: Option<PathBuf>,

    /// Inline route template
    #[arg(short, long)]
    template: Option<String>,

    /// Initial route parameter, `key=value`
    #[arg(short, long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Compile as a continuation route
    #[arg(long = "continue")]
    continuation: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a path and print the bound parameters
    Match {
        /// Request path
        path: String,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: Method,

        /// Request metadata, `key=value`
        #[arg(long = "meta", value_parser = parse_pair)]
        meta: Vec<(String, String)>,
    },
    /// Generate a path from parameters
    Generate {
        /// Parameter value, `key=value`
        #[arg(short, long = "option", value_parser = parse_pair)]
        options: Vec<(String, String)>,

        /// Parameter whose segment is removed
        #[arg(long = "null")]
        nulls: Vec<String>,

        /// Query string pair, `key=value`
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Extra name the route may ignore
        #[arg(long = "scope")]
        scope: Vec<String>,
    },
    /// Print the compiled route as JSON
    Export,
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

/// `[..]` values are read as JSON lists, anything else as a string
fn param_value(raw: &str) -> Result<ParamValue> {
    if raw.starts_with('[') {
        serde_json::from_str(raw).with_context(|| format!("invalid list value `{raw}`"))
    } else {
        Ok(ParamValue::from(raw))
    }
}

fn load_route(cli: &Cli) -> Result<Route> {
    let mut config = match (&cli.config, &cli.template) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RouteConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        (None, Some(template)) => RouteConfig::new(template.as_str()),
        (None, None) => bail!("either --config or --template is required"),
    };

    for (key, raw) in &cli.params {
        config.params.insert(key.clone(), param_value(raw)?);
    }
    if cli.continuation {
        config.continuation = true;
    }

    let route = config.compile().context("compiling route")?;
    info!(template = %route.template(), pattern = %route.pattern(), "Route loaded");
    Ok(route)
}

fn run_match(route: &Route, path: &str, method: Method, meta: &[(String, String)]) -> Result<ExitCode> {
    let mut request = meta
        .iter()
        .fold(Request::new(method, path), |request, (k, v)| {
            request.with_meta(k.as_str(), v.as_str())
        });

    match route.parse(&mut request) {
        Ok(dispatch) => {
            let dispatch = match dispatch {
                Dispatch::Continue => json!("continue"),
                Dispatch::Respond(response) => json!({
                    "status": response.status,
                    "headers": response.headers,
                    "body": response.body,
                }),
            };
            let output = json!({
                "params": request.params,
                "persist": request.persist,
                "dispatch": dispatch,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(reason) => {
            eprintln!("no match: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_generate(
    route: &Route,
    options: &[(String, String)],
    nulls: &[String],
    query: &[(String, String)],
    scope: &[String],
) -> Result<ExitCode> {
    let mut url_options = UrlOptions::new();
    for (key, raw) in options {
        url_options = url_options.param(key.as_str(), param_value(raw)?);
    }
    for key in nulls {
        url_options = url_options.null(key.as_str());
    }
    if !query.is_empty() {
        let pairs: BTreeMap<String, String> = query.iter().cloned().collect();
        url_options = url_options.query(Query::Pairs(pairs));
    }
    if !scope.is_empty() {
        url_options = url_options.scope(scope.iter().cloned());
    }

    match route.generate(url_options) {
        Ok(Generated::Path(path)) => {
            println!("{path}");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Generated::Continuation {
            template,
            params,
            query,
        }) => {
            let output = json!({
                "template": template,
                "params": params,
                "query": query,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(reason) => {
            eprintln!("cannot generate: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let route = load_route(&cli)?;

    match &cli.command {
        Commands::Match { path, method, meta } => run_match(&route, path, *method, meta),
        Commands::Generate {
            options,
            nulls,
            query,
            scope,
        } => run_generate(&route, options, nulls, query, scope),
        Commands::Export => {
            println!("{}", serde_json::to_string_pretty(&route.export())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
