//! Route table derivation from OpenAPI path templates.
//!
//! Each declared `(path, method)` pair becomes exactly one [`RouteDefinition`].
//! Path parameters (`{name}` segments) become captures matching exactly one
//! non-empty, slash-free segment, so `/users/{id}` yields the routing pattern
//! `/users/{id:[^/]+}` and never matches `/users/1/2`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use openapiv3::OpenAPI;
use tracing::debug;

use crate::error::{CoreError, RouteTableError};
use crate::openapi::{declared_operations, load_document};

/// HTTP methods an OpenAPI path item can declare operations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Trace,
    ];

    /// Upper-case method token as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RouteTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RouteTableError::UnknownMethod(s.to_string()))
    }
}

/// One `/`-separated piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matched byte-for-byte.
    Literal(String),
    /// A fully bracketed `{name}` segment.
    Param(String),
}

/// A parsed OpenAPI path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Split `raw` on `/` and classify each segment.
    ///
    /// Only segments that are entirely `{name}` are parameters; a segment
    /// such as `{id}.json` stays literal.
    pub fn parse(raw: &str) -> Result<Self, RouteTableError> {
        if !raw.starts_with('/') {
            return Err(RouteTableError::InvalidPath(raw.to_string()));
        }

        let segments = raw
            .split('/')
            .map(|segment| classify_segment(raw, segment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in path order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Pattern form with an explicit single-segment matcher per parameter,
    /// e.g. `/users/{id:[^/]+}`.
    #[must_use]
    pub fn routing_pattern(&self) -> String {
        self.render(|name| format!("{{{name}:[^/]+}}"), str::to_string)
    }

    /// Path in the dispatcher's native syntax, where `{name}` already captures
    /// exactly one segment. Braces in literal segments are escaped.
    #[must_use]
    pub fn dispatch_path(&self) -> String {
        self.render(|name| format!("{{{name}}}"), escape_braces)
    }

    /// Path with parameter names erased. Two templates with equal shapes
    /// match exactly the same request paths.
    #[must_use]
    pub fn shape(&self) -> String {
        self.render(|_| "{}".to_string(), escape_braces)
    }

    fn render(&self, param: impl Fn(&str) -> String, literal: impl Fn(&str) -> String) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Param(name) => param(name),
                Segment::Literal(text) => literal(text),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn classify_segment(raw: &str, segment: &str) -> Result<Segment, RouteTableError> {
    let Some(name) = segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Ok(Segment::Literal(segment.to_string()));
    };

    if name.is_empty() || name.contains(['{', '}', '*', '/']) {
        return Err(RouteTableError::InvalidParameter {
            path: raw.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(Segment::Param(name.to_string()))
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// A single dispatchable route: one method on one path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    method: HttpMethod,
    routing_pattern: String,
    template: PathTemplate,
}

impl RouteDefinition {
    pub fn new(method: HttpMethod, raw_path: &str) -> Result<Self, RouteTableError> {
        let template = PathTemplate::parse(raw_path)?;
        Ok(Self {
            method,
            routing_pattern: template.routing_pattern(),
            template,
        })
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// The OpenAPI path template, e.g. `/users/{id}`.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        self.template.raw()
    }

    /// The derived pattern, e.g. `/users/{id:[^/]+}`.
    #[must_use]
    pub fn routing_pattern(&self) -> &str {
        &self.routing_pattern
    }

    #[must_use]
    pub const fn template(&self) -> &PathTemplate {
        &self.template
    }
}

impl fmt::Display for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.routing_pattern)
    }
}

/// Routes derived from one OpenAPI document. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    /// Derive the route table from a parsed document.
    pub fn build(doc: &OpenAPI) -> Result<Self, RouteTableError> {
        Self::from_declared(&declared_operations(doc)?)
    }

    /// Read, validate and derive the route table from a document on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let doc = load_document(path)?;
        Ok(Self::build(&doc)?)
    }

    /// Derive the route table from a `path -> declared methods` mapping.
    ///
    /// A method listed twice for the same path still yields one route.
    pub fn from_declared(
        operations: &BTreeMap<String, Vec<HttpMethod>>,
    ) -> Result<Self, RouteTableError> {
        let mut routes = Vec::new();
        for (path, methods) in operations {
            let template = PathTemplate::parse(path)?;
            let routing_pattern = template.routing_pattern();
            let mut seen = BTreeSet::new();
            for &method in methods {
                if !seen.insert(method) {
                    continue;
                }
                debug!(method = %method, pattern = %routing_pattern, "Derived route");
                routes.push(RouteDefinition {
                    method,
                    routing_pattern: routing_pattern.clone(),
                    template: template.clone(),
                });
            }
        }
        Ok(Self { routes })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteDefinition> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Methods declared for one OpenAPI path template.
    #[must_use]
    pub fn methods_for(&self, raw_path: &str) -> Vec<HttpMethod> {
        self.routes
            .iter()
            .filter(|r| r.raw_path() == raw_path)
            .map(RouteDefinition::method)
            .collect()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteDefinition;
    type IntoIter = std::slice::Iter<'a, RouteDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
