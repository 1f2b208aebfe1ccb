//! Request routing: server URL, then path template.

use crate::error::{BuildError, ResultCode};
use crate::http::Request;
use crate::model::Document;
use crate::pattern::{PathRoute, ServerPattern};

/// The route of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteMatch<'r> {
    /// The path template as declared in the document.
    pub(crate) template: &'r str,
    /// The request path with the server prefix removed.
    pub(crate) path: String,
}

/// Compiled servers and path routes of a document.
#[derive(Debug)]
pub(crate) struct Router {
    servers: Vec<ServerPattern>,
    /// Documents without servers are served from `/`.
    implicit_root: bool,
    routes: Vec<PathRoute>,
}

impl Router {
    /// Compiles the document servers, the servers declared on path items and
    /// operations, and one route per path template.
    pub(crate) fn new(document: &Document) -> Result<Self, BuildError> {
        let mut servers: Vec<ServerPattern> = Vec::new();
        let mut add = |pattern: ServerPattern| {
            if !servers.iter().any(|known| known.url() == pattern.url()) {
                servers.push(pattern);
            }
        };
        for server in &document.servers {
            add(ServerPattern::compile(server)?);
        }
        for item in document.paths.values() {
            let declared = item
                .servers
                .iter()
                .flatten()
                .chain(item.operations().flat_map(|(_, op)| op.servers.iter().flatten()));
            for server in declared {
                add(ServerPattern::compile(server)?);
            }
        }

        let routes = document
            .paths
            .keys()
            .map(|template| PathRoute::new(template))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            servers,
            implicit_root: document.servers.is_empty(),
            routes,
        })
    }

    /// Lists every (server, path template) pair that matches, in server order
    /// and then declaration order.
    ///
    /// Fails with `ServerNotFound` when no server matches and with
    /// `PathNotFound` when a server matched but no template did.
    pub(crate) fn routes(&self, request: &Request) -> Result<Vec<RouteMatch<'_>>, ResultCode> {
        let mut candidates: Vec<String> = self
            .servers
            .iter()
            .filter_map(|server| server.strip(request))
            .collect();
        if self.implicit_root {
            candidates.push(request.path().to_string());
        }
        if candidates.is_empty() {
            return Err(ResultCode::ServerNotFound);
        }

        let matches: Vec<RouteMatch<'_>> = candidates
            .iter()
            .flat_map(|path| {
                self.routes
                    .iter()
                    .filter(move |route| route.matches(path))
                    .map(move |route| RouteMatch {
                        template: route.template(),
                        path: path.clone(),
                    })
            })
            .collect();
        if matches.is_empty() {
            Err(ResultCode::PathNotFound)
        } else {
            Ok(matches)
        }
    }
}
