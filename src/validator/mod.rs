//! Request and response validation against a whole document.
//!
//! [`OpenApiValidator`] routes a request to its operation (server URL, path
//! template, method), then decodes and validates parameters location by
//! location and finally the body. Routing failures are terminal; every other
//! failure is collected so one call reports everything wrong with a request.

mod parameters;
mod router;

pub use parameters::RequestParameters;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;

use crate::codec::{select_media_type, ContentDecoder, JsonContentDecoder, QueryParams};
use crate::crumbs::CrumbPath;
use crate::error::{BuildError, DecodeError, ResultCode, ValidationOutcome, ValidationResult};
use crate::http::{Request, Response};
use crate::model::{Document, Method, ParameterLocation};
use crate::operation::{MediaEntry, OperationIndex, OperationIndexEntry, ParameterEntry};
use crate::validation::{Direction, ValidationMode, ValidatorOptions};
use parameters::ParameterSource;
use router::{RouteMatch, Router};

/// Validates requests and responses against an OpenAPI 3 document.
///
/// The validator is `Send + Sync`; share it behind an `Arc` and call it from
/// any number of threads. Operations are compiled on first use and cached.
///
/// # Example
///
/// ```rust
/// use oas_guard::{Document, Method, OpenApiValidator, Request, ResultCode};
/// use serde_json::json;
///
/// let document = Document::from_value(json!({
///     "openapi": "3.0.3",
///     "paths": {"/pets/{id}": {"get": {
///         "parameters": [
///             {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}},
///             {"name": "fields", "in": "query", "schema": {"type": "array", "items": {"type": "string"}}}
///         ],
///         "responses": {"200": {"description": "ok"}}
///     }}}
/// }))
/// .unwrap();
/// let validator = OpenApiValidator::new(document).unwrap();
///
/// let request = Request::builder(Method::Get, "/pets/7?fields=name,tag").build();
/// let parameters = validator.validate_request(&request).unwrap();
/// assert_eq!(parameters.path()["id"], json!(7));
/// assert_eq!(parameters.query()["fields"], json!(["name", "tag"]));
///
/// let request = Request::builder(Method::Get, "/pets/seven").build();
/// let outcome = validator.validate_request(&request).unwrap_err();
/// assert!(outcome.has_code(ResultCode::Type));
///
/// let request = Request::builder(Method::Get, "/owners").build();
/// let outcome = validator.validate_request(&request).unwrap_err();
/// assert!(outcome.has_code(ResultCode::PathNotFound));
/// ```
pub struct OpenApiValidator {
    document: Arc<Document>,
    options: ValidatorOptions,
    decoder: Arc<dyn ContentDecoder>,
    router: Router,
    index: OperationIndex,
}

/// Configures an [`OpenApiValidator`].
pub struct OpenApiValidatorBuilder {
    document: Document,
    options: ValidatorOptions,
    decoder: Arc<dyn ContentDecoder>,
}

impl OpenApiValidatorBuilder {
    pub fn options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the default [`JsonContentDecoder`].
    pub fn decoder(mut self, decoder: impl ContentDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Compiles the server URLs and path routes of the document.
    ///
    /// # Errors
    ///
    /// A [`BuildError`] for an unsupported path template or server URL.
    /// Operation-level errors surface when the operation is first used.
    pub fn build(self) -> Result<OpenApiValidator, BuildError> {
        let router = Router::new(&self.document)?;
        let document = Arc::new(self.document);
        Ok(OpenApiValidator {
            index: OperationIndex::new(Arc::clone(&document), self.options.clone()),
            document,
            options: self.options,
            decoder: self.decoder,
            router,
        })
    }
}

/// The operation a request was routed to.
struct Resolved {
    entry: Arc<OperationIndexEntry>,
    path: String,
}

impl OpenApiValidator {
    /// Creates a validator with default options and the JSON decoder.
    pub fn new(document: Document) -> Result<Self, BuildError> {
        Self::builder(document).build()
    }

    pub fn builder(document: Document) -> OpenApiValidatorBuilder {
        OpenApiValidatorBuilder {
            document,
            options: ValidatorOptions::default(),
            decoder: Arc::new(JsonContentDecoder),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Returns the compiled entry of an operation, building it if needed.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnknownOperation`] for undeclared operations, or the
    /// error raised while compiling the operation.
    pub fn operation_index(
        &self,
        path: &str,
        method: Method,
    ) -> Result<Arc<OperationIndexEntry>, BuildError> {
        self.index.get(path, method)
    }

    /// Builds every declared operation in parallel.
    ///
    /// Returns the number of operations built, or the first build error met.
    pub fn warm_up(&self) -> Result<usize, BuildError> {
        let operations: Vec<(&str, Method)> = self
            .document
            .paths
            .iter()
            .flat_map(|(template, item)| {
                item.operations()
                    .map(move |(method, _)| (template.as_str(), method))
            })
            .collect();
        operations
            .par_iter()
            .try_for_each(|(template, method)| self.index.get(template, *method).map(|_| ()))?;
        Ok(operations.len())
    }

    /// Validates a request.
    ///
    /// # Errors
    ///
    /// The full [`ValidationOutcome`] when any error-severity result was found.
    pub fn validate_request(&self, request: &Request) -> Result<RequestParameters, ValidationOutcome> {
        let (outcome, parameters) = self.check_request(request);
        match parameters {
            Some(parameters) => outcome.into_validation(parameters).into_result(),
            None => Err(outcome),
        }
    }

    /// Validates a request into a caller-supplied outcome.
    ///
    /// Returns the decoded parameters when this call added no error.
    pub fn validate_request_into(
        &self,
        request: &Request,
        out: &mut ValidationOutcome,
    ) -> Option<RequestParameters> {
        let (outcome, parameters) = self.check_request(request);
        let valid = outcome.is_valid();
        out.append(outcome);
        parameters.filter(|_| valid)
    }

    /// Validates a response to `request`.
    ///
    /// # Errors
    ///
    /// The full [`ValidationOutcome`] when any error-severity result was found.
    pub fn validate_response(&self, response: &Response, request: &Request) -> Result<(), ValidationOutcome> {
        self.check_response(response, request)
            .into_validation(())
            .into_result()
    }

    /// Validates a response into a caller-supplied outcome. Returns true when no error was added.
    pub fn validate_response_into(
        &self,
        response: &Response,
        request: &Request,
        out: &mut ValidationOutcome,
    ) -> bool {
        let outcome = self.check_response(response, request);
        let valid = outcome.is_valid();
        out.append(outcome);
        valid
    }

    fn check_request(&self, request: &Request) -> (ValidationOutcome, Option<RequestParameters>) {
        let mut out = ValidationOutcome::new();
        let Some(resolved) = self.resolve(request, &mut out) else {
            return (out, None);
        };
        let entry = &resolved.entry;
        let mut decoded = RequestParameters::new(entry.path_template(), entry.method());

        let captures = match entry.path_pattern() {
            None => Some(IndexMap::new()),
            Some(pattern) => {
                let captures = pattern.captures(&resolved.path);
                if captures.is_none() {
                    out.push(ValidationResult::new(
                        ResultCode::ParameterDecodingFailed,
                        CrumbPath::from_property(ParameterLocation::Path.as_str()),
                        format!(
                            "path '{}' does not match the parameter styles of '{}'",
                            resolved.path,
                            entry.path_template()
                        ),
                    ));
                }
                captures
            }
        };

        let source = ParameterSource {
            captures: captures.clone().unwrap_or_default(),
            query: QueryParams::parse(request.query().unwrap_or_default()),
            headers: request.headers(),
            cookies: Some(request.cookies()),
        };
        for location in ParameterLocation::all() {
            if location == ParameterLocation::Path && captures.is_none() {
                continue;
            }
            self.check_parameters(
                entry.parameters_in(location),
                &source,
                Direction::Request,
                &mut out,
                |name, value| decoded.insert(location, name, value),
            );
        }

        if let Some(body) = entry.request_body().filter(|_| !self.halted(&out)) {
            let value = self.check_body(
                body.content(),
                body.is_required(),
                request.content_type(),
                request.body(),
                Direction::Request,
                &mut out,
            );
            if let Some(value) = value {
                decoded.set_body(value);
            }
        }

        tracing::trace!(
            method = %request.method(),
            path = request.path(),
            results = out.len(),
            errors = out.errors().len(),
            "validated request"
        );
        (out, Some(decoded))
    }

    fn check_response(&self, response: &Response, request: &Request) -> ValidationOutcome {
        let mut out = ValidationOutcome::new();
        let Some(resolved) = self.resolve(request, &mut out) else {
            return out;
        };
        let entry = &resolved.entry;

        let Some((_, declared)) = entry.response_for(response.status()) else {
            terminal(
                &mut out,
                ResultCode::ResponseStatusNotFound,
                format!(
                    "status {} is not declared for {} {}",
                    response.status(),
                    entry.method(),
                    entry.path_template()
                ),
            );
            return out;
        };

        let source = ParameterSource::headers(response.headers());
        self.check_parameters(
            declared.headers().iter(),
            &source,
            Direction::Response,
            &mut out,
            |_, _| {},
        );

        if !declared.content().is_empty() && !self.halted(&out) {
            self.check_body(
                declared.content(),
                false,
                response.content_type(),
                response.body(),
                Direction::Response,
                &mut out,
            );
        }

        tracing::trace!(
            status = response.status(),
            path = request.path(),
            results = out.len(),
            errors = out.errors().len(),
            "validated response"
        );
        out
    }

    /// Returns true if the route's operation is declared and its style-aware
    /// path pattern captures the request path.
    fn captures_path(&self, route: &RouteMatch<'_>, method: Method) -> bool {
        let declared = self
            .document
            .path_item(route.template)
            .and_then(|item| item.operation(method))
            .is_some();
        declared
            && self
                .index
                .get(route.template, method)
                .map(|entry| {
                    entry
                        .path_pattern()
                        .map_or(true, |pattern| pattern.is_match(&route.path))
                })
                .unwrap_or(false)
    }

    /// Routes a request to its operation. Failures are recorded as terminal results.
    fn resolve(&self, request: &Request, out: &mut ValidationOutcome) -> Option<Resolved> {
        let mut routes = match self.router.routes(request) {
            Ok(routes) => routes,
            Err(code) => {
                let message = match code {
                    ResultCode::ServerNotFound => {
                        format!("no server matches '{}'", request.url())
                    }
                    _ => format!("no path matches '{}'", request.path()),
                };
                terminal(out, code, message);
                return None;
            }
        };
        let chosen = if routes.len() > 1 {
            routes
                .iter()
                .position(|route| self.captures_path(route, request.method()))
                .unwrap_or(0)
        } else {
            0
        };
        let RouteMatch { template, path } = routes.swap_remove(chosen);

        let declared = self
            .document
            .path_item(template)
            .and_then(|item| item.operation(request.method()))
            .is_some();
        if !declared {
            terminal(
                out,
                ResultCode::OperationNotFound,
                format!("{} is not allowed on '{}'", request.method(), template),
            );
            return None;
        }

        let entry = match self.index.get(template, request.method()) {
            Ok(entry) => entry,
            Err(error) => {
                terminal(
                    out,
                    ResultCode::InvalidOperationDefinition,
                    format!("{} {} cannot be validated: {}", request.method(), template, error),
                );
                return None;
            }
        };

        let servers = entry.servers();
        if !servers.is_empty() && !servers.iter().any(|server| server.strip(request).is_some()) {
            terminal(
                out,
                ResultCode::ServerNotFound,
                format!(
                    "'{}' is not served by the servers of {} {}",
                    request.url(),
                    request.method(),
                    template
                ),
            );
            return None;
        }

        Some(Resolved { entry, path })
    }

    fn check_parameters<'e>(
        &self,
        parameters: impl Iterator<Item = &'e ParameterEntry>,
        source: &ParameterSource<'_>,
        direction: Direction,
        out: &mut ValidationOutcome,
        mut keep: impl FnMut(&str, Value),
    ) {
        for parameter in parameters {
            if self.halted(out) {
                return;
            }
            let crumb = CrumbPath::from_property(parameter.location().as_str())
                .push_property(parameter.name());

            let value = match parameter.content() {
                None => source.styled(parameter),
                Some(media) => match source.text(parameter) {
                    None => None,
                    Some(text) => match parameter.codec().decode_content(
                        self.decoder.as_ref(),
                        media.media_type(),
                        media.schema(),
                        &text,
                    ) {
                        Ok(value) => Some(value),
                        Err(error) => {
                            out.push(ValidationResult::new(
                                ResultCode::ParameterDecodingFailed,
                                crumb,
                                error.to_string(),
                            ));
                            continue;
                        }
                    },
                },
            };

            let Some(value) = value else {
                if parameter.is_required() {
                    out.push(ValidationResult::new(
                        ResultCode::RequiredParameterMissing,
                        crumb,
                        format!(
                            "required {} parameter '{}' is missing",
                            parameter.location().as_str(),
                            parameter.name()
                        ),
                    ));
                }
                continue;
            };

            if let Some(validator) = parameter.validator() {
                validator.validate_into(&value, &crumb, direction, out);
            }
            keep(parameter.name(), value);
        }
    }

    /// In fast-fail mode nothing is checked after the first error.
    fn halted(&self, out: &ValidationOutcome) -> bool {
        self.options.mode() == ValidationMode::FastFail && !out.is_valid()
    }

    fn check_body(
        &self,
        declared: &IndexMap<String, MediaEntry>,
        required: bool,
        content_type: Option<&str>,
        body: Option<&[u8]>,
        direction: Direction,
        out: &mut ValidationOutcome,
    ) -> Option<Value> {
        let crumb = CrumbPath::from_property("body");
        let Some(body) = body.filter(|bytes| !bytes.is_empty()) else {
            if required {
                out.push(ValidationResult::new(
                    ResultCode::BodyRequired,
                    crumb,
                    "request body is required",
                ));
            }
            return None;
        };

        let Some(content_type) = content_type else {
            out.push(ValidationResult::new(
                ResultCode::ContentTypeMissing,
                crumb,
                "body is present but Content-Type is missing",
            ));
            return None;
        };

        let Some((_, media)) = select_media_type(declared, content_type) else {
            out.push(ValidationResult::new(
                ResultCode::UnsupportedMediaType,
                crumb,
                format!("media type '{}' is not declared", content_type),
            ));
            return None;
        };

        let value = match self.decoder.decode(media.schema(), content_type, body) {
            Ok(value) => value,
            Err(error) => {
                let code = match &error {
                    DecodeError::UnsupportedMediaType(_) => ResultCode::UnsupportedMediaType,
                    DecodeError::Malformed { .. } => ResultCode::ContentDecodingFailed,
                };
                out.push(ValidationResult::new(code, crumb, error.to_string()));
                return None;
            }
        };

        if let Some(validator) = media.validator() {
            validator.validate_into(&value, &crumb, direction, out);
        }
        Some(value)
    }
}

/// Records a routing failure. No further validation is possible after one.
fn terminal(out: &mut ValidationOutcome, code: ResultCode, message: String) {
    debug_assert!(code.is_terminal());
    tracing::debug!(code = %code, "{}", message);
    out.push(ValidationResult::new(code, CrumbPath::root(), message));
}

impl fmt::Debug for OpenApiValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenApiValidator")
            .field("openapi", &self.document.openapi)
            .field("paths", &self.document.paths.len())
            .field("options", &self.options)
            .field("operations_built", &self.index.len())
            .finish()
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OpenApiValidator>();
};
