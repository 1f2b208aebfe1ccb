//! The compiled form of one operation.

use indexmap::IndexMap;
use serde_json::Value;

use crate::codec::ParameterCodec;
use crate::error::BuildError;
use crate::model::{Document, MediaType, Method, Parameter, ParameterLocation, RequestBody, Response};
use crate::pattern::{compile_path_pattern, CompiledPattern, PathParam, ServerPattern};
use crate::schema::SchemaValidator;
use crate::validation::ValidatorOptions;

/// One declared media type with its compiled schema.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    media_type: String,
    schema: Option<Value>,
    validator: Option<SchemaValidator>,
}

impl MediaEntry {
    fn build(
        document: &Document,
        media_type: &str,
        declared: &MediaType,
        options: &ValidatorOptions,
    ) -> Result<Self, BuildError> {
        let validator = declared
            .schema
            .as_ref()
            .map(|schema| SchemaValidator::new(schema, document, options))
            .transpose()?;
        Ok(Self {
            media_type: media_type.to_string(),
            schema: declared.schema.clone(),
            validator,
        })
    }

    /// The media type as declared, e.g. `application/json`.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The raw schema, handed to content decoders as a type hint.
    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    pub fn validator(&self) -> Option<&SchemaValidator> {
        self.validator.as_ref()
    }
}

/// A declared parameter (or response header) ready to decode and validate.
#[derive(Debug, Clone)]
pub struct ParameterEntry {
    codec: ParameterCodec,
    required: bool,
    content: Option<MediaEntry>,
    validator: Option<SchemaValidator>,
}

impl ParameterEntry {
    fn build(
        document: &Document,
        parameter: &Parameter,
        options: &ValidatorOptions,
    ) -> Result<Self, BuildError> {
        let codec = ParameterCodec::from_parameter(parameter, document);
        let required = parameter.is_required();

        if let Some(schema) = &parameter.schema {
            return Ok(Self {
                codec,
                required,
                content: None,
                validator: Some(SchemaValidator::new(schema, document, options)?),
            });
        }

        let unsupported = |reason: &str| BuildError::UnsupportedEncoding {
            name: parameter.name.clone(),
            reason: reason.to_string(),
        };
        let content = parameter
            .content
            .as_ref()
            .ok_or_else(|| unsupported("neither 'schema' nor 'content' is declared"))?;
        let (media_type, declared) = match content.len() {
            1 => content
                .first()
                .ok_or_else(|| unsupported("'content' is empty"))?,
            0 => return Err(unsupported("'content' is empty")),
            _ => return Err(unsupported("'content' must declare exactly one media type")),
        };

        Ok(Self {
            codec,
            required,
            content: Some(MediaEntry::build(document, media_type, declared, options)?),
            validator: None,
        })
    }

    pub fn name(&self) -> &str {
        self.codec.name()
    }

    pub fn location(&self) -> ParameterLocation {
        self.codec.location()
    }

    pub fn codec(&self) -> &ParameterCodec {
        &self.codec
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The media type of a parameter declared with `content`.
    pub fn content(&self) -> Option<&MediaEntry> {
        self.content.as_ref()
    }

    /// The validator of the parameter, wherever it was declared.
    pub fn validator(&self) -> Option<&SchemaValidator> {
        self.validator
            .as_ref()
            .or_else(|| self.content.as_ref()?.validator())
    }
}

/// A request body with one entry per media type.
#[derive(Debug, Clone)]
pub struct BodyEntry {
    required: bool,
    content: IndexMap<String, MediaEntry>,
}

impl BodyEntry {
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn content(&self) -> &IndexMap<String, MediaEntry> {
        &self.content
    }
}

/// A declared response: its headers and content.
#[derive(Debug, Clone)]
pub struct ResponseEntry {
    headers: Vec<ParameterEntry>,
    content: IndexMap<String, MediaEntry>,
}

impl ResponseEntry {
    pub fn headers(&self) -> &[ParameterEntry] {
        &self.headers
    }

    pub fn content(&self) -> &IndexMap<String, MediaEntry> {
        &self.content
    }
}

/// Everything needed to validate requests and responses of one operation.
///
/// Built once per operation by [`OperationIndex`](super::OperationIndex) and
/// immutable afterwards.
#[derive(Debug)]
pub struct OperationIndexEntry {
    path_template: String,
    method: Method,
    operation_id: Option<String>,
    path_pattern: Option<CompiledPattern>,
    servers: Vec<ServerPattern>,
    parameters: Vec<ParameterEntry>,
    request_body: Option<BodyEntry>,
    responses: IndexMap<String, ResponseEntry>,
}

impl OperationIndexEntry {
    /// Builds the entry of `method` on the path item declared as `template`.
    ///
    /// # Errors
    ///
    /// Any [`BuildError`] raised by a template, a parameter, a schema or a server URL.
    pub fn build(
        document: &Document,
        template: &str,
        method: Method,
        options: &ValidatorOptions,
    ) -> Result<Self, BuildError> {
        let unknown = || BuildError::UnknownOperation {
            path: template.to_string(),
            method: method.to_string(),
        };
        let path_item = document.path_item(template).ok_or_else(unknown)?;
        let operation = path_item.operation(method).ok_or_else(unknown)?;

        // Operation-level parameters replace path-level ones with the same name and location.
        let mut declared: IndexMap<(String, ParameterLocation), Parameter> = IndexMap::new();
        for item in path_item.parameters.iter().chain(&operation.parameters) {
            let parameter = document.resolve_item(item)?;
            declared.insert((parameter.name.clone(), parameter.location), parameter);
        }
        let parameters = declared
            .values()
            .map(|parameter| ParameterEntry::build(document, parameter, options))
            .collect::<Result<Vec<_>, _>>()?;

        let path_params: Vec<PathParam<'_>> = parameters
            .iter()
            .filter(|p| p.location() == ParameterLocation::Path)
            .map(|p| PathParam::from_codec(p.codec()))
            .collect();
        let path_pattern = compile_path_pattern(template, &path_params)?;

        let request_body = operation
            .request_body
            .as_ref()
            .map(|body| build_body(document, &document.resolve_item(body)?, options))
            .transpose()?;

        let mut responses = IndexMap::with_capacity(operation.responses.len());
        for (status, response) in &operation.responses {
            let response = document.resolve_item(response)?;
            responses.insert(status.clone(), build_response(document, &response, options)?);
        }

        let servers = operation
            .servers
            .as_ref()
            .or(path_item.servers.as_ref())
            .map(|servers| {
                servers
                    .iter()
                    .map(ServerPattern::compile)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            path_template: template.to_string(),
            method,
            operation_id: operation.operation_id.clone(),
            path_pattern,
            servers,
            parameters,
            request_body,
            responses,
        })
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// The style-aware path matcher; None for templates without parameters.
    pub fn path_pattern(&self) -> Option<&CompiledPattern> {
        self.path_pattern.as_ref()
    }

    /// Servers declared at operation or path-item level. Empty means the
    /// document-level servers apply.
    pub fn servers(&self) -> &[ServerPattern] {
        &self.servers
    }

    /// Merged path-item and operation parameters, in declaration order.
    pub fn parameters(&self) -> &[ParameterEntry] {
        &self.parameters
    }

    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &ParameterEntry> {
        self.parameters
            .iter()
            .filter(move |p| p.location() == location)
    }

    pub fn request_body(&self) -> Option<&BodyEntry> {
        self.request_body.as_ref()
    }

    pub fn responses(&self) -> &IndexMap<String, ResponseEntry> {
        &self.responses
    }

    /// Selects the response declared for `status`: the exact code, then its
    /// class (`2XX`), then `default`.
    pub fn response_for(&self, status: u16) -> Option<(&str, &ResponseEntry)> {
        let exact = status.to_string();
        let class = format!("{}XX", status / 100);
        let find = |wanted: &str| {
            self.responses
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
                .map(|(key, entry)| (key.as_str(), entry))
        };
        find(&exact)
            .or_else(|| find(&class))
            .or_else(|| find("default"))
    }

    /// Total schema nodes compiled for this operation.
    pub fn schema_node_count(&self) -> usize {
        let media = |content: &IndexMap<String, MediaEntry>| -> usize {
            content
                .values()
                .filter_map(MediaEntry::validator)
                .map(SchemaValidator::node_count)
                .sum()
        };
        let params = |params: &[ParameterEntry]| -> usize {
            params
                .iter()
                .filter_map(ParameterEntry::validator)
                .map(SchemaValidator::node_count)
                .sum()
        };
        params(self.parameters.as_slice())
            + self.request_body.as_ref().map_or(0, |body| media(&body.content))
            + self
                .responses
                .values()
                .map(|r| params(r.headers.as_slice()) + media(&r.content))
                .sum::<usize>()
    }
}

fn build_body(
    document: &Document,
    body: &RequestBody,
    options: &ValidatorOptions,
) -> Result<BodyEntry, BuildError> {
    Ok(BodyEntry {
        required: body.required,
        content: build_content(document, &body.content, options)?,
    })
}

fn build_response(
    document: &Document,
    response: &Response,
    options: &ValidatorOptions,
) -> Result<ResponseEntry, BuildError> {
    let mut headers = Vec::with_capacity(response.headers.len());
    for (name, header) in &response.headers {
        // Content-Type is described by `content`, not by a header definition.
        if name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        let header = document.resolve_item(header)?;
        headers.push(ParameterEntry::build(document, &header.to_parameter(name), options)?);
    }
    Ok(ResponseEntry {
        headers,
        content: build_content(document, &response.content, options)?,
    })
}

fn build_content(
    document: &Document,
    content: &IndexMap<String, MediaType>,
    options: &ValidatorOptions,
) -> Result<IndexMap<String, MediaEntry>, BuildError> {
    content
        .iter()
        .map(|(media_type, declared)| {
            Ok((
                media_type.clone(),
                MediaEntry::build(document, media_type, declared, options)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Document {
        Document::from_value(json!({
            "openapi": "3.0.3",
            "paths": {
                "/pets/{petId}": {
                    "parameters": [
                        {"name": "petId", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "trace", "in": "header", "schema": {"type": "string"}}
                    ],
                    "get": {
                        "operationId": "getPet",
                        "parameters": [
                            {"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}},
                            {"name": "filter", "in": "query",
                             "content": {"application/json": {"schema": {"type": "object"}}}}
                        ],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "headers": {
                                    "X-Rate": {"required": true, "schema": {"type": "integer"}},
                                    "Content-Type": {"schema": {"type": "string"}}
                                },
                                "content": {"application/json": {"schema": {"type": "object"}}}
                            },
                            "4XX": {"description": "client error"},
                            "default": {"description": "other"}
                        }
                    },
                    "delete": {
                        "parameters": [{"name": "broken", "in": "query"}],
                        "responses": {"204": {"description": "gone"}}
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_operation_parameters_override_path_item() {
        let entry =
            OperationIndexEntry::build(&document(), "/pets/{petId}", Method::Get, &ValidatorOptions::new())
                .unwrap();
        let names: Vec<&str> = entry.parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["petId", "trace", "filter"]);

        let pet_id = entry.parameters_in(ParameterLocation::Path).next().unwrap();
        assert!(pet_id.validator().unwrap().is_valid(&json!(3)));
        assert!(!pet_id.validator().unwrap().is_valid(&json!("3")));
        assert_eq!(entry.operation_id(), Some("getPet"));
        assert!(entry.path_pattern().is_some());
    }

    #[test]
    fn test_content_parameter_keeps_media_type() {
        let entry =
            OperationIndexEntry::build(&document(), "/pets/{petId}", Method::Get, &ValidatorOptions::new())
                .unwrap();
        let filter = entry.parameters_in(ParameterLocation::Query).next().unwrap();
        assert_eq!(filter.content().unwrap().media_type(), "application/json");
        assert!(filter.validator().is_some());
    }

    #[test]
    fn test_response_selection_order() {
        let entry =
            OperationIndexEntry::build(&document(), "/pets/{petId}", Method::Get, &ValidatorOptions::new())
                .unwrap();
        assert_eq!(entry.response_for(200).unwrap().0, "200");
        assert_eq!(entry.response_for(404).unwrap().0, "4XX");
        assert_eq!(entry.response_for(503).unwrap().0, "default");

        let ok = entry.response_for(200).unwrap().1;
        let headers: Vec<&str> = ok.headers().iter().map(|h| h.name()).collect();
        assert_eq!(headers, vec!["X-Rate"]);
        assert!(ok.headers()[0].is_required());
    }

    #[test]
    fn test_parameter_without_schema_or_content_fails() {
        let err = OperationIndexEntry::build(
            &document(),
            "/pets/{petId}",
            Method::Delete,
            &ValidatorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedEncoding { name, .. } if name == "broken"));
    }

    #[test]
    fn test_unknown_operation() {
        let err = OperationIndexEntry::build(&document(), "/pets/{petId}", Method::Post, &ValidatorOptions::new())
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownOperation { .. }));
    }
}
