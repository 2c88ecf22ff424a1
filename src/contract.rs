//! Contract definitions.
//!
//! A contract describes one HTTP endpoint: its method, path template,
//! parameter shapes, an optional request body example and an ordered set of
//! named example responses. Contracts are built once and shared read-only
//! between the mock store, the serializer and the verification helpers.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered name to value map used for headers and parameter shapes.
pub type Params = IndexMap<String, String>;

/// Ordered collection of contracts keyed by contract name.
///
/// Declaration order matters: it breaks ties between contracts that match
/// the same call.
pub type Contracts = IndexMap<String, ContractDefinition>;

/// HTTP methods a contract can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a body example.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Example values for each parameter kind.
///
/// Only the names take part in matching; values are documentation and
/// provider-verification examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamShapes {
    #[serde(default)]
    pub path: Params,

    #[serde(default)]
    pub query: Params,

    #[serde(default)]
    pub header: Params,
}

/// Request side of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDefinition {
    /// Path template; path parameter values are appended as segments
    pub path: String,

    /// Static headers sent with every request
    #[serde(default)]
    pub headers: Params,

    /// Parameter shapes
    #[serde(default)]
    pub params: ParamShapes,
}

impl RequestDefinition {
    /// Request on `path` with no headers and no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            headers: Params::new(),
            params: ParamShapes::default(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, example: impl Into<String>) -> Self {
        self.params.path.insert(name.into(), example.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, example: impl Into<String>) -> Self {
        self.params.query.insert(name.into(), example.into());
        self
    }

    pub fn with_header_param(
        mut self,
        name: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        self.params.header.insert(name.into(), example.into());
        self
    }

    /// The path template without its trailing slash.
    pub fn base_path(&self) -> &str {
        self.path.strip_suffix('/').unwrap_or(&self.path)
    }
}

/// One named candidate response of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseExample {
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// HTTP status code
    pub status: u16,

    /// Response headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Params>,

    /// Response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// Selections applied to other contracts once this response is served
    /// (contract key -> response key)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub transitions: IndexMap<String, String>,

    /// Withhold resolution until released or the hold delay elapses
    #[serde(default, skip_serializing_if = "is_false")]
    pub hold: bool,

    /// Keep out of generated documentation and verification
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ResponseExample {
    pub fn new(status: u16) -> Self {
        Self {
            description: None,
            status,
            headers: None,
            body: None,
            transitions: IndexMap::new(),
            hold: false,
            ignore: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Params::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_transition(
        mut self,
        contract: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.transitions.insert(contract.into(), response.into());
        self
    }

    pub fn held(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }
}

/// Declarative description of one HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractDefinition {
    pub description: String,

    pub method: Method,

    pub request: RequestDefinition,

    /// Request body example, only for POST and PUT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,

    /// Named example responses; the first one is the default selection
    pub response_examples: IndexMap<String, ResponseExample>,
}

impl ContractDefinition {
    pub fn new(
        description: impl Into<String>,
        method: Method,
        request: RequestDefinition,
        request_body: Option<serde_json::Value>,
        response_examples: impl IntoIterator<Item = (String, ResponseExample)>,
    ) -> Self {
        Self {
            description: description.into(),
            method,
            request,
            request_body,
            response_examples: response_examples.into_iter().collect(),
        }
    }

    pub fn get(
        description: impl Into<String>,
        request: RequestDefinition,
        response_examples: impl IntoIterator<Item = (String, ResponseExample)>,
    ) -> Self {
        Self::new(description, Method::Get, request, None, response_examples)
    }

    pub fn delete(
        description: impl Into<String>,
        request: RequestDefinition,
        response_examples: impl IntoIterator<Item = (String, ResponseExample)>,
    ) -> Self {
        Self::new(description, Method::Delete, request, None, response_examples)
    }

    pub fn post(
        description: impl Into<String>,
        request: RequestDefinition,
        request_body: serde_json::Value,
        response_examples: impl IntoIterator<Item = (String, ResponseExample)>,
    ) -> Self {
        Self::new(
            description,
            Method::Post,
            request,
            Some(request_body),
            response_examples,
        )
    }

    pub fn put(
        description: impl Into<String>,
        request: RequestDefinition,
        request_body: serde_json::Value,
        response_examples: impl IntoIterator<Item = (String, ResponseExample)>,
    ) -> Self {
        Self::new(
            description,
            Method::Put,
            request,
            Some(request_body),
            response_examples,
        )
    }

    /// Key of the first declared response.
    pub fn default_response_key(&self) -> Option<&str> {
        self.response_examples.keys().next().map(String::as_str)
    }

    pub fn response(&self, key: &str) -> Option<&ResponseExample> {
        self.response_examples.get(key)
    }

    pub fn response_keys(&self) -> impl Iterator<Item = &str> {
        self.response_examples.keys().map(String::as_str)
    }

    /// Build the request URL: the path template followed by the path values
    /// as segments, then the query string if any.
    pub fn build_url<'a>(
        &self,
        path_values: impl IntoIterator<Item = &'a str>,
        query: &Params,
    ) -> String {
        let mut url = self.request.base_path().to_string();
        for value in path_values {
            url.push('/');
            url.push_str(value);
        }

        if !query.is_empty() {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }

        url
    }

    /// Validate the contract on its own.
    pub fn validate(&self, key: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidContract {
            key: key.to_string(),
            reason,
        };

        if self.response_examples.is_empty() {
            return Err(invalid("no response examples declared".to_string()));
        }
        if self.request_body.is_some() && !self.method.has_body() {
            return Err(invalid(format!(
                "{} contracts cannot declare a request body",
                self.method
            )));
        }
        for (name, response) in &self.response_examples {
            if response.status < 100 || response.status > 599 {
                return Err(invalid(format!(
                    "response '{}' has invalid status code {}",
                    name, response.status
                )));
            }
        }
        Ok(())
    }
}

/// Validate every contract and check that all transitions point at a
/// declared contract and response.
pub fn validate_contracts(contracts: &Contracts) -> Result<()> {
    for (key, contract) in contracts {
        contract.validate(key)?;
    }

    for (key, contract) in contracts {
        for (name, response) in &contract.response_examples {
            for (target, target_response) in &response.transitions {
                let target_contract = contracts.get(target).ok_or_else(|| {
                    Error::InvalidContract {
                        key: key.clone(),
                        reason: format!(
                            "response '{}' transitions unknown contract '{}'",
                            name, target
                        ),
                    }
                })?;
                if target_contract.response(target_response).is_none() {
                    return Err(Error::InvalidContract {
                        key: key.clone(),
                        reason: format!(
                            "response '{}' transitions '{}' to undeclared response '{}'",
                            name, target, target_response
                        ),
                    });
                }
            }
        }
    }
    Ok(())
}
