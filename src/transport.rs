//! Transport strategy.
//!
//! Contracts issue their calls through a [`Transport`] chosen by the caller.
//! [`MockTransport`] answers from a [`MockStore`]; real network transports
//! live outside this crate and implement the same trait.

use crate::contract::{ContractDefinition, Method, Params};
use crate::error::{Error, Result};
use crate::store::MockStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Status and body returned by a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// A single-operation HTTP transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        headers: &Params,
        body: Option<&serde_json::Value>,
    ) -> Result<FetchResponse>;
}

/// Transport answering every call from a mock store.
///
/// A call no contract matches fails with [`Error::MissingMockResult`] so a
/// missing fixture surfaces immediately.
#[derive(Debug, Clone)]
pub struct MockTransport {
    store: Arc<MockStore>,
}

impl MockTransport {
    pub fn new(store: Arc<MockStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<MockStore> {
        &self.store
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        _headers: &Params,
        _body: Option<&serde_json::Value>,
    ) -> Result<FetchResponse> {
        match self.store.get_response(method, url).await {
            Some(response) => Ok(FetchResponse {
                status: response.status,
                body: response.body,
            }),
            None => {
                warn!(method = %method, url = %url, "Mock mode call without a configured response");
                Err(Error::MissingMockResult {
                    method,
                    url: url.to_string(),
                })
            }
        }
    }
}

/// Concrete parameter values for one call of a contract.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Path parameter values, appended to the path in order
    pub path: Params,
    pub query: Params,
    pub header: Params,
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    /// A request using the contract's own example values.
    pub fn from_examples(contract: &ContractDefinition) -> Self {
        Self {
            path: contract.request.params.path.clone(),
            query: contract.request.params.query.clone(),
            header: contract.request.params.header.clone(),
            body: contract.request_body.clone(),
        }
    }
}

impl ContractDefinition {
    /// Issue a call for this contract through `transport`.
    ///
    /// Static headers are sent first; header parameters override them.
    pub async fn fetch(
        &self,
        transport: &dyn Transport,
        request: &FetchRequest,
    ) -> Result<FetchResponse> {
        let url = self.build_url(request.path.values().map(String::as_str), &request.query);

        let mut headers = self.request.headers.clone();
        for (name, value) in &request.header {
            headers.insert(name.clone(), value.clone());
        }

        debug!(method = %self.method, url = %url, "Fetching contract");
        transport
            .fetch(self.method, &url, &headers, request.body.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contracts, RequestDefinition, ResponseExample};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedCall {
        method: Method,
        url: String,
        headers: Params,
        body: Option<serde_json::Value>,
    }

    /// Transport that records its calls and answers 204.
    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<RecordedCall>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn fetch(
            &self,
            method: Method,
            url: &str,
            headers: &Params,
            body: Option<&serde_json::Value>,
        ) -> Result<FetchResponse> {
            self.calls.lock().push(RecordedCall {
                method,
                url: url.to_string(),
                headers: headers.clone(),
                body: body.cloned(),
            });
            Ok(FetchResponse {
                status: 204,
                body: None,
            })
        }
    }

    fn params(items: &[(&str, &str)]) -> Params {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn request() -> FetchRequest {
        FetchRequest {
            path: params(&[("p", "path")]),
            query: params(&[("q", "query")]),
            header: params(&[("h", "header")]),
            body: None,
        }
    }

    fn success() -> Vec<(String, ResponseExample)> {
        vec![(
            "success".to_string(),
            ResponseExample::new(200).with_body(json!({"name": "myName"})),
        )]
    }

    #[tokio::test]
    async fn test_fetch_builds_call_per_method() {
        let transport = RecordingTransport::default();

        let get =
            ContractDefinition::get("Description", RequestDefinition::new("/api/test"), success());
        get.fetch(&transport, &request()).await.unwrap();

        let delete = ContractDefinition::delete(
            "Description",
            RequestDefinition::new("/api/test"),
            success(),
        );
        delete.fetch(&transport, &request()).await.unwrap();

        let post = ContractDefinition::post(
            "Description",
            RequestDefinition::new("/api/test"),
            json!({"id": "someId"}),
            success(),
        );
        let mut with_body = request();
        with_body.body = Some(json!({"id": "myId"}));
        post.fetch(&transport, &with_body).await.unwrap();

        let calls = transport.calls.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].method, Method::Get);
        assert_eq!(calls[0].url, "/api/test/path?q=query");
        assert_eq!(calls[0].headers, params(&[("h", "header")]));
        assert_eq!(calls[0].body, None);
        assert_eq!(calls[1].method, Method::Delete);
        assert_eq!(calls[2].method, Method::Post);
        assert_eq!(calls[2].body, Some(json!({"id": "myId"})));
    }

    #[tokio::test]
    async fn test_header_params_override_static_headers() {
        let transport = RecordingTransport::default();
        let contract = ContractDefinition::get(
            "Description",
            RequestDefinition::new("/api/test")
                .with_header("x-client", "web")
                .with_header("authorization", "none"),
            success(),
        );

        let request = FetchRequest {
            header: params(&[("authorization", "Bearer token")]),
            ..FetchRequest::default()
        };
        contract.fetch(&transport, &request).await.unwrap();

        let calls = transport.calls.lock();
        assert_eq!(
            calls[0].headers,
            params(&[("x-client", "web"), ("authorization", "Bearer token")])
        );
    }

    #[tokio::test]
    async fn test_mock_transport_round_trip() {
        let mut contracts = Contracts::new();
        contracts.insert(
            "getContract".to_string(),
            ContractDefinition::get(
                "Description",
                RequestDefinition::new("/api/test")
                    .with_path_param("id", "someId")
                    .with_query_param("lang", "en"),
                success(),
            ),
        );
        let contract = contracts["getContract"].clone();
        let transport = MockTransport::new(Arc::new(MockStore::new(contracts)));

        let response = contract
            .fetch(&transport, &FetchRequest::from_examples(&contract))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(json!({"name": "myName"})));
        assert_eq!(transport.store().total_matched(), 1);
    }

    #[tokio::test]
    async fn test_mock_transport_missing_result() {
        let transport = MockTransport::new(Arc::new(MockStore::new(Contracts::new())));

        let err = transport
            .fetch(Method::Get, "/api/nothing", &Params::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMockResult { method: Method::Get, ref url } if url == "/api/nothing"
        ));
    }
}
