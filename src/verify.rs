//! Provider verification interactions.
//!
//! Every non-ignored response example becomes one interaction a
//! consumer-driven-contract verifier can replay against the real provider:
//! the request built from the contract's example values and the response
//! the example promises.

use crate::contract::{ContractDefinition, Contracts, Method, Params};
use serde::{Deserialize, Serialize};

/// Request half of an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub method: Method,
    /// Path with example path parameter values substituted
    pub path: String,
    /// Static headers merged with example header parameters
    pub headers: Params,
    pub query: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Response half of an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// One recorded request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Provider state, `"<contract> - <response>"`
    pub given: String,
    /// Contract description
    pub upon_receiving: String,
    pub request: InteractionRequest,
    pub response: InteractionResponse,
}

/// Build the request a verifier sends for `contract`.
pub fn example_request(contract: &ContractDefinition) -> InteractionRequest {
    let params = &contract.request.params;

    let mut headers = contract.request.headers.clone();
    for (name, value) in &params.header {
        headers.insert(name.clone(), value.clone());
    }

    InteractionRequest {
        method: contract.method,
        path: contract.build_url(params.path.values().map(String::as_str), &Params::new()),
        headers,
        query: params.query.clone(),
        body: contract.request_body.clone(),
    }
}

/// Interactions for every non-ignored example, in declaration order.
pub fn interactions(contracts: &Contracts) -> Vec<Interaction> {
    contracts
        .iter()
        .flat_map(|(contract_key, contract)| {
            let request = example_request(contract);
            contract
                .response_examples
                .iter()
                .filter(|(_, response)| !response.ignore)
                .map(move |(response_key, response)| Interaction {
                    given: format!("{} - {}", contract_key, response_key),
                    upon_receiving: contract.description.clone(),
                    request: request.clone(),
                    response: InteractionResponse {
                        status: response.status,
                        headers: response.headers.clone(),
                        body: response.body.clone(),
                    },
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{RequestDefinition, ResponseExample};
    use serde_json::json;

    fn test_contracts() -> Contracts {
        let mut contracts = Contracts::new();
        contracts.insert(
            "complexGetContract".to_string(),
            ContractDefinition::get(
                "Get Demo",
                RequestDefinition::new("/api/demo/")
                    .with_header("content-type", "application/json")
                    .with_path_param("one", "aaa")
                    .with_query_param("two", "bbb")
                    .with_header_param("three", "ccc"),
                vec![(
                    "success".to_string(),
                    ResponseExample::new(200)
                        .with_header("content-type", "application/json")
                        .with_body(json!({"value": "somevalue"})),
                )],
            ),
        );
        contracts.insert(
            "createDevice".to_string(),
            ContractDefinition::put(
                "create device request",
                RequestDefinition::new("/api/device")
                    .with_header_param("Authorization", "Bearer sometoken"),
                json!({"domain": "example.com"}),
                vec![
                    ("success".to_string(), ResponseExample::new(200)),
                    ("unauthorized".to_string(), ResponseExample::new(401)),
                    ("internal".to_string(), ResponseExample::new(500).ignored()),
                ],
            ),
        );
        contracts
    }

    #[test]
    fn test_example_request() {
        let contracts = test_contracts();
        let request = example_request(&contracts["complexGetContract"]);

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/api/demo/aaa");
        assert_eq!(request.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(request.headers.get("three").unwrap(), "ccc");
        assert_eq!(request.query.get("two").unwrap(), "bbb");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_interactions_skip_ignored() {
        let interactions = interactions(&test_contracts());

        let given: Vec<&str> = interactions.iter().map(|i| i.given.as_str()).collect();
        assert_eq!(
            given,
            vec![
                "complexGetContract - success",
                "createDevice - success",
                "createDevice - unauthorized",
            ]
        );

        let unauthorized = &interactions[2];
        assert_eq!(unauthorized.upon_receiving, "create device request");
        assert_eq!(unauthorized.request.method, Method::Put);
        assert_eq!(unauthorized.request.body, Some(json!({"domain": "example.com"})));
        assert_eq!(unauthorized.response.status, 401);
        assert!(unauthorized.response.body.is_none());
    }

    #[test]
    fn test_interactions_serialize() {
        let interactions = interactions(&test_contracts());
        let value = serde_json::to_value(&interactions[0]).unwrap();

        assert_eq!(value["request"]["method"], "GET");
        assert_eq!(value["response"]["body"]["value"], "somevalue");
        assert!(value["request"].get("body").is_none());
    }
}
