//! URL matching logic.
//!
//! Decides which declared contract an incoming `(method, url)` call targets.
//! Matching is structural: only parameter names and path arity are checked,
//! never parameter values.

use crate::contract::{ContractDefinition, Contracts, Method};
use std::collections::{HashMap, HashSet};

/// Context captured during matching.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    /// Path segments paired with the declared path parameter names
    pub path_params: HashMap<String, String>,
    /// Query parameters
    pub query_params: HashMap<String, String>,
}

/// Result of matching a call against the contract collection.
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// Key of the matched contract
    pub key: &'a str,
    /// The matched contract
    pub contract: &'a ContractDefinition,
    /// Context captured during matching
    pub context: MatchContext,
}

/// Whether `contract` matches the call.
pub fn matches(contract: &ContractDefinition, method: Method, url: &str) -> bool {
    match_contract(contract, method, url).is_some()
}

/// Find the first matching contract in declaration order.
pub fn find_match<'a>(
    contracts: &'a Contracts,
    method: Method,
    url: &str,
) -> Option<MatchResult<'a>> {
    contracts
        .iter()
        .filter(|(_, contract)| contract.method == method)
        .find_map(|(key, contract)| {
            match_contract(contract, method, url).map(|context| MatchResult {
                key: key.as_str(),
                contract,
                context,
            })
        })
}

fn match_contract(
    contract: &ContractDefinition,
    method: Method,
    url: &str,
) -> Option<MatchContext> {
    if contract.method != method {
        return None;
    }

    let remainder = url.strip_prefix(contract.request.base_path())?;
    let (path_part, query_string) = match remainder.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (remainder, None),
    };

    // Arity only: values are never compared
    let segments: Vec<&str> = path_part
        .split('/')
        .filter(|s| !s.trim().is_empty())
        .collect();
    let declared_path = &contract.request.params.path;
    if segments.len() != declared_path.len() {
        return None;
    }

    let declared_query = &contract.request.params.query;
    let query_string = query_string.unwrap_or("");
    let present = query_keys(query_string);
    if present.is_empty() {
        if !declared_query.is_empty() {
            return None;
        }
    } else {
        // Raw keys; extra undeclared keys are rejected as well as missing ones
        let declared: HashSet<&str> = declared_query.keys().map(String::as_str).collect();
        if present != declared {
            return None;
        }
    }
    let query_params = parse_query_string(query_string);

    let path_params = declared_path
        .keys()
        .zip(segments)
        .map(|(name, value)| (name.clone(), urlencoding_decode(value)))
        .collect();

    Some(MatchContext {
        path_params,
        query_params,
    })
}

/// Query keys exactly as they appear in the URL.
fn query_keys(query: &str) -> HashSet<&str> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| part.split_once('=').map_or(part, |(key, _)| key))
        .collect()
}

/// Parse a query string into key-value pairs.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            params.insert(urlencoding_decode(key), urlencoding_decode(value));
        } else {
            params.insert(urlencoding_decode(part), String::new());
        }
    }

    params
}

/// Simple URL decoding.
fn urlencoding_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut rest = s.as_bytes();

    while let Some((&b, tail)) = rest.split_first() {
        match b {
            b'%' if tail.len() >= 2 => {
                let decoded = std::str::from_utf8(&tail[..2])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        bytes.push(byte);
                        rest = &tail[2..];
                    }
                    None => {
                        bytes.push(b'%');
                        rest = tail;
                    }
                }
            }
            b'+' => {
                bytes.push(b' ');
                rest = tail;
            }
            _ => {
                bytes.push(b);
                rest = tail;
            }
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
