//! Contract documentation output.
//!
//! Produces a stable JSON document of a contract collection with internal
//! wiring removed: transitions are dropped and examples flagged `ignore`
//! are left out entirely.

use crate::contract::Contracts;
use crate::error::Result;

/// Copy of `contracts` as it appears in published documentation.
pub fn documented(contracts: &Contracts) -> Contracts {
    let mut public = contracts.clone();
    for contract in public.values_mut() {
        contract.response_examples.retain(|_, response| !response.ignore);
        for response in contract.response_examples.values_mut() {
            response.transitions.clear();
        }
    }
    public
}

/// Serialize contracts to pretty-printed JSON in declaration order.
pub fn serialize(contracts: &Contracts) -> Result<String> {
    Ok(serde_json::to_string_pretty(&documented(contracts))?)
}
