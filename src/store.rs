//! Mock store implementation.
//!
//! The store resolves `(method, url)` calls against a contract collection.
//! Every contract has a currently selected response, which defaults to the
//! first declared example and changes through overrides, transitions and
//! bulk state seeding.

use crate::contract::{Contracts, Method, ResponseExample};
use crate::error::{Error, Result};
use crate::hold::{HoldGate, HoldMode, HoldTicket};
use crate::matcher;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Effective response key for every contract, in declaration order.
pub type StateSnapshot = IndexMap<String, String>;

/// Callback receiving the full selection snapshot after every mutation.
pub type StateObserver = Box<dyn Fn(&StateSnapshot) + Send + Sync>;

/// Logging switches for the store.
#[derive(Debug, Clone, Copy)]
pub struct LogSettings {
    /// Log every matched call
    pub log_matches: bool,
    /// Log calls no contract matched
    pub log_unmatched: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
        }
    }
}

/// Mock Store
///
/// Serves example responses for declared contracts and tracks which
/// response each contract currently returns.
pub struct MockStore {
    contracts: Arc<Contracts>,
    /// Explicit selections; contracts without an entry use their first response
    selected: Mutex<HashMap<String, String>>,
    gate: HoldGate,
    observer: Option<StateObserver>,
    logging: LogSettings,
    /// Total calls resolved.
    requests_total: AtomicU64,
    /// Calls matched to a contract.
    requests_matched: AtomicU64,
    /// Calls no contract matched.
    requests_unmatched: AtomicU64,
}

impl fmt::Debug for MockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStore")
            .field("contracts", &self.contracts.len())
            .field("selected", &*self.selected.lock())
            .field("hold_mode", &self.gate.mode())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl MockStore {
    /// Create a store with manual holds.
    pub fn new(contracts: impl Into<Arc<Contracts>>) -> Self {
        let contracts = contracts.into();

        info!(contracts = contracts.len(), "Mock store initialized");

        Self {
            contracts,
            selected: Mutex::new(HashMap::new()),
            gate: HoldGate::new(HoldMode::Manual),
            observer: None,
            logging: LogSettings::default(),
            requests_total: AtomicU64::new(0),
            requests_matched: AtomicU64::new(0),
            requests_unmatched: AtomicU64::new(0),
        }
    }

    /// Choose how held responses resolve.
    pub fn with_hold_mode(mut self, mode: HoldMode) -> Self {
        self.gate = HoldGate::new(mode);
        self
    }

    /// Register a callback that mirrors the selection state.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&StateSnapshot) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_logging(mut self, logging: LogSettings) -> Self {
        self.logging = logging;
        self
    }

    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    pub fn hold_mode(&self) -> HoldMode {
        self.gate.mode()
    }

    /// Get total calls resolved.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Get total calls matched.
    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    /// Get total calls unmatched.
    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }

    /// Resolve a call to the contract's currently selected response.
    ///
    /// Matching, the selection read and hold registration happen when this is
    /// called; the returned future only waits out the hold. It yields `None`
    /// when no contract matches. A held response suspends until released
    /// (manual mode) or the delay elapses (timed mode); its transitions are
    /// applied afterwards, before the response is returned.
    pub fn get_response(
        &self,
        method: Method,
        url: &str,
    ) -> impl Future<Output = Option<ResponseExample>> + Send + '_ {
        let selection = self.select(method, url);

        async move {
            let (key, response, ticket) = selection?;

            if let Some(ticket) = ticket {
                ticket.wait().await;
                debug!(contract = %key, "Held response resumed");
            }

            if !response.transitions.is_empty() {
                let snapshot = {
                    let mut selected = self.selected.lock();
                    for (target, target_response) in &response.transitions {
                        debug!(
                            from = %key,
                            contract = %target,
                            response = %target_response,
                            "Applying transition"
                        );
                        selected.insert(target.clone(), target_response.clone());
                    }
                    self.snapshot(&selected)
                };
                self.notify(&snapshot);
            }

            Some(response.clone())
        }
    }

    /// Match the call, read the contract's selection and register a hold if
    /// the selected response asks for one.
    fn select(
        &self,
        method: Method,
        url: &str,
    ) -> Option<(&str, &ResponseExample, Option<HoldTicket>)> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let Some(result) = matcher::find_match(&self.contracts, method, url) else {
            self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
            if self.logging.log_unmatched {
                warn!(method = %method, url = %url, "No matching contract found");
            }
            return None;
        };

        let key = result.key;
        let contract = result.contract;
        self.requests_matched.fetch_add(1, Ordering::Relaxed);

        let response_key = {
            let selected = self.selected.lock();
            match selected.get(key) {
                Some(response_key) => response_key.clone(),
                None => contract.default_response_key()?.to_string(),
            }
        };

        let Some(response) = contract.response(&response_key) else {
            warn!(
                contract = %key,
                response = %response_key,
                "Selected response is not declared by the contract"
            );
            return None;
        };

        if self.logging.log_matches {
            info!(
                contract = %key,
                response = %response_key,
                method = %method,
                url = %url,
                path_params = ?result.context.path_params,
                "Call matched contract"
            );
        }

        let ticket = response.hold.then(|| self.gate.enqueue(key));
        Some((key, response, ticket))
    }

    /// Force a contract to serve `response_key` from now on.
    pub fn set_response(&self, contract_key: &str, response_key: &str) -> Result<()> {
        self.check_selection(contract_key, response_key)?;

        let snapshot = {
            let mut selected = self.selected.lock();
            selected.insert(contract_key.to_string(), response_key.to_string());
            self.snapshot(&selected)
        };
        debug!(contract = %contract_key, response = %response_key, "Response overridden");
        self.notify(&snapshot);
        Ok(())
    }

    /// Wake the oldest held call for `contract_key`.
    ///
    /// Returns `false` when nothing was held.
    pub fn release(&self, contract_key: &str) -> bool {
        self.gate.release(contract_key)
    }

    /// Number of calls currently held for `contract_key`.
    pub fn pending_holds(&self, contract_key: &str) -> usize {
        self.gate.pending(contract_key)
    }

    /// Drop every override; all contracts go back to their first response.
    pub fn reset(&self) {
        let snapshot = {
            let mut selected = self.selected.lock();
            selected.clear();
            self.snapshot(&selected)
        };
        debug!("Mock store reset");
        self.notify(&snapshot);
    }

    /// Effective response key of every contract.
    pub fn get_state(&self) -> StateSnapshot {
        let selected = self.selected.lock();
        self.snapshot(&selected)
    }

    /// Apply a set of overrides in one step.
    ///
    /// Nothing is applied if any entry names an unknown contract or response.
    pub fn set_state<'a, I>(&self, state: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let entries: Vec<(&String, &String)> = state.into_iter().collect();
        for (contract_key, response_key) in &entries {
            self.check_selection(contract_key, response_key)?;
        }

        let snapshot = {
            let mut selected = self.selected.lock();
            for (contract_key, response_key) in &entries {
                selected.insert((*contract_key).clone(), (*response_key).clone());
            }
            self.snapshot(&selected)
        };
        debug!(entries = entries.len(), "Mock store state applied");
        self.notify(&snapshot);
        Ok(())
    }

    fn check_selection(&self, contract_key: &str, response_key: &str) -> Result<()> {
        let contract = self
            .contracts
            .get(contract_key)
            .ok_or_else(|| Error::UnknownContract(contract_key.to_string()))?;
        if contract.response(response_key).is_none() {
            return Err(Error::UnknownResponse {
                contract: contract_key.to_string(),
                response: response_key.to_string(),
            });
        }
        Ok(())
    }

    fn snapshot(&self, selected: &HashMap<String, String>) -> StateSnapshot {
        self.contracts
            .iter()
            .filter_map(|(key, contract)| {
                selected
                    .get(key)
                    .map(String::as_str)
                    .or_else(|| contract.default_response_key())
                    .map(|response| (key.clone(), response.to_string()))
            })
            .collect()
    }

    fn notify(&self, snapshot: &StateSnapshot) {
        if let Some(observer) = &self.observer {
            observer(snapshot);
        }
    }
}
