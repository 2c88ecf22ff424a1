//! Consumer-Driven Contracts
//!
//! Declare each HTTP endpoint a client talks to as a contract, then simulate
//! those endpoints in-process during tests without a network or backend.
//!
//! # Features
//!
//! - **URL Matching**: Calls are matched by method, path template, path arity and query keys
//! - **Response Selection**: Each contract serves one named example at a time
//! - **Transitions**: Serving a response can change what another contract returns
//! - **Held Responses**: Keep a call pending until released or a fixed delay elapses
//! - **Documentation**: Stable JSON output with internal wiring stripped
//! - **Provider Verification**: One interaction per published response example
//!
//! # Example Configuration
//!
//! ```yaml
//! contracts:
//!   get_customers:
//!     description: Get customers
//!     method: GET
//!     request:
//!       path: /api/customers
//!     response_examples:
//!       success:
//!         status: 200
//!         body: [{ name: Adam }]
//!       with_caesar:
//!         status: 200
//!         body: [{ name: Adam }, { name: Caesar }]
//!   add_customer:
//!     description: Add new customer
//!     method: POST
//!     request:
//!       path: /api/customer
//!     request_body: { name: Caesar }
//!     response_examples:
//!       success:
//!         status: 200
//!         transitions:
//!           get_customers: with_caesar
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod hold;
pub mod matcher;
pub mod serialize;
pub mod store;
pub mod transport;
pub mod verify;

pub use config::MockConfig;
pub use contract::{ContractDefinition, Contracts, Method, RequestDefinition, ResponseExample};
pub use error::{Error, Result};
pub use hold::HoldMode;
pub use store::MockStore;
pub use transport::{FetchRequest, FetchResponse, MockTransport, Transport};
