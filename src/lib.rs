//! Mock Relay
//!
//! A configurable mock endpoint server with a one-shot request relay.
//! Register a response definition under an id and every request for that
//! id receives the stored canned response; register a request definition
//! and replay it against the real remote endpoint it describes.
//!
//! # Features
//!
//! - **Canned Responses**: status, headers, body, and delay served by mock id
//! - **Latency Injection**: per-definition fixed delays
//! - **Request Relay**: replay stored or submitted requests against real endpoints
//! - **Registration API**: register and delete definitions over HTTP
//! - **Seeding**: load definitions from a YAML file at boot
//!
//! # Example Configuration
//!
//! ```yaml
//! listen:
//!   host: 127.0.0.1
//!   port: 8080
//! responses:
//!   - mockId: hello
//!     statusCode: 200
//!     headers:
//!       Content-Type: [text/plain]
//!     body: "Hello, World!"
//! ```

pub mod config;
pub mod definition;
pub mod error;
pub mod materialize;
pub mod replay;
pub mod server;
pub mod service;
pub mod store;

pub use config::MockRelayConfig;
pub use error::Error;
pub use service::MockService;
