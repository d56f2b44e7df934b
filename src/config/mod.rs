//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line
//!     → schema.rs (Options, one flag per field)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference into the run sequence
//!
//! cluster credentials
//!     → kube.rs (--kubeconfig / KUBECONFIG / in-cluster / ~/.kube/config)
//!     → loader.rs (read & deserialize kubeconfig)
//!     → ConnectionConfig (handed to the server untouched)
//! ```
//!
//! # Design Decisions
//! - Options are immutable once validated
//! - Every flag has a default so an empty command line is valid
//! - Validation separates syntactic (clap) from semantic checks

pub mod kube;
pub mod loader;
pub mod schema;
pub mod validation;

pub use kube::{ConfigSource, ConnectionConfig, ConnectionError, ConnectionResolver, KubeconfigResolver};
pub use schema::Options;
pub use validation::{ConfigError, ServiceConfig, ValidationError};
