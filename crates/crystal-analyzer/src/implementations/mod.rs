//! Find-implementations via the Crystal compiler's introspection tool.
//!
//! The compiler does all the semantic work; this module is the bridge:
//! an admission gate bounding concurrent subprocesses, the subprocess
//! invocation itself, and the translation of its JSON answer into LSP
//! locations.

pub(crate) mod gate;
pub(crate) mod invoker;
pub(crate) mod provider;
pub(crate) mod response;

pub use gate::{AdmissionGate, AdmissionPermit};
pub use invoker::{
    ImplementationHit, ImplementationsError, ImplementationsRequest, InvocationContext, ToolResult,
    tool_args,
};
pub use provider::{ImplementationsProvider, InvocationOutcome, translate};
