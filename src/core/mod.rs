// Core modules: error modeling, identifier conformance, scoped invocation.
pub mod error;
pub mod ident;
pub mod scope;
