//! Application layer for typr-io.
//!
//! Holds the backend-agnostic facades and the traits that OS backends in
//! the infrastructure layer implement.
//!
//! **Dependency rule**: this layer depends only on `typr_core` and the
//! standard library.  It never names a concrete backend, except through
//! the default type parameters that pick the platform backend.

/// `Sender` facade and the `KeyboardDriver` backend trait.
pub mod sender;

/// `Listener` facade, the `CaptureBackend` trait, and the capture thread
/// handle shared by every backend.
pub mod listener;
