//! Domain value types shared by every backend.
//!
//! Nothing in here touches an OS API.  The types describe keyboard state
//! (modifier masks, key events), what a backend can do, and how long to
//! wait between synthesized events, so they can be built and tested on any
//! platform.

/// Which native input mechanism a sender or listener uses.
pub mod backend;

/// Feature flags a backend reports about itself.
pub mod capabilities;

/// The normalized event delivered to listener callbacks.
pub mod event;

/// Modifier bitmask and the held-key tracker that derives it.
pub mod modifier;

/// Inter-event delay used by synthesized taps.
pub mod timing;
