//! Request module for insights
//!
//! Inbound request kinds and the router that normalizes them.

mod kind;
mod router;

pub use kind::RequestKind;
pub use router::{route, Payload, Request, RoutedRequest};
