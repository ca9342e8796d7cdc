//! Session surface: the fluent load API, the loader seam, and lifecycle
//! pass-throughs over the session's load-state tracker.

mod load;
mod response;
mod session;

#[cfg(test)]
mod tests;

pub use load::{FluentLoadRequest, LoadRequest, LoadTarget, Loader};
pub use response::Response;
pub use session::{AccessPredicate, Session};
