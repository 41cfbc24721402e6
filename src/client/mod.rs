//! Client side of the API: persisted session, typed HTTP calls and the
//! application state they feed.

pub mod actions;
pub mod error;
pub mod http;
pub mod report;
pub mod session;
pub mod state;

pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use session::SessionStore;
pub use state::{Action, AppState, Event, Slice};
