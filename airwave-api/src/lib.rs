// Airwave API Library
//
// HTTP surface of the streaming edge proxy

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
