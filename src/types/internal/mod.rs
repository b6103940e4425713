// Internal types - not exposed through the API surface
pub mod auth;

pub use auth::Claims;
