// HTTP surface for the catalog sync: health check plus the password-gated
// sync trigger used by the static log page.

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
