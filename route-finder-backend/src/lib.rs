//! Backend crate for the cheapest routes web app.
//!
//! Route stores supply the known direct routes, the router searches them and the web app
//! exposes both over HTTP.

pub mod config;
pub mod route_store;
pub mod router;
pub mod web_app;
