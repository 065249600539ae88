//! Worldview dashboard: an HTTP service over the discourse datastore plus a
//! terminal client for browsing worldviews and discussing their patterns.

pub mod api;
pub mod app;
pub mod client;
pub mod model;
pub mod service;
pub mod store;
