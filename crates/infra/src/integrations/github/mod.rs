//! Code forge integration
//!
//! Read-only REST client for the forge's issue and comment listings. Listings
//! follow `Link: <...>; rel="next"` pagination until exhausted and always ask
//! for every state in ascending creation order, so repeated passes see issues
//! in a stable order.

pub mod client;

pub use client::GithubClient;
