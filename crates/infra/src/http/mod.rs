mod client;

pub use client::{status_error, BasicAuth, HttpClient, HttpClientBuilder};
