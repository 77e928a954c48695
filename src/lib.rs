pub mod api_client;
pub mod api_url;
pub mod backend;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod models;
pub mod negotiator;
pub mod params;
pub mod synth;
