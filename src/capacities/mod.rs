//! Capacities API client
//!
//! A thin, stateless-per-call wrapper over the two remote operations the
//! sync layer needs (save weblink, list spaces) plus the daily-note push.
//! Requests carry bearer-token auth and JSON bodies; any non-success
//! response surfaces as a typed error with status and body.

mod client;
#[cfg(test)]
pub mod mock;
mod types;

pub use client::{CapacitiesApi, CapacitiesClient};
pub use types::{
    SaveWeblinkParams, SaveWeblinkResponse, SpaceIcon, SpaceInfo, SpacesResponse, API_BASE_URL,
};
