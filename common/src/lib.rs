//! Wire model shared by the CRM backend and its clients.
//!
//! - `model`: the stored entities (`Lead`, `Document`, `Call`) and their enumerations.
//! - `requests`: validated request payloads accepted by the create/update endpoints.
//! - `responses`: response bodies, including the uniform error body.

pub mod model;
pub mod requests;
pub mod responses;
