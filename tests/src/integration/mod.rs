//! Integration scenarios.

pub mod auth_flows;
pub mod bus_flows;
#[cfg(test)]
pub mod support;
