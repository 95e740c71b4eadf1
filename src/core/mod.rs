//! Compliance engine: contract and document models, the structural checker,
//! the JS runtime bridge, and the runner that ties them together.

pub mod compliance;
pub mod config;
pub mod document;
pub mod error;
pub mod html_check;
pub mod js_bridge;
pub mod output;
pub mod report;
pub mod spec;
