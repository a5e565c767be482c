//! Work model for a harvest run
//!
//! # Components
//!
//! - `WorkUnit`: the trait every schedulable fetch job implements
//! - `ListingPage` / `ProductLink`: the work units of the two stages
//! - `LinkRecord` / `ProductRecord`: what the two stages produce

mod record;
mod unit;

pub use record::{LinkRecord, ProductRecord, UNKNOWN_CATEGORY};
pub use unit::{ListingPage, ProductLink, WorkUnit};
