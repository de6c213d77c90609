//! Destination warehouse
//!
//! `Warehouse` is the client seam used by the collision policy and the load
//! committer. `DuckDbWarehouse` is the bundled implementation.

mod engine;
mod types;

pub use engine::DuckDbWarehouse;
pub use types::{LoadJob, LoadRequest, LoadStats, Row, Warehouse};
