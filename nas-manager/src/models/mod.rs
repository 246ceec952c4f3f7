//! Typed records for the TrueNAS API.
//!
//! Each `*Record` / `*Wire` type mirrors a JSON response and converts into
//! the domain type the rest of the crate works with.

pub mod dataset;
pub mod health;
pub mod pool;
pub mod replication;
pub mod snapshot;

pub use dataset::{CreateDatasetRequest, Dataset, UpdateDatasetRequest};
pub use health::{Alert, Disk, Service};
pub use pool::{Pool, SystemInfo};
pub use replication::{JobHandle, JobRecord, ReplicationTask, TaskState, TaskStatus};
pub use snapshot::{CreateSnapshotRequest, Snapshot};
