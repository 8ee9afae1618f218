//! Persistence collaborator
//!
//! The console hands finished records to a store through `RecordStore`.
//! `Catalog` is the local SQLite implementation; a remote API client would
//! implement the same trait.

pub mod catalog;

pub use catalog::Catalog;

use crate::entity::EntityKind;
use crate::error::Result;
use crate::submit::OutboundRecord;

pub trait RecordStore {
    /// Store a new record and return its id
    fn create(&mut self, kind: EntityKind, record: &OutboundRecord) -> Result<i64>;

    /// Apply `record` over the stored one. Absent keys are left alone,
    /// explicit nulls clear.
    fn update(&mut self, kind: EntityKind, id: i64, record: &OutboundRecord) -> Result<()>;

    fn get(&self, kind: EntityKind, id: i64) -> Result<OutboundRecord>;
}
