//! Value types shared by the engine, the habit aggregate and storage.

mod entry;
mod frequency;
mod timestamp;

pub use entry::{Entry, EntryValue, Interval};
pub use frequency::Frequency;
pub use timestamp::{Timestamp, TruncateField};
