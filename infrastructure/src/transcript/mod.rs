//! File-backed transcript storage.

mod json_store;

pub use json_store::JsonTranscriptStore;
