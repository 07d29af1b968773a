//! Progress reporting for conversation turns

pub mod reporter;
