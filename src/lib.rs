//! Personal routine tracker. A checklist is answered once in a while, the answers are kept as
//! history, graphed questions get rolling statistics and threshold alerts, and a small wiki
//! holds free-form notes. Everything lives in a local directory.
//!

pub mod alerts;
pub mod app;
pub mod checklist;
pub mod cli;
pub mod fs;
pub mod history;
pub mod sequencer;
pub mod session;
pub mod stats;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
