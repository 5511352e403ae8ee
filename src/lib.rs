//! GuIA: Project Guide Generation Worker
//!
//! Consumes queued guide-generation requests and produces multi-section
//! textual guides by calling a generative-text service. Progress and all
//! durable state live in an external project service; each queue record is
//! processed to completion independently.

pub mod completion;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod project;
