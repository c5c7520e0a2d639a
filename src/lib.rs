//! Tracegen: AI-assisted requirement extraction and test-case traceability.
//!
//! Uploaded domain documents are mined for structured requirements with a
//! generative model, each requirement is fanned out into test cases, and the
//! resulting requirement→test-case graph can be pushed to an issue tracker.
//! Fan-out work runs through a bounded dispatcher so one slow or failing
//! call never sinks a batch.

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod document;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod tracker;
