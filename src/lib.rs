//! kumo core library.
//!
//! This library provides the command line interface definitions and the
//! resource graph machinery for declaring a cloud stack: configuration
//! loading, dependency-aware graph construction with deferred references,
//! deterministic plan generation, and the hand-off to the external
//! orchestration engine.

pub mod cli;
pub mod config;
pub mod graph;
pub mod hasher;
pub mod plan_gen;
pub mod resource;
pub mod runner;
pub mod secret;
pub mod stack;
