//! Swarm lifecycle client for the Docker Engine API.
//!
//! This crate wraps the four cluster administration endpoints (`/swarm/init`,
//! `/swarm/join`, `/swarm/leave` and `/swarm/update`) behind typed options and
//! an asynchronous client. Requests go through a [`docker_core::Transport`], so
//! any transport errors reach the caller untouched.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{SwarmClient, SwarmClientBuilder};
pub use models::{
    Annotations, CaConfig, ClusterSpec, DispatcherConfig, Driver, ExternalCa, ExternalCaProtocol,
    InitRequest, InitSwarmOptions, JoinRequest, JoinSwarmOptions, LeaveSwarmOptions,
    OrchestrationConfig, RaftConfig, TaskDefaults, UpdateSwarmOptions,
};

/// Convenient result alias that reuses the shared Docker error type.
pub type Result<T> = docker_core::Result<T>;
