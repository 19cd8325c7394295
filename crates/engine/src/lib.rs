// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! harbor-engine: the async half of the harbor offline data layer
//!
//! Builds on `harbor-core` storage to replay queued writes against a
//! remote document store, track connectivity, bound concurrent remote
//! access per resource path, and monitor query performance. Applications
//! construct a single [`DataLayer`] and call through it.

pub mod config;
pub mod connections;
pub mod connectivity;
pub mod error;
pub mod layer;
pub mod listeners;
pub mod monitor;
pub mod pool;
pub mod remote;
pub mod status;
pub mod subscription;
pub mod sync;

#[cfg(test)]
mod test_helpers;

pub use config::Config;
pub use connections::ConnectionPoolManager;
pub use connectivity::{ConnectivityChanges, ConnectivityMonitor, ReachabilityProbe};
pub use error::{Error, Result};
pub use layer::{apply_optimistic, document_cache_key, DataLayer, DataLayerBuilder};
pub use listeners::{ListenerPoolManager, ListenerSubscription};
pub use monitor::{
    Alert, AlertConfig, AlertKind, OptimizationSuggestion, PerformanceMonitor, PerformanceSummary,
    QueryPerformanceMetrics, QueryStatus,
};
pub use pool::{Pool, PoolHandle, PoolKind, PoolManager, PoolStatistics};
pub use remote::{
    ApplyOutcome, ApplyRequest, Filter, FilterOp, QueryPage, QueryRequest, RemoteError,
    RemoteStore, RemoteUpdate,
};
pub use status::{SyncStatus, SyncStatusInfo};
pub use subscription::Subscription;
pub use sync::SyncEngine;
