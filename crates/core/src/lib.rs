// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! harbor-core: local storage for the harbor offline data layer
//!
//! This crate holds everything that runs without a network or an async
//! runtime: priority tiers, operation ids, the cache and operation-queue
//! stores, and the managers built on them. The async side lives in
//! `harbor-engine`.

pub mod cache;
pub mod entry;
pub mod error;
pub mod hlc;
pub mod op;
pub mod priority;
pub mod queue;
pub mod store;

pub use cache::{CacheManager, CacheStats, TtlPolicy};
pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use hlc::{ClockSource, Hlc, HlcClock, ManualClock, SystemClock};
pub use op::{ConflictRecord, DocumentKey, OfflineOperation, OpId, OpKind};
pub use priority::Priority;
pub use queue::OperationQueue;
pub use store::{CacheBackend, Database, MemoryStore, QueueBackend};
