//! Service-oriented application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state. It wraps immutable infrastructure (DB pool, config, tools) in
//! `Arc`s together with the in-flight mux tracking map.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;

use hogar_av::ToolRegistry;
use hogar_core::config::Config;
use hogar_core::MovieId;
use hogar_db::pool::DbPool;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration.
    pub config: Arc<Config>,
    /// External tool registry.
    pub tools: Arc<ToolRegistry>,
    /// Movies with a mux currently in flight; waiters sleep on the Notify.
    pub mux_pending: Arc<DashMap<MovieId, Arc<Notify>>>,
}

impl AppContext {
    /// Build a context from its infrastructure pieces.
    pub fn new(db: DbPool, config: Arc<Config>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            db,
            config,
            tools,
            mux_pending: Arc::new(DashMap::new()),
        }
    }
}
