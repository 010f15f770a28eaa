//! Year Registry
//!
//! One connection pool per academic-year database, built once from
//! configuration at startup and read-only afterwards. Pools are
//! created lazily so an unreachable year shows up as per-cell update
//! failures instead of a startup crash.

use std::collections::HashMap;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::infrastructure::config::{AppConfig, DbTarget};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

pub struct YearRegistry {
    pools: HashMap<String, PgPool>,
}

impl YearRegistry {
    /// Build the registry from the `[years]` section of the config.
    pub fn from_config(config: &AppConfig) -> Self {
        let pools = config
            .years
            .iter()
            .map(|(year, target)| (year.clone(), lazy_pool(target)))
            .collect::<HashMap<_, _>>();

        info!(
            "Year registry initialized with {} database(s): [{}]",
            pools.len(),
            {
                let mut years: Vec<_> = pools.keys().map(String::as_str).collect();
                years.sort_unstable();
                years.join(", ")
            }
        );

        Self { pools }
    }

    pub(crate) fn from_pools(pools: HashMap<String, PgPool>) -> Self {
        Self { pools }
    }

    /// Pool for a registry key ("2021_2022"), if that year is configured.
    pub fn resolve(&self, year_key: &str) -> Option<&PgPool> {
        self.pools.get(year_key)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Catalog pool for the shared process/indicator/attribute tables.
pub fn catalog_pool(target: &DbTarget) -> PgPool {
    lazy_pool(target)
}

fn lazy_pool(target: &DbTarget) -> PgPool {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_lazy_with(target.connect_options())
}
