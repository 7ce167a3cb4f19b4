use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// Outbox drain interval in seconds.
    pub sync_interval: u64,
    /// Bidirectional reconcile interval in seconds.
    pub reconcile_interval: u64,
    /// Connectivity probe interval in seconds.
    pub probe_interval: u64,
    pub max_retry: u32,
    pub batch_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Scopes reconciler pulls to one account on multi-tenant stores.
    pub owner_id: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/orbiter.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 60,
                reconcile_interval: 300,
                probe_interval: 30,
                max_retry: 3,
                batch_size: 100,
            },
            remote: RemoteConfig {
                endpoint: String::new(),
                api_key: None,
                owner_id: None,
                request_timeout: 10,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("ORBITER_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("ORBITER_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("ORBITER_SYNC_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("ORBITER_RECONCILE_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.reconcile_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("ORBITER_PROBE_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.probe_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("ORBITER_SYNC_MAX_RETRY") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.max_retry = u32::try_from(value.max(1)).unwrap_or(u32::MAX);
            }
        }
        if let Ok(v) = std::env::var("ORBITER_SYNC_BATCH_SIZE") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.batch_size = u32::try_from(value.max(1)).unwrap_or(u32::MAX);
            }
        }
        if let Ok(v) = std::env::var("ORBITER_REMOTE_ENDPOINT") {
            if !v.trim().is_empty() {
                cfg.remote.endpoint = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var("ORBITER_REMOTE_API_KEY") {
            if !v.trim().is_empty() {
                cfg.remote.api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("ORBITER_OWNER_ID") {
            if !v.trim().is_empty() {
                cfg.remote.owner_id = Some(v);
            }
        }

        cfg
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.sync.reconcile_interval == 0 {
            return Err("Sync reconcile_interval must be greater than 0".to_string());
        }
        if self.sync.probe_interval == 0 {
            return Err("Sync probe_interval must be greater than 0".to_string());
        }
        if self.sync.batch_size == 0 {
            return Err("Sync batch_size must be greater than 0".to_string());
        }
        if self.sync.max_retry == 0 {
            return Err("Sync max_retry must be greater than 0".to_string());
        }
        if !self.remote.endpoint.is_empty()
            && !self.remote.endpoint.starts_with("http://")
            && !self.remote.endpoint.starts_with("https://")
        {
            return Err("Remote endpoint must include http:// or https://".to_string());
        }
        Ok(())
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
