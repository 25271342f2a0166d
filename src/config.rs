use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the in-process store is used (local runs, demos).
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub super_admin_key: String,
    pub host: String,
    pub port: u16,
    /// Base URL used to build post permalinks in the banner.
    pub site_url: String,
    pub sweep_interval_secs: u64,
    pub notice_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            jwt_secret: required("JWT_SECRET")?,
            super_admin_key: env::var("SUPER_ADMIN_KEY")
                .unwrap_or_else(|_| "change_this_super_admin_key".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            site_url: env::var("SITE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost".into()),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
            notice_ttl_secs: env::var("NOTICE_TTL_SECS")
                .unwrap_or_else(|_| "45".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
