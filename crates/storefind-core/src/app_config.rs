use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Lower-case ISO codes a location may resolve to; geocoder results from
    /// other countries are discarded and never cached.
    pub allowed_country_codes: Vec<String>,
    pub nominatim_url: String,
    pub geocoder_timeout_secs: u64,
    pub default_radius_km: f64,
    pub default_page_size: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub filter_radius_enabled: bool,
    pub filter_country_enabled: bool,
    pub filter_manufacturer_enabled: bool,
    pub filter_tags_enabled: bool,
}

impl AppConfig {
    /// The country hint appended to free-text geocoding queries: present only
    /// when exactly one country code is allowed.
    #[must_use]
    pub fn single_country_hint(&self) -> Option<&str> {
        match self.allowed_country_codes.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("allowed_country_codes", &self.allowed_country_codes)
            .field("nominatim_url", &self.nominatim_url)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("default_radius_km", &self.default_radius_km)
            .field("default_page_size", &self.default_page_size)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("filter_radius_enabled", &self.filter_radius_enabled)
            .field("filter_country_enabled", &self.filter_country_enabled)
            .field(
                "filter_manufacturer_enabled",
                &self.filter_manufacturer_enabled,
            )
            .field("filter_tags_enabled", &self.filter_tags_enabled)
            .finish()
    }
}
