//! Proxy configuration loading.
//!
//! Loaded from `config/gatekeeper_config.json5`, or created from the bundled
//! default on first run — the same `load_or_create` shape the rest of this
//! family of servers uses for their own config files.

use std::{fs, net::SocketAddr, path::Path, sync::LazyLock, time::Duration};

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("default_config.json5");

/// The proxy's own configuration, loaded once at startup and never reloaded.
#[derive(Debug, Clone, Deserialize)]
pub struct GatekeeperConfig {
    /// Address this proxy listens on for incoming clients.
    pub listen_address: SocketAddr,
    /// The real game server this proxy forwards every connection to.
    pub upstream_host: String,
    /// The real game server's port.
    pub upstream_port: u16,
    /// The Mojang account this proxy authenticates as on behalf of every
    /// connecting player.
    pub username: String,
    /// That account's password.
    pub password: String,
    /// Cap on a single decoded frame's declared length, either side.
    pub max_packet_size: usize,
    /// Optional deadline, in milliseconds, on every individual frame read.
    pub read_timeout_ms: Option<u64>,
    /// `tracing`/`log` filter directive used unless `RUST_LOG` is set.
    pub log_filter: String,
}

impl GatekeeperConfig {
    /// `read_timeout_ms` as a [`Duration`].
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_packet_size == 0 {
            return Err("max_packet_size must be greater than 0".to_owned());
        }
        if self.upstream_port == 0 {
            return Err("upstream_port must be nonzero".to_owned());
        }
        if self.username.trim().is_empty() {
            return Err("username must not be empty — set a Mojang account in the config".to_owned());
        }
        Ok(())
    }

    /// Loads the config from `path`, or writes and loads the bundled default
    /// if no file exists yet.
    ///
    /// # Panics
    /// Panics if the file exists but fails to read, parse, or validate, or if
    /// the config directory can't be created when writing the default.
    #[must_use]
    fn load_or_create(path: &Path) -> Self {
        let config: Self = if path.exists() {
            let raw = fs::read_to_string(path).expect("failed to read config file");
            serde_json5::from_str(&raw).expect("failed to parse config file")
        } else {
            fs::create_dir_all(path.parent().expect("config path must have a parent directory"))
                .expect("failed to create config directory");
            fs::write(path, DEFAULT_CONFIG).expect("failed to write default config file");
            serde_json5::from_str(DEFAULT_CONFIG).expect("failed to parse bundled default config")
        };

        config.validate().expect("invalid configuration");
        config
    }
}

/// The proxy's configuration. Forcing this lazily on first access is what
/// triggers `load_or_create`.
pub static GATEKEEPER_CONFIG: LazyLock<GatekeeperConfig> =
    LazyLock::new(|| GatekeeperConfig::load_or_create(Path::new("config/gatekeeper_config.json5")));
