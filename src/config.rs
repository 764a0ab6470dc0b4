//! Boot-time configuration: environment variables read once at startup
//! and folded over whatever the catalog itself declares. Mirrors
//! `groblegark-oddjobs`'s `Config::load` — one place that reads `std::env`,
//! so the rest of the process never has to.

use jobwarden_model::Catalog;

/// Logging knobs, read straight from the process environment.
pub struct LogConfig {
    pub level: Option<String>,
    pub timestamp_format: Option<String>,
    /// `ansi` enables a human-oriented, colored dev-mode layer instead of
    /// the default compact one.
    pub format: Option<String>,
    pub file: Option<String>,
    pub stdout: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").ok(),
            timestamp_format: std::env::var("LOG_TIMESTAMP_FORMAT").ok(),
            format: std::env::var("LOG_FORMAT").ok(),
            file: std::env::var("LOG_FILE").ok(),
            stdout: env_bool("LOG_STDOUT").unwrap_or(true),
        }
    }
}

/// The HTTP trigger server's bind address, metrics toggle and basic-auth
/// credentials. Catalog values are the default; `WEBSERVER_*` environment
/// variables, when set, take precedence — the same override order
/// `groblegark-oddjobs` uses for its own daemon settings.
pub struct WebserverConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub metrics: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl WebserverConfig {
    pub fn resolve(catalog: &Catalog) -> Self {
        Self {
            address: std::env::var("WEBSERVER_ADDRESS").ok().or_else(|| catalog.webserver_address.clone()),
            port: std::env::var("WEBSERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(catalog.webserver_port),
            metrics: env_bool("WEBSERVER_METRICS").unwrap_or(catalog.webserver_metrics),
            username: std::env::var("WEBSERVER_USERNAME").ok().or_else(|| catalog.webserver_username.clone()),
            password: std::env::var("WEBSERVER_PASSWORD").ok().or_else(|| catalog.webserver_password.clone()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.address.is_some() || self.port.is_some()
    }

    pub fn socket_addr(&self) -> String {
        let host = self.address.as_deref().unwrap_or("127.0.0.1");
        let port = self.port.unwrap_or(8080);
        format!("{host}:{port}")
    }

    /// `None` unless both a username and a non-empty password are set;
    /// per spec, a partially or fully blank credential pair serves
    /// unauthenticated rather than lock everyone out.
    pub fn basic_auth(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user.clone(), pass.clone()))
            }
            _ => None,
        }
    }
}

/// Applies the catalog's (or environment's) `SHELL`/`SHELL_ARGS` to the
/// process environment once at startup, so every `LocalConnection` picks
/// them up from `std::env::vars()` without threading them through every
/// call site.
pub fn apply_shell_env(catalog: &Catalog) {
    if std::env::var_os("SHELL").is_none() {
        if let Some(shell) = &catalog.shell {
            std::env::set_var("SHELL", shell);
        }
    }
    if std::env::var_os("SHELL_ARGS").is_none() {
        if let Some(shell_args) = &catalog.shell_args {
            std::env::set_var("SHELL_ARGS", shell_args);
        }
    }
}

fn env_bool(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
