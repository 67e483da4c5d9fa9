use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};
use kirha_client::{ClientConfig, DEFAULT_BASE_URL};
use kirha_mcp::transport::http::DEFAULT_PATH;
use kirha_mcp::HttpTransportConfig;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

/// Connection settings for the Kirha API.
#[derive(Args, Debug, Clone)]
pub struct KirhaArgs {
    /// API key used as bearer token
    #[arg(long, env = "KIRHA_API_KEY", default_value = "", hide_default_value = true, hide_env_values = true)]
    pub api_key: String,

    /// Vertical the tool catalog is scoped to
    #[arg(long = "vertical", env = "KIRHA_VERTICAL", default_value = "", hide_default_value = true)]
    pub vertical_id: String,

    /// Base URL of the Kirha API
    #[arg(long, env = "KIRHA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Per-request timeout (e.g. 120s, 2m, 500ms)
    #[arg(long, env = "KIRHA_TIMEOUT", default_value = "120s", value_parser = parse_duration)]
    pub timeout: Duration,
}

impl KirhaArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_key: self.api_key.clone(),
            vertical_id: self.vertical_id.clone(),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        }
    }
}

/// Settings of the HTTP transport.
#[derive(Args, Debug, Clone)]
pub struct HttpArgs {
    /// Port to listen on
    #[arg(long, env = "MCP_PORT", default_value_t = 8022)]
    pub port: u16,

    /// Upper bound in seconds on handling one MCP request
    #[arg(long, env = "MCP_TOOL_CALL_TIMEOUT_SECONDS", default_value_t = 120)]
    pub tool_call_timeout_seconds: u64,

    /// Endpoint path for MCP messages
    #[arg(long, default_value = DEFAULT_PATH)]
    pub path: String,
}

impl HttpArgs {
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            addr: SocketAddr::from(([0, 0, 0, 0], self.port)),
            path: self.path.clone(),
            response_timeout: Duration::from_secs(self.tool_call_timeout_seconds),
        }
    }
}

/// Logging switch. Logs are off unless enabled.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Write structured logs to stderr
    #[arg(
        long,
        env = "ENABLE_LOGS",
        global = true,
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_logs: bool,
}

/// Parse a duration such as `120s`, `2m`, `500ms`, `1h` or bare seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration: {:?}", raw))?;

    let seconds = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: {:?}", raw))
    };

    match unit.trim() {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => seconds(60),
        "h" => seconds(3600),
        other => Err(format!("unknown duration unit {:?} in {:?}", other, raw)),
    }
}
