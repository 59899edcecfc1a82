use clap::Parser;
use palm_proxy::proxy_state::{DEFAULT_BASE_URL, ProxyConfig};

#[derive(Parser, Debug)]
#[command(name = "palm-proxy")]
#[command(about = "Chat proxy for the PaLM API with per-request key validation")]
struct CliArgs {
    /// Host address to bind the proxy server
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the proxy server
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Fallback PaLM key injected when the caller provides none
    #[arg(long, env = "PALM_API_KEY", hide_env_values = true)]
    palm_api_key: Option<String>,

    /// Base URL of the Generative Language API
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 600)]
    timeout: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl CliArgs {
    fn into_config(self) -> ProxyConfig {
        ProxyConfig {
            host: self.host,
            port: self.port,
            palm_api_key: self.palm_api_key,
            base_url: self.base_url,
            timeout: self.timeout,
            log_level: self.log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    palm_proxy::run(args.into_config())
}
