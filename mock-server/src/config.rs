//! Command-line and environment configuration for the mock server binary.

use clap::Parser;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(about = "Pixelfed API stand-in for local development and tests")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
