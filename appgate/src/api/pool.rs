//! HTTP transport settings for the admin API

use std::time::Duration;

use super::error::ApiError;

pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    /// Per attempt; the operation deadline bounds the whole call
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
    /// Skip TLS verification; collectives commonly run self-signed certificates
    pub insecure: bool,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(20),
            tcp_keepalive: Some(Duration::from_secs(30)),
            insecure: true,
        }
    }
}

impl ConnectionPoolConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.insecure)
            .timeout(self.request_timeout)
            .connect_timeout(self.connection_timeout)
            .pool_idle_timeout(self.idle_timeout)
            .pool_max_idle_per_host(self.max_idle_connections)
            .user_agent(concat!("terraform-provider-appgate/", env!("CARGO_PKG_VERSION")));

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder.build().map_err(ApiError::Transport)
    }
}
