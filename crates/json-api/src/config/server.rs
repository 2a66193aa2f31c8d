//! Listener settings

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use clap::Args;

/// Where the API listens and how long in-flight requests get on shutdown.
#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    /// Listen address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Listen port
    #[arg(short, long, env = "SERVER_PORT", default_value = "3333")]
    pub port: u16,

    /// Seconds to let in-flight requests finish after SIGINT/SIGTERM
    #[arg(long, env = "SERVER_SHUTDOWN_GRACE_SECS", default_value = "10")]
    pub shutdown_grace_secs: u64,
}

impl ServerRuntimeConfig {
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        server: ServerRuntimeConfig,
    }

    #[test]
    fn defaults_listen_on_all_interfaces() -> TestResult {
        let harness = Harness::try_parse_from(["skus-json"])?;

        assert_eq!(harness.server.socket_addr().to_string(), "0.0.0.0:3333");
        assert_eq!(harness.server.shutdown_grace(), Duration::from_secs(10));

        Ok(())
    }

    #[test]
    fn rejects_hostnames() {
        let result = Harness::try_parse_from(["skus-json", "--host", "localhost"]);

        assert!(result.is_err());
    }
}
