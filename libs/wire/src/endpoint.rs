use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Address of a remote peer, one variant per supported transport.
///
/// Parsed from `tcp://host:port`, `unix://path`, or a bare `host:port`
/// (treated as TCP).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if let Some(rest) = s.strip_prefix("tcp://") {
            let addr = rest
                .parse()
                .map_err(|_| Error::InvalidEndpoint(s.to_string()))?;
            Ok(Endpoint::Tcp(addr))
        } else if let Some(rest) = s.strip_prefix("unix://") {
            if rest.is_empty() {
                return Err(Error::InvalidEndpoint(s.to_string()));
            }
            Ok(Endpoint::Unix(PathBuf::from(rest)))
        } else {
            let addr = s
                .parse()
                .map_err(|_| Error::InvalidEndpoint(s.to_string()))?;
            Ok(Endpoint::Tcp(addr))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
