//! Process configuration: command line arguments with environment fallbacks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::HeaderValue;
use clap::{Parser, ValueEnum};

use crate::{domain::DuplicateAnnouncePolicy, error::ServerError};

/// Default listening port
pub const DEFAULT_PORT: u16 = 8900;

/// Presence and message relay server
#[derive(Debug, Parser)]
#[command(name = "messenger-server", version, about)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "MESSENGER_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Origins allowed to open connections (comma separated, `*` for any)
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// What to do when an already-present user announces again
    #[arg(long, env = "DUPLICATE_ANNOUNCE", value_enum, default_value_t = DuplicateAnnounce::KeepFirst)]
    pub duplicate_announce: DuplicateAnnounce,
}

/// Command line spelling of `DuplicateAnnouncePolicy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicateAnnounce {
    /// Keep the existing binding (first writer wins)
    KeepFirst,
    /// Rebind to the newest connection (last writer wins)
    Replace,
}

impl From<DuplicateAnnounce> for DuplicateAnnouncePolicy {
    fn from(value: DuplicateAnnounce) -> Self {
        match value {
            DuplicateAnnounce::KeepFirst => Self::KeepFirst,
            DuplicateAnnounce::Replace => Self::Replace,
        }
    }
}

/// Which `Origin` headers may open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Any origin, including requests without an `Origin` header
    Any,
    /// Only these origins; requests without an `Origin` header are refused
    AllowList(Vec<HeaderValue>),
}

impl OriginPolicy {
    /// Build a policy from configured origins.
    ///
    /// An empty list, or one containing `*`, allows any origin. Trailing
    /// slashes are ignored.
    pub fn from_origins<I, S>(origins: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = Vec::new();
        for origin in origins {
            let origin = origin.as_ref().trim().trim_end_matches('/');
            if origin.is_empty() {
                continue;
            }
            if origin == "*" {
                return Ok(Self::Any);
            }
            let value = HeaderValue::from_str(origin)
                .map_err(|_| ServerError::InvalidOrigin(origin.to_string()))?;
            allowed.push(value);
        }

        if allowed.is_empty() {
            Ok(Self::Any)
        } else {
            Ok(Self::AllowList(allowed))
        }
    }

    /// Whether a request carrying `origin` may connect
    pub fn allows(&self, origin: Option<&HeaderValue>) -> bool {
        match (self, origin) {
            (Self::Any, _) => true,
            (Self::AllowList(_), None) => false,
            (Self::AllowList(allowed), Some(origin)) => allowed
                .iter()
                .any(|a| a.as_bytes().eq_ignore_ascii_case(origin.as_bytes())),
        }
    }
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub origin_policy: OriginPolicy,
    pub duplicate_announce: DuplicateAnnouncePolicy,
}

impl ServerConfig {
    /// Configuration with defaults: any origin, first writer wins.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            origin_policy: OriginPolicy::Any,
            duplicate_announce: DuplicateAnnouncePolicy::default(),
        }
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ServerError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            addr: SocketAddr::new(args.host, args.port),
            origin_policy: OriginPolicy::from_origins(&args.allowed_origins)?,
            duplicate_announce: args.duplicate_announce.into(),
        })
    }
}
