use std::net::SocketAddr;
use std::path::PathBuf;

use eyre::{WrapErr, bail, eyre};

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
    /// Process-local store, lost on exit. For local runs only.
    Memory,
}

/// How bearer tokens are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtKey {
    Hs256Secret(String),
    Rs256PublicKey(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub jwt_issuer: String,
    pub jwt_key: JwtKey,
    pub jwt_audience: Option<String>,
    pub index_dir: Option<PathBuf>,
}

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_BUCKET: &str = "almoner";

impl ServerConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind = var("ALMONER_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .wrap_err("ALMONER_BIND is not a socket address")?;

        let store = match var("ALMONER_STORE").as_deref().unwrap_or("s3") {
            "s3" => StoreConfig::S3 {
                bucket: var("ALMONER_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                region: var("AWS_REGION"),
                endpoint: var("ALMONER_S3_ENDPOINT"),
            },
            "memory" => StoreConfig::Memory,
            other => bail!("ALMONER_STORE must be `s3` or `memory`, got `{other}`"),
        };

        let jwt_issuer =
            var("ALMONER_JWT_ISSUER").ok_or_else(|| eyre!("ALMONER_JWT_ISSUER is required"))?;
        let jwt_key = match (var("ALMONER_JWT_SECRET"), var("ALMONER_JWT_PUBLIC_KEY")) {
            (Some(secret), None) => JwtKey::Hs256Secret(secret),
            (None, Some(path)) => JwtKey::Rs256PublicKey(PathBuf::from(path)),
            (Some(_), Some(_)) => {
                bail!("set only one of ALMONER_JWT_SECRET and ALMONER_JWT_PUBLIC_KEY")
            }
            (None, None) => bail!("ALMONER_JWT_SECRET or ALMONER_JWT_PUBLIC_KEY is required"),
        };

        Ok(Self {
            bind,
            store,
            jwt_issuer,
            jwt_key,
            jwt_audience: var("ALMONER_JWT_AUDIENCE"),
            index_dir: var("ALMONER_INDEX_DIR").map(PathBuf::from),
        })
    }
}
