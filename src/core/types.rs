use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Pool descriptor as written in a twemproxy (nutcracker) configuration file.
///
/// Only `servers` feeds the instance inventory; the remaining fields are kept
/// so the operator can see which proxy listener fronts a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub listen: Option<String>,
    pub hash: Option<String>,
    pub distribution: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub auto_eject_hosts: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub redis: Option<bool>,
    pub hash_tag: Option<String>,
    #[serde(rename = "server_retry_timeout")]
    pub retry_timeout: Option<u64>,
    #[serde(rename = "server_failure_limit")]
    pub failure_limit: Option<u32>,
    pub servers: Vec<String>,
}

/// twemproxy boolean, written bare (`true`) or quoted (`"true"`)
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("expected true or false, got '{}'", text))),
        },
    }
}

/// A named partition of the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardGroup {
    id: usize,
    name: String,
    pool: PoolConfig,
}

impl ShardGroup {
    pub fn new(id: usize, name: impl Into<String>, pool: PoolConfig) -> Self {
        Self {
            id,
            name: name.into(),
            pool,
        }
    }

    /// Position of the group in sorted order
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    pub fn listen(&self) -> Option<&str> {
        self.pool.listen.as_deref()
    }
}

/// A single addressable cache endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    id: usize,
    endpoint: String,
    group: String,
}

impl Instance {
    pub fn new(id: usize, endpoint: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id,
            endpoint: endpoint.into(),
            group: group.into(),
        }
    }

    /// Global id, unique within one session
    pub fn id(&self) -> usize {
        self.id
    }

    /// `host:port`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}
