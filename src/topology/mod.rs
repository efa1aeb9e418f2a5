//! Instance inventory derived from a twemproxy pool file.
//!
//! Groups are ordered by name and numbered by position. Instance ids are
//! global: they run across groups in group order, then in the order the
//! servers are declared within a group.

use crate::core::{AdminError, Instance, PoolConfig, Result, ShardGroup};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Immutable view of the cluster for one session
#[derive(Debug, Clone, Default)]
pub struct Topology {
    groups: Vec<ShardGroup>,
    instances: Vec<Instance>,
    details: BTreeMap<String, Vec<Instance>>,
}

impl Topology {
    /// Read and index a topology file. Any failure here is fatal to startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| AdminError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let topology = Self::parse(&source).map_err(|reason| AdminError::Load {
            path: path.display().to_string(),
            reason,
        })?;

        info!(
            path = %path.display(),
            groups = topology.groups.len(),
            instances = topology.instances.len(),
            "topology loaded"
        );
        Ok(topology)
    }

    /// Index a topology given as YAML text
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Self::parse(source).map_err(|reason| AdminError::Load {
            path: "<inline>".to_string(),
            reason,
        })
    }

    fn parse(source: &str) -> std::result::Result<Self, String> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let pools: BTreeMap<String, PoolConfig> =
            serde_yaml::from_str(source).map_err(|e| e.to_string())?;
        Self::from_pools(pools)
    }

    /// Build the inventory from already-parsed pool descriptors.
    ///
    /// The map's key order is the canonical group order.
    pub fn from_pools(pools: BTreeMap<String, PoolConfig>) -> std::result::Result<Self, String> {
        let mut groups = Vec::with_capacity(pools.len());
        let mut instances = Vec::new();
        let mut details = BTreeMap::new();

        for (group_id, (name, pool)) in pools.into_iter().enumerate() {
            let mut members = Vec::with_capacity(pool.servers.len());
            for server in &pool.servers {
                let endpoint = instance_address(server)
                    .ok_or_else(|| format!("server '{}' in group '{}' has no port", server, name))?;
                let instance = Instance::new(instances.len(), endpoint, name.clone());
                debug!(id = instance.id(), endpoint, group = %name, "instance indexed");
                members.push(instance.clone());
                instances.push(instance);
            }
            details.insert(name.clone(), members);
            groups.push(ShardGroup::new(group_id, name, pool));
        }

        Ok(Self {
            groups,
            instances,
            details,
        })
    }

    /// Groups in sorted order
    pub fn groups(&self) -> &[ShardGroup] {
        &self.groups
    }

    /// Every instance, ordered by id
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn group(&self, id: usize) -> Option<&ShardGroup> {
        self.groups.get(id)
    }

    pub fn instance(&self, id: usize) -> Option<&Instance> {
        self.instances.get(id)
    }

    /// Members of a group in declaration order
    pub fn instances_in(&self, group: &str) -> &[Instance] {
        self.details.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Cut a twemproxy server string at its last colon.
///
/// `"10.0.0.1:6379:1 cache-a"` becomes `"10.0.0.1:6379"`; the weight and
/// optional name after the final colon are dropped.
pub fn instance_address(server: &str) -> Option<&str> {
    server.rfind(':').map(|idx| &server[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOLS: &str = r#"
cacheB:
  listen: 127.0.0.1:22122
  redis: true
  servers:
    - 10.0.0.2:6379:1
    - 10.0.0.3:6379:1 replica
cacheA:
  listen: 127.0.0.1:22121
  hash: fnv1a_64
  distribution: ketama
  servers:
    - 10.0.0.1:6379:1
"#;

    #[test]
    fn test_groups_are_sorted_by_name() {
        let topology = Topology::from_yaml_str(POOLS).unwrap();
        let names: Vec<&str> = topology.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["cacheA", "cacheB"]);
        assert_eq!(topology.group(0).unwrap().id(), 0);
        assert_eq!(topology.group(1).unwrap().id(), 1);
        assert_eq!(topology.group(0).unwrap().listen(), Some("127.0.0.1:22121"));
        assert_eq!(topology.group(0).unwrap().pool().distribution.as_deref(), Some("ketama"));
    }

    #[test]
    fn test_instance_ids_continue_across_groups() {
        let topology = Topology::from_yaml_str(POOLS).unwrap();
        let ids: Vec<(usize, &str, &str)> = topology
            .instances()
            .iter()
            .map(|i| (i.id(), i.endpoint(), i.group()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (0, "10.0.0.1:6379", "cacheA"),
                (1, "10.0.0.2:6379", "cacheB"),
                (2, "10.0.0.3:6379", "cacheB"),
            ]
        );
        let b: Vec<usize> = topology.instances_in("cacheB").iter().map(|i| i.id()).collect();
        assert_eq!(b, vec![1, 2]);
        assert!(topology.instances_in("missing").is_empty());
    }

    #[test]
    fn test_address_is_cut_at_last_colon() {
        assert_eq!(instance_address("10.0.0.1:6379:1"), Some("10.0.0.1:6379"));
        assert_eq!(instance_address("cache-1:6379:1 primary"), Some("cache-1:6379"));
        // A bare host:port loses its port; the truncation rule is kept as is.
        assert_eq!(instance_address("10.0.0.1:6379"), Some("10.0.0.1"));
        assert_eq!(instance_address("localhost"), None);
    }

    #[test]
    fn test_duplicate_servers_keep_distinct_ids() {
        let yaml = "g:\n  servers:\n    - 10.0.0.9:6379:1\n    - 10.0.0.9:6379:1\n";
        let topology = Topology::from_yaml_str(yaml).unwrap();
        assert_eq!(topology.instances().len(), 2);
        assert_eq!(topology.instance(0).unwrap().endpoint(), topology.instance(1).unwrap().endpoint());
        assert_ne!(topology.instance(0).unwrap().id(), topology.instance(1).unwrap().id());
    }

    #[test]
    fn test_malformed_sources_are_load_errors() {
        let err = Topology::from_yaml_str("cacheA: [unterminated").unwrap_err();
        assert!(matches!(err, AdminError::Load { .. }));

        let err = Topology::from_yaml_str("g:\n  servers:\n    - nocolon\n").unwrap_err();
        assert!(err.to_string().contains("nocolon"));
    }

    #[test]
    fn test_group_without_servers_is_kept() {
        let topology = Topology::from_yaml_str("empty:\n  listen: 0.0.0.0:1\n").unwrap();
        assert_eq!(topology.groups().len(), 1);
        assert!(topology.instances().is_empty());
        assert!(Topology::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_quoted_pool_flags() {
        let yaml = "g:\n  auto_eject_hosts: \"true\"\n  redis: \"False\"\n  servers:\n    - 10.0.0.1:6379:1\n";
        let pool = Topology::from_yaml_str(yaml).unwrap().group(0).unwrap().pool().clone();
        assert_eq!(pool.auto_eject_hosts, Some(true));
        assert_eq!(pool.redis, Some(false));

        let bare = Topology::from_yaml_str("g:\n  auto_eject_hosts: false\n").unwrap();
        assert_eq!(bare.group(0).unwrap().pool().auto_eject_hosts, Some(false));
        assert_eq!(bare.group(0).unwrap().pool().redis, None);

        let err = Topology::from_yaml_str("g:\n  redis: \"maybe\"\n").unwrap_err();
        assert!(matches!(err, AdminError::Load { .. }));
    }
}
