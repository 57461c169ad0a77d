//! Resource registry
//!
//! Maps resource names (`"events"`, `"instance_disks"`) to endpoint
//! templates. The registry is built once and never mutated; looking up an
//! unknown name is an ordinary [`Error::ResourceNotFound`].

pub mod template;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt::Display;

/// Names of the built-in resources
pub mod names {
    /// `account` resource
    pub const ACCOUNT: &str = "account";
    /// `account_settings` resource
    pub const ACCOUNT_SETTINGS: &str = "account_settings";
    /// `databases` resource
    pub const DATABASES: &str = "databases";
    /// `domain_records` resource
    pub const DOMAIN_RECORDS: &str = "domain_records";
    /// `domains` resource
    pub const DOMAINS: &str = "domains";
    /// `events` resource
    pub const EVENTS: &str = "events";
    /// `firewalls` resource
    pub const FIREWALLS: &str = "firewalls";
    /// `firewall_devices` resource
    pub const FIREWALL_DEVICES: &str = "firewall_devices";
    /// `firewall_rules` resource
    pub const FIREWALL_RULES: &str = "firewall_rules";
    /// `images` resource
    pub const IMAGES: &str = "images";
    /// `instance_configs` resource
    pub const INSTANCE_CONFIGS: &str = "instance_configs";
    /// `instance_disks` resource
    pub const INSTANCE_DISKS: &str = "instance_disks";
    /// `instance_ips` resource
    pub const INSTANCE_IPS: &str = "instance_ips";
    /// `instance_snapshots` resource
    pub const INSTANCE_SNAPSHOTS: &str = "instance_snapshots";
    /// `instance_stats` resource
    pub const INSTANCE_STATS: &str = "instance_stats";
    /// `instance_volumes` resource
    pub const INSTANCE_VOLUMES: &str = "instance_volumes";
    /// `instances` resource
    pub const INSTANCES: &str = "instances";
    /// `invoice_items` resource
    pub const INVOICE_ITEMS: &str = "invoice_items";
    /// `invoices` resource
    pub const INVOICES: &str = "invoices";
    /// `ip_addresses` resource
    pub const IP_ADDRESSES: &str = "ip_addresses";
    /// `ipv6_pools` resource
    pub const IPV6_POOLS: &str = "ipv6_pools";
    /// `ipv6_ranges` resource
    pub const IPV6_RANGES: &str = "ipv6_ranges";
    /// `kernels` resource
    pub const KERNELS: &str = "kernels";
    /// `lke_cluster_api_endpoints` resource
    pub const LKE_CLUSTER_API_ENDPOINTS: &str = "lke_cluster_api_endpoints";
    /// `lke_clusters` resource
    pub const LKE_CLUSTERS: &str = "lke_clusters";
    /// `lke_node_pools` resource
    pub const LKE_NODE_POOLS: &str = "lke_node_pools";
    /// `lke_versions` resource
    pub const LKE_VERSIONS: &str = "lke_versions";
    /// `longview` resource
    pub const LONGVIEW: &str = "longview";
    /// `longview_clients` resource
    pub const LONGVIEW_CLIENTS: &str = "longview_clients";
    /// `longview_subscriptions` resource
    pub const LONGVIEW_SUBSCRIPTIONS: &str = "longview_subscriptions";
    /// `managed` resource
    pub const MANAGED: &str = "managed";
    /// `mysql_databases` resource
    pub const MYSQL_DATABASES: &str = "mysql_databases";
    /// `mongo_databases` resource
    pub const MONGO_DATABASES: &str = "mongo_databases";
    /// `network_transfer_prices` resource
    pub const NETWORK_TRANSFER_PRICES: &str = "network_transfer_prices";
    /// `nodebalancer_configs` resource
    pub const NODEBALANCER_CONFIGS: &str = "nodebalancer_configs";
    /// `nodebalancer_nodes` resource
    pub const NODEBALANCER_NODES: &str = "nodebalancer_nodes";
    /// `nodebalancer_stats` resource
    pub const NODEBALANCER_STATS: &str = "nodebalancer_stats";
    /// `nodebalancers` resource
    pub const NODEBALANCERS: &str = "nodebalancers";
    /// `notifications` resource
    pub const NOTIFICATIONS: &str = "notifications";
    /// `oauth_clients` resource
    pub const OAUTH_CLIENTS: &str = "oauth_clients";
    /// `object_storage` resource
    pub const OBJECT_STORAGE: &str = "object_storage";
    /// `object_storage_buckets` resource
    pub const OBJECT_STORAGE_BUCKETS: &str = "object_storage_buckets";
    /// `object_storage_bucket_certs` resource
    pub const OBJECT_STORAGE_BUCKET_CERTS: &str = "object_storage_bucket_certs";
    /// `object_storage_clusters` resource
    pub const OBJECT_STORAGE_CLUSTERS: &str = "object_storage_clusters";
    /// `object_storage_keys` resource
    pub const OBJECT_STORAGE_KEYS: &str = "object_storage_keys";
    /// `payments` resource
    pub const PAYMENTS: &str = "payments";
    /// `profile` resource
    pub const PROFILE: &str = "profile";
    /// `regions` resource
    pub const REGIONS: &str = "regions";
    /// `ssh_keys` resource
    pub const SSH_KEYS: &str = "ssh_keys";
    /// `stackscripts` resource
    pub const STACKSCRIPTS: &str = "stackscripts";
    /// `tags` resource
    pub const TAGS: &str = "tags";
    /// `tickets` resource
    pub const TICKETS: &str = "tickets";
    /// `tokens` resource
    pub const TOKENS: &str = "tokens";
    /// `types` resource
    pub const TYPES: &str = "types";
    /// `user_grants` resource
    pub const USER_GRANTS: &str = "user_grants";
    /// `users` resource
    pub const USERS: &str = "users";
    /// `vlans` resource
    pub const VLANS: &str = "vlans";
    /// `volumes` resource
    pub const VOLUMES: &str = "volumes";
}

/// Placeholder names, in positional order
const ID_PLACEHOLDERS: [&str; 2] = ["id", "second_id"];

/// A named API resource and its endpoint template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    endpoint: String,
}

impl Resource {
    /// Create a resource from a name and endpoint template
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw endpoint template
    pub fn template(&self) -> &str {
        &self.endpoint
    }

    /// True when the endpoint needs parent ids
    pub fn is_templated(&self) -> bool {
        template::has_templates(&self.endpoint)
    }

    /// Endpoint of a top-level resource
    pub fn endpoint(&self) -> Result<String> {
        if self.is_templated() {
            return Err(Error::config(format!(
                "resource '{}' requires parent ids ({})",
                self.name, self.endpoint
            )));
        }
        Ok(self.endpoint.clone())
    }

    /// Endpoint of a resource nested under one parent
    pub fn endpoint_with_id(&self, id: impl Display) -> Result<String> {
        self.endpoint_with_ids(&[id])
    }

    /// Endpoint of a resource nested under one or two parents
    pub fn endpoint_with_ids<D: Display>(&self, ids: &[D]) -> Result<String> {
        let expected = template::extract_variables(&self.endpoint).len();
        if ids.len() != expected {
            return Err(Error::config(format!(
                "resource '{}' expects {expected} id(s), got {}",
                self.name,
                ids.len()
            )));
        }

        let vars: HashMap<&str, String> = ID_PLACEHOLDERS
            .iter()
            .copied()
            .zip(ids.iter().map(ToString::to_string))
            .collect();
        template::render(&self.endpoint, &vars)
    }
}

/// Immutable name → resource table
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, Resource>,
}

impl ResourceRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in resource of the API
    pub fn builtin() -> Self {
        use names::*;

        [
            (ACCOUNT, "account"),
            (ACCOUNT_SETTINGS, "account/settings"),
            (DATABASES, "databases/instances"),
            (DOMAIN_RECORDS, "domains/{{ id }}/records"),
            (DOMAINS, "domains"),
            (EVENTS, "account/events"),
            (FIREWALLS, "networking/firewalls"),
            (FIREWALL_DEVICES, "networking/firewalls/{{ id }}/devices"),
            (FIREWALL_RULES, "networking/firewalls/{{ id }}/rules"),
            (IMAGES, "images"),
            (INSTANCE_CONFIGS, "linode/instances/{{ id }}/configs"),
            (INSTANCE_DISKS, "linode/instances/{{ id }}/disks"),
            (INSTANCE_IPS, "linode/instances/{{ id }}/ips"),
            (INSTANCE_SNAPSHOTS, "linode/instances/{{ id }}/backups"),
            (INSTANCE_STATS, "linode/instances/{{ id }}/stats"),
            (INSTANCE_VOLUMES, "linode/instances/{{ id }}/volumes"),
            (INSTANCES, "linode/instances"),
            (INVOICE_ITEMS, "account/invoices/{{ id }}/items"),
            (INVOICES, "account/invoices"),
            (IP_ADDRESSES, "networking/ips"),
            (IPV6_POOLS, "networking/ipv6/pools"),
            (IPV6_RANGES, "networking/ipv6/ranges"),
            (KERNELS, "linode/kernels"),
            (LKE_CLUSTER_API_ENDPOINTS, "lke/clusters/{{ id }}/api-endpoints"),
            (LKE_CLUSTERS, "lke/clusters"),
            (LKE_NODE_POOLS, "lke/clusters/{{ id }}/pools"),
            (LKE_VERSIONS, "lke/versions"),
            (LONGVIEW, "longview"),
            (LONGVIEW_CLIENTS, "longview/clients"),
            (LONGVIEW_SUBSCRIPTIONS, "longview/subscriptions"),
            (MANAGED, "managed"),
            (MYSQL_DATABASES, "databases/mysql/instances"),
            (MONGO_DATABASES, "databases/mongodb/instances"),
            (NETWORK_TRANSFER_PRICES, "network-transfer/prices"),
            (NODEBALANCER_CONFIGS, "nodebalancers/{{ id }}/configs"),
            (
                NODEBALANCER_NODES,
                "nodebalancers/{{ id }}/configs/{{ second_id }}/nodes",
            ),
            (NODEBALANCER_STATS, "nodebalancers/{{ id }}/stats"),
            (NODEBALANCERS, "nodebalancers"),
            (NOTIFICATIONS, "account/notifications"),
            (OAUTH_CLIENTS, "account/oauth-clients"),
            (OBJECT_STORAGE, "object-storage"),
            (OBJECT_STORAGE_BUCKETS, "object-storage/buckets"),
            (
                OBJECT_STORAGE_BUCKET_CERTS,
                "object-storage/buckets/{{ id }}/{{ second_id }}/ssl",
            ),
            (OBJECT_STORAGE_CLUSTERS, "object-storage/clusters"),
            (OBJECT_STORAGE_KEYS, "object-storage/keys"),
            (PAYMENTS, "account/payments"),
            (PROFILE, "profile"),
            (REGIONS, "regions"),
            (SSH_KEYS, "profile/sshkeys"),
            (STACKSCRIPTS, "linode/stackscripts"),
            (TAGS, "tags"),
            (TICKETS, "support/tickets"),
            (TOKENS, "profile/tokens"),
            (TYPES, "linode/types"),
            (USER_GRANTS, "account/users/{{ id }}/grants"),
            (USERS, "account/users"),
            (VLANS, "networking/vlans"),
            (VOLUMES, "volumes"),
        ]
        .into_iter()
        .fold(Self::empty(), |registry, (name, endpoint)| {
            registry.with(Resource::new(name, endpoint))
        })
    }

    /// Add or replace a resource
    #[must_use]
    pub fn with(mut self, resource: Resource) -> Self {
        self.resources.insert(resource.name.clone(), resource);
        self
    }

    /// Look up a resource by name
    pub fn get(&self, name: &str) -> Result<&Resource> {
        self.resources
            .get(name)
            .ok_or_else(|| Error::resource_not_found(name))
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
