//! Swarm request models and per-operation options.
//!
//! Wire types mirror the daemon's JSON (PascalCase keys, unset values
//! omitted). They are plain records: this crate never inspects or rewrites
//! them.

use docker_core::query::QueryParams;
use docker_core::RequestContext;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Read an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Name and labels attached to a swarm object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Annotations {
    /// Object name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// User labels.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub labels: HashMap<String, String>,
}

/// Orchestrator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct OrchestrationConfig {
    /// Number of historic tasks kept per instance or node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_history_retention_limit: Option<i64>,
}

/// Raft consensus settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RaftConfig {
    /// Log entries between snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_interval: Option<u64>,
    /// Snapshots to keep beyond the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_old_snapshots: Option<u64>,
    /// Log entries kept after a snapshot for slow followers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_entries_for_slow_followers: Option<u64>,
    /// Ticks between heartbeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_tick: Option<u32>,
    /// Ticks without a leader before an election starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub election_tick: Option<u32>,
}

/// Task dispatcher settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DispatcherConfig {
    /// Agent heartbeat period, in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_period: Option<u64>,
}

/// Protocol spoken by an external certificate authority.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExternalCaProtocol {
    /// CloudFlare's CFSSL.
    #[default]
    Cfssl,
}

/// An external certificate authority used to sign node certificates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ExternalCa {
    /// Protocol used to talk to the CA.
    pub protocol: ExternalCaProtocol,
    /// CA endpoint.
    #[serde(rename = "URL")]
    pub url: String,
    /// Protocol specific options.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub options: HashMap<String, String>,
}

/// Certificate authority settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CaConfig {
    /// Validity of node certificates, in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_cert_expiry: Option<i64>,
    /// External CAs to forward signing requests to.
    #[serde(
        rename = "ExternalCAs",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub external_cas: Vec<ExternalCa>,
}

/// A named driver with options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Driver {
    /// Driver name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Driver options.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub options: HashMap<String, String>,
}

/// Defaults applied to every task in the swarm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDefaults {
    /// Log driver for task containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_driver: Option<Driver>,
}

/// Desired state of the swarm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterSpec {
    /// Swarm name and labels.
    #[serde(flatten)]
    pub annotations: Annotations,
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
    /// Raft settings.
    #[serde(default)]
    pub raft: RaftConfig,
    /// Dispatcher settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// Certificate authority settings.
    #[serde(rename = "CAConfig", default)]
    pub ca_config: CaConfig,
    /// Task defaults.
    #[serde(default)]
    pub task_defaults: TaskDefaults,
}

/// Body of `POST /swarm/init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InitRequest {
    /// Address the swarm manager listens on (e.g. `0.0.0.0:2377`).
    pub listen_addr: String,
    /// Address advertised to other nodes.
    pub advertise_addr: String,
    /// Discard existing cluster state and start a new single-manager cluster.
    pub force_new_cluster: bool,
    /// Initial swarm configuration.
    pub spec: ClusterSpec,
}

/// Body of `POST /swarm/join`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct JoinRequest {
    /// Address this node listens on.
    pub listen_addr: String,
    /// Address advertised to other nodes.
    pub advertise_addr: String,
    /// Managers already participating in the swarm.
    pub remote_addrs: Vec<String>,
    /// Worker or manager join token.
    pub join_token: String,
}

/// Options for [`SwarmClient::init_swarm`](crate::SwarmClient::init_swarm).
#[derive(Debug, Clone, Default)]
pub struct InitSwarmOptions {
    /// Bootstrap request sent as the body.
    pub request: InitRequest,
    /// Cancellation handle forwarded to the transport.
    pub context: RequestContext,
}

impl InitSwarmOptions {
    /// Wrap a request with an empty context.
    #[must_use]
    pub fn new(request: InitRequest) -> Self {
        Self {
            request,
            context: RequestContext::new(),
        }
    }

    /// Attach a cancellation context.
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

/// Options for [`SwarmClient::join_swarm`](crate::SwarmClient::join_swarm).
#[derive(Debug, Clone, Default)]
pub struct JoinSwarmOptions {
    /// Join request sent as the body.
    pub request: JoinRequest,
    /// Cancellation handle forwarded to the transport.
    pub context: RequestContext,
}

impl JoinSwarmOptions {
    /// Wrap a request with an empty context.
    #[must_use]
    pub fn new(request: JoinRequest) -> Self {
        Self {
            request,
            context: RequestContext::new(),
        }
    }

    /// Attach a cancellation context.
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

/// Options for [`SwarmClient::leave_swarm`](crate::SwarmClient::leave_swarm).
#[derive(Debug, Clone, Default)]
pub struct LeaveSwarmOptions {
    /// Leave even if this is the last manager or the swarm would lose quorum.
    pub force: bool,
    /// Cancellation handle forwarded to the transport.
    pub context: RequestContext,
}

impl LeaveSwarmOptions {
    /// Query parameters: `force=1` when forcing, nothing otherwise.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_flag("force", self.force);
        params
    }
}

/// Options for [`SwarmClient::update_swarm`](crate::SwarmClient::update_swarm).
#[derive(Debug, Clone, Default)]
pub struct UpdateSwarmOptions {
    /// Swarm version the update is based on.
    pub version: u64,
    /// Issue a new worker join token.
    pub rotate_worker_token: bool,
    /// Issue a new manager join token.
    pub rotate_manager_token: bool,
    /// New desired state, sent as the body.
    pub swarm: ClusterSpec,
    /// Cancellation handle forwarded to the transport.
    pub context: RequestContext,
}

impl UpdateSwarmOptions {
    /// Query parameters. All three are always present; the rotation flags are
    /// literal `true`/`false`.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push("version", self.version);
        params.push("rotateWorkerToken", self.rotate_worker_token);
        params.push("rotateManagerToken", self.rotate_manager_token);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leave_params_only_carry_force_when_set() {
        let forced = LeaveSwarmOptions {
            force: true,
            ..LeaveSwarmOptions::default()
        };
        assert_eq!(forced.to_params().into_pairs(), vec![("force", "1".into())]);

        let polite = LeaveSwarmOptions::default();
        assert!(polite.to_params().is_empty());
        assert!(!polite.to_params().encode().contains("force"));
    }

    #[test]
    fn update_params_always_carry_three_pairs() {
        for version in [0u64, 1, 42, u64::MAX] {
            for worker in [false, true] {
                for manager in [false, true] {
                    let options = UpdateSwarmOptions {
                        version,
                        rotate_worker_token: worker,
                        rotate_manager_token: manager,
                        ..UpdateSwarmOptions::default()
                    };

                    let pairs = options.to_params().into_pairs();
                    assert_eq!(
                        pairs,
                        vec![
                            ("version", version.to_string()),
                            ("rotateWorkerToken", worker.to_string()),
                            ("rotateManagerToken", manager.to_string()),
                        ]
                    );
                }
            }
        }
    }

    #[test]
    fn update_params_encode() {
        let options = UpdateSwarmOptions {
            version: 11,
            rotate_worker_token: true,
            ..UpdateSwarmOptions::default()
        };
        assert_eq!(
            options.to_params().encode(),
            "version=11&rotateWorkerToken=true&rotateManagerToken=false"
        );
    }

    #[test]
    fn empty_spec_serializes_sections() {
        let value = serde_json::to_value(ClusterSpec::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "Orchestration": {},
                "Raft": {},
                "Dispatcher": {},
                "CAConfig": {},
                "TaskDefaults": {}
            })
        );
    }

    #[test]
    fn spec_uses_daemon_field_names() {
        let spec = ClusterSpec {
            annotations: Annotations {
                name: "default".into(),
                labels: HashMap::from([("env".into(), "prod".into())]),
            },
            raft: RaftConfig {
                snapshot_interval: Some(10_000),
                election_tick: Some(3),
                ..RaftConfig::default()
            },
            ca_config: CaConfig {
                node_cert_expiry: Some(7_776_000_000_000_000),
                external_cas: vec![ExternalCa {
                    url: "https://ca.example.com".into(),
                    ..ExternalCa::default()
                }],
            },
            ..ClusterSpec::default()
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["Name"], "default");
        assert_eq!(value["Labels"]["env"], "prod");
        assert_eq!(value["Raft"]["SnapshotInterval"], 10_000);
        assert_eq!(value["Raft"]["ElectionTick"], 3);
        assert!(value["Raft"].get("HeartbeatTick").is_none());
        assert_eq!(value["CAConfig"]["NodeCertExpiry"], 7_776_000_000_000_000_i64);
        assert_eq!(value["CAConfig"]["ExternalCAs"][0]["Protocol"], "cfssl");
        assert_eq!(
            value["CAConfig"]["ExternalCAs"][0]["URL"],
            "https://ca.example.com"
        );
    }

    #[test]
    fn null_maps_and_lists_read_as_empty() {
        let spec: ClusterSpec = serde_json::from_value(json!({
            "Name": "default",
            "Labels": null,
            "CAConfig": {"ExternalCAs": null},
            "TaskDefaults": {"LogDriver": {"Name": "json-file", "Options": null}}
        }))
        .unwrap();

        assert_eq!(spec.annotations.name, "default");
        assert!(spec.annotations.labels.is_empty());
        assert!(spec.ca_config.external_cas.is_empty());
        assert!(spec.task_defaults.log_driver.unwrap().options.is_empty());

        let ca: ExternalCa = serde_json::from_value(json!({
            "Protocol": "cfssl",
            "URL": "https://ca.example.com",
            "Options": null
        }))
        .unwrap();
        assert!(ca.options.is_empty());
    }

    #[test]
    fn join_request_serializes_all_fields() {
        let request = JoinRequest {
            listen_addr: "0.0.0.0:2377".into(),
            advertise_addr: "10.0.0.2:2377".into(),
            remote_addrs: vec!["10.0.0.1:2377".into()],
            join_token: "SWMTKN-1-abc".into(),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "ListenAddr": "0.0.0.0:2377",
                "AdvertiseAddr": "10.0.0.2:2377",
                "RemoteAddrs": ["10.0.0.1:2377"],
                "JoinToken": "SWMTKN-1-abc"
            })
        );
    }
}
