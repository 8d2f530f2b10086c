//! Connection profiles
//!
//! A profile describes how to reach one of the three deployment flavors:
//! the cloud service, the cloud simulator, or an on-premises store. The
//! flavors form a closed set, so they are modelled as an enum rather than
//! an open trait hierarchy. `ProfileRegistry` maps each kind to the
//! property list it accepts and the factory that validates and builds it.

use crate::{ElementKind, NosqlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use url::Url;

/// Raw profile properties, keyed by property id
pub type PropertyMap = BTreeMap<String, String>;

/// Deployment flavor tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Cloud,
    #[serde(rename = "cloudsim")]
    Simulated,
    #[serde(rename = "onprem")]
    OnPrem,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 3] = [ProfileKind::Cloud, ProfileKind::Simulated, ProfileKind::OnPrem];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Cloud => "cloud",
            ProfileKind::Simulated => "cloudsim",
            ProfileKind::OnPrem => "onprem",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            ProfileKind::Cloud => "Cloud",
            ProfileKind::Simulated => "Cloudsim",
            ProfileKind::OnPrem => "On-premises",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "cloud" => Some(ProfileKind::Cloud),
            "cloudsim" | "simulated" | "simulator" => Some(ProfileKind::Simulated),
            "onprem" | "on-prem" | "kvstore" => Some(ProfileKind::OnPrem),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud service profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudProfile {
    /// Region id or service URL
    pub endpoint: String,
    pub tenant_id: String,
    pub user_id: String,
    pub fingerprint: String,
    pub private_key_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment: Option<String>,
}

/// Cloud simulator profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedProfile {
    pub endpoint: String,
    pub tenant_id: String,
}

/// On-premises store profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnPremProfile {
    /// Proxy host
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A validated connection profile for one deployment flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConnectionProfile {
    Cloud(CloudProfile),
    #[serde(rename = "cloudsim")]
    Simulated(SimulatedProfile),
    #[serde(rename = "onprem")]
    OnPrem(OnPremProfile),
}

impl ConnectionProfile {
    pub fn kind(&self) -> ProfileKind {
        match self {
            ConnectionProfile::Cloud(_) => ProfileKind::Cloud,
            ConnectionProfile::Simulated(_) => ProfileKind::Simulated,
            ConnectionProfile::OnPrem(_) => ProfileKind::OnPrem,
        }
    }

    /// The address the driver connects to
    pub fn endpoint(&self) -> String {
        match self {
            ConnectionProfile::Cloud(p) => p.endpoint.clone(),
            ConnectionProfile::Simulated(p) => p.endpoint.clone(),
            ConnectionProfile::OnPrem(p) => format!("http://{}:{}", p.host, p.port),
        }
    }

    /// Namespace or compartment tables are listed from, if the profile pins one
    pub fn scope(&self) -> Option<&str> {
        match self {
            ConnectionProfile::Cloud(p) => p.compartment.as_deref(),
            ConnectionProfile::Simulated(_) => None,
            ConnectionProfile::OnPrem(p) => p.namespace.as_deref(),
        }
    }

    /// Flatten back into the property map the registry builds from
    pub fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        let mut put = |k: &str, v: &str| {
            props.insert(k.to_string(), v.to_string());
        };
        match self {
            ConnectionProfile::Cloud(p) => {
                put("endpoint", &p.endpoint);
                put("tenant_id", &p.tenant_id);
                put("user_id", &p.user_id);
                put("fingerprint", &p.fingerprint);
                put("private_key_file", &p.private_key_file);
                if let Some(c) = &p.compartment {
                    put("compartment", c);
                }
            }
            ConnectionProfile::Simulated(p) => {
                put("endpoint", &p.endpoint);
                put("tenant_id", &p.tenant_id);
            }
            ConnectionProfile::OnPrem(p) => {
                put("endpoint", &format!("{}:{}", p.host, p.port));
                if let Some(ns) = &p.namespace {
                    put("namespace", ns);
                }
            }
        }
        props
    }
}

/// Declaration of one profile property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub default_value: Option<&'static str>,
}

impl PropertySpec {
    pub const fn required(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: true,
            default_value: None,
        }
    }

    pub const fn optional(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: false,
            default_value: None,
        }
    }

    pub const fn with_default(mut self, value: &'static str) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Builds a profile from validated properties
pub type ProfileFactory = fn(&PropertyMap) -> Result<ConnectionProfile>;

struct Registration {
    properties: Vec<PropertySpec>,
    factory: ProfileFactory,
}

/// Registry of profile kinds
///
/// Constructed explicitly and passed to whoever needs it; there is no
/// global instance.
pub struct ProfileRegistry {
    kinds: HashMap<ProfileKind, Registration>,
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Create a registry with the three built-in flavors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ProfileKind::Cloud, cloud_properties(), build_cloud);
        registry.register(ProfileKind::Simulated, simulated_properties(), build_simulated);
        registry.register(ProfileKind::OnPrem, onprem_properties(), build_onprem);
        registry
    }

    /// Register (or replace) the factory for a kind
    pub fn register(
        &mut self,
        kind: ProfileKind,
        properties: Vec<PropertySpec>,
        factory: ProfileFactory,
    ) {
        tracing::info!(kind = %kind, "registering connection profile kind");
        self.kinds.insert(kind, Registration { properties, factory });
    }

    pub fn has(&self, kind: ProfileKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    /// Registered kinds in declaration order
    pub fn kinds(&self) -> Vec<ProfileKind> {
        let mut kinds: Vec<_> = self.kinds.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Property declarations for a kind
    pub fn properties(&self, kind: ProfileKind) -> Result<&[PropertySpec]> {
        self.registration(kind).map(|r| r.properties.as_slice())
    }

    /// Validate `properties` against the kind's declarations and build the profile
    ///
    /// Defaults are filled in for absent optional properties. Missing
    /// required properties and malformed endpoints are `InvalidArgument`.
    pub fn create(&self, kind: ProfileKind, properties: &PropertyMap) -> Result<ConnectionProfile> {
        let registration = self.registration(kind)?;
        let mut resolved = properties.clone();
        for spec in &registration.properties {
            let present = resolved
                .get(spec.key)
                .is_some_and(|v| !v.trim().is_empty());
            if present {
                continue;
            }
            match spec.default_value {
                Some(default) => {
                    resolved.insert(spec.key.to_string(), default.to_string());
                }
                None if spec.required => {
                    return Err(NosqlError::invalid_argument(format!(
                        "{} profile requires property '{}' ({})",
                        kind.label(),
                        spec.key,
                        spec.label
                    )));
                }
                None => {}
            }
        }
        let profile = (registration.factory)(&resolved)?;
        tracing::debug!(kind = %kind, endpoint = %profile.endpoint(), "created connection profile");
        Ok(profile)
    }

    fn registration(&self, kind: ProfileKind) -> Result<&Registration> {
        self.kinds
            .get(&kind)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Profile, kind.as_str()))
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn cloud_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::required("endpoint", "Region or endpoint URL"),
        PropertySpec::required("tenant_id", "Tenant OCID"),
        PropertySpec::required("user_id", "User OCID"),
        PropertySpec::required("fingerprint", "Key fingerprint"),
        PropertySpec::required("private_key_file", "Private key file"),
        PropertySpec::optional("compartment", "Compartment"),
    ]
}

fn simulated_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::required("endpoint", "Service URL").with_default("http://localhost:8080"),
        PropertySpec::required("tenant_id", "Tenant identifier").with_default("exampleId"),
    ]
}

fn onprem_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::required("endpoint", "Proxy host:port"),
        PropertySpec::optional("namespace", "Namespace"),
    ]
}

fn prop(props: &PropertyMap, key: &str) -> String {
    props.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn optional_prop(props: &PropertyMap, key: &str) -> Option<String> {
    props
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Region ids are accepted as-is; anything with a scheme must be a valid URL
fn validate_cloud_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.contains("://") {
        return validate_url(endpoint);
    }
    let is_region = endpoint
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if is_region {
        Ok(())
    } else {
        Err(NosqlError::invalid_argument(format!(
            "malformed cloud endpoint '{endpoint}'"
        )))
    }
}

fn validate_url(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| {
        NosqlError::invalid_argument(format!("malformed endpoint URL '{endpoint}': {e}"))
    })?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        _ => Err(NosqlError::invalid_argument(format!(
            "endpoint '{endpoint}' must be an http(s) URL with a host"
        ))),
    }
}

/// Parse `host:port`, tolerating an `http://` prefix
pub fn parse_host_port(endpoint: &str) -> Result<(String, u16)> {
    let bare = endpoint
        .trim()
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');
    let (host, port) = bare.rsplit_once(':').ok_or_else(|| {
        NosqlError::invalid_argument(format!("endpoint '{endpoint}' must be host:port"))
    })?;
    if host.is_empty() {
        return Err(NosqlError::invalid_argument(format!(
            "endpoint '{endpoint}' has no host"
        )));
    }
    let port = port.parse::<u16>().map_err(|_| {
        NosqlError::invalid_argument(format!("endpoint '{endpoint}' has an invalid port"))
    })?;
    Ok((host.to_string(), port))
}

fn build_cloud(props: &PropertyMap) -> Result<ConnectionProfile> {
    let endpoint = prop(props, "endpoint");
    validate_cloud_endpoint(&endpoint)?;
    Ok(ConnectionProfile::Cloud(CloudProfile {
        endpoint,
        tenant_id: prop(props, "tenant_id"),
        user_id: prop(props, "user_id"),
        fingerprint: prop(props, "fingerprint"),
        private_key_file: prop(props, "private_key_file"),
        compartment: optional_prop(props, "compartment"),
    }))
}

fn build_simulated(props: &PropertyMap) -> Result<ConnectionProfile> {
    let endpoint = prop(props, "endpoint");
    validate_url(&endpoint)?;
    Ok(ConnectionProfile::Simulated(SimulatedProfile {
        endpoint,
        tenant_id: prop(props, "tenant_id"),
    }))
}

fn build_onprem(props: &PropertyMap) -> Result<ConnectionProfile> {
    let (host, port) = parse_host_port(&prop(props, "endpoint"))?;
    Ok(ConnectionProfile::OnPrem(OnPremProfile {
        host,
        port,
        namespace: optional_prop(props, "namespace"),
    }))
}
