//! Request bodies sent by the compute client and typed views of its responses.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use cyclades_core::ids::{FlavorId, ImageId, ServerId};
use cyclades_core::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Result;

/// Largest personality payload the API accepts, in bytes of base64 text.
///
/// Not enforced locally; oversized payloads are rejected by the API.
pub const MAX_PERSONALITY_CONTENTS_BYTES: usize = 10_240;

/// Body of `POST servers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateServerRequest {
    /// Server definition.
    pub server: ServerSpec,
}

impl CreateServerRequest {
    /// Assemble the request from the required fields and the optional settings.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        image_ref: impl Into<ImageId>,
        flavor_ref: impl Into<FlavorId>,
        options: ServerCreateOptions,
    ) -> Self {
        Self {
            server: ServerSpec {
                name: name.into(),
                image_ref: image_ref.into(),
                flavor_ref: flavor_ref.into(),
                options,
            },
        }
    }
}

/// The `server` object of a create request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSpec {
    /// Server name.
    pub name: String,
    /// Image to boot from.
    #[serde(rename = "imageRef")]
    pub image_ref: ImageId,
    /// Hardware flavor.
    #[serde(rename = "flavorRef")]
    pub flavor_ref: FlavorId,
    /// Optional settings, merged into the same object.
    #[serde(flatten)]
    pub options: ServerCreateOptions,
}

/// Optional settings for server creation.
///
/// Absent fields are left out of the payload entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerCreateOptions {
    /// Files to inject into the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<Vec<Personality>>,
    /// Network connections. `None` applies the provider's default policy, an empty list
    /// leaves the server without any network connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<NetworkAttachment>>,
    /// Custom key/value metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Project the server is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl ServerCreateOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a personality entry.
    #[must_use]
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality.get_or_insert_with(Vec::new).push(personality);
        self
    }

    /// Replace the network list, including with an empty list.
    #[must_use]
    pub fn with_networks(mut self, networks: Vec<NetworkAttachment>) -> Self {
        self.networks = Some(networks);
        self
    }

    /// Append a network attachment.
    #[must_use]
    pub fn with_network(mut self, network: NetworkAttachment) -> Self {
        self.networks.get_or_insert_with(Vec::new).push(network);
        self
    }

    /// Insert a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// File injected into a server at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Personality {
    /// Destination path, created when missing.
    pub path: String,
    /// Base64-encoded file contents.
    pub contents: String,
    /// File owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// File group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// File access mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl Personality {
    /// Entry with already base64-encoded contents.
    #[must_use]
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            owner: None,
            group: None,
            mode: None,
        }
    }

    /// Entry from raw file bytes.
    #[must_use]
    pub fn from_bytes(path: impl Into<String>, data: impl AsRef<[u8]>) -> Self {
        Self::new(path, STANDARD.encode(data))
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the access mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// One entry of the `networks` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NetworkAttachment {
    /// Existing network with a specific IP already associated to it.
    FixedIp {
        /// Network id.
        uuid: String,
        /// IP address on that network.
        fixed_ip: String,
    },
    /// Existing network.
    Network {
        /// Network id.
        uuid: String,
    },
    /// Existing port.
    Port {
        /// Port id.
        port: String,
    },
}

impl NetworkAttachment {
    /// Connect to a network.
    #[must_use]
    pub fn network(uuid: impl Into<String>) -> Self {
        Self::Network { uuid: uuid.into() }
    }

    /// Connect to a network with a fixed IP.
    #[must_use]
    pub fn fixed_ip(uuid: impl Into<String>, ip: impl Into<String>) -> Self {
        Self::FixedIp {
            uuid: uuid.into(),
            fixed_ip: ip.into(),
        }
    }

    /// Connect through an existing port.
    #[must_use]
    pub fn port(port: impl Into<String>) -> Self {
        Self::Port { port: port.into() }
    }
}

/// Reboot flavor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebootType {
    /// Graceful restart.
    #[default]
    Soft,
    /// Power cycle.
    Hard,
}

/// Body of `POST servers/{id}/action` for a reboot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RebootRequest {
    /// Reboot parameters.
    pub reboot: Reboot,
}

/// Reboot parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reboot {
    /// Reboot flavor.
    #[serde(rename = "type")]
    pub reboot_type: RebootType,
}

impl RebootRequest {
    /// Build a reboot request.
    #[must_use]
    pub const fn new(reboot_type: RebootType) -> Self {
        Self {
            reboot: Reboot { reboot_type },
        }
    }
}

/// Decode a response body into one of the typed views below.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the body does not match `T`.
pub fn decode<T>(body: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(body).map_err(Error::from)
}

/// Hypermedia link attached to resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    /// Target URL.
    pub href: String,
    /// Relation (`self`, `bookmark`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

/// Reference to another resource by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdRef<T> {
    /// Referenced id.
    pub id: T,
    /// Links to the referenced resource.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// Address of a server on one network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    /// IP version (4 or 6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    /// IP address.
    pub addr: String,
    /// Address kind (`fixed`, `floating`).
    #[serde(
        rename = "OS-EXT-IPS:type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_type: Option<String>,
}

/// Virtual server as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    /// Server id.
    pub id: ServerId,
    /// Server name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lifecycle status (BUILD, ACTIVE, STOPPED, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Build progress percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Boot image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<IdRef<ImageId>>,
    /// Hardware flavor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<IdRef<FlavorId>>,
    /// Addresses grouped by network id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<BTreeMap<String, Vec<Address>>>,
    /// Custom metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Root password, only present in the create response.
    #[serde(rename = "adminPass", default, skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Resource links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Boot image as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// Image id.
    pub id: ImageId,
    /// Image name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Image status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Upload progress percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Image metadata (OS, users, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Resource links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Hardware flavor as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flavor {
    /// Flavor id.
    pub id: FlavorId,
    /// Flavor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// RAM in MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,
    /// Virtual CPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<u32>,
    /// Disk size in GiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// Storage backend.
    #[serde(
        rename = "SNF:disk_template",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_template: Option<String>,
    /// Whether new servers may use this flavor.
    #[serde(
        rename = "SNF:allow_create",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_create: Option<bool>,
    /// Resource links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Body of `servers` and `servers/detail`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerList {
    /// Servers.
    pub servers: Vec<Server>,
}

/// Body of `servers/{id}` and of a create response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerEnvelope {
    /// Server.
    pub server: Server,
}

/// Body of `images` and `images/detail`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageList {
    /// Images.
    pub images: Vec<Image>,
}

/// Body of `images/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageEnvelope {
    /// Image.
    pub image: Image,
}

/// Body of `flavors` and `flavors/detail`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlavorList {
    /// Flavors.
    pub flavors: Vec<Flavor>,
}

/// Body of `flavors/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlavorEnvelope {
    /// Flavor.
    pub flavor: Flavor,
}
