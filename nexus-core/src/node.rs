//! Graph entities handled by the enrichment core
//!
//! A [`Node`] is an investigated entity (address, domain, email, ...). Its
//! `data` is an untyped, insertion-ordered map: the core only ever reads the
//! identifying key of the node type and writes the fields a provider returns.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Entity type tag of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Network address
    Ip,
    /// Domain name
    Domain,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Social identity / username
    Identity,
    /// Cryptocurrency wallet
    Crypto,
    /// Company or organization
    Company,
    /// Bank account
    Bank,
    /// Server or service
    Server,
    /// Free-form data
    GenericData,
    /// Investigation target (person)
    Target,
    /// Physical location
    Location,
    /// Web URL (profile hits)
    Url,
    /// Open network port
    Port,
    /// Grouped DNS records
    DnsRecord,
    /// Shodan host report
    ShodanData,
    /// Abuse reputation report
    ReputationData,
    /// Geolocation report
    GeoData,
    /// VirusTotal verdict report
    VtReport,
    /// Email verification report
    EmailData,
    /// Phone validation report
    PhoneData,
    /// Any other tag, kept verbatim
    Custom(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Ip => "ip",
            NodeType::Domain => "domain",
            NodeType::Email => "email",
            NodeType::Phone => "phone",
            NodeType::Identity => "identity",
            NodeType::Crypto => "crypto",
            NodeType::Company => "company",
            NodeType::Bank => "bank",
            NodeType::Server => "server",
            NodeType::GenericData => "generic-data",
            NodeType::Target => "target",
            NodeType::Location => "location",
            NodeType::Url => "url",
            NodeType::Port => "port",
            NodeType::DnsRecord => "dns_record",
            NodeType::ShodanData => "shodan_data",
            NodeType::ReputationData => "reputation_data",
            NodeType::GeoData => "geo_data",
            NodeType::VtReport => "vt_report",
            NodeType::EmailData => "email_data",
            NodeType::PhoneData => "phone_data",
            NodeType::Custom(tag) => tag,
        }
    }

    /// Data keys holding the search value for this type, in lookup order
    pub fn identifying_keys(&self) -> &'static [&'static str] {
        match self {
            NodeType::Ip => &["ip"],
            NodeType::Domain => &["domain"],
            NodeType::Email => &["email"],
            NodeType::Phone => &["number", "phone"],
            NodeType::Identity => &["username", "handle"],
            NodeType::Crypto => &["address"],
            _ => &[],
        }
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        match tag {
            "ip" => NodeType::Ip,
            "domain" => NodeType::Domain,
            "email" => NodeType::Email,
            "phone" => NodeType::Phone,
            "identity" => NodeType::Identity,
            "crypto" => NodeType::Crypto,
            "company" => NodeType::Company,
            "bank" => NodeType::Bank,
            "server" => NodeType::Server,
            "generic-data" => NodeType::GenericData,
            "target" => NodeType::Target,
            "location" => NodeType::Location,
            "url" => NodeType::Url,
            "port" => NodeType::Port,
            "dns_record" => NodeType::DnsRecord,
            "shodan_data" => NodeType::ShodanData,
            "reputation_data" => NodeType::ReputationData,
            "geo_data" => NodeType::GeoData,
            "vt_report" => NodeType::VtReport,
            "email_data" => NodeType::EmailData,
            "phone_data" => NodeType::PhoneData,
            other => NodeType::Custom(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        NodeType::from(tag.as_str())
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        node_type.as_str().to_string()
    }
}

impl FromStr for NodeType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeType::from(s))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque key/value payload of a node
///
/// Keys keep insertion order so a patched node renders its fields in the
/// order providers wrote them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeData(Map<String, Value>);

impl NodeData {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of `key`, ignoring blanks and non-string values
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Insert only when the provider actually reported a value
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.into());
        }
    }

    /// Store a list as a single joined string
    pub fn insert_joined<I, S>(&mut self, key: &str, items: I, separator: &str)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let joined = items
            .into_iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(separator);
        self.0.insert(key.to_string(), Value::String(joined));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Overlay `other` onto self; keys in `other` win
    pub fn merge(&mut self, other: &NodeData) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Serialized form stored by the persistence layer
    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for NodeData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A vertex of the investigation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub data: NodeData,
    /// Canvas position, owned by the layout layer
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub notes: String,
    /// Event date for the timeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            data: NodeData::new(),
            x: 0.0,
            y: 0.0,
            notes: String::new(),
            date: None,
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key, value);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Build a node that will hang off `anchor` in the graph
    ///
    /// The id is `<prefix>_<random>` and the position is a small random
    /// offset below the anchor so new nodes do not stack on each other.
    pub fn satellite(prefix: &str, node_type: NodeType, data: NodeData, anchor: &Node) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            id: generate_id(prefix),
            node_type,
            data,
            x: anchor.x + rng.gen_range(-100.0..100.0),
            y: anchor.y + 100.0 + rng.gen_range(0.0..100.0),
            notes: String::new(),
            date: None,
        }
    }

    /// The value an enrichment should search for (ip, domain, email, ...)
    pub fn search_value(&self) -> Option<&str> {
        self.node_type
            .identifying_keys()
            .iter()
            .find_map(|key| self.data.get_str(key))
    }
}

/// A connection between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: generate_id("L"),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether the link touches `node_id` on either side
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Random identifier with a readable prefix
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &uuid[..12])
}
