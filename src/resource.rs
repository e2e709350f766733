//! Resource declaration data model.
//!
//! This module defines the structures recorded by the
//! [`StackGraph`](crate::graph::StackGraph): resource kinds, logical names,
//! property values, and the deferred references that wire one declaration's
//! output into another's input. Values form a small tree so nested provider
//! arguments (an OS profile, a list of IP configurations) can be declared
//! without flattening.
//!
//! # Examples
//!
//! ```
//! use kumo::props;
//! use kumo::resource::{ResourceKind, Value};
//!
//! let props = props! {
//!     "location" => "westeurope",
//!     "sku" => props! { "name" => "Standard_LRS" },
//! };
//! assert_eq!(props.len(), 2);
//! assert_eq!(ResourceKind::PublicIp.token(), "public-ip");
//! ```

use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::fmt;

use crate::secret::SecretString;

/// Insertion-ordered property map attached to a declaration.
pub type Props = IndexMap<String, Value>;

/// The fixed set of resource kinds kumo can declare.
///
/// Serialized as kebab-case tokens in the plan handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// A resource group containing every other resource.
    ResourceGroup,
    /// A storage account (boot diagnostics target).
    StorageAccount,
    /// A virtual network.
    VirtualNetwork,
    /// A subnet within a virtual network.
    Subnet,
    /// A public IP address.
    PublicIp,
    /// A network interface joining subnet and public IP.
    NetworkInterface,
    /// A virtual machine.
    VirtualMachine,
}

impl ResourceKind {
    /// The kebab-case token used in plans and diagnostics.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource-group",
            Self::StorageAccount => "storage-account",
            Self::VirtualNetwork => "virtual-network",
            Self::Subnet => "subnet",
            Self::PublicIp => "public-ip",
            Self::NetworkInterface => "network-interface",
            Self::VirtualMachine => "virtual-machine",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Caller-unique logical name of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// View the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ResourceName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A deferred reference to another declaration's attribute.
///
/// The attribute is only knowable after the engine provisions the producer;
/// the reference records the relationship, never the value. `path` is a
/// dotted attribute path such as `primary_endpoints.blob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttrRef {
    /// Logical name of the producing declaration.
    pub resource: ResourceName,
    /// Dotted attribute path into the producer's resolved outputs.
    pub path: String,
}

/// A property value: a literal, a secret, a deferred reference, or a nested
/// collection of further values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A plain string.
    Literal(String),
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A secret, redacted everywhere except the tagged plan form.
    Secret(SecretString),
    /// A deferred reference to another declaration's attribute.
    Ref(AttrRef),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested property map.
    Map(Props),
}

impl Value {
    /// Visit every [`AttrRef`] nested anywhere in this value.
    pub fn for_each_ref<'a>(&'a self, f: &mut dyn FnMut(&'a AttrRef)) {
        match self {
            Self::Ref(attr) => f(attr),
            Self::List(items) => {
                for item in items {
                    item.for_each_ref(f);
                }
            }
            Self::Map(map) => {
                for item in map.values() {
                    item.for_each_ref(f);
                }
            }
            Self::Literal(_) | Self::Bool(_) | Self::Int(_) | Self::Secret(_) => {}
        }
    }
}

// References and secrets need an unambiguous wire form, so `Value` serialises
// through explicit `$ref` / `$secret` tags rather than a derived
// representation.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Secret(secret) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$secret", secret.expose())?;
                map.end()
            }
            Self::Ref(attr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", attr)?;
                map.end()
            }
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<SecretString> for Value {
    fn from(value: SecretString) -> Self {
        Self::Secret(value)
    }
}

impl From<AttrRef> for Value {
    fn from(value: AttrRef) -> Self {
        Self::Ref(value)
    }
}

impl From<Props> for Value {
    fn from(value: Props) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

/// Build a [`Props`] map from `key => value` pairs.
///
/// Values are converted through [`Value::from`], so literals, secrets,
/// handles' outputs, nested `props!` maps, and lists all work in place.
#[macro_export]
macro_rules! props {
    ( $( $key:literal => $value:expr ),* $(,)? ) => {{
        let mut map = $crate::resource::Props::new();
        $( map.insert($key.into(), $crate::resource::Value::from($value)); )*
        map
    }};
}

/// A recorded intent to create one cloud resource with given properties.
///
/// Created once at graph-build time, immutable thereafter, and owned
/// exclusively by the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDeclaration {
    kind: ResourceKind,
    name: ResourceName,
    properties: Props,
}

impl ResourceDeclaration {
    pub(crate) fn new(kind: ResourceKind, name: ResourceName, properties: Props) -> Self {
        Self {
            kind,
            name,
            properties,
        }
    }

    /// The declaration's resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The declaration's logical name.
    #[must_use]
    pub const fn name(&self) -> &ResourceName {
        &self.name
    }

    /// The declared properties, in insertion order.
    #[must_use]
    pub const fn properties(&self) -> &Props {
        &self.properties
    }

    /// Logical names of every declaration this one references, in property
    /// order. A producer referenced more than once appears once per
    /// reference.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&ResourceName> {
        let mut deps = Vec::new();
        for value in self.properties.values() {
            value.for_each_ref(&mut |attr| deps.push(&attr.resource));
        }
        deps
    }
}

/// Handle returned by [`StackGraph::declare`](crate::graph::StackGraph::declare),
/// usable as a dependency source for later declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    name: ResourceName,
    kind: ResourceKind,
}

impl ResourceHandle {
    pub(crate) const fn new(name: ResourceName, kind: ResourceKind) -> Self {
        Self { name, kind }
    }

    /// The handle's logical name.
    #[must_use]
    pub const fn name(&self) -> &ResourceName {
        &self.name
    }

    /// The handle's resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Mint a deferred reference to one of this declaration's attributes.
    ///
    /// The attribute value is only knowable after the engine provisions the
    /// resource; until then the reference stands in for it.
    #[must_use]
    pub fn output(&self, path: impl Into<String>) -> Value {
        Value::Ref(AttrRef {
            resource: self.name.clone(),
            path: path.into(),
        })
    }
}
