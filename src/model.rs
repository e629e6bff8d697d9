use std::collections::BTreeMap;
use std::fmt;

/// Layout direction of the whole diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    LeftRight,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "LR" => Some(Self::LeftRight),
            _ => None,
        }
    }
}

/// Component identifier: namespace plus local name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub namespace: String,
    pub name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses a `ns:Name` component reference. A bare `Name` resolves in the
    /// empty namespace.
    pub fn from_reference(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match token.split_once(':') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() => Some(Self::new(ns, name)),
            Some(_) => None,
            None => Some(Self::new("", token)),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    In,
    Out,
    InOut,
}

impl PortKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "inout" => Some(Self::InOut),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortDef {
    pub name: String,
    pub kind: PortKind,
}

/// A component type as declared in a library file. Ports keep their
/// declaration order; lookup is by name.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    pub name: QName,
    pub label: Option<String>,
    pub ports: Vec<PortDef>,
}

impl ComponentDef {
    pub fn port(&self, name: &str) -> Option<&PortDef> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// All component definitions collected from imported library files.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub components: BTreeMap<QName, ComponentDef>,
}

impl Library {
    /// Returns false when a definition for the same qualified name already
    /// exists; the first definition wins.
    pub fn insert(&mut self, def: ComponentDef) -> bool {
        use std::collections::btree_map::Entry;
        match self.components.entry(def.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(def);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn component(&self, name: &QName) -> Option<&ComponentDef> {
        self.components.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// A named occurrence of a component in the topology.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub component: QName,
}

/// One end of a connection: an instance name and a port on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub instance: String,
    pub port: String,
}

/// A connection is the 4-tuple (source instance, source port, target
/// instance, target port), optionally labeled.
#[derive(Debug, Clone)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Topology {
    pub name: String,
    pub direction: Direction,
    pub instances: Vec<Instance>,
    pub connections: Vec<Connection>,
}
