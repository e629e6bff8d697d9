//! Node-port-edge graph built from a loaded topology, ready for layout.

use crate::model::{Direction, Library, PortKind, Topology};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub kind: PortKind,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    /// Component type shown under the instance name.
    pub sublabel: Option<String>,
    pub ports: Vec<Port>,
}

impl Node {
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// An edge between two ports. Both endpoints are guaranteed to exist on their
/// nodes; connections that fail that check never become edges.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub from_port: String,
    pub to: String,
    pub to_port: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Graph {
    pub direction: Direction,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
    pub node_order: HashMap<String, usize>,
}

impl Graph {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            node_order: HashMap::new(),
        }
    }
}

/// Maps instances and connections onto the generic graph. A connection whose
/// instance or port cannot be resolved is logged and skipped; the diagram is
/// still produced without it.
pub fn build_graph(topology: &Topology, library: &Library) -> Graph {
    let mut graph = Graph::new(topology.direction);

    for instance in &topology.instances {
        if graph.nodes.contains_key(&instance.name) {
            warn!(instance = %instance.name, "duplicate instance name, keeping the first");
            continue;
        }
        let (sublabel, ports) = match library.component(&instance.component) {
            Some(def) => {
                let sublabel = def
                    .label
                    .clone()
                    .unwrap_or_else(|| def.name.to_string());
                let ports = def
                    .ports
                    .iter()
                    .map(|p| Port {
                        name: p.name.clone(),
                        kind: p.kind,
                    })
                    .collect();
                (Some(sublabel), ports)
            }
            None => {
                warn!(
                    instance = %instance.name,
                    component = %instance.component,
                    "component not defined in any imported library"
                );
                (Some(instance.component.to_string()), Vec::new())
            }
        };
        graph
            .node_order
            .insert(instance.name.clone(), graph.nodes.len());
        graph.nodes.insert(
            instance.name.clone(),
            Node {
                id: instance.name.clone(),
                label: instance.name.clone(),
                sublabel,
                ports,
            },
        );
    }

    for connection in &topology.connections {
        let mut resolved = true;
        for endpoint in [&connection.from, &connection.to] {
            match graph.nodes.get(&endpoint.instance) {
                None => {
                    warn!(
                        instance = %endpoint.instance,
                        "connection references unknown instance, skipping edge"
                    );
                    resolved = false;
                }
                Some(node) if node.port(&endpoint.port).is_none() => {
                    warn!(
                        instance = %endpoint.instance,
                        port = %endpoint.port,
                        "connection references missing port, skipping edge"
                    );
                    resolved = false;
                }
                Some(_) => {}
            }
        }
        if !resolved {
            continue;
        }
        graph.edges.push(Edge {
            from: connection.from.instance.clone(),
            from_port: connection.from.port.clone(),
            to: connection.to.instance.clone(),
            to_port: connection.to.port.clone(),
            label: connection.label.clone(),
        });
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ComponentDef, Connection, Endpoint, Instance, PortDef, QName,
    };

    fn camera_encoder_library() -> Library {
        let mut library = Library::default();
        library.insert(ComponentDef {
            name: QName::new("video", "Camera"),
            label: None,
            ports: vec![PortDef {
                name: "frames".to_string(),
                kind: PortKind::Out,
            }],
        });
        library.insert(ComponentDef {
            name: QName::new("video", "Encoder"),
            label: Some("H.264 encoder".to_string()),
            ports: vec![
                PortDef {
                    name: "raw".to_string(),
                    kind: PortKind::In,
                },
                PortDef {
                    name: "out".to_string(),
                    kind: PortKind::Out,
                },
            ],
        });
        library
    }

    fn instance(name: &str, component: QName) -> Instance {
        Instance {
            name: name.to_string(),
            component,
        }
    }

    fn connection(from: (&str, &str), to: (&str, &str)) -> Connection {
        Connection {
            from: Endpoint {
                instance: from.0.to_string(),
                port: from.1.to_string(),
            },
            to: Endpoint {
                instance: to.0.to_string(),
                port: to.1.to_string(),
            },
            label: None,
        }
    }

    fn topology(instances: Vec<Instance>, connections: Vec<Connection>) -> Topology {
        Topology {
            name: "test".to_string(),
            direction: Direction::LeftRight,
            instances,
            connections,
        }
    }

    #[test]
    fn builds_nodes_with_ports_and_edges() {
        let library = camera_encoder_library();
        let topo = topology(
            vec![
                instance("cam", QName::new("video", "Camera")),
                instance("enc", QName::new("video", "Encoder")),
            ],
            vec![connection(("cam", "frames"), ("enc", "raw"))],
        );
        let graph = build_graph(&topo, &library);

        assert_eq!(graph.nodes.len(), 2);
        let cam = &graph.nodes["cam"];
        assert_eq!(cam.sublabel.as_deref(), Some("video:Camera"));
        assert_eq!(cam.ports.len(), 1);
        let enc = &graph.nodes["enc"];
        assert_eq!(enc.sublabel.as_deref(), Some("H.264 encoder"));
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from_port, "frames");
        assert_eq!(graph.node_order["cam"], 0);
        assert_eq!(graph.node_order["enc"], 1);
    }

    #[test]
    fn missing_port_skips_edge_but_keeps_nodes() {
        let library = camera_encoder_library();
        let topo = topology(
            vec![
                instance("cam", QName::new("video", "Camera")),
                instance("enc", QName::new("video", "Encoder")),
            ],
            vec![connection(("cam", "no_such_port"), ("enc", "raw"))],
        );
        let graph = build_graph(&topo, &library);
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn unknown_instance_skips_edge() {
        let library = camera_encoder_library();
        let topo = topology(
            vec![instance("cam", QName::new("video", "Camera"))],
            vec![connection(("cam", "frames"), ("ghost", "raw"))],
        );
        let graph = build_graph(&topo, &library);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn unknown_component_yields_bare_node() {
        let library = Library::default();
        let topo = topology(vec![instance("cam", QName::new("video", "Camera"))], Vec::new());
        let graph = build_graph(&topo, &library);
        let cam = &graph.nodes["cam"];
        assert!(cam.ports.is_empty());
        assert_eq!(cam.sublabel.as_deref(), Some("video:Camera"));
    }

    #[test]
    fn duplicate_instance_keeps_first() {
        let library = camera_encoder_library();
        let topo = topology(
            vec![
                instance("cam", QName::new("video", "Camera")),
                instance("cam", QName::new("video", "Encoder")),
            ],
            Vec::new(),
        );
        let graph = build_graph(&topo, &library);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes["cam"].sublabel.as_deref(), Some("video:Camera"));
    }
}
