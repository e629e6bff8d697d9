//! Topology and component-library XML loading.
//!
//! Both file kinds are read as a plain tree walk: attributes map onto the
//! records in [`crate::model`], unknown elements are ignored. `<import>`
//! references are resolved relative to the importing file and followed
//! transitively; a visited set makes import cycles harmless.

use crate::model::{
    ComponentDef, Connection, Direction, Endpoint, Instance, Library, PortDef, PortKind, QName,
    Topology,
};
use roxmltree::{Document, Node as XmlNode};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("xml syntax error in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("{path}: <{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        path: PathBuf,
        element: String,
        attribute: &'static str,
    },

    #[error("{path}: malformed component reference `{reference}`")]
    BadReference { path: PathBuf, reference: String },

    #[error("{path}: expected <{expected}> document root, found <{found}>")]
    UnexpectedRoot {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
}

/// Loads a topology file and every library file it imports, transitively.
pub fn load_topology(path: &Path) -> Result<(Topology, Library), LoadError> {
    let text = read_file(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_topology(&text, path, base_dir)
}

/// Parses topology XML that did not come from a file (stdin). Imports are
/// resolved relative to `base_dir`.
pub fn parse_topology_str(text: &str, base_dir: &Path) -> Result<(Topology, Library), LoadError> {
    parse_topology(text, Path::new("<stdin>"), base_dir)
}

fn parse_topology(
    text: &str,
    origin: &Path,
    base_dir: &Path,
) -> Result<(Topology, Library), LoadError> {
    let doc = parse_document(text, origin)?;
    let root = doc.root_element();
    if root.tag_name().name() != "topology" {
        return Err(LoadError::UnexpectedRoot {
            path: origin.to_path_buf(),
            expected: "topology",
            found: root.tag_name().name().to_string(),
        });
    }

    let name = root.attribute("name").unwrap_or("topology").to_string();
    let direction = match root.attribute("direction") {
        Some(token) => Direction::from_token(token).unwrap_or_else(|| {
            warn!(token, "unknown direction, falling back to LR");
            Direction::LeftRight
        }),
        None => Direction::LeftRight,
    };

    let mut library = Library::default();
    let mut visited = HashSet::new();
    let mut instances = Vec::new();
    let mut connections = Vec::new();

    for child in root.children().filter(XmlNode::is_element) {
        match child.tag_name().name() {
            "import" => {
                let href = require_attr(&child, "href", origin)?;
                load_library_file(&base_dir.join(href), &mut library, &mut visited)?;
            }
            "instance" => {
                let name = require_attr(&child, "name", origin)?.to_string();
                let reference = require_attr(&child, "component", origin)?;
                let component =
                    QName::from_reference(reference).ok_or_else(|| LoadError::BadReference {
                        path: origin.to_path_buf(),
                        reference: reference.to_string(),
                    })?;
                instances.push(Instance { name, component });
            }
            "connection" => {
                let from = Endpoint {
                    instance: require_attr(&child, "from", origin)?.to_string(),
                    port: require_attr(&child, "from-port", origin)?.to_string(),
                };
                let to = Endpoint {
                    instance: require_attr(&child, "to", origin)?.to_string(),
                    port: require_attr(&child, "to-port", origin)?.to_string(),
                };
                let label = child.attribute("label").map(str::to_string);
                connections.push(Connection { from, to, label });
            }
            other => {
                debug!(element = other, "ignoring unknown topology element");
            }
        }
    }

    Ok((
        Topology {
            name,
            direction,
            instances,
            connections,
        },
        library,
    ))
}

fn load_library_file(
    path: &Path,
    library: &mut Library,
    visited: &mut HashSet<PathBuf>,
) -> Result<(), LoadError> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        debug!(path = %path.display(), "library already imported, skipping");
        return Ok(());
    }
    debug!(path = %path.display(), "loading component library");

    let text = read_file(path)?;
    let doc = parse_document(&text, path)?;
    let root = doc.root_element();
    if root.tag_name().name() != "library" {
        return Err(LoadError::UnexpectedRoot {
            path: path.to_path_buf(),
            expected: "library",
            found: root.tag_name().name().to_string(),
        });
    }

    let namespace = root.attribute("namespace").unwrap_or("").to_string();
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    for child in root.children().filter(XmlNode::is_element) {
        match child.tag_name().name() {
            "import" => {
                let href = require_attr(&child, "href", path)?;
                load_library_file(&base_dir.join(href), library, visited)?;
            }
            "component" => {
                let def = parse_component(&child, &namespace, path)?;
                if !library.insert(def.clone()) {
                    warn!(component = %def.name, "duplicate component definition ignored");
                }
            }
            other => {
                debug!(element = other, "ignoring unknown library element");
            }
        }
    }

    Ok(())
}

fn parse_component(
    node: &XmlNode<'_, '_>,
    namespace: &str,
    origin: &Path,
) -> Result<ComponentDef, LoadError> {
    let name = require_attr(node, "name", origin)?;
    let label = node.attribute("label").map(str::to_string);

    let mut ports: Vec<PortDef> = Vec::new();
    for child in node.children().filter(XmlNode::is_element) {
        if child.tag_name().name() != "port" {
            continue;
        }
        let port_name = require_attr(&child, "name", origin)?.to_string();
        if ports.iter().any(|p| p.name == port_name) {
            warn!(component = name, port = %port_name, "duplicate port ignored");
            continue;
        }
        let kind = match child.attribute("kind") {
            Some(token) => PortKind::from_token(token).unwrap_or_else(|| {
                warn!(component = name, port = %port_name, token, "unknown port kind, treating as `in`");
                PortKind::In
            }),
            None => PortKind::In,
        };
        ports.push(PortDef {
            name: port_name,
            kind,
        });
    }

    Ok(ComponentDef {
        name: QName::new(namespace, name),
        label,
        ports,
    })
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_document<'a>(text: &'a str, origin: &Path) -> Result<Document<'a>, LoadError> {
    Document::parse(text).map_err(|source| LoadError::Xml {
        path: origin.to_path_buf(),
        source,
    })
}

fn require_attr<'a>(
    node: &XmlNode<'a, '_>,
    name: &'static str,
    origin: &Path,
) -> Result<&'a str, LoadError> {
    node.attribute(name).ok_or_else(|| LoadError::MissingAttribute {
        path: origin.to_path_buf(),
        element: node.tag_name().name().to_string(),
        attribute: name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<(Topology, Library), LoadError> {
        parse_topology_str(text, Path::new("."))
    }

    #[test]
    fn parses_instances_and_connections() {
        let (topology, library) = parse(
            r#"<topology name="app" direction="TD">
                 <instance name="cam" component="video:Camera"/>
                 <instance name="enc" component="video:Encoder"/>
                 <connection from="cam" from-port="frames" to="enc" to-port="raw" label="1080p"/>
               </topology>"#,
        )
        .unwrap();

        assert_eq!(topology.name, "app");
        assert_eq!(topology.direction, Direction::TopDown);
        assert_eq!(topology.instances.len(), 2);
        assert_eq!(topology.instances[0].name, "cam");
        assert_eq!(topology.instances[0].component, QName::new("video", "Camera"));
        assert_eq!(topology.connections.len(), 1);
        let conn = &topology.connections[0];
        assert_eq!(conn.from, Endpoint { instance: "cam".into(), port: "frames".into() });
        assert_eq!(conn.to, Endpoint { instance: "enc".into(), port: "raw".into() });
        assert_eq!(conn.label.as_deref(), Some("1080p"));
        assert!(library.is_empty());
    }

    #[test]
    fn missing_attribute_is_typed() {
        let err = parse(r#"<topology><instance name="cam"/></topology>"#).unwrap_err();
        match err {
            LoadError::MissingAttribute { element, attribute, .. } => {
                assert_eq!(element, "instance");
                assert_eq!(attribute, "component");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_component_reference_fails() {
        let err = parse(r#"<topology><instance name="cam" component="video:"/></topology>"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::BadReference { .. }));
    }

    #[test]
    fn wrong_root_element_fails() {
        let err = parse("<library/>").unwrap_err();
        assert!(matches!(err, LoadError::UnexpectedRoot { .. }));
    }

    #[test]
    fn unknown_elements_and_direction_degrade() {
        let (topology, _) = parse(
            r#"<topology direction="sideways">
                 <metadata author="nobody"/>
                 <instance name="a" component="X"/>
               </topology>"#,
        )
        .unwrap();
        assert_eq!(topology.direction, Direction::LeftRight);
        assert_eq!(topology.instances.len(), 1);
    }

    #[test]
    fn loads_imports_from_fixture_tree() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("nested")
            .join("app.xml");
        let (topology, library) = load_topology(&root).unwrap();
        assert!(!topology.instances.is_empty());
        // app.xml imports base.xml which re-imports app's other library and
        // itself; the visited set must keep this finite.
        assert!(library.component(&QName::new("video", "Camera")).is_some());
        assert!(library.component(&QName::new("sink", "Display")).is_some());
    }
}
