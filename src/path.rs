//! Structural paths locating violations in an object graph.
//!
//! This module provides [`PathNode`], [`ViolationPath`] and [`PathBuilder`]
//! for building and representing the addressable location of a constraint
//! violation, e.g. `address.zip` or `users[0].email`.

use std::fmt::{self, Display};

/// A single node of a structural path.
///
/// Paths are built from nodes representing the root object, a property
/// access (optionally indexed or keyed), a constructor, or a constructor
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathNode {
    /// The root object a path starts from. Renders as the empty name.
    Root,
    /// A property access (e.g. `email`), optionally into an array element
    /// (`emails[0]`) or a map entry (`scores[alice]`).
    Property {
        name: String,
        index: Option<usize>,
        key: Option<String>,
    },
    /// A constructor of the named type.
    Constructor {
        type_name: String,
        param_types: Vec<String>,
    },
    /// A constructor parameter, addressed by name and position.
    Parameter { name: String, index: usize },
}

impl PathNode {
    /// Creates a plain property node.
    pub fn property(name: impl Into<String>) -> Self {
        PathNode::Property {
            name: name.into(),
            index: None,
            key: None,
        }
    }

    /// Creates a property node addressing an array element.
    pub fn indexed_property(name: impl Into<String>, index: usize) -> Self {
        PathNode::Property {
            name: name.into(),
            index: Some(index),
            key: None,
        }
    }

    /// Creates a property node addressing a map entry.
    pub fn keyed_property(name: impl Into<String>, key: impl Into<String>) -> Self {
        PathNode::Property {
            name: name.into(),
            index: None,
            key: Some(key.into()),
        }
    }

    /// The rendered name of this node. `Root` has the empty name.
    pub fn name(&self) -> &str {
        match self {
            PathNode::Root => "",
            PathNode::Property { name, .. } => name,
            PathNode::Constructor { type_name, .. } => type_name,
            PathNode::Parameter { name, .. } => name,
        }
    }

    fn is_root(&self) -> bool {
        matches!(self, PathNode::Root)
    }
}

/// An immutable path to a violation in a nested object graph.
///
/// A full violation location always starts with exactly one [`PathNode::Root`];
/// suffix fragments produced by the split utilities may omit it.
///
/// # Example
///
/// ```rust
/// use inquest::ViolationPath;
///
/// let path = ViolationPath::builder()
///     .append_property("users")
///     .build();
/// assert_eq!(path.to_string(), "users");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ViolationPath {
    nodes: Vec<PathNode>,
}

impl ViolationPath {
    /// A path consisting of a single `Root` node, identifying the object
    /// itself.
    pub fn root() -> Self {
        Self {
            nodes: vec![PathNode::Root],
        }
    }

    /// A path of `Root` followed by a single property node.
    pub fn of_property(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![PathNode::Root, PathNode::property(name)],
        }
    }

    /// Starts a new [`PathBuilder`] seeded with a `Root` node.
    pub fn builder() -> PathBuilder {
        PathBuilder {
            nodes: vec![PathNode::Root],
        }
    }

    /// Starts a [`PathBuilder`] with no nodes at all, for assembling path
    /// fragments that will be spliced into another path.
    pub fn fragment() -> PathBuilder {
        PathBuilder { nodes: Vec::new() }
    }

    /// Returns the number of nodes in this path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if this path has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over the path nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.iter()
    }

    /// Returns the first `Parameter` node, with its position in the path.
    pub fn first_parameter(&self) -> Option<(usize, &PathNode)> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| matches!(n, PathNode::Parameter { .. }))
    }

    /// Returns the prefix of this path up to and including the first
    /// `Constructor` node. Empty if the path has none.
    pub fn take_until_constructor(&self) -> ViolationPath {
        let mut nodes = Vec::new();
        for node in &self.nodes {
            let is_ctor = matches!(node, PathNode::Constructor { .. });
            nodes.push(node.clone());
            if is_ctor {
                return ViolationPath { nodes };
            }
        }
        ViolationPath { nodes: Vec::new() }
    }

    /// Returns the fragment strictly after the first `Parameter` node.
    ///
    /// The fragment carries no `Root` node; it is meant to be spliced onto
    /// a remapped prefix. Empty if the path has no parameter node.
    pub fn suffix_after_parameter(&self) -> ViolationPath {
        match self.first_parameter() {
            Some((pos, _)) => ViolationPath {
                nodes: self.nodes[pos + 1..].to_vec(),
            },
            None => ViolationPath { nodes: Vec::new() },
        }
    }
}

impl Display for ViolationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.nodes {
            if node.is_root() {
                continue;
            }
            if !first {
                write!(f, ".")?;
            }
            first = false;
            write!(f, "{}", node.name())?;
            if let PathNode::Property { index, key, .. } = node {
                if let Some(index) = index {
                    write!(f, "[{}]", index)?;
                } else if let Some(key) = key {
                    write!(f, "[{}]", key)?;
                }
            }
        }
        Ok(())
    }
}

/// Incremental builder for [`ViolationPath`] values.
///
/// Pure data assembly; no operation can fail.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    nodes: Vec<PathNode>,
}

impl PathBuilder {
    /// Appends a plain property node.
    pub fn append_property(mut self, name: impl Into<String>) -> Self {
        self.nodes.push(PathNode::property(name));
        self
    }

    /// Appends a property node addressing an array element.
    pub fn append_indexed_property(mut self, name: impl Into<String>, index: usize) -> Self {
        self.nodes.push(PathNode::indexed_property(name, index));
        self
    }

    /// Appends a property node addressing a map entry.
    pub fn append_keyed_property(
        mut self,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.nodes.push(PathNode::keyed_property(name, key));
        self
    }

    /// Appends a constructor node.
    pub fn append_constructor(
        mut self,
        type_name: impl Into<String>,
        param_types: Vec<String>,
    ) -> Self {
        self.nodes.push(PathNode::Constructor {
            type_name: type_name.into(),
            param_types,
        });
        self
    }

    /// Appends a parameter node.
    pub fn append_parameter(mut self, name: impl Into<String>, index: usize) -> Self {
        self.nodes.push(PathNode::Parameter {
            name: name.into(),
            index,
        });
        self
    }

    /// Appends a prebuilt node.
    pub fn append_node(mut self, node: PathNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Splices another path onto this one.
    ///
    /// A leading `Root` on `other` is dropped when this builder already
    /// holds nodes, so concatenation never duplicates the root.
    pub fn append_path(mut self, other: &ViolationPath) -> Self {
        for (i, node) in other.nodes.iter().enumerate() {
            if i == 0 && node.is_root() && !self.nodes.is_empty() {
                continue;
            }
            self.nodes.push(node.clone());
        }
        self
    }

    /// Consumes the builder, producing an immutable path.
    pub fn build(self) -> ViolationPath {
        ViolationPath { nodes: self.nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_renders_empty() {
        let path = ViolationPath::root();
        assert_eq!(path.len(), 1);
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_single_property() {
        let path = ViolationPath::of_property("email");
        assert_eq!(path.to_string(), "email");
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_nested_properties() {
        let path = ViolationPath::builder()
            .append_property("address")
            .append_property("zip")
            .build();
        assert_eq!(path.to_string(), "address.zip");
    }

    #[test]
    fn test_indexed_property() {
        let path = ViolationPath::builder()
            .append_indexed_property("users", 0)
            .append_property("email")
            .build();
        assert_eq!(path.to_string(), "users[0].email");
    }

    #[test]
    fn test_keyed_property() {
        let path = ViolationPath::builder()
            .append_keyed_property("scores", "alice")
            .build();
        assert_eq!(path.to_string(), "scores[alice]");
    }

    #[test]
    fn test_constructor_and_parameter_rendering() {
        let path = ViolationPath::builder()
            .append_constructor("Point", vec!["int".into(), "int".into()])
            .append_parameter("x", 0)
            .build();
        assert_eq!(path.to_string(), "Point.x");
    }

    #[test]
    fn test_append_path_drops_duplicate_root() {
        let base = ViolationPath::of_property("address");
        let nested = ViolationPath::of_property("zip");

        let spliced = ViolationPath::builder()
            .append_path(&base)
            .append_path(&nested)
            .build();

        assert_eq!(spliced.to_string(), "address.zip");
        let roots = spliced
            .nodes()
            .filter(|n| matches!(n, PathNode::Root))
            .count();
        assert_eq!(roots, 1);
    }

    #[test]
    fn test_append_path_keeps_root_on_empty_builder() {
        let spliced = ViolationPath::fragment()
            .append_path(&ViolationPath::of_property("x"))
            .build();
        assert_eq!(spliced.len(), 2);
        assert_eq!(spliced.to_string(), "x");
    }

    #[test]
    fn test_first_parameter() {
        let path = ViolationPath::builder()
            .append_constructor("Point", vec![])
            .append_parameter("y", 1)
            .append_property("value")
            .build();

        let (pos, node) = path.first_parameter().unwrap();
        assert_eq!(pos, 2);
        assert_eq!(node.name(), "y");
    }

    #[test]
    fn test_take_until_constructor() {
        let path = ViolationPath::builder()
            .append_constructor("Point", vec![])
            .append_parameter("x", 0)
            .build();

        let prefix = path.take_until_constructor();
        assert_eq!(prefix.len(), 2);
        assert!(matches!(
            prefix.nodes().last(),
            Some(PathNode::Constructor { .. })
        ));

        let no_ctor = ViolationPath::of_property("x");
        assert!(no_ctor.take_until_constructor().is_empty());
    }

    #[test]
    fn test_suffix_after_parameter() {
        let path = ViolationPath::builder()
            .append_constructor("Point", vec![])
            .append_parameter("x", 0)
            .append_property("sub")
            .build();

        let suffix = path.suffix_after_parameter();
        assert_eq!(suffix.len(), 1);
        assert_eq!(suffix.to_string(), "sub");

        let no_param = ViolationPath::of_property("x");
        assert!(no_param.suffix_after_parameter().is_empty());
    }

    #[test]
    fn test_path_immutability() {
        let builder = ViolationPath::builder().append_property("users");
        let path_a = builder.clone().append_property("email").build();
        let path_b = builder.append_property("name").build();

        assert_eq!(path_a.to_string(), "users.email");
        assert_eq!(path_b.to_string(), "users.name");
    }

    #[test]
    fn test_equality() {
        let a = ViolationPath::of_property("x");
        let b = ViolationPath::of_property("x");
        let c = ViolationPath::of_property("y");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
