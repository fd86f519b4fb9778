// Compiled mapping: flat size table plus the property tree indexing into it

/// Most interior nodes allowed on any root-to-leaf path of a property tree.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingNode {
    /// Position in `MappingFile::sizes`. Only leaves are guaranteed to point
    /// at a valid entry; interior nodes carry the index of their first leaf.
    pub index: u16,
    pub debug_name: Option<String>,
    pub children: Vec<MappingNode>,
}

impl MappingNode {
    pub fn leaf(index: u16, debug_name: Option<String>) -> Self {
        Self {
            index,
            debug_name,
            children: Vec::new(),
        }
    }

    pub fn interior(index: u16, debug_name: Option<String>, children: Vec<MappingNode>) -> Self {
        Self {
            index,
            debug_name,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn name(&self) -> &str {
        self.debug_name.as_deref().unwrap_or("")
    }

    fn collect_leaves(&self, out: &mut Vec<u16>) {
        if self.is_leaf() {
            out.push(self.index);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingFile {
    pub sizes: Vec<u8>,
    pub properties: Vec<MappingNode>,
}

impl MappingFile {
    /// Leaf indices in depth-first, member order.
    pub fn leaf_indices(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.sizes.len());
        for node in &self.properties {
            node.collect_leaves(&mut out);
        }
        out
    }

    pub fn total_size(&self) -> usize {
        self.sizes.iter().map(|s| usize::from(*s)).sum()
    }

    pub fn has_debug_names(&self) -> bool {
        fn any_named(nodes: &[MappingNode]) -> bool {
            nodes.iter().any(|n| n.debug_name.is_some() || any_named(&n.children))
        }
        any_named(&self.properties)
    }

    /// Indented listing of the size table and property tree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Sizes ({} entries, {} bytes):\n", self.sizes.len(), self.total_size()));
        for (i, size) in self.sizes.iter().enumerate() {
            out.push_str(&format!("  [{}] {}\n", i, size));
        }
        out.push_str("\nProperties:\n");
        for node in &self.properties {
            render_node(node, 1, &mut out);
        }
        out
    }
}

fn render_node(node: &MappingNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let label = match &node.debug_name {
        Some(name) => format!(" {}", name),
        None => String::new(),
    };
    if node.is_leaf() {
        out.push_str(&format!("{}leaf #{}{}\n", indent, node.index, label));
    } else {
        out.push_str(&format!("{}struct @{}{} {{\n", indent, node.index, label));
        for child in &node.children {
            render_node(child, depth + 1, out);
        }
        out.push_str(&format!("{}}}\n", indent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MappingFile {
        MappingFile {
            sizes: vec![2, 1, 4],
            properties: vec![
                MappingNode::leaf(0, Some("y".to_string())),
                MappingNode::interior(
                    1,
                    Some("z".to_string()),
                    vec![MappingNode::leaf(1, Some("x".to_string())), MappingNode::leaf(2, None)],
                ),
            ],
        }
    }

    #[test]
    fn leaf_indices_are_depth_first() {
        assert_eq!(sample().leaf_indices(), vec![0, 1, 2]);
        assert_eq!(sample().total_size(), 7);
    }

    #[test]
    fn debug_names_detected_anywhere() {
        assert!(sample().has_debug_names());
        let bare = MappingFile {
            sizes: vec![1],
            properties: vec![MappingNode::interior(0, None, vec![MappingNode::leaf(0, None)])],
        };
        assert!(!bare.has_debug_names());
    }

    #[test]
    fn render_lists_tree() {
        let text = sample().render();
        assert!(text.starts_with("Sizes (3 entries, 7 bytes):\n  [0] 2\n"));
        assert!(text.contains("  leaf #0 y\n  struct @1 z {\n    leaf #1 x\n    leaf #2\n  }\n"));
    }
}
