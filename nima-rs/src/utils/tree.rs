//! Tree rendering for actor hierarchies

use console::Style;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Key/value pairs in insertion order
    pub metadata: Vec<(String, String)>,
}

/// Kinds of entries in an actor tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Node,
    Bone,
    Image,
    Solver,
    Collider,
    Nested,
    Event,
    Property,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    pub fn new(name: String, node_type: NodeType) -> Self {
        Self {
            name,
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }
}

impl NodeType {
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "🎭",
            NodeType::Node => "📍",
            NodeType::Bone => "🦴",
            NodeType::Image => "🖼️",
            NodeType::Solver => "🎯",
            NodeType::Collider => "🛡️",
            NodeType::Nested => "📦",
            NodeType::Event => "⚡",
            NodeType::Property => "🏷️",
        }
    }

    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Node => Style::new().white(),
                NodeType::Bone => Style::new().bold().yellow(),
                NodeType::Image => Style::new().green(),
                NodeType::Solver => Style::new().magenta(),
                NodeType::Collider => Style::new().blue(),
                NodeType::Nested => Style::new().cyan(),
                NodeType::Event => Style::new().yellow(),
                NodeType::Property => Style::new().dim(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{prefix}{connector}{} {}",
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let parts: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        output.push_str(&format!(" [{}]", parts.join(", ")));
    }
    output.push('\n');

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{prefix}{}", if is_last { "    " } else { "│   " })
    };

    if options.show_metadata && !options.compact {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{child_prefix}    {}: {value}\n",
                meta_style.apply_to(key)
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i + 1 == node.children.len();
        render_node(child, output, &child_prefix, is_last_child, depth + 1, options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::new("hero.nima".to_string(), NodeType::Root)
            .with_metadata("version", "18")
            .add_child(
                TreeNode::new("spine".to_string(), NodeType::Bone)
                    .with_metadata("length", "10.000")
                    .add_child(TreeNode::new("head".to_string(), NodeType::Image)),
            )
            .add_child(TreeNode::new("footstep".to_string(), NodeType::Event))
    }

    #[test]
    fn test_tree_rendering() {
        let options = TreeOptions {
            no_color: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&sample_tree(), &options);

        assert!(output.contains("hero.nima"));
        assert!(output.contains("├── 🦴 spine"));
        assert!(output.contains("│   └── 🖼️ head"));
        assert!(output.contains("└── ⚡ footstep"));
        assert!(output.contains("length: 10.000"));
    }

    #[test]
    fn test_compact_metadata_is_inline() {
        let options = TreeOptions {
            no_color: true,
            compact: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&sample_tree(), &options);
        assert!(output.contains("spine [length:10.000]"));
    }

    #[test]
    fn test_max_depth_prunes() {
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&sample_tree(), &options);
        assert!(output.contains("spine"));
        assert!(!output.contains("head"));
    }
}
