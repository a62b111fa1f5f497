//! `tree`: the component hierarchy of an actor file

use anyhow::Result;
use std::path::Path;

use nima_actor::{Actor, Component, ComponentKind, RenderNode};

use crate::utils::{
    NodeType, TreeNode, TreeOptions, format_degrees, format_point, load_actor, render_tree,
};

pub fn execute(path: &Path, depth: Option<usize>, no_color: bool, compact: bool) -> Result<()> {
    let loaded = load_actor(path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let root = build_tree(&loaded.actor, &name);
    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: true,
        compact,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

/// Tree of every component under its parent, rooted at the actor's root node
pub fn build_tree(actor: &Actor, name: &str) -> TreeNode {
    let count = actor.component_count();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (index, component) in actor.components() {
        if let Some(parent) = component.parent()
            && parent != index
            && let Some(list) = children.get_mut(parent)
        {
            list.push(index);
        }
    }

    let mut visited = vec![false; count];
    let mut root = TreeNode::new(name.to_string(), NodeType::Root)
        .with_metadata("version", &actor.version().to_string())
        .with_metadata("components", &count.to_string());
    let root_index = actor.root();
    if let Some(seen) = visited.get_mut(root_index) {
        *seen = true;
    }
    for &child in children.get(root_index).map(Vec::as_slice).unwrap_or_default() {
        if let Some(node) = build_node(actor, child, &children, &mut visited) {
            root = root.add_child(node);
        }
    }
    root
}

fn build_node(
    actor: &Actor,
    index: usize,
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> Option<TreeNode> {
    if std::mem::replace(visited.get_mut(index)?, true) {
        return None;
    }
    let component = actor.component(index)?;
    let mut node = describe(index, component);
    for &child in &children[index] {
        if let Some(child) = build_node(actor, child, children, visited) {
            node = node.add_child(child);
        }
    }
    Some(node)
}

fn describe(index: usize, component: &Component) -> TreeNode {
    let kind = component.kind();
    let node_type = match kind {
        ComponentKind::Node(_) | ComponentKind::RootBone(_) | ComponentKind::Solo(_) => {
            NodeType::Node
        }
        ComponentKind::Bone(_) => NodeType::Bone,
        ComponentKind::Image(_) | ComponentKind::StaticMesh(_) => NodeType::Image,
        ComponentKind::IkTarget(_) => NodeType::Solver,
        ComponentKind::Collider(_) => NodeType::Collider,
        ComponentKind::NestedActor(_) => NodeType::Nested,
        ComponentKind::Event => NodeType::Event,
        ComponentKind::CustomProperty(_) => NodeType::Property,
    };

    let mut tree = TreeNode::new(format!("{} #{index}", component.name()), node_type)
        .with_metadata("type", kind.type_name());

    if let Some(node) = kind.as_node() {
        tree = tree.with_metadata("position", &format_point(node.x(), node.y()));
        if node.rotation() != 0.0 {
            tree = tree.with_metadata("rotation", &format_degrees(node.rotation()));
        }
        if node.collapsed_visibility() {
            tree = tree.with_metadata("collapsed", "yes");
        }
    }
    if let Some(render) = kind.as_render_node() {
        tree = tree.with_metadata("draw order", &render.draw_order().to_string());
    }

    match kind {
        ComponentKind::Bone(bone) => {
            tree = tree.with_metadata("length", &format!("{:.3}", bone.length()));
        }
        ComponentKind::Solo(solo) => {
            tree = tree.with_metadata("active child", &solo.active_child_index().to_string());
        }
        ComponentKind::Image(image) => {
            tree = tree
                .with_metadata("texture", &image.texture_index().to_string())
                .with_metadata("vertices", &image.vertex_count().to_string())
                .with_metadata("blend", &format!("{:?}", image.blend_mode()));
            if image.is_skinned() {
                tree = tree.with_metadata("bones", &image.connected_bone_count().to_string());
            }
        }
        ComponentKind::IkTarget(target) => {
            let constraint = target.constraint();
            let bones: Vec<String> = constraint.influenced().iter().map(ToString::to_string).collect();
            tree = tree
                .with_metadata("bones", &bones.join(", "))
                .with_metadata("strength", &format!("{:.3}", constraint.strength()));
        }
        ComponentKind::Collider(collider) => {
            tree = tree.with_metadata("shape", collider.shape().name());
        }
        ComponentKind::NestedActor(nested) => {
            if let Some(asset) = nested.asset_index() {
                tree = tree.with_metadata("asset", &asset.to_string());
            }
        }
        ComponentKind::CustomProperty(property) => {
            tree = tree.with_metadata(property.value().kind_name(), &property.value().to_string());
        }
        _ => {}
    }
    tree
}
