//! Component model
//!
//! Every entity in an actor is a [`Component`] stored in a flat arena and
//! addressed by index. What a component is lives in [`ComponentKind`], a
//! closed enum; behaviour shared across kinds is exposed through the
//! capability traits [`NodeLike`], [`RenderNode`] and [`Solver`].

mod collider;
mod ik;
mod image;
mod nested;
mod node;
mod property;
mod render;

pub use collider::{Collider, ColliderShape};
pub use ik::{ChainLink, IkConstraint, IkTarget};
pub use image::{BoneConnection, Image, ImageGeometry, ImageSequence, SequenceFrame};
pub use nested::{NestedActorAsset, NestedActorNode};
pub use node::{Bone, Node, NodeFlags, Solo};
pub use property::{CustomProperty, CustomValue};
pub use render::{BlendMode, RenderData, StaticMesh, Surface};

pub(crate) use image::invert_or_identity;

use nima_data::BlockReader;

use crate::block_type::BlockType;
use crate::error::Result;

/// Anything that sits in the transform hierarchy
pub trait NodeLike {
    fn node(&self) -> &Node;
    fn node_mut(&mut self) -> &mut Node;
}

/// Nodes that are drawn and sorted by draw order
pub trait RenderNode: NodeLike {
    fn render(&self) -> &RenderData;
    fn render_mut(&mut self) -> &mut RenderData;

    fn draw_order(&self) -> u16 {
        self.render().draw_order
    }
}

/// Constraints run during the actor's solve pass
pub trait Solver: NodeLike {
    /// Position in the actor-wide solve order
    fn order(&self) -> u16;

    /// Inputs changed since the last solve
    fn needs_solve(&self) -> bool {
        self.node().is_solve_dirty()
    }
}

macro_rules! impl_node_like {
    ($($ty:ty),*) => {
        $(
            impl NodeLike for $ty {
                fn node(&self) -> &Node {
                    &self.node
                }

                fn node_mut(&mut self) -> &mut Node {
                    &mut self.node
                }
            }
        )*
    };
}

impl_node_like!(Bone, Solo, IkTarget, Image, StaticMesh, NestedActorNode, Collider);

impl NodeLike for Node {
    fn node(&self) -> &Node {
        self
    }

    fn node_mut(&mut self) -> &mut Node {
        self
    }
}

macro_rules! impl_render_node {
    ($($ty:ty),*) => {
        $(
            impl RenderNode for $ty {
                fn render(&self) -> &RenderData {
                    &self.render
                }

                fn render_mut(&mut self) -> &mut RenderData {
                    &mut self.render
                }
            }
        )*
    };
}

impl_render_node!(Image, StaticMesh, NestedActorNode);

impl Solver for IkTarget {
    fn order(&self) -> u16 {
        self.constraint.order
    }
}

/// What a component is
#[derive(Debug)]
pub enum ComponentKind {
    Node(Node),
    Bone(Bone),
    RootBone(Node),
    Solo(Solo),
    IkTarget(IkTarget),
    Image(Image),
    StaticMesh(StaticMesh),
    NestedActor(NestedActorNode),
    Collider(Collider),
    Event,
    CustomProperty(CustomProperty),
}

impl ComponentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Node(_) => "Node",
            Self::Bone(_) => "Bone",
            Self::RootBone(_) => "RootBone",
            Self::Solo(_) => "Solo",
            Self::IkTarget(_) => "IKTarget",
            Self::Image(image) if image.sequence.is_some() => "ImageSequence",
            Self::Image(_) => "Image",
            Self::StaticMesh(_) => "StaticMesh",
            Self::NestedActor(_) => "NestedActor",
            Self::Collider(_) => "Collider",
            Self::Event => "Event",
            Self::CustomProperty(_) => "CustomProperty",
        }
    }

    pub fn as_node_like(&self) -> Option<&dyn NodeLike> {
        match self {
            Self::Node(node) | Self::RootBone(node) => Some(node),
            Self::Bone(bone) => Some(bone),
            Self::Solo(solo) => Some(solo),
            Self::IkTarget(target) => Some(target),
            Self::Image(image) => Some(image),
            Self::StaticMesh(mesh) => Some(mesh),
            Self::NestedActor(nested) => Some(nested),
            Self::Collider(collider) => Some(collider),
            Self::Event | Self::CustomProperty(_) => None,
        }
    }

    pub fn as_node_like_mut(&mut self) -> Option<&mut dyn NodeLike> {
        match self {
            Self::Node(node) | Self::RootBone(node) => Some(node),
            Self::Bone(bone) => Some(bone),
            Self::Solo(solo) => Some(solo),
            Self::IkTarget(target) => Some(target),
            Self::Image(image) => Some(image),
            Self::StaticMesh(mesh) => Some(mesh),
            Self::NestedActor(nested) => Some(nested),
            Self::Collider(collider) => Some(collider),
            Self::Event | Self::CustomProperty(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        self.as_node_like().map(NodeLike::node)
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        self.as_node_like_mut().map(NodeLike::node_mut)
    }

    pub fn as_render_node(&self) -> Option<&dyn RenderNode> {
        match self {
            Self::Image(image) => Some(image),
            Self::StaticMesh(mesh) => Some(mesh),
            Self::NestedActor(nested) => Some(nested),
            _ => None,
        }
    }

    pub fn as_render_node_mut(&mut self) -> Option<&mut dyn RenderNode> {
        match self {
            Self::Image(image) => Some(image),
            Self::StaticMesh(mesh) => Some(mesh),
            Self::NestedActor(nested) => Some(nested),
            _ => None,
        }
    }

    pub fn as_solver(&self) -> Option<&dyn Solver> {
        match self {
            Self::IkTarget(target) => Some(target),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        self.as_node_like().is_some()
    }

    /// Bones proper; root bones only mark where a chain starts
    pub fn is_bone(&self) -> bool {
        matches!(self, Self::Bone(_))
    }

    pub fn as_bone(&self) -> Option<&Bone> {
        match self {
            Self::Bone(bone) => Some(bone),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_ik_target(&self) -> Option<&IkTarget> {
        match self {
            Self::IkTarget(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_nested_actor(&self) -> Option<&NestedActorNode> {
        match self {
            Self::NestedActor(nested) => Some(nested),
            _ => None,
        }
    }

    pub fn as_custom_property(&self) -> Option<&CustomProperty> {
        match self {
            Self::CustomProperty(property) => Some(property),
            _ => None,
        }
    }

    fn instance_copy(&self) -> Self {
        match self {
            Self::Node(node) => Self::Node(node.instance_copy()),
            Self::Bone(bone) => Self::Bone(bone.instance_copy()),
            Self::RootBone(node) => Self::RootBone(node.instance_copy()),
            Self::Solo(solo) => Self::Solo(solo.instance_copy()),
            Self::IkTarget(target) => Self::IkTarget(target.instance_copy()),
            Self::Image(image) => Self::Image(image.instance_copy()),
            Self::StaticMesh(mesh) => Self::StaticMesh(mesh.instance_copy()),
            Self::NestedActor(nested) => Self::NestedActor(nested.instance_copy()),
            Self::Collider(collider) => Self::Collider(collider.instance_copy()),
            Self::Event => Self::Event,
            Self::CustomProperty(property) => Self::CustomProperty(property.clone()),
        }
    }
}

/// An entry in an actor's component arena
#[derive(Debug)]
pub struct Component {
    pub(crate) name: String,
    pub(crate) parent_index: u16,
    pub(crate) parent: Option<usize>,
    pub(crate) custom_properties: Vec<usize>,
    pub(crate) kind: ComponentKind,
}

impl Component {
    /// The implicit root node at index 0
    pub(crate) fn root() -> Self {
        Self {
            name: "Root".to_string(),
            parent_index: 0,
            parent: None,
            custom_properties: Vec::new(),
            kind: ComponentKind::Node(Node::default()),
        }
    }

    /// Read a component record of the given block type.
    ///
    /// Returns `Ok(None)` for block types that are not components; the
    /// caller keeps the slot empty so later indices stay aligned.
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Option<Self>> {
        let Some(block) = BlockType::from_u8(reader.block_type()) else {
            return Ok(None);
        };
        if !Self::is_component_block(block) {
            return Ok(None);
        }

        let name = reader.read_string()?;
        let parent_index = reader.read_u16()?;

        let kind = match block {
            BlockType::ActorNode => ComponentKind::Node(Node::read(reader)?),
            BlockType::ActorBone => ComponentKind::Bone(Bone::read(reader)?),
            BlockType::ActorRootBone => ComponentKind::RootBone(Node::read(reader)?),
            BlockType::ActorNodeSolo => ComponentKind::Solo(Solo::read(reader)?),
            BlockType::ActorIkTarget => ComponentKind::IkTarget(IkTarget::read(reader)?),
            BlockType::ActorImage => ComponentKind::Image(Image::read(reader)?),
            BlockType::ActorImageSequence => ComponentKind::Image(Image::read_sequence(reader)?),
            BlockType::ActorStaticMesh => ComponentKind::StaticMesh(StaticMesh::read(reader)?),
            BlockType::NestedActorNode => ComponentKind::NestedActor(NestedActorNode::read(reader)?),
            BlockType::ActorEvent => ComponentKind::Event,
            BlockType::CustomIntProperty
            | BlockType::CustomFloatProperty
            | BlockType::CustomStringProperty
            | BlockType::CustomBooleanProperty => match CustomProperty::read(reader, block)? {
                Some(property) => ComponentKind::CustomProperty(property),
                None => return Ok(None),
            },
            BlockType::ColliderRectangle
            | BlockType::ColliderTriangle
            | BlockType::ColliderCircle
            | BlockType::ColliderPolygon
            | BlockType::ColliderLine => match Collider::read(reader, block)? {
                Some(collider) => ComponentKind::Collider(collider),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        Ok(Some(Self {
            name,
            parent_index,
            parent: None,
            custom_properties: Vec::new(),
            kind,
        }))
    }

    fn is_component_block(block: BlockType) -> bool {
        !matches!(
            block,
            BlockType::Components
                | BlockType::View
                | BlockType::Animation
                | BlockType::Animations
                | BlockType::Atlases
                | BlockType::Atlas
                | BlockType::NestedActorAssets
                | BlockType::NestedActorAsset
        )
    }

    /// Copy for a new actor instance; links are cleared for re-resolution
    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            parent_index: self.parent_index,
            parent: None,
            custom_properties: Vec::new(),
            kind: self.kind.instance_copy(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent index as stored in the file
    pub fn parent_index(&self) -> u16 {
        self.parent_index
    }

    /// Resolved parent node, `None` for the root or when the index did not
    /// refer to a node
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Indices of custom property components attached to this component
    pub fn custom_properties(&self) -> &[usize] {
        &self.custom_properties
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn as_node(&self) -> Option<&Node> {
        self.kind.as_node()
    }
}
