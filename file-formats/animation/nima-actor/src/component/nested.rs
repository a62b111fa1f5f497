//! Actors embedded inside other actors

use std::sync::{Arc, OnceLock};

use nima_data::BlockReader;

use super::node::Node;
use super::render::RenderData;
use crate::actor::Actor;
use crate::error::Result;

/// Entry of an actor's nested asset table.
///
/// The file only records a name and an id; the template actor for the asset
/// is loaded by the caller and attached with [`NestedActorAsset::attach_actor`]
/// before instances are made.
#[derive(Debug, Default)]
pub struct NestedActorAsset {
    name: String,
    id: String,
    actor: OnceLock<Arc<Actor>>,
}

impl NestedActorAsset {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let name = reader.read_string()?;
        let id = reader.read_string()?;
        Ok(Self {
            name,
            id,
            actor: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Template actor used for nested nodes created from now on.
    ///
    /// Returns `false` if an actor was already attached.
    pub fn attach_actor(&self, actor: Arc<Actor>) -> bool {
        self.actor.set(actor).is_ok()
    }

    pub fn actor(&self) -> Option<&Arc<Actor>> {
        self.actor.get()
    }
}

/// Render node that hosts a live instance of a nested asset
#[derive(Debug)]
pub struct NestedActorNode {
    pub(crate) node: Node,
    pub(crate) render: RenderData,
    pub(crate) asset_index: Option<u16>,
    pub(crate) instance: Option<Box<Actor>>,
    pub(crate) transform_nested: bool,
}

impl NestedActorNode {
    pub(crate) fn read(reader: &mut BlockReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let mut nested = Self {
            node,
            render: RenderData::default(),
            asset_index: None,
            instance: None,
            transform_nested: true,
        };
        let is_visible = reader.read_u8()? != 0;
        if is_visible {
            nested.render.draw_order = reader.read_u16()?;
            nested.asset_index = Some(reader.read_u16()?);
        }
        Ok(nested)
    }

    /// Copy without the live instance; the owning actor creates it from the
    /// asset table once the arena is rebuilt.
    pub(crate) fn instance_copy(&self) -> Self {
        Self {
            node: self.node.instance_copy(),
            render: self.render,
            asset_index: self.asset_index,
            instance: None,
            transform_nested: self.transform_nested,
        }
    }

    pub fn asset_index(&self) -> Option<u16> {
        self.asset_index
    }

    pub fn instance(&self) -> Option<&Actor> {
        self.instance.as_deref()
    }

    /// Whether this node's world transform drives the nested root
    pub fn transform_nested(&self) -> bool {
        self.transform_nested
    }
}
