//! Actor file loading
//!
//! A file is the 4-byte magic, a `u32` version and a sequence of top-level
//! blocks. Only the components, animations and nested asset blocks are read;
//! anything else is skipped so files from newer exporters still load.

use std::sync::Arc;

use nima_data::BlockReader;

use crate::actor::Actor;
use crate::animation::Animation;
use crate::block_type::BlockType;
use crate::component::{Component, ComponentKind, NestedActorAsset};
use crate::error::{ActorError, Result};

/// Magic bytes at the start of every actor file
pub const MAGIC: [u8; 4] = *b"NIMA";

/// Oldest file version this runtime reads
pub const MIN_SUPPORTED_VERSION: u32 = 13;

impl Actor {
    /// Parse an actor from the bytes of a `.nima` file.
    ///
    /// Fails on a bad header or when any read runs past its block. Unknown
    /// blocks, component types and property types are skipped.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use nima_actor::Actor;
    ///
    /// let bytes = std::fs::read("character.nima").unwrap();
    /// let mut actor = Actor::load(&bytes).unwrap();
    /// actor.advance(0.0);
    /// ```
    pub fn load(bytes: &[u8]) -> Result<Actor> {
        let mut reader = BlockReader::new(bytes);

        let mut magic = [0u8; 4];
        for byte in &mut magic {
            *byte = reader.read_u8()?;
        }
        if magic != MAGIC {
            return Err(ActorError::InvalidMagic {
                expected: MAGIC,
                actual: magic,
            });
        }

        let version = reader.read_u32()?;
        if version < MIN_SUPPORTED_VERSION {
            return Err(ActorError::UnsupportedVersion {
                version,
                minimum: MIN_SUPPORTED_VERSION,
            });
        }
        log::debug!("Loading actor file version {version}");

        let mut components = vec![Some(Component::root())];
        let mut animations = Vec::new();
        let mut nested_assets = Vec::new();

        while let Some(mut block) = reader.read_next_block()? {
            match BlockType::from_u8(block.block_type()) {
                Some(BlockType::Components) => components = read_components(&mut block)?,
                Some(BlockType::Animations) => {
                    animations = read_animations(&mut block, &mut components)?;
                }
                Some(BlockType::NestedActorAssets) => {
                    nested_assets = read_nested_assets(&mut block)?;
                }
                _ => log::debug!(
                    "Skipping top-level block {} ({} bytes)",
                    block.block_type(),
                    block.len()
                ),
            }
        }

        let max_texture_index = max_texture_index(&components);
        let mut actor = Actor::with_components(version, components);
        actor.animations = Arc::from(animations);
        actor.nested_assets = Arc::from(nested_assets);
        actor.max_texture_index = max_texture_index;
        actor.resolve();

        log::debug!(
            "Loaded actor: {} components, {} nodes, {} animations",
            actor.component_count(),
            actor.nodes().len(),
            actor.animations().len()
        );
        Ok(actor)
    }
}

/// Read the component table; slot 0 is the synthesized root
fn read_components(block: &mut BlockReader<'_>) -> Result<Vec<Option<Component>>> {
    let count = usize::from(block.read_u16()?) + 1;
    let mut components: Vec<Option<Component>> = Vec::with_capacity(count);
    components.push(Some(Component::root()));

    while let Some(mut record) = block.read_next_block()? {
        if components.len() >= count {
            log::warn!("Component table holds more records than its count of {}", count - 1);
            break;
        }
        let component = Component::read(&mut record)?;
        if component.is_none() {
            log::debug!(
                "Unknown component type {} at index {}",
                record.block_type(),
                components.len()
            );
        }
        components.push(component);
    }

    components.resize_with(count, || None);
    Ok(components)
}

fn read_animations(
    block: &mut BlockReader<'_>,
    components: &mut [Option<Component>],
) -> Result<Vec<Arc<Animation>>> {
    let count = usize::from(block.read_u16()?);
    let mut animations = Vec::with_capacity(count);

    while let Some(mut record) = block.read_next_block()? {
        if BlockType::from_u8(record.block_type()) != Some(BlockType::Animation) {
            log::debug!("Skipping block {} in animations", record.block_type());
            continue;
        }
        if animations.len() >= count {
            break;
        }
        animations.push(Arc::new(Animation::read(&mut record, components)?));
    }
    Ok(animations)
}

fn read_nested_assets(block: &mut BlockReader<'_>) -> Result<Vec<NestedActorAsset>> {
    let count = usize::from(block.read_u16()?);
    let mut assets = Vec::with_capacity(count);

    while let Some(mut record) = block.read_next_block()? {
        if BlockType::from_u8(record.block_type()) != Some(BlockType::NestedActorAsset) {
            log::debug!("Skipping block {} in nested assets", record.block_type());
            continue;
        }
        if assets.len() >= count {
            break;
        }
        assets.push(NestedActorAsset::read(&mut record)?);
    }
    Ok(assets)
}

/// Highest atlas index referenced by an image, sequence frame or mesh surface
fn max_texture_index(components: &[Option<Component>]) -> i32 {
    components
        .iter()
        .flatten()
        .filter_map(|component| match &component.kind {
            ComponentKind::Image(image) => {
                let frames = image.sequence().map(|sequence| sequence.frames()).unwrap_or_default();
                frames
                    .iter()
                    .map(|frame| frame.atlas_index)
                    .chain(std::iter::once(image.texture_index))
                    .max()
            }
            ComponentKind::StaticMesh(mesh) => mesh.max_texture_index(),
            _ => None,
        })
        .max()
        .unwrap_or(-1)
}
