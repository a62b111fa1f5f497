//! `animations`: table of an actor's animations

use anyhow::Result;
use console::style;
use std::path::Path;

use nima_actor::{Animation, PropertyType};

use crate::utils::{add_table_row, create_table, format_flag, format_seconds, load_actor};

/// Number of trigger keyframes across the animation's event tracks
pub fn trigger_count(animation: &Animation) -> usize {
    animation
        .trigger_components()
        .flat_map(|component| component.properties())
        .filter(|property| property.property_type() == PropertyType::Trigger)
        .map(|property| property.key_frames().len())
        .sum()
}

pub fn execute(path: &Path) -> Result<()> {
    let loaded = load_actor(path)?;
    let animations = loaded.actor.animations();

    if animations.is_empty() {
        println!("No animations in {}", style(path.display()).cyan());
        return Ok(());
    }

    let mut table = create_table(&["Name", "FPS", "Duration", "Loop", "Keyed", "Tracks", "Events"]);
    for animation in animations {
        let tracks: usize = animation
            .component_animations()
            .iter()
            .map(|component| component.properties().len())
            .sum();
        add_table_row(
            &mut table,
            vec![
                animation.name().to_string(),
                animation.fps().to_string(),
                format_seconds(animation.duration()),
                format_flag(animation.is_looping()).to_string(),
                animation.component_animations().len().to_string(),
                tracks.to_string(),
                trigger_count(animation).to_string(),
            ],
        );
    }
    table.printstd();

    Ok(())
}
