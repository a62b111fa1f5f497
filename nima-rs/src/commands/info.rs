//! `info`: summary of an actor file

use anyhow::Result;
use console::style;
use std::collections::BTreeMap;
use std::path::Path;

use nima_actor::Actor;

use crate::utils::{add_table_row, create_table, format_bytes, load_actor};

/// Component counts keyed by type name
pub fn component_counts(actor: &Actor) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for (_, component) in actor.components() {
        *counts.entry(component.type_name()).or_insert(0) += 1;
    }
    counts
}

pub fn execute(path: &Path) -> Result<()> {
    let loaded = load_actor(path)?;
    let actor = &loaded.actor;

    println!("\n{}", style("Actor File Information").bold().underlined());
    println!("File: {}", style(path.display()).cyan());
    println!("Size: {}", style(format_bytes(loaded.file_size)).green());
    println!("Version: {}", style(actor.version()).yellow());
    println!("Components: {}", style(actor.component_count()).green());
    println!("Nodes: {}", style(actor.nodes().len()).green());
    println!("Render Nodes: {}", style(actor.render_nodes().len()).green());
    println!("IK Constraints: {}", style(actor.solvers().len()).green());
    println!("Textures: {}", style(actor.texture_count()).green());

    let counts = component_counts(actor);
    let empty = actor.component_count() - counts.values().sum::<usize>();
    if !counts.is_empty() {
        println!("\n{}", style("Component Summary").bold());
        let mut table = create_table(&["Type", "Count"]);
        for (type_name, count) in &counts {
            add_table_row(&mut table, vec![(*type_name).to_string(), count.to_string()]);
        }
        if empty > 0 {
            add_table_row(&mut table, vec!["(unknown)".to_string(), empty.to_string()]);
        }
        table.printstd();
    }

    if !actor.animations().is_empty() {
        println!("\n{}", style("Animations").bold());
        for animation in actor.animations() {
            println!(
                "  {} ({:.3}s{})",
                style(animation.name()).cyan(),
                animation.duration(),
                if animation.is_looping() { ", looping" } else { "" }
            );
        }
    }

    if !actor.nested_assets().is_empty() {
        println!("\n{}", style("Nested Actor Assets").bold());
        let mut table = create_table(&["Name", "Id"]);
        for asset in actor.nested_assets() {
            add_table_row(&mut table, vec![asset.name().to_string(), asset.id().to_string()]);
        }
        table.printstd();
    }

    Ok(())
}
