//! `sample`: play an animation on an instance and report the pose per frame

use anyhow::{Context, Result, bail};
use console::style;
use serde::Serialize;
use std::path::Path;

use nima_actor::{Actor, AnimationEvent, AnimationInstance};

use crate::utils::{add_table_row, create_table, format_degrees, format_seconds, load_actor};

/// Playback settings for [`execute`]
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub animation: String,
    pub time: f32,
    pub steps: usize,
    pub fps: f32,
    pub mix: f32,
    pub json: bool,
}

/// World state of one node after a frame
#[derive(Debug, Clone, Serialize)]
pub struct NodeSample {
    pub index: usize,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub opacity: f32,
}

/// Everything observed on one sampled frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameSample {
    pub time: f32,
    pub nodes: Vec<NodeSample>,
    pub events: Vec<AnimationEvent>,
    pub deformed_images: Vec<usize>,
}

pub fn execute(path: &Path, options: &SampleOptions) -> Result<()> {
    let loaded = load_actor(path)?;
    let frames = sample(&loaded.actor, options)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
        return Ok(());
    }

    for frame in &frames {
        println!(
            "\n{} {}",
            style("Frame at").bold(),
            style(format_seconds(frame.time)).yellow()
        );
        let mut table = create_table(&["#", "Node", "X", "Y", "Rotation", "Opacity"]);
        for node in &frame.nodes {
            add_table_row(
                &mut table,
                vec![
                    node.index.to_string(),
                    node.name.clone(),
                    format!("{:.3}", node.x),
                    format!("{:.3}", node.y),
                    format_degrees(node.rotation),
                    format!("{:.3}", node.opacity),
                ],
            );
        }
        table.printstd();

        for event in &frame.events {
            println!(
                "  {} {} at {} (+{})",
                style("event").magenta(),
                style(&event.name).cyan(),
                format_seconds(event.key_frame_time),
                format_seconds(event.elapsed_time)
            );
        }
    }
    Ok(())
}

/// Play `options.animation` on a fresh instance of `template`.
///
/// The first frame is the pose at the start time; each further frame advances
/// the animation and the actor by `1 / fps` seconds.
pub fn sample(template: &Actor, options: &SampleOptions) -> Result<Vec<FrameSample>> {
    if options.fps.is_nan() || options.fps <= 0.0 {
        bail!("Frames per second must be positive, got {}", options.fps);
    }
    if !(0.0..=1.0).contains(&options.mix) {
        bail!("Mix must be between 0 and 1, got {}", options.mix);
    }

    let mut actor = template.make_instance();
    let mut animation = AnimationInstance::new(&actor, &options.animation).with_context(|| {
        let names: Vec<&str> = actor.animations().iter().map(|a| a.name()).collect();
        format!(
            "No animation named {:?} (available: {})",
            options.animation,
            names.join(", ")
        )
    })?;
    log::info!(
        "Sampling {:?} ({:.3}s) for {} frames",
        options.animation,
        animation.duration(),
        options.steps
    );

    let delta = 1.0 / options.fps;
    let mut frames = Vec::with_capacity(options.steps);
    animation.set_time(&actor, options.time);
    for step in 0..options.steps {
        if step > 0 {
            animation.advance(&actor, delta);
        }
        animation.apply(&mut actor, options.mix);
        actor.advance(if step > 0 { delta } else { 0.0 });

        frames.push(FrameSample {
            time: animation.time(),
            nodes: node_samples(&actor),
            events: animation.take_events(),
            deformed_images: actor.deformed_images().to_vec(),
        });
    }
    Ok(frames)
}

fn node_samples(actor: &Actor) -> Vec<NodeSample> {
    actor
        .nodes()
        .iter()
        .filter_map(|&index| {
            let component = actor.component(index)?;
            let node = component.as_node()?;
            let world = node.world_transform();
            Some(NodeSample {
                index,
                name: component.name().to_string(),
                x: world.translation.x,
                y: world.translation.y,
                rotation: world.matrix2.x_axis.y.atan2(world.matrix2.x_axis.x),
                opacity: node.render_opacity(),
            })
        })
        .collect()
}
