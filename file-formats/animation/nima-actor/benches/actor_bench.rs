use criterion::{Criterion, criterion_group, criterion_main};
use nima_actor::{Actor, AnimationInstance};
use std::hint::black_box;

const BONES: u16 = 32;

fn block(data: &mut Vec<u8>, tag: u8, payload: &[u8]) {
    data.push(tag);
    data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    data.extend_from_slice(payload);
}

fn string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

fn node_fields(data: &mut Vec<u8>, x: f32) {
    for value in [x, 0.0, 0.1, 1.0, 1.0, 1.0] {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data.push(0); // collapsed
}

/// A chain of bones, an IK target pulling its last two links and a looping
/// animation rotating every bone
fn create_test_actor() -> Vec<u8> {
    let mut components = Vec::new();
    components.extend_from_slice(&(BONES + 1).to_le_bytes());
    for i in 0..BONES {
        let mut bone = Vec::new();
        string(&mut bone, &format!("bone_{i}"));
        bone.extend_from_slice(&i.to_le_bytes()); // parent
        node_fields(&mut bone, if i == 0 { 0.0 } else { 10.0 });
        bone.extend_from_slice(&10.0f32.to_le_bytes()); // length
        block(&mut components, 3, &bone);
    }

    let mut target = Vec::new();
    string(&mut target, "target");
    target.extend_from_slice(&0u16.to_le_bytes());
    node_fields(&mut target, 150.0);
    target.extend_from_slice(&0u16.to_le_bytes()); // order
    target.extend_from_slice(&1.0f32.to_le_bytes()); // strength
    target.push(0); // invert
    target.push(2);
    target.extend_from_slice(&(BONES - 1).to_le_bytes());
    target.extend_from_slice(&BONES.to_le_bytes());
    block(&mut components, 11, &target);

    let mut animation = Vec::new();
    string(&mut animation, "sway");
    animation.push(60);
    animation.extend_from_slice(&2.0f32.to_le_bytes());
    animation.push(1); // looping
    animation.extend_from_slice(&BONES.to_le_bytes());
    for i in 1..=BONES {
        animation.extend_from_slice(&i.to_le_bytes());
        animation.extend_from_slice(&1u16.to_le_bytes());
        let mut track = Vec::new();
        track.extend_from_slice(&2u16.to_le_bytes());
        for (time, value) in [(0.0f64, -0.2f32), (2.0, 0.2)] {
            track.extend_from_slice(&time.to_le_bytes());
            track.push(1); // linear
            track.extend_from_slice(&value.to_le_bytes());
        }
        block(&mut animation, 5, &track);
    }
    let mut animations = Vec::new();
    animations.extend_from_slice(&1u16.to_le_bytes());
    block(&mut animations, 7, &animation);

    let mut data = Vec::new();
    data.extend_from_slice(b"NIMA");
    data.extend_from_slice(&18u32.to_le_bytes());
    block(&mut data, 1, &components);
    block(&mut data, 8, &animations);
    data
}

fn actor_benchmark(c: &mut Criterion) {
    let data = create_test_actor();

    c.bench_function("load_actor", |b| {
        b.iter(|| {
            let actor = Actor::load(black_box(&data)).unwrap();
            black_box(actor.component_count());
        })
    });

    let template = Actor::load(&data).unwrap();

    c.bench_function("make_instance", |b| {
        b.iter(|| black_box(template.make_instance()))
    });

    c.bench_function("apply_and_advance", |b| {
        let mut actor = template.make_instance();
        let mut sway = AnimationInstance::new(&actor, "sway").unwrap();
        b.iter(|| {
            sway.advance(&actor, 1.0 / 60.0);
            sway.apply(&mut actor, 1.0);
            actor.advance(black_box(1.0 / 60.0));
        })
    });

    c.bench_function("advance_idle", |b| {
        let mut actor = template.make_instance();
        actor.advance(0.0);
        b.iter(|| actor.advance(black_box(1.0 / 60.0)))
    });
}

criterion_group!(benches, actor_benchmark);
criterion_main!(benches);
