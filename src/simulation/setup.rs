//! Sandbox setup
//!
//! Contains seeded entity spawning for the headless sandbox. Everything here
//! draws from `SandboxRng`, so one seed always produces the same world.

use bevy::prelude::*;
use rand::Rng;

use crate::constants::*;

use super::control::{Drifter, SandboxRng, Scenery, SimControl, WorldRect};

/// Spawn scenery and drifters into a freshly built sandbox world
pub fn sandbox_setup(world: &mut World) {
    let mut spawns: Vec<(Vec3, WorldRect, Option<Drifter>)> = Vec::new();

    {
        let mut rng = world.resource_mut::<SandboxRng>();
        let rng = &mut rng.0;

        for _ in 0..SCENERY_COUNT {
            let x = rng.gen_range(-WORLD_HALF_EXTENT..WORLD_HALF_EXTENT);
            let y = rng.gen_range(-WORLD_HALF_EXTENT..WORLD_HALF_EXTENT);
            let w = rng.gen_range(SCENERY_MIN_SIZE..SCENERY_MAX_SIZE);
            let h = rng.gen_range(SCENERY_MIN_SIZE..SCENERY_MAX_SIZE);
            let color = [
                rng.gen_range(60..=230),
                rng.gen_range(60..=230),
                rng.gen_range(60..=230),
                255,
            ];
            spawns.push((
                Vec3::new(x, y, 0.0),
                WorldRect {
                    size: Vec2::new(w, h),
                    color,
                },
                None,
            ));
        }

        for _ in 0..DRIFTER_COUNT {
            let x = rng.gen_range(-WORLD_HALF_EXTENT * 0.5..WORLD_HALF_EXTENT * 0.5);
            let y = rng.gen_range(-WORLD_HALF_EXTENT * 0.5..WORLD_HALF_EXTENT * 0.5);
            let velocity = Vec2::new(
                rng.gen_range(-DRIFTER_MAX_SPEED..DRIFTER_MAX_SPEED),
                rng.gen_range(-DRIFTER_MAX_SPEED..DRIFTER_MAX_SPEED),
            );
            spawns.push((
                Vec3::new(x, y, 1.0),
                WorldRect {
                    size: DRIFTER_SIZE,
                    color: DRIFTER_COLOR,
                },
                Some(Drifter { velocity }),
            ));
        }
    }

    for (translation, rect, drifter) in spawns {
        let order = world.resource_mut::<SimControl>().next_draw_order();
        let mut entity = world.spawn((Transform::from_translation(translation), rect, order));
        match drifter {
            Some(drifter) => {
                entity.insert(drifter);
            }
            None => {
                entity.insert(Scenery);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::control::DrawOrder;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn world_for_seed(seed: u64) -> World {
        let mut world = World::new();
        world.insert_resource(SandboxRng(StdRng::seed_from_u64(seed)));
        world.insert_resource(SimControl::new(seed, UVec2::new(64, 64)));
        sandbox_setup(&mut world);
        world
    }

    fn positions(world: &mut World) -> Vec<(u32, Vec3)> {
        let mut query = world.query::<(&DrawOrder, &Transform)>();
        let mut out: Vec<_> = query
            .iter(world)
            .map(|(order, t)| (order.0, t.translation))
            .collect();
        out.sort_by_key(|(order, _)| *order);
        out
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = world_for_seed(9);
        let mut b = world_for_seed(9);
        assert_eq!(positions(&mut a), positions(&mut b));
        assert_eq!(positions(&mut a).len(), SCENERY_COUNT + DRIFTER_COUNT);
    }

    #[test]
    fn test_different_seed_different_world() {
        let mut a = world_for_seed(1);
        let mut b = world_for_seed(2);
        assert_ne!(positions(&mut a), positions(&mut b));
    }
}
