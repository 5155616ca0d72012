//! Pickup systems - coin spawning and collection, task marker placement and reveal.

use std::collections::HashSet;

use hecs::{Entity, World};
use penny_logic::avatar::{COIN_PICKUP_RADIUS, COIN_VALUES, TASK_PICKUP_RADIUS};
use penny_logic::money::Cents;
use penny_logic::tasks::TaskRegistry;
use penny_logic::world::WorldConfig;
use rand::Rng;

use crate::components::{Avatar, Coin, Position, TaskPickup};

/// Coins collected during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinHaul {
    pub count: usize,
    pub earned_cents: Cents,
}

fn roll_coin(rng: &mut impl Rng, world: &WorldConfig) -> (Position, Coin) {
    let value_cents = COIN_VALUES[rng.gen_range(0..COIN_VALUES.len())];
    (
        Position::new(rng.gen_range(0.0..world.width), rng.gen_range(0.0..world.height)),
        Coin { value_cents },
    )
}

/// Scatter `count` coins uniformly over the world.
pub fn spawn_coins(world: &mut World, config: &WorldConfig, count: usize, rng: &mut impl Rng) {
    for _ in 0..count {
        world.spawn(roll_coin(rng, config));
    }
}

/// Collect every coin the avatar overlaps. Each collected coin is replaced
/// by a fresh one at a random spot with a re-rolled value, so the coin
/// count never changes.
pub fn collect_coins(
    world: &mut World,
    avatar: &Avatar,
    config: &WorldConfig,
    rng: &mut impl Rng,
) -> CoinHaul {
    let reach = avatar.radius + COIN_PICKUP_RADIUS;
    let collected: Vec<(Entity, Cents)> = world
        .query::<(&Position, &Coin)>()
        .iter()
        .filter(|(_, (pos, _))| pos.point.distance(&avatar.position) < reach)
        .map(|(entity, (_, coin))| (entity, coin.value_cents))
        .collect();

    let mut haul = CoinHaul::default();
    for (entity, value) in collected {
        if world.despawn(entity).is_ok() {
            haul.count += 1;
            haul.earned_cents += value;
            world.spawn(roll_coin(rng, config));
        }
    }
    haul
}

/// Make the world's task markers match the registry: every open task that
/// has not been revealed yet gets one marker inside the pickup margin, and
/// markers for tasks that are gone or no longer open are removed.
/// Returns how many markers were spawned.
pub fn sync_task_pickups(
    world: &mut World,
    tasks: &TaskRegistry,
    revealed: &HashSet<String>,
    config: &WorldConfig,
    rng: &mut impl Rng,
) -> usize {
    let mut present = HashSet::new();
    let mut stale = Vec::new();
    for (entity, pickup) in world.query::<&TaskPickup>().iter() {
        let live = tasks.get(&pickup.task_id).is_some_and(|t| t.is_open());
        if live && present.insert(pickup.task_id.clone()) {
            continue;
        }
        stale.push(entity);
    }
    for entity in stale {
        let _ = world.despawn(entity);
    }

    let margin = config.pickup_margin;
    let mut spawned = 0;
    for task in tasks.open_tasks() {
        if present.contains(&task.id) || revealed.contains(&task.id) {
            continue;
        }
        let x = rng.gen_range(margin..(config.width - margin));
        let y = rng.gen_range(margin..(config.height - margin));
        world.spawn((
            Position::new(x, y),
            TaskPickup {
                task_id: task.id.clone(),
                category: task.category,
            },
        ));
        spawned += 1;
    }
    spawned
}

/// Reveal the nearest task marker the avatar touches, removing it from the
/// world. At most one task is revealed per frame.
pub fn reveal_task_pickup(world: &mut World, avatar: &Avatar) -> Option<String> {
    let reach = avatar.radius + TASK_PICKUP_RADIUS;
    let hit = world
        .query::<(&Position, &TaskPickup)>()
        .iter()
        .map(|(entity, (pos, pickup))| {
            (entity, pos.point.distance(&avatar.position), pickup.task_id.clone())
        })
        .filter(|(_, dist, _)| *dist < reach)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let (entity, _, task_id) = hit?;
    world.despawn(entity).ok()?;
    Some(task_id)
}

pub fn coin_count(world: &World) -> usize {
    world.query::<&Coin>().iter().count()
}

pub fn task_pickup_count(world: &World) -> usize {
    world.query::<&TaskPickup>().iter().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Vec2;
    use penny_logic::tasks::{Task, TaskCategory, TaskStatus};
    use penny_logic::time::Window;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn avatar_at(x: f32, y: f32) -> Avatar {
        Avatar {
            position: Vec2::new(x, y),
            ..Avatar::default()
        }
    }

    fn registry_with(ids: &[&str]) -> TaskRegistry {
        let mut reg = TaskRegistry::default();
        let tasks = ids
            .iter()
            .map(|id| Task {
                id: id.to_string(),
                title: id.to_string(),
                category: TaskCategory::Food,
                cost_cents: 500,
                created_at: 0,
                due_at: 10_000,
                status: TaskStatus::Open,
                prompt: String::new(),
                hint: String::new(),
            })
            .collect();
        reg.upsert_tasks(tasks, Window::new(0, 100_000));
        reg
    }

    #[test]
    fn test_collect_coins_respawns_and_keeps_count() {
        let mut world = World::new();
        let config = WorldConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        world.spawn((Position::new(100.0, 100.0), Coin { value_cents: 50 }));
        world.spawn((Position::new(110.0, 100.0), Coin { value_cents: 200 }));
        world.spawn((Position::new(900.0, 900.0), Coin { value_cents: 25 }));

        let haul = collect_coins(&mut world, &avatar_at(100.0, 100.0), &config, &mut rng);
        assert_eq!(haul, CoinHaul { count: 2, earned_cents: 250 });
        assert_eq!(coin_count(&world), 3);
        for (_, coin) in world.query::<&Coin>().iter() {
            assert!(COIN_VALUES.contains(&coin.value_cents));
        }
    }

    #[test]
    fn test_coin_just_out_of_reach() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(2);
        let avatar = avatar_at(0.0, 0.0);
        let reach = avatar.radius + COIN_PICKUP_RADIUS;
        world.spawn((Position::new(reach, 0.0), Coin { value_cents: 25 }));
        let haul = collect_coins(&mut world, &avatar, &WorldConfig::default(), &mut rng);
        assert_eq!(haul.count, 0);
    }

    #[test]
    fn test_spawned_coins_inside_world() {
        let mut world = World::new();
        let config = WorldConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        spawn_coins(&mut world, &config, 50, &mut rng);
        assert_eq!(coin_count(&world), 50);
        for (_, pos) in world.query::<&Position>().iter() {
            assert!(pos.point.x >= 0.0 && pos.point.x < config.width);
            assert!(pos.point.y >= 0.0 && pos.point.y < config.height);
        }
    }

    #[test]
    fn test_sync_spawns_once_per_open_task_inside_margin() {
        let mut world = World::new();
        let config = WorldConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let reg = registry_with(&["a", "b"]);
        let revealed = HashSet::new();

        assert_eq!(sync_task_pickups(&mut world, &reg, &revealed, &config, &mut rng), 2);
        assert_eq!(sync_task_pickups(&mut world, &reg, &revealed, &config, &mut rng), 0);
        assert_eq!(task_pickup_count(&world), 2);
        for (_, pos) in world.query::<&Position>().iter() {
            assert!(pos.point.x >= config.pickup_margin);
            assert!(pos.point.x <= config.width - config.pickup_margin);
        }
    }

    #[test]
    fn test_sync_removes_markers_for_closed_tasks() {
        let mut world = World::new();
        let config = WorldConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut reg = registry_with(&["a", "b"]);
        let revealed = HashSet::new();
        sync_task_pickups(&mut world, &reg, &revealed, &config, &mut rng);

        reg.mark_task("a", TaskStatus::Paid);
        sync_task_pickups(&mut world, &reg, &revealed, &config, &mut rng);
        assert_eq!(task_pickup_count(&world), 1);
    }

    #[test]
    fn test_reveal_is_one_time() {
        let mut world = World::new();
        let config = WorldConfig::default();
        let mut rng = StdRng::seed_from_u64(6);
        let reg = registry_with(&["a"]);
        let mut revealed = HashSet::new();
        world.spawn((
            Position::new(500.0, 500.0),
            TaskPickup {
                task_id: "a".into(),
                category: TaskCategory::Food,
            },
        ));

        let avatar = avatar_at(510.0, 500.0);
        let hit = reveal_task_pickup(&mut world, &avatar);
        assert_eq!(hit.as_deref(), Some("a"));
        revealed.insert("a".to_string());
        assert_eq!(reveal_task_pickup(&mut world, &avatar), None);

        // Revealed tasks do not get a new marker even while still open
        assert_eq!(sync_task_pickups(&mut world, &reg, &revealed, &config, &mut rng), 0);
    }
}
