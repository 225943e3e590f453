use std::{
    f64::consts::TAU,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::{
    components::{Bounds, Name, PhysicsConstants, Position, Velocity},
    config::{LoggingConfig, WorldConfig},
    ecs::{Entity, System, World},
    systems::{BoundsSystem, DragSystem, MovementSystem},
};

fn default_ticks() -> u64 {
    10
}

fn default_spread() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub physics: PhysicsConstants,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bodies: Vec<ScenarioBody>,
    #[serde(default)]
    pub random_bodies: Option<RandomBodies>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioBody {
    pub name: String,
    #[serde(default)]
    pub position: [f64; 2],
    /// Bodies without a velocity stay put
    #[serde(default)]
    pub velocity: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomBodies {
    pub count: usize,
    pub speed: f64,
    /// Half-extent of the square the bodies start in
    #[serde(default = "default_spread")]
    pub spread: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Systems every scenario world runs, in order
    pub fn systems() -> Vec<Box<dyn System>> {
        vec![
            Box::new(MovementSystem::new()),
            Box::new(DragSystem::new()),
            Box::new(BoundsSystem::new()),
        ]
    }

    pub fn build_world(&self) -> Result<World> {
        self.build_world_with(self.world.clone())
    }

    /// Build the world with `config` in place of the scenario's own `world`
    /// section.
    pub fn build_world_with(&self, config: WorldConfig) -> Result<World> {
        let mut world = World::with_config(config).with_systems(Self::systems());

        let name_kind = world.config().storage_for("Name");
        let position_kind = world.config().storage_for("Position");
        let velocity_kind = world.config().storage_for("Velocity");
        world.register_component::<Name>(name_kind);
        world.register_component::<Position>(position_kind);
        world.register_component::<Velocity>(velocity_kind);

        world.add_resource(self.physics);
        if let Some(bounds) = self.bounds {
            world.add_resource(bounds);
        }

        for body in &self.bodies {
            let [x, y] = body.position;
            let entity = world.create_entity((Name::new(&body.name), Position::new(x, y)))?;
            if let Some([vx, vy]) = body.velocity {
                world.add_component(entity, Velocity::new(vx, vy))?;
            }
        }

        if let Some(random) = &self.random_bodies {
            self.spawn_random(&mut world, random)?;
        }

        log::info!(
            "scenario '{}' ready with {} bodies",
            self.name,
            world.entity_count()
        );
        Ok(world)
    }

    fn spawn_random(&self, world: &mut World, random: &RandomBodies) -> Result<Vec<Entity>> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let spread = random.spread.abs();
        let mut spawned = Vec::with_capacity(random.count);
        for i in 0..random.count {
            let position = if spread > 0.0 {
                Position::new(
                    rng.gen_range(-spread..=spread),
                    rng.gen_range(-spread..=spread),
                )
            } else {
                Position::default()
            };
            let heading: f64 = rng.gen_range(0.0..TAU);
            let velocity = Velocity::new(heading.cos() * random.speed, heading.sin() * random.speed);
            let entity =
                world.create_entity((Name::new(format!("body-{i}")), position, velocity))?;
            spawned.push(entity);
        }
        Ok(spawned)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or_else(default_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::StorageKind;

    fn parse(yaml: &str) -> Scenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_minimal_scenario_defaults() {
        let scenario = parse("name: empty\n");
        assert_eq!(scenario.seed, 0);
        assert_eq!(scenario.ticks(None), 10);
        assert_eq!(scenario.ticks(Some(3)), 3);
        assert_eq!(scenario.physics, PhysicsConstants::default());
        assert!(scenario.bounds.is_none());
        assert_eq!(scenario.world, WorldConfig::default());

        let world = scenario.build_world().unwrap();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.system_names(), vec!["movement", "drag", "bounds"]);
    }

    #[test]
    fn test_bodies_and_storage() {
        let scenario = parse(
            r#"
name: pair
world:
  storage:
    Name: sparse
bodies:
  - { name: Max, position: [1, 2], velocity: [1, 1] }
  - { name: Other }
"#,
        );
        let world = scenario.build_world().unwrap();
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.storage_kind::<Name>(), Some(StorageKind::Sparse));
        assert_eq!(world.storage_kind::<Position>(), Some(StorageKind::Dense));
        assert_eq!(world.component_count::<Velocity>(), 1);
    }

    #[test]
    fn test_random_bodies_are_deterministic() {
        let yaml = "name: swarm\nseed: 42\nrandom_bodies: { count: 5, speed: 2.0 }\n";
        let positions = |world: &World| -> Vec<Position> {
            world
                .entities()
                .iter()
                .map(|entity| *world.component::<Position>(entity).unwrap())
                .collect()
        };

        let a = parse(yaml).build_world().unwrap();
        let b = parse(yaml).build_world().unwrap();
        assert_eq!(a.entity_count(), 5);
        assert_eq!(positions(&a), positions(&b));

        for entity in a.entities().iter() {
            let velocity = a.component::<Velocity>(entity).unwrap();
            let speed = (velocity.x * velocity.x + velocity.y * velocity.y).sqrt();
            assert!((speed - 2.0).abs() < 1e-9);
        }
    }
}
