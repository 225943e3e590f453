//! Deferred world mutations
//!
//! Systems never change the entity set or table layout while they run. They
//! queue structural changes on their `Commands` handle and the scheduler
//! applies the queue, in order, as soon as the system returns.

use std::cell::RefCell;

use super::component::{Bundle, Component};
use super::entity::EntityRegistry;
use super::error::Result;
use super::registry::short_type_name;
use super::resource::Resource;
use super::world::World;
use super::Entity;

type InsertFn = Box<dyn FnOnce(&mut World, Entity) -> Result<()>>;

pub(crate) enum Command {
    Spawn { entity: Entity, bundle: InsertFn },
    Despawn(Entity),
    Insert {
        entity: Entity,
        component: &'static str,
        insert: InsertFn,
    },
    Remove {
        entity: Entity,
        remove: fn(&mut World, Entity),
    },
    InsertResource(Box<dyn FnOnce(&mut World)>),
    RemoveResource(fn(&mut World)),
}

impl Command {
    fn apply(self, world: &mut World) -> Result<()> {
        match self {
            Command::Spawn { entity, bundle } => {
                world.activate_entity(entity);
                bundle(world, entity)
            }
            Command::Despawn(entity) => {
                world.destroy_entity(entity);
                Ok(())
            }
            Command::Insert {
                entity,
                component,
                insert,
            } => {
                if world.is_alive(entity) {
                    insert(world, entity)
                } else {
                    log::warn!("dropping queued {component} for despawned entity {entity}");
                    Ok(())
                }
            }
            Command::Remove { entity, remove } => {
                remove(world, entity);
                Ok(())
            }
            Command::InsertResource(insert) => {
                insert(world);
                Ok(())
            }
            Command::RemoveResource(remove) => {
                remove(world);
                Ok(())
            }
        }
    }
}

/// Mutation handle handed to systems that declare `Commands`.
pub struct Commands<'w> {
    entities: &'w EntityRegistry,
    queue: RefCell<Vec<Command>>,
}

impl<'w> Commands<'w> {
    pub(crate) fn new(entities: &'w EntityRegistry) -> Self {
        Self {
            entities,
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Queue a new entity. The identifier is allocated now so later commands
    /// in the same system can refer to it.
    pub fn spawn<B: Bundle>(&self, bundle: B) -> Result<Entity> {
        let entity = self.entities.reserve()?;
        self.queue.borrow_mut().push(Command::Spawn {
            entity,
            bundle: Box::new(move |world: &mut World, entity: Entity| {
                bundle.insert_into(world, entity)
            }),
        });
        Ok(entity)
    }

    /// Queue removal of an entity and all of its components.
    pub fn despawn(&self, entity: Entity) {
        self.queue.borrow_mut().push(Command::Despawn(entity));
    }

    pub fn insert<T: Component>(&self, entity: Entity, component: T) {
        self.queue.borrow_mut().push(Command::Insert {
            entity,
            component: short_type_name::<T>(),
            insert: Box::new(move |world: &mut World, entity: Entity| {
                world.add_component(entity, component)
            }),
        });
    }

    pub fn remove<T: Component>(&self, entity: Entity) {
        self.queue.borrow_mut().push(Command::Remove {
            entity,
            remove: |world, entity| {
                world.remove_component::<T>(entity);
            },
        });
    }

    pub fn insert_resource<R: Resource>(&self, resource: R) {
        let insert = move |world: &mut World| {
            world.add_resource(resource);
        };
        self.queue
            .borrow_mut()
            .push(Command::InsertResource(Box::new(insert)));
    }

    pub fn remove_resource<R: Resource>(&self) {
        self.queue.borrow_mut().push(Command::RemoveResource(|world| {
            world.remove_resource::<R>();
        }));
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub(crate) fn into_queue(self) -> CommandQueue {
        CommandQueue {
            queue: self.queue.into_inner(),
        }
    }
}

/// Commands detached from the world borrow, ready to apply.
pub(crate) struct CommandQueue {
    queue: Vec<Command>,
}

impl CommandQueue {
    /// Apply every command in order, stopping at the first failure.
    pub(crate) fn apply(self, world: &mut World) -> Result<usize> {
        let count = self.queue.len();
        for command in self.queue {
            command.apply(world)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Score(u32);
    impl Resource for Score {}

    #[test]
    fn test_queue_applies_in_order() {
        let mut world = World::new();
        let existing = world.create_entity((Health(1),)).unwrap();

        let queue = {
            let commands = Commands::new(world.entities());
            let spawned = commands.spawn((Health(5),)).unwrap();
            commands.insert(existing, Health(2));
            commands.insert_resource(Score(3));
            assert_eq!(commands.len(), 3);
            assert!(!world.is_alive(spawned));
            commands.into_queue()
        };

        assert_eq!(queue.apply(&mut world).unwrap(), 3);
        assert_eq!(world.entity_count(), 2);
        assert_eq!(*world.component::<Health>(existing).unwrap(), Health(2));
        assert_eq!(*world.get_resource::<Score>().unwrap(), Score(3));
    }

    #[test]
    fn test_insert_after_despawn_is_dropped() {
        let mut world = World::new();
        let entity = world.create_entity((Health(1),)).unwrap();

        let queue = {
            let commands = Commands::new(world.entities());
            commands.despawn(entity);
            commands.insert(entity, Health(9));
            commands.into_queue()
        };

        queue.apply(&mut world).unwrap();
        assert!(!world.is_alive(entity));
        assert!(!world.has_component::<Health>(entity));
    }

    #[test]
    fn test_remove_commands() {
        let mut world = World::new();
        let entity = world.create_entity((Health(1),)).unwrap();
        world.add_resource(Score(1));

        let queue = {
            let commands = Commands::new(world.entities());
            commands.remove::<Health>(entity);
            commands.remove_resource::<Score>();
            commands.into_queue()
        };

        queue.apply(&mut world).unwrap();
        assert!(world.is_alive(entity));
        assert!(!world.has_component::<Health>(entity));
        assert!(world.get_resource::<Score>().is_none());
    }
}
