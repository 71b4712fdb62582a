use crate::content::ConfigDatabase;

use super::{CapabilitySet, CapabilityTag, InputSnapshot, SpatialQuery, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Heading in degrees; 0 faces +z, 90 faces +x.
    pub yaw_degrees: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw_degrees: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub capabilities: CapabilitySet,
    pub active: bool,
    pub debug_name: String,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entity storage shared by the loop and the simulation.
///
/// Spawns and despawns are queued and only become visible after
/// [`SimWorld::apply_pending`], which the loop calls between ticks. Flag and
/// capability edits on live entities apply immediately.
#[derive(Debug, Default)]
pub struct SimWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    def_database: Option<ConfigDatabase>,
}

impl SimWorld {
    pub fn spawn(
        &mut self,
        transform: Transform,
        capabilities: CapabilitySet,
        debug_name: impl Into<String>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            capabilities,
            active: true,
            debug_name: debug_name.into(),
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_despawns.clear();
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn position_of(&self, id: EntityId) -> Option<Vec3> {
        self.find_entity(id).map(|entity| entity.transform.position)
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.find_entity(id).is_some_and(|entity| entity.active)
    }

    /// Returns `true` when the flag changed.
    pub fn set_active(&mut self, id: EntityId, active: bool) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) if entity.active != active => {
                entity.active = active;
                true
            }
            _ => false,
        }
    }

    pub fn add_capability(&mut self, id: EntityId, tag: CapabilityTag) -> bool {
        self.find_entity_mut(id)
            .is_some_and(|entity| entity.capabilities.insert(tag))
    }

    pub fn remove_capability(&mut self, id: EntityId, tag: CapabilityTag) -> bool {
        self.find_entity_mut(id)
            .is_some_and(|entity| entity.capabilities.remove(tag))
    }

    pub fn set_def_database(&mut self, def_database: ConfigDatabase) {
        self.def_database = Some(def_database);
    }

    pub fn def_database(&self) -> Option<&ConfigDatabase> {
        self.def_database.as_ref()
    }
}

impl SpatialQuery for SimWorld {
    fn query_entities_with_capability(
        &self,
        tag: CapabilityTag,
        center: Vec3,
        radius: f32,
    ) -> Vec<EntityId> {
        if !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let mut found: Vec<&Entity> = self
            .entities
            .iter()
            .filter(|entity| entity.active && entity.capabilities.contains(tag))
            .filter(|entity| entity.transform.position.distance_squared(center) <= radius_sq)
            .collect();
        found.sort_by_key(|entity| entity.applied_spawn_order);
        found.into_iter().map(|entity| entity.id).collect()
    }
}

/// Game-side logic driven by the headless loop.
pub trait Simulation {
    fn load(&mut self, _world: &mut SimWorld) {}
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SimWorld,
    ) -> SimCommand;
    fn unload(&mut self, _world: &mut SimWorld) {}
    fn debug_title(&self, _world: &SimWorld) -> Option<String> {
        None
    }
}
