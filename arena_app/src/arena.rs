//! Headless tower-defense arena driving the collision engine
//!
//! Enemies walk from the right edge toward the player base on the left,
//! towers shoot projectiles at the first enemy inside their range, and every
//! frame the collision pairs are turned into gameplay events.

use collision_engine::prelude::*;
use thiserror::Error;

const BASE_POSITION: (f32, f32) = (0.0, 0.0);
const SPAWN_X: f32 = 400.0;
const ENEMY_SPEED: f32 = 40.0;
const ENEMY_RADIUS: f32 = 6.0;
const PROJECTILE_SPEED: f32 = 220.0;
const PROJECTILE_RADIUS: f32 = 1.5;
const TOWER_RANGE: f32 = 90.0;
const FIRE_INTERVAL: f32 = 0.6;
const SPAWN_INTERVAL: f32 = 1.5;
const ARENA_HALF_HEIGHT: f32 = 120.0;

/// Errors raised while running the arena
#[derive(Error, Debug)]
pub enum ArenaError {
    /// The engine configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A collider was rejected
    #[error("collider rejected: {0}")]
    Register(#[from] RegisterError),
}

/// Identity of everything on the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorId {
    /// The player base
    Base,
    /// A placed tower
    Tower(u16),
    /// A walking enemy
    Enemy(u32),
    /// A fired projectile
    Projectile(u32),
    /// Invisible wall along the top or bottom edge
    Wall(u8),
}

/// A thing with a transform and a velocity
#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    position: Vec2,
    velocity: Vec2,
    heading: f32,
}

impl Actor {
    fn new(id: ActorId, position: Vec2) -> Self {
        Self { id, position, velocity: Vec2::zeros(), heading: 0.0 }
    }
}

impl Collidable for Actor {
    type Handle = ActorId;

    fn handle(&self) -> ActorId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn rotation(&self) -> f32 {
        self.heading
    }
}

/// Running totals reported at the end of the simulation
#[derive(Debug, Default, Clone, Copy)]
pub struct ArenaStats {
    /// Enemies spawned
    pub spawned: u32,
    /// Enemies destroyed by projectiles
    pub destroyed: u32,
    /// Enemies that reached the base
    pub leaked: u32,
    /// Projectiles fired
    pub shots: u32,
}

/// The whole simulation state
pub struct Arena {
    collisions: CollisionManager<ActorId>,
    events: CollisionEvents<ActorId>,
    actors: Vec<Actor>,
    tower_cooldowns: Vec<(ActorId, f32)>,
    spawn_timer: f32,
    next_enemy: u32,
    next_projectile: u32,
    stats: ArenaStats,
}

impl Arena {
    /// Build the arena and place the base, walls and towers
    pub fn new(config: &EngineConfig) -> Result<Self, ArenaError> {
        let collisions = CollisionManager::from_config(config)?;
        let mut arena = Self {
            collisions,
            events: CollisionEvents::new(),
            actors: Vec::new(),
            tower_cooldowns: Vec::new(),
            spawn_timer: 0.0,
            next_enemy: 0,
            next_projectile: 0,
            stats: ArenaStats::default(),
        };

        let base = Actor::new(ActorId::Base, Vec2::new(BASE_POSITION.0, BASE_POSITION.1));
        arena.spawn(base, ColliderShape::rectangle(30.0, 60.0), CollisionGroup::PLAYER)?;

        for (index, y) in [(0_u8, ARENA_HALF_HEIGHT), (1, -ARENA_HALF_HEIGHT)] {
            let wall = Actor::new(ActorId::Wall(index), Vec2::new(SPAWN_X * 0.5, y));
            arena.spawn(wall, ColliderShape::rectangle(SPAWN_X * 1.5, 10.0), CollisionGroup::BOUNDARY)?;
        }

        let tower_spots = [(120.0, 45.0, 0.0), (200.0, -40.0, 0.4), (280.0, 30.0, -0.3)];
        for (index, (x, y, heading)) in (0_u16..).zip(tower_spots) {
            let mut tower = Actor::new(ActorId::Tower(index), Vec2::new(x, y));
            tower.heading = heading;
            arena.spawn(tower, ColliderShape::regular_polygon(6, 10.0), CollisionGroup::TOWER)?;
            arena.tower_cooldowns.push((ActorId::Tower(index), 0.0));
        }

        log::info!("Arena ready with {} colliders", arena.collisions.collider_count());
        Ok(arena)
    }

    fn spawn(&mut self, actor: Actor, shape: ColliderShape, group: CollisionGroup) -> Result<(), ArenaError> {
        self.collisions.register_entity(&actor, shape, group)?;
        self.actors.push(actor);
        Ok(())
    }

    fn despawn(&mut self, id: ActorId) {
        self.collisions.unregister_entity(id);
        self.actors.retain(|actor| actor.id != id);
    }

    fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) -> Result<(), ArenaError> {
        self.spawn_enemies(dt)?;
        self.fire_towers(dt)?;
        self.move_actors(dt);
        self.resolve_collisions();
        Ok(())
    }

    fn spawn_enemies(&mut self, dt: f32) -> Result<(), ArenaError> {
        self.spawn_timer -= dt;
        if self.spawn_timer > 0.0 {
            return Ok(());
        }
        self.spawn_timer = SPAWN_INTERVAL;

        // Lanes cycle so enemies do not stack on one line
        #[allow(clippy::cast_precision_loss)]
        let lane = (self.next_enemy % 5) as f32 - 2.0;
        let mut enemy = Actor::new(ActorId::Enemy(self.next_enemy), Vec2::new(SPAWN_X, lane * 25.0));
        enemy.velocity = Vec2::new(-ENEMY_SPEED, -lane * 4.0);
        self.next_enemy += 1;
        self.stats.spawned += 1;

        log::debug!("Spawned {:?} at {:?}", enemy.id, enemy.position);
        self.spawn(enemy, ColliderShape::circle(ENEMY_RADIUS), CollisionGroup::ENEMY)
    }

    fn fire_towers(&mut self, dt: f32) -> Result<(), ArenaError> {
        let mut shots = Vec::new();

        for (tower_id, cooldown) in &mut self.tower_cooldowns {
            *cooldown -= dt;
            if *cooldown > 0.0 {
                continue;
            }
            let Some(tower) = self.actors.iter().find(|actor| actor.id == *tower_id) else {
                continue;
            };

            let range = AABB::from_center_extents(tower.position, Vec2::new(TOWER_RANGE, TOWER_RANGE));
            let is_enemy = |id: ActorId| matches!(id, ActorId::Enemy(_));
            let Some(target) = self.collisions.query_region(&range, Some(&is_enemy)).into_iter().next() else {
                continue;
            };
            let Some(target_position) = self.actors.iter().find(|a| a.id == target).map(|a| a.position) else {
                continue;
            };

            // Only shoot when nothing but enemies sits in the line of fire
            let direction = target_position - tower.position;
            let blocker = self.collisions.ray_cast_groups(
                tower.position,
                direction,
                TOWER_RANGE * 2.0,
                CollisionGroup::ENEMY | CollisionGroup::TOWER,
                Some(&|id: ActorId| id != *tower_id),
            );
            if blocker.map(|hit| hit.entity) != Some(target) {
                continue;
            }

            *cooldown = FIRE_INTERVAL;
            shots.push((tower.position, direction));
        }

        for (origin, direction) in shots {
            let Some(unit) = direction.try_normalize(f32::EPSILON) else {
                continue;
            };
            let mut projectile = Actor::new(ActorId::Projectile(self.next_projectile), origin);
            projectile.velocity = unit * PROJECTILE_SPEED;
            self.next_projectile += 1;
            self.stats.shots += 1;
            self.spawn(projectile, ColliderShape::circle(PROJECTILE_RADIUS), CollisionGroup::PROJECTILE)?;
        }
        Ok(())
    }

    fn move_actors(&mut self, dt: f32) {
        for actor in &mut self.actors {
            if actor.velocity == Vec2::zeros() {
                continue;
            }
            actor.position += actor.velocity * dt;
            self.collisions.update_entity_position(&*actor);
        }

        // Projectiles that left the field
        let stray: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|a| matches!(a.id, ActorId::Projectile(_)))
            .filter(|a| a.position.x.abs() > SPAWN_X * 1.5 || a.position.y.abs() > ARENA_HALF_HEIGHT * 1.5)
            .map(|a| a.id)
            .collect();
        for id in stray {
            self.despawn(id);
        }
    }

    fn resolve_collisions(&mut self) {
        self.events.update(self.collisions.collision_pairs());

        // Removals wait until every query of this frame has finished
        let mut removed: Vec<ActorId> = Vec::new();
        for pair in self.events.entered() {
            if removed.contains(&pair.first) || removed.contains(&pair.second) {
                continue;
            }
            match (pair.first, pair.second) {
                (ActorId::Enemy(_), ActorId::Projectile(_)) | (ActorId::Projectile(_), ActorId::Enemy(_)) => {
                    log::debug!("{:?} hit {:?}", pair.second, pair.first);
                    removed.extend([pair.first, pair.second]);
                    self.stats.destroyed += 1;
                }
                (ActorId::Base, enemy @ ActorId::Enemy(_)) | (enemy @ ActorId::Enemy(_), ActorId::Base) => {
                    log::warn!("{:?} reached the base", enemy);
                    removed.push(enemy);
                    self.stats.leaked += 1;
                }
                (ActorId::Wall(_), ActorId::Enemy(_)) | (ActorId::Enemy(_), ActorId::Wall(_)) => {
                    self.bounce_off_wall(pair);
                }
                (a, b) => log::trace!("Contact between {:?} and {:?}", a, b),
            }
        }

        for id in removed {
            self.despawn(id);
        }
    }

    fn bounce_off_wall(&mut self, pair: CollisionPair<ActorId>) {
        let Some(contact) = self.collisions.penetration(pair.first, pair.second) else {
            return;
        };
        let (enemy_id, push) = match pair.first {
            ActorId::Enemy(_) => (pair.first, -contact.translation()),
            _ => (pair.second, contact.translation()),
        };
        if let Some(enemy) = self.actors.iter_mut().find(|a| a.id == enemy_id) {
            enemy.position += push;
            enemy.velocity.y = -enemy.velocity.y;
            self.collisions.update_entity_position(&*enemy);
        }
    }

    /// What sits at `point`, if anything
    pub fn pick(&self, point: Vec2) -> Option<ActorId> {
        self.collisions.point_in_any_collider(point, None)
    }

    /// Position of an actor still on the field
    pub fn position_of(&self, id: ActorId) -> Option<Vec2> {
        self.actor(id).map(|actor| actor.position)
    }

    /// Totals so far
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    /// Number of actors on the field
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Debug dump of every collider
    pub fn colliders(&self) -> Vec<(ActorId, ColliderSnapshot)> {
        self.collisions.get_all_colliders()
    }
}
