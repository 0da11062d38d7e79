use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Copy, derivative::Derivative)]
#[derivative(Default)]
pub struct GravityConfig {
    /// Newtonian constant at kg/m scale.
    #[derivative(Default(value = "6.674_08e-11"))]
    pub gravity_constant: f64,
    /// World-wide scale factor on every attractor pair force.
    #[derivative(Default(value = "1."))]
    pub gravity_multiplier: f64,
    /// World-unit to meter conversion applied to pair distances and to
    /// scale-derived volumes.
    #[derivative(Default(value = "1."))]
    pub meters_per_unit: f64,
    /// Pairs closer than this are skipped instead of dividing by zero.
    #[derivative(Default(value = "1e-6"))]
    pub min_pair_distance: f64,
    /// Floor for scale-derived volumes in density reconciliation.
    #[derivative(Default(value = "1e-9"))]
    pub min_volume: f64,
}

/// Every live attractor of one simulation world.
///
/// Owned by the world as a resource, so independent simulations never
/// share membership.
#[derive(Resource, Debug, Default)]
pub struct AttractorRegistry {
    entities: Vec<Entity>,
}

impl AttractorRegistry {
    /// Once per active lifetime; re-registering is ignored.
    pub fn register(&mut self, entity: Entity) {
        if self.entities.contains(&entity) {
            return;
        }
        self.entities.push(entity);
    }

    /// Idempotent, absent entries are fine.
    pub fn unregister(&mut self, entity: Entity) {
        self.entities.retain(|&registered| registered != entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    pub fn iter_excluding(&self, excluded: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.iter().filter(move |&entity| entity != excluded)
    }

    /// Membership frozen for the duration of an attraction pass.
    pub(crate) fn snapshot(&self) -> Vec<Entity> {
        self.entities.clone()
    }
}
