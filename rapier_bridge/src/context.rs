use bevy::{prelude::*, utils::HashMap};

use crate::*;
use rapier::{
    dynamics::{
        CCDSolver, ImpulseJointSet, IslandManager, MultibodyJointSet, RigidBody,
        RigidBodyHandle, RigidBodySet,
    },
    geometry::{
        BroadPhaseMultiSap, ColliderHandle, ColliderSet, InteractionGroups, NarrowPhase, Ray,
    },
    parry::query::PointQuery as _,
    pipeline::{PhysicsPipeline, QueryFilter as RapierQFilter, QueryFilterFlags, QueryPipeline},
};

/// Filter for [`RapierContext::cast_ray`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RayFilter {
    /// The entity's collider and rigid body are both skipped.
    pub exclude_entity: Option<Entity>,
    pub exclude_sensors: bool,
    pub groups: Option<InteractionGroups>,
}

impl RayFilter {
    pub fn excluding(entity: Entity) -> Self {
        Self {
            exclude_entity: Some(entity),
            ..default()
        }
    }

    pub fn exclude_sensors(mut self) -> Self {
        self.exclude_sensors = true;
        self
    }

    pub fn groups(mut self, groups: InteractionGroups) -> Self {
        self.groups = Some(groups);
        self
    }
}

#[derive(Resource, Default)]
pub struct RapierContext {
    pub(crate) rigid_body_set: RigidBodySet,
    pub(crate) collider_set: ColliderSet,
    pub(crate) physics_pipeline: PhysicsPipeline,
    pub(crate) island_manager: IslandManager,
    pub(crate) broad_phase: BroadPhaseMultiSap,
    pub(crate) narrow_phase: NarrowPhase,
    pub(crate) impulse_joint_set: ImpulseJointSet,
    pub(crate) multibody_joint_set: MultibodyJointSet,
    pub(crate) ccd_solver: CCDSolver,
    pub(crate) query_pipeline: QueryPipeline,

    /// kept on the side as bevy forgets the components before removal
    /// systems can read them
    pub(crate) entities2colliders: HashMap<Entity, ColliderHandle>,
    pub(crate) colliders2entities: HashMap<ColliderHandle, Entity>,
    pub(crate) entities2rigidbodies: HashMap<Entity, RigidBodyHandle>,

    pub(crate) entities_last_set_transform: HashMap<Entity, Transform64>,
}

impl RapierContext {
    fn body_of(&self, entity: Entity) -> Option<&RigidBody> {
        self.rigid_body_set.get(*self.entities2rigidbodies.get(&entity)?)
    }

    fn body_of_mut(&mut self, entity: Entity) -> Option<&mut RigidBody> {
        self.rigid_body_set
            .get_mut(*self.entities2rigidbodies.get(&entity)?)
    }

    /// See [QueryPipeline::cast_ray]
    pub fn cast_ray(
        &self,
        origin: Vector3,
        direction: Vector3,
        max_toi: Float,
        solid: bool,
        filter: RayFilter,
    ) -> Option<(Entity, Float)> {
        let ray = Ray {
            origin: origin.to_rapier().into(),
            dir: direction.to_rapier(),
        };

        let mut flags = QueryFilterFlags::empty();
        if filter.exclude_sensors {
            flags |= QueryFilterFlags::EXCLUDE_SENSORS;
        }
        let mut rapier_filter = RapierQFilter {
            flags,
            groups: filter.groups,
            ..RapierQFilter::default()
        };
        if let Some(excluded) = filter.exclude_entity {
            rapier_filter.exclude_collider =
                self.entities2colliders.get(&excluded).copied();
            rapier_filter.exclude_rigid_body =
                self.entities2rigidbodies.get(&excluded).copied();
        }

        let (handle, dist) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_toi,
            solid,
            rapier_filter,
        )?;
        let Some(&entity) = self.colliders2entities.get(&handle)
        else {
            log::warn!("Collider has no registered entity");
            return None;
        };

        Some((entity, dist))
    }

    /// Entities whose sensor volumes currently intersect `entity`'s
    /// collider, one item per distinct volume.
    pub fn overlaps_with(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        let handle = self.entities2colliders.get(&entity).copied();

        handle.into_iter().flat_map(move |handle| {
            self.narrow_phase
                .intersection_pairs_with(handle)
                .filter(|&(_, _, intersecting)| intersecting)
                .filter_map(move |(left, right, _)| {
                    let other = if left == handle { right } else { left };
                    self.colliders2entities.get(&other).copied()
                })
        })
    }

    /// Closest point on `entity`'s collider surface to `point`.
    pub fn project_point(&self, entity: Entity, point: Vector3) -> Option<Vector3> {
        let &handle = self.entities2colliders.get(&entity)?;
        let collider = self.collider_set.get(handle)?;

        let projection = collider.shape().project_point(
            collider.position(),
            &point.to_rapier().into(),
            false,
        );
        Some(projection.point.to_bevy())
    }

    pub fn linvel(&self, entity: Entity) -> Option<Vector3> {
        self.body_of(entity).map(|body| body.linvel().to_bevy())
    }

    pub fn set_linvel(&mut self, entity: Entity, linvel: Vector3) {
        let Some(body) = self.body_of_mut(entity)
        else {
            log::warn!("No rigid body registered for {entity:?}");
            return;
        };
        body.set_linvel(linvel.to_rapier(), true);
    }

    pub fn apply_impulse(&mut self, entity: Entity, impulse: Vector3) {
        let Some(body) = self.body_of_mut(entity)
        else {
            log::warn!("No rigid body registered for {entity:?}");
            return;
        };
        body.apply_impulse(impulse.to_rapier(), true);
    }

    pub fn mass(&self, entity: Entity) -> Option<Float> {
        self.body_of(entity).map(|body| body.mass())
    }
}
