//! Force simulation and timestep integrator
//!
//! A [`Simulation`] owns the kinetic state of every node, the registered
//! forces and the annealing parameters. Each tick cools alpha, lets every
//! force add to node velocities, and then integrates positions. Nodes are
//! addressed by a dense index internally and by a caller-provided id from the
//! outside.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{SimulationError, SimulationResult};
use crate::forces::{EdgeId, Force, ForceLike};
use crate::lcg::{DEFAULT_SEED, Lcg};
use crate::vector::Vector;

/// Starting alpha of a fresh simulation
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Alpha below which a simulation is considered settled
pub const DEFAULT_ALPHA_MIN: f64 = 0.001;

/// Fraction of velocity kept after each tick
pub const DEFAULT_VELOCITY_DECAY: f64 = 0.6;

/// Ticks it takes alpha to cool from 1 to `alpha_min` with the default decay
pub const SETTLE_TICKS: f64 = 300.0;

/// Radius scale of the phyllotaxis spiral used for default initial positions
pub const INITIAL_RADIUS: f64 = 10.0;

/// Alpha decay that cools alpha from 1 to `alpha_min` in [`SETTLE_TICKS`] ticks
pub fn default_alpha_decay(alpha_min: f64) -> f64 {
    1.0 - alpha_min.powf(1.0 / SETTLE_TICKS)
}

/// Position, velocity and optional pin of a single node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticState<const D: usize> {
    pub position: Vector<D>,
    pub velocity: Vector<D>,
    /// When set, the node is held at this position on every tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixation: Option<Vector<D>>,
}

impl<const D: usize> KineticState<D> {
    /// A free node at rest
    pub fn at(position: Vector<D>) -> Self {
        Self {
            position,
            velocity: Vector::ZERO,
            fixation: None,
        }
    }

    /// A node pinned at `position`
    pub fn pinned(position: Vector<D>) -> Self {
        Self {
            position,
            velocity: Vector::ZERO,
            fixation: Some(position),
        }
    }

    pub fn with_velocity(mut self, velocity: Vector<D>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.fixation.is_some()
    }
}

/// Kinetic state of all nodes, stored as parallel arrays indexed by node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kinetics<const D: usize> {
    positions: Vec<Vector<D>>,
    velocities: Vec<Vector<D>>,
    fixations: Vec<Option<Vector<D>>>,
}

impl<const D: usize> Kinetics<D> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            fixations: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector<D>] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector<D>] {
        &self.velocities
    }

    pub fn fixations(&self) -> &[Option<Vector<D>>] {
        &self.fixations
    }

    pub fn get(&self, index: usize) -> Option<KineticState<D>> {
        Some(KineticState {
            position: *self.positions.get(index)?,
            velocity: *self.velocities.get(index)?,
            fixation: *self.fixations.get(index)?,
        })
    }

    /// Overwrite the state of node `index`. Returns false if out of range.
    pub fn set(&mut self, index: usize, state: KineticState<D>) -> bool {
        if index >= self.len() {
            return false;
        }
        self.positions[index] = state.position;
        self.velocities[index] = state.velocity;
        self.fixations[index] = state.fixation;
        true
    }

    pub fn push(&mut self, state: KineticState<D>) {
        self.positions.push(state.position);
        self.velocities.push(state.velocity);
        self.fixations.push(state.fixation);
    }

    pub fn iter(&self) -> impl Iterator<Item = KineticState<D>> + '_ {
        self.positions
            .iter()
            .zip(&self.velocities)
            .zip(&self.fixations)
            .map(|((&position, &velocity), &fixation)| KineticState {
                position,
                velocity,
                fixation,
            })
    }

    /// Move every node one step: pinned nodes snap to their fixation, free
    /// nodes lose part of their velocity and then move by it.
    fn integrate(&mut self, velocity_decay: f64) {
        let nodes = self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .zip(&self.fixations);
        for ((position, velocity), fixation) in nodes {
            match fixation {
                Some(fixed) => *position = *fixed,
                None => {
                    *velocity *= velocity_decay;
                    *position += *velocity;
                }
            }
        }
    }
}

impl<const D: usize> FromIterator<KineticState<D>> for Kinetics<D> {
    fn from_iter<I: IntoIterator<Item = KineticState<D>>>(iter: I) -> Self {
        let mut kinetics = Self::default();
        for state in iter {
            kinetics.push(state);
        }
        kinetics
    }
}

/// Default starting position of node `index`: a phyllotaxis spiral, which
/// spreads nodes evenly without any two sharing a position
pub fn phyllotaxis<const D: usize>(index: usize) -> Vector<D> {
    let i = index as f64;
    let mut position = Vector::ZERO;
    match D {
        0 => {}
        1 => position[0] = INITIAL_RADIUS * i,
        2 => {
            let radius = INITIAL_RADIUS * (0.5 + i).sqrt();
            let angle = i * std::f64::consts::PI * (3.0 - 5f64.sqrt());
            position[0] = radius * angle.cos();
            position[1] = radius * angle.sin();
        }
        _ => {
            let radius = INITIAL_RADIUS * (0.5 + i).cbrt();
            let roll = i * std::f64::consts::PI * (3.0 - 5f64.sqrt());
            let yaw = i * std::f64::consts::PI * 20.0 / (9.0 + 221f64.sqrt());
            position[0] = radius * roll.sin() * yaw.cos();
            position[1] = radius * roll.cos();
            position[2] = radius * roll.sin() * yaw.sin();
        }
    }
    position
}

/// Turn edges given by external ids into dense-index links.
///
/// Fails with [`SimulationError::UnknownNode`] on the first endpoint that is
/// not in `ids`.
pub fn resolve_edges<'a, Id>(
    ids: &[Id],
    edges: impl IntoIterator<Item = (&'a Id, &'a Id)>,
) -> SimulationResult<Vec<EdgeId>>
where
    Id: Eq + Hash + fmt::Debug + 'a,
{
    let index: HashMap<&Id, usize> = ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
    resolve_with(&index, edges)
}

fn resolve_with<'a, Id, K>(
    index: &HashMap<K, usize>,
    edges: impl IntoIterator<Item = (&'a Id, &'a Id)>,
) -> SimulationResult<Vec<EdgeId>>
where
    Id: Eq + Hash + fmt::Debug + 'a,
    K: std::borrow::Borrow<Id> + Eq + Hash,
{
    let lookup = |id: &Id| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| SimulationError::UnknownNode(format!("{id:?}")))
    };
    edges
        .into_iter()
        .map(|(source, target)| Ok(EdgeId::new(lookup(source)?, lookup(target)?)))
        .collect()
}

fn index_ids<Id>(ids: &[Id]) -> SimulationResult<HashMap<Id, usize>>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        match index.entry(id.clone()) {
            Entry::Occupied(_) => return Err(SimulationError::DuplicateNode(format!("{id:?}"))),
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
        }
    }
    Ok(index)
}

/// Annealing parameters for a new [`Simulation`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationBuilder {
    alpha: f64,
    alpha_min: f64,
    alpha_decay: Option<f64>,
    alpha_target: f64,
    velocity_decay: f64,
    seed: u32,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_decay: None,
            alpha_target: 0.0,
            velocity_decay: DEFAULT_VELOCITY_DECAY,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn alpha_min(mut self, alpha_min: f64) -> Self {
        self.alpha_min = alpha_min;
        self
    }

    /// Explicit decay; when unset it is derived from `alpha_min`
    pub fn alpha_decay(mut self, alpha_decay: f64) -> Self {
        self.alpha_decay = Some(alpha_decay);
        self
    }

    pub fn alpha_target(mut self, alpha_target: f64) -> Self {
        self.alpha_target = alpha_target;
        self
    }

    pub fn velocity_decay(mut self, velocity_decay: f64) -> Self {
        self.velocity_decay = velocity_decay;
        self
    }

    /// Seed of the jiggle generator
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Build with nodes laid out on a phyllotaxis spiral
    pub fn build<Id, const D: usize>(
        self,
        ids: impl IntoIterator<Item = Id>,
    ) -> SimulationResult<Simulation<Id, D>>
    where
        Id: Clone + Eq + Hash + fmt::Debug,
    {
        self.build_with(ids, |index, _| KineticState::at(phyllotaxis(index)))
    }

    /// Build with each node's starting state produced by `initializer`
    pub fn build_with<Id, const D: usize>(
        self,
        ids: impl IntoIterator<Item = Id>,
        mut initializer: impl FnMut(usize, &Id) -> KineticState<D>,
    ) -> SimulationResult<Simulation<Id, D>>
    where
        Id: Clone + Eq + Hash + fmt::Debug,
    {
        let ids: Vec<Id> = ids.into_iter().collect();
        let index = index_ids(&ids)?;
        let kinetics: Kinetics<D> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| initializer(i, id))
            .collect();

        debug!(nodes = ids.len(), dimensions = D, "built simulation");

        Ok(Simulation {
            ids,
            index,
            kinetics,
            forces: Vec::new(),
            alpha: self.alpha,
            initial_alpha: self.alpha,
            alpha_min: self.alpha_min,
            alpha_decay: self
                .alpha_decay
                .unwrap_or_else(|| default_alpha_decay(self.alpha_min)),
            alpha_target: self.alpha_target,
            velocity_decay: self.velocity_decay,
            rng: Lcg::new(self.seed),
        })
    }
}

/// A force-directed layout of nodes identified by `Id` in `D` dimensions
#[derive(Debug, Clone)]
pub struct Simulation<Id, const D: usize> {
    ids: Vec<Id>,
    index: HashMap<Id, usize>,
    kinetics: Kinetics<D>,
    forces: Vec<Force<D>>,
    alpha: f64,
    initial_alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    velocity_decay: f64,
    rng: Lcg,
}

impl<Id, const D: usize> Simulation<Id, D>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Attach `force` to this simulation's nodes and run it on every tick
    /// after the forces already registered.
    pub fn add_force(&mut self, force: impl Into<Force<D>>) -> SimulationResult<()> {
        let mut force = force.into();
        force.attach(self.len())?;
        debug!(force = force.name(), nodes = self.len(), "registered force");
        self.forces.push(force);
        Ok(())
    }

    pub fn with_force(mut self, force: impl Into<Force<D>>) -> SimulationResult<Self> {
        self.add_force(force)?;
        Ok(self)
    }

    pub fn forces(&self) -> &[Force<D>] {
        &self.forces
    }

    /// Advance the simulation by `count` ticks
    pub fn tick(&mut self, count: usize) {
        for _ in 0..count {
            self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

            for force in &self.forces {
                force.apply(
                    &self.kinetics.positions,
                    &mut self.kinetics.velocities,
                    self.alpha,
                    &mut self.rng,
                );
            }

            self.kinetics.integrate(self.velocity_decay);
            trace!(alpha = self.alpha, "tick");
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    /// Restore alpha to the value the simulation was built with
    pub fn reheat(&mut self) {
        self.alpha = self.initial_alpha;
    }

    /// Whether alpha has cooled below `alpha_min`
    pub fn is_settled(&self) -> bool {
        self.alpha < self.alpha_min
    }

    pub fn alpha_min(&self) -> f64 {
        self.alpha_min
    }

    pub fn alpha_decay(&self) -> f64 {
        self.alpha_decay
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    /// A nonzero target keeps the layout moving indefinitely
    pub fn set_alpha_target(&mut self, alpha_target: f64) {
        self.alpha_target = alpha_target;
    }

    pub fn velocity_decay(&self) -> f64 {
        self.velocity_decay
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// External ids in dense-index order
    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    pub fn index_of(&self, id: &Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn kinetics(&self) -> &Kinetics<D> {
        &self.kinetics
    }

    pub fn positions(&self) -> &[Vector<D>] {
        self.kinetics.positions()
    }

    /// State of the node at dense index `index`
    pub fn state(&self, index: usize) -> Option<KineticState<D>> {
        self.kinetics.get(index)
    }

    /// State of the node with external id `id`, if it exists
    pub fn kinetic_state(&self, id: &Id) -> Option<KineticState<D>> {
        self.kinetics.get(self.index_of(id)?)
    }

    /// Overwrite the state of node `id`. Returns false if the id is unknown.
    pub fn update_kinetic_state(&mut self, id: &Id, state: KineticState<D>) -> bool {
        match self.index_of(id) {
            Some(index) => self.kinetics.set(index, state),
            None => false,
        }
    }

    /// Replace the state of every node with `f(id, state)`
    pub fn update_all_kinetic_states(
        &mut self,
        mut f: impl FnMut(&Id, KineticState<D>) -> KineticState<D>,
    ) {
        for (index, id) in self.ids.iter().enumerate() {
            if let Some(state) = self.kinetics.get(index) {
                self.kinetics.set(index, f(id, state));
            }
        }
    }

    /// Hold node `id` at `position` and clear its velocity
    pub fn pin(&mut self, id: &Id, position: Vector<D>) -> bool {
        self.update_kinetic_state(id, KineticState::pinned(position))
    }

    /// Release a pinned node where it currently is
    pub fn unpin(&mut self, id: &Id) -> bool {
        match self.kinetic_state(id) {
            Some(state) => self.update_kinetic_state(
                id,
                KineticState {
                    fixation: None,
                    ..state
                },
            ),
            None => false,
        }
    }

    /// Resolve external-id edges against this simulation's nodes
    pub fn links<'a>(
        &self,
        edges: impl IntoIterator<Item = (&'a Id, &'a Id)>,
    ) -> SimulationResult<Vec<EdgeId>>
    where
        Id: 'a,
    {
        resolve_with(&self.index, edges)
    }

    /// Replace the node set, its links and the forces.
    ///
    /// `edges` are resolved against the new `ids`, and `make_forces` builds
    /// the new forces from the new ids and the resolved links. Nodes whose id
    /// was already present keep their kinetic state, new ids get theirs from
    /// `initializer`, and ids missing from `ids` are dropped. Alpha restarts
    /// from its initial value; the annealing parameters and the jiggle
    /// generator carry over. On error the simulation is left untouched.
    pub fn revive<'a>(
        &mut self,
        ids: impl IntoIterator<Item = Id>,
        edges: impl IntoIterator<Item = (&'a Id, &'a Id)>,
        make_forces: impl FnOnce(&[Id], &[EdgeId]) -> Vec<Force<D>>,
        mut initializer: impl FnMut(usize, &Id) -> KineticState<D>,
    ) -> SimulationResult<()>
    where
        Id: 'a,
    {
        let ids: Vec<Id> = ids.into_iter().collect();
        let index = index_ids(&ids)?;
        let links = resolve_with(&index, edges)?;

        let mut forces = make_forces(&ids, &links);
        for force in &mut forces {
            force.attach(ids.len())?;
        }

        let mut preserved = 0;
        let kinetics: Kinetics<D> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| match self.kinetic_state(id) {
                Some(state) => {
                    preserved += 1;
                    state
                }
                None => initializer(i, id),
            })
            .collect();

        debug!(
            nodes = ids.len(),
            links = links.len(),
            preserved,
            forces = forces.len(),
            "revived simulation"
        );

        self.ids = ids;
        self.index = index;
        self.kinetics = kinetics;
        self.forces = forces;
        self.reheat();
        Ok(())
    }
}
