use super::config::ProfileId;
use super::error::{FlockError, Result};
use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identity of an agent for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Auxiliary populations captured into per-step snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    Target,
    Predator,
}

/// One simulated boid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub profile: ProfileId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit direction of travel. Authoritative under heading-driven integration.
    pub heading: Vec3,
    /// Presentation only; derived from `heading` every step.
    pub orientation: Quat,
    #[serde(default)]
    pub is_target: bool,
    #[serde(default)]
    pub is_predator: bool,
}

impl Agent {
    pub fn new(id: AgentId, profile: ProfileId, position: Vec3, heading: Vec3) -> Self {
        let heading = heading.try_normalize().unwrap_or(Vec3::Z);
        Agent {
            id,
            profile,
            position,
            velocity: Vec3::ZERO,
            heading,
            orientation: look_rotation(heading, Vec3::Y).unwrap_or(Quat::IDENTITY),
            is_target: false,
            is_predator: false,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn as_target(mut self) -> Self {
        self.is_target = true;
        self
    }

    pub fn as_predator(mut self) -> Self {
        self.is_predator = true;
        self
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        match tag {
            Tag::Target => self.is_target,
            Tag::Predator => self.is_predator,
        }
    }
}

/// Read-only view of one agent handed to the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Store-side index used for write-back.
    pub slot: usize,
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: Vec3,
    pub orientation: Quat,
}

/// New state for one agent produced by the integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentUpdate {
    pub slot: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: Vec3,
    pub orientation: Quat,
}

/// Positions of every agent carrying one tag, captured at step start.
///
/// Entries pushed with `push_point` have no owner, so no agent ever skips
/// them as itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaggedSnapshot {
    ids: Vec<Option<AgentId>>,
    positions: Vec<Vec3>,
}

impl TaggedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut snapshot = Self::default();
        for p in points {
            snapshot.push_point(p);
        }
        snapshot
    }

    pub fn push(&mut self, id: AgentId, position: Vec3) {
        self.ids.push(Some(id));
        self.positions.push(position);
    }

    pub fn push_point(&mut self, position: Vec3) {
        self.ids.push(None);
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn ids(&self) -> &[Option<AgentId>] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Rotation taking +Z to `forward` and +Y as close to `up` as possible.
/// `None` for a zero forward vector.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let forward = forward.try_normalize()?;
    let right = up
        .cross(forward)
        .try_normalize()
        .or_else(|| Vec3::Z.cross(forward).try_normalize())?;
    let up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize())
}

/// Boundary between the flocking core and whatever owns the agents.
pub trait AgentStore {
    /// Agents using `profile`, in an order that stays fixed for the step.
    fn partition(&self, profile: ProfileId) -> Vec<AgentSnapshot>;

    /// Positions of every agent carrying `tag`, regardless of profile.
    fn tagged_positions(&self, tag: Tag) -> TaggedSnapshot;

    /// Apply integrator output. Each slot appears at most once per call.
    fn write_back(&mut self, updates: &[AgentUpdate]);

    fn agent_count(&self) -> usize;
}

/// Dense arena of agents addressed by slot, with id lookup.
#[derive(Clone, Debug, Default)]
pub struct Flock {
    agents: Vec<Agent>,
    slots: HashMap<AgentId, usize>,
    next_id: u64,
}

impl Flock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Flock {
            agents: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Next unused id, for callers building agents before inserting them.
    /// Ids are never reused; once the id space above the highest inserted id
    /// is used up this fails instead of handing out a live id.
    pub fn allocate_id(&mut self) -> Result<AgentId> {
        let raw = u32::try_from(self.next_id).map_err(|_| FlockError::IdsExhausted)?;
        self.next_id += 1;
        Ok(AgentId(raw))
    }

    /// Insert an agent. An agent with the same id is replaced in place.
    pub fn insert(&mut self, agent: Agent) -> AgentId {
        let id = agent.id;
        self.next_id = self.next_id.max(u64::from(id.0) + 1);
        match self.slots.get(&id) {
            Some(&slot) => self.agents[slot] = agent,
            None => {
                self.slots.insert(id, self.agents.len());
                self.agents.push(agent);
            }
        }
        id
    }

    /// Remove an agent, moving the last one into its slot.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let slot = self.slots.remove(&id)?;
        let removed = self.agents.swap_remove(slot);
        if let Some(moved) = self.agents.get(slot) {
            self.slots.insert(moved.id, slot);
        }
        Some(removed)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.slots.get(&id).map(|&slot| &self.agents[slot])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let slot = *self.slots.get(&id)?;
        self.agents.get_mut(slot)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentStore for Flock {
    fn partition(&self, profile: ProfileId) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.profile == profile)
            .map(|(slot, agent)| AgentSnapshot {
                slot,
                id: agent.id,
                position: agent.position,
                velocity: agent.velocity,
                heading: agent.heading,
                orientation: agent.orientation,
            })
            .collect()
    }

    fn tagged_positions(&self, tag: Tag) -> TaggedSnapshot {
        let mut snapshot = TaggedSnapshot::default();
        for agent in self.agents.iter().filter(|a| a.has_tag(tag)) {
            snapshot.push(agent.id, agent.position);
        }
        snapshot
    }

    fn write_back(&mut self, updates: &[AgentUpdate]) {
        for update in updates {
            if let Some(agent) = self.agents.get_mut(update.slot) {
                agent.position = update.position;
                agent.velocity = update.velocity;
                agent.heading = update.heading;
                agent.orientation = update.orientation;
            }
        }
    }

    fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(flock: &mut Flock, profile: usize, x: f32) -> AgentId {
        let id = flock.allocate_id().unwrap();
        flock.insert(Agent::new(id, ProfileId(profile), Vec3::new(x, 0.0, 0.0), Vec3::X))
    }

    #[test]
    fn partition_keeps_insertion_order_and_filters_profile() {
        let mut flock = Flock::new();
        let a = agent(&mut flock, 0, 1.0);
        agent(&mut flock, 1, 2.0);
        let c = agent(&mut flock, 0, 3.0);

        let part = flock.partition(ProfileId(0));
        assert_eq!(part.len(), 2);
        assert_eq!(part[0].id, a);
        assert_eq!(part[1].id, c);
        assert_eq!(part[1].slot, 2);
    }

    #[test]
    fn remove_relinks_moved_agent() {
        let mut flock = Flock::new();
        let a = agent(&mut flock, 0, 1.0);
        let b = agent(&mut flock, 0, 2.0);
        let c = agent(&mut flock, 0, 3.0);

        assert!(flock.remove(a).is_some());
        assert_eq!(flock.len(), 2);
        assert_eq!(flock.get(c).unwrap().position.x, 3.0);
        assert_eq!(flock.get(b).unwrap().position.x, 2.0);
        assert!(flock.get(a).is_none());
    }

    #[test]
    fn tagged_positions_cross_profiles() {
        let mut flock = Flock::new();
        let id = flock.allocate_id().unwrap();
        flock.insert(Agent::new(id, ProfileId(0), Vec3::ONE, Vec3::X).as_predator());
        let id = flock.allocate_id().unwrap();
        flock.insert(Agent::new(id, ProfileId(1), Vec3::NEG_ONE, Vec3::X).as_predator());
        agent(&mut flock, 0, 5.0);

        let predators = flock.tagged_positions(Tag::Predator);
        assert_eq!(predators.len(), 2);
        assert!(flock.tagged_positions(Tag::Target).is_empty());
    }

    #[test]
    fn allocation_skips_past_explicit_ids() {
        let mut flock = Flock::new();
        flock.insert(Agent::new(AgentId(41), ProfileId(0), Vec3::ZERO, Vec3::X));
        assert_eq!(flock.allocate_id().unwrap(), AgentId(42));
    }

    #[test]
    fn allocation_never_hands_out_a_live_id() {
        let mut flock = Flock::new();
        let top = AgentId(u32::MAX);
        flock.insert(Agent::new(top, ProfileId(0), Vec3::ONE, Vec3::X));

        assert!(matches!(flock.allocate_id(), Err(FlockError::IdsExhausted)));
        assert!(matches!(flock.allocate_id(), Err(FlockError::IdsExhausted)));
        assert_eq!(flock.len(), 1);
        assert_eq!(flock.get(top).unwrap().position, Vec3::ONE);
    }

    #[test]
    fn tagged_snapshot_keeps_owners() {
        let mut snapshot = TaggedSnapshot::from_points([Vec3::X]);
        snapshot.push(AgentId(7), Vec3::Y);
        assert_eq!(snapshot.ids(), &[None, Some(AgentId(7))]);
        assert_eq!(snapshot.positions(), &[Vec3::X, Vec3::Y]);
    }

    #[test]
    fn look_rotation_points_forward() {
        for dir in [Vec3::X, Vec3::new(1.0, 2.0, -3.0), Vec3::Y, Vec3::NEG_Y, Vec3::NEG_Z] {
            let q = look_rotation(dir, Vec3::Y).unwrap();
            assert!((q * Vec3::Z - dir.normalize()).length() < 1e-5, "{dir}");
        }
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn new_agent_has_unit_heading_even_from_zero() {
        let agent = Agent::new(AgentId(0), ProfileId(0), Vec3::ZERO, Vec3::ZERO);
        assert_eq!(agent.heading, Vec3::Z);
        let agent = Agent::new(AgentId(1), ProfileId(0), Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));
        assert!((agent.heading.length() - 1.0).abs() < 1e-6);
    }
}
