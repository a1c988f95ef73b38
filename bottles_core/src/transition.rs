use crate::classifier::Classification;
use crate::config::AmbiguityPolicy;
use crate::state::OccupancyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChangeEvent {
    pub from: OccupancyState,
    pub to: OccupancyState,
    pub distance: i64,
    pub matches: usize,
}

impl StateChangeEvent {
    pub const fn is_low_confidence(&self) -> bool {
        self.matches > 1
    }
}

pub type Listener = Box<dyn FnMut(&StateChangeEvent)>;

/// Holds the committed state and turns classifications into change events.
pub struct TransitionController {
    committed: OccupancyState,
    policy: AmbiguityPolicy,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionController")
            .field("committed", &self.committed)
            .field("policy", &self.policy)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TransitionController {
    pub fn new(initial: OccupancyState, policy: AmbiguityPolicy) -> Self {
        Self {
            committed: initial,
            policy,
            listeners: Vec::new(),
        }
    }

    /// Listeners run synchronously, in registration order, before `on_tick` returns.
    pub fn add_listener(&mut self, listener: impl FnMut(&StateChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub const fn committed(&self) -> OccupancyState {
        self.committed
    }

    pub const fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    fn accepts(&self, c: &Classification) -> bool {
        match c.matches {
            0 => false,
            1 => true,
            _ => self.policy == AmbiguityPolicy::AcceptClosest,
        }
    }

    pub fn on_tick(&mut self, c: &Classification) -> Option<StateChangeEvent> {
        if !self.accepts(c) || c.best == self.committed {
            return None;
        }
        let event = StateChangeEvent {
            from: self.committed,
            to: c.best,
            distance: c.distance,
            matches: c.matches,
        };
        self.committed = c.best;
        for listener in &mut self.listeners {
            listener(&event);
        }
        Some(event)
    }

    /// Commit `state` without emitting an event or notifying listeners.
    pub fn force(&mut self, state: OccupancyState) {
        self.committed = state;
    }
}
