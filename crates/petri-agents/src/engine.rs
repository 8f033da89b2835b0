//! Rule engine: turns an ordered rule set into one decision per tick.
//!
//! Selection is a single greedy pass over the rules in priority order. The
//! first rule whose self constraints hold, and which finds a qualifying
//! target when it needs one, wins. There is no backtracking and no scoring
//! across rules; within a rule the nearest qualifying target is chosen and
//! the first one seen wins ties.
//!
//! When nothing is selectable the engine falls back to an unconditional,
//! free sleep and logs a warning. A species whose rule set ends in an
//! unconditional rule never reaches the fallback.

use petri_types::{ActionKind, CellId, Species, Vec2};
use tracing::warn;

use crate::cooldown::Cooldowns;
use crate::rule::{BehaviorRule, TargetSpec};

/// What the engine knows about the cell it is deciding for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Species of the acting cell.
    pub species: Species,
    /// Its position.
    pub position: Vec2,
    /// Its mass.
    pub mass: f64,
    /// Its energy.
    pub energy: f64,
}

/// A visible cell the engine may pick as a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Index of the cell in the arena's live collection.
    pub index: usize,
    /// The cell's id.
    pub id: CellId,
    /// Its species.
    pub species: Species,
    /// Its position.
    pub position: Vec2,
    /// Its mass.
    pub mass: f64,
    /// Its disc overlaps the acting cell's.
    pub touching: bool,
    /// Its centre lies inside the acting cell.
    pub engulfed: bool,
}

impl Candidate {
    /// Attach the hitbox results of the spatial queries.
    #[must_use]
    pub const fn in_contact(mut self, touching: bool, engulfed: bool) -> Self {
        self.touching = touching;
        self.engulfed = engulfed;
        self
    }
}

/// The outcome of rule selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Index of the winning rule, `None` for the fallback.
    pub rule: Option<usize>,
    /// Action to perform.
    pub action: ActionKind,
    /// Chosen target, when the rule needs one.
    pub target: Option<Candidate>,
}

impl Decision {
    /// The free sleep used when nothing else is selectable.
    pub const fn fallback() -> Self {
        Self {
            rule: None,
            action: ActionKind::Sleep,
            target: None,
        }
    }

    /// Whether this is the fallback decision.
    pub const fn is_fallback(&self) -> bool {
        self.rule.is_none()
    }
}

/// A priority-ordered list of behavior rules.
///
/// Order is `(priority, insertion)`: a rule is inserted after every rule of
/// lower or equal priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<BehaviorRule>,
}

impl RuleSet {
    /// An empty rule set.
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Insert `rule` after all rules of the same or lower priority.
    pub fn add(&mut self, rule: BehaviorRule) {
        let at = self
            .rules
            .partition_point(|existing| existing.priority() <= rule.priority());
        self.rules.insert(at, rule);
    }

    /// Rule at position `index` in selection order.
    pub fn get(&self, index: usize) -> Option<&BehaviorRule> {
        self.rules.get(index)
    }

    /// Rules in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &BehaviorRule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Pick the action `me` performs this tick.
    pub fn select(
        &self,
        me: &Observer,
        visible: &[Candidate],
        cooldowns: &Cooldowns,
    ) -> Decision {
        for (index, rule) in self.rules.iter().enumerate() {
            if cooldowns.is_active(index) {
                continue;
            }
            if !rule.self_energy().contains(me.energy) || !rule.self_mass().contains(me.mass) {
                continue;
            }
            if let Some(max) = rule.max_population() {
                let kin = visible.iter().filter(|c| c.species == me.species).count();
                let population = kin.saturating_add(1);
                if population >= usize::try_from(max).unwrap_or(usize::MAX) {
                    continue;
                }
            }

            let Some(spec) = rule.target() else {
                return Decision {
                    rule: Some(index),
                    action: rule.action(),
                    target: None,
                };
            };
            if let Some(target) = nearest_match(me, spec, visible) {
                return Decision {
                    rule: Some(index),
                    action: rule.action(),
                    target: Some(target),
                };
            }
        }

        warn!(
            species = %me.species,
            rules = self.rules.len(),
            "no selectable behavior rule, falling back to sleep"
        );
        Decision::fallback()
    }
}

impl FromIterator<BehaviorRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = BehaviorRule>>(iter: I) -> Self {
        let mut set = Self::new();
        for rule in iter {
            set.add(rule);
        }
        set
    }
}

/// The nearest visible candidate satisfying `spec`.
fn nearest_match(me: &Observer, spec: &TargetSpec, visible: &[Candidate]) -> Option<Candidate> {
    let mut best: Option<(f64, Candidate)> = None;
    for candidate in visible {
        if candidate.species != spec.species || !spec.mass.contains(candidate.mass) {
            continue;
        }
        let distance = me.position.distance(candidate.position);
        if !spec.distance.contains(distance)
            || !spec.relative_mass.contains(me.mass - candidate.mass)
        {
            continue;
        }
        if spec.needs_contact()
            && !(spec.engulfed && candidate.engulfed)
            && !(spec.touching && candidate.touching)
        {
            continue;
        }
        // Strictly nearer replaces, so the first-seen candidate wins ties.
        if best.is_none_or(|(nearest, _)| distance < nearest) {
            best = Some((distance, *candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}
