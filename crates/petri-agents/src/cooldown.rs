//! Per-cell rule cooldowns.
//!
//! A cooldown names a rule by its index in the owning [`RuleSet`] and counts
//! down once per tick. While it is active the rule is skipped by selection.
//!
//! [`RuleSet`]: crate::engine::RuleSet

/// One rule waiting to become available again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    /// Index of the rule within its rule set.
    pub rule: usize,
    /// Ticks left before the rule is selectable.
    pub remaining: u32,
}

/// The active cooldowns of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cooldowns {
    active: Vec<Cooldown>,
}

impl Cooldowns {
    /// No active cooldowns.
    pub const fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Put `rule` on cooldown for `ticks`. Zero is a no-op; restarting an
    /// active cooldown keeps the longer of the two.
    pub fn start(&mut self, rule: usize, ticks: u32) {
        if ticks == 0 {
            return;
        }
        if let Some(existing) = self.active.iter_mut().find(|c| c.rule == rule) {
            existing.remaining = existing.remaining.max(ticks);
        } else {
            self.active.push(Cooldown {
                rule,
                remaining: ticks,
            });
        }
    }

    /// Whether `rule` is currently cooling down.
    pub fn is_active(&self, rule: usize) -> bool {
        self.active.iter().any(|c| c.rule == rule)
    }

    /// Ticks left on `rule`, if it is cooling down.
    pub fn remaining(&self, rule: usize) -> Option<u32> {
        self.active
            .iter()
            .find(|c| c.rule == rule)
            .map(|c| c.remaining)
    }

    /// Advance every cooldown by one tick and drop the expired ones.
    pub fn tick(&mut self) {
        for cooldown in &mut self.active {
            cooldown.remaining = cooldown.remaining.saturating_sub(1);
        }
        self.active.retain(|c| c.remaining > 0);
    }

    /// Number of active cooldowns.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is cooling down.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ticks_is_ignored() {
        let mut cds = Cooldowns::new();
        cds.start(0, 0);
        assert!(cds.is_empty());
    }

    #[test]
    fn counts_down_and_expires() {
        let mut cds = Cooldowns::new();
        cds.start(2, 2);
        assert!(cds.is_active(2));
        cds.tick();
        assert_eq!(cds.remaining(2), Some(1));
        cds.tick();
        assert!(!cds.is_active(2));
        assert!(cds.is_empty());
    }

    #[test]
    fn restart_keeps_longer() {
        let mut cds = Cooldowns::new();
        cds.start(1, 5);
        cds.start(1, 2);
        assert_eq!(cds.remaining(1), Some(5));
        assert_eq!(cds.len(), 1);
    }

    #[test]
    fn independent_rules() {
        let mut cds = Cooldowns::new();
        cds.start(0, 1);
        cds.start(3, 3);
        cds.tick();
        assert!(!cds.is_active(0));
        assert!(cds.is_active(3));
    }
}
