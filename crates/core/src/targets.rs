//! Level targets and cumulative elimination counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rng::SimpleRng;
use crate::types::{ItemKind, LevelTarget, SLOTS_PER_CELL};

/// Cumulative items removed per kind this level. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EliminatedCounts(BTreeMap<ItemKind, u32>);

impl EliminatedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ItemKind, n: u32) {
        let entry = self.0.entry(kind).or_insert(0);
        *entry = entry.saturating_add(n);
    }

    pub fn get(&self, kind: ItemKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().fold(0u32, |acc, n| acc.saturating_add(*n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.0.iter().map(|(k, n)| (*k, *n))
    }

    pub fn is_met(&self, target: &LevelTarget) -> bool {
        self.get(target.kind) >= target.required
    }

    /// Every target met.
    pub fn all_met(&self, targets: &[LevelTarget]) -> bool {
        targets.iter().all(|t| self.is_met(t))
    }

    /// Target kinds still short of their required count, in target order.
    pub fn incomplete_kinds(&self, targets: &[LevelTarget]) -> Vec<ItemKind> {
        targets
            .iter()
            .filter(|t| !self.is_met(t))
            .map(|t| t.kind)
            .collect()
    }
}

/// Pick three distinct regular kinds with required counts in
/// `[min_required, max_required]`, rounded up to whole cells.
pub fn choose_targets(
    rng: &mut SimpleRng,
    regular_kinds: u8,
    min_required: u32,
    max_required: u32,
) -> [LevelTarget; 3] {
    let mut pool: Vec<u8> = (0..regular_kinds.max(3)).collect();
    rng.shuffle(&mut pool);

    let lo = min_required.min(max_required);
    let hi = min_required.max(max_required);
    let per_cell = SLOTS_PER_CELL as u32;

    let mut pick = |kind: u8| {
        let raw = lo + rng.next_range(hi - lo + 1);
        let required = raw.div_ceil(per_cell).max(1) * per_cell;
        LevelTarget::new(ItemKind::Regular(kind), required)
    };

    [pick(pool[0]), pick(pool[1]), pick(pool[2])]
}
