//! Balancer: turns `P` participants and `R` rooms into a square problem.
//!
//! 1. Capacity cap: if `max_rooms` is set and `R > max_rooms`, the
//!    `P - max_rooms` participants with the numerically highest priority
//!    are removed up front and recorded as kicked.
//! 2. One `Kicked` outcome is appended per remaining participant, so every
//!    participant has a feasible fallback.
//! 3. The shorter side is padded with `Null` entrants or `Filler` outcomes.
//!
//! After balancing `entrants.len() == outcomes.len()`.

use roomballot_types::{Entrant, Outcome, Participant, RoomId};

/// A square assignment problem plus the participants removed before it.
#[derive(Debug, Clone)]
pub struct BalancedProblem {
    pub entrants: Vec<Entrant>,
    pub outcomes: Vec<Outcome>,
    /// Removed by the capacity cap, in their original relative order.
    pub pre_kicked: Vec<Participant>,
}

impl BalancedProblem {
    /// Side length `N` of the square problem.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.entrants.len()
    }

    /// Number of real participants entering the solver.
    #[must_use]
    pub fn real_entrants(&self) -> usize {
        self.entrants.iter().filter(|e| e.is_real()).count()
    }
}

/// Pads and trims a ballot into a [`BalancedProblem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Balancer {
    max_rooms: Option<usize>,
}

impl Balancer {
    #[must_use]
    pub fn new(max_rooms: Option<usize>) -> Self {
        Self { max_rooms }
    }

    #[must_use]
    pub fn max_rooms(&self) -> Option<usize> {
        self.max_rooms
    }

    /// `mask[i]` is `true` if the capacity cap removes participant `i`.
    ///
    /// The removed ones are the tail of a stable ascending sort by priority,
    /// so among equal priorities the later participant goes first.
    #[must_use]
    pub fn removal_mask(&self, participants: &[Participant], room_count: usize) -> Vec<bool> {
        let mut mask = vec![false; participants.len()];
        let excess = match self.max_rooms {
            Some(cap) if room_count > cap => participants.len().saturating_sub(cap),
            _ => 0,
        };
        if excess == 0 {
            return mask;
        }

        let mut order: Vec<usize> = (0..participants.len()).collect();
        order.sort_by_key(|&i| participants[i].priority);
        for &i in &order[participants.len() - excess..] {
            mask[i] = true;
        }
        mask
    }

    /// Split off the participants the capacity cap removes.
    ///
    /// Returns `(kept, removed)`, both in original relative order.
    #[must_use]
    pub fn pre_remove(
        &self,
        participants: Vec<Participant>,
        room_count: usize,
    ) -> (Vec<Participant>, Vec<Participant>) {
        let removed_flags = self.removal_mask(&participants, room_count);
        if !removed_flags.contains(&true) {
            return (participants, Vec::new());
        }
        let excess = removed_flags.iter().filter(|&&gone| gone).count();

        let mut kept = Vec::with_capacity(participants.len() - excess);
        let mut removed = Vec::with_capacity(excess);
        for (p, gone) in participants.into_iter().zip(removed_flags) {
            if gone {
                removed.push(p);
            } else {
                kept.push(p);
            }
        }

        tracing::info!(
            cap = ?self.max_rooms,
            rooms = room_count,
            removed = removed.len(),
            "Capacity cap removed lowest-priority participants"
        );

        (kept, removed)
    }

    /// Build the square problem.
    #[must_use]
    pub fn balance(&self, participants: Vec<Participant>, rooms: Vec<RoomId>) -> BalancedProblem {
        let (kept, pre_kicked) = self.pre_remove(participants, rooms.len());
        let real = kept.len();

        let mut outcomes: Vec<Outcome> = rooms.into_iter().map(Outcome::Room).collect();
        outcomes.resize(outcomes.len() + real, Outcome::Kicked);

        let mut entrants: Vec<Entrant> = kept.into_iter().map(Entrant::Real).collect();
        let n = entrants.len().max(outcomes.len());
        entrants.resize(n, Entrant::Null);
        outcomes.resize(n, Outcome::Filler);

        tracing::debug!(
            real,
            pre_kicked = pre_kicked.len(),
            dimension = n,
            "Balanced assignment problem"
        );

        BalancedProblem {
            entrants,
            outcomes,
            pre_kicked,
        }
    }
}
