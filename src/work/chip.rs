//! Chip work items
//!
//! A chip carries a processing cost drawn from a fixed set of three tiers.
//! Soldering a chip blocks the calling thread for `cost * unit`.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use tracing::error;

use crate::utils::InvalidCost;

/// Cost tier of a chip; the discriminant is the cost in units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ChipKind {
    Small = 1,
    Medium = 2,
    Big = 3,
}

impl ChipKind {
    /// All kinds, in cost order
    pub const ALL: [ChipKind; 3] = [ChipKind::Small, ChipKind::Medium, ChipKind::Big];

    /// Smallest valid raw cost
    pub const MIN_COST: u32 = 1;

    /// Largest valid raw cost
    pub const MAX_COST: u32 = 3;

    /// Cost in units
    #[inline]
    pub fn cost(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChipKind::Small => "small",
            ChipKind::Medium => "medium",
            ChipKind::Big => "big",
        }
    }
}

impl TryFrom<u32> for ChipKind {
    type Error = InvalidCost;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(ChipKind::Small),
            2 => Ok(ChipKind::Medium),
            3 => Ok(ChipKind::Big),
            other => Err(InvalidCost(other)),
        }
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of work
#[derive(Debug, Clone)]
pub struct Chip {
    kind: ChipKind,
    /// Emission index assigned by the producer
    seq: u64,
    made_at: Instant,
}

impl Chip {
    pub fn new(kind: ChipKind, seq: u64) -> Self {
        Self {
            kind,
            seq,
            made_at: Instant::now(),
        }
    }

    /// Make a chip with a kind drawn uniformly from the cost set.
    ///
    /// A raw draw outside the cost set is an invariant breach and aborts the
    /// process.
    pub fn make(rng: &mut fastrand::Rng, seq: u64) -> Self {
        let raw = rng.u32(ChipKind::MIN_COST..=ChipKind::MAX_COST);
        match ChipKind::try_from(raw) {
            Ok(kind) => Self::new(kind, seq),
            Err(e) => {
                error!("Chip {}: {}", seq, e);
                std::process::abort();
            }
        }
    }

    #[inline]
    pub fn kind(&self) -> ChipKind {
        self.kind
    }

    #[inline]
    pub fn cost(&self) -> u32 {
        self.kind.cost()
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Time since the chip was made
    pub fn age(&self) -> Duration {
        self.made_at.elapsed()
    }

    /// Blocking soldering time for this chip
    pub fn solder_time(&self, unit: Duration) -> Duration {
        unit * self.cost()
    }

    /// Solder the chip, blocking for `cost * unit`
    pub fn solder(&self, unit: Duration) {
        let time = self.solder_time(unit);
        if !time.is_zero() {
            thread::sleep(time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_kind_costs() {
        assert_eq!(ChipKind::Small.cost(), 1);
        assert_eq!(ChipKind::Medium.cost(), 2);
        assert_eq!(ChipKind::Big.cost(), 3);
    }

    #[test]
    fn test_try_from_rejects_out_of_set() {
        assert_eq!(ChipKind::try_from(2), Ok(ChipKind::Medium));
        assert_eq!(ChipKind::try_from(0), Err(InvalidCost(0)));
        assert_eq!(ChipKind::try_from(4), Err(InvalidCost(4)));
    }

    #[test]
    fn test_cost_range_matches_kinds() {
        // Every value Chip::make can draw must name a kind, and vice versa
        let drawn: Vec<ChipKind> = (ChipKind::MIN_COST..=ChipKind::MAX_COST)
            .map(|raw| ChipKind::try_from(raw).unwrap())
            .collect();
        assert_eq!(drawn, ChipKind::ALL.to_vec());

        assert!(ChipKind::try_from(ChipKind::MIN_COST - 1).is_err());
        assert!(ChipKind::try_from(ChipKind::MAX_COST + 1).is_err());

        for kind in ChipKind::ALL {
            assert_eq!(ChipKind::try_from(kind.cost()), Ok(kind));
        }
    }

    #[test]
    fn test_make_covers_all_kinds() {
        let mut rng = fastrand::Rng::with_seed(42);
        let kinds: HashSet<ChipKind> = (0..200).map(|i| Chip::make(&mut rng, i).kind()).collect();
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn test_make_is_deterministic_per_seed() {
        let mut a = fastrand::Rng::with_seed(7);
        let mut b = fastrand::Rng::with_seed(7);
        for i in 0..32 {
            assert_eq!(Chip::make(&mut a, i).kind(), Chip::make(&mut b, i).kind());
        }
    }

    #[test]
    fn test_solder_time_scales_with_cost() {
        let unit = Duration::from_millis(10);
        assert_eq!(Chip::new(ChipKind::Small, 0).solder_time(unit), Duration::from_millis(10));
        assert_eq!(Chip::new(ChipKind::Big, 1).solder_time(unit), Duration::from_millis(30));
    }

    #[test]
    fn test_solder_blocks() {
        let chip = Chip::new(ChipKind::Medium, 0);
        let start = Instant::now();
        chip.solder(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
