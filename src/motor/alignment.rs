//! Gantry alignment planning.
//!
//! During alignment homing each driver of a gated axis travels toward its
//! own endstop. Drivers stop one by one as they arrive, which squares the
//! gantry. A plan turns the remaining travel of every driver into a short
//! list of moves, each with the drivers already parked locked out.

use heapless::Vec;

use crate::config::MAX_DRIVERS_PER_AXIS;
use crate::error::{DriverError, Error, Result};

/// One move of an alignment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentStage {
    /// Steps every unlocked driver travels in this stage.
    pub travel: u32,
    /// Drivers that already reached their endstop (bit per driver index).
    pub lock_mask: u8,
}

/// Ordered alignment moves for one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentPlan {
    order: Vec<u8, MAX_DRIVERS_PER_AXIS>,
    stages: Vec<AlignmentStage, MAX_DRIVERS_PER_AXIS>,
}

impl AlignmentPlan {
    /// Plan from the remaining travel of each driver to its endstop.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidAlignment`] unless 1 to 4 distances are given.
    pub fn new(distances: &[u32]) -> Result<Self> {
        let count = distances.len();
        if count == 0 || count > MAX_DRIVERS_PER_AXIS {
            return Err(Error::Driver(DriverError::InvalidAlignment(count)));
        }

        // Insertion sort of at most four entries, stable for equal travel
        let mut order = [0u8; MAX_DRIVERS_PER_AXIS];
        for i in 0..count {
            order[i] = i as u8;
            let mut j = i;
            while j > 0 && distances[order[j - 1] as usize] > distances[order[j] as usize] {
                order.swap(j - 1, j);
                j -= 1;
            }
        }

        let mut stages = Vec::new();
        let mut travelled = 0;
        let mut lock_mask = 0u8;
        for &driver in &order[..count] {
            let distance = distances[driver as usize];
            if distance > travelled {
                let _ = stages.push(AlignmentStage {
                    travel: distance - travelled,
                    lock_mask,
                });
                travelled = distance;
            }
            lock_mask |= 1 << driver;
        }

        Ok(Self {
            order: order[..count].iter().copied().collect(),
            stages,
        })
    }

    /// Driver indices in the order they reach their endstops.
    #[inline]
    pub fn trigger_order(&self) -> &[u8] {
        &self.order
    }

    /// Moves to execute, in order.
    #[inline]
    pub fn stages(&self) -> &[AlignmentStage] {
        &self.stages
    }

    /// Total travel of driver `index` over the plan.
    pub fn travel_of(&self, index: usize) -> u32 {
        self.stages
            .iter()
            .filter(|stage| stage.lock_mask & (1 << index) == 0)
            .map(|stage| stage.travel)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_drivers() {
        let plan = AlignmentPlan::new(&[120, 40, 80]).unwrap();
        assert_eq!(plan.trigger_order(), &[1, 2, 0]);
        assert_eq!(
            plan.stages(),
            &[
                AlignmentStage { travel: 40, lock_mask: 0b000 },
                AlignmentStage { travel: 40, lock_mask: 0b010 },
                AlignmentStage { travel: 40, lock_mask: 0b110 },
            ]
        );
        assert_eq!(plan.travel_of(0), 120);
        assert_eq!(plan.travel_of(1), 40);
        assert_eq!(plan.travel_of(2), 80);
    }

    #[test]
    fn test_equal_distances_share_a_stage() {
        let plan = AlignmentPlan::new(&[50, 50, 0, 70]).unwrap();
        assert_eq!(plan.trigger_order(), &[2, 0, 1, 3]);
        assert_eq!(
            plan.stages(),
            &[
                AlignmentStage { travel: 50, lock_mask: 0b0100 },
                AlignmentStage { travel: 20, lock_mask: 0b0111 },
            ]
        );
        for (i, &d) in [50, 50, 0, 70].iter().enumerate() {
            assert_eq!(plan.travel_of(i), d);
        }
    }

    #[test]
    fn test_driver_count_bounds() {
        assert!(AlignmentPlan::new(&[]).is_err());
        assert!(AlignmentPlan::new(&[1, 2, 3, 4, 5]).is_err());
        assert!(AlignmentPlan::new(&[0]).unwrap().stages().is_empty());
    }
}
