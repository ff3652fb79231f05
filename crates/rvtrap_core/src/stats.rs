//! Per-cause trap counters.

use crate::cause::TrapCause;

/// Snapshot of the trap counters.
///
/// One monotonic counter per recognized cause plus one for everything the
/// dispatcher does not recognize. Counters saturate instead of wrapping, so
/// a value never goes down except through [`TrapStatistics::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapStatistics {
    pub machine_software: u32,
    pub machine_timer: u32,
    pub machine_external: u32,
    pub supervisor_software: u32,
    pub supervisor_timer: u32,
    pub supervisor_external: u32,
    pub unhandled: u32,
}

impl TrapStatistics {
    pub const fn new() -> Self {
        Self {
            machine_software: 0,
            machine_timer: 0,
            machine_external: 0,
            supervisor_software: 0,
            supervisor_timer: 0,
            supervisor_external: 0,
            unhandled: 0,
        }
    }

    fn counter_mut(&mut self, cause: TrapCause) -> &mut u32 {
        match cause {
            TrapCause::MachineSoftware => &mut self.machine_software,
            TrapCause::MachineTimer => &mut self.machine_timer,
            TrapCause::MachineExternal => &mut self.machine_external,
            TrapCause::SupervisorSoftware => &mut self.supervisor_software,
            TrapCause::SupervisorTimer => &mut self.supervisor_timer,
            TrapCause::SupervisorExternal => &mut self.supervisor_external,
            TrapCause::Unhandled => &mut self.unhandled,
        }
    }

    pub const fn count(&self, cause: TrapCause) -> u32 {
        match cause {
            TrapCause::MachineSoftware => self.machine_software,
            TrapCause::MachineTimer => self.machine_timer,
            TrapCause::MachineExternal => self.machine_external,
            TrapCause::SupervisorSoftware => self.supervisor_software,
            TrapCause::SupervisorTimer => self.supervisor_timer,
            TrapCause::SupervisorExternal => self.supervisor_external,
            TrapCause::Unhandled => self.unhandled,
        }
    }

    /// Adds one to the counter of `cause`.
    pub(crate) fn record(&mut self, cause: TrapCause) {
        let counter = self.counter_mut(cause);
        *counter = counter.saturating_add(1);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Sum of all seven counters.
    pub fn total(&self) -> u64 {
        TrapCause::ALL
            .into_iter()
            .map(|cause| u64::from(self.count(cause)))
            .sum()
    }

    /// Folds another hart's counters into this one for reporting.
    pub fn merge(&mut self, other: &TrapStatistics) {
        for cause in TrapCause::ALL {
            let counter = self.counter_mut(cause);
            *counter = counter.saturating_add(other.count(cause));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_touches_one_counter() {
        for cause in TrapCause::ALL {
            let mut stats = TrapStatistics::new();
            stats.record(cause);
            for other in TrapCause::ALL {
                let expected = if other == cause { 1 } else { 0 };
                assert_eq!(stats.count(other), expected, "{cause} bumped {other}");
            }
            assert_eq!(stats.total(), 1);
        }
    }

    #[test]
    fn counters_saturate() {
        let mut stats = TrapStatistics {
            machine_timer: u32::MAX,
            ..TrapStatistics::new()
        };
        stats.record(TrapCause::MachineTimer);
        assert_eq!(stats.machine_timer, u32::MAX);
    }

    #[test]
    fn merge_adds_per_cause() {
        let mut a = TrapStatistics::new();
        a.record(TrapCause::MachineSoftware);
        a.record(TrapCause::Unhandled);
        let mut b = TrapStatistics::new();
        b.record(TrapCause::MachineSoftware);
        b.record(TrapCause::SupervisorTimer);

        a.merge(&b);
        assert_eq!(a.machine_software, 2);
        assert_eq!(a.supervisor_timer, 1);
        assert_eq!(a.unhandled, 1);
        assert_eq!(a.total(), 4);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut stats = TrapStatistics::new();
        for cause in TrapCause::ALL {
            stats.record(cause);
        }
        stats.reset();
        assert_eq!(stats, TrapStatistics::default());
    }
}
