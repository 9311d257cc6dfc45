//! Per-unit chain maintenance: missed-slot accounting, head advancement,
//! last-irreversible tracking and the periodic maintenance cycle.

use crate::slots::{scheduled_mediator, shuffle_mediators, slot_at_time};
use crate::ScheduleError;
use ptn_store::{MediatorStore, PropertyStore};
use ptn_types::Unit;
use std::sync::Arc;
use tracing::{debug, info};

/// What happened while accepting one unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitOutcome {
    /// Producer slots skipped before this unit.
    pub missed_slots: u64,
    /// Whether the schedule was reshuffled.
    pub reshuffled: bool,
    /// Whether the maintenance cycle ran. The caller should emit a
    /// `ChainMaintainEvent` so the VSS collaborator starts its round.
    pub maintenance_ran: bool,
}

/// Applies the per-unit consensus bookkeeping against the injected stores.
pub struct ChainMaintainer {
    props: Arc<dyn PropertyStore>,
    mediators: Arc<dyn MediatorStore>,
}

impl ChainMaintainer {
    pub fn new(props: Arc<dyn PropertyStore>, mediators: Arc<dyn MediatorStore>) -> Self {
        Self { props, mediators }
    }

    /// Run the full acceptance pipeline for a newly sealed unit.
    pub fn accept_unit(&self, unit: &Unit) -> Result<UnitOutcome, ScheduleError> {
        let gp = self.props.global_prop()?;
        let mut dgp = self.props.dyn_global_prop()?;
        let mut ms = self.props.mediator_schedule()?;
        if gp.active_mediators.is_empty() {
            return Err(ScheduleError::NoActiveMediators);
        }
        let interval = gp.chain_parameters.mediator_interval;

        // 1. Charge the mediators whose slots went unused.
        let unit_slot = slot_at_time(interval, dgp.head_unit_num, dgp.head_unit_time, unit.timestamp());
        if unit_slot == 0 {
            return Err(ScheduleError::DoubleProducedSlot(unit.number()));
        }
        let missed = unit_slot - 1;
        debug!(missed, unit = unit.number(), "missed slot count");
        if missed < gp.active_count() as u64 {
            for offset in 1..=missed {
                if let Some(addr) = scheduled_mediator(&ms, &dgp, offset) {
                    let mut med = self.mediators.mediator(&addr)?;
                    med.total_missed += 1;
                    self.mediators.save_mediator(&med)?;
                }
            }
        }

        // 2. Advance the dynamic properties to the new head.
        dgp.head_unit_num = unit.number();
        dgp.head_unit_hash = unit.hash();
        dgp.head_unit_time = unit.timestamp();
        dgp.current_absolute_slot += missed + 1;

        // 3. Reshuffle at epoch boundaries.
        let reshuffled = shuffle_mediators(&mut ms, &gp, unit.number(), unit.timestamp());
        if reshuffled {
            self.props.store_mediator_schedule(&ms)?;
        }

        // 4. Record the producer's confirmation.
        if gp.is_active_mediator(&unit.author()) {
            let mut med = self.mediators.mediator(&unit.author())?;
            med.last_confirmed_unit_num = unit.number();
            self.mediators.save_mediator(&med)?;
        }

        // 5. Advance the last-irreversible pointer.
        let mut confirmed: Vec<u64> = Vec::with_capacity(gp.active_count());
        for addr in &gp.active_mediators {
            confirmed.push(self.mediators.mediator(addr)?.last_confirmed_unit_num);
        }
        confirmed.sort_unstable();
        let offset = gp.active_count() - gp.threshold();
        let candidate = confirmed[offset];
        if candidate > dgp.last_irreversible_unit_num {
            dgp.last_irreversible_unit_num = candidate;
        }

        // 6. Maintenance cycle.
        let maintenance_ran = self.perform_maintenance(&mut dgp, unit, &gp)?;

        self.props.store_dyn_global_prop(&dgp)?;
        Ok(UnitOutcome {
            missed_slots: missed,
            reshuffled,
            maintenance_ran,
        })
    }

    fn perform_maintenance(
        &self,
        dgp: &mut ptn_types::DynamicGlobalProperty,
        unit: &Unit,
        gp: &ptn_types::GlobalProperty,
    ) -> Result<bool, ScheduleError> {
        if dgp.next_maintenance_time > unit.timestamp().as_secs() {
            return Ok(false);
        }
        info!(unit = unit.number(), "running chain maintenance");

        // Active mediator refresh. The vote tally lives in the governance
        // collaborator; re-storing the roster keeps the records coherent
        // until it replaces them.
        self.props.store_global_prop(gp)?;

        let interval = gp.chain_parameters.maintenance_interval;
        let next = if unit.number() == 1 {
            (unit.timestamp().as_secs() / interval + 1) * interval
        } else {
            // Smallest k with next + k·interval > head time.
            let head_time = dgp.head_unit_time.as_secs();
            let y = (head_time - dgp.next_maintenance_time) / interval;
            dgp.next_maintenance_time + (y + 1) * interval
        };
        dgp.next_maintenance_time = next;
        Ok(true)
    }
}
