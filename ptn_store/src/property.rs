//! Global property, dynamic property and schedule persistence.

use crate::StoreError;
use parking_lot::RwLock;
use ptn_types::{Address, DynamicGlobalProperty, GlobalProperty, Mediator, MediatorSchedule};
use std::collections::HashMap;

/// Persistence for the chain-wide consensus records.
pub trait PropertyStore: Send + Sync {
    fn global_prop(&self) -> Result<GlobalProperty, StoreError>;
    fn store_global_prop(&self, gp: &GlobalProperty) -> Result<(), StoreError>;

    fn dyn_global_prop(&self) -> Result<DynamicGlobalProperty, StoreError>;
    fn store_dyn_global_prop(&self, dgp: &DynamicGlobalProperty) -> Result<(), StoreError>;

    fn mediator_schedule(&self) -> Result<MediatorSchedule, StoreError>;
    fn store_mediator_schedule(&self, ms: &MediatorSchedule) -> Result<(), StoreError>;
}

/// Persistence for per-mediator production records.
pub trait MediatorStore: Send + Sync {
    fn mediator(&self, addr: &Address) -> Result<Mediator, StoreError>;
    fn save_mediator(&self, med: &Mediator) -> Result<(), StoreError>;
}

/// In-memory property database.
#[derive(Default)]
pub struct MemoryPropertyDb {
    gp: RwLock<Option<GlobalProperty>>,
    dgp: RwLock<Option<DynamicGlobalProperty>>,
    schedule: RwLock<Option<MediatorSchedule>>,
    mediators: RwLock<HashMap<Address, Mediator>>,
}

impl MemoryPropertyDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an initial consensus state.
    pub fn seed(
        &self,
        gp: GlobalProperty,
        dgp: DynamicGlobalProperty,
        schedule: MediatorSchedule,
    ) {
        let mut mediators = HashMap::new();
        for addr in &gp.active_mediators {
            mediators.insert(*addr, Mediator::new(*addr));
        }
        *self.gp.write() = Some(gp);
        *self.dgp.write() = Some(dgp);
        *self.schedule.write() = Some(schedule);
        *self.mediators.write() = mediators;
    }
}

impl PropertyStore for MemoryPropertyDb {
    fn global_prop(&self) -> Result<GlobalProperty, StoreError> {
        self.gp
            .read()
            .clone()
            .ok_or(StoreError::MissingGlobalProperty)
    }

    fn store_global_prop(&self, gp: &GlobalProperty) -> Result<(), StoreError> {
        *self.gp.write() = Some(gp.clone());
        Ok(())
    }

    fn dyn_global_prop(&self) -> Result<DynamicGlobalProperty, StoreError> {
        self.dgp
            .read()
            .clone()
            .ok_or(StoreError::MissingDynamicGlobalProperty)
    }

    fn store_dyn_global_prop(&self, dgp: &DynamicGlobalProperty) -> Result<(), StoreError> {
        *self.dgp.write() = Some(dgp.clone());
        Ok(())
    }

    fn mediator_schedule(&self) -> Result<MediatorSchedule, StoreError> {
        self.schedule
            .read()
            .clone()
            .ok_or(StoreError::MissingMediatorSchedule)
    }

    fn store_mediator_schedule(&self, ms: &MediatorSchedule) -> Result<(), StoreError> {
        *self.schedule.write() = Some(ms.clone());
        Ok(())
    }
}

impl MediatorStore for MemoryPropertyDb {
    fn mediator(&self, addr: &Address) -> Result<Mediator, StoreError> {
        self.mediators
            .read()
            .get(addr)
            .cloned()
            .ok_or_else(|| StoreError::MediatorNotFound(addr.to_string()))
    }

    fn save_mediator(&self, med: &Mediator) -> Result<(), StoreError> {
        self.mediators.write().insert(med.address, med.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptn_types::ChainParameters;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn unseeded_store_reports_missing() {
        let db = MemoryPropertyDb::new();
        assert!(matches!(
            db.global_prop(),
            Err(StoreError::MissingGlobalProperty)
        ));
        assert!(matches!(
            db.dyn_global_prop(),
            Err(StoreError::MissingDynamicGlobalProperty)
        ));
    }

    #[test]
    fn seed_initializes_all_records() {
        let db = MemoryPropertyDb::new();
        let gp = GlobalProperty::new(vec![addr(1), addr(2)], ChainParameters::default());
        db.seed(
            gp.clone(),
            DynamicGlobalProperty::default(),
            MediatorSchedule::default(),
        );

        assert_eq!(db.global_prop().unwrap(), gp);
        assert!(db.mediator(&addr(1)).is_ok());
        assert!(matches!(
            db.mediator(&addr(9)),
            Err(StoreError::MediatorNotFound(_))
        ));
    }

    #[test]
    fn mediator_updates_persist() {
        let db = MemoryPropertyDb::new();
        db.seed(
            GlobalProperty::new(vec![addr(1)], ChainParameters::default()),
            DynamicGlobalProperty::default(),
            MediatorSchedule::default(),
        );

        let mut med = db.mediator(&addr(1)).unwrap();
        med.total_missed += 3;
        db.save_mediator(&med).unwrap();
        assert_eq!(db.mediator(&addr(1)).unwrap().total_missed, 3);
    }
}
