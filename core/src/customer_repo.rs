//! In-memory registry of customer descriptions.

use crate::types::{CustomerId, PowerType};
use serde::{Deserialize, Serialize};

/// What the rest of the market sees of a single simulated customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub id:               CustomerId,
    pub name:             String,
    pub power_type:       PowerType,
    pub population:       u32,
    /// kWh the customer can store.
    pub storage_capacity: f64,
    pub max_charge_kw:    f64,
}

impl CustomerInfo {
    /// A single-vehicle customer. The id is assigned on registration.
    pub fn electric_vehicle(name: impl Into<String>, storage_capacity: f64, max_charge_kw: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            power_type: PowerType::ElectricVehicle,
            population: 1,
            storage_capacity,
            max_charge_kw,
        }
    }
}

#[derive(Debug, Default)]
pub struct CustomerRepo {
    customers: Vec<CustomerInfo>,
    next_id:   CustomerId,
}

impl CustomerRepo {
    pub fn new() -> Self {
        Self {
            customers: Vec::new(),
            next_id:   1,
        }
    }

    /// Register a customer, assigning it the next id. Returns the stored record.
    pub fn add(&mut self, mut info: CustomerInfo) -> CustomerInfo {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        info.id = self.next_id;
        self.next_id += 1;
        self.customers.push(info.clone());
        info
    }

    /// Drop a registration. Returns the removed record, if any.
    pub fn remove(&mut self, id: CustomerId) -> Option<CustomerInfo> {
        let pos = self.customers.iter().position(|c| c.id == id)?;
        Some(self.customers.remove(pos))
    }

    pub fn find_by_id(&self, id: CustomerId) -> Option<&CustomerInfo> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CustomerInfo> {
        self.customers.iter().find(|c| c.name == name)
    }

    pub fn list(&self) -> &[CustomerInfo] {
        &self.customers
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_one() {
        let mut repo = CustomerRepo::default();
        let a = repo.add(CustomerInfo::electric_vehicle("a", 40.0, 7.0));
        let b = repo.add(CustomerInfo::electric_vehicle("b", 24.0, 3.3));
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(repo.find_by_name("b").map(|c| c.id), Some(2));
        assert_eq!(repo.find_by_id(1).map(|c| c.name.as_str()), Some("a"));
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut repo = CustomerRepo::new();
        let a = repo.add(CustomerInfo::electric_vehicle("a", 40.0, 7.0));
        assert_eq!(repo.remove(a.id).map(|c| c.name), Some("a".to_string()));
        assert!(repo.remove(a.id).is_none());
        assert!(repo.is_empty());
        let b = repo.add(CustomerInfo::electric_vehicle("a", 40.0, 7.0));
        assert_eq!(b.id, 2);
    }
}
