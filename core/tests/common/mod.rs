//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use evcustomer_core::{
    beans::EvBeans,
    config::{ConfigLayer, ConfigStore},
    rng::{SeedSource, SimRng},
    services::ServiceAccessor,
};

pub const TEST_PROPERTIES: &str = include_str!("../fixtures/test-properties.json");

/// A random stream that always draws zero.
pub struct ZeroRng;

impl SimRng for ZeroRng {
    fn next_f64(&mut self) -> f64 {
        0.0
    }

    fn next_u64_below(&mut self, _n: u64) -> u64 {
        0
    }
}

/// Seed source handing out ZeroRng streams for every request.
pub struct ZeroSeeds;

impl SeedSource for ZeroSeeds {
    fn random_seed(&mut self, _requester: &str, _id: u64, _purpose: &str) -> Box<dyn SimRng> {
        Box::new(ZeroRng)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_layer() -> ConfigLayer {
    ConfigLayer::from_json_str("test-properties.json", TEST_PROPERTIES).expect("fixture parses")
}

pub fn test_config() -> ConfigStore {
    init_logging();
    let mut store = ConfigStore::new();
    store.add_layer(test_layer());
    store
}

pub fn test_beans() -> EvBeans {
    EvBeans::load(&test_config()).expect("beans load")
}

pub fn zero_services() -> ServiceAccessor {
    ServiceAccessor::new(Box::new(ZeroSeeds))
}
