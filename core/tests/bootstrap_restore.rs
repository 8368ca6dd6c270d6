//! Save a generated population to the store, reload it as a configuration
//! layer, and check the next run rebuilds exactly the same customers.

mod common;

use common::{test_beans, test_config};
use evcustomer_core::{
    configurator::{BootstrapRecorder, Configurator},
    services::ServiceAccessor,
    social_class::EvSocialClass,
    store::SimStore,
};

const RUN_ID: &str = "boot-run-1";

fn fresh_store() -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_run(RUN_ID, 42, "0.1.0-test").expect("insert run");
    store
}

fn initialized_classes(store: &evcustomer_core::config::ConfigStore, seed: u64) -> Vec<EvSocialClass> {
    let beans = test_beans();
    let mut services = ServiceAccessor::seeded(seed);
    let mut classes: Vec<EvSocialClass> = Configurator::configure_instances(store).unwrap();
    for class in &mut classes {
        class.initialize(&beans, &mut services).unwrap();
    }
    classes
}

fn summary(classes: &[EvSocialClass]) -> Vec<(String, u32, String, String)> {
    classes
        .iter()
        .flat_map(|class| class.ev_customers())
        .map(|c| {
            (
                c.name().to_string(),
                c.social_group().id,
                c.gender().to_string(),
                c.car().name.clone(),
            )
        })
        .collect()
}

#[test]
fn saved_population_restores_identically() {
    let store = fresh_store();
    let config = test_config();
    let first = initialized_classes(&config, 42);

    let mut recorder = BootstrapRecorder::new();
    Configurator::gather_instances_bootstrap_state(&first, &mut recorder);
    // instance list plus one attribute list per class
    assert_eq!(recorder.len(), 1 + first.len());
    store.save_bootstrap(RUN_ID, &recorder).unwrap();

    let mut restored_config = test_config();
    restored_config.add_layer(store.load_bootstrap_layer(RUN_ID).unwrap());

    // A different master seed must not matter: restore makes no draws
    // for population, group, gender or car.
    let second = initialized_classes(&restored_config, 7);

    assert_eq!(summary(&first), summary(&second));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.customer_attribute_list(), b.customer_attribute_list());
    }
}

#[test]
fn configured_classes_carry_restored_lists_before_initialize() {
    let store = fresh_store();
    let first = initialized_classes(&test_config(), 99);
    let mut recorder = BootstrapRecorder::new();
    Configurator::gather_instances_bootstrap_state(&first, &mut recorder);
    store.save_bootstrap(RUN_ID, &recorder).unwrap();

    let mut config = test_config();
    config.add_layer(store.load_bootstrap_layer(RUN_ID).unwrap());
    let classes: Vec<EvSocialClass> = Configurator::configure_instances(&config).unwrap();

    for (fresh, configured) in first.iter().zip(&classes) {
        assert_eq!(fresh.name(), configured.name());
        assert_eq!(
            configured.customer_attribute_list().map(<[String]>::len),
            Some(fresh.population()),
            "{} should carry its saved list",
            configured.name()
        );
    }
}

#[test]
fn uninitialized_classes_record_only_the_instance_list() {
    let classes: Vec<EvSocialClass> = Configurator::configure_instances(&test_config()).unwrap();
    let mut recorder = BootstrapRecorder::new();
    Configurator::gather_instances_bootstrap_state(&classes, &mut recorder);
    assert_eq!(recorder.len(), 1);
    assert!(recorder.get("evcustomer.customers.evSocialClass.instances").is_some());
}
