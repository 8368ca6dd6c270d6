//! Electric-vehicle customer population model.
//!
//! Social classes of EV owners are configured from a layered configuration
//! store, generate (or restore) their customers, and record the compact
//! attribute lists a later run needs to rebuild the same population.

pub mod beans;
pub mod clock;
pub mod config;
pub mod configurator;
pub mod customer_repo;
pub mod error;
pub mod ev_customer;
pub mod rng;
pub mod services;
pub mod social_class;
pub mod store;
pub mod types;
