//! Collaborators a customer model reaches through during initialization.

use crate::{
    customer_repo::CustomerRepo,
    rng::{RandomSeedRepo, SeedSource},
};

pub struct ServiceAccessor {
    pub customer_repo: CustomerRepo,
    seeds:             Box<dyn SeedSource>,
}

impl ServiceAccessor {
    pub fn new(seeds: Box<dyn SeedSource>) -> Self {
        Self {
            customer_repo: CustomerRepo::new(),
            seeds,
        }
    }

    /// Services backed by a RandomSeedRepo for the given master seed.
    pub fn seeded(master_seed: u64) -> Self {
        Self::new(Box::new(RandomSeedRepo::new(master_seed)))
    }

    pub fn seed_source(&mut self) -> &mut dyn SeedSource {
        self.seeds.as_mut()
    }
}
