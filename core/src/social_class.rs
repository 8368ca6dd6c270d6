//! A social class of EV owners: builds its population from configuration
//! and carries the compact attribute list needed to rebuild it on restart.
//!
//! Initialization has two paths:
//!   - no attribute list: draw a population size in [min, max] and draw a
//!     group, gender and car per customer, recording each as an entry;
//!   - attribute list present (injected or configured from a bootstrap
//!     layer): rebuild exactly those customers, with no random draws.

use crate::{
    beans::{Activity, CarType, ClassCar, ClassGroup, EvBeans, GroupActivity, SocialGroup},
    config::InstanceView,
    configurator::ConfigurableInstance,
    customer_repo::CustomerInfo,
    error::{EvError, EvResult},
    ev_customer::{CustomerAttributes, EvCustomer, HourlyUsage, GENERATED_TAG},
    rng::SimRng,
    services::ServiceAccessor,
    types::{ActivityId, Gender, GroupId},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// Requester prefix used when asking the seed source for streams; the class
/// name is appended so every class draws from its own stream.
pub const SEED_REQUESTER: &str = "EvSocialClass";

pub struct EvSocialClass {
    name:      String,
    min_count: u32,
    max_count: u32,
    seed_id:   u64,

    groups:           BTreeMap<GroupId, SocialGroup>,
    car_types:        BTreeMap<String, CarType>,
    activities:       BTreeMap<ActivityId, Activity>,
    group_activities: BTreeMap<GroupId, BTreeMap<ActivityId, GroupActivity>>,
    class_groups:     BTreeMap<GroupId, ClassGroup>,
    class_cars:       BTreeMap<String, ClassCar>,
    /// Declaration order of class-groups and class-cars.
    group_draw_order: Vec<GroupId>,
    car_draw_order:   Vec<String>,

    customer_attribute_list: Option<Vec<String>>,
    ev_customers:            Vec<EvCustomer>,
    customer_infos:          Vec<CustomerInfo>,
    activity_rng:            Option<Box<dyn SimRng>>,
}

impl EvSocialClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_count: 1,
            max_count: 1,
            seed_id: 0,
            groups: BTreeMap::new(),
            car_types: BTreeMap::new(),
            activities: BTreeMap::new(),
            group_activities: BTreeMap::new(),
            class_groups: BTreeMap::new(),
            class_cars: BTreeMap::new(),
            group_draw_order: Vec::new(),
            car_draw_order: Vec::new(),
            customer_attribute_list: None,
            ev_customers: Vec::new(),
            customer_infos: Vec::new(),
            activity_rng: None,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn min_count(&self) -> u32 { self.min_count }
    pub fn max_count(&self) -> u32 { self.max_count }
    pub fn set_min_count(&mut self, n: u32) { self.min_count = n; }
    pub fn set_max_count(&mut self, n: u32) { self.max_count = n; }
    pub fn seed_id(&self) -> u64 { self.seed_id }

    pub fn population(&self) -> usize {
        self.ev_customers.len()
    }

    pub fn groups(&self) -> &BTreeMap<GroupId, SocialGroup> { &self.groups }
    pub fn car_types(&self) -> &BTreeMap<String, CarType> { &self.car_types }
    pub fn activities(&self) -> &BTreeMap<ActivityId, Activity> { &self.activities }
    pub fn class_groups(&self) -> &BTreeMap<GroupId, ClassGroup> { &self.class_groups }
    pub fn class_cars(&self) -> &BTreeMap<String, ClassCar> { &self.class_cars }
    pub fn ev_customers(&self) -> &[EvCustomer] { &self.ev_customers }
    pub fn customer_infos(&self) -> &[CustomerInfo] { &self.customer_infos }

    pub fn group_activities(&self, group_id: GroupId) -> Option<&BTreeMap<ActivityId, GroupActivity>> {
        self.group_activities.get(&group_id)
    }

    /// `None` until initialized, unless a list was injected or configured.
    pub fn customer_attribute_list(&self) -> Option<&[String]> {
        self.customer_attribute_list.as_deref()
    }

    /// Inject a persisted list; the next initialize() restores from it.
    pub fn set_customer_attribute_list(&mut self, list: Vec<String>) {
        self.customer_attribute_list = Some(list);
    }

    pub fn initialize(&mut self, beans: &EvBeans, services: &mut ServiceAccessor) -> EvResult<()> {
        self.load_tables(beans)?;

        let requester = format!("{SEED_REQUESTER}.{}", self.name);
        let seeds = services.seed_source();
        let mut rng = seeds.random_seed(&requester, self.seed_id, "initialize");
        self.activity_rng = Some(seeds.random_seed(&requester, self.seed_id, "activities"));

        let restored = self.customer_attribute_list.is_some();
        let entries = match self.customer_attribute_list.take() {
            Some(list) => list,
            None => self.generate_attribute_list(rng.as_mut())?,
        };

        let built: EvResult<Vec<EvCustomer>> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| self.build_customer(i, entry))
            .collect();
        let customers = match built {
            Ok(customers) => customers,
            Err(e) => {
                if restored {
                    self.customer_attribute_list = Some(entries);
                }
                return Err(e);
            }
        };

        // Re-initializing replaces this class's earlier registrations.
        for info in self.customer_infos.drain(..) {
            services.customer_repo.remove(info.id);
        }
        self.customer_infos = customers
            .iter()
            .map(|c| services.customer_repo.add(c.customer_info()))
            .collect();
        self.ev_customers = customers;
        self.customer_attribute_list = Some(entries);

        log::info!(
            "{}: {} {} customers",
            self.name,
            if restored { "restored" } else { "generated" },
            self.ev_customers.len()
        );
        Ok(())
    }

    fn load_tables(&mut self, beans: &EvBeans) -> EvResult<()> {
        self.groups = beans.groups.clone();
        self.car_types = beans.car_types.clone();
        self.activities = beans.activities.clone();
        self.group_activities = self
            .groups
            .keys()
            .map(|&id| (id, beans.group_activities_for(id)))
            .collect();

        self.class_groups.clear();
        self.group_draw_order.clear();
        for cg in beans.class_groups_for(&self.name) {
            if !self.class_groups.contains_key(&cg.group_id) {
                self.group_draw_order.push(cg.group_id);
            }
            self.class_groups.insert(cg.group_id, cg.clone());
        }

        self.class_cars.clear();
        self.car_draw_order.clear();
        for cc in beans.class_cars_for(&self.name) {
            if !self.class_cars.contains_key(&cc.car_name) {
                self.car_draw_order.push(cc.car_name.clone());
            }
            self.class_cars.insert(cc.car_name.clone(), cc.clone());
        }

        let total: f64 = self.class_groups.values().map(|cg| cg.probability).sum();
        if !self.class_groups.is_empty() && (total - 1.0).abs() > 1e-6 {
            log::warn!("{}: class-group probabilities sum to {total:.4}, not 1", self.name);
        }
        Ok(())
    }

    fn generate_attribute_list(&self, rng: &mut dyn SimRng) -> EvResult<Vec<String>> {
        if self.group_draw_order.is_empty() {
            return Err(EvError::IncompleteClass { class: self.name.clone(), what: "class-groups" });
        }
        if self.car_draw_order.is_empty() {
            return Err(EvError::IncompleteClass { class: self.name.clone(), what: "class-cars" });
        }

        let low = self.min_count.min(self.max_count);
        let spread = self.max_count.abs_diff(self.min_count) as u64;
        let population = low as u64 + rng.next_u64_below(spread + 1);

        let mut list = Vec::with_capacity(population as usize);
        for _ in 0..population {
            let class_group = self.pick_class_group(rng);
            let gender = if rng.chance(class_group.male_probability) {
                Gender::Male
            } else {
                Gender::Female
            };
            let car_name = self.pick_car(rng);
            let attrs = CustomerAttributes {
                group_id: class_group.group_id,
                gender,
                car_name: car_name.to_string(),
                tag: GENERATED_TAG.to_string(),
            };
            list.push(attrs.encode());
        }
        Ok(list)
    }

    fn pick_class_group(&self, rng: &mut dyn SimRng) -> &ClassGroup {
        let weights: Vec<(&GroupId, f64)> = self
            .group_draw_order
            .iter()
            .map(|id| (id, self.class_groups[id].probability))
            .collect();
        let id = weighted_pick(&weights, rng);
        &self.class_groups[id]
    }

    fn pick_car(&self, rng: &mut dyn SimRng) -> &str {
        let weights: Vec<(&str, f64)> = self
            .car_draw_order
            .iter()
            .map(|name| (name.as_str(), self.class_cars[name].probability))
            .collect();
        weighted_pick(&weights, rng)
    }

    fn build_customer(&self, index: usize, entry: &str) -> EvResult<EvCustomer> {
        let attrs = CustomerAttributes::parse(entry)?;
        let group = self.groups.get(&attrs.group_id).ok_or_else(|| EvError::UnknownGroup {
            class: self.name.clone(),
            group_id: attrs.group_id,
        })?;
        let car = self.car_types.get(&attrs.car_name).ok_or_else(|| EvError::UnknownCarType {
            class: self.name.clone(),
            car_name: attrs.car_name.clone(),
        })?;
        Ok(EvCustomer::new(
            format!("{}_{index}", self.name),
            group.clone(),
            attrs.gender,
            car.clone(),
            entry,
        ))
    }

    /// Advance every customer one hour at `now`. Returns the class totals.
    /// Does nothing before initialize().
    pub fn step(&mut self, now: &DateTime<Utc>) -> HourlyUsage {
        let mut total = HourlyUsage::default();
        let Some(rng) = self.activity_rng.as_mut() else {
            return total;
        };
        let empty = BTreeMap::new();
        for customer in &mut self.ev_customers {
            let gas = self
                .group_activities
                .get(&customer.social_group().id)
                .unwrap_or(&empty);
            total += customer.step(now, gas, &self.activities, &mut **rng);
        }
        log::debug!(
            "{} at {now}: {:.1} km driven, {:.2} kWh charged",
            self.name, total.km, total.charged_kwh
        );
        total
    }
}

/// Cumulative pick over `(item, weight)` in order. Weights are normalized by
/// their sum; the last item absorbs rounding.
fn weighted_pick<'a, T>(weights: &[(&'a T, f64)], rng: &mut dyn SimRng) -> &'a T
where
    T: ?Sized,
{
    let total: f64 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    let roll = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for &(item, w) in weights {
        cumulative += w.max(0.0);
        if roll < cumulative {
            return item;
        }
    }
    weights[weights.len() - 1].0
}

impl ConfigurableInstance for EvSocialClass {
    const PREFIX: &'static str = "evcustomer.customers.evSocialClass";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        let mut class = EvSocialClass::new(name);
        if let Some(n) = view.optional_u32("minCount")? {
            class.min_count = n;
        }
        if let Some(n) = view.optional_u32("maxCount")? {
            class.max_count = n;
        }
        if let Some(id) = view.optional_u32("seedId")? {
            class.seed_id = id as u64;
        }
        class.customer_attribute_list = view.optional_list("customerAttributeList")?;
        Ok(class)
    }

    fn bootstrap_state(&self) -> Vec<(&'static str, Value)> {
        match &self.customer_attribute_list {
            Some(list) => vec![(
                "customerAttributeList",
                Value::Array(list.iter().cloned().map(Value::String).collect()),
            )],
            None => Vec::new(),
        }
    }
}
