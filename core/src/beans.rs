//! Static tables shared by every social class: social groups, activities,
//! group activities, car types, and the per-class weightings.

use crate::{
    config::{ConfigStore, InstanceView},
    configurator::{ConfigurableInstance, Configurator},
    error::EvResult,
    types::{ActivityId, Gender, GroupId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialGroup {
    pub id:   GroupId,
    pub name: String,
}

impl ConfigurableInstance for SocialGroup {
    const PREFIX: &'static str = "evcustomer.beans.socialGroup";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        Ok(Self {
            id:   view.required_u32("id")?,
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id:             ActivityId,
    pub name:           String,
    pub weekday_weight: f64,
    pub weekend_weight: f64,
}

impl Activity {
    pub fn day_weight(&self, weekend: bool) -> f64 {
        if weekend { self.weekend_weight } else { self.weekday_weight }
    }
}

impl ConfigurableInstance for Activity {
    const PREFIX: &'static str = "evcustomer.beans.activity";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        Ok(Self {
            id:             view.required_u32("id")?,
            name:           name.to_string(),
            weekday_weight: view.optional_f64("weekdayWeight")?.unwrap_or(1.0),
            weekend_weight: view.optional_f64("weekendWeight")?.unwrap_or(1.0),
        })
    }
}

/// How often members of a group do an activity, and how far they drive for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupActivity {
    pub name:               String,
    pub group_id:           GroupId,
    pub activity_id:        ActivityId,
    pub daily_km:           f64,
    pub male_probability:   f64,
    pub female_probability: f64,
}

impl GroupActivity {
    pub fn probability_for(&self, gender: Gender) -> f64 {
        match gender {
            Gender::Male   => self.male_probability,
            Gender::Female => self.female_probability,
        }
    }
}

impl ConfigurableInstance for GroupActivity {
    const PREFIX: &'static str = "evcustomer.beans.groupActivity";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        Ok(Self {
            name:               name.to_string(),
            group_id:           view.required_u32("groupId")?,
            activity_id:        view.required_u32("activityId")?,
            daily_km:           view.required_f64("dailyKm")?,
            male_probability:   view.required_f64("maleProbability")?,
            female_probability: view.required_f64("femaleProbability")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarType {
    pub name:           String,
    /// Battery capacity in kWh.
    pub max_capacity:   f64,
    /// Range on a full battery in km.
    pub range:          f64,
    pub home_charge_kw: f64,
    pub away_charge_kw: f64,
}

impl CarType {
    /// kWh needed to drive one km.
    pub fn kwh_per_km(&self) -> f64 {
        if self.range > 0.0 { self.max_capacity / self.range } else { 0.0 }
    }
}

impl ConfigurableInstance for CarType {
    const PREFIX: &'static str = "evcustomer.beans.carType";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        Ok(Self {
            name:           name.to_string(),
            max_capacity:   view.required_f64("maxCapacity")?,
            range:          view.required_f64("range")?,
            home_charge_kw: view.required_f64("homeChargeKW")?,
            away_charge_kw: view.optional_f64("awayChargeKW")?.unwrap_or(0.0),
        })
    }
}

/// Weighted association between a social class and a social group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub name:              String,
    pub social_class_name: String,
    pub group_id:          GroupId,
    pub probability:       f64,
    pub male_probability:  f64,
}

impl ConfigurableInstance for ClassGroup {
    const PREFIX: &'static str = "evcustomer.beans.classGroup";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        Ok(Self {
            name:              name.to_string(),
            social_class_name: view.required_str("socialClassName")?,
            group_id:          view.required_u32("groupId")?,
            probability:       view.required_f64("probability")?,
            male_probability:  view.optional_f64("maleProbability")?.unwrap_or(0.5),
        })
    }
}

/// Weighted association between a social class and a car type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCar {
    pub name:              String,
    pub social_class_name: String,
    pub car_name:          String,
    pub probability:       f64,
}

impl ConfigurableInstance for ClassCar {
    const PREFIX: &'static str = "evcustomer.beans.classCar";

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self> {
        Ok(Self {
            name:              name.to_string(),
            social_class_name: view.required_str("socialClassName")?,
            car_name:          view.required_str("carName")?,
            probability:       view.required_f64("probability")?,
        })
    }
}

/// Every bean table, loaded once and shared by all social classes.
#[derive(Debug, Clone, Default)]
pub struct EvBeans {
    pub groups:           BTreeMap<GroupId, SocialGroup>,
    pub activities:       BTreeMap<ActivityId, Activity>,
    pub car_types:        BTreeMap<String, CarType>,
    pub group_activities: Vec<GroupActivity>,
    /// Declaration order; this is the draw order for weighted picks.
    pub class_groups:     Vec<ClassGroup>,
    pub class_cars:       Vec<ClassCar>,
}

impl EvBeans {
    pub fn load(store: &ConfigStore) -> EvResult<Self> {
        let groups = Configurator::configure_instances::<SocialGroup>(store)?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();
        let activities = Configurator::configure_instances::<Activity>(store)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let car_types = Configurator::configure_instances::<CarType>(store)?
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        let beans = Self {
            groups,
            activities,
            car_types,
            group_activities: Configurator::configure_instances(store)?,
            class_groups:     Configurator::configure_instances(store)?,
            class_cars:       Configurator::configure_instances(store)?,
        };
        log::info!(
            "beans loaded: {} groups, {} activities, {} car types, {} class-groups, {} class-cars",
            beans.groups.len(),
            beans.activities.len(),
            beans.car_types.len(),
            beans.class_groups.len(),
            beans.class_cars.len()
        );
        Ok(beans)
    }

    pub fn class_groups_for<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ClassGroup> + 'a {
        self.class_groups
            .iter()
            .filter(move |cg| cg.social_class_name == class)
    }

    pub fn class_cars_for<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ClassCar> + 'a {
        self.class_cars
            .iter()
            .filter(move |cc| cc.social_class_name == class)
    }

    pub fn group_activities_for(&self, group_id: GroupId) -> BTreeMap<ActivityId, GroupActivity> {
        self.group_activities
            .iter()
            .filter(|ga| ga.group_id == group_id)
            .map(|ga| (ga.activity_id, ga.clone()))
            .collect()
    }
}
