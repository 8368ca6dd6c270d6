//! A single electric-vehicle owner and its compact bootstrap encoding.

use crate::{
    beans::{Activity, CarType, GroupActivity, SocialGroup},
    clock,
    customer_repo::CustomerInfo,
    error::{EvError, EvResult},
    rng::SimRng,
    types::{ActivityId, Gender, GroupId},
};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag written into freshly generated entries.
pub const GENERATED_TAG: &str = "x";

/// Hours of the day in which trips may start: [06:00, 22:00).
pub const ACTIVE_HOURS: std::ops::Range<u32> = 6..22;

/// An activity is done as an outbound and a return trip.
pub const TRIPS_PER_DAY: f64 = 2.0;

/// `groupId.gender.carName.tag`, one entry per customer in the bootstrap list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAttributes {
    pub group_id: GroupId,
    pub gender:   Gender,
    pub car_name: String,
    pub tag:      String,
}

impl CustomerAttributes {
    pub fn encode(&self) -> String {
        format!("{}.{}.{}.{}", self.group_id, self.gender, self.car_name, self.tag)
    }

    /// The car name is everything between the gender and the last dot, so
    /// the tag is always the final field.
    pub fn parse(entry: &str) -> EvResult<Self> {
        let malformed = || EvError::MalformedAttribute { entry: entry.to_string() };
        let (group, rest) = entry.split_once('.').ok_or_else(malformed)?;
        let (gender, rest) = rest.split_once('.').ok_or_else(malformed)?;
        let (car_name, tag) = rest.rsplit_once('.').ok_or_else(malformed)?;
        if car_name.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            group_id: group.trim().parse().map_err(|_| malformed())?,
            gender:   gender.parse().map_err(|_| malformed())?,
            car_name: car_name.to_string(),
            tag:      tag.to_string(),
        })
    }
}

/// Distance driven and energy drawn by one customer in one hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyUsage {
    pub km:          f64,
    pub charged_kwh: f64,
}

impl std::ops::AddAssign for HourlyUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.km += rhs.km;
        self.charged_kwh += rhs.charged_kwh;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvCustomer {
    name:             String,
    social_group:     SocialGroup,
    gender:           Gender,
    car:              CarType,
    attributes:       String,
    current_capacity: f64,
    driving:          bool,
}

impl EvCustomer {
    /// A new customer starts parked with a full battery.
    pub fn new(
        name: impl Into<String>,
        social_group: SocialGroup,
        gender: Gender,
        car: CarType,
        attributes: impl Into<String>,
    ) -> Self {
        let current_capacity = car.max_capacity;
        Self {
            name: name.into(),
            social_group,
            gender,
            car,
            attributes: attributes.into(),
            current_capacity,
            driving: false,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn social_group(&self) -> &SocialGroup { &self.social_group }
    pub fn gender(&self) -> Gender { self.gender }
    pub fn car(&self) -> &CarType { &self.car }
    pub fn is_driving(&self) -> bool { self.driving }
    pub fn current_capacity(&self) -> f64 { self.current_capacity }

    /// The encoded attribute entry this customer was built from.
    pub fn attributes(&self) -> &str {
        &self.attributes
    }

    pub fn customer_info(&self) -> CustomerInfo {
        CustomerInfo::electric_vehicle(&self.name, self.car.max_capacity, self.car.home_charge_kw)
    }

    /// Advance one hour.
    ///
    /// Each group activity gets an hourly trip chance of
    /// `gender_probability * day_weight * TRIPS_PER_DAY / active hours`, so
    /// the expected daily distance is `gender_probability * day_weight *
    /// daily_km`. A trip is skipped when the battery cannot cover it.
    /// Hours without driving are spent charging at home.
    pub fn step(
        &mut self,
        now: &DateTime<Utc>,
        group_activities: &BTreeMap<ActivityId, GroupActivity>,
        activities: &BTreeMap<ActivityId, Activity>,
        rng: &mut dyn SimRng,
    ) -> HourlyUsage {
        let mut usage = HourlyUsage::default();
        self.driving = false;

        if ACTIVE_HOURS.contains(&now.hour()) {
            let weekend = clock::is_weekend(now);
            let active_hours = ACTIVE_HOURS.len() as f64;
            for (activity_id, ga) in group_activities {
                let Some(activity) = activities.get(activity_id) else {
                    continue;
                };
                let p = ga.probability_for(self.gender) * activity.day_weight(weekend)
                    * TRIPS_PER_DAY / active_hours;
                if !rng.chance(p) {
                    continue;
                }
                let km = ga.daily_km / TRIPS_PER_DAY;
                let needed = km * self.car.kwh_per_km();
                if needed > self.current_capacity {
                    log::debug!(
                        "{}: skipping {} trip, needs {needed:.2} kWh, has {:.2}",
                        self.name, activity.name, self.current_capacity
                    );
                    continue;
                }
                self.current_capacity -= needed;
                self.driving = true;
                usage.km += km;
            }
        }

        if !self.driving {
            let room = (self.car.max_capacity - self.current_capacity).max(0.0);
            let charge = room.min(self.car.home_charge_kw);
            self.current_capacity += charge;
            usage.charged_kwh = charge;
        }
        usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Fixed(f64);

    impl SimRng for Fixed {
        fn next_f64(&mut self) -> f64 { self.0 }
        fn next_u64_below(&mut self, _n: u64) -> u64 { 0 }
    }

    fn leaf() -> CarType {
        CarType {
            name: "Nissan_Leaf_24_kWh".into(),
            max_capacity: 24.0,
            range: 120.0,
            home_charge_kw: 3.3,
            away_charge_kw: 0.0,
        }
    }

    fn commuter() -> (BTreeMap<ActivityId, GroupActivity>, BTreeMap<ActivityId, Activity>) {
        let ga = GroupActivity {
            name: "fulltime_commuting".into(),
            group_id: 0,
            activity_id: 0,
            daily_km: 40.0,
            male_probability: 1.0,
            female_probability: 1.0,
        };
        let act = Activity {
            id: 0,
            name: "commuting".into(),
            weekday_weight: 1.0,
            weekend_weight: 0.0,
        };
        ([(0, ga)].into(), [(0, act)].into())
    }

    fn customer() -> EvCustomer {
        EvCustomer::new(
            "HighIncome_2_0",
            SocialGroup { id: 0, name: "fulltime".into() },
            Gender::Male,
            leaf(),
            "0.male.Nissan_Leaf_24_kWh.x",
        )
    }

    #[test]
    fn attributes_parse_and_encode() {
        let a = CustomerAttributes::parse("2.female.Nissan_Leaf_24_kWh.1").unwrap();
        assert_eq!(a.group_id, 2);
        assert_eq!(a.gender, Gender::Female);
        assert_eq!(a.car_name, "Nissan_Leaf_24_kWh");
        assert_eq!(a.tag, "1");
        assert_eq!(a.encode(), "2.female.Nissan_Leaf_24_kWh.1");
    }

    #[test]
    fn car_name_may_contain_dots() {
        let a = CustomerAttributes::parse("1.male.Model.3.x").unwrap();
        assert_eq!(a.car_name, "Model.3");
        assert_eq!(a.tag, "x");
    }

    #[test]
    fn malformed_entries_are_rejected() {
        for bad in ["", "0", "0.male", "0.male.x", "zero.male.Tesla.x", "0.other.Tesla.x", "0.male..x"] {
            assert!(
                matches!(CustomerAttributes::parse(bad), Err(EvError::MalformedAttribute { .. })),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn weekday_daytime_trip_drains_battery() {
        // 2011-01-10 08:00 is a Monday morning.
        let now = Utc.with_ymd_and_hms(2011, 1, 10, 8, 0, 0).unwrap();
        let (gas, acts) = commuter();
        let mut c = customer();
        let usage = c.step(&now, &gas, &acts, &mut Fixed(0.0));
        assert!(c.is_driving());
        assert_eq!(usage.km, 20.0);
        assert_eq!(usage.charged_kwh, 0.0);
        assert!((c.current_capacity() - 20.0).abs() < 1e-9, "20 km at 0.2 kWh/km");

        // Night: parked, recharges at home rate.
        let night = Utc.with_ymd_and_hms(2011, 1, 10, 23, 0, 0).unwrap();
        let usage = c.step(&night, &gas, &acts, &mut Fixed(0.0));
        assert!(!c.is_driving());
        assert!((usage.charged_kwh - 3.3).abs() < 1e-9);
    }

    #[test]
    fn weekend_weight_zero_means_no_commute() {
        let saturday = Utc.with_ymd_and_hms(2011, 1, 15, 8, 0, 0).unwrap();
        let (gas, acts) = commuter();
        let mut c = customer();
        let usage = c.step(&saturday, &gas, &acts, &mut Fixed(0.0));
        assert!(!c.is_driving());
        assert_eq!(usage.km, 0.0);
        assert_eq!(usage.charged_kwh, 0.0, "battery already full");
    }

    #[test]
    fn trip_skipped_when_battery_too_low() {
        let now = Utc.with_ymd_and_hms(2011, 1, 10, 8, 0, 0).unwrap();
        let (gas, acts) = commuter();
        let mut c = customer();
        c.current_capacity = 1.0;
        let usage = c.step(&now, &gas, &acts, &mut Fixed(0.0));
        assert!(!c.is_driving());
        assert_eq!(usage.km, 0.0);
        assert!((usage.charged_kwh - 3.3).abs() < 1e-9);
    }
}
