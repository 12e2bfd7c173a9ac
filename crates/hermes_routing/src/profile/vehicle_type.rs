use serde::{Deserialize, Serialize};

use crate::arc_attributes::AccessFlags;

/// Vehicle categories plus the weight and dimensions used by "other" restrictions.
/// Dimensions are in meters, weights in metric tons; zero means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleType {
    pub access_flags: AccessFlags,
    pub weight: f64,
    pub axle_load: f64,
    pub double_axle_load: f64,
    pub triple_axle_load: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub hazardous_materials: bool,
}

impl Default for VehicleType {
    fn default() -> Self {
        VehicleType {
            access_flags: AccessFlags::CAR | AccessFlags::WRONG_WAY,
            weight: 0.0,
            axle_load: 0.0,
            double_axle_load: 0.0,
            triple_axle_load: 0.0,
            height: 0.0,
            width: 0.0,
            length: 0.0,
            hazardous_materials: false,
        }
    }
}

impl VehicleType {
    pub fn pedestrian() -> Self {
        VehicleType {
            access_flags: AccessFlags::PEDESTRIAN,
            ..Default::default()
        }
    }

    pub fn bicycle() -> Self {
        VehicleType {
            access_flags: AccessFlags::BICYCLE | AccessFlags::WRONG_WAY,
            ..Default::default()
        }
    }

    pub fn obeys_one_way(&self) -> bool {
        self.access_flags.contains(AccessFlags::WRONG_WAY)
    }

    fn has_dimensions(&self) -> bool {
        [
            self.weight,
            self.axle_load,
            self.double_axle_load,
            self.triple_axle_load,
            self.height,
            self.width,
            self.length,
        ]
        .iter()
        .any(|value| *value > 0.0)
    }

    /// Clamps unknown or negative dimensions to zero and sets the "other"
    /// category exactly when a dimension or hazardous load is given.
    pub fn normalize(&mut self) {
        for value in [
            &mut self.weight,
            &mut self.axle_load,
            &mut self.double_axle_load,
            &mut self.triple_axle_load,
            &mut self.height,
            &mut self.width,
            &mut self.length,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
            }
        }

        let other = self.hazardous_materials || self.has_dimensions();
        self.access_flags.set(AccessFlags::OTHER, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sets_other_flag() {
        let mut vehicle = VehicleType {
            height: 4.2,
            width: -1.0,
            ..Default::default()
        };
        vehicle.normalize();

        assert_eq!(vehicle.width, 0.0);
        assert!(vehicle.access_flags.contains(AccessFlags::OTHER));

        vehicle.height = 0.0;
        vehicle.normalize();
        assert!(!vehicle.access_flags.contains(AccessFlags::OTHER));

        vehicle.hazardous_materials = true;
        vehicle.normalize();
        assert!(vehicle.access_flags.contains(AccessFlags::OTHER));
    }

    #[test]
    fn test_one_way_obedience() {
        assert!(VehicleType::default().obeys_one_way());
        assert!(VehicleType::bicycle().obeys_one_way());
        assert!(!VehicleType::pedestrian().obeys_one_way());
    }
}
