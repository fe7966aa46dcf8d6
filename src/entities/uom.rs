use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Symbols of the units seeded by the migrator, used for lookups.
pub const LITER: &str = "l";
pub const KILOGRAM: &str = "kg";
pub const UNIT: &str = "u";

/// Measurement category of a unit. Conversion is only defined within a
/// category, except for the density-1 volume/weight bridge used for wine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UomCategory {
    #[sea_orm(string_value = "volume")]
    Volume,
    #[sea_orm(string_value = "weight")]
    Weight,
    #[sea_orm(string_value = "unit")]
    Unit,
}

/// Unit of measure
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "uoms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Short symbol ("l", "kg", "u"), unique
    pub symbol: String,

    pub category: UomCategory,

    /// Multiplier to the category base unit (liter, kilogram, unit)
    pub factor: Decimal,

    /// Display and rounding precision in decimal places
    pub digits: i32,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts a value expressed in this unit to another unit of the same
    /// category. Returns None when the categories differ.
    pub fn convert_to(&self, value: Decimal, to: &Model) -> Option<Decimal> {
        if self.category != to.category {
            return None;
        }
        Some(value * self.factor / to.factor)
    }

    /// Rounds a value to this unit's display precision.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp(self.digits.max(0) as u32)
    }
}

/// Converts a volume into a weight at density 1 (1 liter weighs 1 kilogram).
/// Factors normalize each side to its category base, so the liter value maps
/// numerically onto kilograms before scaling to the target weight unit.
pub fn volume_to_weight(value: Decimal, from: &Model, to: &Model) -> Option<Decimal> {
    if from.category != UomCategory::Volume || to.category != UomCategory::Weight {
        return None;
    }
    Some(value * from.factor / to.factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn uom(symbol: &str, category: UomCategory, factor: Decimal, digits: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            category,
            factor,
            digits,
            active: true,
        }
    }

    #[test]
    fn converts_within_category() {
        let liter = uom("l", UomCategory::Volume, dec!(1), 2);
        let milliliter = uom("ml", UomCategory::Volume, dec!(0.001), 0);

        assert_eq!(milliliter.convert_to(dec!(750), &liter), Some(dec!(0.750)));
        assert_eq!(liter.convert_to(dec!(1.5), &milliliter), Some(dec!(1500)));
    }

    #[test]
    fn rejects_cross_category_conversion() {
        let liter = uom("l", UomCategory::Volume, dec!(1), 2);
        let kilogram = uom("kg", UomCategory::Weight, dec!(1), 3);

        assert_eq!(liter.convert_to(dec!(1), &kilogram), None);
    }

    #[test]
    fn volume_maps_to_weight_at_density_one() {
        let liter = uom("l", UomCategory::Volume, dec!(1), 2);
        let milliliter = uom("ml", UomCategory::Volume, dec!(0.001), 0);
        let kilogram = uom("kg", UomCategory::Weight, dec!(1), 3);
        let gram = uom("g", UomCategory::Weight, dec!(0.001), 0);

        assert_eq!(volume_to_weight(dec!(0.75), &liter, &kilogram), Some(dec!(0.75)));
        assert_eq!(volume_to_weight(dec!(750), &milliliter, &kilogram), Some(dec!(0.750)));
        assert_eq!(volume_to_weight(dec!(0.75), &liter, &gram), Some(dec!(750)));
        assert_eq!(volume_to_weight(dec!(1), &kilogram, &kilogram), None);
    }

    #[test]
    fn rounds_to_unit_digits() {
        let kilogram = uom("kg", UomCategory::Weight, dec!(1), 3);
        assert_eq!(kilogram.round(dec!(0.75049)), dec!(0.750));
        assert_eq!(kilogram.round(dec!(1.23456)), dec!(1.235));
    }
}
