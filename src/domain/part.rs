//! Spare parts and their stock movements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, EntityPatch, ListFilter};
use super::validation::{ValidationError, Validator};

/// A spare part held in stock, keyed by its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub code: String,
    pub name: String,
    pub supplier: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_entry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exit_date: Option<NaiveDate>,
}

/// Partial update for a [`Part`].
///
/// Stock dates are only moved by [`Part::receive`] and [`Part::dispatch`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartPatch {
    pub name: Option<String>,
    pub supplier: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price: Option<f64>,
}

/// Rejected stock movement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    #[error("Insufficient stock for part {code}: {available} available, {requested} requested")]
    InsufficientStock {
        code: String,
        available: u32,
        requested: u32,
    },

    #[error("Stock movement quantity must be greater than zero")]
    ZeroQuantity,

    #[error("Stock for part {code} would exceed the maximum quantity")]
    Overflow { code: String },
}

impl Part {
    /// Records an entry of `quantity` units on `date`.
    ///
    /// # Errors
    ///
    /// Fails on a zero quantity or when the stock would overflow.
    pub fn receive(&mut self, quantity: u32, date: NaiveDate) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::ZeroQuantity);
        }
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| StockError::Overflow {
                code: self.code.clone(),
            })?;
        self.last_entry_date = Some(date);
        Ok(())
    }

    /// Records an exit of `quantity` units on `date`.
    ///
    /// # Errors
    ///
    /// Fails on a zero quantity or when fewer units are in stock.
    pub fn dispatch(&mut self, quantity: u32, date: NaiveDate) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::ZeroQuantity);
        }
        self.quantity =
            self.quantity
                .checked_sub(quantity)
                .ok_or_else(|| StockError::InsufficientStock {
                    code: self.code.clone(),
                    available: self.quantity,
                    requested: quantity,
                })?;
        self.last_exit_date = Some(date);
        Ok(())
    }
}

fn check_price(validator: &mut Validator, unit_price: f64) {
    validator.check(
        unit_price.is_finite() && unit_price >= 0.0,
        "unit_price",
        "must be a finite, non-negative number",
    );
}

impl Entity for Part {
    type Patch = PartPatch;

    const KIND: EntityKind = EntityKind::Part;

    fn key(&self) -> &str {
        &self.code
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .require_text("code", &self.code)
            .require_text("name", &self.name)
            .require_text("supplier", &self.supplier);
        check_price(&mut validator, self.unit_price);
        validator.finish()
    }

    // The date range applies to the most recent entry.
    fn matches(&self, filter: &ListFilter) -> bool {
        filter.date_in_range(self.last_entry_date)
    }
}

impl EntityPatch<Part> for PartPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.supplier.is_none()
            && self.quantity.is_none()
            && self.unit_price.is_none()
    }

    fn apply_to(self, record: &mut Part) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(supplier) = self.supplier {
            record.supplier = supplier;
        }
        if let Some(quantity) = self.quantity {
            record.quantity = quantity;
        }
        if let Some(unit_price) = self.unit_price {
            record.unit_price = unit_price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn bearing() -> Part {
        Part {
            code: "P001".to_string(),
            name: "Rolamento 6204".to_string(),
            supplier: "SKF".to_string(),
            quantity: 10,
            unit_price: 25.9,
            last_entry_date: None,
            last_exit_date: None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, day).unwrap()
    }

    #[rstest]
    fn test_receive_adds_stock_and_stamps_date() {
        let mut part = bearing();
        part.receive(5, date(3)).unwrap();
        assert_eq!(part.quantity, 15);
        assert_eq!(part.last_entry_date, Some(date(3)));
        assert_eq!(part.last_exit_date, None);
    }

    #[rstest]
    fn test_dispatch_removes_stock_and_stamps_date() {
        let mut part = bearing();
        part.dispatch(10, date(4)).unwrap();
        assert_eq!(part.quantity, 0);
        assert_eq!(part.last_exit_date, Some(date(4)));
    }

    #[rstest]
    fn test_dispatch_more_than_available_leaves_part_unchanged() {
        let mut part = bearing();
        let error = part.dispatch(11, date(4)).unwrap_err();

        assert_eq!(
            error,
            StockError::InsufficientStock {
                code: "P001".to_string(),
                available: 10,
                requested: 11,
            }
        );
        assert_eq!(part, bearing());
    }

    #[rstest]
    #[case::receive(true)]
    #[case::dispatch(false)]
    fn test_zero_quantity_is_rejected(#[case] receive: bool) {
        let mut part = bearing();
        let result = if receive {
            part.receive(0, date(1))
        } else {
            part.dispatch(0, date(1))
        };
        assert_eq!(result, Err(StockError::ZeroQuantity));
    }

    #[rstest]
    fn test_receive_overflow_is_rejected() {
        let mut part = Part {
            quantity: u32::MAX,
            ..bearing()
        };
        assert!(matches!(
            part.receive(1, date(1)),
            Err(StockError::Overflow { .. })
        ));
        assert_eq!(part.quantity, u32::MAX);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_validate_rejects_bad_price(#[case] unit_price: f64) {
        let part = Part {
            unit_price,
            ..bearing()
        };
        let error = part.validate().unwrap_err();
        assert_eq!(error.errors[0].field, "unit_price");
    }

    #[rstest]
    fn test_negative_quantity_fails_to_decode() {
        let value = json!({
            "code": "P001",
            "name": "Rolamento",
            "supplier": "SKF",
            "quantity": -1,
            "unit_price": 1.0
        });
        assert!(serde_json::from_value::<Part>(value).is_err());
    }

    #[rstest]
    fn test_absent_dates_are_not_serialized() {
        let value = serde_json::to_value(bearing()).unwrap();
        assert!(value.get("last_entry_date").is_none());
        assert!(value.get("last_exit_date").is_none());
    }

    #[rstest]
    fn test_date_filter_uses_last_entry() {
        let filter = ListFilter {
            date_from: Some(date(1)),
            date_to: Some(date(10)),
            ..ListFilter::default()
        };
        assert!(!bearing().matches(&filter));

        let mut received = bearing();
        received.receive(1, date(5)).unwrap();
        assert!(received.matches(&filter));
    }
}
