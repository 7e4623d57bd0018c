use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::ItemKind;
use crate::error::CoreError;

/// The largest amount the `items.amount` column (`NUMERIC(14,2)`) can hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// A single income or expense record, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerItem {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ItemKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The client-supplied fields of an item, used for both create and update.
///
/// `id` and the bookkeeping timestamps are owned by storage and never read
/// from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
}

impl NewItem {
    pub fn new(kind: ItemKind, amount: Decimal, category: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            kind,
            amount,
            category: category.into(),
            date,
        }
    }

    /// Checks the payload and returns it with the category trimmed.
    pub fn validate(mut self) -> Result<Self, CoreError> {
        if self.amount < Decimal::ZERO {
            return Err(CoreError::Validation(
                "amount".to_string(),
                "amount cannot be negative".to_string(),
            ));
        }
        if self.amount > MAX_AMOUNT {
            return Err(CoreError::Validation(
                "amount".to_string(),
                format!("amount cannot exceed {MAX_AMOUNT}"),
            ));
        }
        if self.amount.normalize().scale() > 2 {
            return Err(CoreError::Validation(
                "amount".to_string(),
                "amount has more than two decimal places".to_string(),
            ));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(CoreError::Validation(
                "category".to_string(),
                "category is required".to_string(),
            ));
        }
        self.category = category.to_string();

        Ok(self)
    }
}

impl LedgerItem {
    /// Builds the stored form of a payload. Used by stores that assign
    /// ids and timestamps themselves.
    pub fn from_new(id: i64, item: NewItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: item.kind,
            amount: item.amount,
            category: item.category,
            date: item.date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every client-owned field, keeping `id` and `created_at`.
    pub fn apply(&mut self, item: NewItem, now: DateTime<Utc>) {
        self.kind = item.kind;
        self.amount = item.amount;
        self.category = item.category;
        self.date = item.date;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn payload(amount: Decimal, category: &str) -> NewItem {
        NewItem::new(
            ItemKind::Expense,
            amount,
            category,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn max_amount_matches_column_precision() {
        assert_eq!(MAX_AMOUNT.to_string(), "999999999999.99");
    }

    #[test]
    fn validate_accepts_zero_and_trims_category() {
        let item = payload(dec!(0), "  Groceries ").validate().unwrap();
        assert_eq!(item.category, "Groceries");
        assert_eq!(item.amount, dec!(0));
    }

    #[test]
    fn validate_rejects_negative_amount() {
        let err = payload(dec!(-100.00), "Salary").validate().unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation("amount".into(), "amount cannot be negative".into())
        );
    }

    #[test]
    fn validate_rejects_blank_category() {
        assert!(payload(dec!(10), "   ").validate().is_err());
    }

    #[test]
    fn validate_rejects_sub_cent_amounts() {
        assert!(payload(dec!(10.005), "Fees").validate().is_err());
        assert!(payload(dec!(10.50), "Fees").validate().is_ok());
    }

    #[test]
    fn payload_reads_wire_format() {
        let json = r#"{"type":"income","amount":1000.5,"category":"Salary","date":"2024-01-15T10:00:00+03:00"}"#;
        let item: NewItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Income);
        assert_eq!(item.amount, dec!(1000.5));
        // Offsets are normalized to UTC.
        assert_eq!(item.date, Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap());
    }

    #[test]
    fn payload_rejects_unknown_type() {
        let json = r#"{"type":"transfer","amount":1,"category":"x","date":"2024-01-15T10:00:00Z"}"#;
        assert!(serde_json::from_str::<NewItem>(json).is_err());
    }

    #[test]
    fn apply_keeps_identity() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut item = LedgerItem::from_new(7, payload(dec!(5), "Coffee"), created);
        item.apply(payload(dec!(6), "Tea"), later);
        assert_eq!(item.id, 7);
        assert_eq!(item.created_at, created);
        assert_eq!(item.updated_at, later);
        assert_eq!(item.category, "Tea");
    }
}
