//! Typed inputs and results for ledger postings.
//!
//! An `orders` row carries nullable columns; `PostingOrder` is the validated
//! view the ledger operations work from.

use crate::entities::orders::{self, OrderType};
use crate::entities::{inventory, inventory_trx, return_inventory, usage_inventory};
use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The fields of an order that a ledger posting reads, checked up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostingOrder {
    pub order_id: i32,
    pub order_type: OrderType,
    pub item_id: i32,
    /// Destination for receipts and transfers; the posting location otherwise.
    pub loc_id: i32,
    #[validate(range(min = 1, message = "actual_qty must be a positive integer"))]
    pub quantity: i32,
}

impl PostingOrder {
    /// Builds a posting input from an order row, rejecting missing or
    /// non-positive fields with `ValidationError`.
    pub fn from_order(order: &orders::Model) -> Result<Self, ServiceError> {
        let order_type = order.kind().ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Order {} has unsupported order type '{}'",
                order.id, order.order_type
            ))
        })?;
        let item_id = order.item_id.ok_or_else(|| {
            ServiceError::ValidationError(format!("Order {} has no item_id", order.id))
        })?;
        let loc_id = order.loc_id.ok_or_else(|| {
            ServiceError::ValidationError(format!("Order {} has no loc_id", order.id))
        })?;
        let quantity = order.actual_qty.ok_or_else(|| {
            ServiceError::ValidationError(format!("Order {} has no actual_qty", order.id))
        })?;

        let posting = Self {
            order_id: order.id,
            order_type,
            item_id,
            loc_id,
            quantity,
        };
        posting.validate()?;
        Ok(posting)
    }

    /// Like `from_order`, but also requires the order to be of `expected` type.
    pub fn for_type(order: &orders::Model, expected: OrderType) -> Result<Self, ServiceError> {
        let posting = Self::from_order(order)?;
        if posting.order_type != expected {
            return Err(ServiceError::ValidationError(format!(
                "Order {} is a {} order, expected {}",
                order.id, posting.order_type, expected
            )));
        }
        Ok(posting)
    }
}

/// Usage and return postings name the lot explicitly.
pub fn require_lot(order_type: OrderType, inv_id: Option<i32>) -> Result<i32, ServiceError> {
    inv_id.ok_or_else(|| {
        ServiceError::ValidationError(format!("A {} posting requires an inventory lot", order_type))
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptPosting {
    pub lot: inventory::Model,
    pub transaction: inventory_trx::Model,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsagePosting {
    pub lot: inventory::Model,
    pub usage_link: usage_inventory::Model,
    pub transaction: inventory_trx::Model,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnPosting {
    pub lot: inventory::Model,
    pub return_record: return_inventory::Model,
    pub transaction: inventory_trx::Model,
    /// What is still returnable against the same usage link afterwards.
    pub remaining_returnable: i32,
}

/// One FIFO step of a transfer: quantity moved out of a source lot into a
/// destination lot.
#[derive(Debug, Clone, Serialize)]
pub struct TransferLeg {
    pub source: inventory::Model,
    pub destination: inventory::Model,
    pub quantity: i32,
    pub outbound: inventory_trx::Model,
    pub inbound: inventory_trx::Model,
    /// True when the destination lot already existed.
    pub merged: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferPosting {
    pub from_loc_id: i32,
    pub to_loc_id: i32,
    pub legs: Vec<TransferLeg>,
}

impl TransferPosting {
    pub fn quantity(&self) -> i32 {
        self.legs.iter().map(|leg| leg.quantity).sum()
    }
}

/// Outcome of posting one order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "order_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerPosting {
    Receipt(ReceiptPosting),
    Usage(UsagePosting),
    Return(ReturnPosting),
    Transfer(TransferPosting),
}

impl LedgerPosting {
    pub fn order_type(&self) -> OrderType {
        match self {
            LedgerPosting::Receipt(_) => OrderType::Receipt,
            LedgerPosting::Usage(_) => OrderType::Usage,
            LedgerPosting::Return(_) => OrderType::Return,
            LedgerPosting::Transfer(_) => OrderType::Transfer,
        }
    }

    /// Every ledger row the posting appended, in write order.
    pub fn transactions(&self) -> Vec<&inventory_trx::Model> {
        match self {
            LedgerPosting::Receipt(p) => vec![&p.transaction],
            LedgerPosting::Usage(p) => vec![&p.transaction],
            LedgerPosting::Return(p) => vec![&p.transaction],
            LedgerPosting::Transfer(p) => p
                .legs
                .iter()
                .flat_map(|leg| [&leg.outbound, &leg.inbound])
                .collect(),
        }
    }

    /// Net change in on-hand quantity for the item (zero for transfers).
    pub fn net_quantity(&self) -> i64 {
        self.transactions().iter().map(|trx| i64::from(trx.qty)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn order(order_type: &str, qty: Option<i32>) -> orders::Model {
        orders::Model {
            id: 7,
            order_no: "ORD-7".into(),
            order_type: order_type.into(),
            item_id: Some(1),
            loc_id: Some(2),
            actual_qty: qty,
            status: "OPEN".into(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn builds_posting_from_complete_order() {
        let posting = PostingOrder::from_order(&order("RECEIPT", Some(100))).unwrap();
        assert_eq!(posting.order_type, OrderType::Receipt);
        assert_eq!(posting.item_id, 1);
        assert_eq!(posting.loc_id, 2);
        assert_eq!(posting.quantity, 100);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        assert_matches!(
            PostingOrder::from_order(&order("USAGE", Some(0))),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            PostingOrder::from_order(&order("USAGE", Some(-3))),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            PostingOrder::from_order(&order("USAGE", None)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn rejects_missing_location_and_unknown_type() {
        let mut no_loc = order("TRANSFER", Some(5));
        no_loc.loc_id = None;
        assert_matches!(
            PostingOrder::from_order(&no_loc),
            Err(ServiceError::ValidationError(msg)) if msg.contains("loc_id")
        );

        assert_matches!(
            PostingOrder::from_order(&order("SCRAP", Some(5))),
            Err(ServiceError::ValidationError(msg)) if msg.contains("SCRAP")
        );
    }

    #[test]
    fn for_type_checks_order_type() {
        assert!(PostingOrder::for_type(&order("return", Some(1)), OrderType::Return).is_ok());
        assert_matches!(
            PostingOrder::for_type(&order("RECEIPT", Some(1)), OrderType::Usage),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn usage_and_return_need_a_lot() {
        assert_eq!(require_lot(OrderType::Usage, Some(4)).unwrap(), 4);
        assert_matches!(
            require_lot(OrderType::Return, None),
            Err(ServiceError::ValidationError(_))
        );
    }
}
