//! Money arithmetic and FIFO layer planning for the inventory ledger.
//!
//! Everything here is pure: no database access, no clocks. The ledger service
//! calls into these helpers so that the rounding rules and the FIFO walk can be
//! tested without a connection.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary columns are stored as decimal(15,2).
pub const MONEY_SCALE: u32 = 2;

/// Rounds a monetary amount to two decimals, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `round(quantity * unit_cost, 2)`, sign preserving.
pub fn line_total(quantity: i32, unit_cost: Decimal) -> Decimal {
    round_money(Decimal::from(quantity) * unit_cost)
}

/// Adds an inbound quantity to a lot, failing on i32 overflow.
pub fn add_quantity(current: i32, inbound: i32) -> Option<i32> {
    current.checked_add(inbound)
}

/// Removes an outbound quantity from a lot; `None` if the lot would go negative.
pub fn remove_quantity(current: i32, outbound: i32) -> Option<i32> {
    current.checked_sub(outbound).filter(|remaining| *remaining >= 0)
}

/// One cost layer available to a FIFO walk, already in consumption order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    pub lot_id: i32,
    pub available: i32,
}

/// Quantity taken from a single layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerDraw {
    pub lot_id: i32,
    pub quantity: i32,
}

/// The layers could not cover the requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub available: i64,
    pub requested: i32,
}

/// Total quantity across layers, widened so that many large lots cannot overflow.
pub fn available_total(layers: &[Layer]) -> i64 {
    layers.iter().map(|layer| i64::from(layer.available.max(0))).sum()
}

/// Walks `layers` oldest first and returns how much to take from each.
///
/// Layers with nothing on hand are skipped. The walk stops as soon as the
/// requested quantity is covered, so later layers are left untouched.
pub fn plan_fifo(layers: &[Layer], requested: i32) -> Result<Vec<LayerDraw>, Shortfall> {
    let available = available_total(layers);
    if available < i64::from(requested) {
        return Err(Shortfall {
            available,
            requested,
        });
    }

    let mut remaining = requested;
    let mut draws = Vec::new();
    for layer in layers {
        if remaining == 0 {
            break;
        }
        if layer.available <= 0 {
            continue;
        }
        let take = layer.available.min(remaining);
        draws.push(LayerDraw {
            lot_id: layer.lot_id,
            quantity: take,
        });
        remaining -= take;
    }

    Ok(draws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(5), dec!(5.00))]
    #[case(dec!(2.345), dec!(2.35))]
    #[case(dec!(2.344), dec!(2.34))]
    #[case(dec!(-2.345), dec!(-2.35))]
    #[case(dec!(0.005), dec!(0.01))]
    fn rounds_half_away_from_zero(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn line_total_preserves_sign() {
        assert_eq!(line_total(100, dec!(5.00)), dec!(500.00));
        assert_eq!(line_total(-30, dec!(5.00)), dec!(-150.00));
        assert_eq!(line_total(0, dec!(5.00)), dec!(0.00));
        assert_eq!(line_total(3, dec!(0.33)), dec!(0.99));
    }

    #[test]
    fn remove_quantity_refuses_to_go_negative() {
        assert_eq!(remove_quantity(10, 10), Some(0));
        assert_eq!(remove_quantity(10, 4), Some(6));
        assert_eq!(remove_quantity(3, 4), None);
        assert_eq!(add_quantity(i32::MAX, 1), None);
    }

    #[test]
    fn fifo_consumes_oldest_layers_first() {
        let layers = [
            Layer { lot_id: 1, available: 5 },
            Layer { lot_id: 2, available: 5 },
            Layer { lot_id: 3, available: 5 },
        ];
        let draws = plan_fifo(&layers, 12).unwrap();
        assert_eq!(
            draws,
            vec![
                LayerDraw { lot_id: 1, quantity: 5 },
                LayerDraw { lot_id: 2, quantity: 5 },
                LayerDraw { lot_id: 3, quantity: 2 },
            ]
        );
    }

    #[test]
    fn fifo_skips_empty_layers_and_stops_early() {
        let layers = [
            Layer { lot_id: 1, available: 0 },
            Layer { lot_id: 2, available: 8 },
            Layer { lot_id: 3, available: 5 },
        ];
        let draws = plan_fifo(&layers, 8).unwrap();
        assert_eq!(draws, vec![LayerDraw { lot_id: 2, quantity: 8 }]);
    }

    #[test]
    fn fifo_reports_shortfall() {
        let layers = [Layer { lot_id: 1, available: 4 }, Layer { lot_id: 2, available: 3 }];
        assert_eq!(
            plan_fifo(&layers, 8),
            Err(Shortfall {
                available: 7,
                requested: 8
            })
        );
    }
}
