//! Runner delivery pricing
//!
//! The runner's price for a delivery is fixed the moment a runner is
//! bound to the order and never recomputed afterwards, even if pricing
//! configuration changes mid-flight.

use rust_decimal::Decimal;

use crate::core::config::Config;
use crate::orders::money::round_money;

/// Runner earning for an order.
///
/// Delivery fee minus the platform cut, or the flat default when the
/// order carries no delivery fee.
pub fn delivery_price(config: &Config, delivery_fee: Decimal) -> Decimal {
    if delivery_fee <= Decimal::ZERO {
        return config.default_delivery_price;
    }
    let cut = delivery_fee * config.platform_cut_percent / Decimal::from(100);
    round_money(delivery_fee - cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn test_price_deducts_platform_cut() {
        let config = Config::for_tests();
        // 500 - 37.5% of 500 = 312.5
        let price = delivery_price(&config, Decimal::from(500));
        assert_eq!(price, Decimal::from_f64(312.5).unwrap());
    }

    #[test]
    fn test_zero_fee_falls_back_to_default() {
        let config = Config::for_tests();
        assert_eq!(
            delivery_price(&config, Decimal::ZERO),
            config.default_delivery_price
        );
    }

    #[test]
    fn test_price_rounds_to_two_places() {
        let mut config = Config::for_tests();
        config.platform_cut_percent = Decimal::from(33);
        // 100 - 33 = 67.00
        assert_eq!(
            delivery_price(&config, Decimal::from(100)),
            Decimal::from(67)
        );
        // 99.99 * 0.67 = 66.9933 -> 66.99
        assert_eq!(
            delivery_price(&config, Decimal::from_f64(99.99).unwrap()),
            Decimal::from_f64(66.99).unwrap()
        );
    }
}
