use serde::{Deserialize, Serialize};

use crate::seating::SeatTier;

/// Per-tier ticket prices for one show, in major currency units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingTiers {
    pub standard: f64,
    pub premium: f64,
    pub vip: f64,
}

impl PricingTiers {
    pub fn price_for(&self, tier: SeatTier) -> f64 {
        match tier {
            SeatTier::Standard => self.standard,
            SeatTier::Premium => self.premium,
            SeatTier::Vip => self.vip,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.standard >= 0.0 && self.premium >= 0.0 && self.vip >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_lookup() {
        let pricing = PricingTiers {
            standard: 10.0,
            premium: 15.0,
            vip: 25.0,
        };
        assert_eq!(pricing.price_for(SeatTier::Standard), 10.0);
        assert_eq!(pricing.price_for(SeatTier::Vip), 25.0);
        assert!(pricing.is_valid());

        let negative = PricingTiers {
            standard: -1.0,
            premium: 0.0,
            vip: 0.0,
        };
        assert!(!negative.is_valid());
    }
}
