//! Commission tier ladder: progressive payout computation and the
//! contiguity-preserving edit operations.

use super::domain::{CommissionStructure, Tier};

/// Default span of a freshly appended tier.
const DEFAULT_TIER_SPAN: f64 = 100.0;

/// Settable tier fields, carrying the new value. `From` is only settable
/// on the anchor tier; every later `from` is derived from its
/// predecessor's `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierField {
    From(f64),
    To(f64),
    Rate(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum TierError {
    #[error("tier index {index} is out of range")]
    IndexOutOfRange { index: usize },
    #[error("the first tier anchors the ladder at from = 0 and cannot be removed")]
    AnchorRemoval,
    #[error("tier {index} derives its lower bound from the previous tier and cannot set it directly")]
    DerivedLowerBound { index: usize },
    #[error("tier rate {rate} must lie within [0, 100]")]
    RateOutOfRange { rate: f64 },
    #[error("tier upper bound {to} must exceed its lower bound {from}")]
    InvalidSpan { from: f64, to: f64 },
}

impl CommissionStructure {
    /// Progressive payout for a qualifying measure: the marginal portion
    /// of `measure` inside each band is taxed at that band's rate.
    pub fn payout_for(&self, measure: f64) -> f64 {
        let mut payout = 0.0;
        for tier in &self.tiers {
            if measure <= tier.from {
                break;
            }
            let upper = if measure < tier.to { measure } else { tier.to };
            payout += (upper - tier.from) * tier.rate / 100.0;
        }
        payout
    }

    /// Append a tier continuing where the ladder ends. An empty ladder
    /// gains its anchor tier at `from = 0`.
    pub fn add_tier(&mut self) -> Tier {
        let from = self.tiers.last().map(|tier| tier.to).unwrap_or(0.0);
        let tier = Tier {
            from,
            to: from + DEFAULT_TIER_SPAN,
            rate: 0.0,
        };
        self.tiers.push(tier);
        tier
    }

    /// Remove an interior or trailing tier; the following tier (if any)
    /// re-derives its `from` to keep the ladder contiguous. The anchor
    /// tier at index 0 is never removable.
    pub fn remove_tier(&mut self, index: usize) -> Result<Tier, TierError> {
        if index == 0 {
            return Err(TierError::AnchorRemoval);
        }
        if index >= self.tiers.len() {
            return Err(TierError::IndexOutOfRange { index });
        }
        let removed = self.tiers.remove(index);
        if index < self.tiers.len() {
            self.tiers[index].from = self.tiers[index - 1].to;
        }
        Ok(removed)
    }

    /// Apply one field edit. Setting `To` re-derives the next tier's
    /// `from`; `Rate` is bounds-checked; `From` only applies at index 0.
    pub fn update_tier(&mut self, index: usize, change: TierField) -> Result<(), TierError> {
        if index >= self.tiers.len() {
            return Err(TierError::IndexOutOfRange { index });
        }
        match change {
            TierField::From(from) => {
                if index != 0 {
                    return Err(TierError::DerivedLowerBound { index });
                }
                let to = self.tiers[0].to;
                if to <= from {
                    return Err(TierError::InvalidSpan { from, to });
                }
                self.tiers[0].from = from;
            }
            TierField::To(to) => {
                let from = self.tiers[index].from;
                if to <= from {
                    return Err(TierError::InvalidSpan { from, to });
                }
                self.tiers[index].to = to;
                if index + 1 < self.tiers.len() {
                    self.tiers[index + 1].from = to;
                }
            }
            TierField::Rate(rate) => {
                if !(0.0..=100.0).contains(&rate) {
                    return Err(TierError::RateOutOfRange { rate });
                }
                self.tiers[index].rate = rate;
            }
        }
        Ok(())
    }
}
