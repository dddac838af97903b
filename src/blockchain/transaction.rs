//! Sweep decision and transaction building.
//!
//! # Responsibilities
//! - Decide whether a balance is worth sweeping
//! - Reserve the gas fee with exact integer arithmetic
//! - Build the unsigned value-transfer request

use alloy::network::TransactionBuilder as _;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::types::TransactionRecord;

/// Outcome of evaluating a balance for sweeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDecision {
    /// Balance is below the chain's minimum threshold.
    NoFunds,
    /// The gas fee consumes the whole balance.
    InsufficientAfterGas { fee: U256 },
    /// Transfer `value`, reserving `fee` for gas.
    Transfer { value: U256, fee: U256 },
}

/// Decide what to do with `balance`.
///
/// A balance equal to `min_threshold` is eligible. The fee is
/// `gas_price * gas_limit`, computed in `U256` so it can neither round nor
/// overflow.
pub fn decide(balance: U256, gas_price: u128, gas_limit: u64, min_threshold: U256) -> SweepDecision {
    if balance < min_threshold {
        return SweepDecision::NoFunds;
    }

    let fee = U256::from(gas_price) * U256::from(gas_limit);
    match balance.checked_sub(fee) {
        Some(value) if !value.is_zero() => SweepDecision::Transfer { value, fee },
        _ => SweepDecision::InsufficientAfterGas { fee },
    }
}

/// Builds value transfers from the swept account to the sweep address.
#[derive(Debug, Clone, Copy)]
pub struct TransactionBuilder {
    from: Address,
    to: Address,
    gas_limit: u64,
}

impl TransactionBuilder {
    pub fn new(from: Address, to: Address, gas_limit: u64) -> Self {
        Self { from, to, gas_limit }
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Apply [`decide`] with this builder's gas limit.
    pub fn decide(&self, balance: U256, gas_price: u128, min_threshold: U256) -> SweepDecision {
        decide(balance, gas_price, self.gas_limit, min_threshold)
    }

    /// Describe the legacy transfer for `value`.
    pub fn record(&self, value: U256, gas_price: u128, nonce: u64, chain_id: u64) -> TransactionRecord {
        TransactionRecord {
            from: self.from,
            to: self.to,
            value,
            gas: self.gas_limit,
            gas_price,
            nonce,
            chain_id,
            hash: None,
        }
    }

    /// Build the unsigned request for a record produced by [`Self::record`].
    pub fn request(record: &TransactionRecord) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(record.from)
            .with_to(record.to)
            .with_value(record.value)
            .with_nonce(record.nonce)
            .with_gas_limit(record.gas)
            .with_gas_price(record.gas_price)
            .with_chain_id(record.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GWEI: u128 = 1_000_000_000;

    fn wei(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_below_threshold_is_no_funds() {
        let min = wei(100_000_000_000_000);
        assert_eq!(decide(U256::ZERO, GWEI, 21_000, min), SweepDecision::NoFunds);
        assert_eq!(decide(min - wei(1), GWEI, 21_000, min), SweepDecision::NoFunds);
        // Gas price is irrelevant below the threshold.
        assert_eq!(decide(min - wei(1), 0, 21_000, min), SweepDecision::NoFunds);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let fee = U256::from(GWEI) * wei(21_000);

        // Eligible at the threshold, but gas can still consume all of it.
        assert_eq!(
            decide(fee, GWEI, 21_000, fee),
            SweepDecision::InsufficientAfterGas { fee }
        );
        // With a cheap fee the same boundary transfers.
        assert_eq!(
            decide(fee, 1, 21_000, fee),
            SweepDecision::Transfer {
                value: fee - wei(21_000),
                fee: wei(21_000)
            }
        );
    }

    #[test]
    fn test_fee_consumes_balance() {
        let fee = U256::from(50 * GWEI) * wei(21_000);
        assert_eq!(
            decide(fee - wei(1), 50 * GWEI, 21_000, U256::ZERO),
            SweepDecision::InsufficientAfterGas { fee }
        );
        assert_eq!(
            decide(fee, 50 * GWEI, 21_000, U256::ZERO),
            SweepDecision::InsufficientAfterGas { fee }
        );
    }

    #[test]
    fn test_one_unit_above_fee_and_threshold() {
        let min = wei(100_000_000_000_000);
        let fee = U256::from(30 * GWEI) * wei(21_000);
        let balance = fee + min + wei(1);
        assert_eq!(
            decide(balance, 30 * GWEI, 21_000, min),
            SweepDecision::Transfer {
                value: min + wei(1),
                fee
            }
        );

        // Threshold zero: exactly one wei left after gas.
        assert_eq!(
            decide(fee + wei(1), 30 * GWEI, 21_000, U256::ZERO),
            SweepDecision::Transfer { value: wei(1), fee }
        );
    }

    #[test]
    fn test_exact_arithmetic_on_large_values() {
        // u128::MAX * u64::MAX would overflow 128-bit math.
        let balance = U256::MAX;
        let decision = decide(balance, u128::MAX, u64::MAX, U256::ZERO);
        let fee = U256::from(u128::MAX) * U256::from(u64::MAX);
        assert_eq!(decision, SweepDecision::Transfer { value: U256::MAX - fee, fee });
    }

    #[test]
    fn test_builder_request_fields() {
        let from = Address::repeat_byte(0x01);
        let to = Address::repeat_byte(0x02);
        let builder = TransactionBuilder::new(from, to, 21_000);

        let record = builder.record(wei(5), 7, 9, 11155111);
        assert_eq!(record.gas, 21_000);
        assert_eq!(record.to, to);

        let request = TransactionBuilder::request(&record);
        assert_eq!(request.from, Some(from));
        assert_eq!(request.value, Some(wei(5)));
        assert_eq!(request.gas, Some(21_000));
        assert_eq!(request.gas_price, Some(7));
        assert_eq!(request.nonce, Some(9));
        assert_eq!(request.chain_id, Some(11155111));
    }
}
