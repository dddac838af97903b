//! Sweep attempts against a scripted chain.

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, U256};

use balance_sweeper::blockchain::ChainError;
use balance_sweeper::sweep::SweepOutcome;

mod common;
use common::*;

fn fee(gas_price: u128) -> U256 {
    U256::from(gas_price) * U256::from(21_000u64)
}

#[tokio::test]
async fn test_zero_balance_is_noop() {
    let endpoint = MockEndpoint::new(U256::ZERO);
    let op = operation(chain_settings("Local"), endpoint.clone());

    assert!(matches!(op.run().await, SweepOutcome::NoOp));
    assert_eq!(endpoint.gas_price_reads(), 0, "no gas price read below threshold");
    assert_eq!(endpoint.broadcasts(), 0);
}

#[tokio::test]
async fn test_below_threshold_is_noop() {
    let endpoint = MockEndpoint::new(min_sweep() - U256::from(1));
    let op = operation(chain_settings("Local"), endpoint.clone());

    assert!(matches!(op.run().await, SweepOutcome::NoOp));
    assert_eq!(endpoint.broadcasts(), 0);
}

#[tokio::test]
async fn test_threshold_balance_eaten_by_gas() {
    // Exactly at the threshold is eligible, but 20 gwei * 21000 > 0.0001 ether.
    let endpoint = MockEndpoint::new(min_sweep());
    let op = operation(chain_settings("Local"), endpoint.clone());

    assert!(matches!(op.run().await, SweepOutcome::InsufficientAfterGas));
    assert_eq!(endpoint.gas_price_reads(), 1);
    assert_eq!(endpoint.broadcasts(), 0);
}

#[tokio::test]
async fn test_sweeps_balance_minus_fee() {
    let balance = fee(20 * GWEI) + min_sweep() + U256::from(1);
    let endpoint = MockEndpoint::new(balance);
    let op = operation(chain_settings("Local"), endpoint.clone());

    let outcome = op.run().await;
    let SweepOutcome::Swept(hash) = outcome else {
        panic!("expected Swept, got {:?}", outcome);
    };
    assert_eq!(endpoint.broadcasts(), 1);

    let raw = endpoint.raw_txs().remove(0);
    assert_eq!(hash, keccak256(&raw));

    let tx = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
    assert_eq!(tx.to(), Some(sweep_address()));
    assert_eq!(tx.value(), min_sweep() + U256::from(1));
    assert_eq!(tx.gas_limit(), 21_000);
    assert_eq!(tx.gas_price(), Some(20 * GWEI));
    assert_eq!(tx.chain_id(), Some(31337));
    assert_eq!(tx.nonce(), 0);
}

#[tokio::test]
async fn test_custom_gas_limit_is_used() {
    let mut settings = chain_settings("L2");
    settings.gas_limit = 50_000;
    let endpoint = MockEndpoint::new(ether());
    endpoint.set_gas_price(GWEI);
    let op = operation(settings, endpoint.clone());

    assert!(matches!(op.run().await, SweepOutcome::Swept(_)));
    let raw = endpoint.raw_txs().remove(0);
    let tx = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
    assert_eq!(tx.gas_limit(), 50_000);
    assert_eq!(tx.value(), ether() - U256::from(GWEI) * U256::from(50_000u64));
}

#[tokio::test]
async fn test_second_run_after_debit_is_noop() {
    let endpoint = MockEndpoint::new(ether());
    let op = operation(chain_settings("Local"), endpoint.clone());

    assert!(matches!(op.run().await, SweepOutcome::Swept(_)));
    assert!(matches!(op.run().await, SweepOutcome::NoOp));
    assert_eq!(endpoint.broadcasts(), 1);
}

#[tokio::test]
async fn test_balance_read_failure() {
    let endpoint = MockEndpoint::new(ether());
    endpoint.fail_next_balance_read();
    let op = operation(chain_settings("Local"), endpoint.clone());

    let outcome = op.run().await;
    assert!(matches!(outcome, SweepOutcome::Failed(ChainError::Network(_))));
    assert_eq!(endpoint.broadcasts(), 0);
}

#[tokio::test]
async fn test_gas_price_failure() {
    let endpoint = MockEndpoint::new(ether());
    endpoint.fail_gas_price(true);
    let op = operation(chain_settings("Local"), endpoint.clone());

    assert!(matches!(op.run().await, SweepOutcome::Failed(ChainError::Network(_))));
    assert_eq!(endpoint.broadcasts(), 0);
}

#[tokio::test]
async fn test_rejected_broadcast_is_not_retried() {
    let endpoint = MockEndpoint::new(ether());
    endpoint.reject_broadcasts("nonce too low");
    let op = operation(chain_settings("Local"), endpoint.clone());

    let outcome = op.run().await;
    let SweepOutcome::Failed(ChainError::Submission(reason)) = outcome else {
        panic!("expected submission failure, got {:?}", outcome);
    };
    assert_eq!(reason, "nonce too low");
    assert_eq!(endpoint.broadcasts(), 0);
    assert_eq!(endpoint.balance_reads(), 1);
}
