//! End-to-end wallet scenarios against the in-memory explorer.
//!
//! Covers:
//! - balance classification and snapshot replacement across refreshes
//! - failed refresh keeping the previous balance
//! - serialized concurrent refreshes
//! - building, sending, and the post-send refresh
//! - the fee actually paid, from held coins

use std::sync::Arc;

use ccw_core::constants::COIN;
use ccw_core::error::TransportError;
use ccw_core::money::Money;
use ccw_tests::helpers::{
    MockClient, bitcoin_wallet, coin, dec, flat_wallet, testnet_destination,
};
use ccw_wallet::{BroadcastOutcome, SendOutcome, WalletError};

#[tokio::test]
async fn refresh_classifies_by_depth() {
    let client = MockClient::with_coins(vec![
        coin(1, 10_000_000, 0),
        coin(2, 20_000_000, 1),
        coin(3, 30_000_000, 5),
        coin(4, 40_000_000, 6),
        coin(5, 50_000_000, 600),
    ]);
    let wallet = flat_wallet(client);

    let snapshot = wallet.refresh_balance().await.unwrap();
    assert_eq!(snapshot.unconfirmed, Money::from_units(10_000_000));
    assert_eq!(snapshot.pending, Money::from_units(50_000_000));
    assert_eq!(snapshot.confirmed, Money::from_units(90_000_000));
    assert_eq!(snapshot.total(), Money::from_units(140_000_000));
    assert_eq!(snapshot.coins.len(), 2);

    assert_eq!(wallet.total_balance(), "1.40000000 FLT");
    assert_eq!(wallet.unconfirmed_balance(), "0.10000000 FLT");
}

#[tokio::test]
async fn repeated_refresh_is_idempotent() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6), coin(2, COIN, 2)]);
    let wallet = flat_wallet(client);

    let first = wallet.refresh_balance().await.unwrap();
    let second = wallet.refresh_balance().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(wallet.balance(), second);
}

#[tokio::test]
async fn refresh_replaces_rather_than_merges() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6), coin(2, COIN, 6)]);
    let wallet = flat_wallet(client.clone());
    wallet.refresh_balance().await.unwrap();
    assert_eq!(wallet.balance().coins.len(), 2);

    client.set_coins(vec![coin(3, 5 * COIN, 7)]);
    let snapshot = wallet.refresh_balance().await.unwrap();
    assert_eq!(snapshot.coins.len(), 1);
    assert_eq!(snapshot.coins[0], coin(3, 5 * COIN, 7));
    assert_eq!(snapshot.confirmed, Money::from_units(5 * COIN));
}

#[tokio::test]
async fn empty_result_zeroes_everything() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6)]);
    let wallet = flat_wallet(client.clone());
    wallet.refresh_balance().await.unwrap();

    client.set_coins(Vec::new());
    let snapshot = wallet.refresh_balance().await.unwrap();
    assert_eq!(snapshot.total(), Money::ZERO);
    assert_eq!(snapshot.unconfirmed, Money::ZERO);
    assert!(snapshot.coins.is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6)]);
    let wallet = flat_wallet(client.clone());
    let before = wallet.refresh_balance().await.unwrap();

    client.set_coins(Vec::new());
    client.fail_queries(Some(TransportError::Io("connection reset".into())));
    let err = wallet.refresh_balance().await.unwrap_err();
    assert_eq!(
        err,
        WalletError::Query(TransportError::Io("connection reset".into()))
    );
    assert_eq!(wallet.balance(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refreshes_settle_on_a_whole_snapshot() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6), coin(2, 2 * COIN, 1)]);
    let wallet = Arc::new(flat_wallet(client.clone()));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let wallet = Arc::clone(&wallet);
            tokio::spawn(async move { wallet.refresh_balance().await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let snapshot = wallet.balance();
    assert_eq!(client.query_count(), 16);
    assert_eq!(snapshot.confirmed, Money::from_units(COIN));
    assert_eq!(snapshot.pending, Money::from_units(2 * COIN));
    assert_eq!(snapshot.coins, vec![coin(1, COIN, 6)]);
}

#[tokio::test]
async fn one_coin_half_spend() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6)]);
    let wallet = flat_wallet(client);
    wallet.refresh_balance().await.unwrap();

    let built = wallet
        .build_transaction(&testnet_destination(), dec("0.5"))
        .unwrap();
    assert_eq!(built.payment, Money::from_units(50_000_000));
    assert_eq!(built.change, Money::from_units(49_990_000));
    assert_eq!(built.fee, Money::from_units(10_000));
    assert_eq!(built.tx.output.len(), 2);
    assert_eq!(built.tx.output[1].script_pubkey, wallet.address().script_pubkey());

    // Building leaves the held coins alone.
    assert_eq!(wallet.balance().coins.len(), 1);
}

#[tokio::test]
async fn only_confirmed_coins_are_spent() {
    let client = MockClient::with_coins(vec![
        coin(1, COIN, 6),
        coin(2, 10 * COIN, 3),
        coin(3, 10 * COIN, 0),
    ]);
    let wallet = flat_wallet(client);
    wallet.refresh_balance().await.unwrap();

    let built = wallet
        .build_transaction(&testnet_destination(), dec("0.1"))
        .unwrap();
    assert_eq!(built.tx.input.len(), 1);
    assert_eq!(built.tx.input[0].previous_output, coin(1, COIN, 6).outpoint);

    let err = wallet
        .build_transaction(&testnet_destination(), dec("2"))
        .unwrap_err();
    assert_eq!(
        err,
        WalletError::InsufficientFunds {
            have: COIN,
            need: 2 * COIN + 10_000
        }
    );
}

#[tokio::test]
async fn accepted_send_refreshes_balance() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6)]);
    let wallet = flat_wallet(client.clone());
    wallet.refresh_balance().await.unwrap();

    client.set_coins(vec![coin(9, 49_990_000, 0)]);
    let outcome = wallet
        .send(&testnet_destination(), dec("0.5"))
        .await
        .unwrap();

    let sent = client.broadcasts();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        outcome,
        SendOutcome {
            broadcast: BroadcastOutcome::Accepted {
                txid: sent[0].compute_txid()
            },
            refresh_error: None,
        }
    );
    assert_eq!(client.query_count(), 2);
    assert_eq!(wallet.balance().unconfirmed, Money::from_units(49_990_000));
    assert_eq!(wallet.balance().confirmed, Money::ZERO);
}

#[tokio::test]
async fn rejected_send_does_not_refresh() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6)]);
    let wallet = flat_wallet(client.clone());
    wallet.refresh_balance().await.unwrap();

    client.fail_broadcasts(Some(TransportError::Http {
        status: 400,
        body: "insufficient priority".into(),
    }));
    let outcome = wallet
        .send(&testnet_destination(), dec("0.5"))
        .await
        .unwrap();
    assert_eq!(
        outcome.broadcast,
        BroadcastOutcome::Rejected {
            message: "insufficient priority".into()
        }
    );
    assert_eq!(outcome.refresh_error, None);
    assert_eq!(client.query_count(), 1);
}

#[tokio::test]
async fn accepted_send_reports_failed_refresh() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6)]);
    let wallet = flat_wallet(client.clone());
    wallet.refresh_balance().await.unwrap();

    let reset = TransportError::Io("connection reset".into());
    client.fail_queries(Some(reset.clone()));
    let outcome = wallet
        .send(&testnet_destination(), dec("0.5"))
        .await
        .unwrap();

    assert!(outcome.broadcast.is_accepted());
    assert_eq!(client.broadcasts().len(), 1);
    assert_eq!(outcome.refresh_error, Some(WalletError::Query(reset)));
    // The stale balance is kept until the next successful refresh.
    assert_eq!(wallet.balance().confirmed, Money::from_units(COIN));
}

#[tokio::test]
async fn fee_of_built_transaction() {
    let client = MockClient::with_coins(vec![coin(1, COIN, 6), coin(2, COIN, 6)]);
    let wallet = bitcoin_wallet(client.clone());
    wallet.refresh_balance().await.unwrap();

    let built = wallet
        .build_transaction(&testnet_destination(), dec("1.5"))
        .unwrap();
    assert_eq!(built.tx.output.len(), 2);
    assert_eq!(wallet.get_fee(&built.tx), Some(built.fee));

    // Once the coins are gone from the held set the fee cannot be recomputed.
    client.set_coins(Vec::new());
    wallet.refresh_balance().await.unwrap();
    assert_eq!(wallet.get_fee(&built.tx), None);
}

#[tokio::test]
async fn fee_of_exact_spend_is_what_was_paid() {
    // One input and two outputs at 20_000 per kB is 4_520, leaving no change.
    let client = MockClient::with_coins(vec![coin(1, 50_004_520, 6)]);
    let wallet = bitcoin_wallet(client);
    wallet.refresh_balance().await.unwrap();

    let built = wallet
        .build_transaction(&testnet_destination(), dec("0.5"))
        .unwrap();
    assert!(built.change.is_zero());
    assert_eq!(built.tx.output.len(), 1);
    assert_eq!(built.fee, Money::from_units(4_520));
    assert_eq!(wallet.get_fee(&built.tx), Some(Money::from_units(4_520)));
}
