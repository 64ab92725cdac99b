#![cfg(not(target_arch = "wasm32"))]

use futures::executor::block_on;

use devnet_mint_adapters::{MintAdapterConfig, PhantomAdapter, RuntimeProfile};
use devnet_mint_core::{
    ConnectOptions, DisplayEncoding, Hash, PendingTransaction, PortError, ProviderEventKind,
    WalletProviderPort, SIGNATURE_LEN,
};

fn sample_tx(adapter: &PhantomAdapter) -> PendingTransaction {
    PendingTransaction::transfer(
        adapter.public_key().expect("connected key"),
        Hash::new_from_array([4; 32]),
    )
}

#[test]
fn silent_connect_requires_trusted_origin() {
    let adapter = PhantomAdapter::default();
    let err = block_on(adapter.connect(ConnectOptions::trusted_only())).expect_err("untrusted");
    assert!(matches!(err, PortError::Untrusted));
    assert!(adapter.public_key().is_none());
    assert!(!adapter.is_connected());

    adapter.debug_set_trusted(true).expect("trust");
    let resp = block_on(adapter.connect(ConnectOptions::trusted_only())).expect("connect");
    assert_eq!(adapter.public_key(), Some(resp.public_key));
}

#[test]
fn prompted_connect_trusts_origin_for_later_silent_connects() {
    let adapter = PhantomAdapter::default();
    block_on(adapter.connect(ConnectOptions::prompt())).expect("prompted connect");
    block_on(adapter.disconnect()).expect("disconnect");
    block_on(adapter.connect(ConnectOptions::trusted_only())).expect("silent reconnect");
    assert!(adapter.is_connected());
}

#[test]
fn notifications_are_queued_only_for_registered_kinds() {
    let adapter = PhantomAdapter::default();
    block_on(adapter.connect(ConnectOptions::prompt())).expect("connect");
    assert!(adapter.drain_events().expect("drain").is_empty());
    block_on(adapter.disconnect()).expect("disconnect");

    adapter.on(ProviderEventKind::Connect).expect("on connect");
    adapter.on(ProviderEventKind::Disconnect).expect("on disconnect");
    adapter.on(ProviderEventKind::Connect).expect("duplicate registration");

    let resp = block_on(adapter.connect(ConnectOptions::prompt())).expect("connect");
    block_on(adapter.disconnect()).expect("disconnect");
    // second disconnect is a no-op and emits nothing
    block_on(adapter.disconnect()).expect("disconnect again");

    let events = adapter.drain_events().expect("drain");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, ProviderEventKind::Connect);
    assert_eq!(events[0].public_key, Some(resp.public_key));
    assert_eq!(events[1].kind, ProviderEventKind::Disconnect);
    assert_eq!(events[0].sequence + 1, events[1].sequence);
    assert!(adapter.drain_events().expect("drain empty").is_empty());

    adapter.remove_all_listeners().expect("release");
    block_on(adapter.connect(ConnectOptions::prompt())).expect("connect");
    assert!(adapter.drain_events().expect("drain").is_empty());
}

#[test]
fn signing_requires_connection() {
    let adapter = PhantomAdapter::default();
    let err = block_on(adapter.sign_message(b"hi", DisplayEncoding::Utf8)).expect_err("not connected");
    assert!(matches!(err, PortError::NotConnected));
}

#[test]
fn signatures_are_deterministic_and_embedded_in_wire() {
    let adapter = PhantomAdapter::default();
    block_on(adapter.connect(ConnectOptions::prompt())).expect("connect");
    let tx = sample_tx(&adapter);

    let a = block_on(adapter.sign_transaction(&tx)).expect("sign");
    let b = block_on(adapter.sign_transaction(&tx)).expect("sign again");
    assert_eq!(a, b);
    assert_eq!(a.wire[0], 1);
    assert_eq!(&a.wire[1..1 + SIGNATURE_LEN], a.signature.as_bytes());

    let batch = block_on(adapter.sign_all_transactions(&[tx.clone(), tx])).expect("batch");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].signature, a.signature);
}

#[test]
fn message_signature_comes_from_connected_key() {
    let adapter = PhantomAdapter::default();
    block_on(adapter.connect(ConnectOptions::prompt())).expect("connect");
    let key = adapter.public_key().expect("connected key");

    let utf8 = block_on(adapter.sign_message(b"hello", DisplayEncoding::Utf8)).expect("sign");
    let hex = block_on(adapter.sign_message(b"hello", DisplayEncoding::Hex)).expect("sign");
    assert_eq!(utf8.public_key, key);
    // display encoding only changes the prompt, not the signed bytes
    assert_eq!(utf8.signature, hex.signature);

    let other = block_on(adapter.sign_message(b"goodbye", DisplayEncoding::Utf8)).expect("sign");
    assert_ne!(other.signature, utf8.signature);
}

#[test]
fn rejecting_user_declines_every_prompt() {
    let adapter = PhantomAdapter::default();
    block_on(adapter.connect(ConnectOptions::prompt())).expect("connect");
    adapter.debug_reject_requests(true).expect("reject");
    let tx = sample_tx(&adapter);

    assert!(matches!(
        block_on(adapter.sign_transaction(&tx)),
        Err(PortError::Rejected(_))
    ));
    assert!(matches!(
        block_on(adapter.sign_all_transactions(&[tx])),
        Err(PortError::Rejected(_))
    ));
    assert!(matches!(
        block_on(adapter.sign_message(b"hi", DisplayEncoding::Utf8)),
        Err(PortError::Rejected(_))
    ));
}

#[test]
fn production_profile_disables_deterministic_wallet() {
    let cfg = MintAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        ..MintAdapterConfig::default()
    };
    let adapter = PhantomAdapter::deterministic(&cfg);
    let err = block_on(adapter.connect(ConnectOptions::prompt())).expect_err("disabled");
    assert!(matches!(err, PortError::Policy(_)));
    assert!(adapter.public_key().is_none());
}
