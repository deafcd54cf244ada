//! End-to-end exercise of `assemble_block` across two slots: genesis, a
//! producer's first commit, a second producer's reveal + transfer inclusion.

use argh_consensus::{Block, Chain};
use argh_core::{compute_txid, signing_message, Action, Address, Amount, Asset, FlareClass};
use argh_crypto::eth::EthKeyPair;
use argh_crypto::ValidatorKeyPair;
use argh_genesis::{build_genesis, GenesisParams};
use argh_node::{assemble_block, OracleObservation};

fn genesis_params_with_signer(signer: Address, amount: Amount) -> GenesisParams {
    let mut params = GenesisParams::default();
    params.recipient_one = signer;
    params.recipient_one_amount = amount;
    params
}

fn observation(slot: u64) -> OracleObservation {
    OracleObservation {
        id: "flare-1".to_string(),
        slot,
        class: FlareClass::A,
        flux: "1".to_string(),
        geomag: "1".to_string(),
        oracle_signature: "unused-in-this-test".to_string(),
    }
}

#[test]
fn first_slot_commits_and_second_reveals_with_transfer_included() {
    let alice = EthKeyPair::generate();
    let bob = EthKeyPair::generate();
    let params = genesis_params_with_signer(alice.address, Amount::from_whole(100));

    let genesis = build_genesis(&params);
    let mut chain = Chain::new();
    chain.push(genesis);
    let protocol = chain.protocol().cloned().unwrap();

    let producer_one = ValidatorKeyPair::generate();
    let producer_two = ValidatorKeyPair::generate();

    let assembled_one = assemble_block(
        &chain,
        &[],
        &protocol,
        &producer_one,
        1,
        &observation(1),
    );
    assert!(assembled_one.block.flare_commit.is_some());
    assert!(assembled_one.included_txids.is_empty());
    chain.push(assembled_one.block.clone());

    let transfer_action = Action::Transfer {
        asset: Asset::new("ARGH"),
        amount: Amount::from_whole(10),
        to: bob.address,
    };
    let txid = compute_txid(&transfer_action, 0, protocol.chain_id);
    let mut transfer = argh_core::Transaction {
        txid,
        sender: alice.address,
        action: transfer_action,
        nonce: 0,
        chain_id: protocol.chain_id,
        timestamp: 0,
        signature: None,
    };
    let message = signing_message(&transfer);
    transfer.signature = Some(alice.personal_sign(&message));

    let mempool_txs = vec![assembled_one.reveal_tx.clone(), transfer];

    let assembled_two = assemble_block(
        &chain,
        &mempool_txs,
        &protocol,
        &producer_two,
        2,
        &observation(2),
    );

    assert!(assembled_two
        .included_txids
        .contains(&assembled_one.reveal_tx.txid));
    assert!(assembled_two.included_txids.len() >= mempool_txs.len());
    assert!(assembled_two.invalidated_txids.is_empty());
    chain.push(assembled_two.block);

    let balances = chain.compute_balances();
    let bob_balance = balances.get(bob.address, &protocol.native_asset);
    assert_eq!(bob_balance, Amount::from_whole(10));

    let alice_balance = balances.get(alice.address, &protocol.native_asset);
    assert!(alice_balance < Amount::from_whole(90));
}

#[test]
fn out_of_order_nonce_is_left_for_a_later_block() {
    let alice = EthKeyPair::generate();
    let params = genesis_params_with_signer(alice.address, Amount::from_whole(100));
    let genesis = build_genesis(&params);
    let mut chain = Chain::new();
    chain.push(genesis);
    let protocol = chain.protocol().cloned().unwrap();
    let producer = ValidatorKeyPair::generate();

    let action = Action::Transfer {
        asset: Asset::new("ARGH"),
        amount: Amount::from_whole(5),
        to: Address::from_bytes([0xAB; 20]),
    };
    let txid = compute_txid(&action, 1, protocol.chain_id);
    let mut tx = argh_core::Transaction {
        txid,
        sender: alice.address,
        action,
        nonce: 1,
        chain_id: protocol.chain_id,
        timestamp: 0,
        signature: None,
    };
    let message = signing_message(&tx);
    tx.signature = Some(alice.personal_sign(&message));

    let assembled = assemble_block(&chain, &[tx], &protocol, &producer, 1, &observation(1));
    assert!(assembled.included_txids.is_empty());
    assert!(assembled.invalidated_txids.is_empty());
}
