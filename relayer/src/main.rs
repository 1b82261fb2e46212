// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # GasForward Relayer
//!
//! The off-chain half of the intent flow: users sign purchase and
//! redemption intents, the relayer batches them into submissions, and the
//! ledger verifies every signature before anything moves. This binary
//! packages that flow as a scripted walkthrough against in-memory
//! collaborators, plus key tooling for intent signers.

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use gasforward_contracts::{GasLedger, PurchaseRequest, RedeemRequest};
use gasforward_protocol::bridge::RecordingAggregator;
use gasforward_protocol::chain::PriceBoard;
use gasforward_protocol::config::STABLECOIN_SCALE;
use gasforward_protocol::crypto::keys::Keypair;
use gasforward_protocol::intent::{
    payload_hash, sign_intent, PurchaseIntent, RedeemIntent, SettlementMode,
};
use gasforward_protocol::token::{InMemoryStablecoin, Stablecoin};

use cli::{Commands, DemoArgs, RelayerCli};
use logging::LogFormat;

const CHAIN: &str = "arbitrum";
const REF_PRICE: u64 = 3_000_000_000; // 3,000 stablecoin per native unit

fn main() -> anyhow::Result<()> {
    let cli = RelayerCli::parse();

    match cli.command {
        Commands::Demo(args) => run_demo(args),
        Commands::Keygen => run_keygen(),
        Commands::Version => {
            println!("gasforward-relayer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_keygen() -> anyhow::Result<()> {
    let keypair = Keypair::generate();
    println!("address:    {}", keypair.address());
    println!("public key: {}", keypair.public_key().to_base58());
    println!("secret key: {}", hex::encode(keypair.to_bytes()));
    Ok(())
}

fn run_demo(args: DemoArgs) -> anyhow::Result<()> {
    logging::init_logging(LogFormat::from_str_lossy(&args.log_format));

    // -- actors -------------------------------------------------------------
    let owner = Keypair::generate().address();
    let relayer = Keypair::generate().address();
    let fee_recipient = Keypair::generate().address();
    let ledger_address = Keypair::generate().address();
    let aggregator_address = Keypair::generate().address();
    let user = Keypair::generate();
    let friend = Keypair::generate().address();

    // -- collaborators ------------------------------------------------------
    let token = Arc::new(InMemoryStablecoin::new());
    let prices = Arc::new(PriceBoard::new());
    let aggregator = Arc::new(RecordingAggregator::new(
        token.clone() as Arc<dyn Stablecoin>,
        aggregator_address.clone(),
        ledger_address.clone(),
    ));

    let mut ledger = GasLedger::new(
        ledger_address.clone(),
        owner.clone(),
        relayer.clone(),
        fee_recipient,
        token.clone() as Arc<dyn Stablecoin>,
        prices.clone(),
    );
    ledger
        .set_chain_support(&owner, CHAIN, true)
        .context("allow-listing the demo chain")?;
    ledger
        .set_bridge_aggregator(&owner, aggregator_address, aggregator)
        .context("configuring the bridge aggregator")?;

    // The price feed reports a few observations.
    prices.record(CHAIN, args.lock_price);
    prices.record(CHAIN, args.current_price);

    // The user shows up with stablecoin and approves the ledger.
    let amount = args.amount * STABLECOIN_SCALE;
    token.mint(&user.address(), 10 * amount);
    token
        .approve(&user.address(), &ledger_address, u64::MAX)
        .context("approving the ledger")?;

    // -- purchase -----------------------------------------------------------
    info!(account = %user.address(), amount, lock_price = args.lock_price, "signing purchase intent");
    let timestamp = Utc::now();
    let intent = PurchaseIntent {
        account: user.address(),
        amount,
        chain: CHAIN.into(),
        expiry_days: 30,
        price_gwei: args.lock_price,
        ref_price: REF_PRICE,
        timestamp,
    };
    let signature = sign_intent(&user, &intent.digest()?);
    let credit_id = ledger.purchase(
        &relayer,
        PurchaseRequest {
            account: user.address(),
            amount,
            chain: CHAIN.into(),
            expiry_days: 30,
            price_gwei: args.lock_price,
            ref_price: REF_PRICE,
            intent_timestamp: timestamp,
            signature,
        },
    )?;

    let granted = ledger
        .credit(&user.address(), credit_id)
        .context("credit just purchased is missing")?
        .gas_units;
    info!(credit_id, units = %granted, "credit issued");

    // -- cash redemption ----------------------------------------------------
    let units = granted / 2;
    let timestamp = Utc::now();
    let intent = RedeemIntent {
        account: user.address(),
        credit_id,
        units,
        current_price: args.current_price,
        ref_price: REF_PRICE,
        timestamp,
        payload_hash: payload_hash(b""),
        mode: SettlementMode::Cash,
    };
    let signature = sign_intent(&user, &intent.digest()?);
    let saved = ledger.redeem(
        &relayer,
        RedeemRequest {
            account: user.address(),
            credit_id,
            units,
            current_price: args.current_price,
            ref_price: REF_PRICE,
            intent_timestamp: timestamp,
            signature,
            bridge_payload: Vec::new(),
            mode: SettlementMode::Cash,
        },
    )?;
    info!(saved, "cash redemption paid out");

    // -- transfer -----------------------------------------------------------
    let slice = granted / 4;
    let new_id = ledger.transfer(&user.address(), credit_id, &friend, slice)?;
    info!(to = %friend, new_credit = new_id, units = %slice, "position slice transferred");

    // A refund claim on the live credit fails on purpose — the exit path
    // only opens at expiry.
    if let Err(e) = ledger.claim_expired_refund(&user.address(), credit_id) {
        warn!(error = %e, "refund claim rejected as expected");
    }

    // -- summary ------------------------------------------------------------
    let summary = serde_json::json!({
        "user": user.address(),
        "position": ledger.active_position(&user.address()),
        "friend_position": ledger.active_position(&friend),
        "ledger_balance": ledger.balance(),
        "chain_price": ledger.chain_price(CHAIN),
        "events": ledger.events(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
