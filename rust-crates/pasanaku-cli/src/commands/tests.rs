#![allow(non_snake_case)]

use super::*;
use pasanaku_view::{
    actions::ReceiptStatus,
    assets::{
        AssetRegistry,
        AssetTable,
    },
    game::{
        PlayersTuple,
        RawGame,
    },
    test_helpers::FakeContract,
};
use std::sync::Arc;

const NOW: u64 = 1_800_000_000;
const FEE: u128 = 1_000;

fn account(byte: u8) -> Address {
    Address::new([byte; 20])
}

fn usdc() -> Address {
    account(0xaa)
}

fn pasanaku() -> Address {
    account(0x42)
}

/// Game 4: three players, account(1) receives this round.
fn game() -> RawGame {
    RawGame::Players(PlayersTuple {
        players: (1..=3).map(account).collect(),
        asset: usdc(),
        amount: 50_000000,
        player_count: 3,
        current_player_index: 0,
        creator: account(1),
        total_deposited: 0,
        token_id: 4,
        ended: false,
        created_at: 1_736_035_200,
        last_updated_at: NOW - 60,
    })
}

fn contract() -> FakeContract {
    FakeContract::new()
        .with_game(game())
        .with_token(usdc(), "USDC", 6)
        .with_protocol_fee(FEE)
}

fn app(contract: FakeContract) -> AppContext<FakeContract> {
    let views = ViewContext::new(contract, AssetRegistry::new(AssetTable::empty()))
        .with_clock(Arc::new(|| NOW));
    AppContext::new(views, pasanaku())
}

fn create_input(players: &str) -> CreateGameInput {
    CreateGameInput {
        asset: usdc().to_string(),
        amount: "25.5".to_string(),
        players: players.to_string(),
    }
}

#[tokio::test]
async fn games__lists_loaded_games() {
    let output = app(contract()).games(None).await.unwrap();
    assert!(output.starts_with("#4"), "{output}");
    assert!(output.contains("USDC"), "{output}");
}

#[tokio::test]
async fn games__viewer_without_shares__lists_nothing() {
    // given
    let contract = contract().with_game_balance(account(2), 4, 1);

    // when
    let holder = app(contract.clone()).games(Some(&account(2))).await.unwrap();
    let outsider = app(contract).games(Some(&account(9))).await.unwrap();

    // then
    assert!(holder.starts_with("#4"), "{holder}");
    assert_eq!(outsider, "No ongoing games");
}

#[tokio::test]
async fn show__viewer__appends_token_balance() {
    let contract = contract().with_token_balance(usdc(), account(2), 75_250000);
    let output = app(contract).show("4", Some(&account(2))).await.unwrap();
    assert!(output.ends_with("Token balance: 75.25 USDC\n"), "{output}");
}

#[tokio::test]
async fn assets__owner__lists_balance_per_asset() {
    // given
    let contract = contract()
        .with_supported_assets(vec![usdc(), Address::ZERO])
        .with_token_balance(usdc(), account(2), 3_000000);

    // when
    let output = app(contract).assets(Some(&account(2))).await.unwrap();

    // then
    assert!(output.contains(&usdc().to_string()), "{output}");
    assert!(output.contains("USDC     Token balance: 3 USDC"), "{output}");
}

#[tokio::test]
async fn show__unknown_game__is_not_found() {
    let err = app(contract()).show("9", None).await.unwrap_err();
    assert_eq!(err.to_string(), "game not found");
}

#[tokio::test]
async fn deposit__approved_payer__sends_deposit_with_fee() {
    // given
    let contract = contract().with_allowance(usdc(), account(2), u128::MAX);
    let app = app(contract.clone());

    // when
    let output = app.deposit("4", &account(2), false).await.unwrap();

    // then
    assert!(output.starts_with("deposit confirmed: 0x0101"), "{output}");
    let sent = contract.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, ContractCall::Deposit { token_id: 4 });
    assert_eq!(sent[0].2, FEE);
}

#[tokio::test]
async fn deposit__allowance_too_low__stops_without_sending() {
    // given
    let contract = contract().with_allowance(usdc(), account(2), 1);
    let app = app(contract.clone());

    // when
    let err = app.deposit("4", &account(2), false).await.unwrap_err();

    // then
    assert!(err.to_string().contains("50 USDC must be approved"), "{err}");
    assert!(contract.sent_transactions().is_empty());
}

#[tokio::test]
async fn deposit__approve_requested__approves_then_deposits() {
    // given
    let contract = contract();
    let app = app(contract.clone());

    // when
    app.deposit("4", &account(2), true).await.unwrap();

    // then
    let sent = contract.sent_transactions();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, ContractCall::Approve { asset: usdc() });
    assert_eq!(sent[0].2, 0);
    assert_eq!(sent[1].1, ContractCall::Deposit { token_id: 4 });
}

#[tokio::test]
async fn deposit__recipient__is_refused() {
    // given
    let contract = contract();
    let app = app(contract.clone());

    // when
    let err = app.deposit("4", &account(1), false).await.unwrap_err();

    // then
    assert!(err.to_string().starts_with("cannot deposit into Pasanaku #4"), "{err}");
    assert!(contract.sent_transactions().is_empty());
}

#[tokio::test]
async fn claim__claimable_recipient__sends_claim() {
    // given
    let contract = contract().with_claimable(4);
    let app = app(contract.clone());

    // when
    let output = app.claim("4", &account(1)).await.unwrap();

    // then
    assert!(output.ends_with("(100 USDC)"), "{output}");
    assert_eq!(
        contract.sent_transactions()[0].1,
        ContractCall::Claim { token_id: 4 }
    );
}

#[tokio::test]
async fn claim__reverted_receipt__reports_failure() {
    // given
    let contract = contract()
        .with_claimable(4)
        .with_receipt(ReceiptStatus::Reverted);
    let app = app(contract);

    // when
    let err = app.claim("4", &account(1)).await.unwrap_err();

    // then
    let message = err.to_string();
    assert!(message.starts_with("claim failed: transaction 0x"), "{message}");
    assert!(message.ends_with("reverted"), "{message}");
}

#[tokio::test]
async fn recover__not_recoverable__is_refused() {
    let contract = contract();
    let err = app(contract.clone())
        .recover("4", &account(2))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Pasanaku #4 cannot be recovered");
    assert!(contract.sent_transactions().is_empty());
}

#[tokio::test]
async fn recover__recoverable__sends_without_fee() {
    // given
    let contract = contract().with_recoverable(4);
    let app = app(contract.clone());

    // when
    app.recover("4", &account(3)).await.unwrap();

    // then
    let sent = contract.sent_transactions();
    assert_eq!(sent[0].1, ContractCall::Recover { token_id: 4 });
    assert_eq!(sent[0].2, 0);
}

#[tokio::test]
async fn create__valid_form__converts_amount_with_asset_decimals() {
    // given
    let contract = contract();
    let app = app(contract.clone());
    let players = format!("{}, {}", account(2), account(3));

    // when
    app.create(create_input(&players)).await.unwrap();

    // then
    let sent = contract.sent_transactions();
    assert_eq!(
        sent[0].1,
        ContractCall::Create {
            asset: usdc(),
            players: vec![account(2), account(3)],
            amount: 25_500000,
        }
    );
    assert_eq!(sent[0].2, FEE);
}

#[tokio::test]
async fn create__invalid_players__reports_form_message() {
    // given
    let contract = contract();
    let app = app(contract.clone());

    // when
    let err = app.create(create_input("0xnope")).await.unwrap_err();

    // then
    assert_eq!(
        err.to_string(),
        "players: Between 1 and 12 valid 0x addresses"
    );
    assert!(contract.sent_transactions().is_empty());
}

#[tokio::test]
async fn approve__sends_unlimited_approval_without_fee() {
    let contract = contract();
    app(contract.clone()).approve(&usdc()).await.unwrap();
    let sent = contract.sent_transactions();
    assert_eq!(sent[0].1, ContractCall::Approve { asset: usdc() });
    assert_eq!(sent[0].2, 0);
}

#[tokio::test]
async fn create__no_allowance__sends_create_without_approval() {
    // given
    let contract = contract();
    let app = app(contract.clone());

    // when
    let output = app.create(create_input(&account(2).to_string())).await.unwrap();

    // then
    assert!(output.starts_with("create confirmed:"), "{output}");
    assert_eq!(contract.reads_of("allowance"), 0);
    let sent = contract.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0].1, ContractCall::Create { .. }));
}

#[tokio::test]
async fn faucet__mints_with_token_decimals_and_no_fee() {
    // given
    let contract = contract();
    let app = app(contract.clone());
    let input = FaucetInput {
        token: usdc().to_string(),
        address: account(2).to_string(),
        amount: "1000".to_string(),
    };

    // when
    let output = app.faucet(input).await.unwrap();

    // then
    assert!(output.contains("(1000 USDC to "), "{output}");
    let sent = contract.sent_transactions();
    assert_eq!(
        sent[0].1,
        ContractCall::Faucet {
            asset: usdc(),
            to: account(2),
            amount: 1_000_000000,
        }
    );
    assert_eq!(sent[0].2, 0);
}

#[tokio::test]
async fn faucet__invalid_address__reports_form_message() {
    // given
    let contract = contract();
    let input = FaucetInput {
        token: usdc().to_string(),
        address: "nope".to_string(),
        amount: "5".to_string(),
    };

    // when
    let err = app(contract.clone()).faucet(input).await.unwrap_err();

    // then
    assert_eq!(err.to_string(), "address: Invalid address");
    assert!(contract.sent_transactions().is_empty());
}
