//! Plain-text rendering of loaded views for the terminal.

use pasanaku_view::{
    Address,
    GameSummary,
    amount::format_amount,
    assets::AssetMetadata,
    context::{
        DepositRow,
        DepositState,
        GameView,
        ListItem,
        SupportedAsset,
    },
    eligibility::{
        Affordance,
        Recovery,
    },
};
use std::fmt::Write;

pub fn supported_assets(assets: &[SupportedAsset]) -> String {
    if assets.is_empty() {
        return "No supported assets".to_string();
    }
    let mut out = String::new();
    for asset in assets {
        let _ = writeln!(
            out,
            "{:<8} {:>2} decimals  {}",
            asset.metadata.symbol, asset.metadata.decimals, asset.address
        );
    }
    out
}

pub fn token_balance(balance: Option<u128>, asset: &AssetMetadata) -> String {
    match balance {
        Some(raw) => format!(
            "Token balance: {} {}",
            format_amount(raw, asset.decimals),
            asset.symbol
        ),
        None => "Failed to fetch token balance".to_string(),
    }
}

fn list_row(summary: &GameSummary) -> String {
    format!(
        "#{:<4} {:<6} {:>12} {:<6} round {:<6} pot {} {}  created {}",
        summary.token_id,
        summary.status,
        summary.amount,
        summary.symbol,
        summary.round.compact(),
        summary.pot,
        summary.symbol,
        summary.created,
    )
}

pub fn game_list(items: &[ListItem]) -> String {
    if items.is_empty() {
        return "No ongoing games".to_string();
    }
    let mut out = String::new();
    for item in items {
        let row = match item {
            ListItem::Loaded(summary) => list_row(summary),
            ListItem::Failed { token_id, message } => {
                format!("#{token_id:<4} failed to load: {message}")
            }
        };
        let _ = writeln!(out, "{row}");
    }
    out
}

pub fn affordance(affordance: &Affordance, summary: &GameSummary) -> String {
    let amount = |raw: u128| format!("{} {}", format_amount(raw, summary.decimals), summary.symbol);
    match affordance {
        Affordance::NotFound => "Game not found".to_string(),
        Affordance::Ended => "Game ended".to_string(),
        Affordance::Claim { amount: raw } => format!("Claim {}", amount(*raw)),
        Affordance::Deposit { amount: raw } => format!("Deposit {}", amount(*raw)),
        Affordance::AlreadyDeposited => "Already deposited this round".to_string(),
        Affordance::Nothing => "No action available".to_string(),
        Affordance::Unknown => "Unable to determine eligibility".to_string(),
    }
}

fn recovery(recovery: Recovery) -> &'static str {
    match recovery {
        Recovery::Available => "available",
        Recovery::Unavailable => "unavailable",
        Recovery::Unknown => "unknown",
    }
}

fn deposit_state(state: DepositState) -> &'static str {
    match state {
        DepositState::Deposited => "deposited",
        DepositState::Outstanding => "pending",
        DepositState::Unknown => "unknown",
    }
}

fn deposit_rows(out: &mut String, rows: &[DepositRow], viewer: Option<&Address>) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (no payers this round)");
        return;
    }
    for row in rows {
        let marker = if viewer == Some(&row.account) { " (you)" } else { "" };
        let _ = writeln!(
            out,
            "  {} {}{marker}",
            row.account,
            deposit_state(row.state)
        );
    }
}

pub fn game_view(view: &GameView, viewer: Option<&Address>) -> String {
    let summary = &view.summary;
    let symbol = &summary.symbol;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", summary.title(), summary.status);
    let _ = writeln!(out, "  Amount:    {} {symbol} per round", summary.amount);
    let _ = writeln!(
        out,
        "  Round:     {} ({}% deposited)",
        summary.round, summary.progress
    );
    let _ = writeln!(
        out,
        "  Pot:       {} {symbol} of {} {symbol}",
        summary.pot, summary.expected_round_total
    );
    let _ = writeln!(out, "  Players:   {}", summary.player_count);
    if let Some(recipient) = view.record.recipient() {
        let _ = writeln!(out, "  Recipient: {recipient}");
    }
    let _ = writeln!(out, "  Creator:   {}", summary.creator);
    let _ = writeln!(out, "  Created:   {}", summary.created);
    let _ = writeln!(out, "Deposits this round:");
    deposit_rows(&mut out, &view.deposits, viewer);
    if viewer.is_some() {
        let _ = writeln!(out, "Action:    {}", affordance(&view.affordance, summary));
        let _ = writeln!(out, "Recovery:  {}", recovery(view.recovery));
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use pasanaku_view::{
        game::{
            GameRecord,
            PlayersTuple,
            RawGame,
        },
        presentation::{
            image::summary_svg,
            metadata::TokenMetadata,
        },
    };

    const NOW: u64 = 1_800_000_000;

    fn account(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn record() -> GameRecord {
        GameRecord::normalize(RawGame::Players(PlayersTuple {
            players: (1..=3).map(account).collect(),
            asset: account(0xaa),
            amount: 100_000000,
            player_count: 3,
            current_player_index: 0,
            creator: account(0xcc),
            total_deposited: 100_000000,
            token_id: 2,
            ended: false,
            created_at: 1_736_035_200,
            last_updated_at: NOW - 60,
        }))
    }

    fn summary() -> GameSummary {
        GameSummary::build(&record(), &AssetMetadata::new("USDC", 6), NOW)
    }

    #[test]
    fn game_list__no_items__says_so() {
        assert_eq!(game_list(&[]), "No ongoing games");
    }

    #[test]
    fn game_list__failed_item__keeps_other_rows() {
        // given
        let items = vec![
            ListItem::Loaded(summary()),
            ListItem::Failed {
                token_id: 3,
                message: "upstream read failed".to_string(),
            },
        ];

        // when
        let rendered = game_list(&items);

        // then
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#2"), "{}", lines[0]);
        assert!(lines[0].contains("round 1/3"), "{}", lines[0]);
        assert!(lines[0].contains("Jan 5, 2025"), "{}", lines[0]);
        assert_eq!(lines[1], "#3    failed to load: upstream read failed");
    }

    #[test]
    fn affordance__deposit__formats_amount_with_symbol() {
        let label = affordance(&Affordance::Deposit { amount: 100_500000 }, &summary());
        assert_eq!(label, "Deposit 100.5 USDC");
    }

    #[test]
    fn affordance__unknown__never_offers_an_action() {
        let label = affordance(&Affordance::Unknown, &summary());
        assert_eq!(label, "Unable to determine eligibility");
    }

    #[test]
    fn game_view__viewer__marks_own_row_and_shows_action() {
        // given
        let viewer = account(2);
        let view = GameView {
            record: record(),
            summary: summary(),
            affordance: Affordance::Deposit {
                amount: 100_000000,
            },
            recovery: Recovery::Unknown,
            deposits: vec![
                DepositRow {
                    account: account(2),
                    state: DepositState::Outstanding,
                },
                DepositRow {
                    account: account(3),
                    state: DepositState::Deposited,
                },
            ],
        };

        // when
        let rendered = game_view(&view, Some(&viewer));

        // then
        assert!(rendered.starts_with("Pasanaku #2 (Active)"), "{rendered}");
        assert!(rendered.contains(&format!("{} pending (you)", account(2))));
        assert!(rendered.contains(&format!("{} deposited", account(3))));
        assert!(rendered.contains(&format!("Recipient: {}", account(1))));
        assert!(rendered.contains("Action:    Deposit 100 USDC"));
        assert!(rendered.contains("Recovery:  unknown"));
    }

    #[test]
    fn game_view__no_viewer__omits_action_lines() {
        let view = GameView {
            record: record(),
            summary: summary(),
            affordance: Affordance::Nothing,
            recovery: Recovery::Unavailable,
            deposits: Vec::new(),
        };

        let rendered = game_view(&view, None);

        assert!(!rendered.contains("Action:"));
        assert!(rendered.contains("(no payers this round)"));
    }

    #[test]
    fn token_balance__formats_or_reports_failure() {
        let usdc = AssetMetadata::new("USDC", 6);
        assert_eq!(
            token_balance(Some(1_234_567890), &usdc),
            "Token balance: 1,234.56789 USDC"
        );
        assert_eq!(token_balance(None, &usdc), "Failed to fetch token balance");
    }

    fn record_with(amount: u128, total_deposited: u128) -> GameRecord {
        let mut record = record();
        record.amount = amount;
        record.total_deposited = total_deposited;
        record
    }

    #[test]
    fn amounts__render_identically_on_every_surface() {
        let cases = [
            (record(), AssetMetadata::new("USDC", 6), "100"),
            (
                record_with(1_234_567_890_123_456_789, 0),
                AssetMetadata::new("WETH", 18),
                "1.234568",
            ),
            (
                record_with(999_999_999_999_999_999, 0),
                AssetMetadata::new("WETH", 18),
                "1",
            ),
        ];
        for (record, asset, expected) in cases {
            // given
            let summary = GameSummary::build(&record, &asset, NOW);
            let view = GameView {
                record: record.clone(),
                summary: summary.clone(),
                affordance: Affordance::Nothing,
                recovery: Recovery::Unavailable,
                deposits: Vec::new(),
            };

            // when
            let row = list_row(&summary);
            let detail = game_view(&view, None);
            let svg = summary_svg(&summary);
            let metadata = TokenMetadata::from_summary(&summary, "https://pasanaku.test")
                .to_json()
                .unwrap();
            let metadata = String::from_utf8(metadata).unwrap();

            // then
            let shown = format!("{expected} {}", asset.symbol);
            assert_eq!(summary.amount, expected);
            assert_eq!(format_amount(record.amount, asset.decimals), expected);
            assert!(row.contains(&format!("{expected:>12} {}", asset.symbol)), "{row}");
            assert!(detail.contains(&format!("{shown} per round")), "{detail}");
            assert!(svg.contains(&shown), "{svg}");
            assert!(metadata.contains(&format!("{shown} per round")), "{metadata}");
        }
    }
}
