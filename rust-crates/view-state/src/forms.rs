//! Declarative form schemas. The same schema validates interactive input and
//! request-boundary input, so both report identical messages.

use crate::{
    address::{
        Address,
        parse_address,
    },
    amount::parse_amount,
};
use std::{
    collections::BTreeMap,
    fmt,
};

pub const MIN_PLAYERS: usize = 1;
pub const MAX_PLAYERS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Address,
    PositiveDecimal,
    AddressList { min: usize, max: usize },
}

impl Rule {
    fn accepts(self, value: &str) -> bool {
        match self {
            Rule::Required => !value.trim().is_empty(),
            Rule::Address => parse_address(value.trim()).is_ok(),
            Rule::PositiveDecimal => value
                .trim()
                .parse::<f64>()
                .is_ok_and(|n| n.is_finite() && n > 0.0),
            Rule::AddressList { min, max } => {
                let entries = split_address_list(value);
                (min..=max).contains(&entries.len())
                    && entries.iter().all(|a| parse_address(a).is_ok())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub name: &'static str,
    pub rules: &'static [(Rule, &'static str)],
}

#[derive(Debug, Clone, Copy)]
pub struct FormSchema {
    pub fields: &'static [FieldSchema],
}

pub const CREATE_GAME_FORM: FormSchema = FormSchema {
    fields: &[
        FieldSchema {
            name: "asset",
            rules: &[
                (Rule::Required, "Select an asset"),
                (Rule::Address, "Invalid asset"),
            ],
        },
        FieldSchema {
            name: "amount",
            rules: &[
                (Rule::Required, "Amount is required"),
                (Rule::PositiveDecimal, "Amount must be a positive number"),
            ],
        },
        FieldSchema {
            name: "players",
            rules: &[
                (Rule::Required, "Enter at least one player address"),
                (
                    Rule::AddressList {
                        min: MIN_PLAYERS,
                        max: MAX_PLAYERS,
                    },
                    "Between 1 and 12 valid 0x addresses",
                ),
            ],
        },
    ],
};

/// Test-network token mint.
pub const FAUCET_FORM: FormSchema = FormSchema {
    fields: &[
        FieldSchema {
            name: "token",
            rules: &[
                (Rule::Required, "Select a token"),
                (Rule::Address, "Invalid token"),
            ],
        },
        FieldSchema {
            name: "address",
            rules: &[
                (Rule::Required, "Address is required"),
                (Rule::Address, "Invalid address"),
            ],
        },
        FieldSchema {
            name: "amount",
            rules: &[
                (Rule::Required, "Amount is required"),
                (Rule::PositiveDecimal, "Amount must be a positive number"),
            ],
        },
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, &'static str>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.fields.get(field).copied()
    }

    fn insert(&mut self, field: &'static str, message: &'static str) {
        self.fields.entry(field).or_insert(message);
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

impl FormSchema {
    /// Reports the first failing rule of each field. Missing fields validate
    /// as empty strings.
    pub fn validate<'a>(
        &self,
        value_of: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        for field in self.fields {
            let value = value_of(field.name).unwrap_or("");
            if let Some((_, message)) =
                field.rules.iter().find(|(rule, _)| !rule.accepts(value))
            {
                errors.insert(field.name, message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Split on commas and newlines, dropping blanks.
pub fn split_address_list(raw: &str) -> Vec<&str> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateGameInput {
    pub asset: String,
    pub amount: String,
    pub players: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGameRequest {
    pub asset: Address,
    pub amount: String,
    pub amount_raw: u128,
    pub players: Vec<Address>,
}

impl CreateGameInput {
    fn value_of(&self, field: &str) -> Option<&str> {
        match field {
            "asset" => Some(&self.asset),
            "amount" => Some(&self.amount),
            "players" => Some(&self.players),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        CREATE_GAME_FORM.validate(|field| self.value_of(field))
    }

    /// Validate and convert to contract arguments. `decimals_of` resolves the
    /// precision of the chosen asset for the minor-unit conversion.
    pub fn into_request(
        self,
        decimals_of: impl FnOnce(&Address) -> u8,
    ) -> Result<CreateGameRequest, FormErrors> {
        self.validate()?;
        let mut errors = FormErrors::default();
        let asset = match parse_address(self.asset.trim()) {
            Ok(asset) => asset,
            Err(_) => {
                errors.insert("asset", "Invalid asset");
                return Err(errors);
            }
        };
        let decimals = decimals_of(&asset);
        let amount_raw = match parse_amount(&self.amount, decimals) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("amount '{}' rejected: {e}", self.amount);
                errors.insert("amount", "Amount must be a positive number");
                return Err(errors);
            }
        };
        let players = split_address_list(&self.players)
            .into_iter()
            .filter_map(|entry| parse_address(entry).ok())
            .collect();
        Ok(CreateGameRequest {
            asset,
            amount: self.amount.trim().to_string(),
            amount_raw,
            players,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaucetInput {
    pub token: String,
    pub address: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaucetRequest {
    pub token: Address,
    pub to: Address,
    pub amount: String,
    pub amount_raw: u128,
}

impl FaucetInput {
    fn value_of(&self, field: &str) -> Option<&str> {
        match field {
            "token" => Some(&self.token),
            "address" => Some(&self.address),
            "amount" => Some(&self.amount),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        FAUCET_FORM.validate(|field| self.value_of(field))
    }

    /// Validate and convert to mint arguments; `decimals_of` gives the
    /// precision of the chosen token.
    pub fn into_request(
        self,
        decimals_of: impl FnOnce(&Address) -> u8,
    ) -> Result<FaucetRequest, FormErrors> {
        self.validate()?;
        let mut errors = FormErrors::default();
        let (Ok(token), Ok(to)) = (
            parse_address(self.token.trim()),
            parse_address(self.address.trim()),
        ) else {
            errors.insert("token", "Invalid token");
            return Err(errors);
        };
        let amount_raw = match parse_amount(&self.amount, decimals_of(&token)) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("faucet amount '{}' rejected: {e}", self.amount);
                errors.insert("amount", "Amount must be a positive number");
                return Err(errors);
            }
        };
        Ok(FaucetRequest {
            token,
            to,
            amount: self.amount.trim().to_string(),
            amount_raw,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    const USDC: &str = "0xd24eab8a12c6d42d4614493eb2f3f9ad34b1cf5f";
    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn input(asset: &str, amount: &str, players: &str) -> CreateGameInput {
        CreateGameInput {
            asset: asset.to_string(),
            amount: amount.to_string(),
            players: players.to_string(),
        }
    }

    #[test]
    fn validate__empty_form__reports_required_messages() {
        // when
        let errors = CreateGameInput::default().validate().unwrap_err();

        // then
        assert_eq!(errors.get("asset"), Some("Select an asset"));
        assert_eq!(errors.get("amount"), Some("Amount is required"));
        assert_eq!(
            errors.get("players"),
            Some("Enter at least one player address")
        );
    }

    #[test]
    fn validate__malformed_values__reports_rule_messages() {
        let errors = input("0x12", "-3", "0xnope").validate().unwrap_err();
        assert_eq!(errors.get("asset"), Some("Invalid asset"));
        assert_eq!(errors.get("amount"), Some("Amount must be a positive number"));
        assert_eq!(
            errors.get("players"),
            Some("Between 1 and 12 valid 0x addresses")
        );
    }

    #[test]
    fn validate__thirteen_players__is_rejected() {
        let players = vec![ALICE; 13].join(",");
        let errors = input(USDC, "1", &players).validate().unwrap_err();
        assert_eq!(
            errors.get("players"),
            Some("Between 1 and 12 valid 0x addresses")
        );
    }

    #[test]
    fn into_request__valid_input__converts_amount_to_minor_units() {
        // given
        let form = input(USDC, "100.5", &format!("{ALICE},\n{BOB}\n"));

        // when
        let request = form.into_request(|_| 6).unwrap();

        // then
        assert_eq!(request.amount_raw, 100_500000);
        assert_eq!(request.players.len(), 2);
        assert_eq!(request.players[1].to_string(), BOB);
    }

    #[test]
    fn into_request__amount_finer_than_asset__is_rejected() {
        let form = input(USDC, "0.0000001", ALICE);
        let errors = form.into_request(|_| 6).unwrap_err();
        assert_eq!(errors.get("amount"), Some("Amount must be a positive number"));
    }

    fn faucet(token: &str, address: &str, amount: &str) -> FaucetInput {
        FaucetInput {
            token: token.to_string(),
            address: address.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn faucet_validate__empty_form__reports_required_messages() {
        let errors = FaucetInput::default().validate().unwrap_err();
        assert_eq!(errors.get("token"), Some("Select a token"));
        assert_eq!(errors.get("address"), Some("Address is required"));
        assert_eq!(errors.get("amount"), Some("Amount is required"));
    }

    #[test]
    fn faucet_validate__malformed_values__reports_rule_messages() {
        let errors = faucet("usdc", "0x12", "0").validate().unwrap_err();
        assert_eq!(errors.get("token"), Some("Invalid token"));
        assert_eq!(errors.get("address"), Some("Invalid address"));
        assert_eq!(errors.get("amount"), Some("Amount must be a positive number"));
    }

    #[test]
    fn faucet_into_request__converts_amount_with_token_decimals() {
        // given
        let form = faucet(USDC, ALICE, "1000");

        // when
        let request = form.into_request(|_| 18).unwrap();

        // then
        assert_eq!(request.to.to_string(), ALICE);
        assert_eq!(request.amount_raw, 1_000 * 10u128.pow(18));
    }
}
