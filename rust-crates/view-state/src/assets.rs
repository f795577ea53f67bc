use crate::{
    address::{
        Address,
        parse_address,
    },
    reads::TokenReader,
};
use serde::Serialize;
use std::collections::HashMap;

pub const PLACEHOLDER_SYMBOL: &str = "??";
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetMetadata {
    pub symbol: String,
    pub decimals: u8,
}

impl AssetMetadata {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_SYMBOL, DEFAULT_DECIMALS)
    }
}

const BUILTIN_ASSETS: [(&str, &str, u8); 3] = [
    ("0xd24eab8a12c6d42d4614493eb2f3f9ad34b1cf5f", "USDC", 6),
    ("0xe0fb0f453abfbd74368074cf0291711fc82cbc07", "USDT0", 6),
    ("0x1c97c5715f20445400716db9b1ea2e82f873cf35", "WETH", 18),
];

/// Static asset configuration. Keys are addresses, so lookups ignore the
/// hex casing of the queried address.
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    entries: HashMap<Address, AssetMetadata>,
}

impl AssetTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assets supported by the mainnet deployment.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (address, symbol, decimals) in BUILTIN_ASSETS {
            if let Ok(address) = parse_address(address) {
                table.insert(address, AssetMetadata::new(symbol, decimals));
            }
        }
        table
    }

    pub fn insert(&mut self, address: Address, metadata: AssetMetadata) {
        self.entries.insert(address, metadata);
    }

    pub fn get(&self, address: &Address) -> Option<&AssetMetadata> {
        self.entries.get(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves display metadata for an asset: static table first, then the token
/// contract itself. Never fails; unresolved fields fall back to
/// [`PLACEHOLDER_SYMBOL`] and [`DEFAULT_DECIMALS`].
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    table: AssetTable,
}

impl AssetRegistry {
    pub fn new(table: AssetTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &AssetTable {
        &self.table
    }

    pub fn lookup(&self, asset: &Address) -> Option<&AssetMetadata> {
        self.table.get(asset)
    }

    pub async fn resolve<T: TokenReader>(
        &self,
        tokens: &T,
        asset: &Address,
    ) -> AssetMetadata {
        if let Some(metadata) = self.table.get(asset) {
            return metadata.clone();
        }

        let (symbol, decimals) =
            futures::join!(tokens.symbol(asset), tokens.decimals(asset));
        let symbol = match symbol {
            Ok(symbol) if !symbol.trim().is_empty() => symbol,
            Ok(_) => PLACEHOLDER_SYMBOL.to_string(),
            Err(e) => {
                tracing::warn!("symbol lookup for asset {asset} failed: {e:#}");
                PLACEHOLDER_SYMBOL.to_string()
            }
        };
        let decimals = decimals.unwrap_or_else(|e| {
            tracing::warn!("decimals lookup for asset {asset} failed: {e:#}");
            DEFAULT_DECIMALS
        });
        AssetMetadata { symbol, decimals }
    }
}
