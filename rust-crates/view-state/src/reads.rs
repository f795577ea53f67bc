use crate::{
    Result,
    address::Address,
    game::{
        RawGame,
        TokenId,
    },
};

/// Read surface of the Pasanaku contract.
pub trait ContractReader {
    fn rotating_savings(
        &self,
        token_id: TokenId,
    ) -> impl Future<Output = Result<RawGame>>;

    fn next_token_id(&self) -> impl Future<Output = Result<TokenId>>;

    fn has_deposited(
        &self,
        account: &Address,
        token_id: TokenId,
        round: u64,
    ) -> impl Future<Output = Result<bool>>;

    fn can_current_recipient_claim(
        &self,
        token_id: TokenId,
    ) -> impl Future<Output = Result<bool>>;

    fn can_be_recovered(&self, token_id: TokenId) -> impl Future<Output = Result<bool>>;

    fn supported_assets(&self) -> impl Future<Output = Result<Vec<Address>>>;

    fn protocol_fee(&self) -> impl Future<Output = Result<u128>>;

    /// ERC-1155 balances, `owners[i]` holding `ids[i]`; both slices have the
    /// same length.
    fn balance_of_batch(
        &self,
        owners: &[Address],
        ids: &[TokenId],
    ) -> impl Future<Output = Result<Vec<u128>>>;
}

/// Read surface of an ERC-20 asset contract.
pub trait TokenReader {
    fn symbol(&self, asset: &Address) -> impl Future<Output = Result<String>>;

    fn decimals(&self, asset: &Address) -> impl Future<Output = Result<u8>>;

    fn allowance(
        &self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
    ) -> impl Future<Output = Result<u128>>;

    fn balance_of(
        &self,
        asset: &Address,
        owner: &Address,
    ) -> impl Future<Output = Result<u128>>;
}
