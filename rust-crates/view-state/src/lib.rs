pub mod actions;
pub mod address;
pub mod amount;
pub mod assets;
pub mod context;
pub mod eligibility;
pub mod error;
pub mod forms;
pub mod game;
pub mod presentation;
pub mod reads;
pub mod status;
pub mod token_id;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

pub use address::Address;
pub use context::ViewContext;
pub use error::LookupError;
pub use game::{
    GameRecord,
    RawGame,
    TokenId,
};
pub use presentation::GameSummary;
