//! Solidity interfaces of the Pasanaku contract and its ERC-20 assets.
//!
//! Deployments disagree on the shape of the `rotating_savings` tuple, so each
//! layout gets its own interface.

use alloy::sol;

sol! {
    interface IPasanakuPlayers {
        struct RotatingSavings {
            address[] players;
            address asset;
            uint256 amount;
            uint256 player_count;
            uint256 current_player_index;
            address creator;
            uint256 total_deposited;
            uint256 token_id;
            bool ended;
            uint256 created_at;
            uint256 last_updated_at;
        }

        function rotating_savings(uint256 token_id) external view returns (RotatingSavings memory);
    }
}

sol! {
    interface IPasanakuParticipants {
        struct RotatingSavings {
            address[] participants;
            address asset;
            uint256 amount;
            uint256 current_index;
            uint256 total_deposited;
            uint256 token_id;
            bool ended;
            bool recovered;
            address creator;
            uint256 created_at;
            uint256 last_updated_at;
        }

        function rotating_savings(uint256 token_id) external view returns (RotatingSavings memory);
    }
}

sol! {
    interface IPasanaku {
        function next_token_id() external view returns (uint256);
        function has_deposited(address account, uint256 token_id, uint256 index) external view returns (bool);
        function can_current_recipient_claim(uint256 token_id) external view returns (bool);
        function can_be_recovered(uint256 token_id) external view returns (bool);
        function supported_assets() external view returns (address[5]);
        function protocol_fee() external pure returns (uint256);
        function balanceOfBatch(address[] owners, uint256[] ids) external view returns (uint256[]);

        function create(address asset, address[] players, uint256 amount) external payable returns (bool);
        function deposit(uint256 token_id) external payable returns (bool);
        function claim(uint256 token_id) external payable returns (bool);
        function recover(uint256 token_id) external returns (bool);
    }
}

sol! {
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        // test networks only
        function faucet(address to, uint256 amount) external returns (bool);
    }
}
