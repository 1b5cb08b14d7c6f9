use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

use crate::Error;

pub const EXPLORER_URL: &str = "https://solscan.io";
pub const WALLET_INSTALL_URL: &str = "https://phantom.app/";

/// Tokens that can be swapped through the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "SOL")]
    Sol,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDT")]
    Usdt,
}

impl Symbol {
    pub const ALL: [Symbol; 3] = [Symbol::Sol, Symbol::Usdc, Symbol::Usdt];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Symbol::Sol => "SOL",
            Symbol::Usdc => "USDC",
            Symbol::Usdt => "USDT",
        }
    }

    pub const fn token(&self) -> &'static Token {
        match self {
            Symbol::Sol => &Token::SOL,
            Symbol::Usdc => &Token::USDC,
            Symbol::Usdt => &Token::USDT,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::ALL
            .into_iter()
            .find(|x| x.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownToken(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    pub name: &'static str,
    pub decimals: u32,
    pub mint: Pubkey,

    pub price_id: &'static str,
    pub logo: &'static str,
}

impl Token {
    pub const SOL: Token = Token {
        symbol: Symbol::Sol,
        name: "Solana",
        decimals: 9,
        mint: pubkey!("So11111111111111111111111111111111111111112"),
        price_id: "solana",
        logo: "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/solana/info/logo.png",
    };

    pub const USDC: Token = Token {
        symbol: Symbol::Usdc,
        name: "USD Coin",
        decimals: 6,
        mint: pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
        price_id: "usd-coin",
        logo: "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/solana/assets/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v/logo.png",
    };

    pub const USDT: Token = Token {
        symbol: Symbol::Usdt,
        name: "Tether",
        decimals: 6,
        mint: pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB"),
        price_id: "tether",
        logo: "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/solana/assets/Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB/logo.png",
    };
}

/// Assets that are only displayed in the price ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAsset {
    pub symbol: &'static str,
    pub name: &'static str,
    pub price_id: &'static str,
}

impl DisplayAsset {
    pub const BTC: DisplayAsset = DisplayAsset {
        symbol: "BTC",
        name: "Bitcoin",
        price_id: "bitcoin",
    };

    pub const ETH: DisplayAsset = DisplayAsset {
        symbol: "ETH",
        name: "Ethereum",
        price_id: "ethereum",
    };

    /// Every asset priced by the feed, in ticker order
    pub const TICKER: [DisplayAsset; 5] = [
        DisplayAsset::from_token(&Token::SOL),
        DisplayAsset::BTC,
        DisplayAsset::ETH,
        DisplayAsset::from_token(&Token::USDC),
        DisplayAsset::from_token(&Token::USDT),
    ];

    pub const fn from_token(token: &Token) -> DisplayAsset {
        DisplayAsset {
            symbol: token.symbol.as_str(),
            name: token.name,
            price_id: token.price_id,
        }
    }
}

pub fn account_url(address: &str) -> String {
    format!("{}/account/{}", EXPLORER_URL, address)
}

pub fn transaction_url(signature: &str) -> String {
    format!("{}/tx/{}", EXPLORER_URL, signature)
}
