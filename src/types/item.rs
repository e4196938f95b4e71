use serde::Deserialize;

/// Marketplace item the event refers to.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Slash-delimited item path, `{chain}/{contract}/{token id}`.
    pub nft_id: String,

    /// Item page on the marketplace.
    pub permalink: String,

    #[serde(default)]
    pub metadata: ItemMetadata,

    #[serde(default)]
    pub chain: Option<ChainRef>,
}

impl Item {
    /// Token ID, the last segment of [`Item::nft_id`].
    pub fn token_id(&self) -> &str {
        self.nft_id.rsplit('/').next().unwrap_or(&self.nft_id)
    }

    /// Metadata-provided display name, if non-empty.
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.metadata.image_url.as_deref().filter(|url| !url.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ItemMetadata {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub animation_url: Option<String>,

    #[serde(default)]
    pub metadata_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ChainRef {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CollectionRef {
    pub slug: String,
}

/// Counterparty of the event (maker, taker, sender or recipient).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: String,
}

/// Token the price is denominated in.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PaymentToken {
    #[serde(default)]
    pub symbol: String,

    #[serde(default)]
    pub address: Option<String>,

    /// Decimal places of the raw fixed-point amounts.
    #[serde(default)]
    pub decimals: Option<u8>,

    /// USD per one whole token, as a decimal string.
    #[serde(default)]
    pub usd_price: Option<String>,

    #[serde(default)]
    pub eth_price: Option<String>,
}
