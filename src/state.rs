use crate::error::Error;
use alloy_primitives::Address;

/// Largest chain id we accept.
///
/// This is the value MetaMask settled on: `floor((2^53 - 39) / 2)`. It stays
/// exact when manipulated as a javascript number.
pub const MAX_SAFE_CHAIN_ID: u64 = 4503599627370476;

/// The connection state of one connector.
///
/// Only the [`Actions`](crate::Actions) can mutate it. Observers receive a
/// snapshot of it on every change through the [`Store`](crate::Store).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub chain_id: Option<u64>,
    /// checksummed addresses, the first one is the default account
    pub accounts: Option<Vec<String>>,
    pub account_index: Option<usize>,
    /// `true` while an activation has not yet produced a chain id and
    /// at least one account.
    pub activating: bool,
    /// chain id of an in flight `wallet_addEthereumChain` request
    pub adding_chain: Option<u64>,
    /// chain id of an in flight `wallet_switchEthereumChain` request
    pub switching_chain: Option<u64>,
    /// token address of an in flight `wallet_watchAsset` request
    pub watching_asset: Option<String>,
}

impl ConnectionState {
    /// the account designated by `account_index`, or the first account
    pub fn account(&self) -> Option<&str> {
        let accounts = self.accounts.as_ref()?;
        accounts
            .get(self.account_index.unwrap_or(0))
            .map(String::as_str)
    }
}

/// A partial update of the [`ConnectionState`].
///
/// `chain_id` and `accounts` are kept when absent (`None`). The other
/// fields distinguish between being absent (`None`: the current value is
/// kept) and being explicitly cleared (`Some(None)`).
///
/// ```
/// use eip1193_connector::StateUpdate;
///
/// let update = StateUpdate::new()
///     .chain_id(1)
///     .accounts(["0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"])
///     .clear_switching_chain();
/// # assert_eq!(update.switching_chain, Some(None));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub account_index: Option<Option<usize>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub adding_chain: Option<Option<u64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub switching_chain: Option<Option<u64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub watching_asset: Option<Option<String>>,
}

// a key present in the payload, even `null`, is an explicit assignment
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accounts = Some(accounts.into_iter().map(Into::into).collect());
        self
    }

    pub fn account_index(mut self, account_index: usize) -> Self {
        self.account_index = Some(Some(account_index));
        self
    }

    pub fn clear_account_index(mut self) -> Self {
        self.account_index = Some(None);
        self
    }

    pub fn adding_chain(mut self, chain_id: u64) -> Self {
        self.adding_chain = Some(Some(chain_id));
        self
    }

    pub fn clear_adding_chain(mut self) -> Self {
        self.adding_chain = Some(None);
        self
    }

    pub fn switching_chain(mut self, chain_id: u64) -> Self {
        self.switching_chain = Some(Some(chain_id));
        self
    }

    pub fn clear_switching_chain(mut self) -> Self {
        self.switching_chain = Some(None);
        self
    }

    pub fn watching_asset(mut self, asset: impl Into<String>) -> Self {
        self.watching_asset = Some(Some(asset.into()));
        self
    }

    pub fn clear_watching_asset(mut self) -> Self {
        self.watching_asset = Some(None);
        self
    }

    /// check the chain id and normalize every account to its checksummed
    /// form. Nothing is modified if any of the values is invalid.
    pub fn validated(self) -> Result<Self, Error> {
        if let Some(chain_id) = self.chain_id {
            validate_chain_id(chain_id)?;
        }
        let accounts = self
            .accounts
            .map(|accounts| {
                accounts
                    .iter()
                    .map(|account| validate_account(account))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Self { accounts, ..self })
    }

    /// derive the next state from `existing`
    pub(crate) fn apply(self, existing: &ConnectionState) -> ConnectionState {
        let chain_id = self.chain_id.or(existing.chain_id);
        let accounts = self.accounts.or_else(|| existing.accounts.clone());

        // the activation is over as soon as we know both the chain and
        // at least one account
        let activating = existing.activating
            && !(chain_id.is_some() && accounts.as_ref().is_some_and(|a| !a.is_empty()));

        ConnectionState {
            chain_id,
            accounts,
            activating,
            account_index: self.account_index.unwrap_or(existing.account_index),
            adding_chain: self.adding_chain.unwrap_or(existing.adding_chain),
            switching_chain: self.switching_chain.unwrap_or(existing.switching_chain),
            watching_asset: self
                .watching_asset
                .unwrap_or_else(|| existing.watching_asset.clone()),
        }
    }
}

pub fn validate_chain_id(chain_id: u64) -> Result<u64, Error> {
    if chain_id == 0 || chain_id > MAX_SAFE_CHAIN_ID {
        return Err(Error::InvalidChainId(chain_id.to_string()));
    }
    Ok(chain_id)
}

/// validate a chain id received as a javascript number
pub fn chain_id_from_f64(chain_id: f64) -> Result<u64, Error> {
    if !chain_id.is_finite()
        || chain_id.fract() != 0.0
        || chain_id <= 0.0
        || chain_id > MAX_SAFE_CHAIN_ID as f64
    {
        return Err(Error::InvalidChainId(chain_id.to_string()));
    }
    validate_chain_id(chain_id as u64)
}

/// parse the hexadecimal quantity providers use for chain ids (`"0x1"`)
pub fn parse_chain_id(chain_id: &str) -> Result<u64, Error> {
    let digits = chain_id.strip_prefix("0x").unwrap_or(chain_id);
    // from_str_radix would accept a sign
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidChainId(chain_id.to_owned()));
    }
    let parsed = u64::from_str_radix(digits, 16)
        .map_err(|_| Error::InvalidChainId(chain_id.to_owned()))?;
    validate_chain_id(parsed)
}

/// Returns the EIP-55 checksummed form of `account`.
///
/// All lowercase or all uppercase inputs are accepted as is. Mixed case
/// inputs are expected to already carry a valid checksum.
pub fn validate_account(account: &str) -> Result<String, Error> {
    let invalid = |reason: &str| Error::InvalidAccount {
        account: account.to_owned(),
        reason: reason.to_owned(),
    };

    if account.starts_with("0X") {
        return Err(invalid("unexpected `0X' prefix, expected `0x'"));
    }
    let digits = account.strip_prefix("0x").unwrap_or(account);
    if digits.len() != 40 {
        return Err(invalid("expected 20 bytes encoded in hexadecimal"));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("not an hexadecimal string"));
    }

    let address = digits
        .parse::<Address>()
        .map_err(|error| invalid(&error.to_string()))?;
    let checksummed = address.to_checksum(None);

    let mixed_case = digits.bytes().any(|b| b.is_ascii_lowercase())
        && digits.bytes().any(|b| b.is_ascii_uppercase());
    if mixed_case && checksummed[2..] != *digits {
        return Err(invalid("bad address checksum"));
    }

    Ok(checksummed)
}
