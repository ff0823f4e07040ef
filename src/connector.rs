use crate::{
    Actions,
    error::{Error, ProviderErrorCode, ProviderRpcError},
};
use serde::Serialize;
use std::{fmt, rc::Rc};

/// Configuration shared by the connectors.
#[derive(Clone, Default)]
pub struct ConnectorOptions {
    /// Called with the errors that have no caller to be returned to,
    /// i.e. the errors raised while handling provider events.
    pub on_error: Option<Rc<dyn Fn(&Error)>>,
}

impl ConnectorOptions {
    pub fn on_error(mut self, on_error: impl Fn(&Error) + 'static) -> Self {
        self.on_error = Some(Rc::new(on_error));
        self
    }

    pub(crate) fn report(&self, error: &Error) {
        tracing::warn!(%error, "connector error");
        if let Some(on_error) = &self.on_error {
            on_error(error);
        }
    }
}

impl fmt::Debug for ConnectorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorOptions")
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    /// 2 to 6 characters
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of `wallet_addEthereumChain` (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    #[serde(serialize_with = "hex_quantity")]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_urls: Option<Vec<String>>,
}

/// Parameters of `wallet_watchAsset` (EIP-747), only ERC-20 tokens are
/// supported by the wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchAssetParameters {
    /// address of the token contract
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The chain a connector should end up on after activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainTarget {
    /// switch to a chain the wallet already knows
    Id(u64),
    /// switch to the chain, adding it to the wallet if needed
    Parameters(AddEthereumChainParameter),
}

impl ChainTarget {
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Id(chain_id) => *chain_id,
            Self::Parameters(parameters) => parameters.chain_id,
        }
    }
}

impl From<u64> for ChainTarget {
    fn from(chain_id: u64) -> Self {
        Self::Id(chain_id)
    }
}

impl From<AddEthereumChainParameter> for ChainTarget {
    fn from(parameters: AddEthereumChainParameter) -> Self {
        Self::Parameters(parameters)
    }
}

pub(crate) fn hex_quantity<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("{value:#x}"))
}

/// A wallet specific handshake driving the [`Actions`] of its store.
///
/// Futures are not `Send`: connectors live on the browser's main thread.
#[allow(async_fn_in_trait)]
pub trait Connector {
    fn actions(&self) -> &Actions;

    /// Prompt the user to connect the wallet, optionally moving it to
    /// the `desired` chain.
    async fn activate(&self, desired: Option<ChainTarget>) -> Result<(), Error>;

    /// Connect without prompting the user, if the wallet already
    /// authorised the application.
    async fn connect_eagerly(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Disconnect the wallet. Most wallets cannot be disconnected by the
    /// application so this only resets the local state by default.
    async fn deactivate(&self) -> Result<(), Error> {
        self.reset_state();
        Ok(())
    }

    /// Reset the local state, never talks to the wallet.
    fn reset_state(&self) {
        self.actions().reset_state();
    }

    /// Ask the wallet to track the given token.
    async fn watch_asset(&self, asset: WatchAssetParameters) -> Result<bool, Error> {
        Err(ProviderRpcError::new(
            ProviderErrorCode::UnsupportedMethod,
            format!("watching asset {} is not supported", asset.symbol),
        )
        .into())
    }
}
