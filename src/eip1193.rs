use crate::{
    Actions, StateUpdate,
    connector::{ChainTarget, Connector, ConnectorOptions, WatchAssetParameters, hex_quantity},
    error::{Error, ProviderErrorCode, ProviderRpcError},
    events::{self, ProviderEvent},
    ffi::{self, Eip1193Provider, RequestArguments},
    selection::is_active,
    state::{parse_chain_id, validate_account},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use wasm_bindgen::{JsCast as _, JsValue, prelude::Closure};

/// Submits JSON-RPC requests to a wallet.
///
/// Implemented by [`Eip1193Provider`]: params and results are converted
/// from and to javascript values.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, Error>;
}

impl Transport for Eip1193Provider {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        // plain objects rather than javascript `Map`s
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let args = RequestArguments { method, params }
            .serialize(&serializer)
            .map_err(|error| Error::Decode(format!("Couldn't encode `{method}' request: {error}")))?;

        let result = self.request(args).await.map_err(provider_error)?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        decode(result)
    }
}

/// Connector for any EIP-1193 provider, injected by a browser extension
/// or given explicitly.
///
/// The provider events are listened to for as long as the connector
/// lives.
pub struct Eip1193<P = Eip1193Provider> {
    provider: P,
    actions: Actions,
    _listeners: Option<Listeners>,
}

struct Listeners {
    provider: Eip1193Provider,
    closures: Vec<(&'static str, Closure<dyn Fn(JsValue)>)>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectInfo {
    chain_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchEthereumChainParameter {
    #[serde(serialize_with = "hex_quantity")]
    chain_id: u64,
}

#[derive(Serialize)]
struct WatchAsset<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    options: &'a WatchAssetParameters,
}

impl Eip1193<Eip1193Provider> {
    pub fn new(provider: Eip1193Provider, actions: Actions, options: ConnectorOptions) -> Self {
        let closures = vec![
            listen(&provider, &actions, &options, "connect", |info: ConnectInfo| {
                ProviderEvent::Connect {
                    chain_id: info.chain_id,
                }
            }),
            listen(
                &provider,
                &actions,
                &options,
                "disconnect",
                ProviderEvent::Disconnect,
            ),
            listen(
                &provider,
                &actions,
                &options,
                "chainChanged",
                ProviderEvent::ChainChanged,
            ),
            listen(
                &provider,
                &actions,
                &options,
                "accountsChanged",
                ProviderEvent::AccountsChanged,
            ),
        ];

        Self {
            _listeners: Some(Listeners {
                provider: provider.clone(),
                closures,
            }),
            provider,
            actions,
        }
    }

    /// Use the provider injected in `window.ethereum`.
    pub fn injected(actions: Actions, options: ConnectorOptions) -> Result<Self, Error> {
        let provider = ffi::injected(None).ok_or(Error::NoProvider)?;
        Ok(Self::new(provider, actions, options))
    }
}

impl<P: Transport> Eip1193<P> {
    /// Use the given transport without listening to any provider event.
    pub fn with_transport(provider: P, actions: Actions) -> Self {
        Self {
            provider,
            actions,
            _listeners: None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn request<T: Serialize>(&self, method: &str, params: Option<T>) -> Result<Value, Error> {
        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| Error::Decode(format!("Couldn't encode `{method}' request: {error}")))?;

        tracing::debug!(method, "provider request");
        self.provider.call(method, params).await
    }

    async fn chain_id(&self) -> Result<u64, Error> {
        let chain_id = self.request("eth_chainId", None::<()>).await?;
        let Some(chain_id) = chain_id.as_str() else {
            return Err(Error::Decode(format!("Unexpected chain id: {chain_id}")));
        };
        parse_chain_id(chain_id)
    }

    async fn accounts(&self, method: &str) -> Result<Vec<String>, Error> {
        let accounts = self.request(method, None::<()>).await?;
        serde_json::from_value(accounts.clone())
            .map_err(|error| Error::Decode(format!("{error} ({accounts})")))
    }

    async fn switch_chain(&self, target: ChainTarget) -> Result<(), Error> {
        let chain_id = target.chain_id();
        self.actions
            .update_unchecked(StateUpdate::new().switching_chain(chain_id));

        let switched = self
            .request(
                "wallet_switchEthereumChain",
                Some([SwitchEthereumChainParameter { chain_id }]),
            )
            .await;

        let result = match (switched, target) {
            (
                Err(Error::Provider(ProviderRpcError {
                    code: ProviderErrorCode::UnrecognizedChain,
                    ..
                })),
                ChainTarget::Parameters(parameters),
            ) => {
                tracing::debug!(chain_id, "unknown chain, adding it to the wallet");
                self.actions.update_unchecked(
                    StateUpdate::new()
                        .clear_switching_chain()
                        .adding_chain(chain_id),
                );
                let added = self
                    .request("wallet_addEthereumChain", Some([parameters]))
                    .await;
                self.actions
                    .update_unchecked(StateUpdate::new().clear_adding_chain());
                added
            }
            (switched, _) => switched,
        };
        self.actions
            .update_unchecked(StateUpdate::new().clear_switching_chain());
        result?;

        let chain_id = self.chain_id().await?;
        self.actions.update(StateUpdate::new().chain_id(chain_id))?;
        Ok(())
    }

    async fn try_activate(&self, desired: Option<ChainTarget>) -> Result<(), Error> {
        let chain_id = self.chain_id().await?;
        let accounts = self.accounts("eth_requestAccounts").await?;
        if accounts.is_empty() {
            return Err(Error::NoAccounts);
        }

        self.actions
            .update(StateUpdate::new().chain_id(chain_id).accounts(accounts))?;

        match desired {
            Some(target) if target.chain_id() != chain_id => self.switch_chain(target).await,
            _ => Ok(()),
        }
    }

    async fn try_connect_eagerly(&self) -> Result<(), Error> {
        let chain_id = self.chain_id().await?;
        let accounts = self.accounts("eth_accounts").await?;
        if accounts.is_empty() {
            return Err(Error::NoAccounts);
        }

        self.actions
            .update(StateUpdate::new().chain_id(chain_id).accounts(accounts))?;
        Ok(())
    }
}

impl<P: Transport> Connector for Eip1193<P> {
    fn actions(&self) -> &Actions {
        &self.actions
    }

    async fn activate(&self, desired: Option<ChainTarget>) -> Result<(), Error> {
        // an active connection only needs to move to the desired chain
        let cancel = if is_active(&self.actions.get_state()) {
            None
        } else {
            Some(self.actions.start_activation())
        };

        let result = self.try_activate(desired).await;
        if let Err(error) = &result {
            tracing::debug!(%error, "activation failed");
            if let Some(cancel) = cancel {
                cancel.cancel();
            }
        }
        result
    }

    async fn connect_eagerly(&self) -> Result<(), Error> {
        let cancel = self.actions.start_activation();

        let result = self.try_connect_eagerly().await;
        if let Err(error) = &result {
            tracing::debug!(%error, "could not connect eagerly");
            cancel.cancel();
        }
        result
    }

    async fn watch_asset(&self, asset: WatchAssetParameters) -> Result<bool, Error> {
        let address = validate_account(&asset.address)?;
        self.actions
            .update_unchecked(StateUpdate::new().watching_asset(address));

        let watched = self
            .request(
                "wallet_watchAsset",
                Some(WatchAsset {
                    kind: "ERC20",
                    options: &asset,
                }),
            )
            .await;
        self.actions
            .update_unchecked(StateUpdate::new().clear_watching_asset());

        let watched = watched?;
        watched
            .as_bool()
            .ok_or_else(|| Error::Decode(format!("Unexpected watch asset result: {watched}")))
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        for (event, listener) in &self.closures {
            self.provider
                .remove_listener(event, listener.as_ref().unchecked_ref());
        }
    }
}

fn listen<T, F>(
    provider: &Eip1193Provider,
    actions: &Actions,
    options: &ConnectorOptions,
    event: &'static str,
    into_event: F,
) -> (&'static str, Closure<dyn Fn(JsValue)>)
where
    T: DeserializeOwned + 'static,
    F: Fn(T) -> ProviderEvent + 'static,
{
    let actions = actions.clone();
    let options = options.clone();

    let closure = Closure::wrap(Box::new(move |payload: JsValue| {
        match serde_wasm_bindgen::from_value::<T>(payload) {
            Ok(payload) => events::dispatch(&actions, &options, into_event(payload)),
            Err(error) => options.report(&Error::Decode(format!(
                "Couldn't decode the `{event}' event: {error}"
            ))),
        }
    }) as Box<dyn Fn(JsValue)>);

    provider.on(event, closure.as_ref().unchecked_ref());
    (event, closure)
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, Error> {
    serde_wasm_bindgen::from_value(value.clone())
        .map_err(|error| Error::Decode(format!("{error} ({value:?})")))
}

fn provider_error(error: JsValue) -> Error {
    serde_wasm_bindgen::from_value::<ProviderRpcError>(error.clone())
        .map(Error::Provider)
        .unwrap_or_else(|decode_error| {
            Error::Decode(format!(
                "Couldn't decode the error content: {decode_error} ({error:?})"
            ))
        })
}
