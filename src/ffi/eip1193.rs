use serde::Serialize;
use wasm_bindgen::{JsCast, prelude::*};

#[wasm_bindgen]
extern "C" {
    /// the provider injected by the browser extension, resolved once per
    /// thread. `None` if no extension injected one.
    #[wasm_bindgen(thread_local_v2, js_namespace = ["window"], js_name = "ethereum")]
    pub static ETHEREUM: Option<Eip1193Provider>;
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Eip1193Provider;

    /// Submit a JSON-RPC request to the provider. `args` is a
    /// [`RequestArguments`] object.
    ///
    /// The promise rejects with a `ProviderRpcError` (`{ code, message }`).
    #[wasm_bindgen(method, catch)]
    pub async fn request(this: &Eip1193Provider, args: JsValue) -> Result<JsValue, JsValue>;

    /// Register a listener for one of the provider events: `connect`,
    /// `disconnect`, `chainChanged` or `accountsChanged`.
    #[wasm_bindgen(method)]
    pub fn on(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = "removeListener")]
    pub fn remove_listener(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, getter, js_name = "isMetaMask")]
    pub fn is_meta_mask(this: &Eip1193Provider) -> Option<bool>;

    #[wasm_bindgen(method, getter, js_name = "isCoinbaseWallet")]
    pub fn is_coinbase_wallet(this: &Eip1193Provider) -> Option<bool>;

    /// Set when more than one extension injected a provider: the
    /// providers of each of the extensions.
    #[wasm_bindgen(method, getter)]
    pub fn providers(this: &Eip1193Provider) -> Option<js_sys::Array>;
}

/// The argument of [`Eip1193Provider::request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestArguments<'a, P> {
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

/// The injected provider, if any.
///
/// When several extensions injected their provider, the one matching
/// `select` is returned, e.g. `|provider| provider.is_meta_mask() == Some(true)`.
pub fn injected(select: Option<fn(&Eip1193Provider) -> bool>) -> Option<Eip1193Provider> {
    let provider = ETHEREUM.with(|opt| opt.clone())?;
    let Some(select) = select else {
        return Some(provider);
    };

    match provider.providers() {
        Some(providers) => providers
            .iter()
            .map(|provider| provider.unchecked_into::<Eip1193Provider>())
            .find(|provider| select(provider)),
        None => Some(provider).filter(|provider| select(provider)),
    }
}
