/*!

# Connection state for EIP-1193 wallets

This library is meant to be used by web applications that need to track
their connection to Ethereum wallets injected in the browser (MetaMask,
Coinbase Wallet or any other EIP-1193 provider).

## Features

- One observable [`ConnectionState`] per connector
- Validated updates: chain ids are bounded, accounts are EIP-55 checksummed
- Concurrent activations: a failed activation never overrides a later one
- Provider events (`connect`, `disconnect`, `chainChanged`, `accountsChanged`)

## Usage

Each connector owns the [`Actions`] mutating its state while the observers
(e.g. the user interface) subscribe to the [`Store`]:

```
use eip1193_connector::{StateUpdate, create_store_and_actions};

let (store, actions) = create_store_and_actions();
let subscription = store.subscribe(|state| println!("{state:?}"));

let cancel = actions.start_activation();
actions.update(
    StateUpdate::new()
        .chain_id(1)
        .accounts(["0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"]),
)?;
assert!(!store.get_state().activating);

// no-op: the activation already succeeded
cancel.cancel();
# subscription.unsubscribe();
# Ok::<(), eip1193_connector::error::Error>(())
```

In the browser the [`Eip1193`] connector drives the actions from the
injected provider:

```no_run
use eip1193_connector::{
    ChainTarget, Connector as _, ConnectorOptions, Eip1193, create_store_and_actions,
};

# async fn test() -> anyhow::Result<()> {
let (store, actions) = create_store_and_actions();
let connector = Eip1193::injected(actions, ConnectorOptions::default())?;
connector.activate(Some(ChainTarget::Id(1))).await?;
assert!(eip1193_connector::is_active(&store.get_state()));
# Ok(()) }
```

*/

mod actions;
pub mod connector;
mod eip1193;
pub mod error;
pub mod events;
pub mod ffi;
pub mod selection;
mod state;
mod store;

pub use self::{
    actions::{Actions, Cancel, create_store_and_actions},
    connector::{
        AddEthereumChainParameter, ChainTarget, Connector, ConnectorOptions, NativeCurrency,
        WatchAssetParameters,
    },
    eip1193::{Eip1193, Transport},
    events::ProviderEvent,
    selection::{Connectors, is_active, is_activating},
    state::{
        ConnectionState, MAX_SAFE_CHAIN_ID, StateUpdate, chain_id_from_f64, parse_chain_id,
        validate_account, validate_chain_id,
    },
    store::{Store, Subscription},
};
