//! EIP-1193 provider events and how they translate into [`Actions`].

use crate::{
    Actions, ConnectionState, ConnectorOptions, StateUpdate,
    error::{Error, ProviderRpcError},
    state::parse_chain_id,
};

/// The events an EIP-1193 provider emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// the provider can submit requests to `chain_id` (hexadecimal)
    Connect { chain_id: String },
    /// the provider can no longer submit requests to any chain
    Disconnect(ProviderRpcError),
    ChainChanged(String),
    /// an empty list means the wallet was locked or the application was
    /// disconnected from the wallet
    AccountsChanged(Vec<String>),
}

impl ProviderEvent {
    /// name of the event, as passed to `provider.on()`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect(_) => "disconnect",
            Self::ChainChanged(_) => "chainChanged",
            Self::AccountsChanged(_) => "accountsChanged",
        }
    }

    /// Apply the event to the state.
    ///
    /// A disconnection resets the state and then returns the provider
    /// error it carried.
    pub fn apply(self, actions: &Actions) -> Result<ConnectionState, Error> {
        match self {
            Self::Connect { chain_id } | Self::ChainChanged(chain_id) => {
                let chain_id = parse_chain_id(&chain_id)?;
                actions.update(StateUpdate::new().chain_id(chain_id))
            }
            Self::Disconnect(error) => {
                actions.reset_state();
                Err(Error::Provider(error))
            }
            Self::AccountsChanged(accounts) if accounts.is_empty() => Ok(actions.reset_state()),
            Self::AccountsChanged(accounts) => actions.update(StateUpdate::new().accounts(accounts)),
        }
    }
}

/// Apply the event, routing any error to [`ConnectorOptions::on_error`].
pub fn dispatch(actions: &Actions, options: &ConnectorOptions, event: ProviderEvent) {
    tracing::debug!(event = event.name(), "provider event");
    if let Err(error) = event.apply(actions) {
        options.report(&error);
    }
}
