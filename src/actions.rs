use crate::{
    error::Error,
    state::{ConnectionState, StateUpdate},
    store::Store,
};
use std::{cell::Cell, fmt, rc::Rc};

/// Create the [`Store`] of a connector together with the [`Actions`]
/// allowed to mutate it.
///
/// The store is handed to the observers, the actions to the connector.
pub fn create_store_and_actions() -> (Store<ConnectionState>, Actions) {
    let store = Store::new(ConnectionState::default());
    let actions = Actions {
        inner: Rc::new(Inner {
            store: store.clone(),
            generation: Cell::new(0),
        }),
    };
    (store, actions)
}

/// The only way to mutate a [`ConnectionState`].
///
/// Every mutation bumps a generation counter. [`Actions::start_activation`]
/// remembers the generation it started at so a failed activation can be
/// reverted only if nothing happened since.
#[derive(Clone)]
pub struct Actions {
    inner: Rc<Inner>,
}

struct Inner {
    store: Store<ConnectionState>,
    generation: Cell<u64>,
}

/// Reverts the `activating` flag of the activation that created it, as long
/// as no other mutation happened in the meantime.
#[must_use = "the activation can only be cancelled with this handle"]
pub struct Cancel {
    inner: Rc<Inner>,
    generation: u64,
}

impl Inner {
    fn bump(&self) -> u64 {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        generation
    }
}

impl Actions {
    /// Start a new activation.
    ///
    /// The state is cleared and `activating` is set. Call [`Cancel::cancel`]
    /// on the returned handle if the activation fails.
    pub fn start_activation(&self) -> Cancel {
        let generation = self.inner.bump();

        self.inner.store.set_state(ConnectionState {
            activating: true,
            ..ConnectionState::default()
        });

        Cancel {
            inner: Rc::clone(&self.inner),
            generation,
        }
    }

    /// Validate and apply the given update.
    ///
    /// The chain id must be in bounds and every account must be a valid
    /// address, accounts are stored in their checksummed form. On error
    /// the state is left untouched.
    pub fn update(&self, update: StateUpdate) -> Result<ConnectionState, Error> {
        let update = update.validated()?;
        Ok(self.update_unchecked(update))
    }

    /// Apply the given update without validating it. Only use this with
    /// values that were already validated.
    pub fn update_unchecked(&self, update: StateUpdate) -> ConnectionState {
        self.inner.bump();
        self.inner.store.update(|existing| update.apply(existing));
        self.inner.store.get_state()
    }

    /// Put back the default state.
    pub fn reset_state(&self) -> ConnectionState {
        self.inner.bump();
        self.inner.store.set_state(ConnectionState::default());
        ConnectionState::default()
    }

    pub fn get_state(&self) -> ConnectionState {
        self.inner.store.get_state()
    }

    /// the store these actions are writing to
    pub fn store(&self) -> &Store<ConnectionState> {
        &self.inner.store
    }
}

impl Cancel {
    /// Revert the activation if it is still the latest mutation, otherwise
    /// do nothing. Returns the current state either way.
    pub fn cancel(&self) -> ConnectionState {
        if self.inner.generation.get() == self.generation {
            // chain id and accounts were never set by this activation
            self.inner.store.update(|existing| ConnectionState {
                activating: false,
                adding_chain: None,
                switching_chain: None,
                ..existing.clone()
            });
        }
        self.inner.store.get_state()
    }

    /// `false` once any other mutation happened after the activation started
    pub fn is_current(&self) -> bool {
        self.inner.generation.get() == self.generation
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("generation", &self.inner.generation.get())
            .field("state", &self.inner.store.get_state())
            .finish()
    }
}

impl fmt::Debug for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancel")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MAX_SAFE_CHAIN_ID;
    use std::cell::RefCell;

    const ACCOUNT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn default_state() {
        let (store, actions) = create_store_and_actions();
        assert_eq!(store.get_state(), ConnectionState::default());
        assert_eq!(actions.get_state(), ConnectionState::default());
    }

    #[test]
    fn chain_id_bounds() {
        let (store, actions) = create_store_and_actions();

        let state = actions
            .update(StateUpdate::new().chain_id(MAX_SAFE_CHAIN_ID))
            .unwrap();
        assert_eq!(state.chain_id, Some(4503599627370476));

        assert!(matches!(
            actions.update(StateUpdate::new().chain_id(MAX_SAFE_CHAIN_ID + 1)),
            Err(Error::InvalidChainId(_))
        ));
        assert!(actions.update(StateUpdate::new().chain_id(0)).is_err());
        assert_eq!(store.get_state().chain_id, Some(MAX_SAFE_CHAIN_ID));
    }

    #[test]
    fn invalid_update_does_not_bump_generation() {
        let (_store, actions) = create_store_and_actions();
        let cancel = actions.start_activation();

        assert!(actions.update(StateUpdate::new().accounts(["0x1"])).is_err());
        assert!(cancel.is_current());
        assert!(!cancel.cancel().activating);
    }

    #[test]
    fn accounts_are_checksummed() {
        let (_store, actions) = create_store_and_actions();
        let state = actions
            .update(StateUpdate::new().accounts([ACCOUNT]))
            .unwrap();
        assert_eq!(state.accounts, Some(vec![CHECKSUMMED.to_owned()]));
    }

    #[test]
    fn unchecked_update_keeps_values() {
        let (_store, actions) = create_store_and_actions();
        let state = actions.update_unchecked(StateUpdate::new().chain_id(0).accounts([ACCOUNT]));
        assert_eq!(state.chain_id, Some(0));
        assert_eq!(state.accounts, Some(vec![ACCOUNT.to_owned()]));
    }

    #[test]
    fn activation_clears_transient_fields() {
        let (_store, actions) = create_store_and_actions();
        actions
            .update(
                StateUpdate::new()
                    .chain_id(1)
                    .accounts([ACCOUNT])
                    .account_index(0)
                    .adding_chain(10)
                    .switching_chain(137)
                    .watching_asset(CHECKSUMMED),
            )
            .unwrap();

        let _cancel = actions.start_activation();
        assert_eq!(
            actions.get_state(),
            ConnectionState {
                activating: true,
                ..ConnectionState::default()
            }
        );
    }

    #[test]
    fn cancel_current_activation() {
        let (_store, actions) = create_store_and_actions();
        let cancel = actions.start_activation();
        let state = cancel.cancel();
        assert!(!state.activating);
        assert_eq!(state, ConnectionState::default());
    }

    #[test]
    fn cancel_keeps_watching_asset() {
        let (store, actions) = create_store_and_actions();
        let cancel = actions.start_activation();
        // emulate a write that doesn't go through the actions
        store.update(|state| ConnectionState {
            adding_chain: Some(10),
            switching_chain: Some(137),
            watching_asset: Some(CHECKSUMMED.to_owned()),
            ..state.clone()
        });

        let state = cancel.cancel();
        assert!(!state.activating);
        assert_eq!(state.adding_chain, None);
        assert_eq!(state.switching_chain, None);
        assert_eq!(state.watching_asset, Some(CHECKSUMMED.to_owned()));
    }

    #[test]
    fn stale_cancel_is_a_noop() {
        let (_store, actions) = create_store_and_actions();
        let cancel1 = actions.start_activation();
        let cancel2 = actions.start_activation();

        assert!(!cancel1.is_current());
        assert!(cancel1.cancel().activating);

        let state = cancel2.cancel();
        assert!(!state.activating);
    }

    #[test]
    fn cancel_after_update_is_a_noop() {
        let (_store, actions) = create_store_and_actions();
        let cancel = actions.start_activation();
        actions.update(StateUpdate::new().chain_id(1)).unwrap();

        let state = cancel.cancel();
        assert!(state.activating);
        assert_eq!(state.chain_id, Some(1));
    }

    #[test]
    fn activating_ends_with_chain_and_accounts() {
        let (_store, actions) = create_store_and_actions();
        let _cancel = actions.start_activation();

        let state = actions
            .update(StateUpdate::new().chain_id(1).accounts([ACCOUNT]))
            .unwrap();
        assert!(!state.activating);
    }

    #[test]
    fn activating_needs_both_values() {
        let (_store, actions) = create_store_and_actions();
        let _cancel = actions.start_activation();

        assert!(actions.update(StateUpdate::new().chain_id(1)).unwrap().activating);
        assert!(
            actions
                .update(StateUpdate::new().accounts(Vec::<String>::new()))
                .unwrap()
                .activating
        );
        assert!(
            !actions
                .update(StateUpdate::new().accounts([ACCOUNT]))
                .unwrap()
                .activating
        );
    }

    #[test]
    fn activating_is_a_one_way_gate() {
        let (_store, actions) = create_store_and_actions();
        let _cancel = actions.start_activation();
        actions
            .update(StateUpdate::new().chain_id(1).accounts([ACCOUNT]))
            .unwrap();

        let state = actions
            .update(StateUpdate::new().accounts(Vec::<String>::new()))
            .unwrap();
        assert!(!state.activating);
    }

    #[test]
    fn explicit_clear_and_absent_fields() {
        let (_store, actions) = create_store_and_actions();
        actions
            .update(StateUpdate::new().account_index(1).switching_chain(5))
            .unwrap();

        let state = actions.update(StateUpdate::new().chain_id(5)).unwrap();
        assert_eq!(state.account_index, Some(1));
        assert_eq!(state.switching_chain, Some(5));

        let state = actions
            .update(StateUpdate::new().clear_account_index())
            .unwrap();
        assert_eq!(state.account_index, None);
        assert_eq!(state.switching_chain, Some(5));
        assert_eq!(state.chain_id, Some(5));
    }

    #[test]
    fn reset_state_is_idempotent() {
        let (_store, actions) = create_store_and_actions();
        let cancel = actions.start_activation();
        actions
            .update(StateUpdate::new().chain_id(1).switching_chain(5))
            .unwrap();

        let first = actions.reset_state();
        let second = actions.reset_state();
        assert_eq!(first, ConnectionState::default());
        assert_eq!(first, second);

        assert!(!cancel.is_current());
        assert_eq!(cancel.cancel(), ConnectionState::default());
    }

    #[test]
    fn reset_invalidates_pending_activation() {
        let (_store, actions) = create_store_and_actions();
        let cancel = actions.start_activation();
        actions.reset_state();
        let again = actions.start_activation();

        assert!(cancel.cancel().activating);
        assert!(!again.cancel().activating);
    }

    #[test]
    fn observers_see_every_change() {
        let (store, actions) = create_store_and_actions();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let _subscription = store.subscribe(move |state: &ConnectionState| {
            sink.borrow_mut().push(state.activating)
        });

        let cancel = actions.start_activation();
        let _ = cancel.cancel();
        actions.reset_state();

        assert_eq!(*seen.borrow(), vec![true, false, false]);
    }
}
