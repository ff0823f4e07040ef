use crate::{ConnectionState, Store, error::Error};

/// `true` once a chain id and at least one account are known and no
/// activation is pending.
pub fn is_active(state: &ConnectionState) -> bool {
    state.chain_id.is_some()
        && state.accounts.as_ref().is_some_and(|accounts| !accounts.is_empty())
        && !state.activating
}

pub fn is_activating(state: &ConnectionState) -> bool {
    state.activating
}

/// The stores of the connectors an application is using, in order of
/// priority.
#[derive(Debug, Clone, Default)]
pub struct Connectors {
    entries: Vec<(String, Store<ConnectionState>)>,
}

impl Connectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector's store. A store registered under an
    /// existing name replaces it and keeps its priority.
    pub fn insert(&mut self, name: impl Into<String>, store: Store<ConnectionState>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = store,
            None => self.entries.push((name, store)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, store: Store<ConnectionState>) -> Self {
        self.insert(name, store);
        self
    }

    pub fn get(&self, name: &str) -> Result<&Store<ConnectionState>, Error> {
        self.entries
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, store)| store)
            .ok_or_else(|| {
                tracing::debug!(name, "unknown connector");
                Error::UnknownConnector(name.to_owned())
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The first active connector, or the first registered one if none
    /// of them is active.
    pub fn priority(&self) -> Option<(&str, &Store<ConnectionState>)> {
        self.entries
            .iter()
            .find(|(_, store)| is_active(&store.get_state()))
            .or_else(|| self.entries.first())
            .map(|(name, store)| (name.as_str(), store))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
