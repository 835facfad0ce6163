use crate::DeckId;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeckEvent {
    Created(DeckId),
    Updated(DeckId),
}

pub type DeckHook = Arc<dyn Fn(&DeckEvent) + Send + Sync>;

/// Subscribers notified synchronously after a deck write has been saved.
#[derive(Clone, Default)]
pub struct DeckHooks {
    hooks: Vec<DeckHook>,
}

impl DeckHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks with the informational logger already subscribed.
    pub fn logging() -> Self {
        Self::new().with(log_deck_event)
    }

    pub fn with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DeckEvent) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn emit(&self, event: DeckEvent) {
        for hook in &self.hooks {
            hook(&event);
        }
    }
}

pub fn log_deck_event(event: &DeckEvent) {
    match event {
        DeckEvent::Created(id) => tracing::info!("Deck created with ID: {id}"),
        DeckEvent::Updated(id) => tracing::info!("Deck updated with ID: {id}"),
    }
}
