//! Stale-response suppression for a single consumer.

use std::sync::Mutex;

use crate::search::SearchState;

/// Handle for one request issued by a `ListSession`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    state: SearchState,
}

impl Ticket {
    pub fn state(&self) -> &SearchState {
        &self.state
    }
}

#[derive(Debug, Default)]
struct Current {
    generation: u64,
    state: Option<SearchState>,
}

/// Tracks the search state a consumer currently displays.
///
/// Responses may arrive in any order; only the one for the latest `begin`
/// is accepted.
#[derive(Debug, Default)]
pub struct ListSession {
    current: Mutex<Current>,
}

impl ListSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `state` the current one and issue a ticket for its request.
    pub fn begin(&self, state: SearchState) -> Ticket {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.generation += 1;
        current.state = Some(state.clone());
        Ticket {
            generation: current.generation,
            state,
        }
    }

    /// Whether `ticket` belongs to the latest `begin`.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.generation == ticket.generation
    }

    /// Accept `result` only if its ticket is still current.
    pub fn complete<T>(&self, ticket: &Ticket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(
                page = ticket.state.page,
                "Discarding response for superseded search state"
            );
            None
        }
    }

    pub fn current_state(&self) -> Option<SearchState> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let session = ListSession::new();
        let first = session.begin(SearchState::default().with_page(1));
        let second = session.begin(SearchState::default().with_page(2));

        // The older response arrives last and must be dropped.
        assert_eq!(session.complete(&second, "page 2"), Some("page 2"));
        assert_eq!(session.complete(&first, "page 1"), None);
        assert_eq!(session.current_state().unwrap().page, 2);
    }

    #[test]
    fn test_ticket_carries_state() {
        let session = ListSession::new();
        let ticket = session.begin(SearchState::default().with_page(3));
        assert_eq!(ticket.state().page, 3);
        assert!(session.is_current(&ticket));
    }
}
