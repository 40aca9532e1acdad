use crate::domain::SessionId;
use uuid::Uuid;

/// Returns a fresh session id for a newly accepted connection.
///
/// Ids are random v4 UUIDs in hyphenated form.
pub fn new_session_id() -> SessionId {
    SessionId::new(Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn when_generating_many_ids_then_all_are_distinct() {
        let ids: HashSet<SessionId> = (0..1_000).map(|_| new_session_id()).collect();

        assert_eq!(ids.len(), 1_000);
    }
}
