use std::sync::OnceLock;

use crate::errors::IdentityConflict;

/// Write-once holder for the identifier the hub assigns on registration.
///
/// Shared between the session loop (writer) and the liveness task (reader).
/// The value is published whole, so a reader sees either nothing or the
/// complete identifier.
#[derive(Debug, Default)]
pub struct IdentityStore {
    id: OnceLock<String>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `id` unless an identity is already held, in which case the held
    /// value is kept and reported back.
    pub fn assign(&self, id: impl Into<String>) -> Result<(), IdentityConflict> {
        self.id.set(id.into()).map_err(|_| IdentityConflict {
            held: self.id.get().cloned().unwrap_or_default(),
        })
    }

    pub fn current(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_starts_empty() {
        assert_eq!(IdentityStore::new().current(), None);
    }

    #[test]
    fn test_assign_is_write_once() {
        let store = IdentityStore::new();
        assert!(store.assign("A").is_ok());
        assert_eq!(
            store.assign("B"),
            Err(IdentityConflict {
                held: "A".to_string()
            })
        );
        assert_eq!(store.current(), Some("A"));
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        const CANDIDATES: [&str; 2] = [
            "0f8fad5b-d9cb-469f-a165-70867728950e",
            "ffffffff-ffff-ffff-ffff-ffffffffffff",
        ];
        for _ in 0..200 {
            let store = Arc::new(IdentityStore::new());

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        let mut first_seen: Option<String> = None;
                        for _ in 0..1_000 {
                            if let Some(seen) = store.current() {
                                assert!(CANDIDATES.contains(&seen));
                                // once observed, the value never changes
                                let first = first_seen.get_or_insert_with(|| seen.to_string());
                                assert_eq!(first, seen);
                            }
                        }
                    })
                })
                .collect();

            let writers: Vec<_> = CANDIDATES
                .into_iter()
                .map(|candidate| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        let _ = store.assign(candidate);
                    })
                })
                .collect();

            for handle in writers.into_iter().chain(readers) {
                handle.join().unwrap();
            }
            assert!(CANDIDATES.contains(&store.current().unwrap()));
        }
    }
}
