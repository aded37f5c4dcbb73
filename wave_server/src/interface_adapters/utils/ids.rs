use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a process-unique, monotonically increasing identifier.
///
/// Shared by player ids, connection ids and generated world ids, so values never repeat
/// across kinds within one process.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_ids_are_drawn_then_they_never_repeat() {
        let a = next_id();
        let b = next_id();
        assert!(b > a);
        assert_ne!(a, 0);
    }
}
