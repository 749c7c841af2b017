/// Returns the number of logical CPU cores available on the system, the
/// basis for [`crate::config::nb_workers_default`]'s VBlock compute thread
/// count (§5) when the caller doesn't pass `--threads` explicitly.
///
/// Falls back to 1 on platforms where `available_parallelism` can't query
/// the OS, matching the "never schedule zero workers" invariant the
/// dispatcher relies on.
pub fn count_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_cores_is_at_least_one() {
        assert!(count_cores() >= 1);
    }

    #[test]
    fn nb_workers_default_never_exceeds_detected_cores() {
        assert!(crate::config::nb_workers_default() <= count_cores().max(1));
    }
}
