use rand::Rng;
use std::time::Duration;

/// Period of a seller/manager task, drawn from `[min_ms, max_ms)`.
pub fn random_role_interval(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms.max(1));
    }
    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(min_ms..max_ms))
}
