use super::*;
use std::thread;

#[test]
fn test_builder_defaults() {
    let controller = RateController::new();
    assert_eq!(controller.idle_credit(), Some(DEFAULT_IDLE_CREDIT));
    assert!(controller.is_empty());

    let custom = RateController::builder()
        .capacity(10)
        .idle_credit(Duration::from_millis(250))
        .build();
    assert_eq!(custom.idle_credit(), Some(Duration::from_millis(250)));

    let unbounded = RateControllerBuilder::new().unbounded_idle_credit().build();
    assert_eq!(unbounded.idle_credit(), None);
}

#[test]
fn test_raters_inherit_idle_credit() {
    let controller = RateController::builder()
        .idle_credit(Duration::from_millis(300))
        .build();

    let keyed = controller.resolve(RateLimit::kib_per_sec(1), "k");
    let private = controller.resolve(RateLimit::kib_per_sec(1), "");

    assert_eq!(keyed.idle_credit(), Some(Duration::from_millis(300)));
    assert_eq!(private.idle_credit(), Some(Duration::from_millis(300)));
}

#[test]
fn test_same_key_same_rate_is_shared() {
    let controller = RateController::new();
    let rate = RateLimit::kib_per_sec(8);

    let a = controller.resolve(rate, "user:1");
    let b = controller.resolve(rate, "user:1");

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(controller.len(), 1);
}

#[test]
fn test_empty_key_is_always_private() {
    let controller = RateController::new();
    let rate = RateLimit::kib_per_sec(8);

    let a = controller.resolve(rate, "");
    let b = controller.resolve(rate, "");

    assert!(!Arc::ptr_eq(&a, &b));
    // Private raters are never registered
    assert!(controller.is_empty());
}

#[test]
fn test_rate_change_replaces_rater() {
    let controller = RateController::new();

    let old = controller.resolve(RateLimit::kib_per_sec(1), "user:1");
    old.record_transfer(4096);

    let new = controller.resolve(RateLimit::kib_per_sec(2), "user:1");
    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(new.rate(), RateLimit::kib_per_sec(2));
    // The replacement starts with a clean slate
    assert!(new.available_at() < old.available_at());
    assert_eq!(controller.len(), 1);

    // Old holders keep their rater; new lookups get the replacement
    let again = controller.resolve(RateLimit::kib_per_sec(2), "user:1");
    assert!(Arc::ptr_eq(&new, &again));
    assert_eq!(old.rate(), RateLimit::kib_per_sec(1));
}

#[test]
fn test_throttle_bypasses_unlimited_rates() {
    let controller = RateController::new();

    assert!(
        controller
            .throttle(Policy::Sleep, RateLimit::UNLIMITED, "user:1")
            .is_none()
    );
    assert!(
        controller
            .throttle(Policy::Discard, RateLimit::bytes_per_sec(-5), "user:1")
            .is_none()
    );
    assert!(controller.is_empty());

    let throttle = controller
        .throttle(Policy::Discard, RateLimit::kib_per_sec(1), "user:1")
        .unwrap();
    assert_eq!(throttle.policy(), Policy::Discard);
    assert_eq!(controller.len(), 1);
}

#[test]
fn test_global_is_a_singleton() {
    let a = RateController::global();
    let b = RateController::global();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_concurrent_resolution_shares_one_rater() {
    let controller = Arc::new(RateController::new());
    let rate = RateLimit::mib_per_sec(1);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                (0..100)
                    .map(|_| controller.resolve(rate, "hot-key"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let raters: Vec<Arc<Rater>> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    let first = &raters[0];
    assert!(raters.iter().all(|rater| Arc::ptr_eq(rater, first)));
    assert_eq!(controller.len(), 1);
}

#[test]
fn test_many_keys_register_separately() {
    let controller = RateController::builder().capacity(1000).build();
    let rate = RateLimit::kib_per_sec(1);

    for i in 0..1000 {
        controller.resolve(rate, &format!("key_{i}"));
    }

    assert_eq!(controller.len(), 1000);
}
