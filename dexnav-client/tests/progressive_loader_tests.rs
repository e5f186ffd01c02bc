//! Timing tests for the progressive detail loader on paused tokio time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dexnav_client::loader::{LoadPhase, ProgressiveLoader};
use dexnav_core::{BuildMode, FetchShape, ItemId, ManualClock, DEFAULT_UPGRADE_DELAY};
use dexnav_storage::DetailCache;
use dexnav_test_utils::MockCatalogSource;
use proptest::prelude::*;
use tokio::time::Instant;

fn loader(source: Arc<MockCatalogSource>, mode: BuildMode) -> ProgressiveLoader {
    let details = Arc::new(DetailCache::new(Arc::new(ManualClock::starting_now())));
    ProgressiveLoader::new(source, details, mode, DEFAULT_UPGRADE_DELAY)
}

fn assert_near(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(10),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_runtime_detail_upgrades_on_schedule() {
    let source = Arc::new(
        MockCatalogSource::standard().with_detail_delays(Duration::ZERO, Duration::from_millis(500)),
    );
    let mut loader = loader(source.clone(), BuildMode::Runtime);
    let mut rx = loader.subscribe();
    let start = Instant::now();

    loader.load(ItemId::new("25"));

    let view = rx.wait_for(|v| !v.loading).await.unwrap().clone();
    assert_near(start.elapsed(), 0);
    assert_eq!(view.phase, LoadPhase::Initial);
    assert_eq!(view.shape(), Some(FetchShape::Partial));
    assert_eq!(view.data, source.expected_detail("25", FetchShape::Partial));

    rx.wait_for(|v| v.phase == LoadPhase::Upgrading).await.unwrap();
    assert_near(start.elapsed(), 2000);
    assert_eq!(loader.view().shape(), Some(FetchShape::Partial));

    rx.wait_for(|v| v.phase == LoadPhase::Upgraded).await.unwrap();
    assert_near(start.elapsed(), 2500);
    let view = loader.view();
    assert_eq!(view.data, source.expected_detail("25", FetchShape::Full));
    assert_eq!(source.detail_calls("25", FetchShape::Partial), 1);
    assert_eq!(source.detail_calls("25", FetchShape::Full), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_subject_switch_abandons_pending_upgrade() {
    let source = Arc::new(MockCatalogSource::standard());
    let mut loader = loader(source.clone(), BuildMode::Runtime);

    loader.set_subject(ItemId::new("25"));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    loader.set_subject(ItemId::new("1"));
    tokio::time::sleep(Duration::from_millis(5000)).await;

    assert_eq!(source.detail_calls("25", FetchShape::Full), 0);
    assert_eq!(source.detail_calls("1", FetchShape::Full), 1);
    let view = loader.view();
    assert_eq!(view.subject, Some(ItemId::new("1")));
    assert_eq!(view.phase, LoadPhase::Upgraded);
    assert_eq!(view.data, source.expected_detail("1", FetchShape::Full));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_subject_switch_during_upgrade_fetch_discards_it() {
    let source = Arc::new(
        MockCatalogSource::standard().with_detail_delays(Duration::ZERO, Duration::from_millis(500)),
    );
    let details = Arc::new(DetailCache::new(Arc::new(ManualClock::starting_now())));
    let mut loader = ProgressiveLoader::new(
        source.clone(),
        details.clone(),
        BuildMode::Runtime,
        DEFAULT_UPGRADE_DELAY,
    );

    loader.load(ItemId::new("25"));
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(loader.view().phase, LoadPhase::Upgrading);
    assert_eq!(source.detail_calls("25", FetchShape::Full), 1);

    loader.load(ItemId::new("1"));
    let mut rx = loader.subscribe();
    let seen = Arc::new(Mutex::new(vec![rx.borrow_and_update().clone()]));
    let collector = {
        let seen = seen.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let view = rx.borrow_and_update().clone();
                seen.lock().unwrap().push(view);
            }
        })
    };
    tokio::time::sleep(Duration::from_millis(5000)).await;

    for view in seen.lock().unwrap().iter() {
        assert_eq!(view.subject, Some(ItemId::new("1")));
        if let Some(item) = &view.data {
            assert_eq!(item.id, ItemId::new("1"));
        }
    }
    let view = loader.view();
    assert_eq!(view.phase, LoadPhase::Upgraded);
    assert_eq!(view.data, source.expected_detail("1", FetchShape::Full));
    assert!(details.get(&ItemId::new("25")).is_none());
    assert!(details.get(&ItemId::new("1")).is_some());
    assert_eq!(source.detail_calls("25", FetchShape::Full), 1);

    drop(loader);
    collector.abort();
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_late_partial_never_replaces_full_record() {
    let source = Arc::new(
        MockCatalogSource::standard().with_detail_delays(Duration::from_millis(3000), Duration::ZERO),
    );
    let mut loader = loader(source.clone(), BuildMode::Runtime);
    let mut rx = loader.subscribe();

    loader.load(ItemId::new("7"));
    assert!(loader.upgrade_now());
    rx.wait_for(|v| v.phase == LoadPhase::Upgraded).await.unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;
    let view = loader.view();
    assert_eq!(view.phase, LoadPhase::Upgraded);
    assert_eq!(view.shape(), Some(FetchShape::Full));
    assert_eq!(source.detail_calls("7", FetchShape::Full), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_static_mode_never_upgrades() {
    let source = Arc::new(MockCatalogSource::standard());
    let mut loader = loader(source.clone(), BuildMode::Static);
    loader.load(ItemId::new("3"));
    tokio::time::sleep(Duration::from_secs(10)).await;

    let view = loader.view();
    assert_eq!(view.phase, LoadPhase::Initial);
    assert_eq!(view.shape(), Some(FetchShape::Full));
    assert_eq!(source.total_calls(), 1);
    assert!(!loader.upgrade_now());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_unknown_item_reports_not_found() {
    let source = Arc::new(MockCatalogSource::standard());
    let mut loader = loader(source.clone(), BuildMode::Runtime);
    let mut rx = loader.subscribe();
    loader.load(ItemId::new("9999"));

    let view = rx.wait_for(|v| !v.loading).await.unwrap().clone();
    assert!(view.error.as_ref().is_some_and(|e| e.is_not_found()));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.detail_calls("9999", FetchShape::Full), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_phases_only_move_forward(
        partial_ms in 0u64..5000,
        full_ms in 0u64..5000,
        upgrade_early in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let (observed, final_view) = runtime.block_on(async move {
            let source = Arc::new(MockCatalogSource::standard().with_detail_delays(
                Duration::from_millis(partial_ms),
                Duration::from_millis(full_ms),
            ));
            let mut loader = loader(source, BuildMode::Runtime);
            let mut rx = loader.subscribe();
            let observed = Arc::new(Mutex::new(Vec::new()));
            let sink = observed.clone();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let view = rx.borrow_and_update().clone();
                    sink.lock().unwrap().push((view.phase, view.shape()));
                }
            });

            loader.load(ItemId::new("12"));
            if upgrade_early {
                loader.upgrade_now();
            }
            tokio::time::sleep(Duration::from_secs(15)).await;
            let seen = observed.lock().unwrap().clone();
            (seen, loader.view())
        });

        prop_assert_eq!(final_view.phase, LoadPhase::Upgraded);
        prop_assert_eq!(final_view.shape(), Some(FetchShape::Full));
        for pair in observed.windows(2) {
            prop_assert!(pair[0].0 <= pair[1].0);
            if pair[0].1 == Some(FetchShape::Full) {
                prop_assert_eq!(pair[1].1, Some(FetchShape::Full));
            }
        }
    }
}
