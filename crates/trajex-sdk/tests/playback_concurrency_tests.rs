//! 播放控制并发测试
//!
//! 多个线程同时修改与查询同一个管理器：
//! 1. 读到的有效速度始终来自某一次完整写入
//! 2. 回调在锁外执行，可以安全地回调管理器
//! 3. 事件数量与实际变化一致

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use trajex_sdk::playback::{ControlSource, PlaybackEvent};
use trajex_sdk::prelude::*;

fn group(index: u32) -> MotionGroupId {
    MotionGroupId::from_parts(index, "ur5e")
}

#[test]
fn test_concurrent_overrides_resolve_to_written_values() {
    let manager = Arc::new(PlaybackControlManager::new());
    let id = group(0);
    manager.register_robot(&id, Some("left"), 30).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            let id = id.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    // 每个线程只写 10 的倍数
                    let speed = ((t * 500 + i) % 11) * 10;
                    manager.set_external_override(&id, speed, None, None).unwrap();
                    if i % 7 == 0 {
                        manager.clear_external_override(&id);
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let id = id.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    let control = manager.effective_control(&id, None);
                    let value = control.speed.value();
                    match control.source {
                        ControlSource::External => assert_eq!(value % 10, 0),
                        ControlSource::Decorator => assert_eq!(value, 30),
                        other => panic!("Unexpected source {:?}", other),
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    manager.clear_external_override(&id);
    assert_eq!(manager.get_effective_speed(&id, None).value(), 30);
}

#[test]
fn test_pause_resume_from_many_threads() {
    let manager = Arc::new(PlaybackControlManager::new());
    let ids: Vec<_> = (0..8).map(group).collect();
    for id in &ids {
        manager.register_robot(id, None, 100).unwrap();
    }

    let state_changes = Arc::new(AtomicUsize::new(0));
    {
        let state_changes = Arc::clone(&state_changes);
        manager.register_event_callback(move |event: &PlaybackEvent| {
            if matches!(event, PlaybackEvent::StateChanged { .. }) {
                state_changes.fetch_add(1, Ordering::SeqCst);
            }
        });
    }

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for _ in 0..100 {
                    manager.pause(&id);
                    manager.pause(&id);
                    assert!(manager.can_resume(&id));
                    manager.resume(&id);
                    manager.resume(&id);
                    assert!(manager.can_pause(&id));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 重复的 pause / resume 不产生事件
    assert_eq!(state_changes.load(Ordering::SeqCst), 8 * 100 * 2);
    for id in &ids {
        assert_eq!(manager.get_effective_state(id), PlaybackState::Playing);
    }
}

#[test]
fn test_callbacks_may_reenter_manager_across_threads() {
    let manager = Arc::new(PlaybackControlManager::new());
    let observed = Arc::new(Mutex::new(Vec::new()));
    {
        let weak = Arc::downgrade(&manager);
        let observed = Arc::clone(&observed);
        manager.register_event_callback(move |event: &PlaybackEvent| {
            if let (PlaybackEvent::SpeedChanged { id, .. }, Some(manager)) = (event, weak.upgrade()) {
                observed.lock().push(manager.get_effective_speed(id, None).value());
            }
        });
    }

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let id = group(i);
                manager.register_robot(&id, None, 100).unwrap();
                manager.set_decorator_default(&id, 40 + i64::from(i)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut seen = observed.lock().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![40, 41, 42, 43]);
    assert_eq!(manager.get_all_robots().len(), 4);
}

proptest! {
    #[test]
    fn prop_external_override_wins_over_method_speed(
        decorator in 0i64..=100,
        method in 0i64..=100,
        external in 0i64..=100,
    ) {
        let manager = PlaybackControlManager::new();
        let id = group(1);
        manager.register_robot(&id, None, decorator).unwrap();
        let method = PlaybackSpeedPercent::new(method).unwrap();

        prop_assert_eq!(manager.get_effective_speed(&id, Some(method)), method);

        manager.set_external_override(&id, external, None, None).unwrap();
        prop_assert_eq!(
            i64::from(manager.get_effective_speed(&id, Some(method)).value()),
            external
        );

        manager.clear_external_override(&id);
        prop_assert_eq!(
            i64::from(manager.get_effective_speed(&id, None).value()),
            decorator
        );
    }
}
