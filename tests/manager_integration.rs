//! 定时器引擎集成测试
//! Timer engine integration tests
//!
//! 覆盖完整链路:滴答源 -> 滴答通道 -> 滴答任务 -> 到期回调,以及并发
//! 场景下的公共 API。
//! Covers the full path, tick source -> tick channel -> tick task ->
//! expiry callback, plus the public API under concurrency.

use kestrel_tick::{
    Config, StopOption, TickEvent, TimerCallback, TimerError, TimerManager, TimerState, TimerTask,
};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::{sleep, timeout};

type Counter = Arc<AtomicU32>;

fn counter() -> Counter {
    Arc::new(AtomicU32::new(0))
}

fn counting() -> TimerCallback<Counter> {
    TimerCallback::new(|count: Counter| {
        count.fetch_add(1, Ordering::SeqCst);
    })
}

/// 等待滴答任务消费到目标计数。
async fn wait_for_tick<A: Clone + Send + 'static>(manager: &TimerManager<A>, target: u64) {
    timeout(Duration::from_secs(2), async {
        while manager.tick() < target {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("tick count did not reach target in time");
}

#[tokio::test(start_paused = true)]
async fn one_shot_fires_through_the_interval_tick_source() {
    let manager = TimerManager::with_defaults().unwrap();
    let count = counter();
    let handle = manager
        .create(TimerTask::one_shot(5, counting(), count.clone()).named("one-shot"))
        .unwrap();
    manager.start(handle).unwrap();
    let source = manager.start_tick_source();

    // 测试时钟暂停,sleep 自动快进:经过 5 个完整的 100ms 间隔
    sleep(Duration::from_millis(550)).await;
    assert_eq!(manager.tick(), 5);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state_of(handle), Ok(TimerState::Completed));
    assert_eq!(manager.remaining_ticks(handle), Ok(0));

    source.abort();
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn periodic_cadence_through_the_interval_tick_source() {
    let mut config = Config::default();
    config.tick.tick_interval = Duration::from_millis(10);
    let manager = TimerManager::new(config).unwrap();
    let count = counter();
    let handle = manager
        .create(TimerTask::periodic(0, 3, counting(), count.clone()).named("cadence"))
        .unwrap();
    manager.start(handle).unwrap();
    let source = manager.start_tick_source();

    // 9 个滴答,第 3、6、9 个到期
    sleep(Duration::from_millis(95)).await;
    assert_eq!(manager.tick(), 9);
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(manager.state_of(handle), Ok(TimerState::Running));

    source.abort();
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn manually_injected_ticks_advance_exactly_once_each() {
    let manager = TimerManager::with_defaults().unwrap();
    let count = counter();
    let handle = manager
        .create(TimerTask::one_shot(3, counting(), count.clone()))
        .unwrap();
    manager.start(handle).unwrap();
    let sender = manager.tick_sender();

    // 差一个滴答:不得提前触发
    for _ in 0..2 {
        sender.send(TickEvent).await.unwrap();
    }
    wait_for_tick(&manager, 2).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(manager.remaining_ticks(handle), Ok(1));

    sender.send(TickEvent).await.unwrap();
    wait_for_tick(&manager, 3).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state_of(handle), Ok(TimerState::Completed));
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn a_burst_of_tick_events_is_counted_one_by_one() {
    let manager = TimerManager::with_defaults().unwrap();
    let count = counter();
    let handle = manager
        .create(TimerTask::periodic(0, 2, counting(), count.clone()))
        .unwrap();
    manager.start(handle).unwrap();

    let sender = manager.tick_sender();
    for _ in 0..10 {
        sender.send(TickEvent).await.unwrap();
    }
    wait_for_tick(&manager, 10).await;

    // 10 个事件就是 10 个滴答,一个不合并;周期 2 到期 5 次
    assert_eq!(manager.tick(), 10);
    assert_eq!(count.load(Ordering::SeqCst), 5);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn independent_managers_do_not_share_state() {
    let first = TimerManager::with_defaults().unwrap();
    let second = TimerManager::with_defaults().unwrap();
    let first_count = counter();
    let second_count = counter();
    let first_timer = first
        .create(TimerTask::one_shot(3, counting(), first_count.clone()))
        .unwrap();
    let second_timer = second
        .create(TimerTask::one_shot(3, counting(), second_count.clone()))
        .unwrap();
    first.start(first_timer).unwrap();
    second.start(second_timer).unwrap();

    // 只驱动第一个引擎:第二个的滴答与定时器必须纹丝不动
    let sender = first.tick_sender();
    for _ in 0..3 {
        sender.send(TickEvent).await.unwrap();
    }
    wait_for_tick(&first, 3).await;

    assert_eq!(first.tick(), 3);
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(first.state_of(first_timer), Ok(TimerState::Completed));
    assert_eq!(second.tick(), 0);
    assert_eq!(second_count.load(Ordering::SeqCst), 0);
    assert_eq!(second.state_of(second_timer), Ok(TimerState::Running));
    assert_eq!(second.remaining_ticks(second_timer), Ok(3));

    // 第一个引擎关停后,第二个照常推进
    first.shutdown().await;
    let sender = second.tick_sender();
    for _ in 0..3 {
        sender.send(TickEvent).await.unwrap();
    }
    wait_for_tick(&second, 3).await;
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
    assert_eq!(second.state_of(second_timer), Ok(TimerState::Completed));
    second.shutdown().await;
}

#[tokio::test]
async fn stop_with_callback_runs_synchronously_on_the_caller() {
    let manager = TimerManager::with_defaults().unwrap();
    let count = counter();
    let handle = manager
        .create(TimerTask::one_shot(50, counting(), count.clone()))
        .unwrap();
    manager.start(handle).unwrap();

    // stop 返回时回调必须已经执行完,中间没有任何 await
    manager.stop(handle, StopOption::Callback).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state_of(handle), Ok(TimerState::Stopped));

    assert_eq!(
        manager.stop(handle, StopOption::None),
        Err(TimerError::AlreadyStopped)
    );
    manager.shutdown().await;
}

#[tokio::test]
async fn stop_with_callback_arg_uses_the_override_argument() {
    let manager = TimerManager::with_defaults().unwrap();
    let own = counter();
    let other = counter();
    let handle = manager
        .create(TimerTask::one_shot(50, counting(), own.clone()))
        .unwrap();
    manager.start(handle).unwrap();

    manager
        .stop(handle, StopOption::CallbackArg(other.clone()))
        .unwrap();
    assert_eq!(other.load(Ordering::SeqCst), 1);
    assert_eq!(own.load(Ordering::SeqCst), 0);
    manager.shutdown().await;
}

#[tokio::test]
async fn deleted_timers_reject_further_operations() {
    let manager = TimerManager::with_defaults().unwrap();
    let count = counter();
    let handle = manager
        .create(TimerTask::one_shot(5, counting(), count.clone()).named("gone"))
        .unwrap();
    manager.delete(handle).unwrap();

    assert_eq!(manager.start(handle), Err(TimerError::Inactive));
    assert_eq!(
        manager.stop(handle, StopOption::None),
        Err(TimerError::Inactive)
    );
    assert_eq!(manager.name_of(handle), Err(TimerError::Inactive));
    assert_eq!(manager.state_of(handle), Ok(TimerState::Unused));

    // 槽位复用之后,旧句柄按代数不符拒绝
    let fresh = manager
        .create(TimerTask::one_shot(5, counting(), count.clone()))
        .unwrap();
    assert_eq!(manager.state_of(handle), Err(TimerError::InvalidType));
    manager.delete(fresh).unwrap();
    manager.shutdown().await;
}

#[tokio::test]
async fn concurrent_churn_returns_every_slot() {
    let manager = Arc::new(TimerManager::with_defaults().unwrap());
    let capacity = manager.capacity();

    let mut workers = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        workers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let handle = manager
                    .create(TimerTask::one_shot(5, TimerCallback::new(|_: ()| {}), ()))
                    .unwrap();
                manager.start(handle).unwrap();
                manager.stop(handle, StopOption::None).unwrap();
                manager.delete(handle).unwrap();
            }
        }));
    }
    for worker in futures::future::join_all(workers).await {
        worker.unwrap();
    }

    assert_eq!(manager.free_count(), capacity);
    assert_eq!(manager.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn randomized_one_shot_churn_fires_each_timer_exactly_once() {
    let manager = TimerManager::with_defaults().unwrap();
    let count = counter();
    let mut rng = rand::rng();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let delay = rng.random_range(1..=20);
        let handle = manager
            .create(TimerTask::one_shot(delay, counting(), count.clone()))
            .unwrap();
        manager.start(handle).unwrap();
        handles.push(handle);
    }
    assert_eq!(manager.active_count(), 20);

    // 最长延迟也在 20 个滴答内,全部应当恰好触发一次
    let sender = manager.tick_sender();
    for _ in 0..20 {
        sender.send(TickEvent).await.unwrap();
    }
    wait_for_tick(&manager, 20).await;

    assert_eq!(count.load(Ordering::SeqCst), 20);
    assert_eq!(manager.active_count(), 0);
    for handle in handles {
        assert_eq!(manager.state_of(handle), Ok(TimerState::Completed));
    }
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_tick_source_with_it() {
    let manager = TimerManager::<()>::with_defaults().unwrap();
    let source = manager.start_tick_source();
    sleep(Duration::from_millis(250)).await;
    assert_eq!(manager.tick(), 2);

    manager.shutdown().await;
    // 消费端没了,滴答源在下一次发送失败后自行退出
    timeout(Duration::from_secs(1), source)
        .await
        .expect("tick source should exit after shutdown")
        .unwrap();
}
