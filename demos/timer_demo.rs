//! 三个定时器的演示:两个周期,一个单次。
//! A demo of three timers, two periodic and one one-shot.
//!
//! 默认滴答间隔 100ms:50 滴答是 5 秒,30 滴答是 3 秒,100 滴答是 10 秒。
//! At the default 100ms tick interval, 50 ticks are 5 seconds, 30 ticks
//! are 3 seconds and 100 ticks are 10 seconds.
//!
//! Run with: `cargo run --example timer_demo`

use std::time::Duration;

use kestrel_tick::{Config, StopOption, TimerCallback, TimerManager, TimerTask};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> kestrel_tick::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kestrel_tick=debug")),
        )
        .init();

    info!("Timer 1 - periodic, every 5 seconds (50 ticks)");
    info!("Timer 2 - periodic, every 3 seconds (30 ticks)");
    info!("Timer 3 - one shot, after 10 seconds (100 ticks)");

    let expired = TimerCallback::new(|label: &'static str| {
        info!(label, "timer expired");
    });

    let manager = TimerManager::new(Config::default())?;
    let five_second = manager.create(
        TimerTask::periodic(0, 50, expired.clone(), "five-second").named("five-second"),
    )?;
    let three_second = manager.create(
        TimerTask::periodic(0, 30, expired.clone(), "three-second").named("three-second"),
    )?;
    let ten_second = manager.create(
        TimerTask::one_shot(100, expired.clone(), "ten-second").named("ten-second"),
    )?;

    manager.start(five_second)?;
    manager.start(three_second)?;
    manager.start(ten_second)?;
    manager.start_tick_source();

    // 12 秒,单次定时器完成,两个周期定时器各触发数次
    tokio::time::sleep(Duration::from_secs(12)).await;

    let final_state = manager.state_of(ten_second)?;
    info!(state = ?final_state, "one-shot timer after its delay");
    let remaining = manager.remaining_ticks(five_second)?;
    info!(remaining, "ticks until the five-second timer expires again");

    // 周期定时器以 stop 收尾,补发一次回调
    manager.stop(three_second, StopOption::Callback)?;

    manager.delete(five_second)?;
    manager.delete(three_second)?;
    manager.delete(ten_second)?;
    manager.shutdown().await;
    Ok(())
}
