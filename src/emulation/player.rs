use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::emulation::cache::ScheduleCache;
use crate::emulation::rate::RateState;
use crate::emulation::schedule::RateSchedule;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Stopping,
}

/// 再生中のトレース
struct Session {
    source: String,
    cancel: CancellationToken,
    reset: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// トレース再生器
///
/// バックグラウンドの再生タスクは常に高々1つです。`start` と `stop` は
/// 前のタスクの終了を待ってから戻るため、戻った後に古いセッションの
/// レートが書き込まれることはありません。
pub struct TracePlayer {
    rate: RateState,
    cache: Arc<ScheduleCache>,
    interval: Duration,
    session: Mutex<Option<Session>>,
    state: watch::Sender<PlayerState>,
}

impl TracePlayer {
    pub fn new(rate: RateState, cache: Arc<ScheduleCache>, interval: Duration) -> Self {
        let (state, _) = watch::channel(PlayerState::Idle);
        TracePlayer {
            rate,
            cache,
            interval,
            session: Mutex::new(None),
            state,
        }
    }

    pub fn state(&self) -> PlayerState {
        *self.state.borrow()
    }

    /// トレースの再生を開始
    ///
    /// 再生中のセッションがあれば先に停止します。スケジュールが空の場合は
    /// 成功扱いで `Idle` のままになり、直前のレートを維持します。
    ///
    /// # エラー
    /// トレースファイルを読めない場合はエラーを返し、`Idle` のままです
    pub async fn start(&self, path: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        self.teardown(&mut session).await;

        let schedule = self.cache.get(path).await?;
        if schedule.is_empty() {
            log::info!("Trace {} is empty, holding rate at {} B/s", path, self.rate.read());
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let reset = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(play(
            Arc::clone(&schedule),
            self.rate.clone(),
            self.interval,
            cancel.clone(),
            Arc::clone(&reset),
        ));

        log::info!("Playing trace {} ({} buckets)", path, schedule.len());
        *session = Some(Session {
            source: path.to_string(),
            cancel,
            reset,
            task,
        });
        self.state.send_replace(PlayerState::Playing);
        Ok(())
    }

    /// 再生を停止してタスクの終了を待つ（停止中なら何もしない）
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;
        self.teardown(&mut session).await;
    }

    /// 再生を停止してから固定の帯域値を書き込む
    ///
    /// 停止と書き込みの間に別の `start` が割り込むことはありません。
    pub async fn stop_at(&self, rate: u64) {
        let mut session = self.session.lock().await;
        self.teardown(&mut session).await;
        self.rate.write(rate);
    }

    /// 再生位置をスケジュールの先頭に戻す
    ///
    /// 再生中でなければ何もせず `false` を返します。
    pub async fn reset_in_place(&self) -> bool {
        let session = self.session.lock().await;
        match session.as_ref() {
            Some(active) => {
                log::debug!("Restarting trace {} from the first bucket", active.source);
                active.reset.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    async fn teardown(&self, slot: &mut Option<Session>) {
        if let Some(session) = slot.take() {
            self.state.send_replace(PlayerState::Stopping);
            session.cancel.cancel();
            if let Err(e) = session.task.await {
                log::warn!("Playback task for {} ended abnormally: {}", session.source, e);
            }
            log::info!("Stopped trace {}", session.source);
        }
        self.state.send_replace(PlayerState::Idle);
    }
}

impl Drop for TracePlayer {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.cancel.cancel();
        }
    }
}

/// スケジュールを繰り返し再生するループ
async fn play(
    schedule: Arc<RateSchedule>,
    rate: RateState,
    interval: Duration,
    cancel: CancellationToken,
    reset: Arc<AtomicBool>,
) {
    'cycle: loop {
        for entry in schedule.iter() {
            log::trace!("+{} ms: {} B/s", entry.offset_ms, entry.rate);
            rate.write(entry.rate);

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }

            // 起床直後、次の書き込みの前に停止・リセットを確認
            if cancel.is_cancelled() {
                return;
            }
            if reset.swap(false, Ordering::AcqRel) {
                continue 'cycle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::schedule::ScheduleBuilder;
    use crate::error::EmuError;
    use std::time::Instant;
    use tempfile::TempDir;

    const INTERVAL_MS: u64 = 20;
    // 20ms バケットでのパケット1個分
    const ONE: u64 = 75_000;

    fn player(initial: u64) -> (TracePlayer, RateState) {
        let rate = RateState::new(initial);
        let builder = ScheduleBuilder::new(INTERVAL_MS);
        let cache = Arc::new(ScheduleCache::new(builder));
        (TracePlayer::new(rate.clone(), cache, builder.interval()), rate)
    }

    fn trace(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().to_string()
    }

    async fn wait_for(rate: &RateState, expected: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if rate.read() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        rate.read() == expected
    }

    #[tokio::test]
    async fn test_start_cycles_through_schedule() {
        let dir = TempDir::new().unwrap();
        let path = trace(&dir, "a.txt", "0 0 20");
        let (player, rate) = player(0);

        player.start(&path).await.unwrap();
        assert_eq!(player.state(), PlayerState::Playing);

        assert!(wait_for(&rate, 2 * ONE, Duration::from_millis(500)).await);
        assert!(wait_for(&rate, ONE, Duration::from_millis(500)).await);
        // 最後まで進んだら先頭に戻る
        assert!(wait_for(&rate, 2 * ONE, Duration::from_millis(500)).await);

        player.stop().await;
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[tokio::test]
    async fn test_stop_freezes_rate() {
        let dir = TempDir::new().unwrap();
        let path = trace(&dir, "a.txt", "0 0 20 40 40 40");
        let (player, rate) = player(0);

        player.start(&path).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3 * INTERVAL_MS)).await;
        player.stop().await;

        let frozen = rate.read();
        tokio::time::sleep(Duration::from_millis(10 * INTERVAL_MS)).await;
        assert_eq!(rate.read(), frozen);
    }

    #[tokio::test]
    async fn test_stop_at_overrides_playback() {
        let dir = TempDir::new().unwrap();
        let path = trace(&dir, "a.txt", "0 20 20 40");
        let (player, rate) = player(0);

        player.start(&path).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2 * INTERVAL_MS)).await;
        player.stop_at(5000).await;

        assert_eq!(player.state(), PlayerState::Idle);
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(INTERVAL_MS)).await;
            assert_eq!(rate.read(), 5000);
        }
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (player, rate) = player(123);

        player.stop().await;
        player.stop().await;

        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(rate.read(), 123);
    }

    #[tokio::test]
    async fn test_empty_trace_stays_idle() {
        let dir = TempDir::new().unwrap();
        let path = trace(&dir, "empty.txt", "");
        let (player, rate) = player(7);

        player.start(&path).await.unwrap();

        assert_eq!(player.state(), PlayerState::Idle);
        tokio::time::sleep(Duration::from_millis(3 * INTERVAL_MS)).await;
        assert_eq!(rate.read(), 7);
    }

    #[tokio::test]
    async fn test_unreadable_trace_leaves_player_idle() {
        let dir = TempDir::new().unwrap();
        let good = trace(&dir, "good.txt", "0 20");
        let missing = dir.path().join("missing.txt");
        let (player, _rate) = player(0);

        player.start(&good).await.unwrap();
        let result = player.start(&missing.to_string_lossy()).await;

        assert!(matches!(result, Err(EmuError::TraceRead { ref path, .. }) if path == &missing));
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.reset_in_place().await);
    }

    #[tokio::test]
    async fn test_new_trace_replaces_old_without_interleaving() {
        let dir = TempDir::new().unwrap();
        let old = trace(&dir, "old.txt", "0");
        let new = trace(&dir, "new.txt", "0 0 0");
        let (player, rate) = player(0);

        player.start(&old).await.unwrap();
        assert!(wait_for(&rate, ONE, Duration::from_millis(500)).await);

        player.start(&new).await.unwrap();
        let mut switched = false;
        for _ in 0..200 {
            let seen = rate.read();
            if switched {
                assert_eq!(seen, 3 * ONE, "stale tick from the previous trace");
            }
            switched |= seen == 3 * ONE;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(switched);
    }

    #[tokio::test]
    async fn test_reset_restarts_from_first_bucket() {
        let dir = TempDir::new().unwrap();
        // 先頭バケットだけ2パケット、残り50バケットは1パケット
        let mut timestamps = vec!["0".to_string()];
        timestamps.extend((0..=50).map(|i| (i * INTERVAL_MS).to_string()));
        let path = trace(&dir, "long.txt", &timestamps.join(" "));
        let (player, rate) = player(0);

        player.start(&path).await.unwrap();
        assert!(wait_for(&rate, ONE, Duration::from_millis(500)).await);

        assert!(player.reset_in_place().await);
        // リセットなしでは先頭に戻るまで約1秒かかる
        assert!(wait_for(&rate, 2 * ONE, Duration::from_millis(8 * INTERVAL_MS)).await);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn test_reset_when_idle_is_noop() {
        let (player, rate) = player(9);

        assert!(!player.reset_in_place().await);
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(rate.read(), 9);
    }
}
