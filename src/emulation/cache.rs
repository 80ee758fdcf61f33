use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use crate::emulation::schedule::{RateSchedule, ScheduleBuilder};
use crate::error::{EmuError, Result};

type Loader = dyn Fn(&Path) -> Result<RateSchedule> + Send + Sync;

/// パスごとに構築済みスケジュールを保持するキャッシュ
///
/// 一度構築したエントリはプロセス終了まで破棄・変更しません。
/// 同じパスへの同時アクセスでも構築は1回だけです。
/// 構築に失敗したパスはキャッシュされず、次回の要求で再試行します。
pub struct ScheduleCache {
    loader: Arc<Loader>,
    schedules: Mutex<HashMap<String, Arc<OnceCell<Arc<RateSchedule>>>>>,
}

impl ScheduleCache {
    pub fn new(builder: ScheduleBuilder) -> Self {
        Self::with_loader(move |path| builder.build(path))
    }

    /// 任意のローダーでキャッシュを作成
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn(&Path) -> Result<RateSchedule> + Send + Sync + 'static,
    {
        ScheduleCache {
            loader: Arc::new(loader),
            schedules: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, path: &str) -> Result<Arc<RateSchedule>> {
        let cell = {
            let mut schedules = self.schedules.lock().await;
            Arc::clone(schedules.entry(path.to_string()).or_default())
        };

        let schedule = cell
            .get_or_try_init(|| async {
                log::info!("Loading trace {}", path);
                let loader = Arc::clone(&self.loader);
                let owned = PathBuf::from(path);
                // ファイル読み込みはブロッキングスレッドで行う
                let schedule = tokio::task::spawn_blocking(move || loader(&owned))
                    .await
                    .map_err(|e| {
                        EmuError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
                    })??;
                Ok::<_, EmuError>(Arc::new(schedule))
            })
            .await?;

        Ok(Arc::clone(schedule))
    }
}
