use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use crate::error::{EmuError, Result};

/// バケット幅と再生周期（ミリ秒）
pub const SAMPLE_INTERVAL_MS: u64 = 250;

/// トレースに記録されたパケット1個あたりの想定サイズ（MTU）
pub const PACKET_BYTES: u64 = 1500;

/// スケジュールの1エントリ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// トレース開始からのバケット位置（ミリ秒）
    pub offset_ms: u64,
    /// そのバケットでのレート（バイト/秒）
    pub rate: u64,
}

/// 再生順に並んだレートスケジュール
///
/// `offset_ms` は厳密に単調増加し、構築後は変更されません。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSchedule {
    entries: Vec<ScheduleEntry>,
}

impl RateSchedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter()
    }
}

/// パケット到着タイムスタンプのトレースからスケジュールを構築する
#[derive(Debug, Clone, Copy)]
pub struct ScheduleBuilder {
    interval_ms: u64,
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        ScheduleBuilder::new(SAMPLE_INTERVAL_MS)
    }
}

impl ScheduleBuilder {
    pub fn new(interval_ms: u64) -> Self {
        ScheduleBuilder {
            interval_ms: interval_ms.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// 1パケットが1バケットに現れた場合の毎秒バイト数
    ///
    /// 250ms なら 1500 * 4 = 6000。
    pub fn packet_contribution(&self) -> u64 {
        (PACKET_BYTES as f64 * (1000.0 / self.interval_ms as f64)) as u64
    }

    /// トレースファイルを読み込んでスケジュールを構築
    ///
    /// # エラー
    /// ファイルを開けない・読めない場合は `EmuError::TraceRead` を返します
    pub fn build(&self, path: &Path) -> Result<RateSchedule> {
        let bytes = std::fs::read(path).map_err(|source| EmuError::TraceRead {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let schedule = self.parse(&text);
        log::debug!(
            "Built schedule from {}: {} buckets",
            path.display(),
            schedule.len()
        );
        Ok(schedule)
    }

    /// 空白区切りのタイムスタンプ列を解析
    ///
    /// 数値として解釈できないトークンは読み飛ばします。
    pub fn parse(&self, text: &str) -> RateSchedule {
        let add = self.packet_contribution();
        let mut buckets: BTreeMap<u64, u64> = BTreeMap::new();
        let mut skipped = 0usize;

        for token in text.split_whitespace() {
            let timestamp = match token.parse::<u64>() {
                Ok(ts) => ts,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            let bucket = timestamp / self.interval_ms * self.interval_ms;
            *buckets.entry(bucket).or_insert(0) += add;
        }

        if skipped > 0 {
            log::debug!("Skipped {} malformed trace tokens", skipped);
        }

        RateSchedule {
            entries: buckets
                .into_iter()
                .map(|(offset_ms, rate)| ScheduleEntry { offset_ms, rate })
                .collect(),
        }
    }
}
