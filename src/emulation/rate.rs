use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 現在の帯域値（バイト/秒）
///
/// クローンは同じ値を共有します。読み手はブロックせず、
/// 常に直近に完了した書き込みの値を返します。
#[derive(Debug, Clone, Default)]
pub struct RateState {
    bytes_per_second: Arc<AtomicU64>,
}

impl RateState {
    pub fn new(initial: u64) -> Self {
        RateState {
            bytes_per_second: Arc::new(AtomicU64::new(initial)),
        }
    }

    pub fn read(&self) -> u64 {
        self.bytes_per_second.load(Ordering::Acquire)
    }

    pub fn write(&self, rate: u64) {
        self.bytes_per_second.store(rate, Ordering::Release);
    }
}
