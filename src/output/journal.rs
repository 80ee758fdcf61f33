use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use crate::error::Result;

/// 操作ジャーナル
///
/// `--log-file` で指定されたファイルに、制御操作を時刻付きで追記します。
pub struct Journal {
    file: Mutex<File>,
}

impl Journal {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn record(&self, message: &str) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "[{}] {}", timestamp, message)?;
        file.flush()?;
        Ok(())
    }
}


static GLOBAL_JOURNAL: Mutex<Option<Journal>> = Mutex::new(None);


pub fn init_journal(path: &Path) -> Result<()> {
    let journal = Journal::open(path)?;
    let mut global = GLOBAL_JOURNAL.lock().unwrap_or_else(PoisonError::into_inner);
    *global = Some(journal);
    Ok(())
}


/// ジャーナルが有効なら1行追記（書き込み失敗は警告のみ）
pub fn record(message: &str) {
    let global = GLOBAL_JOURNAL.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(journal) = global.as_ref() {
        if let Err(e) = journal.record(message) {
            log::warn!("Failed to write journal: {}", e);
        }
    }
}


#[macro_export]
macro_rules! journal {
    ($($arg:tt)*) => {
        $crate::output::journal::record(&format!($($arg)*))
    };
}
