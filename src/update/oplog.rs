//! 操作日志：追加写入，带时间戳，供人工查阅
//! 本工具自身从不回读

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::utils::Result;

pub struct OpLog {
    path: PathBuf,
}

impl OpLog {
    pub fn new(path: impl Into<PathBuf>) -> OpLog {
        OpLog { path: path.into() }
    }

    /// Append one timestamped line. All writes go through this method, so
    /// a single OpLog value serializes them.
    pub fn append(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{}  {}", ts, message)?;
        Ok(())
    }

    /// Log failures must not abort an update in flight
    pub fn append_best_effort(&self, message: &str) {
        if let Err(e) = self.append(message) {
            eprintln!("warn: operation log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_accumulate_with_timestamps() {
        let path = std::env::temp_dir().join(format!("updock-oplog-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let log = OpLog::new(&path);
        log.append("first").unwrap();
        log.append("second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second"));
        // timestamp prefix: "YYYY-MM-DD HH:MM:SS  "
        assert_eq!(lines[0].as_bytes()[4], b'-');

        let _ = std::fs::remove_file(&path);
    }
}
