//! セッション終了時に保存先へ渡すトレーニング結果

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::tracker::ExerciseMode;

/// 1セッション分の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub exercise_type: ExerciseMode,
    pub count: u32,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_reference: Option<String>,
    /// 種目の自己ベストを更新したか
    #[serde(default)]
    pub is_record: bool,
    /// 保存先が付与する。こちらからは常に None
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// 結果の保存先
pub trait WorkoutSink {
    fn save(&mut self, record: &WorkoutRecord) -> Result<()>;

    /// 種目ごとの過去最高回数。記録がなければ None
    fn previous_best(&self, mode: ExerciseMode) -> Result<Option<u32>>;
}

/// テスト用のメモリ上の保存先
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<WorkoutRecord>,
}

impl WorkoutSink for MemorySink {
    fn save(&mut self, record: &WorkoutRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn previous_best(&self, mode: ExerciseMode) -> Result<Option<u32>> {
        Ok(best_of(self.records.iter(), mode))
    }
}

fn best_of<'a, I>(records: I, mode: ExerciseMode) -> Option<u32>
where
    I: Iterator<Item = &'a WorkoutRecord>,
{
    records
        .filter(|r| r.exercise_type == mode)
        .map(|r| r.count)
        .max()
}

/// JSON Lines ファイルへの追記
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> Result<Vec<WorkoutRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<WorkoutRecord>(line)
                    .with_context(|| format!("{}: line {}", self.path.display(), i + 1))
            })
            .collect()
    }
}

impl WorkoutSink for JsonlSink {
    fn save(&mut self, record: &WorkoutRecord) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn previous_best(&self, mode: ExerciseMode) -> Result<Option<u32>> {
        Ok(best_of(self.load_all()?.iter(), mode))
    }
}
