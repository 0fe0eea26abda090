use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default = "default_pushup", deserialize_with = "pushup_section")]
    pub pushup: ExerciseConfig,
    #[serde(default = "default_pullup", deserialize_with = "pullup_section")]
    pub pullup: ExerciseConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub landmark: LandmarkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThrottleConfig {
    /// 転送するフレームの最小間隔（ミリ秒）。0で間引きなし
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

fn default_min_interval_ms() -> u64 { 33 }

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

/// フィードバック表示設定
#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackConfig {
    /// メッセージの表示時間（ミリ秒）
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
    #[serde(default = "default_acquire_pose")]
    pub acquire_pose: String,
    #[serde(default = "default_rep_counted")]
    pub rep_counted: String,
    #[serde(default = "default_keep_body_straight")]
    pub keep_body_straight: String,
}

fn default_display_ms() -> u64 { 2000 }
fn default_acquire_pose() -> String { "カメラに全身を映してください".to_string() }
fn default_rep_counted() -> String { "✓ 1回カウント".to_string() }
fn default_keep_body_straight() -> String { "体をまっすぐ保ってください".to_string() }

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display_ms(),
            acquire_pose: default_acquire_pose(),
            rep_counted: default_rep_counted(),
            keep_body_straight: default_keep_body_straight(),
        }
    }
}

/// 種目ごとの閾値とメッセージ
///
/// `[pushup]` と `[pullup]` で既定値が異なるため、セクションは
/// `ExerciseOverrides` として読み、書かれた項目だけ種目の既定値に上書きする。
#[derive(Debug, Clone)]
pub struct ExerciseConfig {
    /// これより大きい角度で伸展に入る（度）
    pub extended_threshold: f32,
    /// これより小さい角度で屈曲に入る（度）
    pub contracted_threshold: f32,
    /// 姿勢スコアの上限。これ以上はフォーム不良。負値でチェック無効
    pub alignment_max: f32,
    /// 伸展に入った時の指示
    pub prompt: String,
    /// メッセージがない時の表示
    pub idle: String,
}

fn default_pushup() -> ExerciseConfig {
    ExerciseConfig {
        extended_threshold: 160.0,
        contracted_threshold: 90.0,
        alignment_max: 0.2,
        prompt: "90°まで下げてください".to_string(),
        idle: "腕立て伏せを続けてください".to_string(),
    }
}

fn default_pullup() -> ExerciseConfig {
    ExerciseConfig {
        extended_threshold: 160.0,
        contracted_threshold: 60.0,
        alignment_max: 0.2,
        prompt: "あごがバーを越えるまで引いてください".to_string(),
        idle: "懸垂を続けてください".to_string(),
    }
}

/// 種目セクションの生の内容。省略された項目は None
#[derive(Debug, Deserialize)]
struct ExerciseOverrides {
    #[serde(default)]
    extended_threshold: Option<f32>,
    #[serde(default)]
    contracted_threshold: Option<f32>,
    #[serde(default)]
    alignment_max: Option<f32>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    idle: Option<String>,
}

impl ExerciseOverrides {
    fn apply(self, base: ExerciseConfig) -> ExerciseConfig {
        ExerciseConfig {
            extended_threshold: self.extended_threshold.unwrap_or(base.extended_threshold),
            contracted_threshold: self.contracted_threshold.unwrap_or(base.contracted_threshold),
            alignment_max: self.alignment_max.unwrap_or(base.alignment_max),
            prompt: self.prompt.unwrap_or(base.prompt),
            idle: self.idle.unwrap_or(base.idle),
        }
    }
}

fn pushup_section<'de, D: Deserializer<'de>>(d: D) -> Result<ExerciseConfig, D::Error> {
    Ok(ExerciseOverrides::deserialize(d)?.apply(default_pushup()))
}

fn pullup_section<'de, D: Deserializer<'de>>(d: D) -> Result<ExerciseConfig, D::Error> {
    Ok(ExerciseOverrides::deserialize(d)?.apply(default_pullup()))
}

/// 角度サンプル用 One Euro Filter 設定
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f32,
    #[serde(default = "default_beta")]
    pub beta: f32,
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f32,
}

fn default_min_cutoff() -> f32 { 1.0 }
fn default_beta() -> f32 { 0.01 }
fn default_d_cutoff() -> f32 { 1.0 }

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LandmarkConfig {
    /// 使用するランドマークの最小可視度。0で無効
    #[serde(default)]
    pub min_visibility: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// 結果の追記先 (JSON Lines)
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String { "workouts.jsonl".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid config")?;
        Ok(config)
    }

    /// 読み込めなければ既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config: {:#} (using defaults)", e);
                Self::with_defaults()
            }
        }
    }

    pub fn with_defaults() -> Self {
        Self {
            throttle: ThrottleConfig::default(),
            feedback: FeedbackConfig::default(),
            pushup: default_pushup(),
            pullup: default_pullup(),
            filter: FilterConfig::default(),
            landmark: LandmarkConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_defaults()
    }
}
