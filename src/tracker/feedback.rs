use crate::config::Config;
use crate::tracker::profile::ExerciseMode;

/// フィードバックの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    /// 姿勢が検出できない
    AcquirePose,
    /// 伸展に入った。下げる（引く）よう促す
    GoDown,
    /// レップをカウントした
    RepCounted,
    /// フォーム不良でカウントしなかった
    KeepBodyStraight,
    /// 表示中のメッセージなし
    Idle,
}

/// 利用者に見せるメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub text: String,
    /// Idle のときは None
    pub expires_at_ms: Option<u64>,
}

/// 種類ごとの表示文言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackTexts {
    pub acquire_pose: String,
    pub go_down: String,
    pub rep_counted: String,
    pub keep_body_straight: String,
    pub idle: String,
}

impl FeedbackTexts {
    pub fn from_config(mode: ExerciseMode, config: &Config) -> Self {
        let exercise = match mode {
            ExerciseMode::PushUp => &config.pushup,
            ExerciseMode::PullUp => &config.pullup,
        };
        Self {
            acquire_pose: config.feedback.acquire_pose.clone(),
            go_down: exercise.prompt.clone(),
            rep_counted: config.feedback.rep_counted.clone(),
            keep_body_straight: config.feedback.keep_body_straight.clone(),
            idle: exercise.idle.clone(),
        }
    }

    pub fn for_mode(mode: ExerciseMode) -> Self {
        Self::from_config(mode, &Config::default())
    }

    pub fn get(&self, kind: FeedbackKind) -> &str {
        match kind {
            FeedbackKind::AcquirePose => &self.acquire_pose,
            FeedbackKind::GoDown => &self.go_down,
            FeedbackKind::RepCounted => &self.rep_counted,
            FeedbackKind::KeepBodyStraight => &self.keep_body_straight,
            FeedbackKind::Idle => &self.idle,
        }
    }
}

/// 最後に書いたメッセージだけを保持する。期限切れは読み出し時に判定する
pub struct FeedbackEmitter {
    texts: FeedbackTexts,
    display_ms: u64,
    current: Option<(FeedbackKind, u64)>,
}

impl FeedbackEmitter {
    pub fn new(texts: FeedbackTexts, display_ms: u64) -> Self {
        Self {
            texts,
            display_ms,
            current: None,
        }
    }

    pub fn from_config(mode: ExerciseMode, config: &Config) -> Self {
        Self::new(
            FeedbackTexts::from_config(mode, config),
            config.feedback.display_ms,
        )
    }

    /// 前のメッセージを上書きする
    pub fn emit(&mut self, kind: FeedbackKind, now_ms: u64) {
        self.current = Some((kind, now_ms.saturating_add(self.display_ms)));
    }

    pub fn current(&self, now_ms: u64) -> Feedback {
        match self.current {
            Some((kind, expires_at)) if now_ms < expires_at => Feedback {
                kind,
                text: self.texts.get(kind).to_string(),
                expires_at_ms: Some(expires_at),
            },
            _ => Feedback {
                kind: FeedbackKind::Idle,
                text: self.texts.idle.clone(),
                expires_at_ms: None,
            },
        }
    }
}
