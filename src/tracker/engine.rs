use crate::config::Config;
use crate::pose::Frame;
use crate::tracker::feedback::{Feedback, FeedbackEmitter, FeedbackTexts};
use crate::tracker::profile::{ExerciseMode, ExerciseProfile};
use crate::tracker::rep::{RepPhase, RepStateMachine, StepOutcome};
use crate::tracker::throttle::FrameThrottle;

/// レップ完了時のコールバック。引数は新しいカウント
pub type RepListener = Box<dyn FnMut(u32)>;

/// 間引き → ステートマシン → フィードバック をまとめたエンジン
///
/// フレームは到着順に同期的に渡すこと。内部にキューやスレッドは持たない。
/// `finalize` で消費されるので、終了後にフレームを渡すことはできない。
pub struct RepEngine {
    throttle: FrameThrottle,
    machine: RepStateMachine,
    feedback: FeedbackEmitter,
    listener: Option<RepListener>,
}

impl RepEngine {
    pub fn new(throttle: FrameThrottle, machine: RepStateMachine, feedback: FeedbackEmitter) -> Self {
        Self {
            throttle,
            machine,
            feedback,
            listener: None,
        }
    }

    /// 既定設定で作成
    pub fn for_mode(mode: ExerciseMode) -> Self {
        Self::new(
            FrameThrottle::default(),
            RepStateMachine::new(ExerciseProfile::for_mode(mode)),
            FeedbackEmitter::new(FeedbackTexts::for_mode(mode), Config::default().feedback.display_ms),
        )
    }

    pub fn from_config(mode: ExerciseMode, config: &Config) -> Self {
        Self::new(
            FrameThrottle::from_config(&config.throttle),
            RepStateMachine::from_config(mode, config),
            FeedbackEmitter::from_config(mode, config),
        )
    }

    /// ランドマークソースからの唯一の入口
    pub fn on_frame(&mut self, frame: &Frame, arrival_ms: u64) -> StepOutcome {
        if !self.throttle.admit(arrival_ms) {
            return StepOutcome::Throttled;
        }

        let outcome = self.machine.step(frame, arrival_ms);

        if let Some(kind) = outcome.feedback() {
            self.feedback.emit(kind, arrival_ms);
        }
        if let StepOutcome::RepCompleted { count, .. } = outcome {
            if let Some(listener) = self.listener.as_mut() {
                listener(count);
            }
        }
        outcome
    }

    /// 副作用なし
    pub fn current_count(&self) -> u32 {
        self.machine.count()
    }

    pub fn phase(&self) -> RepPhase {
        self.machine.phase()
    }

    pub fn mode(&self) -> ExerciseMode {
        self.machine.mode()
    }

    pub fn last_angle(&self) -> Option<f32> {
        self.machine.last_angle()
    }

    /// レップ完了の通知先を登録する。登録できるのは1つで、再登録で置き換わる
    pub fn on_rep_completed<F>(&mut self, listener: F)
    where
        F: FnMut(u32) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn current_feedback(&self, now_ms: u64) -> Feedback {
        self.feedback.current(now_ms)
    }

    /// 最終カウントを返してエンジンを破棄する
    pub fn finalize(self) -> u32 {
        self.machine.count()
    }
}
