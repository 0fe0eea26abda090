use crate::config::Config;
use crate::pose::Frame;
use crate::tracker::{ExerciseMode, Feedback, RepEngine, StepOutcome};
use crate::workout::WorkoutRecord;

/// 1回のトレーニング（カメラON〜終了）
///
/// エンジンに録画の開始・停止と動画参照を足したもの。録画を止めても
/// カウントは残り、`finish` で保存用のレコードにまとめる。
pub struct WorkoutSession {
    engine: RepEngine,
    first_frame_ms: Option<u64>,
    last_frame_ms: Option<u64>,
    recording_since: Option<u64>,
    recorded_ms: u64,
    ever_recorded: bool,
    video_reference: Option<String>,
}

impl WorkoutSession {
    pub fn new(engine: RepEngine) -> Self {
        Self {
            engine,
            first_frame_ms: None,
            last_frame_ms: None,
            recording_since: None,
            recorded_ms: 0,
            ever_recorded: false,
            video_reference: None,
        }
    }

    pub fn from_config(mode: ExerciseMode, config: &Config) -> Self {
        Self::new(RepEngine::from_config(mode, config))
    }

    pub fn on_frame(&mut self, frame: &Frame, arrival_ms: u64) -> StepOutcome {
        self.first_frame_ms.get_or_insert(arrival_ms);
        self.last_frame_ms = Some(arrival_ms);
        self.engine.on_frame(frame, arrival_ms)
    }

    pub fn mode(&self) -> ExerciseMode {
        self.engine.mode()
    }

    pub fn current_count(&self) -> u32 {
        self.engine.current_count()
    }

    pub fn current_feedback(&self, now_ms: u64) -> Feedback {
        self.engine.current_feedback(now_ms)
    }

    pub fn on_rep_completed<F>(&mut self, listener: F)
    where
        F: FnMut(u32) + 'static,
    {
        self.engine.on_rep_completed(listener);
    }

    pub fn engine(&self) -> &RepEngine {
        &self.engine
    }

    /// 録画中なら何もしない
    pub fn start_recording(&mut self, now_ms: u64) {
        if self.recording_since.is_none() {
            self.recording_since = Some(now_ms);
            self.ever_recorded = true;
        }
    }

    /// 録画を止め、その時点のカウントを返す
    pub fn stop_recording(&mut self, now_ms: u64) -> u32 {
        if let Some(since) = self.recording_since.take() {
            self.recorded_ms += now_ms.saturating_sub(since);
        }
        self.current_count()
    }

    pub fn is_recording(&self) -> bool {
        self.recording_since.is_some()
    }

    pub fn attach_video<S: Into<String>>(&mut self, reference: S) {
        self.video_reference = Some(reference.into());
    }

    /// 録画した時間の合計。録画していなければ最初と最後のフレームの間隔
    pub fn duration_ms(&self, now_ms: u64) -> u64 {
        if self.ever_recorded {
            let running = self
                .recording_since
                .map_or(0, |since| now_ms.saturating_sub(since));
            self.recorded_ms + running
        } else {
            match (self.first_frame_ms, self.last_frame_ms) {
                (Some(first), Some(last)) => last.saturating_sub(first),
                _ => 0,
            }
        }
    }

    /// セッションを終了して保存用レコードを作る
    ///
    /// 0回なら保存するものはないので None。`previous_best` は同じ種目の
    /// 過去最高回数で、これを超えたら `is_record` が立つ。
    pub fn finish(mut self, now_ms: u64, previous_best: Option<u32>) -> Option<WorkoutRecord> {
        self.stop_recording(now_ms);
        let duration_ms = self.duration_ms(now_ms);
        let mode = self.engine.mode();
        let count = self.engine.finalize();

        if count == 0 {
            return None;
        }

        Some(WorkoutRecord {
            exercise_type: mode,
            count,
            duration_seconds: duration_ms as f64 / 1000.0,
            video_reference: self.video_reference,
            is_record: count > previous_best.unwrap_or(0),
            timestamp: None,
        })
    }
}
