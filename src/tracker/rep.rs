use crate::config::Config;
use crate::pose::{angle, Frame, GeometryError, Pose};
use crate::tracker::feedback::FeedbackKind;
use crate::tracker::one_euro::AngleFilter;
use crate::tracker::profile::{ExerciseMode, ExerciseProfile, RepEdge};

/// 腕の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepPhase {
    /// 初期状態。Extended への遷移だけを受け付ける
    Unknown,
    Extended,
    Contracted,
}

/// フレームを評価しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 姿勢が検出されなかった
    PoseUnavailable,
    /// 必要なランドマークの可視度が閾値未満
    LowVisibility,
    /// 関節角度が計算できない
    DegenerateGeometry,
}

/// 1フレーム分の処理結果
///
/// ノイズや欠損はすべてここで表現し、呼び出し側にエラーとして返さない。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// 間引きで捨てられた
    Throttled,
    Skipped(SkipReason),
    /// 遷移なし（不感帯、または同じ状態の再観測）
    Hold { angle: f32 },
    /// レップにならない Extended への遷移
    Extended { angle: f32 },
    /// レップにならない Contracted への遷移
    Contracted { angle: f32 },
    /// レップ完了
    RepCompleted {
        count: u32,
        angle: f32,
        alignment: Option<f32>,
    },
    /// 完了エッジだが姿勢チェックで不合格。状態は進む
    InvalidForm { angle: f32, alignment: f32 },
}

impl StepOutcome {
    /// 表示すべきフィードバック
    pub fn feedback(&self) -> Option<FeedbackKind> {
        match self {
            StepOutcome::Skipped(SkipReason::PoseUnavailable)
            | StepOutcome::Skipped(SkipReason::LowVisibility) => Some(FeedbackKind::AcquirePose),
            StepOutcome::Extended { .. } => Some(FeedbackKind::GoDown),
            StepOutcome::RepCompleted { .. } => Some(FeedbackKind::RepCounted),
            StepOutcome::InvalidForm { .. } => Some(FeedbackKind::KeepBodyStraight),
            _ => None,
        }
    }

    pub fn angle(&self) -> Option<f32> {
        match *self {
            StepOutcome::Hold { angle }
            | StepOutcome::Extended { angle }
            | StepOutcome::Contracted { angle }
            | StepOutcome::RepCompleted { angle, .. }
            | StepOutcome::InvalidForm { angle, .. } => Some(angle),
            StepOutcome::Throttled | StepOutcome::Skipped(_) => None,
        }
    }

    /// 状態遷移が起きたか
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            StepOutcome::Extended { .. }
                | StepOutcome::Contracted { .. }
                | StepOutcome::RepCompleted { .. }
                | StepOutcome::InvalidForm { .. }
        )
    }
}

/// 関節角度のヒステリシスでレップを数えるステートマシン
///
/// 1セッションに1インスタンス。種目は生成時に固定され、変更する API はない。
pub struct RepStateMachine {
    profile: ExerciseProfile,
    min_visibility: f32,
    filter: Option<AngleFilter>,
    phase: RepPhase,
    count: u32,
    last_angle: Option<f32>,
}

impl RepStateMachine {
    pub fn new(profile: ExerciseProfile) -> Self {
        Self {
            profile,
            min_visibility: 0.0,
            filter: None,
            phase: RepPhase::Unknown,
            count: 0,
            last_angle: None,
        }
    }

    pub fn from_config(mode: ExerciseMode, config: &Config) -> Self {
        let mut machine = Self::new(ExerciseProfile::from_config(mode, config))
            .with_min_visibility(config.landmark.min_visibility);
        machine.filter = AngleFilter::from_config(&config.filter);
        machine
    }

    pub fn with_min_visibility(mut self, threshold: f32) -> Self {
        self.min_visibility = threshold;
        self
    }

    pub fn with_filter(mut self, filter: AngleFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn mode(&self) -> ExerciseMode {
        self.profile.mode
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// 最後に評価した角度サンプル
    pub fn last_angle(&self) -> Option<f32> {
        self.last_angle
    }

    /// 左右の角度の平均
    fn angle_sample(&self, pose: &Pose) -> Result<f32, GeometryError> {
        let [left, right] = self.profile.triplets;
        let l = angle(pose.get(left.a), pose.get(left.vertex), pose.get(left.c))?;
        let r = angle(pose.get(right.a), pose.get(right.vertex), pose.get(right.c))?;
        Ok((l + r) / 2.0)
    }

    fn landmarks_visible(&self, pose: &Pose) -> bool {
        if self.min_visibility <= 0.0 {
            return true;
        }
        self.profile
            .required_landmarks()
            .into_iter()
            .all(|idx| pose.get(idx).is_visible(self.min_visibility))
    }

    /// 間引き済みのフレームを1つ処理する
    pub fn step(&mut self, frame: &Frame, t_ms: u64) -> StepOutcome {
        let pose = match frame.pose() {
            Some(pose) => pose,
            None => return StepOutcome::Skipped(SkipReason::PoseUnavailable),
        };

        if !self.landmarks_visible(pose) {
            return StepOutcome::Skipped(SkipReason::LowVisibility);
        }

        let raw = match self.angle_sample(pose) {
            Ok(a) => a,
            Err(GeometryError::Degenerate) => {
                return StepOutcome::Skipped(SkipReason::DegenerateGeometry)
            }
        };
        let angle = match self.filter.as_mut() {
            Some(filter) => filter.filter(raw, t_ms),
            None => raw,
        };
        self.last_angle = Some(angle);

        let next = if angle > self.profile.extended_threshold && self.phase != RepPhase::Extended {
            RepPhase::Extended
        } else if angle < self.profile.contracted_threshold && self.phase == RepPhase::Extended {
            RepPhase::Contracted
        } else {
            return StepOutcome::Hold { angle };
        };

        let prev = std::mem::replace(&mut self.phase, next);
        let completes = match self.profile.count_on {
            RepEdge::Contraction => next == RepPhase::Contracted,
            RepEdge::Extension => next == RepPhase::Extended && prev == RepPhase::Contracted,
        };

        if !completes {
            return if next == RepPhase::Extended {
                StepOutcome::Extended { angle }
            } else {
                StepOutcome::Contracted { angle }
            };
        }

        // 不合格でも状態は戻さない。同じ動作で再判定はしない
        match self.profile.alignment {
            Some(gate) => {
                let score = gate.score(pose);
                if gate.accepts(score) {
                    self.count += 1;
                    StepOutcome::RepCompleted {
                        count: self.count,
                        angle,
                        alignment: Some(score),
                    }
                } else {
                    StepOutcome::InvalidForm {
                        angle,
                        alignment: score,
                    }
                }
            }
            None => {
                self.count += 1;
                StepOutcome::RepCompleted {
                    count: self.count,
                    angle,
                    alignment: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkIndex};
    use crate::tracker::testutil::{frame_at, frame_with, pose_at};

    fn push_up() -> RepStateMachine {
        RepStateMachine::new(ExerciseProfile::push_up())
    }

    fn run(machine: &mut RepStateMachine, angles: &[f32]) -> Vec<StepOutcome> {
        angles
            .iter()
            .enumerate()
            .map(|(i, &a)| machine.step(&frame_at(a, 0.0), i as u64 * 33))
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let m = push_up();
        assert_eq!(m.phase(), RepPhase::Unknown);
        assert_eq!(m.count(), 0);
        assert_eq!(m.last_angle(), None);
    }

    #[test]
    fn test_unknown_only_accepts_extended() {
        let mut m = push_up();
        let out = run(&mut m, &[80.0, 40.0]);
        assert!(matches!(out[0], StepOutcome::Hold { .. }));
        assert_eq!(m.phase(), RepPhase::Unknown);
        assert_eq!(m.count(), 0);
    }

    #[test]
    fn test_single_clean_cycle() {
        let mut m = push_up();
        let out = run(&mut m, &[170.0, 165.0, 80.0, 85.0, 170.0]);
        assert_eq!(m.count(), 1);
        assert_eq!(m.phase(), RepPhase::Extended);

        assert!(matches!(out[0], StepOutcome::Extended { .. }));
        assert!(matches!(out[1], StepOutcome::Hold { .. }));
        assert!(matches!(out[2], StepOutcome::RepCompleted { count: 1, .. }));
        assert!(matches!(out[3], StepOutcome::Hold { .. }));
        assert!(matches!(out[4], StepOutcome::Extended { .. }));
    }

    /// 角度がちょうど閾値のフレームは不感帯に留まる
    #[test]
    fn test_threshold_values_are_exclusive() {
        let ext_frame = frame_at(160.0, 0.0);
        let con_frame = frame_at(90.0, 0.0);
        let ext_angle = push_up().angle_sample(ext_frame.pose().unwrap()).unwrap();
        let con_angle = push_up().angle_sample(con_frame.pose().unwrap()).unwrap();

        let mut profile = ExerciseProfile::push_up();
        profile.extended_threshold = ext_angle;
        profile.contracted_threshold = con_angle;
        let mut m = RepStateMachine::new(profile);

        assert_eq!(m.step(&ext_frame, 0), StepOutcome::Hold { angle: ext_angle });
        assert_eq!(m.phase(), RepPhase::Unknown);

        assert!(matches!(m.step(&frame_at(170.0, 0.0), 33), StepOutcome::Extended { .. }));
        assert_eq!(m.step(&con_frame, 66), StepOutcome::Hold { angle: con_angle });
        assert_eq!(m.phase(), RepPhase::Extended);
        assert_eq!(m.count(), 0);

        // 閾値を越えれば遷移する
        assert!(matches!(m.step(&frame_at(80.0, 0.0), 99), StepOutcome::RepCompleted { count: 1, .. }));
    }

    #[test]
    fn test_never_below_contracted_threshold() {
        let mut m = push_up();
        run(&mut m, &[170.0, 120.0, 130.0, 170.0]);
        assert_eq!(m.count(), 0);
        assert_eq!(m.phase(), RepPhase::Extended);
    }

    #[test]
    fn test_dead_zone_oscillation_never_counts() {
        let mut m = push_up();
        run(&mut m, &[170.0]);
        let wobble: Vec<f32> = (0..200).map(|i| if i % 2 == 0 { 95.0 } else { 155.0 }).collect();
        let out = run(&mut m, &wobble);
        assert_eq!(m.count(), 0);
        assert_eq!(m.phase(), RepPhase::Extended);
        assert!(out.iter().all(|o| !o.is_transition()));
    }

    #[test]
    fn test_intermediate_frames_do_not_change_result() {
        let mut m = push_up();
        let mut angles = vec![170.0];
        angles.extend((0..50).map(|i| 160.0 - i as f32));
        angles.push(80.0);
        angles.extend(std::iter::repeat(85.0).take(30));
        run(&mut m, &angles);
        assert_eq!(m.count(), 1);
        assert_eq!(m.phase(), RepPhase::Contracted);
    }

    #[test]
    fn test_repeated_extended_frames_do_not_double_count() {
        let mut m = push_up();
        let out = run(&mut m, &[170.0, 170.0, 175.0]);
        assert!(matches!(out[0], StepOutcome::Extended { .. }));
        assert!(matches!(out[1], StepOutcome::Hold { .. }));
        assert!(matches!(out[2], StepOutcome::Hold { .. }));

        run(&mut m, &[80.0, 80.0, 70.0]);
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn test_multiple_cycles() {
        let mut m = push_up();
        for _ in 0..5 {
            run(&mut m, &[170.0, 120.0, 80.0, 120.0]);
        }
        assert_eq!(m.count(), 5);
    }

    #[test]
    fn test_bad_form_advances_phase_without_counting() {
        let mut m = push_up();
        m.step(&frame_at(170.0, 0.0), 0);
        let out = m.step(&frame_at(80.0, 0.15), 33);

        match out {
            StepOutcome::InvalidForm { alignment, .. } => assert!((alignment - 0.3).abs() < 1e-5),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(out.feedback(), Some(FeedbackKind::KeepBodyStraight));
        assert_eq!(m.phase(), RepPhase::Contracted);
        assert_eq!(m.count(), 0);

        // 同じ動作の続きでは再判定しない
        assert!(matches!(m.step(&frame_at(70.0, 0.0), 66), StepOutcome::Hold { .. }));
        assert_eq!(m.count(), 0);

        // 伸ばし直せば次のレップは数える
        m.step(&frame_at(170.0, 0.0), 99);
        m.step(&frame_at(80.0, 0.0), 132);
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn test_no_pose_interleaved() {
        let mut m = push_up();
        let frames = [
            frame_at(170.0, 0.0),
            Frame::NoPose,
            Frame::NoPose,
            frame_at(120.0, 0.0),
            Frame::NoPose,
            frame_at(80.0, 0.0),
        ];
        let out: Vec<StepOutcome> = frames
            .iter()
            .enumerate()
            .map(|(i, f)| m.step(f, i as u64 * 33))
            .collect();

        assert_eq!(out[1], StepOutcome::Skipped(SkipReason::PoseUnavailable));
        assert_eq!(out[1].feedback(), Some(FeedbackKind::AcquirePose));
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn test_no_pose_keeps_phase() {
        let mut m = push_up();
        m.step(&frame_at(170.0, 0.0), 0);
        m.step(&Frame::NoPose, 33);
        assert_eq!(m.phase(), RepPhase::Extended);
        assert_eq!(m.last_angle().map(|a| a.round()), Some(170.0));
    }

    #[test]
    fn test_degenerate_frame_skipped() {
        let mut m = push_up();
        m.step(&frame_at(170.0, 0.0), 0);

        let mut pose = pose_at(80.0, 0.0);
        let elbow = *pose.get(LandmarkIndex::LeftElbow);
        pose.landmarks[LandmarkIndex::LeftWrist as usize] = elbow;

        let out = m.step(&Frame::Detected(pose), 33);
        assert_eq!(out, StepOutcome::Skipped(SkipReason::DegenerateGeometry));
        assert_eq!(out.feedback(), None);
        assert_eq!(m.phase(), RepPhase::Extended);
        assert_eq!(m.count(), 0);
    }

    #[test]
    fn test_low_visibility_skipped() {
        let mut m = push_up().with_min_visibility(0.5);
        m.step(&frame_at(170.0, 0.0), 0);

        let frame = frame_with(80.0, 0.0, |pose| {
            let wrist = &mut pose.landmarks[LandmarkIndex::RightWrist as usize];
            *wrist = Landmark::with_visibility(wrist.x, wrist.y, 0.2);
        });
        let out = m.step(&frame, 33);
        assert_eq!(out, StepOutcome::Skipped(SkipReason::LowVisibility));
        assert_eq!(out.feedback(), Some(FeedbackKind::AcquirePose));
        assert_eq!(m.count(), 0);

        // 可視度が十分なら数える
        let frame = frame_with(80.0, 0.0, |pose| {
            let wrist = &mut pose.landmarks[LandmarkIndex::RightWrist as usize];
            *wrist = Landmark::with_visibility(wrist.x, wrist.y, 0.9);
        });
        assert!(matches!(m.step(&frame, 66), StepOutcome::RepCompleted { .. }));
    }

    #[test]
    fn test_pull_up_threshold() {
        let mut m = RepStateMachine::new(ExerciseProfile::pull_up());
        run(&mut m, &[170.0, 80.0, 65.0]);
        assert_eq!(m.count(), 0);
        run(&mut m, &[50.0]);
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn test_count_on_extension() {
        let profile = ExerciseProfile::push_up().with_count_on(RepEdge::Extension);
        let mut m = RepStateMachine::new(profile);
        let out = run(&mut m, &[170.0, 80.0, 170.0]);

        // Unknown → Extended は完了エッジではない
        assert!(matches!(out[0], StepOutcome::Extended { .. }));
        assert!(matches!(out[1], StepOutcome::Contracted { .. }));
        assert!(matches!(out[2], StepOutcome::RepCompleted { count: 1, .. }));
    }

    #[test]
    fn test_alignment_disabled_counts_everything() {
        let mut m = RepStateMachine::new(ExerciseProfile::push_up().without_alignment());
        m.step(&frame_at(170.0, 0.0), 0);
        let out = m.step(&frame_at(80.0, 0.5), 33);
        assert_eq!(
            out,
            StepOutcome::RepCompleted {
                count: 1,
                angle: out.angle().unwrap(),
                alignment: None
            }
        );
    }

    #[test]
    fn test_filter_delays_transition() {
        let mut m = push_up().with_filter(AngleFilter::new(1.0, 0.0, 1.0));
        m.step(&frame_at(170.0, 0.0), 0);
        // 平滑化で1フレーム目は 90° を下回らない
        assert!(matches!(m.step(&frame_at(80.0, 0.0), 33), StepOutcome::Hold { .. }));
        let mut t = 66;
        while m.count() == 0 && t < 5000 {
            m.step(&frame_at(80.0, 0.0), t);
            t += 33;
        }
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.pullup.contracted_threshold = 70.0;
        config.landmark.min_visibility = 0.3;
        let m = RepStateMachine::from_config(ExerciseMode::PullUp, &config);
        assert_eq!(m.mode(), ExerciseMode::PullUp);
        assert_eq!(m.profile().contracted_threshold, 70.0);
        assert_eq!(m.min_visibility, 0.3);
        assert!(m.filter.is_none());
    }
}
