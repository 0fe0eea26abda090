use serde::{Deserialize, Serialize};

use crate::config::{Config, ExerciseConfig};
use crate::pose::{LandmarkIndex, Pose};

/// 種目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseMode {
    PushUp,
    PullUp,
}

impl ExerciseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseMode::PushUp => "pushup",
            ExerciseMode::PullUp => "pullup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "pushup" => Some(ExerciseMode::PushUp),
            "pullup" => Some(ExerciseMode::PullUp),
            _ => None,
        }
    }
}

/// 角度を測る3点 (a, 頂点b, c)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTriplet {
    pub a: LandmarkIndex,
    pub vertex: LandmarkIndex,
    pub c: LandmarkIndex,
}

impl JointTriplet {
    pub const fn new(a: LandmarkIndex, vertex: LandmarkIndex, c: LandmarkIndex) -> Self {
        Self { a, vertex, c }
    }

    pub fn indices(&self) -> [LandmarkIndex; 3] {
        [self.a, self.vertex, self.c]
    }
}

pub const LEFT_ELBOW: JointTriplet = JointTriplet::new(
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::LeftElbow,
    LandmarkIndex::LeftWrist,
);

pub const RIGHT_ELBOW: JointTriplet = JointTriplet::new(
    LandmarkIndex::RightShoulder,
    LandmarkIndex::RightElbow,
    LandmarkIndex::RightWrist,
);

/// どちらの遷移でレップを数えるか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepEdge {
    /// Extended → Contracted
    Contraction,
    /// Contracted → Extended
    Extension,
}

/// 肩と腰のずれを測る軸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentAxis {
    /// 縦方向のずれ（体が水平な種目）
    Vertical,
    /// 横方向のずれ（ぶら下がる種目の振り）
    Horizontal,
}

/// 姿勢チェック
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentGate {
    pub axis: AlignmentAxis,
    /// スコアがこれ未満なら有効
    pub max_score: f32,
}

impl AlignmentGate {
    /// 左右の肩-腰のずれの合計。小さいほど良い
    pub fn score(&self, pose: &Pose) -> f32 {
        let pairs = [
            (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
            (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
        ];
        pairs
            .iter()
            .map(|&(shoulder, hip)| {
                let s = pose.get(shoulder);
                let h = pose.get(hip);
                match self.axis {
                    AlignmentAxis::Vertical => (s.y - h.y).abs(),
                    AlignmentAxis::Horizontal => (s.x - h.x).abs(),
                }
            })
            .sum()
    }

    pub fn accepts(&self, score: f32) -> bool {
        score < self.max_score
    }

    pub fn landmarks() -> [LandmarkIndex; 4] {
        [
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::RightShoulder,
            LandmarkIndex::LeftHip,
            LandmarkIndex::RightHip,
        ]
    }
}

/// 種目ごとのステートマシン設定
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProfile {
    pub mode: ExerciseMode,
    pub extended_threshold: f32,
    pub contracted_threshold: f32,
    pub triplets: [JointTriplet; 2],
    pub count_on: RepEdge,
    /// None なら全てのレップを有効とする
    pub alignment: Option<AlignmentGate>,
}

impl ExerciseProfile {
    pub fn push_up() -> Self {
        Self {
            mode: ExerciseMode::PushUp,
            extended_threshold: 160.0,
            contracted_threshold: 90.0,
            triplets: [LEFT_ELBOW, RIGHT_ELBOW],
            count_on: RepEdge::Contraction,
            alignment: Some(AlignmentGate {
                axis: AlignmentAxis::Vertical,
                max_score: 0.2,
            }),
        }
    }

    pub fn pull_up() -> Self {
        Self {
            mode: ExerciseMode::PullUp,
            extended_threshold: 160.0,
            contracted_threshold: 60.0,
            triplets: [LEFT_ELBOW, RIGHT_ELBOW],
            count_on: RepEdge::Contraction,
            alignment: Some(AlignmentGate {
                axis: AlignmentAxis::Horizontal,
                max_score: 0.2,
            }),
        }
    }

    pub fn for_mode(mode: ExerciseMode) -> Self {
        match mode {
            ExerciseMode::PushUp => Self::push_up(),
            ExerciseMode::PullUp => Self::pull_up(),
        }
    }

    /// 設定ファイルの閾値で上書き
    pub fn from_config(mode: ExerciseMode, config: &Config) -> Self {
        let exercise: &ExerciseConfig = match mode {
            ExerciseMode::PushUp => &config.pushup,
            ExerciseMode::PullUp => &config.pullup,
        };
        let mut profile = Self::for_mode(mode);
        profile.extended_threshold = exercise.extended_threshold;
        profile.contracted_threshold = exercise.contracted_threshold;
        profile.alignment = if exercise.alignment_max < 0.0 {
            None
        } else {
            profile.alignment.map(|gate| AlignmentGate {
                max_score: exercise.alignment_max,
                ..gate
            })
        };
        profile
    }

    pub fn with_count_on(mut self, edge: RepEdge) -> Self {
        self.count_on = edge;
        self
    }

    pub fn without_alignment(mut self) -> Self {
        self.alignment = None;
        self
    }

    /// ステートマシンが読むランドマーク
    pub fn required_landmarks(&self) -> Vec<LandmarkIndex> {
        let mut indices: Vec<LandmarkIndex> =
            self.triplets.iter().flat_map(|t| t.indices()).collect();
        if self.alignment.is_some() {
            indices.extend(AlignmentGate::landmarks());
        }
        indices
    }
}
