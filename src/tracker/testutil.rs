//! ステートマシンのテスト用の合成姿勢

use crate::pose::{Frame, Landmark, LandmarkIndex, Pose};

const ARM: f32 = 0.2;

/// 両腕の肘角度が `angle_deg` になる姿勢
///
/// 腰は肩と同じ位置に `misalignment` を縦横両方に足して置くので、
/// 姿勢スコアはどちらの軸でも `2 * misalignment` になる。
pub fn pose_at(angle_deg: f32, misalignment: f32) -> Pose {
    let mut pose = Pose::default();
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    let sides = [
        (
            0.3,
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::LeftElbow,
            LandmarkIndex::LeftWrist,
            LandmarkIndex::LeftHip,
        ),
        (
            0.7,
            LandmarkIndex::RightShoulder,
            LandmarkIndex::RightElbow,
            LandmarkIndex::RightWrist,
            LandmarkIndex::RightHip,
        ),
    ];

    for (x, shoulder, elbow, wrist, hip) in sides {
        let ex = x;
        let ey = 0.5;
        // 肘→肩は真上、肘→手首は真上から angle_deg 回転
        let s = Landmark::new(ex, ey - ARM);
        pose.landmarks[shoulder as usize] = s;
        pose.landmarks[elbow as usize] = Landmark::new(ex, ey);
        pose.landmarks[wrist as usize] = Landmark::new(ex + ARM * sin, ey - ARM * cos);
        pose.landmarks[hip as usize] = Landmark::new(s.x + misalignment, s.y + misalignment);
    }
    pose
}

pub fn frame_at(angle_deg: f32, misalignment: f32) -> Frame {
    Frame::Detected(pose_at(angle_deg, misalignment))
}

pub fn frame_with<F: FnOnce(&mut Pose)>(angle_deg: f32, misalignment: f32, edit: F) -> Frame {
    let mut pose = pose_at(angle_deg, misalignment);
    edit(&mut pose);
    Frame::Detected(pose)
}

#[test]
fn test_pose_at_produces_requested_angle() {
    use crate::pose::angle;
    for &deg in &[30.0, 80.0, 120.0, 170.0] {
        let pose = pose_at(deg, 0.0);
        let a = angle(
            pose.get(LandmarkIndex::LeftShoulder),
            pose.get(LandmarkIndex::LeftElbow),
            pose.get(LandmarkIndex::LeftWrist),
        )
        .unwrap();
        assert!((a - deg).abs() < 0.01, "expected {}, got {}", deg, a);
    }
}
