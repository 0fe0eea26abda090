use nalgebra::Vector2;

use super::keypoint::Landmark;
use super::GeometryError;

/// これより短いベクトルは長さゼロとみなす
const MIN_RAY_LENGTH: f32 = 1e-6;

/// 頂点 b における角度（度）
///
/// b→a と b→c の2本のベクトルの内積から arccos で求める。
/// 戻り値は [0, 180]。どちらかのベクトルの長さがゼロ、または座標が
/// 有限でない場合は `GeometryError::Degenerate`。
pub fn angle(a: &Landmark, b: &Landmark, c: &Landmark) -> Result<f32, GeometryError> {
    let ba = Vector2::new(a.x - b.x, a.y - b.y);
    let bc = Vector2::new(c.x - b.x, c.y - b.y);

    if !ba.iter().chain(bc.iter()).all(|v| v.is_finite()) {
        return Err(GeometryError::Degenerate);
    }

    let len_ba = ba.norm();
    let len_bc = bc.norm();
    if len_ba < MIN_RAY_LENGTH || len_bc < MIN_RAY_LENGTH {
        return Err(GeometryError::Degenerate);
    }

    // 丸め誤差で |cos| > 1 になると acos が NaN を返す
    let cos = (ba.dot(&bc) / (len_ba * len_bc)).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}
