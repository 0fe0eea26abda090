//! JSON Lines 形式のランドマーク入力
//!
//! 1行が姿勢モデルの1フレーム:
//!
//! ```text
//! {"t_ms": 1033, "landmarks": [[0.41, 0.52, 0.98], [0.40, 0.50], ...]}
//! {"t_ms": 1066, "landmarks": null}
//! ```
//!
//! `landmarks` は `[x, y]` または `[x, y, visibility]` が33個、姿勢が
//! 検出されなかったフレームは `null`。空行は読み飛ばす。
//! JSON として読めない行はエラーを返して次の行へ進むが、読み出し自体の
//! エラーではそこで終了する。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::keypoint::{Frame, Landmark, Pose};
use super::PoseError;

/// 到着時刻付きフレーム
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFrame {
    pub t_ms: u64,
    pub frame: Frame,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    t_ms: u64,
    #[serde(default)]
    landmarks: Option<Vec<Vec<f32>>>,
}

fn to_landmark(index: usize, raw: &[f32]) -> Result<Landmark, PoseError> {
    match *raw {
        [x, y] => Ok(Landmark::new(x, y)),
        [x, y, v] => Ok(Landmark::with_visibility(x, y, v)),
        _ => Err(PoseError::LandmarkShape { index, len: raw.len() }),
    }
}

/// 1行をパース
pub fn parse_line(line: &str) -> Result<TimedFrame> {
    let raw: RawFrame = serde_json::from_str(line)?;
    let frame = match raw.landmarks {
        None => Frame::NoPose,
        Some(points) => {
            let landmarks = points
                .iter()
                .enumerate()
                .map(|(i, p)| to_landmark(i, p))
                .collect::<Result<Vec<_>, _>>()?;
            Frame::Detected(Pose::from_slice(&landmarks)?)
        }
    };
    Ok(TimedFrame { t_ms: raw.t_ms, frame })
}

/// BufRead からフレームを順に読み出すイテレータ
pub struct LandmarkReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
    /// 読み出しエラー後は None を返し続ける
    done: bool,
}

impl<R: BufRead> LandmarkReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
            done: false,
        }
    }
}

impl LandmarkReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open landmark file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for LandmarkReader<R> {
    type Item = Result<TimedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    // 読み出しエラーは1回だけ返して終了する
                    self.done = true;
                    let line_no = self.line_no;
                    return Some(Err(anyhow::Error::new(e).context(format!("line {}", line_no))));
                }
            }
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = self.line_no;
            return Some(parse_line(line).with_context(|| format!("line {}", line_no)));
        }
    }
}
