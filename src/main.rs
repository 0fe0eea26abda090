use anyhow::{bail, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

use rep_counter::config::Config;
use rep_counter::pose::LandmarkReader;
use rep_counter::session::WorkoutSession;
use rep_counter::tracker::{ExerciseMode, SkipReason, StepOutcome};
use rep_counter::workout::{JsonlSink, WorkoutSink};

const CONFIG_PATH: &str = "config.toml";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/replay_{}.log", ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    Ok(Arc::new(Mutex::new(std::io::BufWriter::new(file))))
}

macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        eprintln!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
            let _ = f.flush();
        }
    }};
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

/// Usage: rep-counter <landmarks.jsonl> [pushup|pullup]
fn parse_args() -> Result<(String, ExerciseMode)> {
    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        bail!("usage: rep-counter <landmarks.jsonl> [pushup|pullup]");
    };
    let mode = match args.get(2) {
        None => ExerciseMode::PushUp,
        Some(s) => match ExerciseMode::parse(s) {
            Some(mode) => mode,
            None => bail!("不明な種目: {} (pushup / pullup)", s),
        },
    };
    Ok((path.clone(), mode))
}

#[derive(Default)]
struct Stats {
    frames: u32,
    throttled: u32,
    no_pose: u32,
    low_visibility: u32,
    degenerate: u32,
    invalid_form: u32,
    bad_lines: u32,
}

fn main() -> Result<()> {
    let (input, mode) = parse_args()?;
    let config = Config::load_or_default(CONFIG_PATH);
    let logfile = open_log_file()?;

    let profile = rep_counter::tracker::ExerciseProfile::from_config(mode, &config);
    log!(logfile, "=== Rep Counter {} ===", env!("GIT_VERSION"));
    log!(logfile, "入力: {}", input);
    log!(logfile, "種目: {}", mode.as_str());
    log!(
        logfile,
        "閾値: extended > {:.0}°, contracted < {:.0}°, alignment: {}",
        profile.extended_threshold,
        profile.contracted_threshold,
        profile
            .alignment
            .map_or("off".to_string(), |g| format!("{:?} < {:.2}", g.axis, g.max_score))
    );
    log!(logfile, "間引き: {}ms, 平滑化: {}", config.throttle.min_interval_ms,
        if config.filter.enabled { "ON" } else { "OFF" });

    let mut session = WorkoutSession::from_config(mode, &config);
    let rep_log = Arc::clone(&logfile);
    session.on_rep_completed(move |count| {
        log!(rep_log, "  -> {} 回", count);
    });

    let mut stats = Stats::default();
    let mut last_t = 0u64;

    for item in LandmarkReader::open(&input)? {
        let timed = match item {
            Ok(timed) => timed,
            Err(e) => {
                stats.bad_lines += 1;
                log!(logfile, "[input] skip: {:#}", e);
                continue;
            }
        };
        stats.frames += 1;
        last_t = timed.t_ms;

        let outcome = session.on_frame(&timed.frame, timed.t_ms);
        match outcome {
            StepOutcome::Throttled => stats.throttled += 1,
            StepOutcome::Skipped(SkipReason::PoseUnavailable) => stats.no_pose += 1,
            StepOutcome::Skipped(SkipReason::LowVisibility) => stats.low_visibility += 1,
            StepOutcome::Skipped(SkipReason::DegenerateGeometry) => stats.degenerate += 1,
            StepOutcome::InvalidForm { angle, alignment } => {
                stats.invalid_form += 1;
                log!(logfile, "[{:>8}ms] フォーム不良 angle={:.1} alignment={:.3}",
                    timed.t_ms, angle, alignment);
            }
            StepOutcome::RepCompleted { count, angle, alignment } => {
                log!(logfile, "[{:>8}ms] レップ {} angle={:.1} alignment={}",
                    timed.t_ms, count, angle,
                    alignment.map_or("-".to_string(), |a| format!("{:.3}", a)));
            }
            StepOutcome::Extended { angle } | StepOutcome::Contracted { angle } => {
                log!(logfile, "[{:>8}ms] {:?} angle={:.1}", timed.t_ms, session.engine().phase(), angle);
            }
            StepOutcome::Hold { .. } => {}
        }
    }

    log!(
        logfile,
        "フレーム: {} (間引き {}, 姿勢なし {}, 低可視度 {}, 計算不可 {}, 不正行 {}), フォーム不良: {}",
        stats.frames, stats.throttled, stats.no_pose, stats.low_visibility,
        stats.degenerate, stats.bad_lines, stats.invalid_form
    );

    let mut sink = JsonlSink::new(&config.output.path);
    let previous_best = sink.previous_best(mode)?;
    match session.finish(last_t, previous_best) {
        Some(record) => {
            sink.save(&record)?;
            log!(logfile, "結果: {} 回 / {:.1} 秒{}", record.count, record.duration_seconds,
                if record.is_record { " (自己ベスト)" } else { "" });
            log!(logfile, "保存先: {}", sink.path().display());
            println!("{}", serde_json::to_string(&record)?);
        }
        None => {
            log!(logfile, "結果: 0 回 (保存なし)");
        }
    }

    Ok(())
}
