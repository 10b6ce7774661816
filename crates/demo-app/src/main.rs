use anyhow::{Context, Result};
use rune_config::RuneConfig;
use rune_motion::{Animation, AnimationEvent, AnimationOptions, Animator, Clock, SystemClock};
use std::io::Write;
use std::time::Duration;

const BAR_WIDTH: usize = 40;

fn arg_value(name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    std::env::args().find_map(|a| a.strip_prefix(&prefix).map(str::to_string))
}

fn has_flag(name: &str) -> bool {
    let flag = format!("--{name}");
    std::env::args().any(|a| a == flag)
}

fn options_from_args() -> Result<AnimationOptions> {
    let mut options = AnimationOptions {
        name: Some("demo".to_string()),
        duration: Some(1200.0),
        repeat: 1,
        auto_reverse: true,
        ..AnimationOptions::default()
    };

    if let Some(curve) = arg_value("curve") {
        options.curve = curve;
    }
    if let Some(duration) = arg_value("duration") {
        options.duration = Some(duration.parse().context("--duration expects milliseconds")?);
    }
    if let Some(delay) = arg_value("delay") {
        options.delay = delay.parse().context("--delay expects milliseconds")?;
    }
    if let Some(repeat) = arg_value("repeat") {
        options.repeat = repeat.parse().context("--repeat expects an integer")?;
    }
    if has_flag("reverse") {
        options.reverse = true;
    }
    if has_flag("no-auto-reverse") {
        options.auto_reverse = false;
    }
    if has_flag("slow") {
        options.use_slow_animations = true;
    }
    Ok(options)
}

fn draw(value: f64) -> Result<()> {
    let filled = (value.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    let mut stdout = std::io::stdout().lock();
    write!(
        stdout,
        "\r[{}{}] {:>5.3}",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        value
    )?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let config = RuneConfig::load();
    let filter = config.logging.filter.clone().unwrap_or_else(|| "info".to_string());
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).try_init();

    let options = options_from_args()?;
    // --pause-at=MS pauses once for the same number of milliseconds.
    let pause_at: Option<f64> = arg_value("pause-at")
        .map(|v| v.parse())
        .transpose()
        .context("--pause-at expects milliseconds")?;

    let frame_interval = Duration::from_secs_f64(config.animation.frame_interval_ms() / 1000.0);
    let mut animator = Animator::with_config(SystemClock::new(), config.animation)?;

    let key = animator.insert(Animation::with_config(options, animator.config()).on_step(|value| {
        if let Err(err) = draw(value) {
            log::warn!("draw failed: {err}");
        }
    }));
    animator.start(key)?;

    let mut paused_since: Option<f64> = None;
    let mut paused_once = false;
    loop {
        std::thread::sleep(frame_interval);
        animator.tick();

        let now = animator.clock().now();
        match (pause_at, paused_since) {
            (Some(at), None) if !paused_once && now >= at => {
                animator.pause(key)?;
                paused_since = Some(now);
                paused_once = true;
            }
            (Some(at), Some(since)) if now - since >= at => {
                animator.play(key)?;
                paused_since = None;
            }
            _ => {}
        }

        for event in animator.drain_events() {
            match event {
                AnimationEvent::Completed {
                    estimated_fps,
                    finished,
                    ..
                } => {
                    println!();
                    log::info!("completed (finished: {finished}, ~{estimated_fps:.1} fps)");
                }
                other => log::debug!("{other:?}"),
            }
        }

        if !animator.has_pending_frames() && paused_since.is_none() {
            break;
        }
    }

    Ok(())
}
