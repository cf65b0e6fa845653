use serde::Serialize;
use tower_defence_core::Event;
use tower_defence_engine::{AudioCue, FrameSnapshot, Session};
use tracing::{info, warn};

/// Limits for a headless run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RunLimits {
    /// Waves to play before stopping.
    pub(crate) waves: u32,
    /// Simulated milliseconds between frames.
    pub(crate) frame_ms: f64,
    /// Frames to run before giving up.
    pub(crate) max_frames: u64,
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RunReport {
    /// Frames that were simulated.
    pub(crate) frames: u64,
    /// Waves that finished.
    pub(crate) waves_cleared: u32,
    /// Enemies destroyed by towers.
    pub(crate) kills: u32,
    /// Enemies that reached the exit.
    pub(crate) escapes: u32,
    /// Shots fired by all towers.
    pub(crate) shots: u32,
    /// State after the final frame.
    pub(crate) snapshot: FrameSnapshot,
}

/// Plays waves back to back until the limits are reached or the player is
/// defeated.
pub(crate) fn run(session: &mut Session, limits: RunLimits) -> RunReport {
    let mut frames = 0;
    let mut waves_started = 0;
    let mut waves_cleared = 0;
    let mut kills = 0;
    let mut escapes = 0;
    let mut shots = 0;

    while frames < limits.max_frames {
        let hud = session.hud();
        if hud.defeated || waves_cleared >= limits.waves {
            break;
        }
        if !hud.wave_active && waves_started == waves_cleared {
            session.start_wave();
            waves_started += 1;
        }

        session.frame(frames as f64 * limits.frame_ms);
        frames += 1;

        for event in session.drain_events() {
            match event {
                Event::WaveCompleted { wave } => {
                    waves_cleared += 1;
                    info!(wave, lives = session.hud().lives, "wave cleared");
                }
                Event::EnemyKilled { .. } => kills += 1,
                Event::EnemyEscaped { .. } => escapes += 1,
                Event::WaveStartRejected { reason } => {
                    warn!(?reason, "wave could not start");
                }
                _ => {}
            }
        }
        shots += session
            .drain_audio_cues()
            .iter()
            .filter(|cue| matches!(cue, AudioCue::ShotFired { .. }))
            .count() as u32;
    }

    if frames >= limits.max_frames && waves_cleared < limits.waves {
        warn!(frames, "frame limit reached before all waves finished");
    }

    RunReport {
        frames,
        waves_cleared,
        kills,
        escapes,
        shots,
        snapshot: session.snapshot(),
    }
}
