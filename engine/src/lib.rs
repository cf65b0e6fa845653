#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for the tower defence simulation.
//!
//! A [`Lobby`] collects the pre-game selections and starts a [`Session`]. The
//! session owns the world together with every system and drives them in a
//! fixed order each frame, exposing HUD state, frame snapshots and audio cues
//! to whatever host presents the game.

mod clock;
mod session;

pub use clock::FrameClock;
pub use session::{
    AudioCue, EnemyFrame, FrameSnapshot, HudState, Lobby, Session, PLACEMENT_TONE_HZ,
};
