pub mod transport;

pub use transport::{PlayDirection, Transport};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{PlayerError, PlayerResult};
use crate::media::{self, CompositedFrame, FrameSequence, delay_from_hint};
use crate::settings::PlayerConfig;

/// Sink for composited frames. Called on its own thread for every dispatch.
pub type RenderFn = dyn Fn(Arc<CompositedFrame>) + Send + Sync;

/// Runtime controls shared between the public API and the timing loop.
/// Each field is locked on its own; a tick only needs per-field snapshots.
struct Controls {
    direction: RwLock<PlayDirection>,
    delay: RwLock<Duration>,
    shutdown: AtomicBool,
}

impl Controls {
    fn direction(&self) -> PlayDirection {
        *self.direction.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_direction(&self, direction: PlayDirection) {
        *self.direction.write().unwrap_or_else(PoisonError::into_inner) = direction;
    }

    fn delay(&self) -> Duration {
        *self.delay.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap_or_else(PoisonError::into_inner) = delay;
    }
}

/// Plays a composited frame sequence through a render callback on a background thread.
///
/// The timing loop starts as soon as the player is constructed and keeps going
/// for as long as the `Player` is alive. Dropping it stops the loop after its
/// current sleep; render calls already dispatched run to completion.
///
/// Keep the player bound for as long as playback should run. A bare
/// `Player::open(path, render)?;` drops it immediately, so at most the
/// first frame is rendered.
#[must_use = "dropping a Player stops playback"]
pub struct Player {
    frames: Arc<FrameSequence>,
    controls: Arc<Controls>,
    _thread: JoinHandle<()>,
}

impl Player {
    /// Load, composite and start playing a GIF with default settings.
    pub fn open<F>(path: &Path, render: F) -> PlayerResult<Self>
    where
        F: Fn(Arc<CompositedFrame>) + Send + Sync + 'static,
    {
        Self::open_with_config(path, &PlayerConfig::default(), render)
    }

    pub fn open_with_config<F>(path: &Path, config: &PlayerConfig, render: F) -> PlayerResult<Self>
    where
        F: Fn(Arc<CompositedFrame>) + Send + Sync + 'static,
    {
        let frames = media::load_animation(path)?;
        Self::with_config(frames, config, render)
    }

    /// Start playing an already composited sequence with default settings.
    pub fn new<F>(frames: FrameSequence, render: F) -> PlayerResult<Self>
    where
        F: Fn(Arc<CompositedFrame>) + Send + Sync + 'static,
    {
        Self::with_config(frames, &PlayerConfig::default(), render)
    }

    pub fn with_config<F>(frames: FrameSequence, config: &PlayerConfig, render: F) -> PlayerResult<Self>
    where
        F: Fn(Arc<CompositedFrame>) + Send + Sync + 'static,
    {
        let Some(first) = frames.first() else {
            return Err(PlayerError::EmptyAnimation);
        };
        let delay = delay_from_hint(first.delay_cs, config.fallback_delay());

        let controls = Arc::new(Controls {
            direction: RwLock::new(config.initial_direction),
            delay: RwLock::new(delay),
            shutdown: AtomicBool::new(false),
        });
        let frames = Arc::new(frames);
        let render: Arc<RenderFn> = Arc::new(render);

        let thread_frames = Arc::clone(&frames);
        let thread_controls = Arc::clone(&controls);
        let handle = thread::Builder::new()
            .name("gifloop-playback".into())
            .spawn(move || timing_loop(&thread_frames, &thread_controls, &render))
            .map_err(PlayerError::Spawn)?;

        log::info!(
            "Playback started: {} frame{}, {:?} delay, {:?}",
            frames.len(),
            if frames.len() == 1 { "" } else { "s" },
            delay,
            config.initial_direction
        );

        Ok(Self {
            frames,
            controls,
            _thread: handle,
        })
    }

    pub fn play(&self) {
        self.set_direction(PlayDirection::Play);
    }

    pub fn pause(&self) {
        self.set_direction(PlayDirection::Pause);
    }

    pub fn rewind(&self) {
        self.set_direction(PlayDirection::Rewind);
    }

    /// Takes effect on the next tick.
    pub fn set_direction(&self, direction: PlayDirection) {
        self.controls.set_direction(direction);
        log::debug!("Direction set to {direction:?}");
    }

    /// Takes effect from the next sleep; a wait already in progress is not shortened.
    pub fn set_delay(&self, delay: Duration) {
        self.controls.set_delay(delay);
        log::debug!("Delay set to {delay:?}");
    }

    pub fn direction(&self) -> PlayDirection {
        self.controls.direction()
    }

    pub fn delay(&self) -> Duration {
        self.controls.delay()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.controls.shutdown.store(true, Ordering::Relaxed);
    }
}

fn timing_loop(frames: &FrameSequence, controls: &Controls, render: &Arc<RenderFn>) {
    let mut transport = Transport::new(frames.len());

    while !controls.shutdown.load(Ordering::Relaxed) {
        let direction = controls.direction();
        if let Some(frame) = transport.tick(direction).and_then(|i| frames.get(i)) {
            log::trace!("Dispatching frame {}", frame.index);
            dispatch(render, Arc::clone(frame));
        }

        thread::sleep(controls.delay());
    }

    log::debug!("Playback thread shutting down");
}

/// Hand one frame to the renderer on a fresh thread, never waiting for it.
fn dispatch(render: &Arc<RenderFn>, frame: Arc<CompositedFrame>) {
    let render = Arc::clone(render);
    let index = frame.index;
    let spawned = thread::Builder::new()
        .name("gifloop-render".into())
        .spawn(move || render(frame));
    if let Err(e) = spawned {
        log::error!("Failed to spawn render thread for frame {index}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Instant;

    use crossbeam_channel::{Receiver, unbounded};

    use super::*;
    use crate::media::decoder::fixtures::ramp_gif;
    use crate::media::{composite, decode_gif};

    fn ramp(delay_cs: u16) -> FrameSequence {
        composite(&decode_gif(Cursor::new(ramp_gif(delay_cs))).unwrap()).unwrap()
    }

    fn recording_player(delay_cs: u16, config: &PlayerConfig) -> (Player, Receiver<u8>) {
        let (tx, rx) = unbounded();
        let player = Player::with_config(ramp(delay_cs), config, move |frame| {
            let _ = tx.send(frame.image.get_pixel(0, 0)[0]);
        })
        .unwrap();
        (player, rx)
    }

    fn take(rx: &Receiver<u8>, n: usize) -> Vec<u8> {
        (0..n)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect()
    }

    fn take_indices(rx: &Receiver<usize>, n: usize) -> Vec<usize> {
        (0..n)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect()
    }

    fn starting(direction: PlayDirection) -> PlayerConfig {
        PlayerConfig {
            initial_direction: direction,
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn initial_state() {
        let player = Player::new(ramp(4), |_| {}).unwrap();
        assert_eq!(player.direction(), PlayDirection::Play);
        assert_eq!(player.delay(), Duration::from_millis(40));
        assert_eq!(player.frame_count(), 4);
        assert_eq!(player.frames().dimensions(), (1, 1));
    }

    #[test]
    fn zero_hint_uses_fallback_delay() {
        let player = Player::new(ramp(0), |_| {}).unwrap();
        assert_eq!(player.delay(), Duration::from_millis(30));

        let config = PlayerConfig {
            fallback_delay_ms: 55,
            ..PlayerConfig::default()
        };
        let player = Player::with_config(ramp(0), &config, |_| {}).unwrap();
        assert_eq!(player.delay(), Duration::from_millis(55));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = Player::new(FrameSequence::new(Vec::new()), |_| {}).err().unwrap();
        assert!(matches!(err, PlayerError::EmptyAnimation));
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Player::open(&dir.path().join("missing.gif"), |_| {}).err().unwrap();
        assert!(matches!(err, PlayerError::Load { .. }));
    }

    #[test]
    fn open_plays_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.gif");
        std::fs::write(&path, ramp_gif(2)).unwrap();

        let (tx, rx) = unbounded();
        let player = Player::open(&path, move |frame| {
            let _ = tx.send(frame.index);
        })
        .unwrap();
        assert_eq!(player.frame_count(), 4);
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 0);
    }

    #[test]
    fn play_dispatches_in_order_and_wraps() {
        let (_player, rx) = recording_player(2, &starting(PlayDirection::Play));
        assert_eq!(take(&rx, 6), vec![10, 20, 30, 40, 10, 20]);
    }

    #[test]
    fn rewind_renders_first_frame_then_walks_back() {
        let (_player, rx) = recording_player(2, &starting(PlayDirection::Rewind));
        assert_eq!(take(&rx, 6), vec![10, 40, 30, 20, 10, 40]);
    }

    #[test]
    fn pause_dispatches_nothing() {
        let (player, rx) = recording_player(2, &starting(PlayDirection::Pause));
        // well over three 20ms ticks
        assert!(rx.recv_timeout(Duration::from_millis(120)).is_err());

        player.play();
        assert_eq!(take(&rx, 2), vec![10, 20]);
    }

    #[test]
    fn direction_setters() {
        let player = Player::new(ramp(2), |_| {}).unwrap();
        player.pause();
        assert_eq!(player.direction(), PlayDirection::Pause);
        player.rewind();
        assert_eq!(player.direction(), PlayDirection::Rewind);
        player.set_direction(PlayDirection::Play);
        assert_eq!(player.direction(), PlayDirection::Play);
    }

    #[test]
    fn new_delay_waits_for_current_sleep() {
        let (player, rx) = recording_player(30, &starting(PlayDirection::Play));
        assert_eq!(take(&rx, 1), vec![10]);
        thread::sleep(Duration::from_millis(50));

        // loop is now inside its 300ms sleep
        player.set_delay(Duration::from_millis(10));
        assert_eq!(player.delay(), Duration::from_millis(10));
        assert!(rx.recv_timeout(Duration::from_millis(120)).is_err());

        assert_eq!(take(&rx, 1), vec![20]);
        let start = Instant::now();
        assert_eq!(take(&rx, 2), vec![30, 40]);
        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[test]
    fn slow_renderer_does_not_stall_loop() {
        let (tx, rx) = unbounded();
        let player = Player::new(ramp(1), move |frame| {
            thread::sleep(Duration::from_millis(100));
            let _ = tx.send(frame.index);
        })
        .unwrap();

        let start = Instant::now();
        let mut got = take_indices(&rx, 5);
        got.sort_unstable();
        // serialized rendering would need at least 500ms
        assert!(start.elapsed() < Duration::from_millis(450));
        assert_eq!(got, vec![0, 0, 1, 2, 3]);
        drop(player);
    }

    #[test]
    fn unbound_player_renders_at_most_one_frame() {
        let (tx, rx) = unbounded();
        let _ = Player::new(ramp(1), move |frame| {
            let _ = tx.send(frame.index);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        let got: Vec<usize> = rx.try_iter().collect();
        assert!(got.len() <= 1, "{got:?}");
    }

    #[test]
    fn drop_stops_dispatching() {
        let (player, rx) = recording_player(1, &starting(PlayDirection::Play));
        take(&rx, 2);
        drop(player);
        // at most one tick was already past the shutdown check
        thread::sleep(Duration::from_millis(60));
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(80)).is_err());
    }
}
