use serde::{Deserialize, Serialize};

/// Playback direction: the signed step applied to the cursor each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayDirection {
    #[default]
    Play,
    Pause,
    Rewind,
}

impl PlayDirection {
    pub fn step(self) -> isize {
        match self {
            PlayDirection::Play => 1,
            PlayDirection::Pause => 0,
            PlayDirection::Rewind => -1,
        }
    }

    pub fn is_paused(self) -> bool {
        self == PlayDirection::Pause
    }
}

/// Frame cursor owned by the timing loop.
///
/// The cursor is allowed to step one past either end; it wraps at the start
/// of the next tick, which is what makes playback circular in both directions.
#[derive(Debug, Clone)]
pub struct Transport {
    cursor: isize,
    frame_count: usize,
}

impl Transport {
    pub fn new(frame_count: usize) -> Self {
        Self {
            cursor: 0,
            frame_count,
        }
    }

    /// Run one tick: wrap the cursor, pick the frame to dispatch (none while
    /// paused), then advance by `direction`'s step.
    pub fn tick(&mut self, direction: PlayDirection) -> Option<usize> {
        if self.frame_count == 0 {
            return None;
        }

        let count = self.frame_count as isize;
        if self.cursor >= count {
            self.cursor = 0;
        } else if self.cursor < 0 {
            self.cursor = count - 1;
        }

        let current = (!direction.is_paused()).then_some(self.cursor as usize);
        self.cursor += direction.step();
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(transport: &mut Transport, direction: PlayDirection, ticks: usize) -> Vec<Option<usize>> {
        (0..ticks).map(|_| transport.tick(direction)).collect()
    }

    #[test]
    fn steps() {
        assert_eq!(PlayDirection::Play.step(), 1);
        assert_eq!(PlayDirection::Pause.step(), 0);
        assert_eq!(PlayDirection::Rewind.step(), -1);
        assert_eq!(PlayDirection::default(), PlayDirection::Play);
    }

    #[test]
    fn play_wraps_to_start() {
        let mut t = Transport::new(4);
        let got = run(&mut t, PlayDirection::Play, 6);
        assert_eq!(got, vec![Some(0), Some(1), Some(2), Some(3), Some(0), Some(1)]);
    }

    #[test]
    fn rewind_renders_current_then_wraps_to_end() {
        let mut t = Transport::new(4);
        let got = run(&mut t, PlayDirection::Rewind, 5);
        assert_eq!(got, vec![Some(0), Some(3), Some(2), Some(1), Some(0)]);
    }

    #[test]
    fn pause_freezes_cursor() {
        let mut t = Transport::new(4);
        t.tick(PlayDirection::Play);
        t.tick(PlayDirection::Play);
        assert_eq!(run(&mut t, PlayDirection::Pause, 3), vec![None, None, None]);
        assert_eq!(t.tick(PlayDirection::Play), Some(2));
    }

    #[test]
    fn switching_direction_mid_stream() {
        let mut t = Transport::new(3);
        assert_eq!(t.tick(PlayDirection::Play), Some(0));
        assert_eq!(t.tick(PlayDirection::Play), Some(1));
        // cursor at 2, reversing renders 2 then walks back
        assert_eq!(t.tick(PlayDirection::Rewind), Some(2));
        assert_eq!(t.tick(PlayDirection::Rewind), Some(1));
        assert_eq!(t.tick(PlayDirection::Rewind), Some(0));
        assert_eq!(t.tick(PlayDirection::Rewind), Some(2));
    }

    #[test]
    fn single_frame_repeats() {
        let mut t = Transport::new(1);
        assert_eq!(run(&mut t, PlayDirection::Play, 3), vec![Some(0); 3]);
        assert_eq!(run(&mut t, PlayDirection::Rewind, 3), vec![Some(0); 3]);
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&PlayDirection::Rewind).unwrap();
        assert_eq!(json, "\"rewind\"");
        let back: PlayDirection = serde_json::from_str("\"pause\"").unwrap();
        assert_eq!(back, PlayDirection::Pause);
    }
}
