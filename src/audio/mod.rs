use crate::model::SourceRef;
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::fmt;
use std::fs::File;
use std::time::{Duration, Instant};

const MAX_VOLUME: f32 = 1.0;

/// Notifications a handle raises on its own, outside of controller calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleEvent {
    Started,
    Ended,
}

/// The per-entry play object. Owns its own volume, position and loop flag.
pub trait Playable: fmt::Debug {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Moves the position back to zero without changing the paused flag.
    fn rewind(&mut self);
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn is_paused(&self) -> bool;
    fn position(&self) -> Duration;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn looping(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
    fn poll_events(&mut self) -> Vec<HandleEvent>;
}

pub trait PlaybackBackend {
    fn create(&self, source: &SourceRef) -> Box<dyn Playable>;
    fn output_name(&self) -> &str;
}

pub struct RodioBackend {
    stream: OutputStream,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let mut stream = OutputStreamBuilder::from_default_device()
            .context("failed to open default system output stream")?
            .with_error_callback(|_| {})
            .open_stream_or_fallback()
            .context("failed to start default output stream")?;
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl PlaybackBackend for RodioBackend {
    fn create(&self, source: &SourceRef) -> Box<dyn Playable> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        Box::new(RodioPlayable {
            sink,
            source: source.clone(),
            loaded: false,
            paused: true,
            looping: false,
            volume: 1.0,
            events: Vec::new(),
        })
    }

    fn output_name(&self) -> &str {
        "System default output"
    }
}

/// A sink bound to one source. The decoder is created on first play and
/// again whenever the sink drained or was rewound.
pub struct RodioPlayable {
    sink: Sink,
    source: SourceRef,
    loaded: bool,
    paused: bool,
    looping: bool,
    volume: f32,
    events: Vec<HandleEvent>,
}

impl RodioPlayable {
    fn load(&mut self) -> Result<()> {
        let path = self.source.path();
        let file =
            File::open(path).with_context(|| format!("failed to open media {}", path.display()))?;
        let decoder = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.sink.append(decoder);
        self.loaded = true;
        Ok(())
    }
}

impl fmt::Debug for RodioPlayable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioPlayable")
            .field("source", &self.source)
            .field("loaded", &self.loaded)
            .field("paused", &self.paused)
            .field("looping", &self.looping)
            .field("volume", &self.volume)
            .finish()
    }
}

impl Playable for RodioPlayable {
    fn play(&mut self) -> Result<()> {
        if !self.loaded || self.sink.empty() {
            self.sink.clear();
            self.loaded = false;
            self.load()?;
        }
        self.sink.play();
        if self.paused {
            self.events.push(HandleEvent::Started);
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.paused = true;
    }

    fn rewind(&mut self) {
        self.sink.clear();
        self.loaded = false;
        if !self.paused && let Err(err) = self.play() {
            log::warn!("rewind failed to restart {}: {err:#}", self.source.path().display());
        }
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if !self.loaded {
            self.load()?;
        }
        self.sink
            .try_seek(position)
            .map_err(|err| anyhow::anyhow!("failed to seek: {err:?}"))
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn position(&self) -> Duration {
        if self.loaded {
            self.sink.get_pos()
        } else {
            Duration::ZERO
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
        self.sink.set_volume(self.volume);
    }

    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn poll_events(&mut self) -> Vec<HandleEvent> {
        if self.loaded && !self.paused && self.sink.empty() {
            self.loaded = false;
            let restarted = self.looping && self.load().is_ok();
            if !restarted {
                self.paused = true;
                self.events.push(HandleEvent::Ended);
            }
        }
        std::mem::take(&mut self.events)
    }
}

/// Backend used when no output device can be opened. Handles keep their
/// state and clock but produce no sound and never end on their own.
#[derive(Debug, Default)]
pub struct NullBackend;

impl PlaybackBackend for NullBackend {
    fn create(&self, _source: &SourceRef) -> Box<dyn Playable> {
        Box::new(NullPlayable::new())
    }

    fn output_name(&self) -> &str {
        "No audio output"
    }
}

#[derive(Debug)]
pub struct NullPlayable {
    paused: bool,
    looping: bool,
    volume: f32,
    started_at: Option<Instant>,
    position_offset: Duration,
    events: Vec<HandleEvent>,
}

impl NullPlayable {
    pub fn new() -> Self {
        Self {
            paused: true,
            looping: false,
            volume: 1.0,
            started_at: None,
            position_offset: Duration::ZERO,
            events: Vec::new(),
        }
    }
}

impl Default for NullPlayable {
    fn default() -> Self {
        Self::new()
    }
}

impl Playable for NullPlayable {
    fn play(&mut self) -> Result<()> {
        if self.paused {
            self.started_at = Some(Instant::now());
            self.events.push(HandleEvent::Started);
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.position_offset = self.position();
        self.started_at = None;
        self.paused = true;
    }

    fn rewind(&mut self) {
        self.position_offset = Duration::ZERO;
        if !self.paused {
            self.started_at = Some(Instant::now());
        }
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        self.position_offset = position;
        if !self.paused {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn position(&self) -> Duration {
        match self.started_at {
            Some(started_at) if !self.paused => {
                self.position_offset.saturating_add(started_at.elapsed())
            }
            _ => self.position_offset,
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
    }

    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn poll_events(&mut self) -> Vec<HandleEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_starts_paused_at_full_volume() {
        let handle = NullBackend.create(&SourceRef::new("a.mp3"));
        assert!(handle.is_paused());
        assert_eq!(handle.volume(), 1.0);
        assert_eq!(handle.position(), Duration::ZERO);
    }

    #[test]
    fn null_handle_reports_start_once_per_resume() {
        let mut handle = NullPlayable::new();
        handle.play().expect("play");
        handle.play().expect("play");
        assert_eq!(handle.poll_events(), vec![HandleEvent::Started]);

        handle.pause();
        handle.play().expect("play");
        assert_eq!(handle.poll_events(), vec![HandleEvent::Started]);
        assert!(handle.poll_events().is_empty());
    }

    #[test]
    fn null_handle_rewind_resets_position() {
        let mut handle = NullPlayable::new();
        handle.seek_to(Duration::from_secs(42)).expect("seek");
        assert_eq!(handle.position(), Duration::from_secs(42));

        handle.rewind();
        assert_eq!(handle.position(), Duration::ZERO);
        assert!(handle.is_paused());
    }

    #[test]
    fn volume_is_clamped() {
        let mut handle = NullPlayable::new();
        handle.set_volume(3.0);
        assert_eq!(handle.volume(), 1.0);
        handle.set_volume(-1.0);
        assert_eq!(handle.volume(), 0.0);
    }
}
