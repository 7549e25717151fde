#![no_main]

use libfuzzer_sys::fuzz_target;
use mediadeck::audio::NullBackend;
use mediadeck::core::{PlayerEvent, PlayerSession};
use mediadeck::folder::MemoryFolders;
use mediadeck::handle_store::MemoryHandleStore;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fuzz_target!(|data: &[u8]| {
    let mut session = PlayerSession::new(
        Box::new(NullBackend),
        Box::new(MemoryFolders::new()),
        Box::new(MemoryHandleStore::new()),
    );
    let len = (data.len() % 16).max(1);
    let paths: Vec<PathBuf> = (0..len)
        .map(|idx| PathBuf::from(format!("track_{idx}.mp3")))
        .collect();
    session.add_paths(&paths);
    let start = Instant::now();

    for (step, byte) in data.iter().enumerate() {
        let index = usize::from(byte / 16);
        let event = match byte % 12 {
            0 => PlayerEvent::Play(index),
            1 => PlayerEvent::Pause(index),
            2 => PlayerEvent::Stop(index),
            3 => PlayerEvent::MoveUp(index),
            4 => PlayerEvent::MoveDown(index),
            5 => PlayerEvent::Delete(index),
            6 => PlayerEvent::ToggleFade(index),
            7 => PlayerEvent::ToggleSinglePlay,
            8 => PlayerEvent::ToggleLoop,
            9 => match session.playlist.get(index).map(|entry| entry.id()) {
                Some(id) => PlayerEvent::HandleEnded(id),
                None => PlayerEvent::ToggleTheme,
            },
            10 => match session.playlist.get(index).map(|entry| entry.id()) {
                Some(id) => PlayerEvent::HandleStarted(id),
                None => PlayerEvent::ToggleTheme,
            },
            _ => PlayerEvent::Tick(start + Duration::from_millis(50 * step as u64)),
        };
        session.dispatch(event);

        assert!(session.playlist.iter().filter(|entry| entry.playing).count() <= 1);
        assert!(session.playlist.iter().all(|entry| {
            let volume = entry.handle.volume();
            (0.0..=1.0).contains(&volume)
        }));
    }
});
