pub mod format;
pub mod compress;
pub mod encode;
pub mod decode;
pub mod error;
pub mod frame;
pub mod resource;
pub mod render;
pub mod decoder;
pub mod surface;
pub mod palette;
pub mod player;

pub use error::{PlaybackError, Result};
pub use player::{PlaybackListener, PlayerConfig, PlayerId, VideoPlayer, END_OF_PLAYBACK};

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::io::Cursor;
    use std::rc::Rc;

    use crate::decode::CutsceneReader;
    use crate::decoder::{CutsceneDecoder, VideoDecoder};
    use crate::encode::CutsceneWriter;
    use crate::format::*;
    use crate::frame::{Frame, Rect};
    use crate::render::{DisplayConfig, RenderBackend, NATIVE_PALETTE_SIZE};
    use crate::resource::{
        parse_resource_hash, resource_file_name, ByteStream, DirectoryResources, MemoryResources, ResourceManager,
    };
    use crate::*;

    const INTRO: u32 = 0x0A1B_2C3D;
    const MISSING: u32 = 0xDEAD_BEEF;

    /// Frame 0 is a black keyframe; frame `i > 0` sets pixel (0, 0) to `i`.
    /// Frames listed in `palette_frames` carry a palette filled with `0x10 + i`.
    fn build_cutscene(width: u16, height: u16, frames: u8, palette_frames: &[u8]) -> Vec<u8> {
        let mut writer = CutsceneWriter::new(Cursor::new(Vec::new()), width, height, 15, 30).unwrap();
        let area = width as usize * height as usize;
        for i in 0..frames {
            let pal = palette_frames.contains(&i).then(|| [0x10 + i; PALETTE_SIZE]);
            if i == 0 {
                writer.write_keyframe(&vec![0u8; area], pal.as_ref()).unwrap();
            } else {
                writer
                    .write_delta(&[DeltaPixel { x: 0, y: 0, index: i }], pal.as_ref())
                    .unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn resources_with(entries: &[(u32, Vec<u8>)]) -> Rc<dyn ResourceManager> {
        let mut mem = MemoryResources::new();
        for (hash, data) in entries {
            mem.insert(*hash, data.clone());
        }
        Rc::new(mem)
    }

    #[derive(Default)]
    struct RecordingScreen {
        /// (dest, clip, scaled, pixel at 0,0)
        blits: Vec<(Rect, Rect, bool, u8)>,
        palettes: Vec<(Vec<u8>, usize, usize)>,
    }

    impl RenderBackend for RecordingScreen {
        fn draw_surface(&mut self, frame: &Frame, dest: Rect, clip: Rect, scaled: bool) {
            self.blits.push((dest, clip, scaled, frame.pixel(0, 0)));
        }

        fn install_palette(&mut self, palette: &[u8; NATIVE_PALETTE_SIZE], start: usize, count: usize, _flags: u32) {
            self.palettes.push((palette.to_vec(), start, count));
        }
    }

    type Messages = Rc<RefCell<Vec<(u32, u32, PlayerId)>>>;

    struct RecordingListener(Messages);

    impl PlaybackListener for RecordingListener {
        fn send_message(&mut self, message: u32, param: u32, sender: PlayerId) {
            self.0.borrow_mut().push((message, param, sender));
        }
    }

    fn player_with_listener(resources: Rc<dyn ResourceManager>, config: PlayerConfig) -> (VideoPlayer, Messages) {
        let messages = Messages::default();
        let listener = RecordingListener(Rc::clone(&messages));
        (VideoPlayer::new(resources, config, Some(Box::new(listener))), messages)
    }

    #[test]
    fn roundtrip_keyframe_and_delta() {
        let width = 4u16;
        let height = 2u16;
        let pixels: Vec<u8> = (0..8).collect();
        let deltas = vec![
            DeltaPixel { x: 1, y: 0, index: 200 },
            DeltaPixel { x: 3, y: 1, index: 7 },
        ];
        let mut palette = [0u8; PALETTE_SIZE];
        palette[0..3].copy_from_slice(&[255, 128, 1]);

        let buf = Cursor::new(Vec::new());
        let mut writer = CutsceneWriter::new(buf, width, height, 15, 30).unwrap();
        writer.write_keyframe(&pixels, Some(&palette)).unwrap();
        writer.write_delta(&deltas, None).unwrap();
        let buf = writer.finish().unwrap();

        let mut reader = CutsceneReader::new(Cursor::new(buf.into_inner())).unwrap();
        assert_eq!(reader.header.width, width);
        assert_eq!(reader.header.height, height);
        assert_eq!(reader.header.fps_num, 15);
        assert_eq!(reader.header.frame_count, 2);

        let key = reader.read_frame(0).unwrap();
        assert_eq!(key.frame_type, FrameType::Keyframe);
        assert_eq!(key.palette, Some(palette));
        assert_eq!(key.body, pixels);

        let delta = reader.read_frame(1).unwrap();
        assert_eq!(delta.frame_type, FrameType::Delta);
        assert!(delta.palette.is_none());
        assert_eq!(delta.deltas().collect::<Vec<_>>(), deltas);
    }

    #[test]
    fn reader_rejects_bad_magic() {
        let mut data = build_cutscene(2, 2, 1, &[]);
        data[0] = b'X';
        let err = CutsceneReader::new(Cursor::new(data)).err().unwrap();
        assert!(matches!(err, PlaybackError::InvalidContainer(_)));
    }

    #[test]
    fn decoder_applies_deltas_and_stops_at_end() {
        let data = build_cutscene(4, 4, 3, &[0]);
        let mut decoder = CutsceneDecoder::new();
        decoder.load_stream(Box::new(Cursor::new(data))).unwrap();
        assert_eq!((decoder.width(), decoder.height()), (4, 4));
        assert_eq!(decoder.frame_rate(), 15.0);

        let first = decoder.decode_next_frame().unwrap();
        assert_eq!(first.pixel(0, 0), 0);
        assert!(decoder.has_dirty_palette());
        drop(first);

        let second = decoder.decode_next_frame().unwrap();
        assert_eq!(second.pixel(0, 0), 1);
        assert!(!decoder.has_dirty_palette());
        drop(second);

        decoder.decode_next_frame().unwrap();
        assert!(decoder.end_of_video());
        assert_eq!(decoder.cur_frame(), 2);
        assert!(matches!(decoder.decode_next_frame(), Err(PlaybackError::EndOfStream)));
    }

    #[test]
    fn open_starts_at_frame_zero() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 5, &[0]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        assert_eq!(player.frame_count(), 0);
        assert_eq!(player.frame_number(), 0);

        player.open(INTRO, false).unwrap();
        assert!(player.is_open());
        assert_eq!(player.frame_count(), 5);
        assert_eq!(player.frame_number(), 0);
        assert!(!player.needs_redraw());
    }

    #[test]
    fn non_looping_playback_sends_one_end_event() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 3, &[0]))]);
        let (mut player, messages) = player_with_listener(resources, PlayerConfig::default());
        let mut screen = RecordingScreen::default();
        player.open(INTRO, false).unwrap();

        for expected in 0..3 {
            player.update(&mut screen).unwrap();
            assert_eq!(player.frame_number(), expected);
            assert!(player.take_redraw());
        }
        assert!(messages.borrow().is_empty());

        player.update(&mut screen).unwrap();
        assert!(!player.take_redraw());
        assert!(player.has_ended());
        for _ in 0..10 {
            player.update(&mut screen).unwrap();
        }

        let messages = messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], (END_OF_PLAYBACK, 0, player.id()));

        player.draw(&mut screen);
        assert_eq!(screen.blits.len(), 1);
        assert_eq!(screen.blits[0].3, 2);
    }

    #[test]
    fn reopening_allows_another_end_event() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 1, &[]))]);
        let (mut player, messages) = player_with_listener(resources, PlayerConfig::default());
        let mut screen = RecordingScreen::default();

        for _ in 0..2 {
            player.open(INTRO, false).unwrap();
            for _ in 0..4 {
                player.update(&mut screen).unwrap();
            }
        }
        assert_eq!(messages.borrow().len(), 2);
    }

    #[test]
    fn looping_playback_wraps_in_the_same_tick() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 3, &[0]))]);
        let (mut player, messages) = player_with_listener(resources, PlayerConfig::default());
        let mut screen = RecordingScreen::default();
        player.open(INTRO, true).unwrap();

        let mut seen = Vec::new();
        for _ in 0..7 {
            player.update(&mut screen).unwrap();
            assert!(player.take_redraw());
            assert!(!player.has_ended());
            seen.push(player.frame_number());

            player.draw(&mut screen);
            assert_eq!(screen.blits.last().unwrap().3 as u32, player.frame_number());
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(screen.blits.len(), 7);
        assert!(messages.borrow().is_empty());
        // Palette is re-applied each time frame 0 comes around.
        assert_eq!(screen.palettes.len(), 3);
    }

    #[test]
    fn looping_an_empty_cutscene_is_inert() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 0, &[]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        let mut screen = RecordingScreen::default();
        player.open(INTRO, true).unwrap();
        player.update(&mut screen).unwrap();
        player.update(&mut screen).unwrap();
        assert!(!player.needs_redraw());
        player.draw(&mut screen);
        assert!(screen.blits.is_empty());
    }

    #[test]
    fn first_frame_is_centered() {
        let data = build_cutscene(64, 48, 2, &[]);

        let resources = resources_with(&[(INTRO, data.clone())]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        let mut screen = RecordingScreen::default();
        player.open(INTRO, false).unwrap();
        player.update(&mut screen).unwrap();
        assert_eq!(player.draw_position(), Some((288, 216)));
        assert_eq!(player.surface().unwrap().draw_rect(), Rect::new(288, 216, 64, 48));

        let doubled = PlayerConfig {
            double_surface: true,
            display: DisplayConfig::default(),
        };
        let resources = resources_with(&[(INTRO, data)]);
        let mut player = VideoPlayer::new(resources, doubled, None);
        player.open(INTRO, false).unwrap();
        player.update(&mut screen).unwrap();
        assert_eq!(player.draw_position(), Some((256, 192)));

        player.draw(&mut screen);
        let (dest, clip, scaled, _) = *screen.blits.last().unwrap();
        assert!(scaled);
        assert_eq!(dest, Rect::new(256, 192, 64, 48));
        assert_eq!(clip, Rect::new(0, 0, 640, 480));
    }

    #[test]
    fn explicit_position_is_not_overridden() {
        let resources = resources_with(&[(INTRO, build_cutscene(64, 48, 3, &[]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        let mut screen = RecordingScreen::default();

        player.set_draw_position(5, 7);
        player.open(INTRO, true).unwrap();
        player.update(&mut screen).unwrap();
        assert_eq!(player.surface().unwrap().draw_rect(), Rect::new(5, 7, 64, 48));

        player.set_draw_position(30, 40);
        assert_eq!(player.surface().unwrap().draw_rect().x, 30);
        for _ in 0..4 {
            player.update(&mut screen).unwrap();
        }
        assert_eq!(player.draw_position(), Some((30, 40)));
        assert_eq!(player.surface().unwrap().draw_rect(), Rect::new(30, 40, 64, 48));
    }

    #[test]
    fn palette_is_only_pushed_when_dirty() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 4, &[0, 2]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        let mut screen = RecordingScreen::default();
        player.open(INTRO, false).unwrap();

        for _ in 0..4 {
            player.update(&mut screen).unwrap();
        }
        assert_eq!(screen.palettes.len(), 2);
        let (bytes, start, count) = &screen.palettes[1];
        assert_eq!((*start, *count), (0, 256));
        assert_eq!(&bytes[..4], &[0x12, 0x12, 0x12, 0]);
    }

    #[test]
    fn close_is_idempotent() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 3, &[]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        let mut screen = RecordingScreen::default();
        player.open(INTRO, false).unwrap();
        player.update(&mut screen).unwrap();

        player.close();
        player.close();
        assert!(!player.is_open());
        assert!(player.surface().is_none());
        assert_eq!(player.frame_count(), 0);
        assert_eq!(player.frame_number(), 0);

        player.update(&mut screen).unwrap();
        player.draw(&mut screen);
        assert!(screen.blits.is_empty());
    }

    #[test]
    fn rewind_invalidates_bound_frame() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 3, &[]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        let mut screen = RecordingScreen::default();
        player.open(INTRO, false).unwrap();
        player.update(&mut screen).unwrap();
        player.update(&mut screen).unwrap();
        assert!(player.surface().unwrap().frame().is_some());

        player.rewind().unwrap();
        assert!(player.surface().unwrap().frame().is_none());
        assert_eq!(player.frame_number(), 0);
        player.draw(&mut screen);
        assert!(screen.blits.is_empty());

        player.update(&mut screen).unwrap();
        player.draw(&mut screen);
        assert_eq!(screen.blits.len(), 1);
        assert_eq!(screen.blits[0].3, 0);
    }

    #[test]
    fn failed_open_leaves_player_closed() {
        let resources = resources_with(&[(INTRO, build_cutscene(8, 8, 3, &[]))]);
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        player.open(INTRO, false).unwrap();

        let err = player.open(MISSING, false).unwrap_err();
        assert!(matches!(err, PlaybackError::ResourceNotFound { hash: MISSING }));
        assert!(!player.is_open());
        assert!(player.surface().is_none());
        assert_eq!(player.frame_count(), 0);
    }

    #[test]
    fn corrupt_container_fails_open_and_leaves_player_closed() {
        let mut bad_magic = build_cutscene(2, 2, 1, &[]);
        bad_magic[0..4].copy_from_slice(b"XXXX");
        let mut huge_index = build_cutscene(2, 2, 1, &[]);
        huge_index[14..18].copy_from_slice(&u32::MAX.to_le_bytes());
        let mut too_wide = build_cutscene(2, 2, 1, &[]);
        too_wide[6..8].copy_from_slice(&40000u16.to_le_bytes());

        for data in [bad_magic, huge_index, too_wide] {
            let resources = resources_with(&[(INTRO, data)]);
            let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
            let err = player.open(INTRO, false).unwrap_err();
            assert!(matches!(err, PlaybackError::InvalidContainer(_)), "{err}");
            assert!(!player.is_open());
            assert!(player.surface().is_none());
            assert_eq!(player.frame_count(), 0);
        }
    }

    #[test]
    fn writer_rejects_frames_too_large_to_place() {
        assert!(CutsceneWriter::new(Cursor::new(Vec::new()), 40000, 1, 15, 30).is_err());
        assert!(CutsceneWriter::new(Cursor::new(Vec::new()), MAX_DIMENSION, 1, 15, 30).is_ok());
    }

    /// Serves one cutscene until it is switched off.
    struct RemovableResources {
        data: Vec<u8>,
        available: Rc<Cell<bool>>,
    }

    impl ResourceManager for RemovableResources {
        fn create_stream(&self, file_hash: u32) -> Result<Box<dyn ByteStream>> {
            if file_hash != INTRO || !self.available.get() {
                return Err(PlaybackError::ResourceNotFound { hash: file_hash });
            }
            Ok(Box::new(Cursor::new(self.data.clone())))
        }
    }

    #[test]
    fn failed_loop_rewind_closes_player() {
        let available = Rc::new(Cell::new(true));
        let resources = Rc::new(RemovableResources {
            data: build_cutscene(8, 8, 1, &[0]),
            available: Rc::clone(&available),
        });
        let (mut player, messages) = player_with_listener(resources, PlayerConfig::default());
        let mut screen = RecordingScreen::default();
        player.open(INTRO, true).unwrap();
        player.update(&mut screen).unwrap();
        assert!(player.surface().unwrap().frame().is_some());

        available.set(false);
        let err = player.update(&mut screen).unwrap_err();
        assert!(matches!(err, PlaybackError::ResourceNotFound { hash: INTRO }));
        assert!(!player.is_open());
        assert!(player.surface().is_none());

        player.update(&mut screen).unwrap();
        player.update(&mut screen).unwrap();
        assert!(!player.has_ended());
        assert!(messages.borrow().is_empty());

        // An explicit rewind on the closed player is a no-op.
        available.set(true);
        player.rewind().unwrap();
        assert!(!player.is_open());
    }

    #[test]
    fn listeners_can_tell_players_apart() {
        let data = build_cutscene(8, 8, 1, &[]);
        let resources = resources_with(&[(INTRO, data.clone()), (MISSING, data)]);
        let messages = Messages::default();
        let mut a = VideoPlayer::new(
            Rc::clone(&resources),
            PlayerConfig::default(),
            Some(Box::new(RecordingListener(Rc::clone(&messages)))),
        );
        let mut b = VideoPlayer::new(
            resources,
            PlayerConfig::default(),
            Some(Box::new(RecordingListener(Rc::clone(&messages)))),
        );
        let mut screen = RecordingScreen::default();
        a.open(INTRO, false).unwrap();
        b.open(MISSING, false).unwrap();

        b.update(&mut screen).unwrap();
        b.update(&mut screen).unwrap();
        a.update(&mut screen).unwrap();

        let messages = messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].2, b.id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn directory_resources_resolve_hex_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(resource_file_name(INTRO)), build_cutscene(8, 8, 2, &[])).unwrap();
        assert_eq!(resource_file_name(INTRO), "0A1B2C3D.csf");
        assert_eq!(parse_resource_hash("0A1B2C3D"), Some(INTRO));
        assert_eq!(parse_resource_hash("intro"), None);
        assert_eq!(parse_resource_hash("+1234567"), None);
        assert_eq!(parse_resource_hash("-1234567"), None);
        assert_eq!(parse_resource_hash("0a1b2c3d"), Some(INTRO));

        let resources: Rc<dyn ResourceManager> = Rc::new(DirectoryResources::new(dir.path()));
        let mut player = VideoPlayer::new(resources, PlayerConfig::default(), None);
        player.open(INTRO, false).unwrap();
        assert_eq!(player.frame_count(), 2);

        assert!(matches!(
            player.open(MISSING, false),
            Err(PlaybackError::ResourceNotFound { hash: MISSING })
        ));
    }
}
