use super::*;
use crate::audio::resolve::AudioMetadata;
use crate::document::model::{Block, FrontPage, Slide, TextStyle};
use crate::encode::sink::InMemorySink;
use std::sync::atomic::{AtomicUsize, Ordering};

fn deck(theme: Option<&str>) -> Presentation {
    let slide = |id: u64| Slide {
        id,
        layout: None,
        title: Some(format!("Slide {id}")),
        blocks: vec![Block::Text {
            text: "body".to_owned(),
            style: TextStyle::Normal,
        }],
        audio_narration_in_english: Some("narration".to_owned()),
        audio_narration_in_hindi: None,
    };
    Presentation {
        id: None,
        title: Some("Deck".to_owned()),
        description: None,
        theme: theme.map(str::to_owned),
        front_page: Some(FrontPage {
            title: "Cover".to_owned(),
            author: None,
            date: None,
        }),
        slides: vec![slide(1), slide(2)],
        created_at: None,
        logo: None,
    }
}

fn table() -> AudioTable {
    AudioTable::new(vec![
        Some(AudioMetadata {
            asset: "audio/1_en.mp3".to_owned(),
            duration_frames: 3,
        }),
        None,
    ])
}

/// At 2 fps: front page 2 frames, buffers 1 frame each, fallback 2 frames.
fn policy() -> TimelinePolicy {
    TimelinePolicy {
        front_page_ms: 1_000,
        buffer_before_ms: 500,
        buffer_after_ms: 500,
        fallback_audio_ms: 1_000,
    }
}

fn request() -> RenderRequest {
    RenderRequest::new(Fps::integral(2).unwrap(), Canvas::new(32, 18).unwrap())
}

fn driver() -> SlideDriver {
    SlideDriver::with_fontdb(
        ThemeRegistry::builtin(),
        Arc::new(usvg::fontdb::Database::new()),
    )
    .with_policy(policy())
    .with_audio_decoder(|_| {
        Ok(AudioPcm {
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
            interleaved_f32: vec![0.5; 48_000 * 2],
        })
    })
}

fn props<'a>(p: &'a Presentation, audio: &'a AudioTable) -> InputProps<'a> {
    InputProps {
        presentation: p,
        language: Language::En,
        audio,
    }
}

#[test]
fn media_streams_every_frame_in_order() {
    let p = deck(None);
    let audio = table();
    let mut sink = InMemorySink::new();
    let mut progress = Vec::new();
    let stats = driver()
        .render_media(&request(), &props(&p, &audio), &mut sink, &mut |pr| {
            progress.push(pr)
        })
        .unwrap();

    // 2 + (1 + 3 + 1) + (1 + 2 + 1)
    assert_eq!(stats.frames_total, 11);
    assert_eq!(stats.frames_rasterized, 3);
    assert_eq!(stats.frames_reused, 8);
    assert_eq!(stats.audio_clips, 1);

    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..11).collect::<Vec<_>>());
    assert!(sink.is_ended());

    assert_eq!(progress.len(), 11);
    let last = progress.last().unwrap();
    assert_eq!(last.fraction, 1.0);
    assert_eq!(last.frames_encoded, 11);
    assert_eq!(last.frames_rendered, 11);
    assert!(progress.windows(2).all(|w| w[0].fraction <= w[1].fraction));
}

#[test]
fn frames_use_theme_background() {
    let p = deck(Some("gov-blue"));
    let audio = AudioTable::silent(2);
    let frame = driver()
        .render_still(&request(), &props(&p, &audio), FrameIndex(0))
        .unwrap();
    assert_eq!((frame.width, frame.height), (32, 18));
    assert_eq!(&frame.data[..4], &[0xF0, 0xF9, 0xFF, 0xFF]);

    let p = deck(Some("no-such-theme"));
    let frame = driver()
        .render_still(&request(), &props(&p, &audio), FrameIndex(0))
        .unwrap();
    assert_eq!(&frame.data[..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn narration_is_mixed_and_temp_file_removed() {
    let p = deck(None);
    let audio = table();
    let mut sink = InMemorySink::new();
    driver()
        .render_media(&request(), &props(&p, &audio), &mut sink, &mut |_| {})
        .unwrap();

    let cfg = sink.config().unwrap();
    let audio_cfg = cfg.audio.as_ref().unwrap();
    assert_eq!((audio_cfg.sample_rate, audio_cfg.channels), (48_000, 2));
    assert!(!audio_cfg.path.exists(), "temp mix file left behind");

    let bytes = sink.audio_bytes().unwrap();
    // 11 frames at 2 fps is 5.5 s of stereo f32.
    assert_eq!(bytes.len(), 264_000 * 2 * 4);
    let sample = |i: usize| f32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
    // Narration starts at frame 3 (front page 2 + buffer 1) = sample 72_000.
    assert_eq!(sample(72_000 * 2 - 1), 0.0);
    assert_eq!(sample(72_000 * 2), 0.5);
}

#[test]
fn audio_can_be_disabled() {
    let p = deck(None);
    let audio = table();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let d = driver().with_audio(false).with_audio_decoder(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Err(SlidecastError::encode("should not decode"))
    });
    let mut sink = InMemorySink::new();
    let stats = d
        .render_media(&request(), &props(&p, &audio), &mut sink, &mut |_| {})
        .unwrap();
    assert!(sink.config().unwrap().audio.is_none());
    assert_eq!(stats.frames_total, 11);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn silent_table_produces_no_audio_track() {
    let p = deck(None);
    let audio = AudioTable::silent(2);
    let mut sink = InMemorySink::new();
    let stats = driver()
        .render_media(&request(), &props(&p, &audio), &mut sink, &mut |_| {})
        .unwrap();
    assert!(sink.config().unwrap().audio.is_none());
    // 2 + 4 + 4
    assert_eq!(stats.frames_total, 10);
}

#[test]
fn declared_duration_must_match() {
    let p = deck(None);
    let audio = table();
    let d = driver();

    let mut ok = request();
    ok.duration_frames = Some(11);
    assert_eq!(d.timeline(&ok, &props(&p, &audio)).unwrap().total_frames, 11);

    let mut bad = request();
    bad.duration_frames = Some(12);
    let err = d
        .render_media(&bad, &props(&p, &audio), &mut InMemorySink::new(), &mut |_| {})
        .unwrap_err();
    assert!(err.to_string().contains("declared duration of 12 frames"));
}

#[test]
fn unknown_composition_is_rejected() {
    let p = deck(None);
    let audio = table();
    let mut req = request();
    req.composition_id = "Other".to_owned();
    let err = driver()
        .render_still(&req, &props(&p, &audio), FrameIndex(0))
        .unwrap_err();
    assert!(err.to_string().contains("unknown composition 'Other'"));
}

#[test]
fn still_matches_streamed_frame() {
    let p = deck(None);
    let audio = table();
    let d = driver();
    let mut sink = InMemorySink::new();
    d.render_media(&request(), &props(&p, &audio), &mut sink, &mut |_| {})
        .unwrap();

    for f in [0u64, 2, 7, 10] {
        let still = d
            .render_still(&request(), &props(&p, &audio), FrameIndex(f))
            .unwrap();
        assert_eq!(still, sink.frames()[f as usize].1, "frame {f}");
    }
    assert!(
        d.render_still(&request(), &props(&p, &audio), FrameIndex(11))
            .is_err()
    );
}

#[test]
fn decode_failure_aborts_before_sink_begins() {
    let p = deck(None);
    let audio = table();
    let d = driver().with_audio_decoder(|asset| {
        Err(SlidecastError::encode(format!("cannot decode {asset}")))
    });
    let mut sink = InMemorySink::new();
    let err = d
        .render_media(&request(), &props(&p, &audio), &mut sink, &mut |_| {})
        .unwrap_err();
    assert!(err.to_string().contains("audio/1_en.mp3"));
    assert!(sink.config().is_none());
}
