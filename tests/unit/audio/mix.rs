use super::*;
use crate::timeline::{AudioSpan, Segment, SegmentOwner};

fn fps30() -> Fps {
    Fps::integral(30).unwrap()
}

/// Front page of 2 frames, then one slide of 6 frames with narration at offset 1.
fn timeline(narration_frames: u64) -> Timeline {
    Timeline {
        fps: fps30(),
        segments: vec![
            Segment {
                owner: SegmentOwner::FrontPage,
                range: FrameRange::with_len(0, 2),
                audio: None,
            },
            Segment {
                owner: SegmentOwner::Slide(0),
                range: FrameRange::with_len(2, 6),
                audio: Some(AudioSpan {
                    offset: 1,
                    duration: narration_frames,
                    asset: "1_en.mp3".to_owned(),
                }),
            },
        ],
        total_frames: 8,
    }
}

fn constant_pcm(frames: usize, value: f32) -> AudioPcm {
    AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels: 2,
        interleaved_f32: vec![value; frames * 2],
    }
}

#[test]
fn frame_to_sample_rounds_for_ntsc_rates() {
    assert_eq!(frame_to_sample(1, fps30(), 48_000), 1600);
    let ntsc = Fps::new(30000, 1001).unwrap();
    assert_eq!(frame_to_sample(1, ntsc, 48_000), 1602);
    assert_eq!(frame_to_sample(30, ntsc, 48_000), 48_048);
}

#[test]
fn narration_lands_at_its_audio_range() {
    let t = timeline(4);
    let m = build_audio_manifest(&t, t.range(), |_| Ok(constant_pcm(1600 * 4, 0.25))).unwrap();
    assert_eq!(m.total_samples, 8 * 1600);
    assert_eq!(m.clips.len(), 1);
    assert_eq!(m.clips[0].timeline_start_sample, 3 * 1600);
    assert_eq!(m.clips[0].timeline_end_sample, 7 * 1600);

    let mixed = mix_manifest(&m);
    assert_eq!(mixed.len(), 8 * 1600 * 2);
    assert_eq!(mixed[3 * 1600 * 2 - 1], 0.0);
    assert_eq!(mixed[3 * 1600 * 2], 0.25);
    assert_eq!(mixed[7 * 1600 * 2 - 1], 0.25);
    assert_eq!(mixed[7 * 1600 * 2], 0.0);
}

#[test]
fn narration_longer_than_its_span_is_cut() {
    let t = timeline(2);
    let m = build_audio_manifest(&t, t.range(), |_| Ok(constant_pcm(48_000, 0.5))).unwrap();
    let mixed = mix_manifest(&m);
    assert_eq!(mixed[5 * 1600 * 2 - 1], 0.5);
    assert!(mixed[5 * 1600 * 2..].iter().all(|&s| s == 0.0));
}

#[test]
fn subrange_starts_mid_narration() {
    let t = timeline(4);
    let m = build_audio_manifest(&t, FrameRange::with_len(4, 2), |_| {
        let mut pcm = constant_pcm(1600 * 4, 0.0);
        // Second narration frame is marked.
        for s in &mut pcm.interleaved_f32[1600 * 2..1600 * 4] {
            *s = 0.75;
        }
        Ok(pcm)
    })
    .unwrap();
    assert_eq!(m.clips[0].timeline_start_sample, 0);
    assert_eq!(m.clips[0].source_start_frame, 1600);
    let mixed = mix_manifest(&m);
    assert_eq!(mixed[0], 0.75);
    assert_eq!(mixed[1600 * 2], 0.0);
}

#[test]
fn mono_is_duplicated_and_sum_is_clamped() {
    let t = timeline(4);
    let m = build_audio_manifest(&t, t.range(), |_| {
        Ok(AudioPcm {
            sample_rate: MIX_SAMPLE_RATE,
            channels: 1,
            interleaved_f32: vec![3.0; 1600 * 4],
        })
    })
    .unwrap();
    let mixed = mix_manifest(&m);
    let i = 3 * 1600 * 2;
    assert_eq!((mixed[i], mixed[i + 1]), (1.0, 1.0));
}

#[test]
fn silent_timeline_has_no_clips() {
    let mut t = timeline(4);
    t.segments[1].audio = None;
    let m = build_audio_manifest(&t, t.range(), |_| panic!("nothing to decode")).unwrap();
    assert!(m.is_silent());
    assert!(mix_manifest(&m).iter().all(|&s| s == 0.0));
}

#[test]
fn rejects_unexpected_sample_rate() {
    let t = timeline(4);
    let err = build_audio_manifest(&t, t.range(), |_| {
        Ok(AudioPcm {
            sample_rate: 44_100,
            channels: 2,
            interleaved_f32: vec![],
        })
    })
    .unwrap_err();
    assert!(err.to_string().contains("44100 Hz"));
}

#[test]
fn f32le_file_holds_little_endian_samples() {
    let path = std::env::temp_dir().join(format!(
        "slidecast_mix_{}_{}.f32le",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    write_mix_to_f32le_file(&[0.5, -1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes(bytes[0..4].try_into().unwrap()), 0.5);
    assert_eq!(f32::from_le_bytes(bytes[4..8].try_into().unwrap()), -1.0);
}
