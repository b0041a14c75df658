use super::*;
use crate::audio::resolve::resolve_narration;
use crate::document::model::{Presentation, Slide};
use crate::foundation::core::Fps;
use std::sync::Mutex;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "slidecast_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Reports file length in bytes as seconds.
struct LenProbe;

impl DurationProbe for LenProbe {
    fn duration_secs(&self, path: &Path) -> SlidecastResult<f64> {
        let len = std::fs::metadata(path)
            .map_err(|e| SlidecastError::io(path, e))?
            .len();
        Ok(len as f64)
    }
}

/// Writes the narration text as the "audio"; counts calls.
#[derive(Default)]
struct EchoSynth {
    calls: Mutex<u32>,
}

impl SpeechSynthesizer for &'static EchoSynth {
    fn synthesize(&self, text: &str, _language: Language, out: &Path) -> SlidecastResult<()> {
        *self.calls.lock().unwrap() += 1;
        std::fs::write(out, text).map_err(|e| SlidecastError::io(out, e))
    }
}

/// Writes a partial file and then fails.
struct BrokenSynth;

impl SpeechSynthesizer for BrokenSynth {
    fn synthesize(&self, _text: &str, _language: Language, out: &Path) -> SlidecastResult<()> {
        std::fs::write(out, b"partial").unwrap();
        Err(SlidecastError::render("tts service returned 503"))
    }
}

fn req(text: &str) -> NarrationRequest<'_> {
    NarrationRequest {
        slide_index: 0,
        slide_id: 3,
        text,
        language: Language::En,
        fps: Fps::integral(30).unwrap(),
    }
}

fn leak_synth() -> &'static EchoSynth {
    Box::leak(Box::new(EchoSynth::default()))
}

#[test]
fn file_name_is_keyed_by_slide_id_and_language() {
    assert_eq!(narration_file_name(3, Language::En), "3_en.mp3");
    assert_eq!(narration_file_name(12, Language::Hi), "12_hi.mp3");
}

#[test]
fn digest_is_hex_sha256() {
    assert_eq!(
        narration_digest("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn hand_provided_file_is_reused_without_synthesis() {
    let dir = temp_dir("store_reuse");
    std::fs::write(dir.join("3_en.mp3"), [0u8; 5]).unwrap();
    let synth = leak_synth();
    let store = NarrationStore::new(&dir)
        .with_probe(LenProbe)
        .with_synthesizer(synth);

    let meta = store.resolve(&req("hello")).unwrap().unwrap();
    assert_eq!(meta.duration_frames, 150);
    assert!(meta.asset.ends_with("3_en.mp3"));
    assert_eq!(*synth.calls.lock().unwrap(), 0);
}

#[test]
fn missing_file_is_synthesized_once() {
    let dir = temp_dir("store_synth");
    let synth = leak_synth();
    let store = NarrationStore::new(&dir)
        .with_probe(LenProbe)
        .with_synthesizer(synth);

    let meta = store.resolve(&req("four")).unwrap().unwrap();
    assert_eq!(meta.duration_frames, 120);
    assert!(dir.join("3_en.mp3").is_file());
    assert_eq!(
        std::fs::read_to_string(dir.join("3_en.sha256")).unwrap(),
        narration_digest("four")
    );

    store.resolve(&req("four")).unwrap().unwrap();
    assert_eq!(*synth.calls.lock().unwrap(), 1);
}

#[test]
fn changed_text_is_resynthesized() {
    let dir = temp_dir("store_stale");
    let synth = leak_synth();
    let store = NarrationStore::new(&dir)
        .with_probe(LenProbe)
        .with_synthesizer(synth);

    store.resolve(&req("old")).unwrap();
    let meta = store.resolve(&req("brand new")).unwrap().unwrap();
    assert_eq!(meta.duration_frames, 9 * 30);
    assert_eq!(*synth.calls.lock().unwrap(), 2);
}

#[test]
fn no_file_and_no_synthesizer_is_unavailable() {
    let dir = temp_dir("store_unavailable");
    let store = NarrationStore::new(&dir).with_probe(LenProbe);
    assert_eq!(store.resolve(&req("hello")).unwrap(), None);
}

#[test]
fn failed_synthesis_leaves_no_partial_file() {
    let dir = temp_dir("store_broken");
    let store = NarrationStore::new(&dir)
        .with_probe(LenProbe)
        .with_synthesizer(BrokenSynth);

    let err = store.resolve(&req("hello")).unwrap_err();
    assert!(err.to_string().contains("503"));
    let leftovers: Vec<_> = std::fs::read_dir(&dir).unwrap().flatten().collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
}

#[test]
fn command_synthesizer_expands_placeholders() {
    let out = Path::new("/tmp/x/3_hi.mp3.0.part");
    assert_eq!(
        CommandSynthesizer::expand("--voice={language}", Language::Hi, out),
        "--voice=hi"
    );
    assert_eq!(
        CommandSynthesizer::expand("{output}", Language::Hi, out),
        "/tmp/x/3_hi.mp3.0.part"
    );
}

#[cfg(unix)]
#[test]
fn command_synthesizer_feeds_text_on_stdin() {
    let dir = temp_dir("store_command");
    let synth = CommandSynthesizer::new(
        "sh",
        ["-c".to_owned(), "cat > \"$0\"".to_owned(), "{output}".to_owned()],
    );
    let store = NarrationStore::new(&dir)
        .with_probe(LenProbe)
        .with_synthesizer(synth);

    let meta = store.resolve(&req("spoken words")).unwrap().unwrap();
    assert_eq!(std::fs::read_to_string(&meta.asset).unwrap(), "spoken words");
}

fn deck_with_english(narrations: &[(u64, &str)]) -> Presentation {
    Presentation {
        id: None,
        title: None,
        description: None,
        theme: None,
        front_page: None,
        slides: narrations
            .iter()
            .map(|&(id, text)| Slide {
                id,
                layout: None,
                title: None,
                blocks: vec![],
                audio_narration_in_english: Some(text.to_owned()),
                audio_narration_in_hindi: None,
            })
            .collect(),
        created_at: None,
        logo: None,
    }
}

#[test]
fn slides_sharing_an_id_never_share_different_audio() {
    let dir = temp_dir("store_shared_id");
    let synth = leak_synth();
    let store = NarrationStore::new(&dir)
        .with_synthesizer(synth)
        .with_probe(LenProbe);
    let p = deck_with_english(&[(1, "short"), (1, "a much longer narration text")]);
    let fps = Fps::integral(30).unwrap();

    let err = resolve_narration(&p, Language::En, fps, &store).unwrap_err();
    let SlidecastError::Resolution(failures) = &err else {
        panic!("expected resolution error, got {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].slide_index, 1);

    // The first slide's narration is the only one written.
    assert_eq!(*synth.calls.lock().unwrap(), 1);
    assert_eq!(
        std::fs::read_to_string(store.audio_path(1, Language::En)).unwrap(),
        "short"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn slides_sharing_an_id_and_text_share_one_file() {
    let dir = temp_dir("store_shared_text");
    let synth = leak_synth();
    let store = NarrationStore::new(&dir)
        .with_synthesizer(synth)
        .with_probe(LenProbe);
    let p = deck_with_english(&[(1, "same words"), (2, "other"), (1, "same words")]);
    let fps = Fps::integral(1).unwrap();

    let table = resolve_narration(&p, Language::En, fps, &store).unwrap();
    let a = table.get(0).unwrap();
    let b = table.get(2).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.duration_frames, "same words".len() as u64);
    assert_eq!(*synth.calls.lock().unwrap(), 2);
    let _ = std::fs::remove_dir_all(&dir);
}
