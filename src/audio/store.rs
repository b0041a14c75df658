use crate::audio::media::{DurationProbe, FfprobeDuration};
use crate::audio::resolve::{AudioMetadata, AudioResolver, NarrationRequest};
use crate::document::model::Language;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use sha2::Digest as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Turns narration text into an audio file.
pub trait SpeechSynthesizer: Send + Sync {
    /// Write synthesized speech for `text` to `out`.
    fn synthesize(&self, text: &str, language: Language, out: &Path) -> SlidecastResult<()>;
}

/// Runs an external text-to-speech command.
///
/// The narration text is written to the command's stdin. In `args`, `{language}` expands to the
/// language code and `{output}` to the file the command must write.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
        }
    }

    fn expand(arg: &str, language: Language, out: &Path) -> String {
        arg.replace("{language}", language.code())
            .replace("{output}", &out.to_string_lossy())
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn synthesize(&self, text: &str, language: Language, out: &Path) -> SlidecastResult<()> {
        let mut child = Command::new(&self.program)
            .args(self.args.iter().map(|a| Self::expand(a, language, out)))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SlidecastError::render(format!(
                    "failed to spawn speech synthesizer '{}': {e}",
                    self.program
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(|e| {
                SlidecastError::render(format!("failed to write narration to synthesizer: {e}"))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            SlidecastError::render(format!("failed to wait for speech synthesizer: {e}"))
        })?;
        if !output.status.success() {
            return Err(SlidecastError::render(format!(
                "speech synthesizer exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// `{slideId}_{language}.mp3`
pub fn narration_file_name(slide_id: u64, language: Language) -> String {
    format!("{slide_id}_{}.mp3", language.code())
}

/// SHA-256 of the narration text, lowercase hex.
pub fn narration_digest(text: &str) -> String {
    let digest = sha2::Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Narration files on disk at a deterministic path per slide id and language.
///
/// Existing files are reused, so re-rendering never re-synthesizes unchanged narration. A
/// `{slideId}_{language}.sha256` sidecar records which text a synthesized file was made from;
/// when it no longer matches, the file is synthesized again. Files without a sidecar were
/// provided by hand and are always reused.
pub struct NarrationStore {
    dir: PathBuf,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    probe: Box<dyn DurationProbe>,
}

impl NarrationStore {
    /// Store rooted at `dir`, probing durations with `ffprobe` and never synthesizing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            synthesizer: None,
            probe: Box::new(FfprobeDuration),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: impl SpeechSynthesizer + 'static) -> Self {
        self.synthesizer = Some(Box::new(synthesizer));
        self
    }

    pub fn with_probe(mut self, probe: impl DurationProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn audio_path(&self, slide_id: u64, language: Language) -> PathBuf {
        self.dir.join(narration_file_name(slide_id, language))
    }

    fn digest_path(&self, slide_id: u64, language: Language) -> PathBuf {
        self.dir
            .join(format!("{slide_id}_{}.sha256", language.code()))
    }

    fn synthesize_into_place(
        &self,
        synthesizer: &dyn SpeechSynthesizer,
        req: &NarrationRequest<'_>,
        path: &Path,
    ) -> SlidecastResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| SlidecastError::io(&self.dir, e))?;

        let part = self.dir.join(format!(
            "{}.{}.part",
            narration_file_name(req.slide_id, req.language),
            req.slide_index
        ));
        let mut guard = PartFileGuard(Some(part.clone()));

        synthesizer.synthesize(req.text, req.language, &part)?;
        let len = std::fs::metadata(&part)
            .map_err(|e| SlidecastError::io(&part, e))?
            .len();
        if len == 0 {
            return Err(SlidecastError::render(format!(
                "speech synthesizer produced an empty file for slide id {}",
                req.slide_id
            )));
        }

        std::fs::rename(&part, path).map_err(|e| SlidecastError::io(path, e))?;
        guard.0 = None;

        let digest_path = self.digest_path(req.slide_id, req.language);
        std::fs::write(&digest_path, narration_digest(req.text))
            .map_err(|e| SlidecastError::io(&digest_path, e))?;
        tracing::info!(path = %path.display(), "narration synthesized");
        Ok(())
    }
}

impl std::fmt::Debug for NarrationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationStore")
            .field("dir", &self.dir)
            .field("synthesizer", &self.synthesizer.is_some())
            .finish()
    }
}

impl AudioResolver for NarrationStore {
    fn resolve(&self, req: &NarrationRequest<'_>) -> SlidecastResult<Option<AudioMetadata>> {
        let path = self.audio_path(req.slide_id, req.language);
        let digest = narration_digest(req.text);
        let stored = std::fs::read_to_string(self.digest_path(req.slide_id, req.language)).ok();
        let exists = path.is_file();
        let fresh = exists && stored.as_deref().is_none_or(|d| d.trim() == digest);

        if !fresh {
            match self.synthesizer.as_deref() {
                Some(synthesizer) => self.synthesize_into_place(synthesizer, req, &path)?,
                None if exists => {
                    tracing::warn!(
                        path = %path.display(),
                        "narration text changed but no synthesizer is configured; reusing stale audio"
                    );
                }
                None => {
                    tracing::warn!(
                        path = %path.display(),
                        slide_id = req.slide_id,
                        "no narration audio found and no synthesizer configured"
                    );
                    return Ok(None);
                }
            }
        } else {
            tracing::debug!(path = %path.display(), "reusing narration audio");
        }

        let secs = self.probe.duration_secs(&path)?;
        Ok(Some(AudioMetadata {
            asset: path.to_string_lossy().into_owned(),
            duration_frames: req.fps.secs_to_frames_ceil(secs),
        }))
    }
}

/// Removes a half-written file unless disarmed.
struct PartFileGuard(Option<PathBuf>);

impl Drop for PartFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/store.rs"]
mod tests;
