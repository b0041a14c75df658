use crate::audio::media::is_tool_on_path;
use crate::config::{Codec, VideoConfig};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::raster::FrameRGBA;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output video file path. The container follows its extension.
    pub out_path: PathBuf,
    /// Replace an existing output file instead of failing.
    pub overwrite: bool,
    /// Straight-alpha RGBA8 color behind translucent pixels.
    pub bg_rgba: [u8; 4],
    pub codec: Codec,
    pub video_bitrate: String,
    pub audio_bitrate: String,
}

impl FfmpegSinkOpts {
    /// Options for writing `out_path` with the default codec and bitrates.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self::from_config(out_path, &VideoConfig::default())
    }

    pub fn from_config(out_path: impl Into<PathBuf>, config: &VideoConfig) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            codec: config.codec,
            video_bitrate: config.video_bitrate.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }
}

/// Encodes frames with the system `ffmpeg`, fed raw RGBA over stdin.
///
/// When [`SinkConfig::audio`] is set, the PCM file is muxed in as the second input.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    #[tracing::instrument(skip(self, cfg), fields(out = %self.opts.out_path.display()))]
    fn begin(&mut self, cfg: SinkConfig) -> SlidecastResult<()> {
        let args = ffmpeg_args(&self.opts, &cfg)?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(SlidecastError::validation(format!(
                "refusing to replace existing output '{}'",
                self.opts.out_path.display()
            )));
        }

        if !is_tool_on_path("ffmpeg") {
            return Err(SlidecastError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        tracing::debug!(?args, "spawning ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SlidecastError::encode(format!(
                    "could not start ffmpeg: {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlidecastError::encode("ffmpeg stdin was not piped"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SlidecastError::encode("ffmpeg stderr was not piped"))?;
        // Drained on a thread so a chatty ffmpeg never blocks on a full pipe.
        let stderr_drain = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        });

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| SlidecastError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(SlidecastError::encode(format!(
                "frame {} pushed after frame {}",
                idx.0, last.0
            )));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(SlidecastError::validation(format!(
                "frame is {}x{} but the video is {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        if frame.premultiplied {
            composite_over_background(
                &mut self.scratch,
                &frame.data,
                self.opts.bg_rgba,
            )?;
        } else {
            if frame.data.len() != self.scratch.len() {
                return Err(SlidecastError::validation(
                    "frame buffer length does not match its size",
                ));
            }
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SlidecastError::encode("ffmpeg sink already ended"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            SlidecastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| SlidecastError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            SlidecastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let log = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SlidecastError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| SlidecastError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&log);
            return Err(SlidecastError::encode(format!(
                "ffmpeg failed ({status}): {}",
                stderr.trim()
            )));
        }

        self.cfg = None;
        tracing::info!(out = %self.opts.out_path.display(), "encoding finished");
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // A render that failed mid-stream leaves ffmpeg waiting on stdin.
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Full `ffmpeg` argument list for one encode.
fn ffmpeg_args(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> SlidecastResult<Vec<OsString>> {
    if cfg.fps.num == 0 || cfg.fps.den == 0 {
        return Err(SlidecastError::validation("fps must be non-zero"));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(SlidecastError::validation(
            "cannot encode a zero-sized video",
        ));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(SlidecastError::validation(
            "ffmpeg sink width/height must be even (required for yuv420p output)",
        ));
    }

    let mut args = Vec::<OsString>::new();
    push_args(&mut args, &[if opts.overwrite { "-y" } else { "-n" }]);

    // Raw RGBA8 on stdin; alpha is flattened in push_frame.
    let size = format!("{}x{}", cfg.width, cfg.height);
    let rate = format!("{}/{}", cfg.fps.num, cfg.fps.den);
    push_args(
        &mut args,
        &[
            "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba", "-s", &size, "-r", &rate,
            "-i", "pipe:0",
        ],
    );

    if let Some(audio) = cfg.audio.as_ref() {
        if audio.sample_rate == 0 {
            return Err(SlidecastError::validation(
                "audio input has a zero sample rate",
            ));
        }
        if audio.channels == 0 {
            return Err(SlidecastError::validation(
                "audio input has no channels",
            ));
        }
        let sample_rate = audio.sample_rate.to_string();
        let channels = audio.channels.to_string();
        push_args(
            &mut args,
            &["-f", "f32le", "-ar", &sample_rate, "-ac", &channels, "-i"],
        );
        args.push(audio.path.clone().into_os_string());
        push_args(
            &mut args,
            &[
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:a",
                opts.codec.audio_encoder(),
                "-b:a",
                &opts.audio_bitrate,
            ],
        );
    } else {
        push_args(&mut args, &["-an"]);
    }

    let frames = cfg.total_frames.to_string();
    push_args(
        &mut args,
        &[
            "-c:v",
            opts.codec.video_encoder(),
            "-b:v",
            &opts.video_bitrate,
            "-pix_fmt",
            "yuv420p",
            "-frames:v",
            &frames,
        ],
    );
    if opts.codec.is_mp4_family() {
        push_args(&mut args, &["-movflags", "+faststart"]);
    }
    args.push(opts.out_path.clone().into_os_string());
    Ok(args)
}

fn push_args(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

fn composite_over_background(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> SlidecastResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(SlidecastError::validation(
            "composite expects two RGBA8 buffers of equal length",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    let t = u32::from(x) * u32::from(y) + 128;
    ((t + (t >> 8)) >> 8) as u16
}

/// Create the directory `path` will be written into.
pub fn ensure_parent_dir(path: &Path) -> SlidecastResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| SlidecastError::io(parent, e))?;
    }
    Ok(())
}
