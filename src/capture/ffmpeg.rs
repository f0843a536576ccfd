use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::capture::source::VideoSource;
use crate::foundation::core::Resolution;
use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Stream facts reported by `ffprobe`.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    /// File the source decodes.
    pub source_path: PathBuf,
    /// Native frame size.
    pub native: Resolution,
    /// Container duration in seconds (0 when unknown).
    pub duration_sec: f64,
}

/// Probe a video file with the system `ffprobe` binary.
pub fn probe_video(source_path: &Path) -> PhasewarpResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| PhasewarpError::capture(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(PhasewarpError::capture(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| PhasewarpError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PhasewarpError::capture("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| PhasewarpError::capture("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| PhasewarpError::capture("missing video height from ffprobe"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        native: Resolution::new(width, height)?,
        duration_sec,
    })
}

struct DecodeStream {
    child: Child,
    stdout: ChildStdout,
    res: Resolution,
}

impl DecodeStream {
    fn spawn(path: &Path, res: Resolution, fps: u32, start_sec: f64) -> PhasewarpResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{start_sec:.6}")])
            .arg("-i")
            .arg(path)
            .args([
                "-an",
                "-vf",
                &format!("fps={fps},scale={}:{}:flags=neighbor", res.width, res.height),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                PhasewarpError::capture(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PhasewarpError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        Ok(Self { child, stdout, res })
    }

    fn read_frame(&mut self) -> PhasewarpResult<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.res.rgba_len()];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(PhasewarpError::capture(format!(
                "failed to read decoded frame from ffmpeg: {e}"
            ))),
        }
    }
}

impl Drop for DecodeStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// File-backed source that streams frames from the system `ffmpeg` binary.
///
/// Playback is stepped: every sample while playing reads the next frame of a stream resampled to
/// `sample_fps`, so consecutive captures are `1/sample_fps` seconds apart in source time.
pub struct FfmpegVideoSource {
    info: VideoSourceInfo,
    sample_fps: u32,
    playing: bool,
    frames_read: u64,
    stream: Option<DecodeStream>,
    current: Option<Vec<u8>>,
}

impl FfmpegVideoSource {
    /// Probe `path` and prepare a paused source positioned at the first frame.
    pub fn open(path: &Path, sample_fps: u32) -> PhasewarpResult<Self> {
        if sample_fps == 0 {
            return Err(PhasewarpError::validation("sample_fps must be > 0"));
        }
        let info = probe_video(path)?;
        tracing::info!(
            path = %path.display(),
            native = %info.native,
            duration_sec = info.duration_sec,
            "opened ffmpeg video source"
        );
        Ok(Self {
            info,
            sample_fps,
            playing: false,
            frames_read: 0,
            stream: None,
            current: None,
        })
    }

    /// Probe results for the opened file.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn next_frame(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        if self.stream.as_ref().is_none_or(|s| s.res != res) {
            let start = self.frames_read as f64 / f64::from(self.sample_fps);
            self.stream = Some(DecodeStream::spawn(
                &self.info.source_path,
                res,
                self.sample_fps,
                start,
            )?);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let frame = stream.read_frame()?;
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }
}

impl VideoSource for FfmpegVideoSource {
    fn native_size(&self) -> Option<Resolution> {
        Some(self.info.native)
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek_to_start(&mut self) {
        self.stream = None;
        self.current = None;
        self.frames_read = 0;
    }

    fn sample_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        if !self.playing
            && let Some(cur) = self.current.as_ref()
            && cur.len() == res.rgba_len()
        {
            return Ok(Some(cur.clone()));
        }
        let frame = self.next_frame(res)?;
        if let Some(f) = frame.as_ref() {
            self.current = Some(f.clone());
        }
        Ok(frame)
    }

    fn peek_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        Ok(self
            .current
            .as_ref()
            .filter(|cur| cur.len() == res.rgba_len())
            .cloned())
    }
}
