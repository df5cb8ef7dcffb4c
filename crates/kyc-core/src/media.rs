//! Camera and microphone capture rules
//!
//! The platform capture API sits behind [`MediaDevice`]; this module owns the
//! stream lifetime, the recording length limits and the checks a recorded clip
//! must pass before it is handed to the upload path.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{KycError, KycResult};

/// Recorder formats in order of preference.
pub const PREFERRED_VIDEO_MIME_TYPES: [&str; 4] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
    "video/mp4",
];

pub const FALLBACK_VIDEO_MIME_TYPE: &str = "video/webm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
}

impl CaptureConstraints {
    /// Still capture for the photo and selfie steps.
    pub const CAMERA: CaptureConstraints = CaptureConstraints {
        video: true,
        audio: false,
    };

    /// Video verification needs both camera and microphone.
    pub const CAMERA_AND_MICROPHONE: CaptureConstraints = CaptureConstraints {
        video: true,
        audio: true,
    };
}

/// A live stream handed out by a [`MediaDevice`].
pub trait MediaStream: Send {
    fn has_video_track(&self) -> bool;
    fn has_audio_track(&self) -> bool;
    /// Stop every track of the stream.
    fn stop_tracks(&mut self);
}

pub trait MediaDevice {
    type Stream: MediaStream;

    fn acquire(&mut self, constraints: CaptureConstraints) -> KycResult<Self::Stream>;
}

/// Exclusive owner of a capture stream.
///
/// The stream is stopped exactly once: on [`CaptureSession::release`], when
/// opening fails a track check, or when the session is dropped.
pub struct CaptureSession<S: MediaStream> {
    stream: Option<S>,
}

impl<S: MediaStream> CaptureSession<S> {
    pub fn open<D>(device: &mut D, constraints: CaptureConstraints) -> KycResult<Self>
    where
        D: MediaDevice<Stream = S>,
    {
        let stream = device.acquire(constraints).map_err(|e| match e {
            KycError::Media(_) => e,
            other => KycError::Media(other.to_string()),
        })?;
        // Wrap first so a failed track check still releases the stream.
        let session = CaptureSession {
            stream: Some(stream),
        };

        if constraints.video && !session.has_video_track() {
            return Err(KycError::Media(
                "No video track available. Please ensure your camera is working.".to_string(),
            ));
        }
        if constraints.audio && !session.has_audio_track() {
            return Err(KycError::Media(
                "No audio track available. Please ensure your microphone is enabled and working."
                    .to_string(),
            ));
        }

        tracing::debug!(
            video = constraints.video,
            audio = constraints.audio,
            "Capture session opened"
        );
        Ok(session)
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn has_video_track(&self) -> bool {
        self.stream.as_ref().is_some_and(MediaStream::has_video_track)
    }

    pub fn has_audio_track(&self) -> bool {
        self.stream.as_ref().is_some_and(MediaStream::has_audio_track)
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Stop the stream. Further calls do nothing.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            tracing::debug!("Capture session released");
        }
    }
}

impl<S: MediaStream> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingLimits {
    pub min: Duration,
    pub max: Duration,
}

impl Default for RecordingLimits {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(10),
        }
    }
}

impl RecordingLimits {
    /// Reject a manual stop before the minimum length.
    pub fn check_stop(&self, elapsed: Duration) -> KycResult<()> {
        if elapsed < self.min {
            return Err(KycError::RecordingTooShort {
                elapsed_secs: elapsed.as_secs(),
                min_secs: self.min.as_secs(),
            });
        }
        Ok(())
    }

    pub fn should_auto_stop(&self, elapsed: Duration) -> bool {
        elapsed >= self.max
    }
}

/// What is known about a finished recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub duration: Duration,
    pub has_video_track: bool,
    pub has_audio_track: bool,
}

pub fn validate_clip(clip: &ClipInfo, limits: &RecordingLimits) -> KycResult<()> {
    if clip.duration < limits.min {
        return Err(KycError::InvalidRecording(format!(
            "Video is too short. Minimum duration is {} seconds.",
            limits.min.as_secs()
        )));
    }
    // Recorder timers overshoot by up to a tick; allow one extra second.
    if clip.duration > limits.max + Duration::from_secs(1) {
        return Err(KycError::InvalidRecording(format!(
            "Video is too long. Maximum duration is {} seconds.",
            limits.max.as_secs()
        )));
    }
    if !clip.has_video_track {
        return Err(KycError::InvalidRecording(
            "No video track detected. Please ensure your camera is working.".to_string(),
        ));
    }
    if !clip.has_audio_track {
        return Err(KycError::InvalidRecording(
            "No audio track detected. Please ensure your microphone is enabled and working."
                .to_string(),
        ));
    }
    Ok(())
}

/// First candidate the recorder supports, or the webm fallback.
pub fn select_mime_type<'a, F>(candidates: &[&'a str], is_supported: F) -> &'a str
where
    F: Fn(&str) -> bool,
{
    candidates
        .iter()
        .copied()
        .find(|mime| is_supported(mime))
        .unwrap_or(FALLBACK_VIDEO_MIME_TYPE)
}
