//! Background, music and ambient sound intents
//!
//! These records describe what the user *wants* playing, not what is
//! playing. Rendering happens elsewhere; [`MediaReconciler`] is the contract
//! such a renderer follows: one long-lived handle per id, volume applied on
//! every pass, start/stop by flag, refused starts swallowed and not retried.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Background
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Image,
    Video,
    Gradient,
}

impl BackgroundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Gradient => "gradient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSettings {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    pub url: String,
    /// Dimming overlay, 0.0 (none) to 1.0 (black)
    pub opacity: f32,
}

pub struct BackgroundPreset {
    pub name: &'static str,
    pub url: &'static str,
    pub kind: BackgroundKind,
}

pub const BACKGROUND_PRESETS: &[BackgroundPreset] = &[
    BackgroundPreset {
        name: "Cozy Room",
        url: "https://images.unsplash.com/photo-1519710164239-da123dc03ef4?w=1920",
        kind: BackgroundKind::Image,
    },
    BackgroundPreset {
        name: "Mountain Lake",
        url: "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=1920",
        kind: BackgroundKind::Image,
    },
    BackgroundPreset {
        name: "Night City",
        url: "https://images.unsplash.com/photo-1519608487953-e999c86e7455?w=1920",
        kind: BackgroundKind::Image,
    },
    BackgroundPreset {
        name: "Forest",
        url: "https://images.unsplash.com/photo-1448375240586-882707db888b?w=1920",
        kind: BackgroundKind::Image,
    },
    BackgroundPreset {
        name: "Ocean Sunset",
        url: "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=1920",
        kind: BackgroundKind::Image,
    },
    BackgroundPreset {
        name: "Rainy Window",
        url: "https://images.unsplash.com/photo-1515694346937-94d85e41e6f0?w=1920",
        kind: BackgroundKind::Image,
    },
];

impl Default for BackgroundSettings {
    fn default() -> Self {
        let first = &BACKGROUND_PRESETS[0];
        Self {
            kind: first.kind,
            url: first.url.to_string(),
            opacity: 0.5,
        }
    }
}

impl BackgroundSettings {
    /// Switch to a preset, keeping the dimming level
    pub fn with_preset(&self, index: usize) -> Option<Self> {
        let preset = BACKGROUND_PRESETS.get(index)?;
        Some(Self {
            kind: preset.kind,
            url: preset.url.to_string(),
            opacity: self.opacity,
        })
    }

    /// Switch to a user URL; `.mp4`/`.webm` are treated as video
    pub fn with_custom_url(&self, url: &str) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        let kind = if url.contains(".mp4") || url.contains(".webm") {
            BackgroundKind::Video
        } else {
            BackgroundKind::Image
        };
        Some(Self {
            kind,
            url: url.to_string(),
            opacity: self.opacity,
        })
    }

    pub fn with_opacity(&self, opacity: f32) -> Self {
        Self {
            opacity: clamp_unit(opacity),
            ..self.clone()
        }
    }

    /// Name of the matching preset, if any
    pub fn preset_name(&self) -> Option<&'static str> {
        BACKGROUND_PRESETS
            .iter()
            .find(|p| p.url == self.url)
            .map(|p| p.name)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Music
// ---------------------------------------------------------------------------

/// A predefined lofi stream
pub struct Station {
    pub id: &'static str,
    pub name: &'static str,
    pub video_id: &'static str,
}

pub const STATIONS: &[Station] = &[
    Station {
        id: "lofi-girl",
        name: "Lofi Girl - beats to relax/study to",
        video_id: "jfKfPfyJRdk",
    },
    Station {
        id: "lofi-sleep",
        name: "Lofi Girl - beats to sleep/chill to",
        video_id: "rUxyKA_-grg",
    },
    Station {
        id: "synthwave",
        name: "Synthwave radio - beats to chill/game to",
        video_id: "4xDzrJKXOOY",
    },
    Station {
        id: "chillhop",
        name: "Chillhop Radio - jazzy & lofi hip hop beats",
        video_id: "5yx6BWlEVcY",
    },
];

const CUSTOM_PREFIX: &str = "custom:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MusicSettings {
    /// A [`STATIONS`] id or `custom:<video id>`
    pub current_station: String,
    pub volume: f32,
    pub is_playing: bool,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            current_station: STATIONS[0].id.to_string(),
            volume: 0.5,
            is_playing: false,
        }
    }
}

impl MusicSettings {
    /// Pick a built-in station and start it
    pub fn select_station(&self, id: &str) -> Option<Self> {
        let station = STATIONS.iter().find(|s| s.id == id)?;
        Some(Self {
            current_station: station.id.to_string(),
            is_playing: true,
            ..self.clone()
        })
    }

    /// Play an arbitrary YouTube video or stream
    pub fn select_custom(&self, url: &str) -> Option<Self> {
        let video_id = extract_youtube_id(url)?;
        Some(Self {
            current_station: format!("{}{}", CUSTOM_PREFIX, video_id),
            is_playing: true,
            ..self.clone()
        })
    }

    pub fn toggle_playing(&self) -> Self {
        Self {
            is_playing: !self.is_playing,
            ..self.clone()
        }
    }

    pub fn with_volume(&self, volume: f32) -> Self {
        Self {
            volume: clamp_unit(volume),
            ..self.clone()
        }
    }

    pub fn is_custom(&self) -> bool {
        self.current_station.starts_with(CUSTOM_PREFIX)
    }

    /// Built-in station, falling back to the first one for unknown ids
    pub fn station(&self) -> &'static Station {
        STATIONS
            .iter()
            .find(|s| s.id == self.current_station)
            .unwrap_or(&STATIONS[0])
    }

    pub fn display_name(&self) -> String {
        if self.is_custom() {
            format!("Custom ({})", self.video_id())
        } else {
            self.station().name.to_string()
        }
    }

    pub fn video_id(&self) -> String {
        match self.current_station.strip_prefix(CUSTOM_PREFIX) {
            Some(id) => id.to_string(),
            None => self.station().video_id.to_string(),
        }
    }

    pub fn intent(&self) -> MediaIntent {
        MediaIntent {
            id: "music".to_string(),
            source: format!("https://www.youtube.com/embed/{}", self.video_id()),
            volume: self.volume,
            active: self.is_playing,
        }
    }
}

fn youtube_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\s?]+)")
                .expect("valid youtube url pattern"),
            Regex::new(r"^([a-zA-Z0-9_-]{11})$").expect("valid video id pattern"),
        ]
    })
}

/// Video id from a YouTube URL, or a bare 11-character id
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let url = url.trim();
    youtube_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Ambient sounds
// ---------------------------------------------------------------------------

struct AmbientSource {
    id: &'static str,
    name: &'static str,
    url: &'static str,
}

const AMBIENT_CATALOG: &[AmbientSource] = &[
    AmbientSource { id: "rain", name: "Rain", url: "https://cdn.freesound.org/previews/531/531947_6142149-lq.mp3" },
    AmbientSource { id: "thunder", name: "Thunder", url: "https://cdn.freesound.org/previews/362/362023_5121236-lq.mp3" },
    AmbientSource { id: "fire", name: "Fireplace", url: "https://cdn.freesound.org/previews/277/277021_5145952-lq.mp3" },
    AmbientSource { id: "forest", name: "Forest", url: "https://cdn.freesound.org/previews/527/527853_6142149-lq.mp3" },
    AmbientSource { id: "wind", name: "Wind", url: "https://cdn.freesound.org/previews/244/244395_2024854-lq.mp3" },
    AmbientSource { id: "cafe", name: "Cafe", url: "https://cdn.freesound.org/previews/411/411456_5121236-lq.mp3" },
    AmbientSource { id: "waves", name: "Waves", url: "https://cdn.freesound.org/previews/527/527415_6142149-lq.mp3" },
    AmbientSource { id: "birds", name: "Birds", url: "https://cdn.freesound.org/previews/531/531953_6142149-lq.mp3" },
];

/// Audio file looped for an ambient sound id
pub fn ambient_source_url(id: &str) -> Option<&'static str> {
    AMBIENT_CATALOG.iter().find(|s| s.id == id).map(|s| s.url)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmbientSound {
    pub id: String,
    pub name: String,
    pub volume: f32,
    pub is_active: bool,
}

impl Default for AmbientSound {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            volume: 0.5,
            is_active: false,
        }
    }
}

/// Ambient layers, unique by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmbientSounds(Vec<AmbientSound>);

impl Default for AmbientSounds {
    fn default() -> Self {
        Self(
            AMBIENT_CATALOG
                .iter()
                .map(|s| AmbientSound {
                    id: s.id.to_string(),
                    name: s.name.to_string(),
                    volume: 0.5,
                    is_active: false,
                })
                .collect(),
        )
    }
}

impl AmbientSounds {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AmbientSound> {
        self.0.iter()
    }

    pub fn get(&self, id: &str) -> Option<&AmbientSound> {
        self.0.iter().find(|s| s.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &AmbientSound> {
        self.0.iter().filter(|s| s.is_active)
    }

    pub fn toggle(&self, id: &str) -> Self {
        self.map_one(id, |s| AmbientSound {
            is_active: !s.is_active,
            ..s.clone()
        })
    }

    pub fn with_volume(&self, id: &str, volume: f32) -> Self {
        self.map_one(id, |s| AmbientSound {
            volume: clamp_unit(volume),
            ..s.clone()
        })
    }

    fn map_one(&self, id: &str, f: impl Fn(&AmbientSound) -> AmbientSound) -> Self {
        Self(
            self.0
                .iter()
                .map(|s| if s.id == id { f(s) } else { s.clone() })
                .collect(),
        )
    }

    /// Playback intents for sounds with a known source
    pub fn intents(&self) -> Vec<MediaIntent> {
        self.0
            .iter()
            .filter_map(|s| {
                ambient_source_url(&s.id).map(|url| MediaIntent {
                    id: s.id.clone(),
                    source: url.to_string(),
                    volume: s.volume,
                    active: s.is_active,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Playback reconciliation
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Playback refused: {0}")]
    Refused(String),

    #[error("Source unavailable: {0}")]
    Source(String),
}

/// Desired state of one playable item
#[derive(Debug, Clone, PartialEq)]
pub struct MediaIntent {
    pub id: String,
    pub source: String,
    pub volume: f32,
    pub active: bool,
}

/// Whatever actually makes sound
pub trait PlaybackBackend {
    type Handle;

    fn create(&mut self, id: &str, source: &str) -> Self::Handle;
    fn play(&mut self, handle: &mut Self::Handle) -> Result<(), PlaybackError>;
    fn pause(&mut self, handle: &mut Self::Handle);
    fn set_volume(&mut self, handle: &mut Self::Handle, volume: f32);
}

struct Slot<H> {
    handle: H,
    playing: bool,
    /// Active flag from the previous pass; a start is only attempted on a rising edge
    wanted: bool,
}

/// Keeps playback handles in line with intents
pub struct MediaReconciler<B: PlaybackBackend> {
    backend: B,
    slots: HashMap<String, Slot<B::Handle>>,
}

impl<B: PlaybackBackend> MediaReconciler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn handle_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.slots.get(id).map(|s| s.playing).unwrap_or(false)
    }

    /// Apply one batch of intents; items missing from the batch are paused
    pub fn reconcile(&mut self, intents: &[MediaIntent]) {
        for intent in intents {
            let backend = &mut self.backend;
            let slot = self.slots.entry(intent.id.clone()).or_insert_with(|| Slot {
                handle: backend.create(&intent.id, &intent.source),
                playing: false,
                wanted: false,
            });

            backend.set_volume(&mut slot.handle, intent.volume);

            if intent.active && !slot.playing && !slot.wanted {
                match backend.play(&mut slot.handle) {
                    Ok(()) => slot.playing = true,
                    Err(e) => {
                        tracing::warn!(id = %intent.id, error = %e, "Playback start failed, staying off");
                    }
                }
            } else if !intent.active && slot.playing {
                backend.pause(&mut slot.handle);
                slot.playing = false;
            }
            slot.wanted = intent.active;
        }

        for (id, slot) in self.slots.iter_mut() {
            if slot.playing && !intents.iter().any(|i| &i.id == id) {
                self.backend.pause(&mut slot.handle);
                slot.playing = false;
                slot.wanted = false;
            }
        }
    }

    /// Stop everything and drop all handles
    pub fn teardown(&mut self) {
        for (_, mut slot) in self.slots.drain() {
            if slot.playing {
                self.backend.pause(&mut slot.handle);
            }
        }
    }
}

impl<B: PlaybackBackend> Drop for MediaReconciler<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Backend that only records intent in the log
#[derive(Debug, Default)]
pub struct LoggingPlayback;

#[derive(Debug)]
pub struct LoggedHandle {
    pub id: String,
    pub source: String,
}

impl PlaybackBackend for LoggingPlayback {
    type Handle = LoggedHandle;

    fn create(&mut self, id: &str, source: &str) -> LoggedHandle {
        tracing::debug!(id, source, "Created playback handle");
        LoggedHandle {
            id: id.to_string(),
            source: source.to_string(),
        }
    }

    fn play(&mut self, handle: &mut LoggedHandle) -> Result<(), PlaybackError> {
        tracing::info!(id = %handle.id, source = %handle.source, "Play");
        Ok(())
    }

    fn pause(&mut self, handle: &mut LoggedHandle) {
        tracing::info!(id = %handle.id, "Pause");
    }

    fn set_volume(&mut self, handle: &mut LoggedHandle, volume: f32) {
        tracing::trace!(id = %handle.id, volume, "Volume");
    }
}
