//! Mixer frontend over the platform sound backend.
//!
//! Three volume tiers (master, music, sfx) multiply into every playback.
//! Clip handles live in the asset pipeline; this type only decides what to
//! play and how loud. The backend has no pause, so pausing music silences
//! the looping track and remembers that it should come back.

use macroquad::audio::{play_sound, set_sound_volume, stop_sound, PlaySoundParams};

use crate::assets::AssetPipeline;
use crate::config::AudioConfig;

pub struct AudioManager {
    master_volume: f32,
    music_volume: f32,
    sfx_volume: f32,
    muted: bool,
    music_paused: bool,
    current_music: Option<String>,
    /// False in headless contexts where no sound backend exists.
    enabled: bool,
}

impl AudioManager {
    pub fn new(config: &AudioConfig) -> AudioManager {
        AudioManager {
            master_volume: config.master_volume.clamp(0.0, 1.0),
            music_volume: config.music_volume.clamp(0.0, 1.0),
            sfx_volume: config.sfx_volume.clamp(0.0, 1.0),
            muted: false,
            music_paused: false,
            current_music: None,
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Fire a one-shot effect. Missing or not-yet-decoded clips are logged
    /// and skipped, never fatal.
    pub fn play_sound(&self, assets: &AssetPipeline, id: &str, volume: Option<f32>) {
        if !self.enabled || self.muted {
            return;
        }
        let Some(clip) = assets.sound(id) else {
            eprintln!("Unknown sound '{}'", id);
            return;
        };
        let Some(sound) = clip.sound() else {
            eprintln!("Sound '{}' not decoded yet", id);
            return;
        };
        play_sound(
            sound,
            PlaySoundParams {
                looped: false,
                volume: self.effective_sfx_volume(volume.unwrap_or(clip.volume)),
            },
        );
    }

    /// Start a looping track, replacing whatever was playing.
    pub fn play_music(&mut self, assets: &AssetPipeline, id: &str) {
        if !self.enabled {
            return;
        }
        self.stop_music(assets);
        let Some(clip) = assets.music(id) else {
            eprintln!("Unknown music '{}'", id);
            return;
        };
        let Some(sound) = clip.sound() else {
            eprintln!("Music '{}' not decoded yet", id);
            return;
        };
        self.music_paused = false;
        play_sound(
            sound,
            PlaySoundParams {
                looped: true,
                volume: self.effective_music_volume(clip.volume),
            },
        );
        self.current_music = Some(id.to_string());
    }

    pub fn stop_music(&mut self, assets: &AssetPipeline) {
        if let Some(id) = self.current_music.take() {
            if let Some(sound) = assets.music(&id).and_then(|clip| clip.sound()) {
                stop_sound(sound);
            }
        }
        self.music_paused = false;
    }

    pub fn pause_music(&mut self, assets: &AssetPipeline) {
        if self.current_music.is_some() && !self.music_paused {
            self.music_paused = true;
            self.apply_music_volume(assets);
        }
    }

    pub fn resume_music(&mut self, assets: &AssetPipeline) {
        if self.current_music.is_some() && self.music_paused {
            self.music_paused = false;
            self.apply_music_volume(assets);
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.current_music.is_some() && !self.music_paused
    }

    pub fn current_music(&self) -> Option<&str> {
        self.current_music.as_deref()
    }

    pub fn set_muted(&mut self, assets: &AssetPipeline, muted: bool) {
        self.muted = muted;
        self.apply_music_volume(assets);
    }

    pub fn toggle_muted(&mut self, assets: &AssetPipeline) {
        let muted = !self.muted;
        self.set_muted(assets, muted);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_master_volume(&mut self, assets: &AssetPipeline, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.apply_music_volume(assets);
    }

    pub fn set_music_volume(&mut self, assets: &AssetPipeline, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        self.apply_music_volume(assets);
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.sfx_volume
    }

    pub fn effective_sfx_volume(&self, clip_volume: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            clip_volume * self.sfx_volume * self.master_volume
        }
    }

    pub fn effective_music_volume(&self, clip_volume: f32) -> f32 {
        if self.muted || self.music_paused {
            0.0
        } else {
            clip_volume * self.music_volume * self.master_volume
        }
    }

    fn apply_music_volume(&self, assets: &AssetPipeline) {
        if !self.enabled {
            return;
        }
        let Some(id) = self.current_music.as_deref() else {
            return;
        };
        if let Some(clip) = assets.music(id) {
            if let Some(sound) = clip.sound() {
                set_sound_volume(sound, self.effective_music_volume(clip.volume));
            }
        }
    }

    pub fn dispose(&mut self, assets: &AssetPipeline) {
        self.stop_music(assets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AudioManager {
        let mut m = AudioManager::new(&AudioConfig::default());
        m.set_enabled(false);
        m
    }

    #[test]
    fn volumes_multiply_through_tiers() {
        let assets = AssetPipeline::new();
        let mut m = manager();
        m.set_master_volume(&assets, 0.5);
        m.set_sfx_volume(0.8);
        assert!((m.effective_sfx_volume(1.0) - 0.4).abs() < 1e-6);
        // Defaults: music tier starts at 0.7.
        assert!((m.effective_music_volume(1.0) - 0.35).abs() < 1e-6);
        assert!((m.effective_music_volume(0.4) - 0.14).abs() < 1e-6);
    }

    #[test]
    fn volumes_are_clamped() {
        let assets = AssetPipeline::new();
        let mut m = manager();
        m.set_master_volume(&assets, 3.0);
        assert_eq!(m.master_volume(), 1.0);
        m.set_sfx_volume(-1.0);
        assert_eq!(m.sfx_volume(), 0.0);
    }

    #[test]
    fn mute_silences_everything() {
        let assets = AssetPipeline::new();
        let mut m = manager();
        m.set_muted(&assets, true);
        assert_eq!(m.effective_sfx_volume(1.0), 0.0);
        assert_eq!(m.effective_music_volume(1.0), 0.0);
        m.toggle_muted(&assets);
        assert!(!m.is_muted());
        assert!(m.effective_sfx_volume(1.0) > 0.0);
    }

    #[test]
    fn pause_state_tracks_without_backend() {
        let assets = AssetPipeline::new();
        let mut m = manager();
        assert!(!m.is_music_playing());
        // No track playing, pause is a no-op.
        m.pause_music(&assets);
        assert!(!m.is_music_playing());
        assert!(m.current_music().is_none());
    }
}
