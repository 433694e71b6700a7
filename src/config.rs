use crate::bloom::BloomParams;
use crate::term::GlyphMode;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Default)]
#[command(name = "solarscope", about = "A lit, bloomed solar system in your terminal")]
pub(crate) struct Cli {
    /// frame cap (frames per second)
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// seed for initial orbital angles and the starfield
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// how canvas pixels are packed into cells
    #[arg(long, value_enum)]
    pub(crate) glyphs: Option<GlyphMode>,

    /// start with bloom disabled
    #[arg(long)]
    pub(crate) no_bloom: bool,

    /// bloom composite strength
    #[arg(long)]
    pub(crate) bloom_strength: Option<f32>,

    /// write tracing output to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// do not write settings back on exit
    #[arg(long)]
    pub(crate) no_save: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) seed: Option<u64>,
    pub(crate) glyphs: GlyphMode,
    pub(crate) bloom: bool,
    pub(crate) bloom_threshold: f32,
    pub(crate) bloom_strength: f32,
    pub(crate) bloom_radius: f32,
    pub(crate) show_panel: bool,
    pub(crate) log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let b = BloomParams::default();
        Self {
            fps_cap: 30,
            seed: None,
            glyphs: GlyphMode::Braille,
            bloom: true,
            bloom_threshold: b.threshold,
            bloom_strength: b.strength,
            bloom_radius: b.radius,
            show_panel: true,
            log_file: None,
        }
    }
}

impl Settings {
    /// Command-line flags win over the stored file.
    pub(crate) fn apply_cli(&mut self, cli: &Cli) {
        if let Some(fps) = cli.fps {
            self.fps_cap = fps;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if let Some(g) = cli.glyphs {
            self.glyphs = g;
        }
        if cli.no_bloom {
            self.bloom = false;
        }
        if let Some(s) = cli.bloom_strength {
            self.bloom_strength = s.max(0.0);
        }
        if cli.log_file.is_some() {
            self.log_file = cli.log_file.clone();
        }
    }

    pub(crate) fn bloom_params(&self) -> BloomParams {
        BloomParams {
            threshold: self.bloom_threshold,
            strength: self.bloom_strength,
            radius: self.bloom_radius,
        }
    }

    pub(crate) fn clamped_fps(&self) -> u32 {
        self.fps_cap.clamp(10, 240)
    }
}

/// Settings as stored on disk next to the ones in effect for this run.
/// Flags only touch `current`; runtime toggles land in both, so only the
/// toggles persist.
pub(crate) struct SettingsStore {
    file: Settings,
    pub(crate) current: Settings,
}

impl SettingsStore {
    pub(crate) fn new(file: Settings, cli: &Cli) -> Self {
        let mut current = file.clone();
        current.apply_cli(cli);
        Self { file, current }
    }

    pub(crate) fn toggle_bloom(&mut self) -> bool {
        self.current.bloom = !self.current.bloom;
        self.file.bloom = self.current.bloom;
        self.current.bloom
    }

    pub(crate) fn toggle_glyphs(&mut self) -> GlyphMode {
        self.current.glyphs = self.current.glyphs.toggled();
        self.file.glyphs = self.current.glyphs;
        self.current.glyphs
    }

    pub(crate) fn toggle_panel(&mut self) -> bool {
        self.current.show_panel = !self.current.show_panel;
        self.file.show_panel = self.current.show_panel;
        self.current.show_panel
    }

    /// What gets written back at exit.
    pub(crate) fn to_save(&self) -> &Settings {
        &self.file
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "solarscope", "Solarscope")
        .context("could not resolve project directories")?;
    let dir = proj.config_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
    })
}

/// Reads settings, falling back to defaults when the file is missing or
/// corrupt. A parse failure is handed back so it can be logged once logging
/// is up.
pub(crate) fn load_settings(path: &Path) -> (Settings, Option<serde_json::Error>) {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return (Settings::default(), None),
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => (v, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("replacing {}", to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("solarscope-test-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("settings.json")
    }

    #[test]
    fn settings_survive_a_save_and_load() {
        let path = temp_path("roundtrip");
        let s = Settings {
            fps_cap: 45,
            seed: Some(7),
            glyphs: GlyphMode::HalfBlock,
            bloom: false,
            show_panel: false,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path).0, s);
        assert!(!path.with_extension("json.tmp").exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s: Settings = serde_json::from_str(r#"{"glyphs":"half-block"}"#).unwrap();
        assert_eq!(s.glyphs, GlyphMode::HalfBlock);
        assert_eq!(s.fps_cap, 30);
        assert!(s.bloom);
        assert_eq!(s.bloom_strength, 2.0);
    }

    #[test]
    fn missing_or_corrupt_file_gives_defaults() {
        let path = temp_path("corrupt");
        let _ = fs::remove_file(&path);
        let (s, err) = load_settings(&path);
        assert_eq!(s, Settings::default());
        assert!(err.is_none());
        fs::write(&path, "{ not json").unwrap();
        let (s, err) = load_settings(&path);
        assert_eq!(s, Settings::default());
        assert!(err.is_some());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn cli_overrides_file() {
        let mut s = Settings::default();
        let cli = Cli::parse_from(["solarscope", "--fps", "60", "--glyphs", "half-block", "--no-bloom", "--seed", "3"]);
        s.apply_cli(&cli);
        assert_eq!(s.fps_cap, 60);
        assert_eq!(s.glyphs, GlyphMode::HalfBlock);
        assert!(!s.bloom);
        assert_eq!(s.seed, Some(3));

        let mut s = Settings::default();
        s.apply_cli(&Cli::parse_from(["solarscope"]));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn one_shot_flags_do_not_persist() {
        let path = temp_path("one-shot");
        let _ = fs::remove_file(&path);
        let (file, _) = load_settings(&path);
        let cli = Cli::parse_from([
            "solarscope", "--seed", "3", "--no-bloom", "--fps", "50", "--log-file", "x.log",
        ]);
        let mut store = SettingsStore::new(file, &cli);
        assert_eq!(store.current.seed, Some(3));
        assert!(!store.current.bloom);
        assert_eq!(store.toggle_glyphs(), GlyphMode::HalfBlock);
        save_settings_atomic(&path, store.to_save()).unwrap();

        let (file, err) = load_settings(&path);
        assert!(err.is_none());
        let next = SettingsStore::new(file, &Cli::parse_from(["solarscope"]));
        assert_eq!(next.current.seed, None);
        assert!(next.current.bloom);
        assert_eq!(next.current.fps_cap, 30);
        assert_eq!(next.current.log_file, None);
        assert_eq!(next.current.glyphs, GlyphMode::HalfBlock);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn runtime_toggles_persist_over_flags() {
        let cli = Cli::parse_from(["solarscope", "--no-bloom"]);
        let mut store = SettingsStore::new(Settings::default(), &cli);
        assert!(store.to_save().bloom);
        assert!(store.toggle_bloom());
        assert!(!store.toggle_panel());
        assert!(store.to_save().bloom);
        assert!(!store.to_save().show_panel);
    }

    #[test]
    fn fps_is_kept_in_a_sane_range() {
        let s = Settings { fps_cap: 1000, ..Settings::default() };
        assert_eq!(s.clamped_fps(), 240);
        let s = Settings { fps_cap: 0, ..Settings::default() };
        assert_eq!(s.clamped_fps(), 10);
    }
}
