use std::{
    fmt, fs,
    io::{self, Read},
    path::PathBuf,
    sync::Arc,
};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::{COLOR_COUNT, ColorId, default_rgba, format_rgba, parse_rgba};

pub const PROFILE_SUFFIX: &str = ".theme";

#[derive(Debug, Clone, Copy)]
struct ColorSlot {
    value: u32,
    vers: u64,
}

#[derive(Debug)]
struct ThemeTable {
    colors: [ColorSlot; COLOR_COUNT],
    profile: String,
    version: u64,
    closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    EmptyName,
    NotFound { name: String },
    Io { name: String, kind: io::ErrorKind },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::EmptyName => write!(f, "empty theme name"),
            LoadError::NotFound { name } => write!(f, "theme {name}: not found"),
            LoadError::Io { name, kind } => write!(f, "theme {name}: {kind}"),
        }
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Clone)]
pub struct ThemeStoreCreateInfo {
    /// Scanned first; its profiles shadow the system root's.
    pub user_root: PathBuf,
    pub system_root: PathBuf,
}

/// The authoritative color table: 36 slots with per-slot versions, a
/// global monotonic version, the active profile name, and wake-all
/// support for blocked change watchers.
///
/// One coarse lock covers the whole table; writes are human-driven and
/// rare, so finer locking buys nothing. Constructed by the composition
/// root and passed by reference to every consumer.
pub struct ThemeStore {
    table: Mutex<ThemeTable>,
    changed: Condvar,
    roots: [PathBuf; 2],
    redraw: RwLock<Vec<Arc<dyn Fn() + Send + Sync>>>,
}

impl ThemeStore {
    /// Starts from the compiled-in defaults, profile `"default"`. The
    /// on-disk default profile is NOT loaded here; the backing
    /// filesystem may not be mounted yet, so the first load happens on
    /// demand.
    #[must_use]
    pub fn new(info: ThemeStoreCreateInfo) -> Self {
        let colors =
            std::array::from_fn(|i| ColorSlot {
                value: default_rgba(ColorId::ALL[i]),
                vers: 0,
            });
        Self {
            table: Mutex::new(ThemeTable {
                colors,
                profile: "default".to_string(),
                version: 0,
                closed: false,
            }),
            changed: Condvar::new(),
            roots: [info.user_root, info.system_root],
            redraw: RwLock::new(Vec::new()),
        }
    }

    pub fn version(&self) -> u64 {
        self.table.lock().version
    }

    pub fn profile(&self) -> String {
        self.table.lock().profile.clone()
    }

    /// The control read form: `"<version> <profile>\n"`.
    pub fn ctl_text(&self) -> String {
        let table = self.table.lock();
        format!("{} {}\n", table.version, table.profile)
    }

    pub fn read_color(&self, id: ColorId) -> u32 {
        self.table.lock().colors[id.index()].value
    }

    /// Per-slot write counter, for consumers that want finer change
    /// detection than the global version.
    pub fn color_version(&self, id: ColorId) -> u64 {
        self.table.lock().colors[id.index()].vers
    }

    /// The device read form: `"#RRGGBBAA\n"`.
    pub fn read_color_text(&self, id: ColorId) -> String {
        format!("{}\n", format_rgba(self.read_color(id)))
    }

    pub fn write_color(&self, id: ColorId, rgba: u32) {
        {
            let mut table = self.table.lock();
            let slot = &mut table.colors[id.index()];
            slot.value = rgba;
            slot.vers += 1;
            table.version += 1;
            self.changed.notify_all();
        }
        self.notify_redraw();
    }

    /// The device write form, slot addressed by index. Out-of-range
    /// index or a value without the leading `#` is a no-op returning
    /// false.
    pub fn write_color_text(&self, index: usize, text: &str) -> bool {
        let Some(id) = ColorId::from_index(index) else {
            return false;
        };
        let Some(rgba) = parse_rgba(text) else {
            return false;
        };
        self.write_color(id, rgba);
        true
    }

    /// Loads a named profile over the current table as a sparse
    /// overlay: only keys present in the file change, everything else
    /// keeps its prior value. Tries the user root first, then the
    /// system root. On any successful read, even one matching no keys
    /// at all, the profile name is adopted, the version bumped, waiters
    /// woken, and redraw listeners notified. On failure the table is
    /// left entirely unchanged.
    pub fn load_profile(&self, name: &str) -> Result<(), LoadError> {
        if name.is_empty() {
            return Err(LoadError::EmptyName);
        }

        let mut file = None;
        for root in &self.roots {
            let path = root.join(format!("{name}{PROFILE_SUFFIX}"));
            if let Ok(f) = fs::File::open(&path) {
                debug!("loading theme {}", path.display());
                file = Some(f);
                break;
            }
        }
        let Some(mut file) = file else {
            return Err(LoadError::NotFound {
                name: name.to_string(),
            });
        };

        // One critical section spans the file read and the overlay, so
        // no reader observes a half-applied profile.
        let mut table = self.table.lock();

        let mut text = String::new();
        if let Err(e) = file.read_to_string(&mut text) {
            warn!("theme {name}: {e}");
            return Err(LoadError::Io {
                name: name.to_string(),
                kind: e.kind(),
            });
        }

        for line in text.lines() {
            let Some((id, rgba)) = parse_profile_line(line) else {
                continue;
            };
            let slot = &mut table.colors[id.index()];
            slot.value = rgba;
            slot.vers += 1;
        }

        table.profile = name.to_string();
        table.version += 1;
        self.changed.notify_all();
        drop(table);

        self.notify_redraw();
        Ok(())
    }

    /// The control write form: trims whitespace, then loads.
    pub fn load_profile_text(&self, text: &str) -> bool {
        self.load_profile(text.trim()).is_ok()
    }

    /// Profiles available across both roots, base names deduplicated
    /// with user entries shadowing system entries. Never empty: falls
    /// back to the built-in pair when neither root yields anything
    /// (e.g. the profile directories are not mounted yet).
    pub fn list_profiles(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for root in &self.roots {
            let Ok(entries) = fs::read_dir(root) else {
                continue;
            };
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter_map(|n| n.strip_suffix(PROFILE_SUFFIX).map(str::to_string))
                .filter(|n| !n.is_empty())
                .collect();
            names.sort();
            for name in names {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        if seen.is_empty() {
            return vec!["default".to_string(), "dark".to_string()];
        }
        seen
    }

    /// Blocks the caller until the global version moves past `last`,
    /// then returns the new version and the active profile name.
    /// Returns immediately when the version already differs, or when
    /// the store has been closed.
    pub fn wait_for_change(&self, last: u64) -> (u64, String) {
        let mut table = self.table.lock();
        while table.version == last && !table.closed {
            self.changed.wait(&mut table);
        }
        (table.version, table.profile.clone())
    }

    /// Teardown: unblocks every waiter. Subsequent waits return
    /// immediately.
    pub fn close(&self) {
        let mut table = self.table.lock();
        table.closed = true;
        self.changed.notify_all();
    }

    /// Subscribes a redraw listener, called after every completed
    /// mutation. The draw layer registers one per client context.
    pub fn register_redraw(&self, f: impl Fn() + Send + Sync + 'static) {
        self.redraw.write().push(Arc::new(f));
    }

    fn notify_redraw(&self) {
        // Snapshot so a listener may register further listeners.
        let hooks = self.redraw.read().clone();
        for hook in hooks {
            hook();
        }
    }
}

/// One profile line: `key = #RRGGBBAA`. Blank lines, comment lines
/// (`#` first), unknown keys, and values without the leading `#` all
/// yield nothing. The comment `#` and the value `#` are disambiguated
/// purely by position.
fn parse_profile_line(line: &str) -> Option<(ColorId, u32)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let value = value.trim();
    if !value.starts_with('#') {
        return None;
    }
    let rgba = parse_rgba(value)?;
    let id = ColorId::from_name(key.trim())?;
    Some((id, rgba))
}
