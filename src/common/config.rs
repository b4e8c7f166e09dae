use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::actor::dispatcher::Action;
use crate::common::collections::{BTreeMap, HashSet};
use crate::model::rules::{FloatRule, FloatRules, WindowMatch};
use crate::sys::geometry::Insets;
use crate::sys::hotkey::Hotkey;

const MAX_WORKER_THREADS: usize = 16;

pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("lattice")
}

pub fn config_file() -> PathBuf { config_dir().join("lattice.toml") }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate binding for `{trigger}` in {table}")]
    DuplicateBinding { trigger: Hotkey, table: String },
    #[error("could not parse trigger `{input}`: {reason}")]
    BadTrigger { input: String, reason: String },
    #[error("unknown layout `{0}`")]
    UnknownLayout(String),
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown chord `{0}`")]
    UnknownChord(String),
    #[error("group `{0}` is defined more than once")]
    DuplicateGroup(String),
    #[error("layout name `{0}` is used more than once")]
    DuplicateLayout(String),
    #[error("at least one group must be configured")]
    NoGroups,
    #[error("at least one layout must be configured")]
    NoLayouts,
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default = "default_groups")]
    groups: Vec<GroupConfig>,
    #[serde(default = "default_layouts")]
    layouts: Vec<LayoutSpec>,
    #[serde(default)]
    floating: FloatingConfig,
    #[serde(default)]
    modifier_combinations: BTreeMap<String, String>,
    #[serde(default)]
    group_keys: Option<GroupKeys>,
    #[serde(default)]
    keys: Vec<BindingFile>,
    #[serde(default)]
    mouse: Vec<BindingFile>,
    #[serde(default)]
    chords: BTreeMap<String, ChordFile>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct BindingFile {
    trigger: String,
    action: Action,
    #[serde(default)]
    when: Option<WindowMatch>,
    #[serde(default)]
    desc: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ChordFile {
    #[serde(default)]
    persistent: bool,
    #[serde(default)]
    keys: Vec<BindingFile>,
}

/// Bindings generated once per group label, e.g. `Super + 3` to show group
/// "3" and `Super + Shift + 3` to move the focused window there.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct GroupKeys {
    #[serde(default)]
    switch: Option<String>,
    #[serde(default)]
    move_window: Option<String>,
    #[serde(default = "yes")]
    follow: bool,
}

/// A trigger bound to an action. `when` restricts the binding to a focused
/// window matching the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub trigger: Hotkey,
    pub action: Action,
    pub when: Option<WindowMatch>,
    pub desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub name: String,
    pub persistent: bool,
    pub keys: Vec<Binding>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub groups: Vec<GroupConfig>,
    pub layouts: Vec<LayoutSpec>,
    pub float_rules: FloatRules,
    pub keys: Vec<Binding>,
    pub mouse: Vec<Binding>,
    pub chords: BTreeMap<String, Chord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "yes")]
    pub follow_mouse_focus: bool,
    #[serde(default)]
    pub bring_front_click: BringFrontClick,
    #[serde(default = "yes")]
    pub floats_kept_above: bool,
    #[serde(default)]
    pub cursor_warp: bool,
    #[serde(default = "yes")]
    pub auto_fullscreen: bool,
    #[serde(default)]
    pub focus_on_window_activation: ActivationPolicy,
    #[serde(default = "yes")]
    pub reconfigure_screens: bool,
    /// Honour windows that minimize themselves when they lose focus.
    #[serde(default = "yes")]
    pub auto_minimize: bool,
    #[serde(default = "default_backlight_device")]
    pub backlight_device: PathBuf,
    #[serde(default)]
    pub bar: BarSettings,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Commands run once the window manager is up.
    #[serde(default)]
    pub run_on_start: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            follow_mouse_focus: true,
            bring_front_click: BringFrontClick::default(),
            floats_kept_above: true,
            cursor_warp: false,
            auto_fullscreen: true,
            focus_on_window_activation: ActivationPolicy::default(),
            reconfigure_screens: true,
            auto_minimize: true,
            backlight_device: default_backlight_device(),
            bar: BarSettings::default(),
            worker_threads: default_worker_threads(),
            run_on_start: Vec::new(),
        }
    }
}

/// Whether clicking a window raises it. Written as `true`, `false` or
/// `"floating_only"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BringFrontClick {
    #[default]
    Never,
    Always,
    FloatingOnly,
}

impl Serialize for BringFrontClick {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        match self {
            BringFrontClick::Never => serializer.serialize_bool(false),
            BringFrontClick::Always => serializer.serialize_bool(true),
            BringFrontClick::FloatingOnly => serializer.serialize_str("floating_only"),
        }
    }
}

impl<'de> Deserialize<'de> for BringFrontClick {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bool(bool),
            Str(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Bool(true) => Ok(BringFrontClick::Always),
            Repr::Bool(false) => Ok(BringFrontClick::Never),
            Repr::Str(s) if s == "floating_only" => Ok(BringFrontClick::FloatingOnly),
            Repr::Str(s) => Err(serde::de::Error::custom(format!(
                "expected true, false or \"floating_only\", got \"{s}\""
            ))),
        }
    }
}

/// What to do when a client asks to be activated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Always focus, switching group if needed.
    Focus,
    /// Focus only if the window's group is visible; otherwise mark urgent.
    #[default]
    Smart,
    Urgent,
    Never,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BarPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BarSettings {
    #[serde(default)]
    pub position: BarPosition,
    /// Thickness reserved on every screen; 0 disables the reservation.
    #[serde(default)]
    pub size: i32,
}

impl BarSettings {
    pub fn reservation(&self) -> Insets {
        let size = self.size.max(0);
        match self.position {
            BarPosition::Top => Insets { top: size, ..Default::default() },
            BarPosition::Bottom => Insets { bottom: size, ..Default::default() },
            BarPosition::Left => Insets { left: size, ..Default::default() },
            BarPosition::Right => Insets { right: size, ..Default::default() },
        }
    }
}

/// A group label with an optional restriction on which layouts it offers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "GroupRepr")]
pub struct GroupConfig {
    pub name: String,
    /// Names of the layouts this group cycles through; empty means all.
    pub layouts: Vec<String>,
    pub layout: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupRepr {
    Label(String),
    Full {
        name: String,
        #[serde(default)]
        layouts: Vec<String>,
        #[serde(default)]
        layout: Option<String>,
    },
}

impl From<GroupRepr> for GroupConfig {
    fn from(repr: GroupRepr) -> Self {
        match repr {
            GroupRepr::Label(name) => GroupConfig {
                name,
                layouts: Vec::new(),
                layout: None,
            },
            GroupRepr::Full { name, layouts, layout } => GroupConfig { name, layouts, layout },
        }
    }
}

impl GroupConfig {
    /// Layout specs for this group in configured order, plus the index of
    /// the initial one.
    pub fn layout_specs(&self, all: &[LayoutSpec]) -> (Vec<LayoutSpec>, usize) {
        let specs: Vec<LayoutSpec> = if self.layouts.is_empty() {
            all.to_vec()
        } else {
            self.layouts
                .iter()
                .filter_map(|n| all.iter().find(|l| l.name() == n))
                .cloned()
                .collect()
        };
        let initial = self
            .layout
            .as_ref()
            .and_then(|n| specs.iter().position(|l| l.name() == n))
            .unwrap_or(0);
        (specs, initial)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutSpec {
    Columns(ColumnsSettings),
    Max(MaxSettings),
    VerticalTile(VerticalTileSettings),
    Floating(FloatingSettings),
}

impl LayoutSpec {
    pub fn name(&self) -> &str {
        match self {
            LayoutSpec::Columns(s) => s.name.as_deref().unwrap_or("columns"),
            LayoutSpec::Max(s) => s.name.as_deref().unwrap_or("max"),
            LayoutSpec::VerticalTile(s) => s.name.as_deref().unwrap_or("vertical_tile"),
            LayoutSpec::Floating(s) => s.name.as_deref().unwrap_or("floating"),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let name = self.name();
        let mut issues = Vec::new();
        let (border, margin) = match self {
            LayoutSpec::Columns(s) => (s.border_width, s.margin),
            LayoutSpec::Max(s) => (s.border_width, s.margin),
            LayoutSpec::VerticalTile(s) => (s.border_width, s.margin),
            LayoutSpec::Floating(s) => (s.border_width, 0),
        };
        if border < 0 {
            issues.push(format!("{name}: border_width must be non-negative, got {border}"));
        }
        if margin < 0 {
            issues.push(format!("{name}: margin must be non-negative, got {margin}"));
        }
        let (grow, min) = match self {
            LayoutSpec::Columns(s) => (s.grow_amount, s.min_tile_size),
            LayoutSpec::VerticalTile(s) => (s.grow_amount, s.min_tile_size),
            _ => return issues,
        };
        if !(grow.is_finite() && grow > 0.0) {
            issues.push(format!("{name}: grow_amount must be positive, got {grow}"));
        }
        if min < 1 {
            issues.push(format!("{name}: min_tile_size must be at least 1, got {min}"));
        }
        if let LayoutSpec::Columns(s) = self {
            if s.max_columns == Some(0) {
                issues.push(format!("{name}: max_columns must be at least 1"));
            }
        }
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        fn non_negative(v: &mut i32) -> usize {
            if *v < 0 {
                *v = 0;
                1
            } else {
                0
            }
        }
        fn tunables(grow: &mut f64, min: &mut i32) -> usize {
            let mut fixes = 0;
            if !(grow.is_finite() && *grow > 0.0) {
                *grow = default_grow_amount();
                fixes += 1;
            }
            if *min < 1 {
                *min = 1;
                fixes += 1;
            }
            fixes
        }
        match self {
            LayoutSpec::Columns(s) => {
                let mut fixes = non_negative(&mut s.border_width) + non_negative(&mut s.margin);
                fixes += tunables(&mut s.grow_amount, &mut s.min_tile_size);
                if s.max_columns == Some(0) {
                    s.max_columns = Some(1);
                    fixes += 1;
                }
                fixes
            }
            LayoutSpec::Max(s) => non_negative(&mut s.border_width) + non_negative(&mut s.margin),
            LayoutSpec::VerticalTile(s) => {
                non_negative(&mut s.border_width)
                    + non_negative(&mut s.margin)
                    + tunables(&mut s.grow_amount, &mut s.min_tile_size)
            }
            LayoutSpec::Floating(s) => non_negative(&mut s.border_width),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnsSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_border_width")]
    pub border_width: i32,
    #[serde(default)]
    pub margin: i32,
    /// New windows open new columns until this many exist. Unbounded if unset.
    #[serde(default)]
    pub max_columns: Option<usize>,
    /// Weight moved per grow step; every tile starts at 100.
    #[serde(default = "default_grow_amount")]
    pub grow_amount: f64,
    #[serde(default = "default_min_tile_size")]
    pub min_tile_size: i32,
    /// Whether new columns start split (all windows shown).
    #[serde(default = "yes")]
    pub split: bool,
}

impl Default for ColumnsSettings {
    fn default() -> Self {
        Self {
            name: None,
            border_width: default_border_width(),
            margin: 0,
            max_columns: None,
            grow_amount: default_grow_amount(),
            min_tile_size: default_min_tile_size(),
            split: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct MaxSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub border_width: i32,
    #[serde(default)]
    pub margin: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VerticalTileSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_border_width")]
    pub border_width: i32,
    #[serde(default)]
    pub margin: i32,
    #[serde(default = "default_grow_amount")]
    pub grow_amount: f64,
    #[serde(default = "default_min_tile_size")]
    pub min_tile_size: i32,
}

impl Default for VerticalTileSettings {
    fn default() -> Self {
        Self {
            name: None,
            border_width: default_border_width(),
            margin: 0,
            grow_amount: default_grow_amount(),
            min_tile_size: default_min_tile_size(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FloatingSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_border_width")]
    pub border_width: i32,
}

impl Default for FloatingSettings {
    fn default() -> Self {
        Self {
            name: None,
            border_width: default_border_width(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FloatingConfig {
    /// Prepend the built-in rules for dialogs, utility windows and
    /// transients.
    #[serde(default = "yes")]
    pub include_default_rules: bool,
    #[serde(default)]
    pub rules: Vec<FloatRule>,
}

impl Default for FloatingConfig {
    fn default() -> Self {
        Self {
            include_default_rules: true,
            rules: Vec::new(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.worker_threads == 0 || self.worker_threads > MAX_WORKER_THREADS {
            issues.push(format!(
                "worker_threads must be between 1 and {MAX_WORKER_THREADS}, got {}",
                self.worker_threads
            ));
        }
        if self.bar.size < 0 {
            issues.push(format!("bar.size must be non-negative, got {}", self.bar.size));
        }
        if self.run_on_start.iter().any(|c| c.trim().is_empty()) {
            issues.push("run_on_start contains an empty command".to_string());
        }
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;
        if self.worker_threads == 0 || self.worker_threads > MAX_WORKER_THREADS {
            self.worker_threads = self.worker_threads.clamp(1, MAX_WORKER_THREADS);
            fixes += 1;
        }
        if self.bar.size < 0 {
            self.bar.size = 0;
            fixes += 1;
        }
        let before = self.run_on_start.len();
        self.run_on_start.retain(|c| !c.trim().is_empty());
        fixes += before - self.run_on_start.len();
        fixes
    }
}

fn yes() -> bool { true }

fn default_border_width() -> i32 { 2 }

fn default_grow_amount() -> f64 { 10.0 }

fn default_min_tile_size() -> i32 { 50 }

fn default_worker_threads() -> usize { 2 }

fn default_backlight_device() -> PathBuf { PathBuf::from("/sys/class/backlight/intel_backlight") }

fn default_groups() -> Vec<GroupConfig> {
    (1..=9)
        .map(|i| GroupConfig {
            name: i.to_string(),
            layouts: Vec::new(),
            layout: None,
        })
        .collect()
}

fn default_layouts() -> Vec<LayoutSpec> {
    vec![
        LayoutSpec::Columns(ColumnsSettings::default()),
        LayoutSpec::Max(MaxSettings::default()),
    ]
}

impl Config {
    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let buf = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&buf)
    }

    /// Read `path` if it exists, otherwise use the embedded default.
    pub fn read_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::read(path)
        } else {
            info!("{} not found, using the default config", path.display());
            Ok(Self::default())
        }
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../lattice.default.toml"))
            .expect("embedded default config is valid")
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();
        for layout in &self.layouts {
            issues.extend(layout.validate());
        }
        for (i, rule) in self.float_rules.rules().iter().enumerate() {
            if rule.matcher.is_empty() {
                issues.push(format!("float rule {i} matches every window"));
            }
        }
        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.settings.auto_fix_values();
        for layout in &mut self.layouts {
            fixes += layout.auto_fix_values();
        }
        fixes
    }

    pub fn layout_by_name(&self, name: &str) -> Option<&LayoutSpec> {
        self.layouts.iter().find(|l| l.name() == name)
    }

    fn expand_modifier_combinations(key: &str, combinations: &BTreeMap<String, String>) -> String {
        key.split('+')
            .map(|part| {
                let part = part.trim();
                combinations.get(part).map(String::as_str).unwrap_or(part)
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }

    fn parse_trigger(
        input: &str,
        combinations: &BTreeMap<String, String>,
    ) -> Result<Hotkey, ConfigError> {
        let expanded = Self::expand_modifier_combinations(input, combinations);
        Hotkey::from_str(&expanded).map_err(|e| ConfigError::BadTrigger {
            input: input.to_string(),
            reason: e.to_string(),
        })
    }

    fn build_bindings(
        files: Vec<BindingFile>,
        combinations: &BTreeMap<String, String>,
        table: &str,
        want_button: bool,
    ) -> Result<Vec<Binding>, ConfigError> {
        let mut seen = HashSet::default();
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            let trigger = Self::parse_trigger(&file.trigger, combinations)?;
            if trigger.is_button() != want_button {
                return Err(ConfigError::BadTrigger {
                    input: file.trigger,
                    reason: if want_button {
                        "mouse bindings need a button".to_string()
                    } else {
                        "use [[mouse]] for button bindings".to_string()
                    },
                });
            }
            if !seen.insert(trigger) {
                return Err(ConfigError::DuplicateBinding {
                    trigger,
                    table: table.to_string(),
                });
            }
            out.push(Binding {
                trigger,
                action: file.action,
                when: file.when,
                desc: file.desc,
            });
        }
        Ok(out)
    }

    fn group_key_bindings(gk: &GroupKeys, groups: &[GroupConfig]) -> Vec<BindingFile> {
        let mut out = Vec::new();
        for group in groups {
            if let Some(prefix) = &gk.switch {
                out.push(BindingFile {
                    trigger: format!("{prefix} + {}", group.name),
                    action: Action::ToScreen(group.name.clone()),
                    when: None,
                    desc: Some(format!("Switch to group {}", group.name)),
                });
            }
            if let Some(prefix) = &gk.move_window {
                out.push(BindingFile {
                    trigger: format!("{prefix} + {}", group.name),
                    action: Action::ToGroup {
                        group: group.name.clone(),
                        follow: gk.follow,
                    },
                    when: None,
                    desc: Some(format!("Move focused window to group {}", group.name)),
                });
            }
        }
        out
    }

    fn check_action(&self, action: &Action) -> Result<(), ConfigError> {
        match action {
            Action::SetLayout(name) if self.layout_by_name(name).is_none() => {
                Err(ConfigError::UnknownLayout(name.clone()))
            }
            Action::ToScreen(group) | Action::ToGroup { group, .. }
                if !self.groups.iter().any(|g| &g.name == group) =>
            {
                Err(ConfigError::UnknownGroup(group.clone()))
            }
            Action::EnterChord(name) if !self.chords.contains_key(name) => {
                Err(ConfigError::UnknownChord(name.clone()))
            }
            _ => Ok(()),
        }
    }

    fn check_references(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }
        if self.layouts.is_empty() {
            return Err(ConfigError::NoLayouts);
        }
        let mut names = HashSet::default();
        for layout in &self.layouts {
            if !names.insert(layout.name()) {
                return Err(ConfigError::DuplicateLayout(layout.name().to_string()));
            }
        }
        let mut labels = HashSet::default();
        for group in &self.groups {
            if !labels.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroup(group.name.clone()));
            }
            for name in group.layouts.iter().chain(group.layout.iter()) {
                if self.layout_by_name(name).is_none() {
                    return Err(ConfigError::UnknownLayout(name.clone()));
                }
            }
        }
        let chord_keys = self.chords.values().flat_map(|c| c.keys.iter());
        for binding in self.keys.iter().chain(self.mouse.iter()).chain(chord_keys) {
            self.check_action(&binding.action)?;
        }
        Ok(())
    }

    pub fn parse(buf: &str) -> Result<Config, ConfigError> {
        let mut c: ConfigFile = toml::from_str(buf)?;
        let combos = &c.modifier_combinations;

        if let Some(gk) = &c.group_keys {
            let generated = Self::group_key_bindings(gk, &c.groups);
            c.keys.extend(generated);
        }
        let keys = Self::build_bindings(std::mem::take(&mut c.keys), combos, "keys", false)?;
        let mouse = Self::build_bindings(std::mem::take(&mut c.mouse), combos, "mouse", true)?;

        let mut chords = BTreeMap::new();
        for (name, chord) in std::mem::take(&mut c.chords) {
            let table = format!("chord `{name}`");
            let keys = Self::build_bindings(chord.keys, combos, &table, false)?;
            chords.insert(name.clone(), Chord {
                name,
                persistent: chord.persistent,
                keys,
            });
        }

        let config = Config {
            float_rules: FloatRules::new(c.floating.include_default_rules, &c.floating.rules),
            settings: c.settings,
            groups: c.groups,
            layouts: c.layouts,
            keys,
            mouse,
            chords,
        };
        config.check_references()?;
        Ok(config)
    }
}
