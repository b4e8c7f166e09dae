//! Trigger → action resolution.
//!
//! The binding tables are immutable once built. A reload hands the
//! dispatcher a whole new set together with the config it was built from;
//! a dispatch runs against the set it started with.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::collections::{BTreeMap, HashMap};
use crate::common::config::{Binding, Chord, Config, ConfigError};
use crate::layout_engine::Direction;
use crate::model::window::ManagedWindow;
use crate::sys::hotkey::{Hotkey, Input, KeyCode};

/// Everything a binding can do. Parameters are fixed when the binding is
/// created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Focus(Direction),
    FocusNext,
    FocusPrevious,
    Shuffle(Direction),
    Grow(Direction),
    Normalize,
    ToggleSplit,
    NextLayout,
    PreviousLayout,
    SetLayout(String),

    Kill,
    ToggleFullscreen,
    ToggleFloating,
    ToggleMinimize,
    BringToFront,
    /// Mouse only: drag moves the window (floating it if tiled).
    DragMove,
    /// Mouse only: drag resizes the window (floating it if tiled).
    DragResize,

    /// Show the named group on the focused screen.
    ToScreen(String),
    /// Move the focused window to the named group.
    ToGroup {
        group: String,
        #[serde(default)]
        follow: bool,
    },

    Spawn(String),
    Brightness {
        #[serde(default = "default_brightness_step")]
        step: u32,
        #[serde(default)]
        increase: bool,
    },
    ChangeVt(u8),
    EnterChord(String),
    LeaveChord,
    ReloadConfig,
    Shutdown,
}

fn default_brightness_step() -> u32 { 16 }

#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Run this action.
    Run(Action),
    /// Bound, but the binding's `when` predicate rejected the focused window.
    Ignored,
    /// Nothing is bound to the trigger.
    Unbound,
    ChordEntered(String),
    ChordLeft,
}

/// What the dispatcher may consult about the current state.
#[derive(Clone, Copy, Default)]
pub struct DispatchContext<'a> {
    pub focused: Option<&'a ManagedWindow>,
}

#[derive(Debug, Default, Clone)]
struct ChordTable {
    persistent: bool,
    bindings: HashMap<Hotkey, Binding>,
}

/// The main binding table and the named chord tables.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    main: HashMap<Hotkey, Binding>,
    chords: BTreeMap<String, ChordTable>,
}

impl Bindings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut bindings = Bindings::default();
        for binding in config.keys.iter().chain(config.mouse.iter()) {
            bindings.bind(binding.clone())?;
        }
        for chord in config.chords.values() {
            bindings.bind_chord(chord)?;
        }
        Ok(bindings)
    }

    /// Bind in the main table. A trigger can only be bound once.
    pub fn bind(&mut self, binding: Binding) -> Result<(), ConfigError> {
        insert_unique(&mut self.main, binding, "keys")
    }

    pub fn bind_chord(&mut self, chord: &Chord) -> Result<(), ConfigError> {
        let mut table = ChordTable {
            persistent: chord.persistent,
            bindings: HashMap::default(),
        };
        let name = format!("chord `{}`", chord.name);
        for binding in &chord.keys {
            insert_unique(&mut table.bindings, binding.clone(), &name)?;
        }
        self.chords.insert(chord.name.clone(), table);
        Ok(())
    }

    pub fn len(&self) -> usize { self.main.len() }

    pub fn is_empty(&self) -> bool { self.main.is_empty() }

    pub fn has_chord(&self, name: &str) -> bool { self.chords.contains_key(name) }
}

fn insert_unique(
    table: &mut HashMap<Hotkey, Binding>,
    binding: Binding,
    name: &str,
) -> Result<(), ConfigError> {
    if table.contains_key(&binding.trigger) {
        return Err(ConfigError::DuplicateBinding {
            trigger: binding.trigger,
            table: name.to_string(),
        });
    }
    table.insert(binding.trigger, binding);
    Ok(())
}

fn is_escape(trigger: Hotkey) -> bool {
    trigger.modifiers.is_empty() && trigger.input == Input::Key(KeyCode::Escape)
}

pub struct Dispatcher {
    bindings: Arc<Bindings>,
    active_chord: Option<String>,
}

impl Dispatcher {
    pub fn new(bindings: Arc<Bindings>) -> Self {
        Self {
            bindings,
            active_chord: None,
        }
    }

    pub fn set_bindings(&mut self, bindings: Arc<Bindings>) { self.bindings = bindings; }

    pub fn active_chord(&self) -> Option<&str> { self.active_chord.as_deref() }

    pub fn leave_chord(&mut self) -> bool { self.active_chord.take().is_some() }

    pub fn enter_chord(&mut self, name: &str) -> bool {
        if !self.bindings.has_chord(name) {
            return false;
        }
        self.active_chord = Some(name.to_string());
        true
    }

    pub fn dispatch(&mut self, trigger: Hotkey, ctx: DispatchContext<'_>) -> ActionResult {
        let tables = self.bindings.clone();
        self.dispatch_with(&tables, trigger, ctx)
    }

    /// Resolve against an already loaded set of tables.
    pub fn dispatch_with(
        &mut self,
        tables: &Bindings,
        trigger: Hotkey,
        ctx: DispatchContext<'_>,
    ) -> ActionResult {
        // A reload may have removed the chord we were in.
        if let Some(name) = &self.active_chord {
            if !tables.has_chord(name) {
                debug!(chord = %name, "active chord no longer exists");
                self.active_chord = None;
            }
        }

        let Some(chord_name) = self.active_chord.clone() else {
            return match tables.main.get(&trigger) {
                Some(binding) => self.resolve(binding, ctx),
                None => {
                    trace!(%trigger, "unbound");
                    ActionResult::Unbound
                }
            };
        };

        let chord = &tables.chords[&chord_name];
        if is_escape(trigger) && !chord.bindings.contains_key(&trigger) {
            self.active_chord = None;
            return ActionResult::ChordLeft;
        }
        match chord.bindings.get(&trigger) {
            Some(binding) => {
                let result = self.resolve(binding, ctx);
                if !chord.persistent && matches!(result, ActionResult::Run(_)) {
                    self.active_chord = None;
                }
                result
            }
            None if chord.persistent => ActionResult::Unbound,
            None => {
                self.active_chord = None;
                ActionResult::ChordLeft
            }
        }
    }

    fn resolve(&mut self, binding: &Binding, ctx: DispatchContext<'_>) -> ActionResult {
        if let Some(pred) = &binding.when {
            if !ctx.focused.is_some_and(|w| pred.matches(w)) {
                return ActionResult::Ignored;
            }
        }
        match &binding.action {
            Action::EnterChord(name) => {
                debug!(chord = %name, "entering chord");
                self.active_chord = Some(name.clone());
                ActionResult::ChordEntered(name.clone())
            }
            Action::LeaveChord => {
                self.active_chord = None;
                ActionResult::ChordLeft
            }
            action => ActionResult::Run(action.clone()),
        }
    }
}
