use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::collections::HashMap;
use crate::common::config::LayoutSpec;
use crate::layout_engine::{Layout, LayoutInstance, Slot};
use crate::model::{GroupId, WindowId};

/// The ordered layouts of one group and which one is active.
///
/// Every instance tracks the same tiled windows so switching layouts keeps
/// each instance's own state (weights, split flags, focus order).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LayoutSet {
    instances: Vec<LayoutInstance>,
    current: usize,
    /// Slots of windows taken out while floating or minimized, one per
    /// instance.
    #[serde(skip)]
    parked: HashMap<WindowId, Vec<Option<Slot>>>,
}

impl LayoutSet {
    pub fn new(specs: &[LayoutSpec], initial: usize) -> Self {
        let instances: Vec<_> = specs.iter().map(LayoutInstance::from_spec).collect();
        let current = initial.min(instances.len().saturating_sub(1));
        Self {
            instances,
            current,
            parked: HashMap::default(),
        }
    }

    pub fn current(&self) -> &LayoutInstance { &self.instances[self.current] }

    pub fn current_mut(&mut self) -> &mut LayoutInstance { &mut self.instances[self.current] }

    pub fn current_index(&self) -> usize { self.current }

    pub fn names(&self) -> Vec<&str> { self.instances.iter().map(|l| l.name()).collect() }

    pub fn next(&mut self) -> bool { self.cycle(true) }

    pub fn previous(&mut self) -> bool { self.cycle(false) }

    fn cycle(&mut self, forward: bool) -> bool {
        let len = self.instances.len();
        if len < 2 {
            return false;
        }
        let focus = self.current().focused();
        self.current = if forward { (self.current + 1) % len } else { (self.current + len - 1) % len };
        self.carry_focus(focus);
        true
    }

    pub fn select(&mut self, name: &str) -> bool {
        let Some(idx) = self.instances.iter().position(|l| l.name() == name) else {
            return false;
        };
        if idx == self.current {
            return false;
        }
        let focus = self.current().focused();
        self.current = idx;
        self.carry_focus(focus);
        true
    }

    fn carry_focus(&mut self, focus: Option<WindowId>) {
        if let Some(wid) = focus {
            self.current_mut().focus(wid);
        }
        debug!(layout = self.current().name(), "layout changed");
    }

    /// Add to every instance; the active one also focuses it.
    pub fn add_window(&mut self, wid: WindowId) {
        for layout in &mut self.instances {
            layout.add_window(wid);
        }
    }

    /// Take a window out of every instance, remembering where it was so
    /// [`restore_window`](Self::restore_window) can put it back.
    pub fn park_window(&mut self, wid: WindowId) -> bool {
        let slots: Vec<Option<Slot>> = self.instances.iter_mut().map(|l| l.detach(wid)).collect();
        if slots.iter().all(Option::is_none) {
            return false;
        }
        self.parked.insert(wid, slots);
        true
    }

    /// Put a parked window back. Instances whose shape changed since it left
    /// take it as a new window instead.
    pub fn restore_window(&mut self, wid: WindowId) {
        let slots = self.parked.remove(&wid).unwrap_or_default();
        for (idx, layout) in self.instances.iter_mut().enumerate() {
            let slot = slots.get(idx).and_then(Option::as_ref);
            if !slot.is_some_and(|slot| layout.reattach(wid, slot)) {
                debug!(%wid, layout = layout.name(), "slot gone; adding as new window");
                layout.add_window(wid);
            }
        }
    }

    pub fn remove_window(&mut self, wid: WindowId) -> bool {
        self.parked.remove(&wid);
        let mut removed = false;
        for layout in &mut self.instances {
            removed |= layout.remove_window(wid);
        }
        removed
    }

    pub fn contains(&self, wid: WindowId) -> bool { self.current().contains(wid) }

    pub fn focus(&mut self, wid: WindowId) -> bool { self.current_mut().focus(wid) }
}

/// Layout sets keyed by group.
#[derive(Debug, Default)]
pub struct GroupLayouts {
    map: HashMap<GroupId, LayoutSet>,
}

impl GroupLayouts {
    pub fn insert(&mut self, group: GroupId, set: LayoutSet) { self.map.insert(group, set); }

    pub fn get(&self, group: GroupId) -> Option<&LayoutSet> { self.map.get(&group) }

    pub fn get_mut(&mut self, group: GroupId) -> Option<&mut LayoutSet> { self.map.get_mut(&group) }
}
