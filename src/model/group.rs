use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;
use tracing::{debug, warn};

use crate::common::collections::HashMap;
use crate::model::screen::{Screen, ScreenId, ScreenSpec};
use crate::model::window::WindowId;
use crate::sys::geometry::Insets;

new_key_type! {
    pub struct GroupId;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("no group labelled `{0}`")]
    UnknownLabel(String),
    #[error("invalid group id {0:?}")]
    InvalidGroup(GroupId),
    #[error("screen index {0} out of range")]
    InvalidScreen(usize),
    #[error("window {0} is not in any group")]
    NotAMember(WindowId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    /// Insertion order; doubles as tab order.
    windows: Vec<WindowId>,
    last_focused: Option<WindowId>,
}

impl Group {
    fn new(label: String) -> Self {
        Self {
            label,
            windows: Vec::new(),
            last_focused: None,
        }
    }

    pub fn windows(&self) -> &[WindowId] { &self.windows }

    pub fn contains(&self, id: WindowId) -> bool { self.windows.contains(&id) }

    pub fn last_focused(&self) -> Option<WindowId> { self.last_focused }

    fn remove(&mut self, id: WindowId) -> bool {
        if self.last_focused == Some(id) {
            self.last_focused = None;
        }
        let before = self.windows.len();
        self.windows.retain(|w| *w != id);
        before != self.windows.len()
    }
}

/// Screens touched by an operation; the caller re-lays these out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScreenChanges {
    pub screens: Vec<usize>,
}

impl ScreenChanges {
    fn touch(&mut self, idx: usize) {
        if !self.screens.contains(&idx) {
            self.screens.push(idx);
        }
    }

    pub fn is_empty(&self) -> bool { self.screens.is_empty() }
}

/// Groups (virtual desktops) and the screens that show them.
///
/// The screen list is the single source of truth for which group is visible
/// where; every mutation keeps each group on at most one screen.
#[derive(Debug)]
pub struct GroupManager {
    groups: SlotMap<GroupId, Group>,
    order: Vec<GroupId>,
    screens: Vec<Screen>,
    focused_screen: usize,
    window_to_group: HashMap<WindowId, GroupId>,
    reserved: Insets,
}

impl GroupManager {
    pub fn new(labels: &[String], outputs: &[ScreenSpec], reserved: Insets) -> Self {
        let mut groups = SlotMap::with_key();
        let order = labels.iter().map(|l| groups.insert(Group::new(l.clone()))).collect();
        let mut manager = Self {
            groups,
            order,
            screens: Vec::new(),
            focused_screen: 0,
            window_to_group: HashMap::default(),
            reserved,
        };
        manager.reconfigure_screens(outputs);
        manager
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.order.iter().map(|id| (*id, &self.groups[*id]))
    }

    pub fn group_ids(&self) -> &[GroupId] { &self.order }

    pub fn group(&self, id: GroupId) -> Result<&Group, GroupError> {
        self.groups.get(id).ok_or(GroupError::InvalidGroup(id))
    }

    pub fn group_by_label(&self, label: &str) -> Result<GroupId, GroupError> {
        self.order
            .iter()
            .copied()
            .find(|id| self.groups[*id].label == label)
            .ok_or_else(|| GroupError::UnknownLabel(label.to_string()))
    }

    pub fn label(&self, id: GroupId) -> &str {
        self.groups.get(id).map(|g| g.label.as_str()).unwrap_or("")
    }

    pub fn screens(&self) -> &[Screen] { &self.screens }

    pub fn screen(&self, idx: usize) -> Option<&Screen> { self.screens.get(idx) }

    pub fn focused_screen(&self) -> usize { self.focused_screen }

    pub fn set_focused_screen(&mut self, idx: usize) -> Result<(), GroupError> {
        if idx >= self.screens.len() {
            return Err(GroupError::InvalidScreen(idx));
        }
        self.focused_screen = idx;
        Ok(())
    }

    pub fn focused_group(&self) -> Option<GroupId> {
        self.screens.get(self.focused_screen).and_then(|s| s.group)
    }

    pub fn screen_of(&self, group: GroupId) -> Option<usize> {
        self.screens.iter().position(|s| s.group == Some(group))
    }

    pub fn is_visible(&self, group: GroupId) -> bool { self.screen_of(group).is_some() }

    pub fn group_of(&self, window: WindowId) -> Option<GroupId> {
        self.window_to_group.get(&window).copied()
    }

    pub fn add_window(&mut self, group: GroupId, window: WindowId) -> Result<(), GroupError> {
        if !self.groups.contains_key(group) {
            return Err(GroupError::InvalidGroup(group));
        }
        match self.window_to_group.insert(window, group) {
            Some(prev) if prev == group => return Ok(()),
            Some(prev) => {
                debug_assert!(false, "window {window} was already in another group");
                warn!(%window, "window was in another group; moving it");
                if let Some(g) = self.groups.get_mut(prev) {
                    g.remove(window);
                }
            }
            None => {}
        }
        self.groups[group].windows.push(window);
        Ok(())
    }

    pub fn remove_window(&mut self, window: WindowId) -> Option<GroupId> {
        let group = self.window_to_group.remove(&window)?;
        if let Some(g) = self.groups.get_mut(group) {
            g.remove(window);
        }
        Some(group)
    }

    pub fn set_last_focused(&mut self, window: WindowId) {
        if let Some(group) = self.group_of(window) {
            self.groups[group].last_focused = Some(window);
        }
    }

    /// Show `group` on screen `screen_idx`. If another screen is already
    /// showing it, that screen takes over the target screen's previous group.
    pub fn switch_to(
        &mut self,
        screen_idx: usize,
        group: GroupId,
    ) -> Result<ScreenChanges, GroupError> {
        if !self.groups.contains_key(group) {
            return Err(GroupError::InvalidGroup(group));
        }
        if screen_idx >= self.screens.len() {
            return Err(GroupError::InvalidScreen(screen_idx));
        }
        let mut changes = ScreenChanges::default();
        if self.screens[screen_idx].group == Some(group) {
            return Ok(changes);
        }
        let previous = self.screens[screen_idx].group;
        if let Some(other) = self.screen_of(group) {
            self.screens[other].group = previous;
            changes.touch(other);
        }
        self.screens[screen_idx].group = Some(group);
        changes.touch(screen_idx);
        debug!(screen = screen_idx, group = self.label(group), "switched group");
        self.check_invariants();
        Ok(changes)
    }

    /// Move a window to `target`. With `follow`, the screen that showed the
    /// window's old group (or the focused screen) switches to `target`.
    pub fn move_window(
        &mut self,
        window: WindowId,
        target: GroupId,
        follow: bool,
    ) -> Result<ScreenChanges, GroupError> {
        if !self.groups.contains_key(target) {
            return Err(GroupError::InvalidGroup(target));
        }
        let source = self.group_of(window).ok_or(GroupError::NotAMember(window))?;
        let mut changes = ScreenChanges::default();
        if source != target {
            self.groups[source].remove(window);
            self.groups[target].windows.push(window);
            self.window_to_group.insert(window, target);
            if let Some(idx) = self.screen_of(source) {
                changes.touch(idx);
            }
            if let Some(idx) = self.screen_of(target) {
                changes.touch(idx);
            }
        }
        if follow && !self.screens.is_empty() {
            let screen = self.screen_of(source).unwrap_or(self.focused_screen);
            for idx in self.switch_to(screen, target)?.screens {
                changes.touch(idx);
            }
            self.focused_screen = screen;
        }
        Ok(changes)
    }

    /// Replace the set of outputs. Screens that persist keep their group;
    /// groups orphaned by removed screens go to the first screens without
    /// one, then any screen still empty gets the lowest unassigned group.
    pub fn reconfigure_screens(&mut self, outputs: &[ScreenSpec]) -> ScreenChanges {
        let focused_id = self.screens.get(self.focused_screen).map(|s| s.id);
        let mut old: HashMap<ScreenId, Screen> =
            self.screens.drain(..).map(|s| (s.id, s)).collect();

        let mut screens: Vec<Screen> = outputs
            .iter()
            .map(|spec| {
                let mut screen = Screen::new(*spec, self.reserved);
                if let Some(prev) = old.remove(&spec.id) {
                    screen.group = prev.group;
                }
                screen
            })
            .collect();

        let mut orphans: Vec<(ScreenId, GroupId)> =
            old.into_values().filter_map(|s| Some((s.id, s.group?))).collect();
        orphans.sort_by_key(|(id, _)| *id);
        let mut orphans = orphans.into_iter().map(|(_, g)| g);

        for screen in screens.iter_mut().filter(|s| s.group.is_none()) {
            screen.group = orphans.next();
        }
        for i in 0..screens.len() {
            if screens[i].group.is_some() {
                continue;
            }
            let free = self
                .order
                .iter()
                .copied()
                .find(|g| !screens.iter().any(|s| s.group == Some(*g)));
            screens[i].group = free;
        }

        self.focused_screen = focused_id
            .and_then(|id| screens.iter().position(|s| s.id == id))
            .unwrap_or(0);
        self.screens = screens;
        self.check_invariants();
        debug!(screens = self.screens.len(), "screens reconfigured");
        ScreenChanges {
            screens: (0..self.screens.len()).collect(),
        }
    }

    pub fn set_reserved(&mut self, reserved: Insets) {
        self.reserved = reserved;
        for screen in &mut self.screens {
            screen.reserved = reserved;
        }
    }

    fn check_invariants(&self) {
        if cfg!(debug_assertions) {
            let mut seen = Vec::new();
            for screen in &self.screens {
                if let Some(g) = screen.group {
                    debug_assert!(!seen.contains(&g), "group shown on two screens");
                    seen.push(g);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::geometry::Rect;

    fn labels(n: usize) -> Vec<String> { (1..=n).map(|i| i.to_string()).collect() }

    fn output(id: u32, x: i32) -> ScreenSpec {
        ScreenSpec {
            id: ScreenId::new(id),
            frame: Rect::new(x, 0, 1000, 800),
        }
    }

    fn shown(m: &GroupManager) -> Vec<Option<String>> {
        m.screens().iter().map(|s| s.group.map(|g| m.label(g).to_string())).collect()
    }

    fn assert_unique(m: &GroupManager) {
        let mut seen = Vec::new();
        for s in m.screens() {
            if let Some(g) = s.group {
                assert!(!seen.contains(&g));
                seen.push(g);
            }
        }
    }

    #[test]
    fn startup_assigns_groups_in_order() {
        let m = GroupManager::new(&labels(4), &[output(0, 0), output(1, 1000)], Insets::default());
        assert_eq!(shown(&m), vec![Some("1".into()), Some("2".into())]);
    }

    #[test]
    fn switch_to_same_group_is_noop() {
        let mut m = GroupManager::new(&labels(3), &[output(0, 0)], Insets::default());
        let g1 = m.group_by_label("1").unwrap();
        assert!(m.switch_to(0, g1).unwrap().is_empty());
    }

    #[test]
    fn switch_to_group_on_other_screen_swaps() {
        let mut m = GroupManager::new(&labels(3), &[output(0, 0), output(1, 1000)], Insets::default());
        let g2 = m.group_by_label("2").unwrap();
        let changes = m.switch_to(0, g2).unwrap();
        assert_eq!(shown(&m), vec![Some("2".into()), Some("1".into())]);
        assert_eq!(changes.screens, vec![1, 0]);
        assert_unique(&m);
    }

    #[test]
    fn at_most_one_screen_per_group_after_any_switch() {
        let mut m = GroupManager::new(
            &labels(5),
            &[output(0, 0), output(1, 1000), output(2, 2000)],
            Insets::default(),
        );
        let ids = m.group_ids().to_vec();
        for (step, g) in ids.iter().cycle().take(40).enumerate() {
            m.switch_to(step % 3, *g).unwrap();
            assert_unique(&m);
            assert!(m.screens().iter().all(|s| s.group.is_some()));
        }
    }

    #[test]
    fn move_window_with_follow_switches_source_screen() {
        let mut m = GroupManager::new(&labels(3), &[output(0, 0)], Insets::default());
        let g1 = m.group_by_label("1").unwrap();
        let g3 = m.group_by_label("3").unwrap();
        let w = WindowId::new(1);
        m.add_window(g1, w).unwrap();

        m.move_window(w, g3, false).unwrap();
        assert_eq!(m.group_of(w), Some(g3));
        assert!(!m.group(g1).unwrap().contains(w));
        assert_eq!(m.focused_group(), Some(g1));

        m.move_window(w, g1, false).unwrap();
        m.move_window(w, g3, true).unwrap();
        assert_eq!(m.focused_group(), Some(g3));
    }

    #[test]
    fn move_unknown_window_fails() {
        let mut m = GroupManager::new(&labels(2), &[output(0, 0)], Insets::default());
        let g = m.group_by_label("2").unwrap();
        assert_eq!(
            m.move_window(WindowId::new(9), g, true),
            Err(GroupError::NotAMember(WindowId::new(9)))
        );
    }

    #[test]
    fn reconfigure_keeps_persisting_screens_and_rehomes_orphans() {
        let mut m = GroupManager::new(
            &labels(4),
            &[output(0, 0), output(1, 1000), output(2, 2000)],
            Insets::default(),
        );
        let g4 = m.group_by_label("4").unwrap();
        m.switch_to(2, g4).unwrap();
        assert_eq!(shown(&m), vec![Some("1".into()), Some("2".into()), Some("4".into())]);

        // Screen 1 goes away, a new screen 5 appears.
        m.reconfigure_screens(&[output(0, 0), output(2, 2000), output(5, 3000)]);
        assert_eq!(shown(&m), vec![Some("1".into()), Some("4".into()), Some("2".into())]);

        // Unplug everything but one; then add a screen back.
        m.reconfigure_screens(&[output(2, 2000)]);
        assert_eq!(shown(&m), vec![Some("4".into())]);
        m.reconfigure_screens(&[output(2, 2000), output(7, 1000)]);
        assert_eq!(shown(&m), vec![Some("4".into()), Some("1".into())]);
        assert_unique(&m);
    }

    #[test]
    fn more_screens_than_groups_leaves_extras_empty() {
        let m = GroupManager::new(&labels(1), &[output(0, 0), output(1, 1000)], Insets::default());
        assert_eq!(shown(&m), vec![Some("1".into()), None]);
    }
}
