use tracing::{debug, trace};

use crate::common::collections::HashMap;
use crate::common::error::{Result, WmError};
use crate::model::GroupId;
use crate::model::rules::FloatRules;
use crate::model::window::{ManagedWindow, WindowId, WindowInfo, WindowState};
use crate::sys::geometry::{Point, Rect, Size};

/// A single attribute update applied through [`WindowRegistry::set_attr`].
#[derive(Debug, Clone, PartialEq)]
pub enum WindowAttr {
    Frame(Rect),
    FloatFrame(Option<Rect>),
    State(WindowState),
    Group(GroupId),
    Title(Option<String>),
    Class(Option<String>),
    Urgent(bool),
    FixedSize(Option<Size>),
}

/// All live windows, keyed by the handle the compositor gave them.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<WindowId, ManagedWindow>,
    next_stack_index: u64,
}

impl WindowRegistry {
    pub fn new() -> Self { Self::default() }

    /// Start tracking a window. The float rules decide the initial state.
    pub fn register(
        &mut self,
        id: WindowId,
        info: WindowInfo,
        group: GroupId,
        rules: &FloatRules,
    ) -> Result<&ManagedWindow> {
        if self.windows.contains_key(&id) {
            return Err(WmError::DuplicateHandle(id));
        }
        let floating = rules.should_float(&info);
        let mut window = ManagedWindow::new(id, info, group);
        if floating {
            window.state = WindowState::Floating;
            window.float_frame = Some(window.frame);
        }
        window.stack_index = self.bump_stack();
        debug!(?id, class = ?window.class, floating, "registered window");
        Ok(self.windows.entry(id).or_insert(window))
    }

    pub fn unregister(&mut self, id: WindowId) -> Result<ManagedWindow> {
        self.windows.remove(&id).ok_or(WmError::UnknownHandle(id))
    }

    pub fn set_attr(&mut self, id: WindowId, attr: WindowAttr) -> Result<()> {
        let window = self.windows.get_mut(&id).ok_or(WmError::UnknownHandle(id))?;
        trace!(?id, ?attr, "set_attr");
        match attr {
            WindowAttr::Frame(frame) => window.frame = frame,
            WindowAttr::FloatFrame(frame) => window.float_frame = frame,
            WindowAttr::State(state) => window.state = state,
            WindowAttr::Group(group) => window.group = group,
            WindowAttr::Title(title) => window.title = title,
            WindowAttr::Class(class) => window.class = class,
            WindowAttr::Urgent(urgent) => window.urgent = urgent,
            WindowAttr::FixedSize(size) => window.fixed_size = size,
        }
        Ok(())
    }

    pub fn get(&self, id: WindowId) -> Result<&ManagedWindow> {
        self.windows.get(&id).ok_or(WmError::UnknownHandle(id))
    }

    pub fn get_mut(&mut self, id: WindowId) -> Result<&mut ManagedWindow> {
        self.windows.get_mut(&id).ok_or(WmError::UnknownHandle(id))
    }

    pub fn contains(&self, id: WindowId) -> bool { self.windows.contains_key(&id) }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    /// Windows matching `pred`, ordered by handle so results are stable.
    pub fn query(&self, pred: impl Fn(&ManagedWindow) -> bool) -> Vec<&ManagedWindow> {
        let mut out: Vec<_> = self.windows.values().filter(|w| pred(w)).collect();
        out.sort_by_key(|w| w.id);
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedWindow> { self.windows.values() }

    /// Put the window on top of the stacking order.
    pub fn raise(&mut self, id: WindowId) -> Result<()> {
        let index = self.bump_stack();
        self.get_mut(id)?.stack_index = index;
        Ok(())
    }

    /// Bottom-to-top stacking order of `ids`. With `floats_kept_above`,
    /// floating and fullscreen windows always sit above tiled ones.
    pub fn stacking_order(&self, ids: &[WindowId], floats_kept_above: bool) -> Vec<WindowId> {
        let mut windows: Vec<&ManagedWindow> =
            ids.iter().filter_map(|id| self.windows.get(id)).collect();
        windows.sort_by_key(|w| {
            let layer = if floats_kept_above {
                match w.state {
                    WindowState::Normal => 0,
                    WindowState::Floating => 1,
                    WindowState::Fullscreen { .. } => 2,
                    WindowState::Minimized { .. } => 0,
                }
            } else {
                0
            };
            (layer, w.stack_index)
        });
        windows.into_iter().map(|w| w.id).collect()
    }

    /// The topmost visible window under `point`, if any.
    pub fn window_at(
        &self,
        ids: &[WindowId],
        point: Point,
        floats_kept_above: bool,
    ) -> Option<WindowId> {
        self.stacking_order(ids, floats_kept_above).into_iter().rev().find(|id| {
            self.windows
                .get(id)
                .is_some_and(|w| !w.state.is_minimized() && w.frame.contains(point))
        })
    }

    fn bump_stack(&mut self) -> u64 {
        self.next_stack_index += 1;
        self.next_stack_index
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::model::rules::{FloatRule, WindowMatch};

    fn group() -> GroupId {
        let mut map: SlotMap<GroupId, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn info(class: &str) -> WindowInfo {
        WindowInfo {
            class: Some(class.into()),
            frame: Rect::new(10, 10, 300, 200),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = WindowRegistry::new();
        let g = group();
        let rules = FloatRules::default();
        reg.register(WindowId::new(1), info("a"), g, &rules).unwrap();
        let err = reg.register(WindowId::new(1), info("a"), g, &rules).unwrap_err();
        assert!(matches!(err, WmError::DuplicateHandle(id) if id == WindowId::new(1)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_handles_report_errors() {
        let mut reg = WindowRegistry::new();
        let id = WindowId::new(7);
        assert!(matches!(reg.unregister(id), Err(WmError::UnknownHandle(_))));
        assert!(matches!(
            reg.set_attr(id, WindowAttr::Urgent(true)),
            Err(WmError::UnknownHandle(_))
        ));
    }

    #[test]
    fn float_rules_pick_initial_state() {
        let mut reg = WindowRegistry::new();
        let rules = FloatRules::new(false, &[FloatRule::float(WindowMatch::class("pinentry"))]);
        let g = group();
        let w = reg.register(WindowId::new(1), info("pinentry"), g, &rules).unwrap();
        assert!(w.state.is_floating());
        assert_eq!(w.float_frame, Some(Rect::new(10, 10, 300, 200)));
        let w = reg.register(WindowId::new(2), info("term"), g, &rules).unwrap();
        assert!(w.state.is_tiled());
    }

    #[test]
    fn query_and_stacking() {
        let mut reg = WindowRegistry::new();
        let g = group();
        let rules = FloatRules::default();
        for i in 1..=3 {
            reg.register(WindowId::new(i), info("x"), g, &rules).unwrap();
        }
        reg.set_attr(WindowId::new(1), WindowAttr::State(WindowState::Floating)).unwrap();
        reg.raise(WindowId::new(2)).unwrap();

        let ids: Vec<_> = (1..=3).map(WindowId::new).collect();
        assert_eq!(
            reg.stacking_order(&ids, true),
            vec![WindowId::new(3), WindowId::new(2), WindowId::new(1)]
        );
        assert_eq!(
            reg.stacking_order(&ids, false),
            vec![WindowId::new(1), WindowId::new(3), WindowId::new(2)]
        );

        let floating = reg.query(|w| w.state.is_floating());
        assert_eq!(floating.len(), 1);
        assert_eq!(floating[0].id, WindowId::new(1));
    }
}
