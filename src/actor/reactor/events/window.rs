use tracing::{debug, trace, warn};

use crate::actor::reactor::Reactor;
use crate::common::config::ActivationPolicy;
use crate::common::error::Result;
use crate::layout_engine::Placement;
use crate::model::{Refusal, WindowAttr, WindowId, WindowInfo, WindowState};
use crate::sys::geometry::Rect;

/// Identical refusals of one configure request before the client's size is
/// kept.
const PIN_AFTER_REFUSALS: u32 = 2;

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_window_mapped(reactor: &mut Reactor, id: WindowId, info: WindowInfo) -> Result<()> {
        if reactor.registry.contains(id) {
            warn!(%id, "window mapped twice; ignoring");
            return Ok(());
        }
        // Transients open next to their parent.
        let group = info
            .transient_for
            .and_then(|parent| reactor.groups.group_of(parent))
            .or_else(|| reactor.current_group())
            .or_else(|| reactor.groups.group_ids().first().copied());
        let Some(group) = group else {
            warn!(%id, "no group to put the window in");
            return Ok(());
        };

        let wants_fullscreen = info.wants_fullscreen;
        reactor.registry.register(id, info, group, &reactor.config.float_rules)?;
        reactor.groups.add_window(group, id)?;
        if wants_fullscreen && reactor.config.settings.auto_fullscreen {
            reactor.registry.get_mut(id)?.state.toggle_fullscreen();
        }
        reactor.sync_layout_membership(id);

        if reactor.groups.is_visible(group) {
            reactor.focus_window(id);
        }
        Ok(())
    }

    pub fn handle_window_unmapped(reactor: &mut Reactor, id: WindowId) -> Result<()> {
        let window = reactor.registry.unregister(id)?;
        reactor.groups.remove_window(id);
        if let Some(set) = reactor.layouts.get_mut(window.group) {
            set.remove_window(id);
        }
        reactor.sent_placements.remove(&id);
        reactor.minimized.retain(|w| *w != id);
        if reactor.drag.is_some_and(|d| d.window == id) {
            reactor.drag = None;
        }
        if reactor.focused == Some(id) {
            reactor.focused = None;
            reactor.refocus();
        }
        Ok(())
    }

    /// The compositor reports the geometry a window really has. A tiled
    /// window that answers the same request with the same other size
    /// `PIN_AFTER_REFUSALS` times keeps that size until it takes the tile
    /// size or is rearranged.
    pub fn handle_window_configured(reactor: &mut Reactor, id: WindowId, frame: Rect) -> Result<()> {
        let requested = reactor.sent_placements.get(&id).and_then(Placement::frame);
        let tile = reactor.tile_frame(id);
        let window = reactor.registry.get_mut(id)?;
        match window.state {
            WindowState::Normal => {
                let got = frame.size();
                if tile.is_some_and(|t| t.size() == got) {
                    if window.fixed_size.take().is_some() {
                        debug!(%id, "client took the tile size; unpinned");
                    }
                    window.refused = None;
                } else if let Some(requested) = requested.map(|r| r.size()) {
                    if requested == got {
                        window.refused = None;
                    } else {
                        let refusal = Refusal::next(window.refused, requested, got);
                        if refusal.count >= PIN_AFTER_REFUSALS {
                            debug!(%id, ?requested, ?got, "size refused repeatedly; pinning");
                            window.fixed_size = Some(got);
                            window.refused = None;
                        } else {
                            trace!(%id, ?requested, ?got, "size refused");
                            window.refused = Some(refusal);
                        }
                    }
                }
            }
            WindowState::Floating => window.float_frame = Some(frame),
            _ => {}
        }
        window.frame = frame;
        Ok(())
    }

    pub fn handle_title_changed(
        reactor: &mut Reactor,
        id: WindowId,
        title: Option<String>,
    ) -> Result<()> {
        reactor.registry.set_attr(id, WindowAttr::Title(title))
    }

    pub fn handle_activation_requested(reactor: &mut Reactor, id: WindowId) -> Result<()> {
        let group = reactor.registry.get(id)?.group;
        let visible = reactor.groups.is_visible(group);
        match reactor.config.settings.focus_on_window_activation {
            ActivationPolicy::Focus => {
                if !visible {
                    let screen = reactor.groups.focused_screen();
                    reactor.groups.switch_to(screen, group)?;
                }
                Self::restore(reactor, id)?;
                reactor.focus_window(id);
            }
            ActivationPolicy::Smart if visible => {
                Self::restore(reactor, id)?;
                reactor.focus_window(id);
            }
            ActivationPolicy::Smart | ActivationPolicy::Urgent => {
                if reactor.focused != Some(id) {
                    reactor.registry.set_attr(id, WindowAttr::Urgent(true))?;
                }
            }
            ActivationPolicy::Never => debug!(%id, "activation request ignored"),
        }
        Ok(())
    }

    pub fn handle_fullscreen_requested(
        reactor: &mut Reactor,
        id: WindowId,
        fullscreen: bool,
    ) -> Result<()> {
        if !reactor.config.settings.auto_fullscreen {
            debug!(%id, "fullscreen request ignored");
            return Ok(());
        }
        let window = reactor.registry.get_mut(id)?;
        if window.state.is_fullscreen() != fullscreen && window.state.toggle_fullscreen() {
            reactor.sync_layout_membership(id);
        }
        Ok(())
    }

    pub fn handle_minimize_requested(reactor: &mut Reactor, id: WindowId) -> Result<()> {
        Self::minimize(reactor, id)
    }

    pub fn minimize(reactor: &mut Reactor, id: WindowId) -> Result<()> {
        if !reactor.registry.get_mut(id)?.state.minimize() {
            return Ok(());
        }
        reactor.minimized.retain(|w| *w != id);
        reactor.minimized.insert(0, id);
        reactor.sync_layout_membership(id);
        if reactor.focused == Some(id) {
            reactor.focused = None;
            reactor.refocus();
        }
        Ok(())
    }

    /// Undo a minimize; does nothing for windows that are not minimized.
    pub fn restore(reactor: &mut Reactor, id: WindowId) -> Result<()> {
        if !reactor.registry.get_mut(id)?.state.restore() {
            return Ok(());
        }
        reactor.minimized.retain(|w| *w != id);
        reactor.sync_layout_membership(id);
        Ok(())
    }
}
