use tracing::{debug, info, warn};

use crate::actor::broadcast::BroadcastEvent;
use crate::actor::reactor::Reactor;
use crate::model::ScreenSpec;

pub struct SystemEventHandler;

impl SystemEventHandler {
    pub fn handle_screens_changed(reactor: &mut Reactor, screens: Vec<ScreenSpec>) {
        let first = reactor.groups.screens().is_empty();
        if !first && !reactor.config.settings.reconfigure_screens {
            info!("screen change ignored; reconfigure_screens is off");
            return;
        }
        let changes = reactor.groups.reconfigure_screens(&screens);
        debug!(screens = ?changes.screens, "screens reconfigured");
        reactor.refocus();
    }

    pub fn handle_work_completed(reactor: &mut Reactor) {
        for completion in reactor.workers.drain() {
            debug!(?completion, "work completed");
            if let Some(error) = completion.into_error() {
                reactor.report(error);
            }
        }
    }

    /// Swap in the staged config generation and apply it in the same step:
    /// config, bindings and layouts change together.
    pub fn handle_config_reloaded(reactor: &mut Reactor) {
        let Some(state) = reactor.live.apply_staged() else {
            debug!("no staged config to apply");
            return;
        };
        reactor.config = state.config.clone();
        reactor.dispatcher.set_bindings(state.bindings.clone());
        let labels: Vec<&str> = reactor.groups.groups().map(|(_, g)| g.label.as_str()).collect();
        let configured: Vec<&str> = reactor.config.groups.iter().map(|g| g.name.as_str()).collect();
        if labels != configured {
            warn!("group labels changed; the new groups take effect after a restart");
        }
        reactor.groups.set_reserved(reactor.config.settings.bar.reservation());
        reactor.rebuild_layouts();
        reactor.broadcast(BroadcastEvent::ConfigReloaded);
    }

    pub fn handle_config_failed(reactor: &mut Reactor, message: String) {
        warn!("config not applied: {message}");
        reactor.broadcast(BroadcastEvent::ConfigError { message });
    }
}
