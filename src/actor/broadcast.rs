use serde::{Deserialize, Serialize};

use crate::common::collections::BTreeMap;

/// What the bar shows for one group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    pub label: String,
    /// Screen index when the group is visible.
    pub screen: Option<usize>,
    pub windows: usize,
    pub urgent: bool,
}

/// Notifications for the bar/widget host. At most one of each kind is sent
/// per committed event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "event")]
pub enum BroadcastEvent {
    GroupsChanged {
        groups: Vec<GroupStatus>,
        focused_screen: usize,
    },
    LayoutChanged {
        group: String,
        layout: String,
    },
    FocusChanged {
        title: Option<String>,
    },
    WindowsChanged {
        group: String,
        windows: Vec<String>,
    },
    ChordChanged {
        chord: Option<String>,
    },
    ExternalActionFailed {
        action: String,
        reason: String,
    },
    ConfigReloaded,
    ConfigError {
        message: String,
    },
}

pub type BroadcastSender = crate::actor::Sender<BroadcastEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<BroadcastEvent>;

/// Everything the bar can see, captured after each event. Broadcasts are the
/// difference between two captures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarState {
    pub groups: Vec<GroupStatus>,
    pub focused_screen: usize,
    /// Current layout name per group label.
    pub layouts: BTreeMap<String, String>,
    pub focused_title: Option<String>,
    /// Window names per visible group label.
    pub windows: BTreeMap<String, Vec<String>>,
    pub chord: Option<String>,
}

impl BarState {
    pub fn diff(&self, next: &BarState) -> Vec<BroadcastEvent> {
        let mut events = Vec::new();
        if self.groups != next.groups || self.focused_screen != next.focused_screen {
            events.push(BroadcastEvent::GroupsChanged {
                groups: next.groups.clone(),
                focused_screen: next.focused_screen,
            });
        }
        for (group, layout) in &next.layouts {
            if self.layouts.get(group) != Some(layout) {
                events.push(BroadcastEvent::LayoutChanged {
                    group: group.clone(),
                    layout: layout.clone(),
                });
            }
        }
        if self.focused_title != next.focused_title {
            events.push(BroadcastEvent::FocusChanged {
                title: next.focused_title.clone(),
            });
        }
        for (group, windows) in &next.windows {
            if self.windows.get(group) != Some(windows) {
                events.push(BroadcastEvent::WindowsChanged {
                    group: group.clone(),
                    windows: windows.clone(),
                });
            }
        }
        if self.chord != next.chord {
            events.push(BroadcastEvent::ChordChanged { chord: next.chord.clone() });
        }
        events
    }
}
