use std::rc::Rc;

use log::{debug, warn};
use serde::Serialize;

use wheel_stream::{MenuItem, OpenMenu};

use crate::bridge::{BridgeEvent, HostBridge};
use crate::paginate::{self, Slot, PAGE_CAPACITY};

/// Menu contents as received from the host. Replaced wholesale on every
/// open; mutated in place only by a refresh event.
#[derive(Debug, Clone)]
pub struct MenuPayload {
    pub items: Vec<MenuItem>,
    pub is_sub_menu: bool,
}

#[derive(Debug)]
enum MenuState {
    Closed,
    Open { payload: MenuPayload, page: usize },
}

/// Render-facing view of the controller for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct MenuSnapshot {
    pub visible: bool,
    pub page: usize,
    pub is_sub_menu: bool,
    pub slots: Vec<Slot>,
}

/// Owns the menu payload, page number and visibility flag. The host never
/// touches this state directly: inbound `open`/`refresh` events and local
/// clicks are the only mutation entry points. Holds no back-stack; "back"
/// is delegated to the host, which answers with a fresh open event.
pub struct MenuController {
    bridge: Rc<dyn HostBridge>,
    state: MenuState,
    visible: bool,
    events: Vec<String>,
}

impl MenuController {
    pub fn new(bridge: Rc<dyn HostBridge>) -> Self {
        Self {
            bridge,
            state: MenuState::Closed,
            visible: false,
            events: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open { .. })
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Ordered trail of observable actions since the last drain.
    pub fn drain_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }

    fn log_event(&mut self, event: impl Into<String>) {
        let event = event.into();
        debug!("{event}");
        self.events.push(event);
    }

    /// Inbound host events, applied strictly in receipt order.
    pub fn handle_event(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Open(body) => self.receive_open(body),
            BridgeEvent::Refresh(items) => self.receive_refresh(items),
        }
    }

    fn receive_open(&mut self, body: Option<OpenMenu>) {
        let Some(body) = body else {
            if self.is_open() {
                self.log_event("menu.close forced");
            }
            self.state = MenuState::Closed;
            self.visible = false;
            return;
        };

        let page = body
            .option
            .as_deref()
            .map(|option| paginate::deep_link_page(&body.items, option, PAGE_CAPACITY))
            .unwrap_or(1);
        self.log_event(format!(
            "menu.open items={} sub={} page={}",
            body.items.len(),
            body.sub,
            page
        ));
        self.state = MenuState::Open {
            payload: MenuPayload {
                items: body.items,
                is_sub_menu: body.sub,
            },
            page,
        };
        self.visible = true;
    }

    /// Replaces the item list in place, preserving the page number and the
    /// sub-menu flag. Deliberately no page clamping: shrinking the list
    /// below the current page is the host's bug to surface, and clamping
    /// here would shift the click-index mapping the host relies on.
    fn receive_refresh(&mut self, items: Vec<MenuItem>) {
        let MenuState::Open { payload, page } = &mut self.state else {
            warn!("refresh ignored while closed");
            return;
        };
        let page = *page;
        let count = items.len();
        let pages = paginate::page_count(count, PAGE_CAPACITY);
        payload.items = items;

        if page > pages {
            warn!("refresh left page {page} past the new last page {pages}");
            self.log_event(format!("menu.refresh page_out_of_range page={page}"));
        }
        self.log_event(format!("menu.refresh items={count}"));
    }

    /// Click on the sector at `visible_index` within the current page.
    /// The More slot turns into a page transition; a real slot reports its
    /// absolute index and leaves local state alone (the host decides what
    /// happens next).
    pub fn click_sector(&mut self, visible_index: usize) {
        if !self.visible {
            warn!("sector click ignored while hidden");
            return;
        }
        let (view, page) = match &self.state {
            MenuState::Open { payload, page } => {
                (paginate::paginate(&payload.items, *page, PAGE_CAPACITY), *page)
            }
            MenuState::Closed => return,
        };
        match view.slots.get(visible_index) {
            Some(Slot::More) => self.transition_page(1),
            Some(Slot::Item { index, .. }) => {
                let index = *index;
                self.bridge.item_clicked(index);
                self.log_event(format!("menu.click index={index}"));
            }
            None => {
                // Stale page racing a refresh: report best effort and let
                // the host discard the index.
                let index = paginate::page_offset(page, PAGE_CAPACITY) + visible_index;
                warn!("sector click out of range, reporting index {index}");
                self.bridge.item_clicked(index);
                self.log_event(format!("menu.click out_of_range index={index}"));
            }
        }
    }

    /// Click on the center control: previous page when past page 1, back
    /// to the parent for a sub-menu, otherwise close.
    pub fn click_center(&mut self) {
        if !self.visible {
            warn!("center click ignored while hidden");
            return;
        }
        let (page, is_sub_menu) = match &self.state {
            MenuState::Open { payload, page } => (*page, payload.is_sub_menu),
            MenuState::Closed => return,
        };

        if page > 1 {
            self.transition_page(-1);
        } else if is_sub_menu {
            self.bridge.back();
            self.log_event("menu.back");
        } else {
            self.bridge.close();
            self.log_event("menu.close");
            self.state = MenuState::Closed;
            self.visible = false;
        }
    }

    /// Acknowledged page change. The wheel is hidden before the blocking
    /// handshake and re-shown after it, so no frame renders sectors the
    /// host has not confirmed yet. A refused ack leaves the page as-is.
    fn transition_page(&mut self, delta: isize) {
        self.visible = false;
        let ready = self.bridge.request_transition();
        let page = match &mut self.state {
            MenuState::Open { page, .. } => {
                if ready {
                    *page = page.saturating_add_signed(delta).max(1);
                }
                Some(*page)
            }
            MenuState::Closed => None,
        };
        if let Some(page) = page {
            self.visible = true;
            self.log_event(format!("menu.page ack={ready} page={page}"));
        }
    }

    pub fn snapshot(&self) -> Option<MenuSnapshot> {
        let MenuState::Open { payload, page } = &self.state else {
            return None;
        };
        let view = paginate::paginate(&payload.items, *page, PAGE_CAPACITY);
        Some(MenuSnapshot {
            visible: self.visible,
            page: *page,
            is_sub_menu: payload.is_sub_menu,
            slots: view.slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeCall, RecordingBridge};

    fn items(count: usize) -> Vec<MenuItem> {
        (0..count)
            .map(|index| MenuItem {
                icon: "circle".to_string(),
                label: format!("entry {index}"),
                menu: None,
            })
            .collect()
    }

    fn open_event(count: usize, sub: bool) -> BridgeEvent {
        BridgeEvent::Open(Some(OpenMenu {
            items: items(count),
            sub,
            option: None,
        }))
    }

    fn controller(bridge: &RecordingBridge) -> MenuController {
        MenuController::new(Rc::new(bridge.clone()))
    }

    #[test]
    fn open_then_forced_close() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        assert!(menu.snapshot().is_none());

        menu.handle_event(open_event(4, false));
        assert!(menu.is_visible());
        assert_eq!(menu.snapshot().expect("snapshot").slots.len(), 4);

        menu.handle_event(BridgeEvent::Open(None));
        assert!(!menu.is_open());
        assert!(!menu.is_visible());
        assert!(bridge.calls().is_empty());
    }

    #[test]
    fn more_click_walks_twenty_items_across_three_pages() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, false));

        let first = menu.snapshot().expect("page 1");
        assert_eq!(first.page, 1);
        assert_eq!(first.slots.len(), 8);
        assert!(first.slots[7].is_more());

        menu.click_sector(7);
        let second = menu.snapshot().expect("page 2");
        assert_eq!(second.page, 2);
        assert!(second.slots[7].is_more());

        menu.click_sector(7);
        let third = menu.snapshot().expect("page 3");
        assert_eq!(third.page, 3);
        assert_eq!(third.slots.len(), 6);
        assert!(!third.slots.iter().any(Slot::is_more));

        assert_eq!(
            bridge.calls(),
            vec![
                BridgeCall::Transition { ready: true },
                BridgeCall::Transition { ready: true },
            ]
        );
    }

    #[test]
    fn refused_transition_keeps_the_page_and_stays_visible() {
        let bridge = RecordingBridge::with_acks([false]);
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, false));

        menu.click_sector(7);
        let snapshot = menu.snapshot().expect("snapshot");
        assert_eq!(snapshot.page, 1);
        assert!(snapshot.visible);
        assert_eq!(bridge.calls(), vec![BridgeCall::Transition { ready: false }]);
    }

    #[test]
    fn clicks_report_absolute_indices_past_page_one() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, false));
        menu.click_sector(7);

        // Page 2, visible slot 2 is item 7 + 2 = 9 of the full list.
        menu.click_sector(2);
        assert_eq!(
            bridge.calls(),
            vec![
                BridgeCall::Transition { ready: true },
                BridgeCall::ItemClicked { index: 9 },
            ]
        );
        assert_eq!(menu.snapshot().expect("snapshot").page, 2);
    }

    #[test]
    fn deep_link_opens_on_the_named_page() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        let mut list = items(12);
        list[9].menu = Some("garage".to_string());
        menu.handle_event(BridgeEvent::Open(Some(OpenMenu {
            items: list,
            sub: false,
            option: Some("garage".to_string()),
        })));
        assert_eq!(menu.snapshot().expect("snapshot").page, 2);
    }

    #[test]
    fn center_click_closes_a_root_menu_and_backs_out_of_a_sub_menu() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);

        menu.handle_event(open_event(4, false));
        menu.click_center();
        assert!(!menu.is_open());
        assert_eq!(bridge.calls(), vec![BridgeCall::Close]);

        menu.handle_event(open_event(4, true));
        menu.click_center();
        assert!(menu.is_open(), "back leaves the menu open for the host");
        assert_eq!(bridge.calls(), vec![BridgeCall::Close, BridgeCall::Back]);
    }

    #[test]
    fn center_click_retreats_before_anything_else() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, true));
        menu.click_sector(7);
        assert_eq!(menu.snapshot().expect("snapshot").page, 2);

        menu.click_center();
        let snapshot = menu.snapshot().expect("snapshot");
        assert_eq!(snapshot.page, 1);
        assert_eq!(
            bridge.calls(),
            vec![
                BridgeCall::Transition { ready: true },
                BridgeCall::Transition { ready: true },
            ]
        );
    }

    #[test]
    fn refresh_replaces_items_without_touching_page_or_flag() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, true));
        menu.click_sector(7);

        menu.handle_event(BridgeEvent::Refresh(items(3)));
        let snapshot = menu.snapshot().expect("snapshot");
        assert_eq!(snapshot.page, 2, "no auto-clamp on shrink");
        assert!(snapshot.is_sub_menu);
        // A list that fits on one page ignores the stale page number.
        assert_eq!(snapshot.slots.len(), 3);
        assert!(menu
            .drain_events()
            .iter()
            .any(|event| event.starts_with("menu.refresh page_out_of_range")));
    }

    #[test]
    fn refresh_shrink_below_a_deep_page_keeps_the_menu_open() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, false));
        menu.click_sector(7);
        menu.click_sector(7);
        assert_eq!(menu.snapshot().expect("snapshot").page, 3);

        // Still more than one page of items, but page 3 now starts past
        // the end of the list.
        menu.handle_event(BridgeEvent::Refresh(items(9)));
        let snapshot = menu.snapshot().expect("still open");
        assert_eq!(snapshot.page, 3, "no auto-clamp on shrink");
        assert!(snapshot.slots.is_empty());
        assert!(menu.is_visible());

        // Clicks on the empty page still report best effort.
        menu.click_sector(0);
        assert_eq!(
            bridge.calls().last(),
            Some(&BridgeCall::ItemClicked { index: 14 })
        );
    }

    #[test]
    fn out_of_range_click_reports_best_effort_index() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.handle_event(open_event(20, false));
        menu.click_sector(7);
        menu.handle_event(BridgeEvent::Refresh(items(3)));

        menu.click_sector(4);
        assert_eq!(
            bridge.calls(),
            vec![
                BridgeCall::Transition { ready: true },
                BridgeCall::ItemClicked { index: 11 },
            ]
        );
    }

    #[test]
    fn clicks_are_ignored_while_closed() {
        let bridge = RecordingBridge::new();
        let mut menu = controller(&bridge);
        menu.click_sector(0);
        menu.click_center();
        assert!(bridge.calls().is_empty());
    }
}
