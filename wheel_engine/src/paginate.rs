use serde::Serialize;

use wheel_stream::MenuItem;

/// Maximum number of sectors drawn on one page, synthetic More slot
/// included.
pub const PAGE_CAPACITY: usize = 8;

/// One visible sector slot. Real slots keep the absolute index into the
/// full unpaginated item list so clicks report host-side identities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    Item { index: usize, item: MenuItem },
    More,
}

impl Slot {
    pub fn is_more(&self) -> bool {
        matches!(self, Slot::More)
    }
}

/// Window over the item list for one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub slots: Vec<Slot>,
    pub has_more: bool,
}

/// Real items carried by every page once the list spills over a single
/// page: the final slot of each non-terminal page is reserved for the
/// More marker.
fn per_page(capacity: usize) -> usize {
    capacity.saturating_sub(1).max(1)
}

/// Absolute index of the first item shown on `page`.
pub fn page_offset(page: usize, capacity: usize) -> usize {
    page.saturating_sub(1) * per_page(capacity)
}

pub fn page_count(len: usize, capacity: usize) -> usize {
    if len <= capacity {
        1
    } else {
        len.div_ceil(per_page(capacity))
    }
}

/// Computes the visible slice for `page`. Pages past the last one are a
/// caller error; the state machine never requests them and no clamping
/// happens here.
pub fn paginate(items: &[MenuItem], page: usize, capacity: usize) -> PageView {
    if items.len() <= capacity {
        return PageView {
            slots: items
                .iter()
                .enumerate()
                .map(|(index, item)| Slot::Item {
                    index,
                    item: item.clone(),
                })
                .collect(),
            has_more: false,
        };
    }

    // A stale page left behind by a shrinking refresh may start past the
    // end of the list; it renders empty rather than panicking. The page
    // number itself is never clamped here.
    let offset = page_offset(page, capacity).min(items.len());
    let end = (offset + per_page(capacity)).min(items.len());
    let has_more = end < items.len();

    let mut slots: Vec<Slot> = items[offset..end]
        .iter()
        .enumerate()
        .map(|(position, item)| Slot::Item {
            index: offset + position,
            item: item.clone(),
        })
        .collect();
    if has_more {
        slots.push(Slot::More);
    }

    PageView { slots, has_more }
}

/// Deep-link resolution: the page holding the first item whose `menu`
/// field names `option`. Falls back to page 1 when the option is absent
/// or the whole list fits on one page.
pub fn deep_link_page(items: &[MenuItem], option: &str, capacity: usize) -> usize {
    if items.len() <= capacity {
        return 1;
    }
    items
        .iter()
        .position(|item| item.menu.as_deref() == Some(option))
        .map(|index| index / per_page(capacity) + 1)
        .unwrap_or(1)
}
