use std::fmt;

use serde::{Serialize, Serializer};

pub const DEFAULT_MAX_SHOWN: usize = 7;
pub const MIN_MAX_SHOWN: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageIndicator {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageIndicator::Page(n) => write!(f, "{n}"),
            PageIndicator::Ellipsis => f.write_str("..."),
        }
    }
}

// Pages serialize as numbers and the ellipsis as the "..." string.
impl Serialize for PageIndicator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PageIndicator::Page(n) => serializer.serialize_u64(*n as u64),
            PageIndicator::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// Computes which page numbers to show for `current` out of `total` pages.
///
/// Page 1 and the last page are always present. Between them sits a window
/// around `current`; gaps between the anchors and the window are collapsed
/// into a single ellipsis. Near either edge the window is pinned so the
/// visible run stays `max_shown - 2` pages long.
pub fn page_range(current: usize, total: usize, max_shown: usize) -> Vec<PageIndicator> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let max_shown = max_shown.max(MIN_MAX_SHOWN);

    if total <= max_shown {
        return (1..=total).map(PageIndicator::Page).collect();
    }

    let side = (max_shown - 3) / 2;
    let mut left = current.saturating_sub(side).max(2);
    let mut right = current.saturating_add(side).min(total - 1);
    if current - 1 <= side {
        left = 2;
        right = max_shown - 2;
    }
    if total - current <= side {
        left = total - (max_shown - 3);
        right = total - 1;
    }

    let mut pages = Vec::with_capacity(right - left + 5);
    pages.push(PageIndicator::Page(1));
    if left > 2 {
        pages.push(PageIndicator::Ellipsis);
    }
    pages.extend((left..=right).map(PageIndicator::Page));
    if right < total - 1 {
        pages.push(PageIndicator::Ellipsis);
    }
    pages.push(PageIndicator::Page(total));
    pages
}

/// Everything a front-end needs to draw the pager under a result page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageControls {
    pub current: usize,
    pub total_pages: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub indicators: Vec<PageIndicator>,
}

impl PageControls {
    pub fn new(current: usize, total_pages: usize, max_shown: usize) -> Self {
        let total_pages = total_pages.max(1);
        let current = current.max(1);
        let prev = (current > 1).then(|| (current - 1).min(total_pages));
        let next = (current < total_pages).then_some(current + 1);
        Self {
            current,
            total_pages,
            prev,
            next,
            indicators: page_range(current, total_pages, max_shown),
        }
    }

    pub fn is_current(&self, indicator: PageIndicator) -> bool {
        indicator == PageIndicator::Page(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::PageIndicator::{Ellipsis, Page};
    use super::*;

    #[test]
    fn short_ranges_are_verbatim() {
        assert_eq!(page_range(1, 1, 7), vec![Page(1)]);
        assert_eq!(
            page_range(3, 5, 7),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5)]
        );
        assert_eq!(page_range(7, 7, 7).len(), 7);
    }

    #[test]
    fn first_page_pins_window_left() {
        assert_eq!(
            page_range(1, 20, 7),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn last_page_pins_window_right() {
        assert_eq!(
            page_range(10, 10, 7),
            vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn middle_page_has_two_ellipses() {
        assert_eq!(
            page_range(10, 20, 7),
            vec![
                Page(1),
                Ellipsis,
                Page(8),
                Page(9),
                Page(10),
                Page(11),
                Page(12),
                Ellipsis,
                Page(20)
            ]
        );
    }

    #[test]
    fn window_next_to_left_edge_has_no_leading_ellipsis() {
        assert_eq!(
            page_range(4, 20, 7),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn anchors_and_single_gap_hold_for_every_page() {
        for total in 8..40 {
            for current in 1..=total {
                let range = page_range(current, total, 7);
                assert_eq!(range.first(), Some(&Page(1)));
                assert_eq!(range.last(), Some(&Page(total)));
                assert!(range.contains(&Page(current)));
                let ellipses = range.iter().filter(|p| **p == Ellipsis).count();
                assert!((1..=2).contains(&ellipses));
                let numbers: Vec<usize> = range
                    .iter()
                    .filter_map(|p| match p {
                        Page(n) => Some(*n),
                        Ellipsis => None,
                    })
                    .collect();
                assert!(numbers.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(page_range(0, 0, 7), vec![Page(1)]);
        assert_eq!(page_range(99, 20, 7), page_range(20, 20, 7));
        assert_eq!(page_range(1, 20, 1), page_range(1, 20, 5));
    }

    #[test]
    fn huge_page_counts_do_not_overflow() {
        let max = usize::MAX;
        assert_eq!(
            page_range(max - 1, max, 7),
            vec![
                Page(1),
                Ellipsis,
                Page(max - 4),
                Page(max - 3),
                Page(max - 2),
                Page(max - 1),
                Page(max)
            ]
        );
        let mid = max / 2;
        assert_eq!(page_range(mid, max, 7).len(), 9);
        assert!(page_range(mid, max, 7).contains(&Page(mid + 2)));
    }

    #[test]
    fn indicators_display_and_serialize() {
        assert_eq!(Ellipsis.to_string(), "...");
        assert_eq!(Page(4).to_string(), "4");
        let json = serde_json::to_string(&page_range(1, 20, 7)).unwrap();
        assert_eq!(json, r#"[1,2,3,4,5,"...",20]"#);
    }

    #[test]
    fn controls_bound_prev_and_next() {
        let first = PageControls::new(1, 3, 7);
        assert_eq!(first.prev, None);
        assert_eq!(first.next, Some(2));

        let last = PageControls::new(3, 3, 7);
        assert_eq!(last.prev, Some(2));
        assert_eq!(last.next, None);

        let beyond = PageControls::new(9, 3, 7);
        assert_eq!(beyond.prev, Some(3));
        assert_eq!(beyond.next, None);
        assert!(last.is_current(Page(3)));
    }
}
