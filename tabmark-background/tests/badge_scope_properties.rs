mod support;

use proptest::prelude::*;
use support::{harness, tab};
use tabmark_background::NavigationEvent;
use tabmark_core::TabId;
use tabmark_test_utils::fixtures::bookmark;

const TABS: [i64; 2] = [1, 2];
const PAGES: [&str; 3] = [
    "https://saved.example/",
    "https://other.example/",
    "https://third.example/",
];

fn arb_event() -> impl Strategy<Value = NavigationEvent> {
    let tab_id = prop::sample::select(TABS.to_vec());
    let page = prop::sample::select(PAGES.to_vec());
    (tab_id, page, 0..4u8, any::<bool>(), any::<bool>()).prop_map(
        |(id, page, kind, url_changed, active)| match kind {
            0 => NavigationEvent::Activated { tab: tab(id, page) },
            1 => NavigationEvent::Updated {
                tab: tab(id, page),
                url_changed,
                active,
            },
            2 => NavigationEvent::Created {
                tab: tab(id, page),
                active,
            },
            _ => NavigationEvent::Removed {
                tab_id: TabId::new(id),
            },
        },
    )
}

fn event_tab(event: &NavigationEvent) -> TabId {
    match event {
        NavigationEvent::Activated { tab }
        | NavigationEvent::Updated { tab, .. }
        | NavigationEvent::Created { tab, .. } => tab.id,
        NavigationEvent::Removed { tab_id } => *tab_id,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Each event only ever writes the badge of the tab it names.
    #[test]
    fn prop_events_only_write_their_own_tab(events in prop::collection::vec(arb_event(), 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let h = harness(true).await;
            h.gateway.add_bookmark(bookmark(1, PAGES[0]));

            for event in events {
                let target = event_tab(&event);
                let before: Vec<usize> = TABS
                    .iter()
                    .map(|id| h.host.states_for(TabId::new(*id)).len())
                    .collect();

                h.services.coordinator.handle(event).await;

                for (id, count) in TABS.iter().zip(before) {
                    let tab_id = TabId::new(*id);
                    if tab_id != target {
                        assert_eq!(h.host.states_for(tab_id).len(), count);
                    }
                }
            }
        });
    }
}
