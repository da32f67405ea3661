//! Board scenarios driven through the bus, the way the UI drives them.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::moved;
use tierforge_core::{Event, Item, SubscribeOptions, Tier, TierContext, TierList};

fn board(cap: usize) -> TierContext {
    let ctx = TierContext::new(cap);
    let mut tier_list = TierList::new("tl", "g", "sh", "Mine");
    tier_list.tiers = vec![Tier::new("s", "S", "#f00", 0), Tier::new("a", "A", "#0f0", 1)];
    ctx.emit(Event::TierListLoaded { tier_list });
    ctx.emit(Event::ItemsLoaded {
        items: ["i1", "i2", "i3"].iter().map(|id| Item::new(*id, *id)).collect(),
    });
    ctx
}

fn tier_items(ctx: &TierContext, tier: usize) -> Vec<String> {
    ctx.get_state().tiers()[tier].items.clone()
}

fn unranked(ctx: &TierContext) -> Vec<String> {
    ctx.get_state().unranked.clone()
}

#[test]
fn test_move_undo_redo_scenario() {
    let ctx = board(50);
    ctx.emit(Event::ItemMoved {
        item_id: "i2".into(),
        from_tier: Some("unranked".into()),
        to_tier: "s".into(),
        position: 0,
    });
    assert_eq!(tier_items(&ctx, 0), vec!["i2"]);
    assert_eq!(unranked(&ctx), vec!["i1", "i3"]);

    ctx.emit(Event::Undo);
    assert!(tier_items(&ctx, 0).is_empty());
    assert_eq!(unranked(&ctx), vec!["i1", "i2", "i3"]);

    ctx.emit(Event::Redo);
    assert_eq!(tier_items(&ctx, 0), vec!["i2"]);
    assert_eq!(unranked(&ctx), vec!["i1", "i3"]);
}

#[test]
fn test_tier_reorder_scenario() {
    let ctx = TierContext::new(50);
    let mut tier_list = TierList::new("tl", "g", "sh", "Mine");
    tier_list.tiers = vec![
        Tier::new("t1", "T1", "#111", 0),
        Tier::new("t2", "T2", "#222", 1),
        Tier::new("t3", "T3", "#333", 2),
    ];
    ctx.emit(Event::TierListLoaded { tier_list });
    ctx.emit(Event::TierReordered {
        tier_id: "t3".into(),
        target_index: 0,
    });

    let state = ctx.get_state();
    let order: Vec<(&str, i32)> = state.tiers().iter().map(|t| (t.id.as_str(), t.order)).collect();
    assert_eq!(order, vec![("t3", 0), ("t1", 1), ("t2", 2)]);
}

#[test]
fn test_click_selection_scenario() {
    let ctx = board(50);
    let click = |id: &str, multi: bool| Event::ItemClicked {
        item_id: id.into(),
        multi_select: multi,
        range_select: false,
    };

    ctx.emit(click("i1", false));
    assert_eq!(ctx.get_state().ordered_selection(), vec!["i1"]);
    ctx.emit(click("i2", true));
    assert_eq!(ctx.get_state().ordered_selection(), vec!["i1", "i2"]);
    ctx.emit(click("i1", true));
    assert_eq!(ctx.get_state().ordered_selection(), vec!["i2"]);
}

#[test]
fn test_history_keeps_the_last_cap_mutations() {
    let ctx = board(50);
    let mut after_first = None;
    for n in 0..51 {
        // Bounce i1 between the two tiers so every step changes the board.
        let to = if n % 2 == 0 { "s" } else { "a" };
        ctx.emit(moved("i1", to, 0));
        if n == 0 {
            after_first = Some(ctx.get_state().tiers().to_vec());
        }
    }

    let state = ctx.get_state();
    assert_eq!(state.history.len(), 50);
    let oldest = state.history.entries().next().unwrap();
    assert_eq!(Some(oldest.snapshot.tiers.clone()), after_first);

    // Undoing the full history lands on the oldest retained snapshot.
    for _ in 0..50 {
        ctx.emit(Event::Undo);
    }
    assert!(!ctx.state.can_undo());
    assert_eq!(Some(ctx.get_state().tiers().to_vec()), after_first);
    ctx.emit(Event::Undo);
    assert_eq!(Some(ctx.get_state().tiers().to_vec()), after_first);
}

#[test]
fn test_same_position_move_keeps_board_and_records_history() {
    let ctx = board(50);
    ctx.emit(moved("i1", "s", 0));
    ctx.emit(moved("i2", "s", 1));
    let before = ctx.get_state();

    ctx.emit(moved("i2", "s", 1));
    ctx.emit(moved("i3", "unranked", 0));
    let after = ctx.get_state();
    assert_eq!(before.tiers(), after.tiers());
    assert_eq!(after.history.len(), before.history.len() + 2);

    // Undoing the unchanged moves keeps the board, then the real move is undone.
    ctx.emit(Event::Undo);
    ctx.emit(Event::Undo);
    assert_eq!(ctx.get_state().tiers(), before.tiers());
    ctx.emit(Event::Undo);
    assert!(ctx.get_state().tiers()[0].items.iter().all(|id| id != "i2"));
}

#[test]
fn test_selector_subscription_sees_only_changes() {
    let ctx = board(50);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = ctx.state.subscribe(
        |state| state.tiers().iter().map(|t| t.items.len()).sum::<usize>(),
        move |next: &usize, prev: &usize| sink.borrow_mut().push((*prev, *next)),
        SubscribeOptions::default(),
    );

    ctx.emit(Event::SearchChanged { query: "fire".into() });
    ctx.emit(moved("i1", "s", 0));
    ctx.emit(moved("i1", "a", 0));
    ctx.emit(Event::TiersReset);
    assert_eq!(*seen.borrow(), vec![(0, 1), (1, 0)]);
}

#[test]
fn test_multi_selection_moves_as_one_step() {
    let ctx = board(50);
    ctx.emit(Event::ItemsMoved {
        item_ids: vec!["i3".into(), "i1".into()],
        to_tier: "a".into(),
        position: 0,
    });
    assert_eq!(tier_items(&ctx, 1), vec!["i3", "i1"]);
    assert_eq!(unranked(&ctx), vec!["i2"]);

    ctx.emit(Event::Undo);
    assert!(tier_items(&ctx, 1).is_empty());
    assert_eq!(unranked(&ctx), vec!["i1", "i2", "i3"]);
}

#[test]
fn test_read_only_list_ignores_edits() {
    let ctx = board(50);
    ctx.emit(Event::ReadOnlyChanged { read_only: true });
    ctx.emit(moved("i1", "s", 0));
    ctx.emit(Event::TierRemoved { tier_id: "a".into() });
    let state = ctx.get_state();
    assert!(state.tiers()[0].items.is_empty());
    assert_eq!(state.tiers().len(), 2);
    assert!(state.history.is_empty());
}
