//! Flow controller cardinality and row update laws.

mod test_utils;

use serde_json::json;
use tessera_core::{
    ContentPart, GenerationResult, Message, OutputMode, OutputStrategy, Packet, WorkItem,
};
use tessera_pipeline::flow::{self, PacketGroup};
use test_utils::item;

fn strategy(mode: OutputMode, explode: bool) -> OutputStrategy {
    OutputStrategy::builder()
        .mode(mode)
        .explode(explode)
        .build()
        .unwrap()
}

fn packets(values: &[serde_json::Value]) -> Vec<Packet> {
    values
        .iter()
        .map(|value| Packet::new(value.clone()).with_text(format!("fragment {}", value)))
        .collect()
}

#[test]
fn test_explode_is_cartesian() {
    let items = vec![
        item(0, &[("name", json!("a"))]),
        item(1, &[("name", json!("b"))]),
    ];
    let packets = packets(&[json!(1), json!(2), json!(3)]);

    let next = flow::process(&items, &packets, &strategy(OutputMode::Ignore, true), "search");

    assert_eq!(next.len(), 6);
    for (position, produced) in next.iter().enumerate() {
        let packet_index = position % 3;
        assert_eq!(*produced.original_index(), position / 3);
        assert_eq!(*produced.variation_index(), Some(packet_index));
        assert_eq!(produced.workspace()["search"], json!(packet_index + 1));
        assert_eq!(
            produced.accumulated_content(),
            &vec![ContentPart::Text(format!("fragment {}", packet_index + 1))]
        );
    }
}

#[test]
fn test_aggregation_keeps_cardinality() {
    let items = vec![item(0, &[]), item(1, &[])];
    let packets = packets(&[json!("x"), json!({"y": 1})]);

    let next = flow::process(&items, &packets, &strategy(OutputMode::Ignore, false), "search");

    assert_eq!(next.len(), 2);
    for produced in &next {
        assert_eq!(*produced.variation_index(), None);
        assert_eq!(produced.workspace()["search"], json!(["x", {"y": 1}]));
        assert_eq!(produced.accumulated_content().len(), 2);
    }
}

#[test]
fn test_zero_packets_drop_lineage() {
    let items = vec![item(0, &[]), item(1, &[])];

    for explode in [true, false] {
        let next = flow::process(&items, &[], &strategy(OutputMode::Column, explode), "search");
        assert!(next.is_empty());
    }
}

#[test]
fn test_column_mode_defaults_to_namespace() {
    let items = vec![item(0, &[])];
    let next = flow::process(
        &items,
        &[Packet::new(json!("v"))],
        &strategy(OutputMode::Column, true),
        "search",
    );
    assert_eq!(next[0].row()["search"], json!("v"));

    let named = OutputStrategy::builder()
        .mode(OutputMode::Column)
        .column_name("result")
        .build()
        .unwrap();
    let next = flow::process(&items, &[Packet::new(json!("v"))], &named, "search");
    assert_eq!(next[0].row()["result"], json!(["v"]));
    assert!(!next[0].row().contains_key("search"));
}

#[test]
fn test_merge_ignores_non_objects() {
    let items = vec![item(0, &[("keep", json!(true))])];
    let merge = strategy(OutputMode::Merge, true);

    let next = flow::process(
        &items,
        &[
            Packet::new(json!({"city": "Berlin", "keep": false})),
            Packet::new(json!([1, 2])),
            Packet::new(json!("scalar")),
            Packet::new(json!(null)),
        ],
        &merge,
        "geo",
    );

    assert_eq!(next.len(), 4);
    assert_eq!(next[0].row()["city"], json!("Berlin"));
    assert_eq!(next[0].row()["keep"], json!(false));
    for untouched in &next[1..] {
        assert_eq!(untouched.row().len(), 1);
        assert_eq!(untouched.row()["keep"], json!(true));
    }
    // The workspace still reflects every packet
    assert_eq!(next[1].workspace()["geo"], json!([1, 2]));
    assert_eq!(next[3].workspace()["geo"], json!(null));
}

#[test]
fn test_aggregated_array_is_not_merged() {
    let items = vec![item(0, &[])];
    let next = flow::process(
        &items,
        &[Packet::new(json!({"a": 1}))],
        &strategy(OutputMode::Merge, false),
        "ns",
    );
    assert!(next[0].row().is_empty());
    assert_eq!(next[0].workspace()["ns"], json!([{"a": 1}]));
}

#[test]
fn test_branches_do_not_share_rows() {
    let original = item(0, &[("industry", json!("Kletterhalle"))]);
    let items = vec![original.clone()];

    let mut next = flow::process(
        &items,
        &[Packet::new(json!({"v": 1})), Packet::new(json!({"v": 2}))],
        &strategy(OutputMode::Merge, true),
        "variant",
    );

    next[0].set_column("industry", json!("Boulderhalle"));

    assert_eq!(next[0].row()["v"], json!(1));
    assert_eq!(next[1].row()["v"], json!(2));
    assert_eq!(next[1].row()["industry"], json!("Kletterhalle"));
    assert_eq!(items[0], original);
}

#[test]
fn test_apply_generation_records_turns() {
    let mut start = item(0, &[]);
    start.append_content([ContentPart::Text("search result".to_string())]);
    let user_turn = Message::user("Write a slogan");
    let result = GenerationResult::new(
        Message::assistant("Climb higher"),
        Some("Climb higher".to_string()),
        None,
    );

    let next = flow::apply_generation(
        &[start],
        &user_turn,
        &result,
        &strategy(OutputMode::Column, false),
        "slogan",
    );

    assert_eq!(next.len(), 1);
    let produced: &WorkItem = &next[0];
    assert_eq!(produced.row()["slogan"], json!("Climb higher"));
    assert_eq!(produced.workspace()["slogan"], json!("Climb higher"));
    assert_eq!(produced.history(), &vec![user_turn, Message::assistant("Climb higher")]);
    assert_eq!(produced.step_history(), &vec![json!("Climb higher")]);
    assert!(produced.accumulated_content().is_empty());
}

#[test]
fn test_apply_generation_explodes_arrays() {
    let result = GenerationResult::new(
        Message::assistant("[...]"),
        Some("[\"a\",\"b\"]".to_string()),
        Some(json!(["a", "b"])),
    );

    let next = flow::apply_generation(
        &[item(3, &[])],
        &Message::user("List two"),
        &result,
        &strategy(OutputMode::Column, true),
        "ideas",
    );

    assert_eq!(next.len(), 2);
    assert_eq!(next[0].row()["ideas"], json!("a"));
    assert_eq!(next[1].row()["ideas"], json!("b"));
    assert_eq!(*next[1].variation_index(), Some(1));
    assert_eq!(next[1].step_history(), &vec![json!(["a", "b"])]);
}

#[test]
fn test_apply_generation_merges_structured_results() {
    let result = GenerationResult::new(
        Message::assistant("{}"),
        Some("{\"slogan\":\"Up\"}".to_string()),
        Some(json!({"slogan": "Up"})),
    );

    let next = flow::apply_generation(
        &[item(0, &[("industry", json!("Kletterhalle"))])],
        &Message::user("Slogan"),
        &result,
        &strategy(OutputMode::Merge, false),
        "copy",
    );

    assert_eq!(next[0].row()["slogan"], json!("Up"));
    assert_eq!(next[0].row()["industry"], json!("Kletterhalle"));
    assert_eq!(next[0].workspace()["copy"], json!({"slogan": "Up"}));
}

#[test]
fn test_mixed_batch_explodes_over_exploding_groups_only() {
    let items = vec![item(0, &[])];
    let groups = vec![
        PacketGroup::new("facts", packets(&[json!("f1"), json!("f2")])),
        PacketGroup::new("topic", packets(&[json!("a"), json!("b")]))
            .with_strategy(strategy(OutputMode::Column, true)),
    ];

    let next = flow::process_batch(&items, &groups, &strategy(OutputMode::Ignore, false));

    assert_eq!(next.len(), 2);
    for (position, produced) in next.iter().enumerate() {
        let topic = ["a", "b"][position];
        assert_eq!(*produced.variation_index(), Some(position));
        assert_eq!(produced.workspace()["facts"], json!(["f1", "f2"]));
        assert_eq!(produced.workspace()["topic"], json!(topic));
        assert_eq!(produced.row()["topic"], json!(topic));
        assert!(produced.row().get("facts").is_none());
        assert_eq!(produced.accumulated_content().len(), 3);
    }
}

#[test]
fn test_batch_positions_span_exploding_groups() {
    let items = vec![item(0, &[])];
    let groups = vec![
        PacketGroup::new("first", packets(&[json!(1), json!(2)])),
        PacketGroup::new("second", packets(&[json!(3)])),
    ];

    let next = flow::process_batch(&items, &groups, &strategy(OutputMode::Ignore, true));

    assert_eq!(next.len(), 3);
    assert_eq!(*next[2].variation_index(), Some(2));
    assert_eq!(next[2].workspace()["second"], json!(3));
    assert!(next[2].workspace().get("first").is_none());
    assert_eq!(next[0].workspace()["first"], json!(1));
    assert!(next[0].workspace().get("second").is_none());
}

#[test]
fn test_batch_without_packets_drops_lineage() {
    let items = vec![item(0, &[])];
    let groups = vec![
        PacketGroup::new("facts", Vec::new()),
        PacketGroup::new("topic", Vec::new()).with_strategy(strategy(OutputMode::Column, true)),
    ];

    assert!(flow::process_batch(&items, &groups, &OutputStrategy::default()).is_empty());
}

#[test]
fn test_empty_exploding_group_does_not_drop_aggregated_data() {
    let items = vec![item(0, &[])];
    let groups = vec![
        PacketGroup::new("topic", Vec::new()).with_strategy(strategy(OutputMode::Ignore, true)),
        PacketGroup::new("facts", packets(&[json!("f1")])),
    ];

    let next = flow::process_batch(&items, &groups, &strategy(OutputMode::Ignore, false));

    assert_eq!(next.len(), 1);
    assert_eq!(*next[0].variation_index(), None);
    assert_eq!(next[0].workspace()["facts"], json!(["f1"]));
    assert!(next[0].workspace().get("topic").is_none());
}
