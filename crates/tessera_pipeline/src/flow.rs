//! Flow controller: applies an output strategy to packets and work items.
//!
//! This is the only place where the cardinality of a lineage changes. Items are
//! borrowed immutably and every output item is a fresh clone, so explosion branches
//! never share mutable state with each other or with the caller.

use serde_json::Value as JsonValue;
use tessera_core::{GenerationResult, Message, OutputMode, OutputStrategy, Packet, WorkItem};

/// Apply packets to the current items.
///
/// - No packets: the lineage is dropped.
/// - `explode`: one item per (item, packet) pair, tagged with the packet's position.
/// - otherwise: one item per input item, with the data of every packet aggregated
///   into an array.
///
/// # Examples
///
/// ```
/// use tessera_core::{OutputStrategy, Packet, Row, WorkItem};
/// use tessera_pipeline::flow;
/// use serde_json::json;
///
/// let items = vec![WorkItem::new(0, Row::new())];
/// let packets = vec![Packet::new(json!("a")), Packet::new(json!("b"))];
/// let strategy = OutputStrategy::builder().explode(true).build().unwrap();
///
/// let next = flow::process(&items, &packets, &strategy, "search");
/// assert_eq!(next.len(), 2);
/// assert_eq!(next[1].workspace()["search"], json!("b"));
/// ```
#[tracing::instrument(skip_all, fields(namespace = %namespace, items = items.len(), packets = packets.len(), explode = *strategy.explode()))]
pub fn process(
    items: &[WorkItem],
    packets: &[Packet],
    strategy: &OutputStrategy,
    namespace: &str,
) -> Vec<WorkItem> {
    if packets.is_empty() {
        tracing::debug!("No packets; dropping lineage");
        return Vec::new();
    }

    let next: Vec<WorkItem> = if *strategy.explode() {
        items
            .iter()
            .flat_map(|item| {
                packets.iter().enumerate().map(move |(position, packet)| {
                    let mut branch = item.clone().with_variation_index(position);
                    branch.append_content(packet.content.iter().cloned());
                    apply_value(&mut branch, packet.data.clone(), strategy, namespace);
                    branch
                })
            })
            .collect()
    } else {
        let aggregated =
            JsonValue::Array(packets.iter().map(|packet| packet.data.clone()).collect());
        items
            .iter()
            .map(|item| {
                let mut next = item.clone();
                next.append_content(
                    packets
                        .iter()
                        .flat_map(|packet| packet.content.iter().cloned()),
                );
                apply_value(&mut next, aggregated.clone(), strategy, namespace);
                next
            })
            .collect()
    };

    tracing::debug!(produced = next.len(), "Flow applied");
    next
}

/// Packets produced by one plugin, with the namespace they are stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketGroup {
    /// Workspace namespace, and default column, for the group's data
    pub namespace: String,
    /// The group's own strategy; the batch default when unset
    pub strategy: Option<OutputStrategy>,
    /// Packets in production order
    pub packets: Vec<Packet>,
}

impl PacketGroup {
    /// Group of packets stored under `namespace`.
    pub fn new(namespace: impl Into<String>, packets: Vec<Packet>) -> Self {
        Self {
            namespace: namespace.into(),
            strategy: None,
            packets,
        }
    }

    /// Apply the group under its own strategy instead of the batch default.
    pub fn with_strategy(mut self, strategy: OutputStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Apply the packets of several plugins as one batch.
///
/// Each group keeps its own namespace and mode. Cardinality is decided over the
/// concatenated batch:
///
/// - No packets in any group: the lineage is dropped.
/// - Any packets in exploding groups: one branch per exploding packet, tagged with
///   its position among the exploding packets. Each branch carries only its own
///   exploding packet.
/// - otherwise: one item per input item.
///
/// Non-exploding groups aggregate their data into an array, which every produced
/// item carries.
///
/// # Examples
///
/// ```
/// use tessera_core::{OutputStrategy, Packet, Row, WorkItem};
/// use tessera_pipeline::flow::{self, PacketGroup};
/// use serde_json::json;
///
/// let items = vec![WorkItem::new(0, Row::new())];
/// let groups = vec![
///     PacketGroup::new("facts", vec![Packet::new(json!("f"))]),
///     PacketGroup::new("topic", vec![Packet::new(json!("a")), Packet::new(json!("b"))])
///         .with_strategy(OutputStrategy::builder().explode(true).build().unwrap()),
/// ];
///
/// let next = flow::process_batch(&items, &groups, &OutputStrategy::default());
/// assert_eq!(next.len(), 2);
/// assert_eq!(next[1].workspace()["topic"], json!("b"));
/// assert_eq!(next[1].workspace()["facts"], json!(["f"]));
/// ```
#[tracing::instrument(skip_all, fields(items = items.len(), groups = groups.len()))]
pub fn process_batch(
    items: &[WorkItem],
    groups: &[PacketGroup],
    default: &OutputStrategy,
) -> Vec<WorkItem> {
    if groups.iter().all(|group| group.packets.is_empty()) {
        tracing::debug!("No packets; dropping lineage");
        return Vec::new();
    }

    let strategies: Vec<&OutputStrategy> = groups
        .iter()
        .map(|group| group.strategy.as_ref().unwrap_or(default))
        .collect();
    let strategies = strategies.as_slice();

    // (group, packet) of every exploding packet, in plugin order
    let exploding: Vec<(usize, usize)> = groups
        .iter()
        .enumerate()
        .filter(|(index, _)| *strategies[*index].explode())
        .flat_map(|(index, group)| (0..group.packets.len()).map(move |position| (index, position)))
        .collect();

    let next: Vec<WorkItem> = if exploding.is_empty() {
        items
            .iter()
            .map(|item| {
                let mut next = item.clone();
                apply_groups(&mut next, groups, strategies, None);
                next
            })
            .collect()
    } else {
        items
            .iter()
            .flat_map(|item| {
                exploding.iter().enumerate().map(move |(position, chosen)| {
                    let mut branch = item.clone().with_variation_index(position);
                    apply_groups(&mut branch, groups, strategies, Some(*chosen));
                    branch
                })
            })
            .collect()
    };

    tracing::debug!(produced = next.len(), "Flow applied");
    next
}

fn apply_groups(
    item: &mut WorkItem,
    groups: &[PacketGroup],
    strategies: &[&OutputStrategy],
    chosen: Option<(usize, usize)>,
) {
    for (index, (group, strategy)) in groups.iter().zip(strategies).enumerate() {
        if *strategy.explode() {
            match chosen {
                Some((group_index, position)) if group_index == index => {
                    let packet = &group.packets[position];
                    item.append_content(packet.content.iter().cloned());
                    apply_value(item, packet.data.clone(), strategy, &group.namespace);
                }
                _ => {}
            }
        } else if !group.packets.is_empty() {
            item.append_content(
                group
                    .packets
                    .iter()
                    .flat_map(|packet| packet.content.iter().cloned()),
            );
            let aggregated =
                JsonValue::Array(group.packets.iter().map(|packet| packet.data.clone()).collect());
            apply_value(item, aggregated, strategy, &group.namespace);
        }
    }
}

/// Apply a generation result to the items that produced it.
///
/// The result is treated as a single packet, except that an exploding strategy
/// fans out over the elements of an array payload. The user turn and the result's
/// history message are appended to each item's history, the payload is recorded in
/// the step history and the consumed plugin fragments are cleared.
pub fn apply_generation(
    items: &[WorkItem],
    user_turn: &Message,
    result: &GenerationResult,
    strategy: &OutputStrategy,
    namespace: &str,
) -> Vec<WorkItem> {
    let data = result.data();

    let mut prepared: Vec<WorkItem> = items
        .iter()
        .map(|item| {
            let mut next = item.clone();
            next.clear_content();
            next.extend_history([user_turn.clone(), result.history_message().clone()]);
            next.push_step_result(data.clone());
            next
        })
        .collect();

    let packets = match (&data, *strategy.explode()) {
        (JsonValue::Array(elements), true) => elements.iter().cloned().map(Packet::new).collect(),
        _ => vec![Packet::new(data.clone())],
    };

    if packets.len() == 1 && !strategy.explode() {
        // A single generation result is stored as-is, not as a one-element array
        for item in &mut prepared {
            apply_value(item, data.clone(), strategy, namespace);
        }
        return prepared;
    }

    process(&prepared, &packets, strategy, namespace)
}

fn apply_value(item: &mut WorkItem, value: JsonValue, strategy: &OutputStrategy, namespace: &str) {
    match strategy.mode() {
        OutputMode::Column => {
            item.set_workspace(namespace, value.clone());
            item.set_column(strategy.column_for(namespace), value);
        }
        OutputMode::Merge => {
            if let JsonValue::Object(fields) = &value {
                item.merge_fields(fields);
            }
            item.set_workspace(namespace, value);
        }
        OutputMode::Ignore => item.set_workspace(namespace, value),
    }
}
