//! Aggregation queries over a message snapshot.
//!
//! Every query is a pure function of the loaded records: nothing is cached
//! between calls and the snapshot is never mutated.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Days, Duration, FixedOffset};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use stats_core::formatting::{format_one_decimal, format_rate, percentage, NOT_APPLICABLE};
use stats_core::models::MessageRecord;
use stats_core::time_utils::local_now;

use crate::reader::{load_snapshot, Snapshot};

/// `most_active_agent` reported when nobody has sent anything.
pub const NO_AGENT: &str = "None";

/// Per-day message counts keyed by `YYYY-MM-DD`, oldest first.
pub type Timeline = BTreeMap<String, u64>;

/// Share of all messages per priority, in percent.
pub type PriorityTrends = BTreeMap<String, f64>;

/// `sender -> recipient -> count`.
pub type CommunicationMatrix = BTreeMap<String, BTreeMap<String, u64>>;

// ── Histogram ─────────────────────────────────────────────────────────────────

/// Occurrence counts ordered by descending count, ties by ascending key.
///
/// Serialises as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram(Vec<(String, u64)>);

impl Histogram {
    /// Count each key yielded by `keys`.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for key in keys {
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut entries: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Highest-count entry.
    pub fn first(&self) -> Option<(&str, u64)> {
        self.0.first().map(|(k, count)| (k.as_str(), *count))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, count)| (k.as_str(), *count))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

// ── Result types ──────────────────────────────────────────────────────────────

/// Totals, reply figures and breakdowns across the whole store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_messages: u64,
    pub total_replies: u64,
    pub messages_with_replies: u64,
    pub messages_no_replies: u64,
    /// Formatted as `"25.0%"`.
    pub reply_rate: String,
    pub by_sender: Histogram,
    pub by_priority: Histogram,
    pub most_active_agent: String,
    pub most_active_count: u64,
}

/// Output of [`SynapseStats::summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Summary {
    /// The store held no messages.
    NoData { total_messages: u64, error: String },
    Stats(SummaryStats),
}

impl Summary {
    fn no_data() -> Self {
        Summary::NoData {
            total_messages: 0,
            error: "No messages found".to_string(),
        }
    }

    pub fn total_messages(&self) -> u64 {
        match self {
            Summary::NoData { total_messages, .. } => *total_messages,
            Summary::Stats(stats) => stats.total_messages,
        }
    }

    pub fn stats(&self) -> Option<&SummaryStats> {
        match self {
            Summary::NoData { .. } => None,
            Summary::Stats(stats) => Some(stats),
        }
    }
}

/// Traffic figures for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// The agent name exactly as queried.
    pub agent: String,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_replied_to: u64,
    /// `"N/A"` when the agent received nothing.
    pub response_rate: String,
}

/// Reply latency in minutes, formatted to one decimal place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseTimes {
    pub messages_analyzed: u64,
    pub average_minutes: String,
    pub fastest_minutes: String,
    pub slowest_minutes: String,
}

impl ResponseTimes {
    fn no_data() -> Self {
        Self {
            messages_analyzed: 0,
            average_minutes: NOT_APPLICABLE.to_string(),
            fastest_minutes: NOT_APPLICABLE.to_string(),
            slowest_minutes: NOT_APPLICABLE.to_string(),
        }
    }
}

// ── SynapseStats ──────────────────────────────────────────────────────────────

/// Query engine over one immutable [`Snapshot`] of the message store.
///
/// # Example
/// ```no_run
/// use stats_data::aggregator::SynapseStats;
///
/// let stats = SynapseStats::load(std::path::Path::new("/srv/synapse/active"));
/// println!("total: {}", stats.summary().total_messages());
/// println!("{:?}", stats.agent_stats("atlas"));
/// ```
#[derive(Debug, Clone)]
pub struct SynapseStats {
    snapshot: Snapshot,
}

impl SynapseStats {
    /// Load every message file in `path`.
    pub fn load(path: &Path) -> Self {
        Self::from_snapshot(load_snapshot(path))
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_records(records: Vec<MessageRecord>) -> Self {
        Self::from_snapshot(Snapshot::from_records(records))
    }

    pub fn messages(&self) -> &[MessageRecord] {
        &self.snapshot.records
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Files in the store that could not be turned into messages.
    pub fn skipped_files(&self) -> usize {
        self.snapshot.skipped_files
    }

    /// Overall statistics for the store.
    pub fn summary(&self) -> Summary {
        let messages = self.messages();
        let total = messages.len() as u64;
        if total == 0 {
            return Summary::no_data();
        }

        let by_sender = Histogram::from_keys(messages.iter().map(|m| m.from.as_str()));
        let by_priority = Histogram::from_keys(messages.iter().map(|m| m.priority.as_str()));

        let replied = messages.iter().filter(|m| m.has_replies()).count() as u64;
        let total_replies: u64 = messages.iter().map(|m| m.replies.len() as u64).sum();

        let (most_active_agent, most_active_count) = by_sender
            .first()
            .map(|(agent, count)| (agent.to_string(), count))
            .unwrap_or_else(|| (NO_AGENT.to_string(), 0));

        Summary::Stats(SummaryStats {
            total_messages: total,
            total_replies,
            messages_with_replies: replied,
            messages_no_replies: total - replied,
            reply_rate: format_rate(replied, total),
            by_sender,
            by_priority,
            most_active_agent,
            most_active_count,
        })
    }

    /// Sent, received and replied-to counts for `agent_name`.
    ///
    /// Only the query is upper-cased; stored names are compared verbatim.
    /// Broadcasts count as received by every agent.
    pub fn agent_stats(&self, agent_name: &str) -> AgentStats {
        let agent = agent_name.to_uppercase();
        let messages = self.messages();

        let sent = messages.iter().filter(|m| m.from == agent).count() as u64;
        let received = messages
            .iter()
            .filter(|m| m.is_addressed_to(&agent))
            .count() as u64;
        let replied_to = messages
            .iter()
            .filter(|m| m.replied_by_agent(&agent))
            .count() as u64;

        AgentStats {
            agent: agent_name.to_string(),
            messages_sent: sent,
            messages_received: received,
            messages_replied_to: replied_to,
            response_rate: format_rate(replied_to, received),
        }
    }

    /// Message counts for each of the last `days` days, ending today.
    pub fn timeline(&self, days: u32) -> Timeline {
        self.timeline_at(days, local_now())
    }

    /// [`timeline`](Self::timeline) against an explicit clock.
    ///
    /// The result always holds exactly `days` consecutive dates ending on
    /// `now`'s calendar date. Messages are bucketed by the date in their own
    /// offset; those older than `now - days` or without a timestamp are
    /// ignored, as are buckets falling outside the returned dates.
    pub fn timeline_at(&self, days: u32, now: DateTime<FixedOffset>) -> Timeline {
        let cutoff = now.checked_sub_signed(Duration::days(i64::from(days)));

        let mut buckets: HashMap<String, u64> = HashMap::new();
        for ts in self.messages().iter().filter_map(|m| m.timestamp) {
            if cutoff.map_or(true, |c| ts >= c) {
                *buckets
                    .entry(ts.format("%Y-%m-%d").to_string())
                    .or_insert(0) += 1;
            }
        }

        let today = now.date_naive();
        (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
            .map(|date| {
                let key = date.format("%Y-%m-%d").to_string();
                let count = buckets.get(&key).copied().unwrap_or(0);
                (key, count)
            })
            .collect()
    }

    /// Percentage of all messages carried by each priority.
    pub fn priority_trends(&self) -> PriorityTrends {
        let messages = self.messages();
        let total = messages.len() as u64;
        if total == 0 {
            return PriorityTrends::new();
        }

        Histogram::from_keys(messages.iter().map(|m| m.priority.as_str()))
            .iter()
            .map(|(priority, count)| (priority.to_string(), percentage(count, total)))
            .collect()
    }

    /// Minutes between each message and each of its timestamped replies.
    ///
    /// A reply without a usable timestamp drops only that sample.
    pub fn response_times(&self) -> ResponseTimes {
        let samples: Vec<f64> = self
            .messages()
            .iter()
            .filter_map(|m| m.timestamp.map(|sent| (sent, &m.replies)))
            .flat_map(|(sent, replies)| {
                replies
                    .iter()
                    .filter_map(|reply| reply.timestamp)
                    .map(move |replied| elapsed_minutes(sent, replied))
            })
            .collect();

        if samples.is_empty() {
            return ResponseTimes::no_data();
        }

        let sum: f64 = samples.iter().sum();
        let fastest = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let slowest = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        ResponseTimes {
            messages_analyzed: samples.len() as u64,
            average_minutes: format_one_decimal(sum / samples.len() as f64),
            fastest_minutes: format_one_decimal(fastest),
            slowest_minutes: format_one_decimal(slowest),
        }
    }

    /// Who messages whom. A message to K recipients adds K to its sender's row.
    pub fn communication_matrix(&self) -> CommunicationMatrix {
        let mut matrix = CommunicationMatrix::new();
        for message in self.messages() {
            for recipient in message.recipients() {
                *matrix
                    .entry(message.from.clone())
                    .or_default()
                    .entry(recipient.clone())
                    .or_insert(0) += 1;
            }
        }
        matrix
    }
}

fn elapsed_minutes(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 60_000_000.0,
        None => delta.num_seconds() as f64 / 60.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
