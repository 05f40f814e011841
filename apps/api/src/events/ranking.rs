//! Personalized ordering for the student "browse events" page.
//!
//! Each event gets a relevance score against the student's skills and job
//! preferences. Events are then emitted by Kahn's algorithm over the
//! precedence graph "higher score comes before lower score"; among events
//! that are ready at the same time the earliest one wins.
//!
//! The full precedence relation has O(n²) edges. It is represented with one
//! gate node per score tier instead: every event of tier k points at gate k,
//! and gate k points at every event of tier k + 1. The set of valid orders is
//! the same and the graph stays linear in size.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::event::EventRecord;

const SKILL_TAG_WEIGHT: u32 = 3;
const PREFERENCE_TAG_WEIGHT: u32 = 5;
const TITLE_WORD_WEIGHT: u32 = 2;
const EMPLOYER_MATCH_WEIGHT: u32 = 2;

/// A student's interests, lowercased and trimmed for comparison.
#[derive(Debug, Clone, Default)]
pub struct Interests {
    pub skills: HashSet<String>,
    pub preferences: HashSet<String>,
}

impl Interests {
    pub fn new<S: AsRef<str>>(skills: &[S], preferences: &[S]) -> Self {
        Self {
            skills: fold(skills),
            preferences: fold(preferences),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.preferences.is_empty()
    }
}

fn fold<S: AsRef<str>>(items: &[S]) -> HashSet<String> {
    items
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Relevance of one event to a student:
/// +3 per skill matching a tag, +5 per preference matching a tag,
/// +2 per skill or preference equal to a title word,
/// +2 per preference found in the host's company name or industry.
pub fn relevance_score(event: &EventRecord, interests: &Interests) -> u32 {
    let tags: HashSet<String> = event
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let title_words: HashSet<String> = event
        .title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let skill_tags = interests.skills.intersection(&tags).count() as u32;
    let preference_tags = interests.preferences.intersection(&tags).count() as u32;
    let title_hits = interests
        .skills
        .union(&interests.preferences)
        .filter(|interest| title_words.contains(*interest))
        .count() as u32;

    let company = event.company_name.to_lowercase();
    let industry = event
        .employer_industry
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let employer_hits = interests
        .preferences
        .iter()
        .filter(|pref| company.contains(pref.as_str()) || industry.contains(pref.as_str()))
        .count() as u32;

    skill_tags * SKILL_TAG_WEIGHT
        + preference_tags * PREFERENCE_TAG_WEIGHT
        + title_hits * TITLE_WORD_WEIGHT
        + employer_hits * EMPLOYER_MATCH_WEIGHT
}

/// Orders events most relevant first, ties broken by date then id.
/// With no interests every score is equal and the result is chronological.
pub fn rank_events(events: Vec<EventRecord>, interests: &Interests) -> Vec<EventRecord> {
    let scores: Vec<u32> = events
        .iter()
        .map(|e| relevance_score(e, interests))
        .collect();
    let keys: Vec<(DateTime<Utc>, Uuid)> = events.iter().map(|e| (e.event_date, e.id)).collect();
    let order = topological_order(&scores, &keys);

    let mut slots: Vec<Option<EventRecord>> = events.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Kahn's algorithm over the tiered precedence graph. Returns indices into `scores`.
fn topological_order(scores: &[u32], keys: &[(DateTime<Utc>, Uuid)]) -> Vec<usize> {
    let n = scores.len();
    let mut tiers: Vec<u32> = scores.to_vec();
    tiers.sort_unstable_by(|a, b| b.cmp(a));
    tiers.dedup();
    let tier_of = |score: u32| tiers.iter().position(|&t| t == score).unwrap_or(0);

    // Nodes 0..n are events, n..n + tiers.len() are gates.
    let gate = |tier: usize| n + tier;
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n + tiers.len()];
    let mut in_degree = vec![0usize; n + tiers.len()];
    for (i, &score) in scores.iter().enumerate() {
        let tier = tier_of(score);
        if tier + 1 < tiers.len() {
            edges[i].push(gate(tier));
            in_degree[gate(tier)] += 1;
        }
        if tier > 0 {
            edges[gate(tier - 1)].push(i);
            in_degree[i] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<((DateTime<Utc>, Uuid), usize)>> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(|i| Reverse((keys[i], i)))
        .collect();
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse((_, node))) = ready.pop() {
        order.push(node);
        let mut released = edges[node].clone();
        while let Some(next) = released.pop() {
            in_degree[next] -= 1;
            if in_degree[next] > 0 {
                continue;
            }
            if next < n {
                ready.push(Reverse((keys[next], next)));
            } else {
                // Gates carry no payload; pass straight through to their targets.
                released.extend(edges[next].iter().copied());
            }
        }
    }

    debug_assert_eq!(order.len(), n, "precedence graph must be acyclic");
    order
}
