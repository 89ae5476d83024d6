use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregate::PassTally;
use super::results::{attempted_pairs, StudentReport};
use super::snapshot::ClassKey;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum RankingKey {
    Class { class_name: ClassKey },
    Subject { subject: String },
    ClassSubject { class_name: ClassKey, subject: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub key: RankingKey,
    pub count: usize,
    pub pass_count: usize,
    pub pass_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub classes: Vec<RankingEntry>,
    pub subjects: Vec<RankingEntry>,
    pub class_subjects: Vec<RankingEntry>,
}

/// Pass rate descending, then pass count descending, then key order.
fn rank(tallies: BTreeMap<RankingKey, PassTally>) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = tallies
        .into_iter()
        .map(|(key, t)| RankingEntry {
            rank: 0,
            key,
            count: t.count,
            pass_count: t.pass_count,
            pass_rate: t.rate(),
        })
        .collect();
    // BTreeMap iteration already yields key order, so a stable sort keeps it as the last tie-break
    entries.sort_by(|a, b| {
        b.pass_rate
            .cmp(&a.pass_rate)
            .then_with(|| b.pass_count.cmp(&a.pass_count))
    });
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
    entries
}

/// Class, subject and class x subject pass-rate rankings over attempted results.
/// Classes with no attempted result still rank, last, with a zero count.
pub fn build_rankings(reports: &[StudentReport], pass_mark: f64) -> Rankings {
    let mut classes: BTreeMap<RankingKey, PassTally> = BTreeMap::new();
    let mut subjects: BTreeMap<RankingKey, PassTally> = BTreeMap::new();
    let mut pairs: BTreeMap<RankingKey, PassTally> = BTreeMap::new();

    // every class is listed, even one with nothing attempted
    for r in reports {
        classes
            .entry(RankingKey::Class {
                class_name: r.class.clone(),
            })
            .or_default();
    }
    for (r, s) in attempted_pairs(reports) {
        classes
            .entry(RankingKey::Class {
                class_name: r.class.clone(),
            })
            .or_default()
            .add(s.final_mark, pass_mark);
        subjects
            .entry(RankingKey::Subject {
                subject: s.name.clone(),
            })
            .or_default()
            .add(s.final_mark, pass_mark);
        pairs
            .entry(RankingKey::ClassSubject {
                class_name: r.class.clone(),
                subject: s.name.clone(),
            })
            .or_default()
            .add(s.final_mark, pass_mark);
    }

    Rankings {
        classes: rank(classes),
        subjects: rank(subjects),
        class_subjects: rank(pairs),
    }
}
