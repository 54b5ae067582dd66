//! Presentation order of questions for a single answering session.

use std::collections::BTreeMap;

use clap::ValueEnum;
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

use crate::storage::entities::{FixedPosition, PositionRange, Question, RandomOrder};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Everything shuffled, the question marked as last stays at the end.
    #[default]
    PinnedLast,
    /// Older ordering with per question ranges and fixed positions.
    Ranged,
}

/// Computes a fresh order. Every call reshuffles, orders aren't stable between sessions.
pub fn session_order<'a, R: Rng + ?Sized>(
    questions: &'a [Question],
    policy: OrderingPolicy,
    rng: &mut R,
) -> Vec<&'a Question> {
    match policy {
        OrderingPolicy::PinnedLast => pinned_last_order(questions, rng),
        OrderingPolicy::Ranged => ranged_order(questions, rng),
    }
}

pub fn pinned_last_order<'a, R: Rng + ?Sized>(
    questions: &'a [Question],
    rng: &mut R,
) -> Vec<&'a Question> {
    let pinned = questions.iter().position(|q| q.is_last);
    let mut order = questions
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != pinned)
        .map(|(_, q)| q)
        .collect::<Vec<_>>();
    order.shuffle(rng);
    if let Some(i) = pinned {
        order.push(&questions[i]);
    }
    order
}

fn active_constraints(question: &Question) -> Option<&RandomOrder> {
    question.random_order.as_ref().filter(|v| v.enabled)
}

/// Questions with a range are shuffled among the free slots of that range, a question fixed
/// as last takes the final slot, and the rest fill whatever remains. When nothing is
/// configured the stored order is kept.
pub fn ranged_order<'a, R: Rng + ?Sized>(
    questions: &'a [Question],
    rng: &mut R,
) -> Vec<&'a Question> {
    let mut stored = questions.iter().collect::<Vec<_>>();
    stored.sort_by_key(|q| q.order_index.unwrap_or(0));
    if !questions.iter().any(|q| active_constraints(q).is_some()) {
        return stored;
    }

    let n = stored.len();
    let mut slots: Vec<Option<&'a Question>> = vec![None; n];
    let mut free = vec![];
    // Keyed by range, in the order ranges first appear.
    let mut ranges: Vec<(PositionRange, Vec<&'a Question>)> = vec![];
    let mut last_taken = false;

    for question in stored {
        let Some(constraints) = active_constraints(question) else {
            free.push(question);
            continue;
        };
        if let Some(range) = constraints.range {
            match ranges.iter_mut().find(|(r, _)| *r == range) {
                Some((_, group)) => group.push(question),
                None => ranges.push((range, vec![question])),
            }
        } else if constraints.position == Some(FixedPosition::Last) && !last_taken && n > 0 {
            slots[n - 1] = Some(question);
            last_taken = true;
        } else {
            free.push(question);
        }
    }

    for (range, mut group) in ranges {
        let lower = range.start.saturating_sub(1);
        let upper = range.end.min(n);
        let mut open = (lower..upper)
            .filter(|i| slots[*i].is_none())
            .collect::<Vec<_>>();

        if group.len() > open.len() {
            warn!(
                "Range {}-{} has room for {} of {} questions, the rest are placed freely",
                range.start,
                range.end,
                open.len(),
                group.len()
            );
            free.extend(group.drain(open.len()..));
        }

        group.shuffle(rng);
        open.shuffle(rng);
        for (slot, question) in open.into_iter().zip(group) {
            slots[slot] = Some(question);
        }
    }

    free.shuffle(rng);
    let mut free = free.into_iter();
    let mut order = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| free.next()))
        .collect::<Vec<_>>();
    order.extend(free);

    debug!(
        "Ranged order: {:?}",
        order.iter().map(|q| q.id.as_str()).collect::<Vec<_>>()
    );
    order
}

/// How many questions ask for each range. Used by the editor to warn about ranges that can't
/// fit all of their questions.
pub fn range_demand(questions: &[Question]) -> BTreeMap<(usize, usize), usize> {
    let mut demand = BTreeMap::new();
    for range in questions
        .iter()
        .filter_map(active_constraints)
        .filter_map(|c| c.range)
    {
        *demand.entry((range.start, range.end)).or_default() += 1;
    }
    demand
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{
        test_support::question,
        storage::entities::{FixedPosition, PositionRange, Question, QuestionType, RandomOrder},
    };

    use super::{pinned_last_order, range_demand, ranged_order, session_order, OrderingPolicy};

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                let mut q = question(&format!("q{i}"), QuestionType::YesNo);
                q.order_index = Some(i as i64);
                q
            })
            .collect()
    }

    fn ids(order: &[&Question]) -> Vec<String> {
        order.iter().map(|q| q.id.clone()).collect()
    }

    fn ranged(q: &mut Question, start: usize, end: usize) {
        q.random_order = Some(RandomOrder {
            enabled: true,
            range: Some(PositionRange { start, end }),
            position: None,
        });
    }

    #[test]
    fn test_all_permutations_reachable() {
        let mut qs = questions(4);
        qs[1].is_last = true;
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = HashSet::new();
        for _ in 0..500 {
            let order = ids(&pinned_last_order(&qs, &mut rng));
            assert_eq!(order.last().unwrap(), "q1");
            seen.insert(order);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_no_pinned_question() {
        let qs = questions(3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut order = ids(&session_order(&qs, OrderingPolicy::PinnedLast, &mut rng));
        order.sort();
        assert_eq!(order, vec!["q0", "q1", "q2"]);
        assert!(pinned_last_order(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_ranged_without_constraints_keeps_stored_order() {
        let mut qs = questions(3);
        qs.reverse();
        // A disabled constraint is ignored.
        ranged(&mut qs[0], 1, 1);
        qs[0].random_order.as_mut().unwrap().enabled = false;

        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ids(&ranged_order(&qs, &mut rng)), vec!["q0", "q1", "q2"]);
    }

    #[test]
    fn test_ranged_places_questions_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let mut qs = questions(6);
            ranged(&mut qs[4], 1, 2);
            ranged(&mut qs[5], 1, 2);
            qs[0].random_order = Some(RandomOrder {
                enabled: true,
                range: None,
                position: Some(FixedPosition::Last),
            });

            let order = ids(&ranged_order(&qs, &mut rng));
            assert_eq!(order.len(), 6);
            let mut front = order[..2].to_vec();
            front.sort();
            assert_eq!(front, vec!["q4", "q5"]);
            assert_eq!(order[5], "q0");
        }
    }

    #[test]
    fn test_range_overflow_becomes_free() {
        let mut qs = questions(4);
        ranged(&mut qs[1], 2, 2);
        ranged(&mut qs[2], 2, 2);
        ranged(&mut qs[3], 2, 2);

        let mut rng = StdRng::seed_from_u64(5);
        let order = ranged_order(&qs, &mut rng);
        let mut all = ids(&order);
        all.sort();
        assert_eq!(all, vec!["q0", "q1", "q2", "q3"]);
        assert!(["q1", "q2", "q3"].contains(&order[1].id.as_str()));
        assert_eq!(range_demand(&qs).get(&(2, 2)), Some(&3));
    }

    #[test]
    fn test_range_beyond_question_count() {
        let mut qs = questions(2);
        ranged(&mut qs[0], 5, 9);
        let mut rng = StdRng::seed_from_u64(5);
        let mut all = ids(&ranged_order(&qs, &mut rng));
        all.sort();
        assert_eq!(all, vec!["q0", "q1"]);
    }

    proptest! {
        #[test]
        fn pinned_question_is_always_last(n in 1usize..12, pinned in 0usize..12, seed in any::<u64>()) {
            let pinned = pinned % n;
            let mut qs = questions(n);
            qs[pinned].is_last = true;
            let mut rng = StdRng::seed_from_u64(seed);

            let order = pinned_last_order(&qs, &mut rng);
            prop_assert_eq!(order.len(), n);
            prop_assert_eq!(&order[n - 1].id, &qs[pinned].id);
            let unique = order.iter().map(|q| q.id.as_str()).collect::<HashSet<_>>();
            prop_assert_eq!(unique.len(), n);
        }
    }
}
