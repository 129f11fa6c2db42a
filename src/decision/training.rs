use super::Stat;

/// Subtracted when the same training was chosen last cycle.
pub const REPEAT_PENALTY: i32 = 150;

/// What was read off one training button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainingObservation {
    pub stat: Stat,
    pub failure_chance: i32,
    pub stat_gain: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainingRecord {
    pub stat: Stat,
    pub failure_chance: i32,
    pub stat_gain: i32,
    pub weight: i32,
}

pub fn training_weight(priority: i32, stat_gain: i32, failure_chance: i32, repeated: bool) -> i32 {
    let penalty = if repeated { REPEAT_PENALTY } else { 0 };
    20 * priority + 20 * stat_gain - 2 * failure_chance - penalty
}

/// Highest ranked stat gets 5, each following rank one less.
pub fn priority_of(stat: Stat, ranking: &[Stat]) -> Option<i32> {
    ranking
        .iter()
        .position(|s| *s == stat)
        .map(|idx| 5 - idx as i32)
}

/// Speed failure above the allowed maximum (or unreadable) cancels the cycle.
pub fn should_abort(speed_failure_chance: i32, maximum_failure_chance: i32) -> bool {
    speed_failure_chance == -1 || speed_failure_chance > maximum_failure_chance
}

/// Records for one training evaluation. Dropped at the end of the cycle.
#[derive(Debug, Default)]
pub struct TrainingCycle {
    pub records: Vec<TrainingRecord>,
}

impl TrainingCycle {
    /// Scores ranked, non-blacklisted observations in ranking order.
    pub fn score(
        observations: &[TrainingObservation],
        ranking: &[Stat],
        blacklist: &[Stat],
        previous: Option<Stat>,
    ) -> Self {
        let records = ranking
            .iter()
            .filter(|stat| !blacklist.contains(stat))
            .filter_map(|stat| {
                let obs = observations.iter().find(|o| o.stat == *stat)?;
                let priority = priority_of(*stat, ranking)?;
                Some(TrainingRecord {
                    stat: *stat,
                    failure_chance: obs.failure_chance,
                    stat_gain: obs.stat_gain,
                    weight: training_weight(
                        priority,
                        obs.stat_gain,
                        obs.failure_chance,
                        previous == Some(*stat),
                    ),
                })
            })
            .collect();
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn select(&self) -> Option<&TrainingRecord> {
        select_training(&self.records)
    }
}

/// First record with the strictly greatest weight.
pub fn select_training(records: &[TrainingRecord]) -> Option<&TrainingRecord> {
    let mut best: Option<&TrainingRecord> = None;
    for record in records {
        if best.is_none_or(|b| record.weight > b.weight) {
            best = Some(record);
        }
    }
    best
}
