use crate::vision::Point;

/// One visible entry in the extra-race list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaceCandidate {
    pub location: Point,
    /// -1 when there is no double prediction or the count was unreadable
    pub fan_gain: i32,
    pub has_double_prediction: bool,
}

impl RaceCandidate {
    pub fn ineligible(location: Point) -> Self {
        Self {
            location,
            fan_gain: -1,
            has_double_prediction: false,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.fan_gain != -1
    }
}

/// Index of the candidate with the most fans, first on ties.
///
/// `None` when the list is empty or no candidate is eligible.
pub fn select_race(candidates: &[RaceCandidate]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        if best.is_none_or(|b| candidate.fan_gain > candidates[b].fan_gain) {
            best = Some(idx);
        }
    }
    best.filter(|b| candidates[*b].is_eligible())
}
