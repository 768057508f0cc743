use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::{HashMap, HashSet};

/// Activity (event class) name
type Activity = String;

/// A direct succession relation of [`Activity`]s.
///
/// Contains the occurrence count of activities, the number of times one activity directly
/// followed another, as well as the sets of activities starting and ending a trace.
///
/// This is what the surrounding log import/filtering produces and what
/// [`Network::from_succession_relation`](crate::Network::from_succession_relation)
/// turns into a process network.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessionRelation {
    /// Activities with their occurrence count
    #[serde(default)]
    pub activities: HashMap<Activity, u64>,
    /// Direct successions `(a, b)` with the number of times `b` directly followed `a`
    #[serde_as(as = "Vec<(_, _)>")]
    pub successions: HashMap<(Activity, Activity), u64>,
    /// Activities starting a trace
    #[serde(default)]
    pub start_activities: HashSet<Activity>,
    /// Activities ending a trace
    #[serde(default)]
    pub end_activities: HashSet<Activity>,
}

impl SuccessionRelation {
    /// Create new [`SuccessionRelation`] with no activities and successions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a [`SuccessionRelation`] from traces given as plain activity sequences
    ///
    /// The first/last activity of every non-empty trace becomes a start/end activity.
    pub fn from_traces<T, S>(traces: &[T]) -> Self
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut result = Self::new();
        traces.iter().for_each(|t| {
            let mut last_activity: Option<&str> = None;
            t.as_ref().iter().for_each(|a| {
                let curr = a.as_ref();
                result.add_activity(curr, 1);
                match last_activity {
                    Some(last) => result.add_succession(last, curr, 1),
                    None => result.add_start_activity(curr),
                }
                last_activity = Some(curr);
            });
            if let Some(last) = last_activity {
                result.add_end_activity(last);
            }
        });
        result
    }

    /// Construct a [`SuccessionRelation`] from a nested map `activity -> successor -> count`
    ///
    /// Activities that only appear as keys (e.g., with an empty successor map) are kept with
    /// a count of 0. Start and end activities are left empty.
    pub fn from_nested_map<I, J, S>(map: I) -> Self
    where
        I: IntoIterator<Item = (S, J)>,
        J: IntoIterator<Item = (S, u64)>,
        S: Into<Activity>,
    {
        let mut result = Self::new();
        for (from, successors) in map {
            let from: Activity = from.into();
            result.add_activity(from.clone(), 0);
            for (to, count) in successors {
                let to: Activity = to.into();
                result.add_activity(to.clone(), 0);
                result.add_succession(from.clone(), to, count);
            }
        }
        result
    }

    /// Construct a [`SuccessionRelation`] from a map `activity -> set of successors`
    ///
    /// Every listed succession is counted once.
    pub fn from_simple<I, J, S>(map: I) -> Self
    where
        I: IntoIterator<Item = (S, J)>,
        J: IntoIterator<Item = S>,
        S: Into<Activity>,
    {
        Self::from_nested_map(
            map.into_iter()
                .map(|(from, successors)| (from, successors.into_iter().map(|to| (to, 1)))),
        )
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add an activity with a count.
    ///
    /// If the activity already exists, the count is added to the existing activity.
    pub fn add_activity<S: Into<Activity>>(&mut self, activity: S, count: u64) {
        *self.activities.entry(activity.into()).or_default() += count;
    }

    /// Adds an activity to the set of start activities.
    pub fn add_start_activity<S: Into<Activity>>(&mut self, activity: S) {
        self.start_activities.insert(activity.into());
    }

    /// Adds an activity to the set of end activities.
    pub fn add_end_activity<S: Into<Activity>>(&mut self, activity: S) {
        self.end_activities.insert(activity.into());
    }

    /// Add a direct succession with a count.
    ///
    /// If the succession already exists, the count is added to the existing one.
    pub fn add_succession<S: Into<Activity>, T: Into<Activity>>(
        &mut self,
        from: S,
        to: T,
        count: u64,
    ) {
        *self
            .successions
            .entry((from.into(), to.into()))
            .or_default() += count;
    }

    /// Checks if a direct succession is contained in the relation.
    pub fn contains_succession<S: AsRef<str>>(&self, from: S, to: S) -> bool {
        self.successions
            .contains_key(&(from.as_ref().to_string(), to.as_ref().to_string()))
    }

    /// Count of a direct succession (0 if absent)
    pub fn succession_count<S: AsRef<str>>(&self, from: S, to: S) -> u64 {
        self.successions
            .get(&(from.as_ref().to_string(), to.as_ref().to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// All activity names, both counted ones and those only appearing in successions
    pub fn all_activities(&self) -> HashSet<&str> {
        self.activities
            .keys()
            .map(String::as_str)
            .chain(
                self.successions
                    .keys()
                    .flat_map(|(a, b)| [a.as_str(), b.as_str()]),
            )
            .collect()
    }
}
