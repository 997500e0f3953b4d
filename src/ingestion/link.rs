//! Link close approaches to their NEOs
//!
//! `NeoDatabase` owns every NEO and close approach in two arenas. A NEO lists
//! its approaches by `ApproachId` and each approach points back by `NeoId`;
//! neither side owns the other.
//!
//! Orphans (approaches whose designation is not in the catalogue) get a
//! placeholder NEO carrying only that designation, so after construction
//! every approach is linked.

use crate::ingestion::types::{ApproachId, CloseApproach, NearEarthObject, NeoId};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct NeoDatabase {
    neos: Vec<NearEarthObject>,
    approaches: Vec<CloseApproach>,
    by_designation: HashMap<String, NeoId>,
    by_name: HashMap<String, NeoId>,
}

/// Counts from a single linking pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkStats {
    pub linked: usize,
    pub orphans: usize,
    pub placeholders: usize,
}

impl std::fmt::Display for LinkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "linked: {}, orphans: {}, placeholders: {}",
            self.linked, self.orphans, self.placeholders
        )
    }
}

impl NeoDatabase {
    /// Build the indices and link every approach to its NEO.
    ///
    /// Runs in O(N + M). Approach order is kept both in the database and in
    /// each NEO's approach list.
    pub fn new(neos: Vec<NearEarthObject>, approaches: Vec<CloseApproach>) -> Self {
        let mut db = NeoDatabase {
            neos,
            approaches,
            by_designation: HashMap::new(),
            by_name: HashMap::new(),
        };

        db.build_indices();
        let stats = db.link();
        info!(
            "Database ready: {} NEOs, {} close approaches ({})",
            db.neos.len(),
            db.approaches.len(),
            stats
        );

        db
    }

    fn build_indices(&mut self) {
        for (idx, neo) in self.neos.iter().enumerate() {
            let id = NeoId(idx);

            if self.by_designation.contains_key(&neo.designation) {
                warn!(
                    "Duplicate designation '{}' at NEO {}, keeping the first",
                    neo.designation, idx
                );
            } else {
                self.by_designation.insert(neo.designation.clone(), id);
            }

            if let Some(name) = &neo.name {
                self.by_name.entry(name.clone()).or_insert(id);
            }
        }
    }

    fn link(&mut self) -> LinkStats {
        let mut stats = LinkStats::default();

        for idx in 0..self.approaches.len() {
            let key = self.approaches[idx].lookup_key();

            let neo_id = match self.by_designation.get(key).copied() {
                Some(id) => id,
                None => {
                    stats.orphans += 1;
                    let id = NeoId(self.neos.len());
                    let placeholder = NearEarthObject::placeholder(key);
                    debug!("No NEO for '{}', adding a placeholder", key);
                    self.by_designation.insert(placeholder.designation.clone(), id);
                    self.neos.push(placeholder);
                    stats.placeholders += 1;
                    id
                }
            };

            self.neos[neo_id.0].approaches.push(ApproachId(idx));
            self.approaches[idx].neo = Some(neo_id);
            stats.linked += 1;
        }

        if stats.orphans > 0 {
            warn!(
                "{} close approaches matched no NEO; linked to {} placeholders",
                stats.orphans, stats.placeholders
            );
        }

        stats
    }

    pub fn neo(&self, id: NeoId) -> Option<&NearEarthObject> {
        self.neos.get(id.0)
    }

    pub fn approach(&self, id: ApproachId) -> Option<&CloseApproach> {
        self.approaches.get(id.0)
    }

    pub fn get_neo_by_designation(&self, designation: &str) -> Option<&NearEarthObject> {
        self.by_designation
            .get(designation)
            .and_then(|&id| self.neo(id))
    }

    /// Names are not unique; the first NEO loaded with a name wins
    pub fn get_neo_by_name(&self, name: &str) -> Option<&NearEarthObject> {
        self.by_name.get(name).and_then(|&id| self.neo(id))
    }

    /// The NEO an approach is linked to, if any
    pub fn neo_of(&self, approach: &CloseApproach) -> Option<&NearEarthObject> {
        approach.neo_id().and_then(|id| self.neo(id))
    }

    /// A NEO's approaches, in input order
    pub fn approaches_of<'a>(
        &'a self,
        neo: &'a NearEarthObject,
    ) -> impl Iterator<Item = &'a CloseApproach> + 'a {
        neo.approach_ids().iter().filter_map(|&id| self.approach(id))
    }

    pub fn neos(&self) -> &[NearEarthObject] {
        &self.neos
    }

    pub fn approaches(&self) -> &[CloseApproach] {
        &self.approaches
    }

    /// Approaches, in input order, whose linked pair satisfies `predicate`
    pub fn query<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a CloseApproach> + 'a
    where
        P: Fn(&CloseApproach, &NearEarthObject) -> bool + 'a,
    {
        self.approaches.iter().filter(move |&approach| {
            self.neo_of(approach)
                .is_some_and(|neo| predicate(approach, neo))
        })
    }
}

/// Truncate a stream to `n` items; `0` means no limit
pub fn limit<I>(iter: I, n: usize) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator,
{
    let n = if n == 0 { usize::MAX } else { n };
    iter.into_iter().take(n)
}
