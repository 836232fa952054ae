use crate::error::Result;
use crate::people::{PeopleApi, Person, SEARCH_READ_MASK};
use crate::retry::{Pause, RetryPolicy};
use renumber_core::NormalizedNumber;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Looks a number up under each of its search variants and merges the hits.
///
/// Hits keep the order in which they were first seen and appear once per
/// `resourceName`. A variant whose query fails is logged and skipped.
pub fn search_contacts(
    api: &mut dyn PeopleApi,
    policy: &RetryPolicy,
    pause: &mut dyn Pause,
    number: &NormalizedNumber,
) -> Vec<Person> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::new();

    for variant in number.variants() {
        let result: Result<Vec<Person>> =
            policy.execute(pause, || api.search_contacts(&variant, SEARCH_READ_MASK));
        match result {
            Ok(people) => {
                debug!(variant = %variant, count = people.len(), "search variant returned");
                for person in people {
                    if person.resource_name.is_empty() {
                        continue;
                    }
                    if seen.insert(person.resource_name.clone()) {
                        hits.push(person);
                    }
                }
            }
            Err(err) => {
                warn!(variant = %variant, error = %err, "search failed for variant");
            }
        }
    }

    hits
}
