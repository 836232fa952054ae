#![allow(dead_code)]

use renumber_sync::people::{PeopleApi, Person, PhoneNumber, PhoneUpdate};
use renumber_sync::{Pause, Result, SyncError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingPause {
    pub delays: Vec<Duration>,
}

impl Pause for RecordingPause {
    fn pause(&mut self, duration: Duration) {
        self.delays.push(duration);
    }
}

/// In-memory People API. Unscripted searches return nothing.
#[derive(Default)]
pub struct FakePeople {
    pub search_results: HashMap<String, Vec<Person>>,
    pub search_statuses: HashMap<String, VecDeque<u16>>,
    pub people: HashMap<String, Person>,
    pub get_statuses: HashMap<String, u16>,
    pub update_statuses: HashMap<String, u16>,
    /// Contacts another writer touches right after each fetch.
    pub edited_after_get: HashSet<String>,
    pub searches: Vec<String>,
    pub gets: Vec<String>,
    pub updates: Vec<(String, String, PhoneUpdate)>,
}

impl FakePeople {
    pub fn with_contact(mut self, query: &str, person: Person) -> Self {
        let hit = Person {
            resource_name: person.resource_name.clone(),
            names: person.names.clone(),
            phone_numbers: person.phone_numbers.clone(),
            etag: None,
        };
        self.search_results
            .entry(query.to_string())
            .or_default()
            .push(hit);
        self.people.insert(person.resource_name.clone(), person);
        self
    }

    /// Queues failing statuses for a query before it starts to answer.
    pub fn failing_search(mut self, query: &str, statuses: &[u16]) -> Self {
        self.search_statuses
            .entry(query.to_string())
            .or_default()
            .extend(statuses.iter().copied());
        self
    }
}

impl PeopleApi for FakePeople {
    fn search_contacts(&mut self, query: &str, read_mask: &str) -> Result<Vec<Person>> {
        assert_eq!(read_mask, "names,phoneNumbers");
        self.searches.push(query.to_string());
        if let Some(statuses) = self.search_statuses.get_mut(query) {
            if let Some(status) = statuses.pop_front() {
                return Err(SyncError::http(status, "scripted failure"));
            }
        }
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    fn get_person(&mut self, resource_name: &str, person_fields: &str) -> Result<Person> {
        assert_eq!(person_fields, "phoneNumbers");
        self.gets.push(resource_name.to_string());
        if let Some(status) = self.get_statuses.get(resource_name) {
            return Err(SyncError::http(*status, "scripted failure"));
        }
        let person = self
            .people
            .get_mut(resource_name)
            .ok_or_else(|| SyncError::http(404, "Requested entity was not found."))?;
        let fetched = person.clone();
        if self.edited_after_get.contains(resource_name) {
            person.etag = Some("edited-elsewhere".to_string());
        }
        Ok(fetched)
    }

    fn update_contact(
        &mut self,
        resource_name: &str,
        update_person_fields: &str,
        body: &PhoneUpdate,
    ) -> Result<Person> {
        self.updates.push((
            resource_name.to_string(),
            update_person_fields.to_string(),
            body.clone(),
        ));
        if let Some(status) = self.update_statuses.get(resource_name) {
            return Err(SyncError::http(*status, "scripted failure"));
        }
        let person = self
            .people
            .get_mut(resource_name)
            .ok_or_else(|| SyncError::http(404, "Requested entity was not found."))?;
        if person.etag.as_deref() != Some(body.etag.as_str()) {
            return Err(SyncError::http(400, "etag mismatch"));
        }
        person.phone_numbers = body.phone_numbers.clone();
        person.etag = Some(format!("{}-next", body.etag));
        Ok(person.clone())
    }
}

pub fn person(resource_name: &str, etag: &str, phones: &[&str]) -> Person {
    Person {
        resource_name: resource_name.to_string(),
        etag: Some(etag.to_string()),
        names: Vec::new(),
        phone_numbers: phones
            .iter()
            .map(|value| PhoneNumber {
                value: value.to_string(),
                kind: Some("mobile".to_string()),
            })
            .collect(),
    }
}
