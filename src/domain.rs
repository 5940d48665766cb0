//! Domain: named registry of topics
//!
//! A domain owns its topics for the life of the process; topics are created
//! on first use and never removed. Lookup is linear over a vector behind a
//! shared/exclusive lock, which is plenty for the expected topic counts.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{error, info};

use crate::error::{Result, VernetError};
use crate::query::{clear_domain_info, DomainInfo, Filter, TopicInfo};
use crate::topic::Topic;

/// Top-level container for topics; the unit of naming and bulk operations.
///
/// Domain names are all-caps by convention ("DEFAULT", "MAIN", ...).
pub struct Domain {
    name: String,
    topics: RwLock<Vec<Arc<Topic>>>,
}

impl Domain {
    /// Create a domain
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            topics: RwLock::new(Vec::new()),
        }
    }

    /// Domain name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of topics
    pub fn topic_count(&self) -> usize {
        self.topics.read().unwrap().len()
    }

    /// Create a topic, or join the existing one.
    ///
    /// Topic names are unique within the domain. If a topic with this name
    /// already exists and the data types match, the existing topic is
    /// returned and used for all further pub/sub operations; a data-type
    /// mismatch is an error. Topics live as long as the domain.
    pub fn create_topic(&self, name: &str, data_type: &str) -> Result<Arc<Topic>> {
        let mut topics = self.topics.write().unwrap();

        for topic in topics.iter() {
            if topic.name() == name {
                if topic.data_type() == data_type {
                    return Ok(topic.clone());
                }
                error!(
                    "topic {} already exists: data-type {} requested {}",
                    name,
                    topic.data_type(),
                    data_type
                );
                return Err(VernetError::type_mismatch(
                    name,
                    topic.data_type(),
                    data_type,
                ));
            }
        }

        let topic = Arc::new(Topic::new(&self.name, name, data_type));
        topics.push(topic.clone());

        info!("new-topic {} data-type {}", topic.name(), topic.data_type());
        Ok(topic)
    }

    /// Dump domain state for matching topics into the log
    pub fn dump(&self, filter: &Filter) {
        let topics = self.topics.read().unwrap();

        if filter.is_any() {
            info!("ntopics {}", topics.len());
            for topic in topics.iter() {
                topic.dump();
            }
            return;
        }

        for topic in topics.iter() {
            if filter.matches(topic.name(), topic.data_type()) {
                topic.dump();
            }
        }
    }

    /// Query matching topics into a caller-owned record.
    ///
    /// The record is cleared first; matched topics are appended in creation
    /// order. Preallocate with `query::init_domain_info` to keep periodic
    /// queries from growing allocations.
    pub fn query(&self, info: &mut DomainInfo, filter: &Filter) {
        clear_domain_info(info);
        info.name.push_str(&self.name);

        let topics = self.topics.read().unwrap();
        for topic in topics.iter() {
            if !filter.matches(topic.name(), topic.data_type()) {
                continue;
            }
            info.topics.push(TopicInfo::default());
            topic.query(info.topics.last_mut().unwrap());
        }
    }

    /// Wake the subscribers of every matching topic
    pub fn kick(&self, filter: &Filter) {
        let topics = self.topics.read().unwrap();
        for topic in topics.iter() {
            if filter.matches(topic.name(), topic.data_type()) {
                topic.kick();
            }
        }
    }

    /// Wake the subscribers of every matching topic and force `timeout`
    /// onto their subsequent waits
    pub fn shutdown(&self, timeout: Duration, filter: &Filter) {
        let topics = self.topics.read().unwrap();
        for topic in topics.iter() {
            if filter.matches(topic.name(), topic.data_type()) {
                topic.shutdown(timeout);
            }
        }
    }
}
