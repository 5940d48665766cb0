//! Query records and filters
//!
//! Plain data-transfer structs filled by `Domain::query` / `Topic::query`.
//! The records are caller-owned and reusable: [`init`] reserves capacity for
//! known topic/sub/pub counts so periodic queries on a hot system do not
//! grow allocations mid-traversal.

use serde::{Deserialize, Serialize};

/// Wildcard token accepted by either filter field
pub const ANY: &str = "any";

/// Publisher info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubInfo {
    /// Publisher name
    pub name: String,
}

/// Subscriber info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubInfo {
    /// Subscriber name
    pub name: String,
    /// Number of pushed envelopes (including dropped)
    pub push_count: u32,
    /// Number of dropped envelopes
    pub drop_count: u32,
    /// Queue capacity
    pub qcapacity: u32,
    /// Queue size (number of queued envelopes, approximate)
    pub qsize: u32,
}

/// Topic info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    /// Topic name
    pub name: String,
    /// Data type name
    pub data_type: String,
    /// Subscribers in registration order
    pub subs: Vec<SubInfo>,
    /// Publishers in registration order
    pub pubs: Vec<PubInfo>,
    /// Total pushed envelopes (the topic sequence counter)
    pub push_count: u64,
}

/// Domain info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Domain name
    pub name: String,
    /// Topics in creation order
    pub topics: Vec<TopicInfo>,
}

/// Two-field query selector; [`ANY`] in either field matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Topic name or "any"
    pub topic_name: String,
    /// Data type name or "any"
    pub data_type: String,
}

impl Filter {
    /// Build a filter from topic-name and data-type selectors
    pub fn new(topic_name: &str, data_type: &str) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            data_type: data_type.to_string(),
        }
    }

    /// Filter that matches every topic
    pub fn any() -> Self {
        Self::new(ANY, ANY)
    }

    /// Whether both fields are wildcards
    pub fn is_any(&self) -> bool {
        self.topic_name == ANY && self.data_type == ANY
    }

    /// Whether a topic with this name and data type passes the filter
    pub fn matches(&self, topic_name: &str, data_type: &str) -> bool {
        if self.topic_name != ANY && self.topic_name != topic_name {
            return false;
        }
        if self.data_type != ANY && self.data_type != data_type {
            return false;
        }
        true
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::any()
    }
}

/// Preallocate a topic record for `nsubs` subscribers and `npubs` publishers
pub fn init_topic_info(info: &mut TopicInfo, nsubs: usize, npubs: usize) {
    info.name.reserve(128);
    info.data_type.reserve(128);
    info.subs.reserve(nsubs);
    info.pubs.reserve(npubs);
}

/// Preallocate a domain record for `ntopics` topics of `nsubs`/`npubs` each
pub fn init_domain_info(info: &mut DomainInfo, ntopics: usize, nsubs: usize, npubs: usize) {
    info.name.reserve(128);
    info.topics.reserve(ntopics);
    for topic in &mut info.topics {
        init_topic_info(topic, nsubs, npubs);
    }
}

/// Clear a topic record, keeping its allocations
pub fn clear_topic_info(info: &mut TopicInfo) {
    info.name.clear();
    info.data_type.clear();
    info.subs.clear();
    info.pubs.clear();
    info.push_count = 0;
}

/// Clear a domain record, keeping its allocations
pub fn clear_domain_info(info: &mut DomainInfo) {
    info.name.clear();
    info.topics.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_wildcards() {
        let f = Filter::any();
        assert!(f.is_any());
        assert!(f.matches("/a/b", "x.y"));

        let f = Filter::new("/a/b", ANY);
        assert!(f.matches("/a/b", "whatever"));
        assert!(!f.matches("/a/c", "whatever"));

        let f = Filter::new(ANY, "x.y");
        assert!(f.matches("/anything", "x.y"));
        assert!(!f.matches("/anything", "x.z"));

        let f = Filter::new("/a/b", "x.y");
        assert!(f.matches("/a/b", "x.y"));
        assert!(!f.matches("/a/b", "x.z"));
    }

    #[test]
    fn test_init_reserves_capacity() {
        let mut di = DomainInfo::default();
        init_domain_info(&mut di, 100, 10, 10);
        assert!(di.topics.capacity() >= 100);
        assert!(di.name.capacity() >= 128);
    }

    #[test]
    fn test_clear_keeps_allocations() {
        let mut di = DomainInfo::default();
        init_domain_info(&mut di, 16, 4, 4);
        di.name.push_str("MAIN");
        di.topics.push(TopicInfo::default());

        let cap = di.topics.capacity();
        clear_domain_info(&mut di);
        assert!(di.name.is_empty());
        assert!(di.topics.is_empty());
        assert_eq!(di.topics.capacity(), cap);
    }
}
