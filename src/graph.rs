//! Graphviz export of a queried topology
//!
//! Renders a populated [`DomainInfo`] as a DOT digraph: publisher nodes
//! feed topic nodes feed subscriber nodes, left to right. Pipe the output
//! through `dot -Tsvg` to visualize a running system.

use std::io;

use crate::query::DomainInfo;

/// Write a DOT digraph of the domain topology to `out`
pub fn to_dot(info: &DomainInfo, out: &mut impl io::Write) -> io::Result<()> {
    writeln!(out, "digraph {{")?;
    writeln!(out, "  graph [splines=true, rankdir=LR]")?;
    writeln!(out, "  edge  [splines=true]")?;
    writeln!(out, "  node  [shape=box, style=\"rounded, filled\"]")?;

    // Publisher nodes
    writeln!(out, "{{")?;
    for topic in &info.topics {
        for publisher in &topic.pubs {
            writeln!(out, "\"{}\"[fillcolor=lightblue];", publisher.name)?;
        }
    }
    writeln!(out, "}}")?;

    // Topic nodes
    writeln!(out, "{{")?;
    for topic in &info.topics {
        writeln!(out, "\"{}\"[fillcolor=orange];", topic.name)?;
    }
    writeln!(out, "}}")?;

    // Subscriber nodes
    writeln!(out, "{{")?;
    for topic in &info.topics {
        for subscriber in &topic.subs {
            writeln!(out, "\"{}\"[fillcolor=green];", subscriber.name)?;
        }
    }
    writeln!(out, "}}")?;

    // Edges
    for topic in &info.topics {
        for publisher in &topic.pubs {
            writeln!(out, "\"{}\" -> \"{}\"", publisher.name, topic.name)?;
        }
        for subscriber in &topic.subs {
            writeln!(out, "\"{}\" -> \"{}\"", topic.name, subscriber.name)?;
        }
    }

    writeln!(out, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PubInfo, SubInfo, TopicInfo};

    #[test]
    fn test_dot_output() {
        let info = DomainInfo {
            name: "MAIN".to_string(),
            topics: vec![TopicInfo {
                name: "/sensor/raw".to_string(),
                data_type: "sensor.sample".to_string(),
                subs: vec![SubInfo {
                    name: "DETECTOR0".to_string(),
                    ..Default::default()
                }],
                pubs: vec![PubInfo {
                    name: "DRIVER0".to_string(),
                }],
                push_count: 0,
            }],
        };

        let mut out = Vec::new();
        to_dot(&info, &mut out).unwrap();
        let dot = String::from_utf8(out).unwrap();

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("\"DRIVER0\"[fillcolor=lightblue];"));
        assert!(dot.contains("\"/sensor/raw\"[fillcolor=orange];"));
        assert!(dot.contains("\"DETECTOR0\"[fillcolor=green];"));
        assert!(dot.contains("\"DRIVER0\" -> \"/sensor/raw\""));
        assert!(dot.contains("\"/sensor/raw\" -> \"DETECTOR0\""));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_empty_domain() {
        let info = DomainInfo::default();
        let mut out = Vec::new();
        to_dot(&info, &mut out).unwrap();
        let dot = String::from_utf8(out).unwrap();
        assert!(dot.starts_with("digraph {"));
    }
}
