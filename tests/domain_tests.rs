//! Domain registry and topology export tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vernet::{to_dot, Domain, DomainInfo, Envelope, Filter, VernetError, ENVELOPE_SIZE};

    #[test]
    fn test_envelope_contract() {
        assert_eq!(std::mem::size_of::<Envelope>(), ENVELOPE_SIZE);
        assert_eq!(std::mem::size_of::<Envelope>(), 256);
    }

    #[test]
    fn test_topic_uniqueness_and_type_agreement() {
        let d = Domain::new("DEFAULT");

        let t0 = d.create_topic("T", "A").unwrap();
        let err = d.create_topic("T", "B").unwrap_err();
        assert!(matches!(err, VernetError::TypeMismatch { .. }));
        let t1 = d.create_topic("T", "A").unwrap();

        assert!(Arc::ptr_eq(&t0, &t1));
        assert_eq!(d.topic_count(), 1);
    }

    #[test]
    fn test_names_are_scoped_per_domain() {
        let d0 = Domain::new("LEFT");
        let d1 = Domain::new("RIGHT");

        let t0 = d0.create_topic("/t", "A").unwrap();
        let t1 = d1.create_topic("/t", "B").unwrap();
        assert_eq!(t0.domain_name(), "LEFT");
        assert_eq!(t1.domain_name(), "RIGHT");
    }

    #[test]
    fn test_dump_with_filters() {
        let d = Domain::new("DEFAULT");
        d.create_topic("/a", "A").unwrap();
        d.create_topic("/b", "B").unwrap();

        // Log-only paths; just exercise every branch
        d.dump(&Filter::any());
        d.dump(&Filter::new("/a", "any"));
        d.dump(&Filter::new("any", "B"));
        d.dump(&Filter::new("/missing", "any"));
    }

    #[test]
    fn test_dot_export_of_live_domain() {
        let d = Domain::new("DEFAULT");
        let req = d.create_topic("/ping/req", "ping.msg").unwrap();
        let rsp = d.create_topic("/ping/rsp", "ping.msg").unwrap();

        let _req_pub = req.publish("CLIENT0");
        let _req_sub = req.subscribe("SERVER0", 16, None).unwrap();
        let _rsp_pub = rsp.publish("SERVER0");
        let _rsp_sub = rsp.subscribe("CLIENT0", 16, None).unwrap();

        let mut info = DomainInfo::default();
        d.query(&mut info, &Filter::any());

        let mut out = Vec::new();
        to_dot(&info, &mut out).unwrap();
        let dot = String::from_utf8(out).unwrap();

        assert!(dot.contains("\"/ping/req\"[fillcolor=orange];"));
        assert!(dot.contains("\"/ping/rsp\"[fillcolor=orange];"));
        assert!(dot.contains("\"CLIENT0\" -> \"/ping/req\""));
        assert!(dot.contains("\"/ping/req\" -> \"SERVER0\""));
        assert!(dot.contains("\"SERVER0\" -> \"/ping/rsp\""));
        assert!(dot.contains("\"/ping/rsp\" -> \"CLIENT0\""));
    }
}
