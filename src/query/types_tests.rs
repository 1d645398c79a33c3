//! Unit tests for query types

#[cfg(test)]
mod tests {
    use crate::grammar::ClauseType;
    use crate::query::types::*;

    #[test]
    fn test_range_map_and_invert() {
        let range = RangeValue::Between(1, 5).map(|v| v * 10);
        assert_eq!(range, RangeValue::Between(10, 50));
        assert_eq!(RangeValue::Gt(3).invert(), RangeValue::Lt(3));
        assert_eq!(RangeValue::Between(1, 2).invert(), RangeValue::Between(2, 1));
        assert_eq!(RangeValue::Eq(7).invert(), RangeValue::Eq(7));
    }

    #[test]
    fn test_range_try_map() {
        let ok = RangeValue::In(vec!["1", "2"]).try_map(|s| s.parse::<i64>().ok());
        assert_eq!(ok, Some(RangeValue::In(vec![1, 2])));
        let bad = RangeValue::Between("1", "x").try_map(|s| s.parse::<i64>().ok());
        assert!(bad.is_none());
    }

    #[test]
    fn test_presence() {
        assert_eq!(Presence::parse("ANY"), Some(Presence::Any));
        assert_eq!(Presence::parse("none"), Some(Presence::None));
        assert_eq!(Presence::parse("nobody"), None);
        assert_eq!(Presence::Any.invert(), Presence::None);
    }

    #[test]
    fn test_clauses_push_unique() {
        let mut clauses: Clauses<String> = Clauses::default();
        clauses.push_unique(ClauseType::Must, "a".into());
        clauses.push_unique(ClauseType::Must, "a".into());
        clauses.push_unique(ClauseType::MustNot, "a".into());
        assert_eq!(clauses.must, vec!["a"]);
        assert_eq!(clauses.must_not, vec!["a"]);
        assert_eq!(clauses.len(), 2);
        let clauses_seen: Vec<ClauseType> = clauses.iter().map(|(c, _)| c).collect();
        assert_eq!(clauses_seen, vec![ClauseType::Must, ClauseType::MustNot]);
    }

    #[test]
    fn test_field_value_accessors() {
        let values = FieldValue::Values(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(values.values().len(), 2);
        assert!(values.single().is_none());

        let single = FieldValue::Single(Value::Text("score".into()));
        assert_eq!(single.as_text(), Some("score"));
        assert!(single.values().is_empty());

        assert_eq!(FieldValue::Presence(Presence::Any).presence(), Some(Presence::Any));
    }

    #[test]
    fn test_hides_deleted() {
        let mut query = Query::default();
        assert!(query.hides_deleted(false));
        assert!(!query.hides_deleted(true));

        query.metatags.insert(
            "status".into(),
            FieldValue::Single(Value::Text("deleted".into())),
        );
        assert!(!query.hides_deleted(false));
    }

    #[test]
    fn test_hides_deleted_looks_into_groups() {
        let mut inner = Query::default();
        inner.metatags.insert(
            "status_must_not".into(),
            FieldValue::Single(Value::Text("active".into())),
        );
        let mut query = Query::default();
        query.groups.push_unique(ClauseType::Should, GroupEntry::Parsed(inner));
        assert!(!query.hides_deleted(false));

        let mut flat = Query::default();
        flat.groups
            .push_unique(ClauseType::Must, GroupEntry::Unparsed("aaa delreason:spam".into()));
        assert!(!flat.hides_deleted(false));

        let mut plain = Query::default();
        plain
            .groups
            .push_unique(ClauseType::Must, GroupEntry::Unparsed("aaa bbb".into()));
        assert!(plain.hides_deleted(false));
    }

    #[test]
    fn test_serializes_to_json() {
        let mut query = Query::default();
        query.tags.push_unique(ClauseType::Must, "aaa".into());
        query.metatags.insert(
            "width".into(),
            FieldValue::Values(vec![Value::IntRange(RangeValue::Gte(100))]),
        );
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["tags"]["must"][0], "aaa");
        assert_eq!(json["metatags"]["width"][0]["gte"], 100);
    }
}
