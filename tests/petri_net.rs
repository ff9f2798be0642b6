use pipenet::{
    Annotation, Arc, ArcPoint, ArcType, CapacityPolicy, Change, EntityKind, NetConfig, NetError, NetEvent,
    PetriNet, Place, Position, Rate, RateParameter, Rgb, Token, Transition,
};

fn net_with_default_token() -> PetriNet {
    let mut net = PetriNet::new();
    net.add_token(Token::default_token()).unwrap();
    net.drain_events();
    net
}

fn connected_net() -> PetriNet {
    let mut net = net_with_default_token();
    net.add_place(Place::new("P0", "P0").with_tokens("Default", 1)).unwrap();
    net.add_transition(Transition::new("T0", "T0")).unwrap();
    net.add_place(Place::new("P1", "P1")).unwrap();
    net.add_arc(Arc::between("P0", "T0", ArcType::Normal)).unwrap();
    net.add_arc(Arc::between("T0", "P1", ArcType::Normal)).unwrap();
    net.drain_events();
    net
}

#[test]
fn add_emits_added_notifications_in_order() {
    let mut net = net_with_default_token();
    net.add_place(Place::new("P0", "P0")).unwrap();
    net.add_transition(Transition::new("T0", "T0")).unwrap();
    net.add_arc(Arc::between("P0", "T0", ArcType::Normal)).unwrap();

    assert_eq!(
        net.drain_events(),
        vec![
            NetEvent::added(EntityKind::Place, "P0"),
            NetEvent::added(EntityKind::Transition, "T0"),
            NetEvent::added(EntityKind::Arc, "P0 TO T0"),
        ]
    );
    assert!(net.pending_events().is_empty());
}

#[test]
fn add_arc_with_unknown_endpoint_leaves_net_unchanged() {
    let mut net = connected_net();
    let before = net.clone();

    let err = net.add_arc(Arc::between("P0", "T9", ArcType::Normal)).unwrap_err();
    assert_eq!(
        err,
        NetError::UnknownEntityReference { kind: None, id: "T9".into() }
    );
    let err = net.add_arc(Arc::between("P9", "T0", ArcType::Normal)).unwrap_err();
    assert!(matches!(err, NetError::UnknownEntityReference { .. }));

    assert_eq!(net, before);
    assert!(net.pending_events().is_empty());
}

#[test]
fn add_arc_rejects_illegal_connections() {
    let mut net = connected_net();

    let err = net.add_arc(Arc::between("P0", "P1", ArcType::Normal)).unwrap_err();
    assert_eq!(
        err,
        NetError::InvalidConnection {
            arc: "P0 TO P1".into(),
            arc_type: ArcType::Normal,
            source_kind: EntityKind::Place,
            target_kind: EntityKind::Place,
        }
    );
    assert!(matches!(
        net.add_arc(Arc::between("T0", "P0", ArcType::BackwardNormal)),
        Err(NetError::InvalidConnection { .. })
    ));
    assert!(net.add_arc(Arc::between("P1", "T0", ArcType::Inhibitor)).is_ok());
}

#[test]
fn add_arc_to_existing_non_node_is_an_invalid_connection() {
    let mut net = connected_net();
    net.add_annotation(Annotation::new("A0", 10.0, 10.0, "note", 40.0, 20.0, true)).unwrap();
    net.drain_events();
    let before = net.clone();

    let err = net.add_arc(Arc::between("P0", "A0", ArcType::Normal)).unwrap_err();
    assert_eq!(
        err,
        NetError::InvalidConnection {
            arc: "P0 TO A0".into(),
            arc_type: ArcType::Normal,
            source_kind: EntityKind::Place,
            target_kind: EntityKind::Annotation,
        }
    );
    assert!(matches!(
        net.add_arc(Arc::between("Default", "T0", ArcType::Normal)),
        Err(NetError::InvalidConnection { source_kind: EntityKind::Token, .. })
    ));
    assert_eq!(net, before);
    assert!(net.pending_events().is_empty());
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let mut net = connected_net();
    let before = net.clone();

    assert_eq!(
        net.set_position("P0", Position::new(f64::NAN, 0.0)),
        Err(NetError::NonFiniteCoordinate { kind: EntityKind::Place, id: "P0".into() })
    );
    assert!(net.set_position("T0", Position::new(0.0, f64::INFINITY)).is_err());
    assert!(net.add_place(Place::new("P2", "P2").at(f64::NEG_INFINITY, 0.0)).is_err());
    assert!(net
        .add_annotation(Annotation::new("A0", 0.0, 0.0, "note", f64::NAN, 20.0, false))
        .is_err());
    assert!(net
        .set_arc_points("P0 TO T0", vec![ArcPoint::new(f64::INFINITY, 1.0, false)])
        .is_err());
    let bent = Arc::between("P1", "T0", ArcType::Inhibitor).with_point(ArcPoint::new(f64::NAN, 0.0, true));
    assert!(net.add_arc(bent).is_err());
    assert_eq!(net, before);
    assert!(net.pending_events().is_empty());

    net.set_position("P0", Position::new(-12.5, 1e6)).unwrap();
    assert_eq!(net.place("P0").unwrap().position, Position::new(-12.5, 1e6));
}

#[test]
fn add_arc_rejects_unregistered_weight_token() {
    let mut net = connected_net();
    let arc = Arc::new("P1 TO T0", "P1", "T0", ArcType::Normal).with_weight("red", "2");
    assert_eq!(
        net.add_arc(arc),
        Err(NetError::UnknownEntityReference { kind: Some(EntityKind::Token), id: "red".into() })
    );
}

#[test]
fn ids_are_unique_across_entity_kinds() {
    let mut net = connected_net();
    assert_eq!(
        net.add_transition(Transition::new("P0", "P0")),
        Err(NetError::DuplicateIdentifier("P0".into()))
    );
    assert_eq!(
        net.add_annotation(Annotation::new("Default", 0.0, 0.0, "x", 10.0, 10.0, false)),
        Err(NetError::DuplicateIdentifier("Default".into()))
    );
    assert_eq!(
        net.add_place(Place::new("", "nameless")),
        Err(NetError::InvalidIdentifier(String::new()))
    );
}

#[test]
fn add_place_rejects_unknown_token_counts() {
    let mut net = net_with_default_token();
    let err = net.add_place(Place::new("P0", "P0").with_tokens("red", 1)).unwrap_err();
    assert_eq!(err, NetError::UnknownEntityReference { kind: Some(EntityKind::Token), id: "red".into() });
    assert!(net.place("P0").is_none());
}

#[test]
fn removing_place_cascades_to_each_incident_arc() {
    let mut net = connected_net();
    net.remove_place("P0").unwrap();

    assert_eq!(
        net.drain_events(),
        vec![
            NetEvent::removed(EntityKind::Arc, "P0 TO T0"),
            NetEvent::removed(EntityKind::Place, "P0"),
        ]
    );
    assert!(net.arc("P0 TO T0").is_none());
    assert!(net.arc("T0 TO P1").is_some());
}

#[test]
fn removing_transition_cascades_to_both_directions() {
    let mut net = connected_net();
    net.remove_transition("T0").unwrap();
    assert_eq!(net.arcs().count(), 0);
    assert_eq!(net.drain_events().len(), 3);
}

#[test]
fn token_in_use_cannot_be_removed() {
    let mut net = net_with_default_token();
    net.add_token(Token::new("red", true, 1, Rgb::new(255, 0, 0))).unwrap();
    net.add_place(Place::new("P0", "P0").with_tokens("red", 2)).unwrap();

    let err = net.remove_token("red").unwrap_err();
    assert_eq!(err, NetError::TokenInUse { token: "red".into(), holder: "place P0".into() });
    assert!(net.token("red").is_some());

    net.set_token_count("P0", "red", 0).unwrap();
    assert!(net.remove_token("red").is_ok());
    assert!(net.token("red").is_none());
}

#[test]
fn token_removal_succeeds_after_holder_is_removed() {
    let mut net = net_with_default_token();
    net.add_token(Token::new("red", true, 1, Rgb::new(255, 0, 0))).unwrap();
    net.add_place(Place::new("P0", "P0").with_tokens("red", 2)).unwrap();
    net.remove_place("P0").unwrap();
    assert!(net.remove_token("red").is_ok());
}

#[test]
fn token_weighed_by_arc_is_in_use() {
    let mut net = connected_net();
    net.add_token(Token::new("red", true, 1, Rgb::new(255, 0, 0))).unwrap();
    net.set_arc_weight("P0 TO T0", "red", "3").unwrap();

    assert!(matches!(net.remove_token("red"), Err(NetError::TokenInUse { .. })));

    assert_eq!(net.remove_arc_weight("P0 TO T0", "red").unwrap(), Some("3".into()));
    assert!(net.remove_token("red").is_ok());
}

#[test]
fn transition_with_unknown_rate_parameter_is_rejected() {
    let mut net = PetriNet::new();
    let transition = Transition::new("T0", "T0").with_rate(Rate::Parameter("foo".into()));
    assert_eq!(
        net.add_transition(transition.clone()),
        Err(NetError::UnknownRateParameter("foo".into()))
    );

    net.add_rate_parameter(RateParameter::new("foo", "foo", "6.0")).unwrap();
    assert!(net.add_transition(transition).is_ok());
}

#[test]
fn rate_parameter_in_use_fails_closed() {
    let mut net = PetriNet::new();
    net.add_rate_parameter(RateParameter::new("foo", "foo", "6.0")).unwrap();
    net.add_transition(Transition::new("T0", "T0").with_rate(Rate::Parameter("foo".into()))).unwrap();

    assert_eq!(
        net.remove_rate_parameter("foo"),
        Err(NetError::RateParameterInUse { parameter: "foo".into(), transition: "T0".into() })
    );

    net.set_transition_rate("T0", Rate::Inline("2.0".into())).unwrap();
    let transition = net.transition("T0").unwrap();
    assert_eq!(transition.rate_expr(), Some("2.0"));
    assert_eq!(transition.rate_parameter(), None);
    assert!(net.remove_rate_parameter("foo").is_ok());
}

#[test]
fn strict_capacity_rejects_overfull_markings() {
    let mut net = net_with_default_token();
    let err = net
        .add_place(Place::new("P0", "P0").with_capacity(2).with_tokens("Default", 3))
        .unwrap_err();
    assert_eq!(err, NetError::CapacityExceeded { place: "P0".into(), total: 3, capacity: 2 });

    net.add_place(Place::new("P0", "P0").with_capacity(2).with_tokens("Default", 2)).unwrap();
    assert!(matches!(net.set_token_count("P0", "Default", 5), Err(NetError::CapacityExceeded { .. })));
    assert!(matches!(net.set_place_capacity("P0", 1), Err(NetError::CapacityExceeded { .. })));
    assert_eq!(net.place("P0").unwrap().token_count("Default"), 2);
    assert_eq!(net.place("P0").unwrap().capacity, 2);
}

#[test]
fn clamping_capacity_trims_markings() {
    let mut net = PetriNet::with_config(NetConfig { capacity_policy: CapacityPolicy::Clamp });
    net.add_token(Token::default_token()).unwrap();
    net.add_place(Place::new("P0", "P0").with_capacity(2).with_tokens("Default", 3)).unwrap();
    assert_eq!(net.place("P0").unwrap().token_count("Default"), 2);

    net.drain_events();
    net.set_place_capacity("P0", 1).unwrap();
    assert_eq!(net.place("P0").unwrap().token_count("Default"), 1);
    assert_eq!(
        net.drain_events(),
        vec![
            NetEvent::changed(EntityKind::Place, "P0", "capacity"),
            NetEvent::changed(EntityKind::Place, "P0", "tokenCounts"),
        ]
    );
}

#[test]
fn setters_emit_changed_with_field() {
    let mut net = connected_net();
    net.set_position("P0", Position::new(10.0, 20.0)).unwrap();
    net.set_transition_priority("T0", 4).unwrap();
    net.set_transition_timed("T0", true).unwrap();
    net.set_name("T0", "fire").unwrap();

    let events = net.drain_events();
    let fields: Vec<_> = events
        .iter()
        .map(|event| match &event.change {
            Change::Changed { field } => field.as_str(),
            other => panic!("unexpected change {other:?}"),
        })
        .collect();
    assert_eq!(fields, ["position", "priority", "timed", "name"]);
    assert_eq!(net.place("P0").unwrap().position, Position::new(10.0, 20.0));
    assert_eq!(net.transition("T0").unwrap().name, "fire");
}

#[test]
fn failed_setters_do_not_notify() {
    let mut net = connected_net();
    assert!(net.set_transition_priority("T9", 1).is_err());
    assert!(net.set_token_count("P0", "red", 1).is_err());
    assert!(net.set_position("P0 TO T0", Position::default()).is_err());
    assert!(net.pending_events().is_empty());
}

#[test]
fn remove_dispatches_on_kind() {
    let mut net = connected_net();
    assert_eq!(net.remove("P0 TO T0"), Ok(EntityKind::Arc));
    assert_eq!(net.remove("P1"), Ok(EntityKind::Place));
    assert_eq!(
        net.remove("nothing"),
        Err(NetError::UnknownEntityReference { kind: None, id: "nothing".into() })
    );
}

#[test]
fn next_ids_skip_used_ones() {
    let net = connected_net();
    assert_eq!(net.next_place_id(), "P2");
    assert_eq!(net.next_transition_id(), "T1");
    assert_eq!(net.next_annotation_id(), "A0");
}

#[test]
fn inbound_and_outbound_arcs() {
    let net = connected_net();
    let inbound: Vec<_> = net.inbound_arcs("T0").map(|arc| arc.id.as_str()).collect();
    let outbound: Vec<_> = net.outbound_arcs("T0").map(|arc| arc.id.as_str()).collect();
    assert_eq!(inbound, ["P0 TO T0"]);
    assert_eq!(outbound, ["T0 TO P1"]);
}
