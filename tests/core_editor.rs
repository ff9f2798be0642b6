use pipenet::{io, CoreEditor, EntityKind, NetEvent, PetriNet, Place, Token};

fn document() -> String {
    let mut net = PetriNet::new();
    net.add_token(Token::default_token()).unwrap();
    net.add_place(Place::new("P0", "P0").at(255.0, 240.0).with_tokens("Default", 1)).unwrap();
    io::to_json_string(&net).unwrap()
}

#[test]
fn editor_loads_pastes_and_reports_events() {
    let mut editor = CoreEditor::new(&document()).unwrap();
    assert!(editor.drain_events().is_empty());

    let pasted = editor.paste(&["P0".to_string()], 40.0, 20.0).unwrap();
    assert_eq!(pasted, ["P0_copied"]);
    assert_eq!(editor.drain_events(), vec![NetEvent::added(EntityKind::Place, "P0_copied")]);

    let place = editor.net().place("P0_copied").unwrap();
    assert_eq!((place.position.x, place.position.y), (295.0, 260.0));
    assert_eq!(place.token_count("Default"), 1);
}

#[test]
fn editor_reports_errors_as_strings() {
    assert!(CoreEditor::new("{}").unwrap_err().starts_with("Failed to load net"));

    let mut editor = CoreEditor::new(&document()).unwrap();
    assert!(editor.paste(&["P9".to_string()], 0.0, 0.0).is_err());
    assert_eq!(editor.remove("P0"), Ok(EntityKind::Place));
    assert!(editor.to_json().unwrap().contains("\"places\": []"));
}
