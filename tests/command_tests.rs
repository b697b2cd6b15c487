//! Command Builder Tests

use heoslink::protocol::{Attributes, Command, CommandGroup};

#[test]
fn test_command_without_attributes() {
    let line = Command::SYSTEM_HEART_BEAT.to_wire(&Attributes::new());
    assert_eq!(line, "heos://system/heart_beat");
}

#[test]
fn test_command_with_attributes() {
    let attrs = Attributes::builder()
        .value("pid", 0)
        .value("level", 10)
        .build();
    let line = Command::PLAYER_SET_VOLUME.to_wire(&attrs);
    assert_eq!(line, "heos://player/set_volume?pid=0&level=10");
}

#[test]
fn test_values_are_not_escaped() {
    let attrs = Attributes::builder()
        .value("un", "me@example.com")
        .value("pw", "a b&c")
        .build();
    let line = Command::SYSTEM_SIGN_IN.to_wire(&attrs);
    assert_eq!(line, "heos://system/sign_in?un=me@example.com&pw=a b&c");
}

#[test]
fn test_display() {
    assert_eq!(Command::GROUP_GET_GROUPS.to_string(), "group/get_groups");
    assert_eq!(Command::PLAYER_GET_VOLUME.group(), CommandGroup::Player);
    assert_eq!(Command::PLAYER_GET_VOLUME.name(), "get_volume");
}

// =============================================================================
// Echo Parsing
// =============================================================================

#[test]
fn test_parse_known_command_equals_constant() {
    let command: Command = "system/heart_beat".parse().unwrap();
    assert_eq!(command, Command::SYSTEM_HEART_BEAT);
}

#[test]
fn test_parse_unknown_name_in_known_group() {
    let command: Command = "browse/get_search_criteria".parse().unwrap();
    assert_eq!(command.group(), CommandGroup::Browse);
    assert_eq!(command.name(), "get_search_criteria");
}

#[test]
fn test_parse_rejects_malformed() {
    assert!("heart_beat".parse::<Command>().is_err());
    assert!("system/".parse::<Command>().is_err());
    assert!("radio/play".parse::<Command>().is_err());
}
