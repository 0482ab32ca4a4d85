use crate::{AudioError, VolumeAction};

/// WHAT: Every action round-trips through its tag
/// WHY: Tags are what the mapping file stores
#[test]
#[allow(clippy::unwrap_used)]
fn given_action_tags_when_parsing_then_same_action_returned() {
    // Given/When/Then: Each action parses back from its own tag
    for action in VolumeAction::ALL {
        assert_eq!(action.as_str().parse::<VolumeAction>().unwrap(), action);
    }
}

/// WHAT: Tags are matched case-insensitively
/// WHY: Configuration input is typed by hand
#[test]
#[allow(clippy::unwrap_used)]
fn given_upper_case_tag_when_parsing_then_recognized() {
    assert_eq!(
        " Toggle_Mute ".parse::<VolumeAction>().unwrap(),
        VolumeAction::ToggleMute
    );
}

/// WHAT: Unknown tags are rejected
/// WHY: Only the five recognised actions may be stored
#[test]
fn given_unknown_tag_when_parsing_then_unknown_action_error() {
    // Given: A tag that is not an action
    let tag = "louder";

    // When: Parsing
    let result = tag.parse::<VolumeAction>();

    // Then: UnknownAction carrying the tag
    assert!(matches!(
        result,
        Err(AudioError::UnknownAction { ref action, .. }) if action == "louder"
    ));
}

/// WHAT: Only increase and decrease use the step
/// WHY: Step validation is skipped for mute actions
#[test]
fn given_actions_when_checking_step_usage_then_only_stepping_actions() {
    let stepping: Vec<_> = VolumeAction::ALL
        .into_iter()
        .filter(VolumeAction::uses_step)
        .collect();
    assert_eq!(stepping, vec![VolumeAction::Increase, VolumeAction::Decrease]);
}
