use crate::AppIdentity;

/// WHAT: Identities are case- and whitespace-normalized
/// WHY: Process names differ in case between OS reports and user input
#[test]
fn given_mixed_case_names_when_normalizing_then_identities_equal() {
    // Given: The same executable written three ways
    let names = ["Spotify.exe", " spotify.exe ", "SPOTIFY.EXE"];

    // When: Building identities
    let identities: Vec<AppIdentity> = names.iter().map(AppIdentity::new).collect();

    // Then: All normalize to the same lower-case key
    assert!(identities.iter().all(|id| id.as_str() == "spotify.exe"));
}

/// WHAT: Identity is derived from the file name of an executable path
/// WHY: The OS reports full image paths, grouping uses only the file name
#[test]
fn given_windows_image_path_when_building_identity_then_file_name_used() {
    // Given: A full Windows image path
    let path = r"C:\Program Files\Google\Chrome\Application\Chrome.exe";

    // When: Deriving the identity
    let identity = AppIdentity::from_executable_path(path);

    // Then: Only the lower-cased file name remains
    assert_eq!(identity.as_str(), "chrome.exe");
}

/// WHAT: The executable name keeps its case and accepts either separator
/// WHY: Process names are shown to the user as the OS reports them
#[test]
fn given_image_paths_when_taking_executable_name_then_file_name_with_case_kept() {
    assert_eq!(
        AppIdentity::executable_name(r"C:\Program Files\Spotify\Spotify.exe"),
        "Spotify.exe"
    );
    assert_eq!(AppIdentity::executable_name("/usr/bin/vlc"), "vlc");
    assert_eq!(AppIdentity::executable_name(r"C:\Temp\"), "");
}

/// WHAT: Identities deserialize through the same normalization
/// WHY: Hand-edited mapping files must match live sessions
#[test]
#[allow(clippy::unwrap_used)]
fn given_serialized_identity_when_deserializing_then_normalized() {
    use serde::{
        Deserialize,
        de::value::{Error, StrDeserializer},
    };

    // Given: An identity written in mixed case
    let raw = StrDeserializer::<Error>::new("Discord.EXE");

    // When: Deserializing it
    let identity = AppIdentity::deserialize(raw).unwrap();

    // Then: The identity is normalized
    assert_eq!(identity, AppIdentity::new("discord.exe"));
}
