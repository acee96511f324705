//! Default display names for newly onboarded stores.

use cloudsync_client::Credential;

/// `DuraCloud Space {space}[/{prefix}] at {host} ({provider}) `
///
/// The trailing space is part of the name.
pub fn duracloud_store_name(
    space: &str,
    prefix: &str,
    credential: &Credential,
    provider_name: &str,
) -> String {
    let mut location = space.to_string();
    if !prefix.is_empty() {
        location.push('/');
        location.push_str(prefix);
    }
    format!(
        "DuraCloud Space {location} at {} ({provider_name}) ",
        credential.host()
    )
}

pub fn fedora_store_name(credential: &Credential) -> String {
    format!("Fedora Repository at {}", credential.host())
}
