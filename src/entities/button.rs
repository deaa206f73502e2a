use crate::api::CommandDescriptor;
use crate::coordinator::FleetCoordinator;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashSet;

/// Pressable remote command bound to one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonSpec {
    pub unique_id: String,
    pub device_id: String,
    pub command: i64,
    pub title: String,
    pub icon: &'static str,
}

impl ButtonSpec {
    fn new(device_id: &str, command: i64, title: String) -> Self {
        Self {
            unique_id: format!("{device_id}_{command}_command"),
            device_id: device_id.to_string(),
            command,
            title,
            icon: "mdi:gesture-tap-button",
        }
    }

    /// Dispatch the bound command through the coordinator
    pub async fn press(&self, coordinator: &FleetCoordinator) -> Result<bool> {
        coordinator.send_command(&self.device_id, self.command).await
    }
}

/// Buttons for a device's command list.
///
/// Diagnostic commands are skipped. A descriptor whose id is already taken
/// on this device is dropped together with its reverse; otherwise the
/// reverse becomes an extra `Undo: ...` button if its id is still free.
pub fn derive_buttons(device_id: &str, commands: &[CommandDescriptor]) -> Vec<ButtonSpec> {
    let mut seen = HashSet::new();
    let mut buttons = Vec::new();

    for descriptor in commands.iter().filter(|d| !d.is_diagnostic()) {
        if !seen.insert(descriptor.command) {
            continue;
        }
        buttons.push(ButtonSpec::new(
            device_id,
            descriptor.command,
            descriptor.title.clone(),
        ));

        if let Some(reverse) = descriptor.reverse_command()
            && seen.insert(reverse)
        {
            buttons.push(ButtonSpec::new(
                device_id,
                reverse,
                format!("Undo: {}", descriptor.title),
            ));
        }
    }

    buttons
}

/// Fetch the device's commands and derive its buttons; `None` when the
/// command list could not be retrieved
pub async fn discover_buttons(
    coordinator: &FleetCoordinator,
    device_id: &str,
) -> Result<Option<Vec<ButtonSpec>>> {
    Ok(coordinator
        .list_commands(device_id)
        .await?
        .map(|commands| derive_buttons(device_id, &commands)))
}
