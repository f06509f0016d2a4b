use crate::error::CapabilityError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// The user was never asked.
    Default,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemNotification {
    pub title: String,
    pub body: String,
    /// Notifications sharing a tag replace each other on most platforms.
    pub tag: Option<String>,
}

/// Platform side effects the client may trigger. Every method may report
/// `CapabilityError::Unavailable`; callers go through [`degrade`] so that a
/// missing capability never interrupts the session.
pub trait DeviceCapabilities: Send + Sync {
    fn notification_permission(&self) -> NotificationPermission;
    fn show_notification(&self, notification: &SystemNotification) -> Result<(), CapabilityError>;
    fn play_alert_sound(&self) -> Result<(), CapabilityError>;
    fn vibrate(&self, pattern_ms: &[u32]) -> Result<(), CapabilityError>;
    fn share(&self, title: &str, text: &str) -> Result<(), CapabilityError>;
    fn write_clipboard(&self, text: &str) -> Result<(), CapabilityError>;
}

/// Logs a failed capability call and swallows it. Returns whether the call went through.
pub fn degrade(result: Result<(), CapabilityError>) -> bool {
    match result {
        Ok(()) => true,
        Err(CapabilityError::Unavailable(what)) => {
            log::debug!("Capability unavailable, skipping: {}", what);
            false
        }
        Err(e) => {
            log::warn!("Capability call failed: {}", e);
            false
        }
    }
}

/// Shows a system notification only when the user granted permission.
pub fn notify_if_permitted(device: &dyn DeviceCapabilities, notification: &SystemNotification) -> bool {
    if device.notification_permission() != NotificationPermission::Granted {
        log::debug!("Notification permission not granted, dropping '{}'", notification.title);
        return false;
    }
    degrade(device.show_notification(notification))
}

pub const URGENCY_VIBRATION: [u32; 3] = [200, 100, 200];

/// Sound, system notification and vibration for a high-urgency answer.
pub fn raise_urgency_alert(device: &dyn DeviceCapabilities) {
    log::warn!("High urgency answer received, alerting the user");
    degrade(device.play_alert_sound());
    notify_if_permitted(
        device,
        &SystemNotification {
            title: "Health alert - Maman & Bébé".to_string(),
            body: "A situation needs immediate medical attention".to_string(),
            tag: None,
        },
    );
    degrade(device.vibrate(&URGENCY_VIBRATION));
}

/// A device with no capabilities at all.
pub struct Headless;

impl DeviceCapabilities for Headless {
    fn notification_permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn show_notification(&self, _notification: &SystemNotification) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("notifications"))
    }

    fn play_alert_sound(&self) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("sound"))
    }

    fn vibrate(&self, _pattern_ms: &[u32]) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("vibration"))
    }

    fn share(&self, _title: &str, _text: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("share sheet"))
    }

    fn write_clipboard(&self, _text: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("clipboard"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_alert_does_not_fail() {
        raise_urgency_alert(&Headless);
        assert!(!notify_if_permitted(
            &Headless,
            &SystemNotification { title: "t".into(), body: "b".into(), tag: None }
        ));
    }

    #[test]
    fn degrade_reports_outcome() {
        assert!(degrade(Ok(())));
        assert!(!degrade(Err(CapabilityError::Unavailable("sound"))));
        assert!(!degrade(Err(CapabilityError::Failed { capability: "sound", detail: "busy".into() })));
    }
}
