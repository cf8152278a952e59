//! Sensor access — motion event subscriptions and the permission gate.

/// Proof of a live motion subscription. Not clonable: the holder is the
/// only one who can give it back.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A platform stream of motion samples.
pub trait MotionSource {
    /// Whether the device has a motion sensor at all.
    fn is_available(&self) -> bool;
    fn subscribe(&mut self) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
}

/// Answer to a sensor permission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// The platform request itself failed.
    Failed(String),
}

/// Platform gate in front of the motion sensor.
pub trait PermissionGate {
    /// Whether an explicit grant is needed before subscribing.
    fn requires_prompt(&self) -> bool;
    /// Begin asking the user. The answer is delivered later through
    /// [`crate::session::SessionController::resolve_permission`].
    fn begin_request(&mut self);
}

/// Bookkeeping motion source for hosts that deliver events themselves.
///
/// The host attaches its platform listener while [`MotionHub::wants_events`]
/// is true and forwards every event to the session.
#[derive(Debug, Default)]
pub struct MotionHub {
    available: bool,
    next_id: u64,
    active: Vec<u64>,
}

impl MotionHub {
    pub fn new(available: bool) -> Self {
        MotionHub {
            available,
            ..Default::default()
        }
    }

    pub fn wants_events(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn is_subscribed(&self, subscription: &Subscription) -> bool {
        self.active.contains(&subscription.id)
    }
}

impl MotionSource for MotionHub {
    fn is_available(&self) -> bool {
        self.available
    }

    fn subscribe(&mut self) -> Subscription {
        self.next_id += 1;
        self.active.push(self.next_id);
        log::debug!("motion subscription {} attached", self.next_id);
        Subscription { id: self.next_id }
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.active.retain(|&id| id != subscription.id);
        log::debug!("motion subscription {} detached", subscription.id);
    }
}

/// Permission gate for hosts that answer asynchronously from outside.
#[derive(Debug, Default)]
pub struct HostPermission {
    requires_prompt: bool,
    requests: u32,
}

impl HostPermission {
    pub fn new(requires_prompt: bool) -> Self {
        HostPermission {
            requires_prompt,
            requests: 0,
        }
    }

    /// How many prompts have been started.
    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl PermissionGate for HostPermission {
    fn requires_prompt(&self) -> bool {
        self.requires_prompt
    }

    fn begin_request(&mut self) {
        self.requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_tracks_subscriptions() {
        let mut hub = MotionHub::new(true);
        assert!(!hub.wants_events());
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_ne!(a.id(), b.id());
        assert!(hub.is_subscribed(&a));
        hub.unsubscribe(a);
        assert!(hub.wants_events());
        hub.unsubscribe(b);
        assert!(!hub.wants_events());
    }

    #[test]
    fn host_permission_counts_requests() {
        let mut gate = HostPermission::new(true);
        assert!(gate.requires_prompt());
        gate.begin_request();
        gate.begin_request();
        assert_eq!(gate.requests(), 2);
    }
}
