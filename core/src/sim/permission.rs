use crate::interface::PermissionGate;
use crate::model::{Permission, PermissionState};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Permission gate with a fixed current state and a scripted prompt answer.
pub struct ScriptedPermissionGate {
    inner: Mutex<GateState>,
}

struct GateState {
    current: PermissionState,
    prompt_result: PermissionState,
    deferred: bool,
    waiting: Vec<oneshot::Sender<PermissionState>>,
    requests: usize,
}

impl ScriptedPermissionGate {
    pub fn new(current: PermissionState, prompt_result: PermissionState) -> Self {
        Self {
            inner: Mutex::new(GateState {
                current,
                prompt_result,
                deferred: false,
                waiting: Vec::new(),
                requests: 0,
            }),
        }
    }

    /// Gate whose prompt answers each permission separately; the answers are
    /// folded into one state, so a single refusal reads as `Denied`.
    pub fn with_grants<I>(current: PermissionState, grants: I) -> Self
    where
        I: IntoIterator<Item = (Permission, bool)>,
    {
        Self::new(current, PermissionState::from_grants(grants))
    }

    /// Holds prompt answers until [`ScriptedPermissionGate::resolve`].
    pub fn deferred(self) -> Self {
        self.state().deferred = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answers every outstanding prompt. A granted answer also becomes the
    /// state reported by later checks.
    pub fn resolve(&self, answer: PermissionState) {
        let mut state = self.state();
        if answer.is_granted() {
            state.current = PermissionState::Granted;
        }
        for waiter in state.waiting.drain(..) {
            let _ = waiter.send(answer);
        }
    }

    pub fn resolve_grants<I>(&self, grants: I)
    where
        I: IntoIterator<Item = (Permission, bool)>,
    {
        self.resolve(PermissionState::from_grants(grants));
    }

    pub fn request_count(&self) -> usize {
        self.state().requests
    }
}

impl PermissionGate for ScriptedPermissionGate {
    fn check(&self) -> PermissionState {
        self.state().current
    }

    fn request(&self) -> oneshot::Receiver<PermissionState> {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state();
        state.requests += 1;
        if state.deferred {
            state.waiting.push(sender);
        } else {
            let answer = state.prompt_result;
            if answer.is_granted() {
                state.current = PermissionState::Granted;
            }
            let _ = sender.send(answer);
        }
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_gate_answers_on_request() {
        let gate = ScriptedPermissionGate::new(PermissionState::Unknown, PermissionState::Granted);
        let mut reply = gate.request();
        assert_eq!(reply.try_recv(), Ok(PermissionState::Granted));
        assert_eq!(gate.check(), PermissionState::Granted);
        assert_eq!(gate.request_count(), 1);
    }

    #[test]
    fn one_refused_permission_denies_prompt() {
        let gate = ScriptedPermissionGate::with_grants(
            PermissionState::Unknown,
            [
                (Permission::FineLocation, false),
                (Permission::CoarseLocation, true),
            ],
        );
        let mut reply = gate.request();
        assert_eq!(reply.try_recv(), Ok(PermissionState::Denied));
        assert_eq!(gate.check(), PermissionState::Unknown);
    }

    #[test]
    fn deferred_grants_resolve_to_granted() {
        let gate = ScriptedPermissionGate::new(PermissionState::Denied, PermissionState::Denied)
            .deferred();
        let mut reply = gate.request();
        gate.resolve_grants(crate::model::REQUIRED_PERMISSIONS.map(|p| (p, true)));
        assert_eq!(reply.try_recv(), Ok(PermissionState::Granted));
        assert_eq!(gate.check(), PermissionState::Granted);
    }

    #[test]
    fn deferred_gate_waits_for_resolve() {
        let gate = ScriptedPermissionGate::new(PermissionState::Denied, PermissionState::Granted)
            .deferred();
        let mut reply = gate.request();
        assert!(reply.try_recv().is_err());
        gate.resolve(PermissionState::Denied);
        assert_eq!(reply.try_recv(), Ok(PermissionState::Denied));
        assert_eq!(gate.check(), PermissionState::Denied);
    }
}
