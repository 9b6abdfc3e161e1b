//! App activation events from the NSWorkspace notification center.
//!
//! Observer tokens are main-thread objects kept in a thread-local registry,
//! like the overlay panels. [`ActivationObserver`] holds only the id.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use block2::RcBlock;
use objc2::msg_send;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_app_kit::{NSRunningApplication, NSWorkspace};
use objc2_foundation::{NSNotification, NSString};
use pintop_core::platform::{ActivationCallback, Subscription};
use tracing::{debug, warn};

use crate::main_thread::run_on_main;

const DID_ACTIVATE_APPLICATION: &str = "NSWorkspaceDidActivateApplicationNotification";
const APPLICATION_KEY: &str = "NSWorkspaceApplicationKey";

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static TOKENS: RefCell<HashMap<u64, Retained<AnyObject>>> = RefCell::new(HashMap::new());
}

/// Forwards `NSWorkspaceDidActivateApplicationNotification` pids until
/// cancelled.
pub(crate) struct ActivationObserver {
    id: u64,
    live: Arc<AtomicBool>,
}

impl ActivationObserver {
    pub(crate) fn start(on_activated: ActivationCallback) -> Self {
        let id = NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed);
        let live = Arc::new(AtomicBool::new(true));
        let registration_live = Arc::clone(&live);

        run_on_main(move |_mtm| {
            // Cancelled before the main queue got here.
            if !registration_live.load(Ordering::Acquire) {
                return;
            }

            let callback_live = Arc::clone(&registration_live);
            let block = RcBlock::new(move |note: NonNull<NSNotification>| {
                if !callback_live.load(Ordering::Acquire) {
                    return;
                }
                // SAFETY: the center passes a live notification for the call.
                let note = unsafe { note.as_ref() };
                if let Some(pid) = activated_pid(note) {
                    on_activated(pid);
                }
            });

            let center = workspace_center();
            let name = NSString::from_str(DID_ACTIVATE_APPLICATION);
            // SAFETY: a nil object and queue deliver every activation on the
            // posting (main) thread. The center copies the block.
            let token: Option<Retained<AnyObject>> = unsafe {
                msg_send![
                    &*center,
                    addObserverForName: &*name,
                    object: std::ptr::null::<AnyObject>(),
                    queue: std::ptr::null::<AnyObject>(),
                    usingBlock: &*block
                ]
            };

            match token {
                Some(token) => {
                    TOKENS.with(|tokens| tokens.borrow_mut().insert(id, token));
                    debug!(event = "macos.activation.observer_added", id = id);
                }
                None => warn!(event = "macos.activation.observer_add_failed", id = id),
            }
        });

        Self { id, live }
    }
}

fn workspace_center() -> Retained<AnyObject> {
    let workspace = NSWorkspace::sharedWorkspace();
    // SAFETY: NSWorkspace always has a notification center.
    unsafe { msg_send![&*workspace, notificationCenter] }
}

fn activated_pid(note: &NSNotification) -> Option<i32> {
    // SAFETY: userInfo is an NSDictionary or nil; the application key maps to
    // an NSRunningApplication.
    let user_info: Option<Retained<AnyObject>> = unsafe { msg_send![note, userInfo] };
    let key = NSString::from_str(APPLICATION_KEY);
    let app: Option<Retained<NSRunningApplication>> =
        unsafe { msg_send![&*user_info?, objectForKey: &*key] };
    app.map(|app| app.processIdentifier())
}

impl Subscription for ActivationObserver {
    fn cancel(&mut self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }

        let id = self.id;
        run_on_main(move |_mtm| {
            let Some(token) = TOKENS.with(|tokens| tokens.borrow_mut().remove(&id)) else {
                return;
            };
            let center = workspace_center();
            // SAFETY: `token` came from addObserverForName on this center.
            unsafe {
                let _: () = msg_send![&*center, removeObserver: &*token];
            }
            debug!(event = "macos.activation.observer_removed", id = id);
        });
    }
}

impl Drop for ActivationObserver {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent_and_silences_callbacks() {
        let mut observer = ActivationObserver::start(Box::new(|_| {}));
        let other = ActivationObserver::start(Box::new(|_| {}));
        assert_ne!(observer.id, other.id);

        observer.cancel();
        observer.cancel();
        assert!(!observer.live.load(Ordering::Acquire));
        assert!(other.live.load(Ordering::Acquire));
    }
}
