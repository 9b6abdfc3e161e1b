/// Pids that hover focus must never hand focus back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusContext {
    pub target_pid: i32,
    pub own_pid: i32,
}

impl FocusContext {
    fn is_restorable(&self, pid: i32) -> bool {
        pid != self.target_pid && pid != self.own_pid
    }
}

/// Hover-to-focus state machine.
///
/// The overlay ignores the mouse, so clicks land on whatever is underneath.
/// Activating the target while the cursor is over the overlay routes input
/// to the real window; leaving gives focus back to the previous app.
#[derive(Debug, Default)]
pub struct HoverFocus {
    hovering: bool,
    previous: Option<i32>,
}

impl HoverFocus {
    /// Feed one poll sample. Returns the pid to activate, if any.
    pub fn update(
        &mut self,
        inside: bool,
        frontmost: Option<i32>,
        context: FocusContext,
    ) -> Option<i32> {
        match (self.hovering, inside) {
            (false, true) => {
                self.hovering = true;
                self.previous = frontmost.filter(|pid| context.is_restorable(*pid));
                Some(context.target_pid)
            }
            (true, false) => self.leave(context),
            _ => None,
        }
    }

    /// Leave hover state, returning the pid to restore focus to.
    pub fn reset(&mut self, context: FocusContext) -> Option<i32> {
        if self.hovering {
            self.leave(context)
        } else {
            self.previous = None;
            None
        }
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    fn leave(&mut self, context: FocusContext) -> Option<i32> {
        self.hovering = false;
        self.previous.take().filter(|pid| context.is_restorable(*pid))
    }
}
