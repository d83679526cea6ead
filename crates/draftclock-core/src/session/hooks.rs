/// Zero-argument notification callback.
pub type Hook = Box<dyn FnMut()>;

/// Start/stop notification lists, run in registration order.
#[derive(Default)]
pub struct Hooks {
    start: Vec<Hook>,
    stop: Vec<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_session_start(&mut self, hook: impl FnMut() + 'static) {
        self.start.push(Box::new(hook));
    }

    pub fn on_session_stop(&mut self, hook: impl FnMut() + 'static) {
        self.stop.push(Box::new(hook));
    }

    pub(crate) fn fire_start(&mut self) {
        for hook in self.start.iter_mut() {
            hook();
        }
    }

    pub(crate) fn fire_stop(&mut self) {
        for hook in self.stop.iter_mut() {
            hook();
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("start", &self.start.len())
            .field("stop", &self.stop.len())
            .finish()
    }
}
