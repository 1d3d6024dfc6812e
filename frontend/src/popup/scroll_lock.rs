/// Capability for suspending page scroll while the popup is up. Hosts
/// without a scrollable document plug in the no-op.
pub trait ScrollLock {
    fn suspend(&self);
    fn resume(&self);
}

pub struct NoopScrollLock;

impl ScrollLock for NoopScrollLock {
    fn suspend(&self) {}
    fn resume(&self) {}
}

/// Toggles the `popup-open` class on `<html>` and `<body>`; the stylesheet
/// hides overflow under that class.
pub struct ClassScrollLock;

impl ClassScrollLock {
    fn toggle(on: bool) {
        let document = match web_sys::window().and_then(|w| w.document()) {
            Some(document) => document,
            None => return,
        };
        let targets = [
            document.document_element(),
            document.body().map(web_sys::Element::from),
        ];
        for target in targets.into_iter().flatten() {
            let class_list = target.class_list();
            let _ = if on {
                class_list.add_1("popup-open")
            } else {
                class_list.remove_1("popup-open")
            };
        }
    }
}

impl ScrollLock for ClassScrollLock {
    fn suspend(&self) {
        Self::toggle(true);
    }

    fn resume(&self) {
        Self::toggle(false);
    }
}

/// Pick the lock implementation for the current host.
pub fn host_scroll_lock() -> Box<dyn ScrollLock> {
    if web_sys::window().and_then(|w| w.document()).is_some() {
        Box::new(ClassScrollLock)
    } else {
        Box::new(NoopScrollLock)
    }
}
