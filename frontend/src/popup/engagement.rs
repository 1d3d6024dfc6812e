use crate::popup::storage::KvStore;

pub const TIME_THRESHOLD_MS: u64 = 60 * 1000;
pub const POLL_INTERVAL_MS: u32 = 5_000;
pub const SUCCESS_CLOSE_MS: u32 = 2_000;
pub const FAILURE_CLOSE_MS: u32 = 3_000;
pub const SUBMIT_TIMEOUT_MS: u32 = 10_000;

const KEY_ELAPSED: &str = "popupTotalElapsedTime";
const KEY_START: &str = "popupTimerStartTime";
const KEY_TRIGGERED: &str = "popupTriggered";
const KEY_COMPLETED: &str = "popupCompleted";
const KEY_NAME: &str = "popupCurrentName";

/// Where the popup UI currently is. `Hidden` covers both "timer still
/// running" and "dismissed"; the durable flags decide which.
#[derive(Clone, Debug, PartialEq)]
pub enum PopupPhase {
    Hidden,
    NameStep,
    EmailStep,
    Submitting,
    Success,
    Failure(String),
}

/// What the host should do after start-up or a visibility change.
#[derive(Debug, PartialEq)]
pub enum Wake {
    /// Lifecycle already finished; never poll, never show.
    Dormant,
    /// Threshold was crossed on an earlier load; the popup is open again.
    Reopened,
    /// Keep calling `tick` at the poll interval.
    Polling,
}

#[derive(Debug, PartialEq)]
pub enum FormError {
    EmptyName,
    InvalidEmail,
    MissingName,
    AlreadyInFlight,
}

pub struct LeadSubmission {
    pub name: String,
    pub email: String,
}

/// The engagement timer and two-step form, driven entirely by injected
/// timestamps. All durable state lives in the store, so a new controller
/// over the same store behaves like a page reload.
pub struct PopupController<S: KvStore> {
    store: S,
    page_load_ms: u64,
    phase: PopupPhase,
}

impl<S: KvStore> PopupController<S> {
    pub fn new(store: S, now_ms: u64) -> Self {
        Self {
            store,
            page_load_ms: now_ms,
            phase: PopupPhase::Hidden,
        }
    }

    /// Run the page-load protocol: start a fresh lifecycle if none exists,
    /// resume a triggered one, or stay dormant forever once completed.
    pub fn bootstrap(&mut self, now_ms: u64) -> Wake {
        if self.completed() {
            return Wake::Dormant;
        }
        if self.store.get(KEY_START).is_none() {
            self.store.set(KEY_START, &now_ms.to_string());
            self.store.set(KEY_ELAPSED, "0");
        }
        if self.triggered() {
            self.open();
            Wake::Reopened
        } else {
            Wake::Polling
        }
    }

    pub fn phase(&self) -> &PopupPhase {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != PopupPhase::Hidden
    }

    pub fn completed(&self) -> bool {
        self.store.get(KEY_COMPLETED).is_some()
    }

    fn triggered(&self) -> bool {
        self.store.get(KEY_TRIGGERED).as_deref() == Some("true")
    }

    pub fn captured_name(&self) -> Option<String> {
        self.store.get(KEY_NAME).filter(|name| !name.is_empty())
    }

    fn accumulated_ms(&self) -> u64 {
        self.store
            .get(KEY_ELAPSED)
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    pub fn total_visible_ms(&self, now_ms: u64) -> u64 {
        self.accumulated_ms() + now_ms.saturating_sub(self.page_load_ms)
    }

    /// Poll step. Returns true once polling should stop, either because
    /// the threshold fired or the lifecycle is already complete.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.completed() {
            return true;
        }
        if self.total_visible_ms(now_ms) > TIME_THRESHOLD_MS {
            self.store.set(KEY_TRIGGERED, "true");
            self.open();
            return true;
        }
        false
    }

    /// Fold this page's visible time into the durable accumulator and
    /// restart the page-local clock. Safe to call any number of times.
    pub fn fold_elapsed(&mut self, now_ms: u64) {
        if self.completed() {
            return;
        }
        let total = self.accumulated_ms() + now_ms.saturating_sub(self.page_load_ms);
        self.store.set(KEY_ELAPSED, &total.to_string());
        self.page_load_ms = now_ms;
    }

    pub fn page_hidden(&mut self, now_ms: u64) {
        self.fold_elapsed(now_ms);
    }

    pub fn page_visible(&mut self, now_ms: u64) -> Wake {
        if self.completed() {
            return Wake::Dormant;
        }
        self.page_load_ms = now_ms;
        if self.triggered() {
            self.open();
            Wake::Reopened
        } else {
            Wake::Polling
        }
    }

    /// Show the popup, resuming at the email step when a name is already
    /// on file. Showing while already visible is a no-op.
    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        self.phase = if self.captured_name().is_some() {
            PopupPhase::EmailStep
        } else {
            PopupPhase::NameStep
        };
    }

    /// Hide without completing; the user may be prompted again later.
    pub fn dismiss(&mut self) {
        self.phase = PopupPhase::Hidden;
    }

    pub fn advance_with_name(&mut self, raw: &str) -> Result<(), FormError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(FormError::EmptyName);
        }
        self.store.set(KEY_NAME, name);
        self.phase = PopupPhase::EmailStep;
        Ok(())
    }

    /// Validate and move into `Submitting`; at most one submission may be
    /// in flight per popup lifecycle.
    pub fn begin_submit(&mut self, raw_email: &str) -> Result<LeadSubmission, FormError> {
        if self.phase == PopupPhase::Submitting {
            return Err(FormError::AlreadyInFlight);
        }
        let email = raw_email.trim().to_string();
        if !looks_like_email(&email) {
            return Err(FormError::InvalidEmail);
        }
        let name = self.captured_name().ok_or(FormError::MissingName)?;
        self.phase = PopupPhase::Submitting;
        Ok(LeadSubmission { name, email })
    }

    pub fn submission_succeeded(&mut self) {
        self.store.set(KEY_COMPLETED, "true");
        self.phase = PopupPhase::Success;
    }

    pub fn submission_failed(&mut self, message: String) {
        self.phase = PopupPhase::Failure(message);
    }
}

/// Basic `local@domain.tld` shape, the same bar the server sets.
pub fn looks_like_email(value: &str) -> bool {
    if value.is_empty() || value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    matches!(domain.rsplit_once('.'), Some((host, tld)) if !host.is_empty() && !tld.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::storage::memory::MemoryStore;

    fn fresh(now_ms: u64) -> (PopupController<MemoryStore>, MemoryStore, Wake) {
        let store = MemoryStore::default();
        let mut controller = PopupController::new(store.clone(), now_ms);
        let wake = controller.bootstrap(now_ms);
        (controller, store, wake)
    }

    fn reload(store: &MemoryStore, now_ms: u64) -> (PopupController<MemoryStore>, Wake) {
        let mut controller = PopupController::new(store.clone(), now_ms);
        let wake = controller.bootstrap(now_ms);
        (controller, wake)
    }

    #[test]
    fn fresh_profile_starts_a_lifecycle_and_polls() {
        let (controller, store, wake) = fresh(1_000);
        assert_eq!(wake, Wake::Polling);
        assert_eq!(store.get("popupTimerStartTime").as_deref(), Some("1000"));
        assert_eq!(store.get("popupTotalElapsedTime").as_deref(), Some("0"));
        assert_eq!(*controller.phase(), PopupPhase::Hidden);
    }

    #[test]
    fn threshold_crossing_triggers_the_popup() {
        let (mut controller, store, _) = fresh(0);
        assert!(!controller.tick(5_000));
        assert!(!controller.tick(60_000)); // exactly at the threshold, not past it
        assert!(controller.tick(61_000));
        assert_eq!(*controller.phase(), PopupPhase::NameStep);
        assert_eq!(store.get("popupTriggered").as_deref(), Some("true"));
    }

    #[test]
    fn hidden_time_is_not_counted() {
        let (mut controller, _, _) = fresh(0);
        controller.page_hidden(10_000);
        assert_eq!(controller.page_visible(50_000), Wake::Polling);
        // 10s before hiding + 45s since becoming visible again
        assert!(!controller.tick(95_000));
        assert_eq!(controller.total_visible_ms(95_000), 55_000);
        assert!(controller.tick(101_000));
    }

    #[test]
    fn accumulation_never_decreases_or_double_counts() {
        let (mut controller, store, _) = fresh(0);
        let mut last = 0;
        for (hide_at, show_at) in [(5_000, 20_000), (25_000, 90_000), (90_000, 90_000)] {
            controller.page_hidden(hide_at);
            let recorded = controller.total_visible_ms(hide_at);
            assert!(recorded >= last);
            last = recorded;
            controller.page_visible(show_at);
        }
        // 5s + 5s + 0s of visible time, out of 90s of wall clock
        assert_eq!(controller.total_visible_ms(90_000), 10_000);
        assert_eq!(store.get("popupTotalElapsedTime").as_deref(), Some("10000"));
    }

    #[test]
    fn folding_twice_at_the_same_instant_adds_nothing() {
        let (mut controller, _, _) = fresh(0);
        controller.fold_elapsed(30_000);
        controller.fold_elapsed(30_000);
        assert_eq!(controller.total_visible_ms(30_000), 30_000);
    }

    #[test]
    fn elapsed_time_survives_a_reload() {
        let (mut controller, store, _) = fresh(0);
        controller.fold_elapsed(30_000); // beforeunload
        drop(controller);

        let (controller, wake) = reload(&store, 100_000);
        assert_eq!(wake, Wake::Polling);
        // the 70s the page spent unloaded does not count
        assert_eq!(controller.total_visible_ms(100_000), 30_000);
        assert_eq!(store.get("popupTimerStartTime").as_deref(), Some("0"));
    }

    #[test]
    fn triggered_state_reopens_on_reload() {
        let (mut controller, store, _) = fresh(0);
        assert!(controller.tick(61_000));
        drop(controller);

        let (controller, wake) = reload(&store, 70_000);
        assert_eq!(wake, Wake::Reopened);
        assert_eq!(*controller.phase(), PopupPhase::NameStep);
    }

    #[test]
    fn captured_name_skips_to_the_email_step() {
        let (mut controller, store, _) = fresh(0);
        controller.tick(61_000);
        controller.advance_with_name("  Ana  ").unwrap();
        assert_eq!(store.get("popupCurrentName").as_deref(), Some("Ana"));
        drop(controller);

        let (controller, wake) = reload(&store, 70_000);
        assert_eq!(wake, Wake::Reopened);
        assert_eq!(*controller.phase(), PopupPhase::EmailStep);
    }

    #[test]
    fn name_step_rejects_blank_input() {
        let (mut controller, _, _) = fresh(0);
        controller.tick(61_000);
        assert_eq!(controller.advance_with_name("   "), Err(FormError::EmptyName));
        assert_eq!(*controller.phase(), PopupPhase::NameStep);
    }

    #[test]
    fn submit_validates_email_and_allows_one_in_flight() {
        let (mut controller, _, _) = fresh(0);
        controller.tick(61_000);
        controller.advance_with_name("Ana").unwrap();

        assert!(matches!(
            controller.begin_submit("not-an-email"),
            Err(FormError::InvalidEmail)
        ));
        assert_eq!(*controller.phase(), PopupPhase::EmailStep);

        let submission = controller.begin_submit(" ana@x.com ").unwrap();
        assert_eq!(submission.name, "Ana");
        assert_eq!(submission.email, "ana@x.com");
        assert_eq!(*controller.phase(), PopupPhase::Submitting);

        assert!(matches!(
            controller.begin_submit("ana@x.com"),
            Err(FormError::AlreadyInFlight)
        ));
    }

    #[test]
    fn success_completes_the_lifecycle_for_good() {
        let (mut controller, store, _) = fresh(0);
        controller.tick(61_000);
        controller.advance_with_name("Ana").unwrap();
        controller.begin_submit("ana@x.com").unwrap();
        controller.submission_succeeded();
        assert_eq!(*controller.phase(), PopupPhase::Success);
        controller.dismiss();
        drop(controller);

        // no popup and no timer activity on any later load
        let (mut controller, wake) = reload(&store, 1_000_000);
        assert_eq!(wake, Wake::Dormant);
        assert!(controller.tick(10_000_000));
        assert_eq!(*controller.phase(), PopupPhase::Hidden);
        assert_eq!(controller.page_visible(20_000_000), Wake::Dormant);
    }

    #[test]
    fn failure_leaves_the_lifecycle_incomplete() {
        let (mut controller, _, _) = fresh(0);
        controller.tick(61_000);
        controller.advance_with_name("Ana").unwrap();
        controller.begin_submit("ana@x.com").unwrap();
        controller.submission_failed("Failed to process submission.".into());
        assert_eq!(
            *controller.phase(),
            PopupPhase::Failure("Failed to process submission.".into())
        );
        assert!(!controller.completed());

        // dismissed, then the tab comes back: still triggered, so re-show
        controller.dismiss();
        assert_eq!(controller.page_visible(70_000), Wake::Reopened);
        assert_eq!(*controller.phase(), PopupPhase::EmailStep);
    }

    #[test]
    fn open_while_open_is_a_no_op() {
        let (mut controller, _, _) = fresh(0);
        controller.tick(61_000);
        controller.advance_with_name("Ana").unwrap();
        assert_eq!(*controller.phase(), PopupPhase::EmailStep);
        controller.open();
        assert_eq!(*controller.phase(), PopupPhase::EmailStep);
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("ana@x.com"));
        assert!(looks_like_email("first.last+tag@sub.example.co"));
        assert!(!looks_like_email("not-an-email"));
        assert!(!looks_like_email("missing@tld"));
        assert!(!looks_like_email("@x.com"));
        assert!(!looks_like_email("a@.com"));
        assert!(!looks_like_email("a b@x.com"));
        assert!(!looks_like_email("a@b@x.com"));
        assert!(!looks_like_email(""));
    }
}
