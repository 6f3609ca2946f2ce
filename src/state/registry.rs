use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory mailing list.
///
/// Addresses keep insertion order and are unique. Every operation takes the
/// one lock for its whole read-modify-write, so a concurrent `drain` never
/// sees a half-applied `add`.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    emails: Vec<String>,
    /// Drained for a send that has not been settled or restored yet.
    /// An unsubscribe drops the address from here too.
    in_flight: Vec<String>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry pre-filled through the normal `add` path.
    pub fn with_subscribers<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for email in emails {
            registry.add(email.as_ref());
        }
        registry
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the Vecs half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `email` unless it is empty or already present.
    /// Returns `true` if the address was inserted.
    pub fn add(&self, email: &str) -> bool {
        if email.is_empty() {
            return false;
        }

        let mut inner = self.lock();
        if inner.emails.iter().any(|e| e == email) {
            return false;
        }
        inner.emails.push(email.to_string());
        true
    }

    /// Remove `email` if present, including from a send in flight so a
    /// failed send cannot bring it back. Returns `true` if something was removed.
    pub fn remove(&self, email: &str) -> bool {
        let mut inner = self.lock();
        let listed = remove_from(&mut inner.emails, email);
        let in_flight = remove_from(&mut inner.in_flight, email);
        listed || in_flight
    }

    /// Take every address out in one lock acquisition.
    ///
    /// The batch stays tracked until `settle` or `restore` is called with it.
    pub fn drain(&self) -> Vec<String> {
        let mut inner = self.lock();
        let drained = std::mem::take(&mut inner.emails);
        inner.in_flight.extend(drained.iter().cloned());
        drained
    }

    /// Forget a drained batch whose send succeeded.
    pub fn settle(&self, drained: &[String]) {
        let mut inner = self.lock();
        inner.in_flight.retain(|e| !drained.contains(e));
    }

    /// Put back addresses taken by a `drain` whose send failed.
    ///
    /// Restored addresses go in front of anything subscribed in the meantime,
    /// in their original order, and never duplicate an existing entry.
    /// Addresses unsubscribed while the send was in flight stay out.
    pub fn restore(&self, drained: Vec<String>) {
        let mut inner = self.lock();
        let Inner { emails, in_flight } = &mut *inner;

        let still_wanted: Vec<String> = drained
            .into_iter()
            .filter(|e| remove_from(in_flight, e))
            .collect();
        let arrived = std::mem::take(emails);

        for email in still_wanted.into_iter().chain(arrived) {
            if !email.is_empty() && !emails.contains(&email) {
                emails.push(email);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().emails.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().emails.is_empty()
    }
}

fn remove_from(list: &mut Vec<String>, email: &str) -> bool {
    match list.iter().position(|e| e == email) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}
