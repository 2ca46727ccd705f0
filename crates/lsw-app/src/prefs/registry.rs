//! Declarative preference-key handler tables
//!
//! A component declares which preference keys it reacts to once, at
//! construction, and then registers and unregisters the whole table with the
//! preference source as its lifecycle dictates.
//!
//! ```ignore
//! let handlers = HandlerRegistry::new()
//!     .handler(keys::DRAWER_ENABLED, |view: &mut SettingsView| view.refresh_toggle())
//!     .handler(keys::DRAWER_COL_COUNT, |view: &mut SettingsView| view.relayout());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use lsw_core::prelude::*;

use super::store::{ListenerId, PreferenceListener, Preferences};

type Action<O> = Box<dyn Fn(&mut O) -> Result<()>>;

struct Binding<O> {
    key: String,
    action: Action<O>,
}

/// Ordered `(key, action)` bindings over an owner type `O`.
pub struct HandlerRegistry<O> {
    bindings: Vec<Binding<O>>,
    registration: Cell<Option<ListenerId>>,
}

impl<O> Default for HandlerRegistry<O> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            registration: Cell::new(None),
        }
    }
}

impl<O> std::fmt::Debug for HandlerRegistry<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl<O> HandlerRegistry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `key`. Several bindings may share a key; they run in
    /// declaration order.
    pub fn handler(
        mut self,
        key: impl Into<String>,
        action: impl Fn(&mut O) -> Result<()> + 'static,
    ) -> Self {
        self.bindings.push(Binding {
            key: key.into(),
            action: Box::new(action),
        });
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.key.as_str())
    }

    pub fn handles(&self, key: &str) -> bool {
        self.bindings.iter().any(|b| b.key == key)
    }

    /// Run every binding for `key` against `owner`. Returns how many ran.
    pub fn dispatch(&self, owner: &mut O, key: &str) -> Result<usize> {
        let mut ran = 0;
        for binding in self.bindings.iter().filter(|b| b.key == key) {
            (binding.action)(owner)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Subscribe `listener` (the owner of this table) to `prefs`.
    ///
    /// Registering an already registered table keeps the existing
    /// subscription.
    pub fn register(&self, prefs: &Preferences, listener: Weak<dyn PreferenceListener>) -> ListenerId {
        if let Some(id) = self.registration.get() {
            warn!("Handler registry already registered as {:?}", id);
            return id;
        }
        let id = prefs.register(listener);
        self.registration.set(Some(id));
        id
    }

    /// Remove this table's subscription. Safe to call more than once.
    pub fn unregister(&self, prefs: &Preferences) -> bool {
        match self.registration.take() {
            Some(id) => prefs.unregister(id),
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registration.get().is_some()
    }
}

/// A handler table bound to its owner value, registered for as long as the
/// returned `Rc` lives.
///
/// Suits components with no lifecycle of their own, such as a settings view
/// mirroring a toggle.
pub struct ScopedHandlers<O> {
    prefs: Preferences,
    registry: HandlerRegistry<O>,
    owner: RefCell<O>,
}

impl<O: 'static> ScopedHandlers<O> {
    pub fn register(prefs: &Preferences, registry: HandlerRegistry<O>, owner: O) -> Rc<Self> {
        let scoped = Rc::new(Self {
            prefs: prefs.clone(),
            registry,
            owner: RefCell::new(owner),
        });
        let listener: Rc<dyn PreferenceListener> = scoped.clone();
        scoped.registry.register(prefs, Rc::downgrade(&listener));
        scoped
    }

    /// Read the owner value
    pub fn with_owner<R>(&self, f: impl FnOnce(&O) -> R) -> R {
        f(&self.owner.borrow())
    }

    /// Unregister early. Dropping does the same.
    pub fn unregister(&self) -> bool {
        self.registry.unregister(&self.prefs)
    }
}

impl<O> PreferenceListener for ScopedHandlers<O> {
    fn on_preference_changed(&self, key: &str) -> Result<()> {
        if !self.registry.handles(key) {
            return Ok(());
        }
        let mut owner = self
            .owner
            .try_borrow_mut()
            .map_err(|_| Error::preferences(format!("re-entrant change of '{}'", key)))?;
        self.registry.dispatch(&mut owner, key)?;
        Ok(())
    }
}

impl<O> Drop for ScopedHandlers<O> {
    fn drop(&mut self) {
        self.registry.unregister(&self.prefs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: Vec<&'static str>,
    }

    fn counting(tag: &'static str) -> HandlerRegistry<Counter> {
        HandlerRegistry::new()
            .handler("shared", move |c: &mut Counter| {
                c.hits.push(tag);
                Ok(())
            })
            .handler("other", |c: &mut Counter| {
                c.hits.push("other");
                Ok(())
            })
    }

    #[test]
    fn test_dispatch_runs_bindings_in_declaration_order() {
        let registry = HandlerRegistry::new()
            .handler("k", |c: &mut Counter| {
                c.hits.push("first");
                Ok(())
            })
            .handler("x", |c: &mut Counter| {
                c.hits.push("unrelated");
                Ok(())
            })
            .handler("k", |c: &mut Counter| {
                c.hits.push("second");
                Ok(())
            });

        let mut counter = Counter::default();
        assert_eq!(registry.dispatch(&mut counter, "k").unwrap(), 2);
        assert_eq!(counter.hits, vec!["first", "second"]);
        assert_eq!(registry.dispatch(&mut counter, "missing").unwrap(), 0);
    }

    #[test]
    fn test_dispatch_stops_at_first_error() {
        let registry = HandlerRegistry::new()
            .handler("k", |_: &mut Counter| Err(Error::preferences("boom")))
            .handler("k", |c: &mut Counter| {
                c.hits.push("never");
                Ok(())
            });

        let mut counter = Counter::default();
        assert!(registry.dispatch(&mut counter, "k").is_err());
        assert!(counter.hits.is_empty());
    }

    #[test]
    fn test_overlapping_registries_both_fire_until_one_unregisters() {
        let prefs = Preferences::in_memory();
        let a = ScopedHandlers::register(&prefs, counting("a"), Counter::default());
        let b = ScopedHandlers::register(&prefs, counting("b"), Counter::default());

        prefs.notify_changed("shared").unwrap();
        assert_eq!(a.with_owner(|c| c.hits.clone()), vec!["a"]);
        assert_eq!(b.with_owner(|c| c.hits.clone()), vec!["b"]);

        assert!(a.unregister());
        assert!(!a.unregister());

        prefs.notify_changed("shared").unwrap();
        assert_eq!(a.with_owner(|c| c.hits.len()), 1);
        assert_eq!(b.with_owner(|c| c.hits.clone()), vec!["b", "b"]);
    }

    #[test]
    fn test_drop_unregisters() {
        let prefs = Preferences::in_memory();
        let scoped = ScopedHandlers::register(&prefs, counting("a"), Counter::default());
        assert_eq!(prefs.listener_count(), 1);

        drop(scoped);
        assert_eq!(prefs.listener_count(), 0);
    }

    #[test]
    fn test_register_twice_keeps_single_subscription() {
        struct Noop;
        impl PreferenceListener for Noop {
            fn on_preference_changed(&self, _key: &str) -> Result<()> {
                Ok(())
            }
        }

        let prefs = Preferences::in_memory();
        let registry: HandlerRegistry<Counter> = counting("a");
        let listener: Rc<dyn PreferenceListener> = Rc::new(Noop);

        let first = registry.register(&prefs, Rc::downgrade(&listener));
        let second = registry.register(&prefs, Rc::downgrade(&listener));

        assert_eq!(first, second);
        assert_eq!(prefs.listener_count(), 1);
        assert!(registry.unregister(&prefs));
        assert!(!registry.is_registered());
    }
}
