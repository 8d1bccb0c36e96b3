//! Callable binding and broadcast.
//!
//! A [`Delegate`] stores one callable of a closed set of kinds as an enum,
//! so dispatch is a match instead of an indirect call through erased byte
//! storage. A [`MulticastDelegate`] fans one invocation out to many bound
//! delegates.

use core::fmt;

use crate::collections::DynArray;
use crate::mem::{Rc, RcWeak};

enum Binding<A, R> {
    Unbound,
    /// Free function or non-capturing closure.
    Function(fn(A) -> R),
    /// Capturing closure, boxed.
    Closure(Box<dyn FnMut(A) -> R>),
    /// Method on a weakly held object. The call reports `None` once the
    /// object is gone.
    WeakMethod {
        alive: Box<dyn Fn() -> bool>,
        call: Box<dyn FnMut(A) -> Option<R>>,
    },
}

/// A rebindable callable taking `A` and returning `R`.
pub struct Delegate<A, R = ()> {
    binding: Binding<A, R>,
}

impl<A, R> Delegate<A, R> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { binding: Binding::Unbound }
    }

    #[must_use]
    pub fn from_fn(f: fn(A) -> R) -> Self {
        Self { binding: Binding::Function(f) }
    }

    pub fn bind_fn(&mut self, f: fn(A) -> R) {
        self.binding = Binding::Function(f);
    }

    pub fn bind<F>(&mut self, f: F)
    where
        F: FnMut(A) -> R + 'static,
    {
        self.binding = Binding::Closure(Box::new(f));
    }

    /// Bind a method on a shared object without keeping it alive. Once the
    /// last strong handle drops, the binding reports unbound and invoking
    /// it yields `None`.
    pub fn bind_weak<O, F>(&mut self, object: &Rc<O>, mut f: F)
    where
        O: 'static,
        F: FnMut(&O, A) -> R + 'static,
        A: 'static,
        R: 'static,
    {
        let target: RcWeak<O> = object.downgrade();
        let probe = target.clone();
        self.binding = Binding::WeakMethod {
            alive: Box::new(move || probe.is_valid()),
            call: Box::new(move |args| target.upgrade().map(|o| f(&o, args))),
        };
    }

    /// Whether invoking would actually call something. A weak binding whose
    /// target has died counts as unbound.
    pub fn is_bound(&self) -> bool {
        match &self.binding {
            Binding::Unbound => false,
            Binding::Function(_) | Binding::Closure(_) => true,
            Binding::WeakMethod { alive, .. } => alive(),
        }
    }

    pub fn clear(&mut self) {
        self.binding = Binding::Unbound;
    }

    /// Call the bound target. `None` when unbound or the weak target has
    /// expired.
    pub fn invoke(&mut self, args: A) -> Option<R> {
        match &mut self.binding {
            Binding::Unbound => None,
            Binding::Function(f) => Some(f(args)),
            Binding::Closure(f) => Some(f(args)),
            Binding::WeakMethod { call, .. } => call(args),
        }
    }
}

impl<A, R> Default for Delegate<A, R> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for Delegate<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.binding {
            Binding::Unbound => "unbound",
            Binding::Function(_) => "function",
            Binding::Closure(_) => "closure",
            Binding::WeakMethod { .. } => "weak method",
        };
        f.debug_tuple("Delegate").field(&kind).finish()
    }
}

impl<A, R> From<fn(A) -> R> for Delegate<A, R> {
    fn from(f: fn(A) -> R) -> Self {
        Self::from_fn(f)
    }
}

/// An ordered set of delegates invoked together.
///
/// Broadcast first prunes dead entries (cleared bindings and expired weak
/// targets), then invokes the rest in registration order.
pub struct MulticastDelegate<A, R = ()> {
    delegates: DynArray<Delegate<A, R>>,
}

impl<A: Clone, R> MulticastDelegate<A, R> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { delegates: DynArray::new() }
    }

    pub fn add(&mut self, delegate: Delegate<A, R>) {
        self.delegates.push(delegate);
    }

    pub fn add_fn(&mut self, f: fn(A) -> R) {
        self.add(Delegate::from_fn(f));
    }

    pub fn add_closure<F>(&mut self, f: F)
    where
        F: FnMut(A) -> R + 'static,
    {
        let mut delegate = Delegate::new();
        delegate.bind(f);
        self.add(delegate);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    pub fn clear(&mut self) {
        self.delegates.clear();
    }

    /// Invoke every live delegate with a clone of `args`, discarding the
    /// results.
    pub fn broadcast(&mut self, args: A) {
        self.delegates.retain(Delegate::is_bound);
        for delegate in self.delegates.iter_mut() {
            delegate.invoke(args.clone());
        }
    }
}

impl<A: Clone, R> Default for MulticastDelegate<A, R> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use core::cell::Cell;

    fn double(x: i32) -> i32 {
        x * 2
    }

    #[test]
    fn unbound_yields_none() {
        let mut d = Delegate::<i32, i32>::new();
        assert!(!d.is_bound());
        assert_eq!(d.invoke(1), None);
    }

    #[test]
    fn function_binding() {
        let mut d = Delegate::from_fn(double);
        assert!(d.is_bound());
        assert_eq!(d.invoke(21), Some(42));
    }

    #[test]
    fn closure_binding_captures_state() {
        let mut total = 0;
        let mut d = Delegate::<i32, i32>::new();
        d.bind(move |x| {
            total += x;
            total
        });
        assert_eq!(d.invoke(2), Some(2));
        assert_eq!(d.invoke(3), Some(5));
    }

    #[test]
    fn rebind_and_clear() {
        let mut d = Delegate::from_fn(double);
        d.bind(|x| x + 1);
        assert_eq!(d.invoke(1), Some(2));
        d.clear();
        assert!(!d.is_bound());
        assert_eq!(d.invoke(1), None);
    }

    #[test]
    fn weak_binding_calls_while_alive() {
        let counter = Rc::new(Cell::new(0));
        let mut d = Delegate::<i32, i32>::new();
        d.bind_weak(&counter, |c, x| {
            c.set(c.get() + x);
            c.get()
        });

        assert!(d.is_bound());
        assert_eq!(d.invoke(5), Some(5));
        assert_eq!(d.invoke(2), Some(7));
        assert_eq!(counter.get(), 7);
    }

    #[test]
    fn weak_binding_expires_with_target() {
        let target = Rc::new(1u32);
        let mut d = Delegate::<(), u32>::new();
        d.bind_weak(&target, |v, ()| *v);
        assert_eq!(d.invoke(()), Some(1));

        drop(target);
        assert!(!d.is_bound());
        assert_eq!(d.invoke(()), None);
    }

    #[test]
    fn broadcast_reaches_all() {
        let hits = Rc::new(Cell::new(0));
        let mut m = MulticastDelegate::<i32>::new();
        for _ in 0..3 {
            let hits = hits.clone();
            m.add_closure(move |x| hits.set(hits.get() + x));
        }
        m.broadcast(2);
        assert_eq!(hits.get(), 6);
    }

    #[test]
    fn broadcast_prunes_dead_entries() {
        let target = Rc::new(Cell::new(0));
        let mut m = MulticastDelegate::<i32>::new();

        let mut weak = Delegate::new();
        weak.bind_weak(&target, |c, x| c.set(c.get() + x));
        m.add(weak);
        m.add(Delegate::new());
        m.add_fn(|_| ());
        assert_eq!(m.len(), 3);

        m.broadcast(1);
        // The explicitly unbound entry is gone, the weak one still live.
        assert_eq!(m.len(), 2);
        assert_eq!(target.get(), 1);

        drop(target);
        m.broadcast(1);
        assert_eq!(m.len(), 1);
    }
}
