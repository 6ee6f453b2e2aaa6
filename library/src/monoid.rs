use std::{fmt, marker::PhantomData, ops::Add};

// monoid, not necessarily commutative.
// Laws are trusted, never checked:
// * identity: combine(id(), a) == a == combine(a, id())
// * associativity: combine(combine(a, b), c) == combine(a, combine(b, c))
pub trait Monoid {
    type X;
    fn id(&self) -> Self::X;
    fn combine(&self, a: &Self::X, b: &Self::X) -> Self::X;
}

// (T, +, T::default())
pub struct Additive<T>(PhantomData<fn() -> T>);

impl<T> Additive<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Additive<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Additive<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Additive<T> {}

impl<T> fmt::Debug for Additive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Additive<{}>", std::any::type_name::<T>())
    }
}

impl<T> Monoid for Additive<T>
where
    T: Default + Clone + Add<Output = T>,
{
    type X = T;

    fn id(&self) -> T {
        T::default()
    }

    fn combine(&self, a: &T, b: &T) -> T {
        a.clone() + b.clone()
    }
}

/// Multiplicities of items: natural numbers under addition.
pub type Counting = Additive<u64>;

/// A monoid assembled from an identity value and a binary operation.
#[derive(Clone)]
pub struct FnMonoid<X, F> {
    id: X,
    op: F,
}

impl<X, F> fmt::Debug for FnMonoid<X, F>
where
    X: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMonoid").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<X, F> Monoid for FnMonoid<X, F>
where
    X: Clone,
    F: Fn(&X, &X) -> X,
{
    type X = X;

    fn id(&self) -> X {
        self.id.clone()
    }

    fn combine(&self, a: &X, b: &X) -> X {
        (self.op)(a, b)
    }
}

pub fn from_fn<X, F>(id: X, op: F) -> FnMonoid<X, F>
where
    X: Clone,
    F: Fn(&X, &X) -> X,
{
    FnMonoid { id, op }
}
