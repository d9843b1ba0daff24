//! Declarative helpers for describing services and exporting catalogs.

/// Implements [`Injectable`](crate::Injectable) for a `Default` struct whose
/// dependencies live in [`Inject`](crate::Inject) fields.
///
/// Fields are injected in the order they are listed. Trailing flags name
/// [`DescriptorBuilder`](crate::DescriptorBuilder) switches; `disposable` registers
/// the type's [`Disposable`](crate::Disposable) impl.
///
/// ```
/// use tiered_ioc::{injectable, Inject};
///
/// #[derive(Default)]
/// struct Clock;
/// injectable!(Clock);
///
/// #[derive(Default)]
/// struct Greeter {
///     clock: Inject<Clock>,
/// }
/// injectable!(Greeter { clock });
/// ```
#[macro_export]
macro_rules! injectable {
    ($type:ty $({ $($field:ident),* $(,)? })? $(, $flag:ident)* $(,)?) => {
        impl $crate::Injectable for $type {
            fn describe() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::builder::<Self>()
                    .default_constructible()
                    $($(.inject(stringify!($field), |service: &mut Self| &mut service.$field))*)?
                    $(.$flag())*
                    .build()
            }
        }
    };
}

/// Builds a [`Candidate`](crate::Candidate) offering an implementation for a
/// contract.
///
/// `candidate!(dyn Greeter => EnglishGreeter)` offers `EnglishGreeter` for
/// `dyn Greeter`; `candidate!(Clock)` offers `Clock` as its own contract.
#[macro_export]
macro_rules! candidate {
    ($contract:ty => $concrete:ty) => {
        $crate::Candidate::new(
            || $crate::ServiceKey::of::<$contract>(),
            || $crate::ServiceKey::of::<$concrete>(),
            <$concrete as $crate::Injectable>::describe,
            |lifetime| {
                $crate::Registration::implementation::<$contract, $concrete>(lifetime, |service| service)
            },
        )
    };

    ($concrete:ty) => {
        $crate::candidate!($concrete => $concrete)
    };
}

/// Declares a named [`Catalog`](crate::Catalog) and exports it into
/// [`CATALOGS`](crate::CATALOGS), where `auto_detect(&[])` finds it.
///
/// ```ignore
/// export_catalog!(pub static GREETERS = "greeters" [
///     candidate!(dyn Greeter => EnglishGreeter),
///     candidate!(Clock),
/// ]);
/// ```
#[macro_export]
macro_rules! export_catalog {
    ($vis:vis static $name:ident = $catalog:literal [ $($candidate:expr),* $(,)? ]) => {
        #[$crate::linkme::distributed_slice($crate::CATALOGS)]
        #[linkme(crate = $crate::linkme)]
        $vis static $name: $crate::Catalog = $crate::Catalog::new($catalog, &[$($candidate),*]);
    };
}
