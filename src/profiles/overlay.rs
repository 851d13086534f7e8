//! Field-by-field overlay of a profile's pipeline onto the base pipeline.
//!
//! Values replace values whole, there is no deep merge:
//!
//! - `Option`: `Some` replaces, `None` keeps the base.
//! - `Vec` and maps: non-empty replaces, empty keeps the base.
//! - scalars: non-zero replaces, zero keeps the base.
//! - plain structs recurse per field ([`overlay_struct!`]).
//! - oneOf unions: the first alternative set in the profile replaces the
//!   whole union, clearing the base's alternative ([`overlay_one_of!`]).

use std::collections::BTreeMap;

/// Merge a profile value onto a base value.
pub trait Overlay {
    fn overlay(&mut self, profile: Self);
}

impl<T> Overlay for Option<T> {
    fn overlay(&mut self, profile: Self) {
        if profile.is_some() {
            *self = profile;
        }
    }
}

impl<T> Overlay for Vec<T> {
    fn overlay(&mut self, profile: Self) {
        if !profile.is_empty() {
            *self = profile;
        }
    }
}

impl<K, V> Overlay for BTreeMap<K, V> {
    fn overlay(&mut self, profile: Self) {
        if !profile.is_empty() {
            *self = profile;
        }
    }
}

macro_rules! overlay_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Overlay for $ty {
                fn overlay(&mut self, profile: Self) {
                    if profile != <$ty>::default() {
                        *self = profile;
                    }
                }
            }
        )*
    };
}

overlay_scalar!(String, bool, i32, i64);

/// Implement [`Overlay`] for a struct by overlaying each listed field.
///
/// Fields listed under `one_of` are `Option`s forming a union: the first one
/// the profile sets replaces all of them. The union also gets a
/// [`OneOf`](crate::schema::validation::OneOf) impl from the same list.
macro_rules! overlay_struct {
    ($ty:ty { $($field:ident),* $(,)? }
        $(one_of $union:literal { $($alt:ident: $name:literal),+ $(,)? })?) => {
        impl $crate::profiles::overlay::Overlay for $ty {
            #[allow(unused_variables, unused_mut)]
            fn overlay(&mut self, mut profile: Self) {
                $(
                    $crate::profiles::overlay::Overlay::overlay(&mut self.$field, profile.$field);
                )*
                $(
                    if false $(|| profile.$alt.is_some())+ {
                        let mut taken = false;
                        $(
                            self.$alt = if taken { None } else { profile.$alt.take() };
                            taken |= self.$alt.is_some();
                        )+
                        let _ = taken;
                    }
                )?
            }
        }
        $(
            $crate::schema::validation::one_of!($ty as $union { $($alt: $name),+ });
        )?
    };
}

/// Implement [`Overlay`] for a struct that is nothing but a oneOf union.
macro_rules! overlay_one_of {
    ($ty:ty as $union:literal { $($alt:ident: $name:literal),+ $(,)? }) => {
        $crate::profiles::overlay::overlay_struct!($ty {} one_of $union { $($alt: $name),+ });
    };
}

pub(crate) use {overlay_one_of, overlay_struct};
