//! Numeric ID newtypes.

/// Declares `<Name>Id(pub u32)`: ordered, hashable, `From<u32>` (so the actor can mint it),
/// displayed as the bare number and serialised transparently.
///
/// ```rust
/// fleet_framework::define_id!(Duty);
/// assert_eq!(DutyId::from(4).to_string(), "4");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        $crate::paste::paste! {
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
                ::serde::Serialize, ::serde::Deserialize,
            )]
            #[serde(transparent)]
            pub struct [<$name Id>](pub u32);

            impl From<u32> for [<$name Id>] {
                fn from(id: u32) -> Self {
                    Self(id)
                }
            }

            impl ::std::fmt::Display for [<$name Id>] {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        }
    };
}
