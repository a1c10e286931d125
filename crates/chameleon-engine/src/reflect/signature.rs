//! Parameter list comparison

use chameleon_types::TypeHandle;

/// Compares ordered parameter type lists
pub struct SignatureMatcher;

impl SignatureMatcher {
    /// Same arity and pairwise identical types
    pub fn equals(a: &[TypeHandle], b: &[TypeHandle]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
    }

    /// Same arity and each `b[i]` can be supplied where `a[i]` is expected
    pub fn assignable(a: &[TypeHandle], b: &[TypeHandle]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_assignable_from(y))
    }

    /// Pick the first candidate whose parameters equal `args`, else the first
    /// whose parameters accept `args`
    ///
    /// Candidates keep their declaration order; the exact tier always wins over
    /// the assignable tier.
    pub fn best_match<'a, T, F>(
        candidates: &'a [T],
        args: &[TypeHandle],
        params: F,
        allow_assignable: bool,
    ) -> Option<&'a T>
    where
        F: Fn(&T) -> &[TypeHandle],
    {
        candidates
            .iter()
            .find(|c| Self::equals(params(c), args))
            .or_else(|| {
                if allow_assignable {
                    candidates.iter().find(|c| Self::assignable(params(c), args))
                } else {
                    None
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleon_types::TypeBuilder;

    #[test]
    fn test_equals_is_order_sensitive() {
        let a = vec![TypeHandle::i32(), TypeHandle::string()];
        let b = vec![TypeHandle::string(), TypeHandle::i32()];
        assert!(SignatureMatcher::equals(&a, &a));
        assert!(!SignatureMatcher::equals(&a, &b));
        assert!(!SignatureMatcher::equals(&a, &a[..1]));
        assert!(SignatureMatcher::equals(&[], &[]));
    }

    #[test]
    fn test_assignable_direction() {
        let base = TypeBuilder::class("Animal").build().unwrap();
        let derived = TypeBuilder::class("Dog").parent(&base).build().unwrap();

        assert!(SignatureMatcher::assignable(&[base.clone()], &[derived.clone()]));
        assert!(!SignatureMatcher::assignable(&[derived], &[base]));
        assert!(!SignatureMatcher::assignable(&[TypeHandle::i64()], &[TypeHandle::i32()]));
    }

    #[test]
    fn test_exact_tier_first() {
        let candidates = vec![
            ("object", vec![TypeHandle::object()]),
            ("string", vec![TypeHandle::string()]),
        ];
        let args = [TypeHandle::string()];

        let found = SignatureMatcher::best_match(&candidates, &args, |c| &c.1, true).unwrap();
        assert_eq!(found.0, "string");

        let args = [TypeHandle::buffer()];
        let found = SignatureMatcher::best_match(&candidates, &args, |c| &c.1, true).unwrap();
        assert_eq!(found.0, "object");
        assert!(SignatureMatcher::best_match(&candidates, &args, |c| &c.1, false).is_none());
    }
}
