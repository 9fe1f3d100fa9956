// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Generates a fresh opaque etag.
#[must_use]
pub fn generate_etag() -> String {
    format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}

/// Generates an identifier for a new association.
#[must_use]
pub fn new_association_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etags_are_fresh() {
        let a = generate_etag();
        let b = generate_etag();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_association_ids_pass_validation() {
        let id = new_association_id();
        assert!(company_assoc_domain::validate_association_id(&id).is_ok());
    }
}
