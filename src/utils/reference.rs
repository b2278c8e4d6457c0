// utils/reference.rs

/// Internal transaction reference, distinct from the gateway's reference.
pub fn generate_transaction_reference() -> String {
    format!(
        "FLH_{}",
        uuid::Uuid::new_v4().to_string().replace("-", "").to_uppercase()[..16].to_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn references_carry_prefix_and_fixed_length() {
        let reference = generate_transaction_reference();
        assert!(reference.starts_with("FLH_"));
        assert_eq!(reference.len(), 20);
    }

    #[test]
    fn references_do_not_collide() {
        let refs: HashSet<String> = (0..1000).map(|_| generate_transaction_reference()).collect();
        assert_eq!(refs.len(), 1000);
    }
}
