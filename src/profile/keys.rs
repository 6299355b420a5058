//! Counter key construction. Every component that
//! reads or writes a counter goes through these so the key schema stays in
//! exactly one place.

/// `clientId:YYYYMMDDHH` (hourly txn counters, also used for the hourly
/// beneficiary counter with the beneficiary key spliced in).
pub fn hourly_txn_key(client_id: &str, hour_bucket: &str) -> String {
    format!("{client_id}:{hour_bucket}")
}

/// `clientId:YYYYMMDD` (daily txn counters).
pub fn daily_txn_key(client_id: &str, day_bucket: &str) -> String {
    format!("{client_id}:{day_bucket}")
}

/// `clientId:newbene:YYYYMMDD`.
pub fn daily_new_bene_key(client_id: &str, day_bucket: &str) -> String {
    format!("{client_id}:newbene:{day_bucket}")
}

/// `clientId:beneKey:YYYYMMDDHH`.
pub fn hourly_beneficiary_key(client_id: &str, bene_key: &str, hour_bucket: &str) -> String {
    format!("{client_id}:{bene_key}:{hour_bucket}")
}

/// `clientId:beneDaily:YYYYMMDD:beneKey`. Lives in the same counter set as
/// [`daily_txn_key`].
pub fn daily_beneficiary_amount_key(client_id: &str, day_bucket: &str, bene_key: &str) -> String {
    format!("{client_id}:beneDaily:{day_bucket}:{bene_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_beneficiary_key_is_distinguishable_from_plain_daily_key() {
        let plain = daily_txn_key("C1", "20240101");
        let bene = daily_beneficiary_amount_key("C1", "20240101", "HDFC0009999:123");
        assert_ne!(plain, bene);
        assert!(bene.starts_with("C1:beneDaily:"));
    }
}
